//! Per-type mapping between members and document elements.

use std::collections::HashMap;

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    mapping::member::{MemberDescriptor, TypeDescriptor},
};

/// Element name used for the identifier member of every document.
pub const ID_ELEMENT: &str = "_id";

/// Binds one member of a type to the element it is stored under.
#[derive(Debug, Clone)]
pub struct MemberMap {
    member: &'static MemberDescriptor,
    element_name: String,
    is_id: bool,
}

impl MemberMap {
    fn new(member: &'static MemberDescriptor) -> Self {
        Self {
            member,
            element_name: member.name().to_string(),
            is_id: false,
        }
    }

    pub fn member(&self) -> &'static MemberDescriptor {
        self.member
    }

    pub fn member_name(&self) -> &'static str {
        self.member.name()
    }

    /// Returns the element name; always [`ID_ELEMENT`] for the identifier member.
    pub fn element_name(&self) -> &str {
        if self.is_id { ID_ELEMENT } else { &self.element_name }
    }

    /// Sets the element name this member is stored under.
    pub fn set_element_name(&mut self, element_name: impl Into<String>) -> &mut Self {
        self.element_name = element_name.into();
        self
    }

    pub fn is_id(&self) -> bool {
        self.is_id
    }
}

/// The set of members of one type that participate in document encoding.
///
/// A class map only holds members declared directly on its type. Members inherited from a
/// base type are covered by the base type's own class map.
#[derive(Debug, Clone)]
pub struct ClassMap {
    descriptor: &'static TypeDescriptor,
    member_maps: Vec<MemberMap>,
}

impl ClassMap {
    /// Creates an empty class map for the described type.
    pub fn new(descriptor: &'static TypeDescriptor) -> Self {
        Self {
            descriptor,
            member_maps: Vec::new(),
        }
    }

    pub fn descriptor(&self) -> &'static TypeDescriptor {
        self.descriptor
    }

    pub fn type_name(&self) -> &'static str {
        self.descriptor.name()
    }

    /// Member maps declared on this type, in mapping order.
    pub fn member_maps(&self) -> &[MemberMap] {
        &self.member_maps
    }

    pub fn member_map(&self, member: &str) -> Option<&MemberMap> {
        self.member_maps
            .iter()
            .find(|map| map.member_name() == member)
    }

    pub fn is_mapped(&self, member: &str) -> bool {
        self.member_map(member).is_some()
    }

    /// Maps a member declared on this type, returning its member map.
    ///
    /// Mapping an already mapped member returns the existing map unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Mapping`] if the type declares no member with that name.
    pub fn map_member(&mut self, member: &str) -> DocumentStoreResult<&mut MemberMap> {
        let descriptor = self
            .descriptor
            .declared_member(member)
            .ok_or_else(|| DocumentStoreError::Mapping(format!(
                "type {} declares no member named '{}'",
                self.type_name(),
                member,
            )))?;

        let index = match self
            .member_maps
            .iter()
            .position(|map| map.member_name() == member)
        {
            Some(index) => index,
            None => {
                self.member_maps.push(MemberMap::new(descriptor));
                self.member_maps.len() - 1
            }
        };

        Ok(&mut self.member_maps[index])
    }

    /// Removes a member from the map. Returns `true` if it was mapped.
    pub fn unmap_member(&mut self, member: &str) -> bool {
        let before = self.member_maps.len();
        self.member_maps.retain(|map| map.member_name() != member);

        self.member_maps.len() != before
    }

    /// Maps a member and makes it the identifier stored under [`ID_ELEMENT`].
    ///
    /// Any previously chosen identifier member stays mapped as an ordinary member.
    pub fn set_id_member(&mut self, member: &str) -> DocumentStoreResult<&mut MemberMap> {
        for map in self.member_maps.iter_mut() {
            map.is_id = false;
        }

        let map = self.map_member(member)?;
        map.is_id = true;

        Ok(map)
    }

    pub fn id_member(&self) -> Option<&MemberMap> {
        self.member_maps
            .iter()
            .find(|map| map.is_id())
    }

    /// Checks element names against each other and against the maps inherited from base types.
    ///
    /// `inherited` holds the member maps of every base type, paired with the name of the type
    /// that declares them.
    pub(crate) fn validate(&self, inherited: &[(&'static str, &MemberMap)]) -> DocumentStoreResult<()> {
        let mut owners: HashMap<&str, (&'static str, &'static str)> = HashMap::new();

        for &(owner, map) in inherited {
            owners.insert(map.element_name(), (owner, map.member_name()));
        }

        let inherits_id = inherited.iter().any(|(_, map)| map.is_id());

        for map in &self.member_maps {
            validate_element_name(self.type_name(), map)?;

            if map.is_id() && inherits_id {
                return Err(DocumentStoreError::Mapping(format!(
                    "type {} cannot declare identifier member '{}' because a base type already declares one",
                    self.type_name(),
                    map.member_name(),
                )));
            }

            if let Some((owner, existing)) = owners.insert(
                map.element_name(),
                (self.type_name(), map.member_name()),
            ) {
                return Err(DocumentStoreError::Mapping(format!(
                    "member '{}' of type {} cannot use element name '{}' because it is already used by member '{}' of type {}",
                    map.member_name(),
                    self.type_name(),
                    map.element_name(),
                    existing,
                    owner,
                )));
            }
        }

        Ok(())
    }
}

fn validate_element_name(type_name: &str, map: &MemberMap) -> DocumentStoreResult<()> {
    let name = map.element_name();

    let problem = if name.is_empty() {
        Some("is empty")
    } else if name.contains('.') {
        Some("contains '.'")
    } else if name.starts_with('$') {
        Some("starts with '$'")
    } else if name.contains('\0') {
        Some("contains a null byte")
    } else {
        None
    };

    match problem {
        Some(problem) => Err(DocumentStoreError::Mapping(format!(
            "element name '{}' for member '{}' of type {} {}",
            name,
            map.member_name(),
            type_name,
            problem,
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ACCOUNT: TypeDescriptor = TypeDescriptor::new(
        "Account",
        &[
            MemberDescriptor::property("id").writable(),
            MemberDescriptor::property("owner").writable(),
            MemberDescriptor::property("balance"),
        ],
    );

    #[test]
    fn map_member_is_idempotent() {
        let mut map = ClassMap::new(&ACCOUNT);

        map.map_member("owner").unwrap().set_element_name("o");
        map.map_member("owner").unwrap();

        assert_eq!(map.member_maps().len(), 1);
        assert_eq!(map.member_map("owner").unwrap().element_name(), "o");
    }

    #[test]
    fn map_member_rejects_unknown_members() {
        let mut map = ClassMap::new(&ACCOUNT);

        let err = map.map_member("missing").unwrap_err();
        assert!(matches!(err, DocumentStoreError::Mapping(_)));
    }

    #[test]
    fn id_member_uses_reserved_element_name() {
        let mut map = ClassMap::new(&ACCOUNT);
        map.set_id_member("id").unwrap().set_element_name("identifier");

        assert_eq!(map.id_member().unwrap().element_name(), ID_ELEMENT);
    }

    #[test]
    fn unmap_member_removes_only_the_named_member() {
        let mut map = ClassMap::new(&ACCOUNT);
        map.map_member("owner").unwrap();
        map.map_member("balance").unwrap();

        assert!(map.unmap_member("owner"));
        assert!(!map.unmap_member("owner"));
        assert!(map.is_mapped("balance"));
    }

    #[test]
    fn validate_rejects_duplicate_element_names() {
        let mut map = ClassMap::new(&ACCOUNT);
        map.map_member("owner").unwrap().set_element_name("value");
        map.map_member("balance").unwrap().set_element_name("value");

        let err = map.validate(&[]).unwrap_err();
        assert!(err.to_string().contains("already used by member 'owner'"));
    }

    #[test]
    fn validate_rejects_collisions_with_inherited_elements() {
        let mut base = ClassMap::new(&ACCOUNT);
        base.map_member("owner").unwrap();

        let mut map = ClassMap::new(&ACCOUNT);
        map.map_member("balance").unwrap().set_element_name("owner");

        let inherited = base
            .member_maps()
            .iter()
            .map(|m| ("Base", m))
            .collect::<Vec<_>>();

        assert!(map.validate(&inherited).is_err());
    }

    #[test]
    fn validate_rejects_reserved_characters() {
        let mut map = ClassMap::new(&ACCOUNT);
        map.map_member("owner").unwrap().set_element_name("a.b");
        assert!(map.validate(&[]).is_err());

        let mut map = ClassMap::new(&ACCOUNT);
        map.map_member("owner").unwrap().set_element_name("$owner");
        assert!(map.validate(&[]).is_err());
    }
}
