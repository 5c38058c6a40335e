//! Registration of class maps and conventions, and the immutable registry built from them.
//!
//! Class maps are configured once through a [`ClassMapRegistryBuilder`]. Building it freezes
//! the configuration into a [`ClassMapRegistry`], which is then shared by reference with
//! whatever encodes or decodes documents.
//!
//! # Example
//!
//! ```ignore
//! use docmap::mapping::{ClassMapRegistry, ConventionPack, ReadOnlyMembersConvention};
//!
//! let mut builder = ClassMapRegistry::builder();
//! builder.register_conventions(
//!     "read-only",
//!     ConventionPack::new().with(ReadOnlyMembersConvention::new()),
//!     |_| true,
//! );
//! builder.register_class_map::<PhoneNumber>(|m| {
//!     m.auto_map()?;
//!     m.map_member("value")?.set_element_name("value");
//!     Ok(())
//! })?;
//!
//! let registry = builder.build()?;
//! let document = registry.encode(&PhoneNumber::new("123-123"))?;
//! ```

use std::{
    collections::HashMap,
    ops::{Deref, DerefMut},
};

use bson::{Bson, Document};
use tracing::debug;

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    mapping::{
        class_map::{ClassMap, MemberMap},
        codec::{DocumentReader, Mapped, MappedObject, MemberValue},
        convention::ConventionPack,
        member::TypeDescriptor,
    },
    update::POSITIONAL,
};

type TypeFilter = Box<dyn Fn(&TypeDescriptor) -> bool + Send + Sync>;

struct RegisteredPack {
    name: String,
    pack: ConventionPack,
    filter: TypeFilter,
}

/// Convention packs registered for use by [`ClassMapBuilder::auto_map`].
#[derive(Default)]
pub struct ConventionRegistry {
    packs: Vec<RegisteredPack>,
}

impl ConventionRegistry {
    /// Registers a named pack applied to every type accepted by `filter`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        pack: ConventionPack,
        filter: impl Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    ) {
        self.packs.push(RegisteredPack {
            name: name.into(),
            pack,
            filter: Box::new(filter),
        });
    }

    /// Returns the packs that apply to `descriptor`, in registration order.
    pub fn lookup<'a>(
        &'a self,
        descriptor: &'a TypeDescriptor,
    ) -> impl Iterator<Item = (&'a str, &'a ConventionPack)> + 'a {
        self.packs
            .iter()
            .filter(move |registered| (registered.filter)(descriptor))
            .map(|registered| (registered.name.as_str(), &registered.pack))
    }
}

/// A class map under construction, with access to the registered conventions.
///
/// Dereferences to [`ClassMap`], so members can be mapped directly.
pub struct ClassMapBuilder<'a> {
    class_map: ClassMap,
    conventions: &'a ConventionRegistry,
}

impl<'a> ClassMapBuilder<'a> {
    fn new(descriptor: &'static TypeDescriptor, conventions: &'a ConventionRegistry) -> Self {
        Self {
            class_map: ClassMap::new(descriptor),
            conventions,
        }
    }

    /// Maps members by convention: the default pack first, then every registered pack
    /// whose filter accepts this type.
    pub fn auto_map(&mut self) -> DocumentStoreResult<()> {
        ConventionPack::defaults().apply(&mut self.class_map)?;

        for (name, pack) in self.conventions.lookup(self.class_map.descriptor()) {
            debug!(pack = name, type_name = self.class_map.type_name(), "applying convention pack");
            pack.apply(&mut self.class_map)?;
        }

        Ok(())
    }

    fn finish(self) -> ClassMap {
        self.class_map
    }
}

impl Deref for ClassMapBuilder<'_> {
    type Target = ClassMap;

    fn deref(&self) -> &ClassMap {
        &self.class_map
    }
}

impl DerefMut for ClassMapBuilder<'_> {
    fn deref_mut(&mut self) -> &mut ClassMap {
        &mut self.class_map
    }
}

/// Collects conventions and class maps before freezing them into a [`ClassMapRegistry`].
#[derive(Default)]
pub struct ClassMapRegistryBuilder {
    conventions: ConventionRegistry,
    class_maps: Vec<ClassMap>,
}

impl ClassMapRegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a convention pack for every type accepted by `filter`.
    ///
    /// Packs only affect class maps registered afterwards.
    pub fn register_conventions(
        &mut self,
        name: impl Into<String>,
        pack: ConventionPack,
        filter: impl Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.conventions.register(name, pack, filter);
        self
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.class_maps
            .iter()
            .any(|map| map.type_name() == type_name)
    }

    /// Registers the class map for `T`, configured by `configure`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Mapping`] if `T` already has a class map, or any error
    /// raised by `configure`.
    pub fn register_class_map<T: Mapped>(
        &mut self,
        configure: impl FnOnce(&mut ClassMapBuilder<'_>) -> DocumentStoreResult<()>,
    ) -> DocumentStoreResult<&mut Self> {
        self.register_descriptor(T::descriptor(), configure)?;

        Ok(self)
    }

    /// Registers a class map for `T` built purely by convention.
    pub fn auto_register<T: Mapped>(&mut self) -> DocumentStoreResult<&mut Self> {
        self.register_class_map::<T>(|map| map.auto_map())
    }

    fn register_descriptor(
        &mut self,
        descriptor: &'static TypeDescriptor,
        configure: impl FnOnce(&mut ClassMapBuilder<'_>) -> DocumentStoreResult<()>,
    ) -> DocumentStoreResult<()> {
        if self.is_registered(descriptor.name()) {
            return Err(DocumentStoreError::Mapping(format!(
                "class map for type {} is already registered",
                descriptor.name(),
            )));
        }

        let mut builder = ClassMapBuilder::new(descriptor, &self.conventions);
        configure(&mut builder)?;
        let class_map = builder.finish();

        debug!(
            type_name = descriptor.name(),
            members = ?class_map.member_maps().iter().map(|m| m.member_name()).collect::<Vec<_>>(),
            "class map registered",
        );

        self.class_maps.push(class_map);

        Ok(())
    }

    /// Freezes the configuration.
    ///
    /// Base types and nested member types without a class map are auto-mapped first. Every
    /// class map is then validated against the maps of its base types.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Mapping`] if any class map is invalid.
    pub fn build(mut self) -> DocumentStoreResult<ClassMapRegistry> {
        let mut next = 0;

        while next < self.class_maps.len() {
            let class_map = &self.class_maps[next];
            let referenced: Vec<&'static TypeDescriptor> = class_map
                .descriptor()
                .base()
                .into_iter()
                .chain(
                    class_map
                        .member_maps()
                        .iter()
                        .filter_map(|map| map.member().value_type().nested()),
                )
                .collect();

            for descriptor in referenced {
                if !self.is_registered(descriptor.name()) {
                    self.register_descriptor(descriptor, |map| map.auto_map())?;
                }
            }

            next += 1;
        }

        let registry = ClassMapRegistry {
            class_maps: self
                .class_maps
                .into_iter()
                .map(|map| (map.type_name(), map))
                .collect(),
        };

        for class_map in registry.class_maps.values() {
            let mut inherited = Vec::new();

            for ancestor in class_map.descriptor().ancestors() {
                let base = registry.lookup(ancestor)?;
                inherited.extend(
                    base.member_maps()
                        .iter()
                        .map(|map| (base.type_name(), map)),
                );
            }

            class_map.validate(&inherited)?;
        }

        debug!(types = registry.class_maps.len(), "class map registry built");

        Ok(registry)
    }
}

/// Frozen class maps, keyed by type name.
///
/// The registry is immutable once built and is typically shared behind an `Arc`.
#[derive(Debug)]
pub struct ClassMapRegistry {
    class_maps: HashMap<&'static str, ClassMap>,
}

impl ClassMapRegistry {
    pub fn builder() -> ClassMapRegistryBuilder {
        ClassMapRegistryBuilder::new()
    }

    pub fn class_map(&self, type_name: &str) -> Option<&ClassMap> {
        self.class_maps.get(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.class_maps.keys().copied()
    }

    fn lookup(&self, descriptor: &TypeDescriptor) -> DocumentStoreResult<&ClassMap> {
        self.class_maps
            .get(descriptor.name())
            .ok_or_else(|| DocumentStoreError::Mapping(format!(
                "no class map registered for type {}",
                descriptor.name(),
            )))
    }

    /// Returns every member map that applies to `class_map`, root base type first.
    pub fn all_member_maps<'a>(&'a self, class_map: &'a ClassMap) -> DocumentStoreResult<Vec<&'a MemberMap>> {
        let mut chain = vec![class_map];

        for ancestor in class_map.descriptor().ancestors() {
            chain.push(self.lookup(ancestor)?);
        }

        Ok(chain
            .into_iter()
            .rev()
            .flat_map(|map| map.member_maps().iter())
            .collect())
    }

    /// Finds the member map for `member` on `class_map` or any of its base types.
    pub fn find_member_map<'a>(
        &'a self,
        class_map: &'a ClassMap,
        member: &str,
    ) -> DocumentStoreResult<Option<&'a MemberMap>> {
        if let Some(map) = class_map.member_map(member) {
            return Ok(Some(map));
        }

        for ancestor in class_map.descriptor().ancestors() {
            if let Some(map) = self.lookup(ancestor)?.member_map(member) {
                return Ok(Some(map));
            }
        }

        Ok(None)
    }

    /// Encodes a value into a document containing exactly its mapped members.
    pub fn encode<T: Mapped>(&self, value: &T) -> DocumentStoreResult<Document> {
        self.encode_object(value)
    }

    fn encode_object(&self, value: &dyn MappedObject) -> DocumentStoreResult<Document> {
        let class_map = self.lookup(value.type_descriptor())?;
        let mut document = Document::new();

        for member_map in self.all_member_maps(class_map)? {
            let member_value = value
                .read_member(member_map.member_name())
                .ok_or_else(|| DocumentStoreError::Mapping(format!(
                    "type {} cannot read mapped member '{}'",
                    class_map.type_name(),
                    member_map.member_name(),
                )))?;

            document.insert(member_map.element_name(), self.encode_value(member_value)?);
        }

        Ok(document)
    }

    fn encode_value(&self, value: MemberValue<'_>) -> DocumentStoreResult<Bson> {
        match value {
            MemberValue::Value(value) => Ok(value),
            MemberValue::Object(object) => Ok(Bson::Document(self.encode_object(object)?)),
            MemberValue::List(items) => Ok(Bson::Array(
                items
                    .into_iter()
                    .map(|item| self.encode_object(item).map(Bson::Document))
                    .collect::<DocumentStoreResult<Vec<_>>>()?,
            )),
        }
    }

    /// Decodes a document into `T` through its class map.
    pub fn decode<T: Mapped>(&self, document: &Document) -> DocumentStoreResult<T> {
        let class_map = self.lookup(T::descriptor())?;

        T::decode(&DocumentReader::new(self, class_map, document))
    }

    /// Resolves a chain of member names on `T` into a dotted element path.
    ///
    /// Object and list members continue resolution in their nested type. The positional
    /// segment `$` and numeric indexes are passed through unchanged.
    ///
    /// ```ignore
    /// let path = registry.element_path::<Person>(&["contacts", "phones", "$", "value"])?;
    /// assert_eq!(path, "contacts.phones.$.value");
    /// ```
    pub fn element_path<T: Mapped>(&self, members: &[&str]) -> DocumentStoreResult<String> {
        let mut current = Some(T::descriptor());
        let mut segments = Vec::with_capacity(members.len());

        for member in members {
            if *member == POSITIONAL || member.parse::<usize>().is_ok() {
                segments.push(member.to_string());
                continue;
            }

            let descriptor = current.ok_or_else(|| DocumentStoreError::Mapping(format!(
                "member '{}' cannot follow a scalar element in a path on type {}",
                member,
                T::descriptor().name(),
            )))?;
            let class_map = self.lookup(descriptor)?;
            let member_map = self
                .find_member_map(class_map, member)?
                .ok_or_else(|| DocumentStoreError::Mapping(format!(
                    "member '{}' of type {} is not mapped",
                    member,
                    descriptor.name(),
                )))?;

            segments.push(member_map.element_name().to_string());
            current = member_map.member().value_type().nested();
        }

        Ok(segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};
    use crate::mapping::{convention::ReadOnlyMembersConvention, member::MemberDescriptor};

    static BASE: TypeDescriptor = TypeDescriptor::new(
        "Base",
        &[
            MemberDescriptor::property("id").writable(),
            MemberDescriptor::property("name").writable(),
        ],
    );

    static ITEM: TypeDescriptor = TypeDescriptor::new(
        "Item",
        &[
            MemberDescriptor::property("label").writable(),
            MemberDescriptor::property("code"),
        ],
    )
    .with_base(base);

    static HOLDER: TypeDescriptor = TypeDescriptor::new(
        "Holder",
        &[
            MemberDescriptor::property("title").writable(),
            MemberDescriptor::property("items").writable().list(item),
            MemberDescriptor::property("count"),
        ],
    );

    fn base() -> &'static TypeDescriptor {
        &BASE
    }

    fn item() -> &'static TypeDescriptor {
        &ITEM
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: ObjectId,
        name: String,
        label: String,
        code: String,
    }

    impl Mapped for Item {
        fn descriptor() -> &'static TypeDescriptor {
            &ITEM
        }

        fn member(&self, name: &str) -> Option<MemberValue<'_>> {
            match name {
                "id" => Some(MemberValue::value(self.id)),
                "name" => Some(MemberValue::value(self.name.clone())),
                "label" => Some(MemberValue::value(self.label.clone())),
                "code" => Some(MemberValue::value(self.code.clone())),
                _ => None,
            }
        }

        fn decode(reader: &DocumentReader<'_>) -> DocumentStoreResult<Self> {
            Ok(Self {
                id: reader.value("id")?,
                name: reader.value("name")?,
                label: reader.value("label")?,
                code: reader.optional("code")?.unwrap_or_default(),
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Holder {
        title: String,
        items: Vec<Item>,
    }

    impl Mapped for Holder {
        fn descriptor() -> &'static TypeDescriptor {
            &HOLDER
        }

        fn member(&self, name: &str) -> Option<MemberValue<'_>> {
            match name {
                "title" => Some(MemberValue::value(self.title.clone())),
                "items" => Some(MemberValue::list(&self.items)),
                "count" => Some(MemberValue::value(self.items.len() as i64)),
                _ => None,
            }
        }

        fn decode(reader: &DocumentReader<'_>) -> DocumentStoreResult<Self> {
            Ok(Self {
                title: reader.value("title")?,
                items: reader.list("items")?,
            })
        }
    }

    fn read_only_pack() -> ConventionPack {
        ConventionPack::new().with(ReadOnlyMembersConvention::new())
    }

    fn mapped(registry: &ClassMapRegistry, type_name: &str) -> Vec<&'static str> {
        registry
            .class_map(type_name)
            .unwrap()
            .member_maps()
            .iter()
            .map(|map| map.member_name())
            .collect()
    }

    #[test]
    fn registering_a_type_twice_fails() {
        let mut builder = ClassMapRegistry::builder();
        builder.auto_register::<Holder>().unwrap();

        let err = builder.auto_register::<Holder>().err().unwrap();
        assert!(matches!(err, DocumentStoreError::Mapping(_)));
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn build_maps_unregistered_base_and_nested_types() {
        let mut builder = ClassMapRegistry::builder();
        builder.auto_register::<Holder>().unwrap();
        let registry = builder.build().unwrap();

        let mut names: Vec<&str> = registry.type_names().collect();
        names.sort();
        assert_eq!(names, vec!["Base", "Holder", "Item"]);
        assert_eq!(
            registry.class_map("Base").unwrap().id_member().unwrap().member_name(),
            "id",
        );

        let id = ObjectId::new();
        let holder = Holder {
            title: "t".to_string(),
            items: vec![Item {
                id,
                name: "n".to_string(),
                label: "l".to_string(),
                code: String::new(),
            }],
        };

        let encoded = registry.encode(&holder).unwrap();
        assert_eq!(
            encoded,
            doc! {
                "title": "t",
                "items": [{ "_id": id, "name": "n", "label": "l" }],
            },
        );
        assert_eq!(registry.decode::<Holder>(&encoded).unwrap(), holder);
    }

    #[test]
    fn build_rejects_collisions_across_the_base_chain() {
        let mut builder = ClassMapRegistry::builder();
        builder
            .register_class_map::<Item>(|m| {
                m.auto_map()?;
                m.map_member("label")?.set_element_name("name");
                Ok(())
            })
            .unwrap();

        let err = builder.build().unwrap_err();
        assert!(matches!(err, DocumentStoreError::Mapping(_)));
    }

    #[test]
    fn element_path_rejects_unmapped_members_and_scalar_traversal() {
        let mut builder = ClassMapRegistry::builder();
        builder.auto_register::<Holder>().unwrap();
        let registry = builder.build().unwrap();

        assert_eq!(registry.element_path::<Holder>(&["items", "0", "id"]).unwrap(), "items.0._id");
        assert_eq!(registry.element_path::<Holder>(&["items", "$", "name"]).unwrap(), "items.$.name");

        assert!(matches!(
            registry.element_path::<Item>(&["code"]),
            Err(DocumentStoreError::Mapping(_)),
        ));
        assert!(matches!(
            registry.element_path::<Holder>(&["title", "first"]),
            Err(DocumentStoreError::Mapping(_)),
        ));
    }

    #[test]
    fn packs_apply_only_to_later_registrations() {
        let mut builder = ClassMapRegistry::builder();
        builder.auto_register::<Item>().unwrap();
        builder.register_conventions("read-only", read_only_pack(), |_| true);
        builder.auto_register::<Holder>().unwrap();
        let registry = builder.build().unwrap();

        assert_eq!(mapped(&registry, "Item"), vec!["label"]);
        assert_eq!(mapped(&registry, "Holder"), vec!["title", "items", "count"]);
    }

    #[test]
    fn packs_apply_only_to_types_accepted_by_their_filter() {
        let mut builder = ClassMapRegistry::builder();
        builder.register_conventions("read-only", read_only_pack(), |descriptor| descriptor.name() == "Holder");
        builder.auto_register::<Item>().unwrap();
        builder.auto_register::<Holder>().unwrap();
        let registry = builder.build().unwrap();

        assert_eq!(mapped(&registry, "Item"), vec!["label"]);
        assert!(mapped(&registry, "Holder").contains(&"count"));
    }
}
