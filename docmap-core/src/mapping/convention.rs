//! Conventions decide which members of a type are mapped before any explicit configuration.
//!
//! [`ClassMapBuilder::auto_map`](crate::mapping::ClassMapBuilder::auto_map) always runs the
//! [default pack](ConventionPack::defaults) first, then every registered pack whose filter
//! accepts the type, in registration order.
//!
//! # Built-in conventions
//!
//! - [`ReadWriteMembersConvention`]: maps public members that can be read and written
//! - [`NamedIdMemberConvention`]: picks the identifier member by name
//! - [`ReadOnlyMembersConvention`]: maps members that can be read but not written

use tracing::trace;

use crate::{
    error::DocumentStoreResult,
    mapping::{
        class_map::ClassMap,
        member::{BindingScope, MemberDescriptor, TypeDescriptor},
    },
};

/// A rule applied to a class map while it is being auto-mapped.
pub trait Convention: Send + Sync {
    /// Returns a short name used in diagnostics.
    fn name(&self) -> &str;

    /// Applies the rule to `class_map`, typically by mapping members.
    ///
    /// # Errors
    ///
    /// Returns an error if the class map rejects a change.
    fn apply(&self, class_map: &mut ClassMap) -> DocumentStoreResult<()>;
}

/// An ordered list of conventions applied together.
#[derive(Default)]
pub struct ConventionPack {
    conventions: Vec<Box<dyn Convention>>,
}

impl ConventionPack {
    /// Creates an empty pack.
    pub fn new() -> Self {
        Self { conventions: Vec::new() }
    }

    /// The conventions every class map receives before any registered pack.
    pub fn defaults() -> Self {
        Self::new()
            .with(ReadWriteMembersConvention)
            .with(NamedIdMemberConvention::default())
    }

    /// Appends a convention to the pack.
    pub fn with(mut self, convention: impl Convention + 'static) -> Self {
        self.push(convention);
        self
    }

    pub fn push(&mut self, convention: impl Convention + 'static) {
        self.conventions.push(Box::new(convention));
    }

    pub fn len(&self) -> usize {
        self.conventions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conventions.is_empty()
    }

    /// Applies every convention in order.
    pub fn apply(&self, class_map: &mut ClassMap) -> DocumentStoreResult<()> {
        for convention in &self.conventions {
            trace!(convention = convention.name(), type_name = class_map.type_name(), "applying convention");
            convention.apply(class_map)?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for ConventionPack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.conventions.iter().map(|c| c.name()))
            .finish()
    }
}

/// Maps declared public instance members that can be both read and written.
///
/// Indexers and overrides of base definitions are skipped; the latter are covered by the
/// base type's class map.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadWriteMembersConvention;

impl Convention for ReadWriteMembersConvention {
    fn name(&self) -> &str {
        "ReadWriteMembers"
    }

    fn apply(&self, class_map: &mut ClassMap) -> DocumentStoreResult<()> {
        let descriptor = class_map.descriptor();

        for member in descriptor.members(BindingScope::default().declared_only()) {
            if member.can_read()
                && member.can_write()
                && !member.is_indexed()
                && !member.overrides_base_of(descriptor.name())
            {
                class_map.map_member(member.name())?;
            }
        }

        Ok(())
    }
}

/// Selects the identifier member of a type by name.
///
/// Only applies when no identifier member has been chosen yet. The first declared instance
/// member whose name is in the candidate list becomes the identifier.
#[derive(Debug, Clone)]
pub struct NamedIdMemberConvention {
    names: Vec<&'static str>,
}

impl NamedIdMemberConvention {
    pub fn new(names: Vec<&'static str>) -> Self {
        Self { names }
    }
}

impl Default for NamedIdMemberConvention {
    fn default() -> Self {
        Self::new(vec!["id", "_id"])
    }
}

impl Convention for NamedIdMemberConvention {
    fn name(&self) -> &str {
        "NamedIdMember"
    }

    fn apply(&self, class_map: &mut ClassMap) -> DocumentStoreResult<()> {
        if class_map.id_member().is_some() {
            return Ok(());
        }

        let scope = BindingScope::empty()
            .instance()
            .public()
            .non_public()
            .declared_only();
        let members = class_map.descriptor().members(scope);

        for name in &self.names {
            if members.iter().any(|member| member.name() == *name) {
                class_map.set_id_member(name)?;
                break;
            }
        }

        Ok(())
    }
}

/// Maps members that can be read but not written, so computed values reach the document.
///
/// A member qualifies when all of the following hold:
///
/// 1. it can be read,
/// 2. it cannot be written (writable members belong to [`ReadWriteMembersConvention`]),
/// 3. it takes no index parameters,
/// 4. it does not override a definition declared on another type.
///
/// Only members declared directly on the type are considered, whatever scope is configured.
#[derive(Debug, Clone, Copy)]
pub struct ReadOnlyMembersConvention {
    scope: BindingScope,
}

impl ReadOnlyMembersConvention {
    /// Considers public instance members.
    pub fn new() -> Self {
        Self::with_scope(BindingScope::default())
    }

    /// Considers the members admitted by `scope`, restricted to declared members.
    pub fn with_scope(scope: BindingScope) -> Self {
        Self { scope: scope.declared_only() }
    }

    pub fn scope(&self) -> BindingScope {
        self.scope
    }

    /// Returns `true` if `member` of `owner` must be added by this convention.
    pub fn includes(owner: &TypeDescriptor, member: &MemberDescriptor) -> bool {
        member.can_read()
            && !member.can_write()
            && !member.is_indexed()
            && !member.overrides_base_of(owner.name())
    }
}

impl Default for ReadOnlyMembersConvention {
    fn default() -> Self {
        Self::new()
    }
}

impl Convention for ReadOnlyMembersConvention {
    fn name(&self) -> &str {
        "ReadOnlyMembers"
    }

    fn apply(&self, class_map: &mut ClassMap) -> DocumentStoreResult<()> {
        let descriptor = class_map.descriptor();

        for member in descriptor.members(self.scope) {
            if Self::includes(descriptor, member) {
                class_map.map_member(member.name())?;
            }
        }

        Ok(())
    }
}
