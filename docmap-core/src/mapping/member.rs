//! Static member metadata for mapped types.
//!
//! Mapped types describe their accessors once, as `static` [`TypeDescriptor`] items, instead of
//! being discovered through runtime introspection. Conventions and class maps read these
//! descriptors to decide which members become document elements.
//!
//! # Example
//!
//! ```ignore
//! use docmap::mapping::{MemberDescriptor, TypeDescriptor};
//!
//! static PHONE_NUMBER: TypeDescriptor = TypeDescriptor::new(
//!     "PhoneNumber",
//!     &[MemberDescriptor::property("value")],
//! )
//! .with_base(Entity::descriptor);
//! ```

/// Whether a member is stored state or a computed accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A stored field.
    Field,
    /// An accessor that may compute its value.
    Property,
}

/// Visibility of a member to code outside its declaring type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Visible to all callers.
    Public,
    /// Visible only to the declaring type.
    NonPublic,
}

/// Shape of the value produced by a member.
///
/// Nested types are referenced through their descriptor function so that descriptors can
/// refer to each other from `static` items.
#[derive(Debug, Clone, Copy)]
pub enum ValueType {
    /// A value stored as a single BSON element (strings, numbers, identifiers).
    Scalar,
    /// A nested mapped object.
    Object(fn() -> &'static TypeDescriptor),
    /// An ordered list of nested mapped objects.
    List(fn() -> &'static TypeDescriptor),
}

impl ValueType {
    /// Returns the descriptor of the nested mapped type, if any.
    pub fn nested(&self) -> Option<&'static TypeDescriptor> {
        match self {
            ValueType::Scalar => None,
            ValueType::Object(descriptor) | ValueType::List(descriptor) => Some(descriptor()),
        }
    }
}

/// Describes one accessor of a mapped type.
///
/// The flags mirror what a mapping convention needs to know: whether the member can be read
/// and written, whether it takes index parameters, and whether it overrides a definition from
/// a base type.
#[derive(Debug, Clone, Copy)]
pub struct MemberDescriptor {
    name: &'static str,
    kind: MemberKind,
    visibility: Visibility,
    is_static: bool,
    can_read: bool,
    can_write: bool,
    index_parameters: usize,
    is_virtual: bool,
    base_definition: Option<&'static str>,
    value_type: ValueType,
}

impl MemberDescriptor {
    /// Creates a public, instance, read-only, scalar property.
    pub const fn property(name: &'static str) -> Self {
        Self {
            name,
            kind: MemberKind::Property,
            visibility: Visibility::Public,
            is_static: false,
            can_read: true,
            can_write: false,
            index_parameters: 0,
            is_virtual: false,
            base_definition: None,
            value_type: ValueType::Scalar,
        }
    }

    /// Creates a public, instance, readable and writable scalar field.
    pub const fn field(name: &'static str) -> Self {
        Self {
            kind: MemberKind::Field,
            can_write: true,
            ..Self::property(name)
        }
    }

    /// Marks the member as writable.
    pub const fn writable(mut self) -> Self {
        self.can_write = true;
        self
    }

    /// Marks the member as write-only.
    pub const fn write_only(mut self) -> Self {
        self.can_read = false;
        self.can_write = true;
        self
    }

    /// Marks the member as hidden from callers outside the declaring type.
    pub const fn non_public(mut self) -> Self {
        self.visibility = Visibility::NonPublic;
        self
    }

    /// Marks the member as belonging to the type rather than to instances.
    pub const fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Marks the member as an indexer taking `parameters` index arguments.
    pub const fn indexed(mut self, parameters: usize) -> Self {
        self.index_parameters = parameters;
        self
    }

    /// Marks the member as virtual, defined on its declaring type.
    pub const fn virtual_member(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Marks the member as overriding a virtual definition declared on `base_type`.
    pub const fn overrides(mut self, base_type: &'static str) -> Self {
        self.is_virtual = true;
        self.base_definition = Some(base_type);
        self
    }

    /// Declares that the member yields a nested mapped object.
    pub const fn object(mut self, descriptor: fn() -> &'static TypeDescriptor) -> Self {
        self.value_type = ValueType::Object(descriptor);
        self
    }

    /// Declares that the member yields a list of nested mapped objects.
    pub const fn list(mut self, descriptor: fn() -> &'static TypeDescriptor) -> Self {
        self.value_type = ValueType::List(descriptor);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn can_read(&self) -> bool {
        self.can_read
    }

    pub fn can_write(&self) -> bool {
        self.can_write
    }

    pub fn index_parameters(&self) -> usize {
        self.index_parameters
    }

    /// Returns `true` if the member takes index parameters.
    pub fn is_indexed(&self) -> bool {
        self.index_parameters != 0
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    /// Returns the type declaring the root virtual definition, if the member overrides one.
    pub fn base_definition(&self) -> Option<&'static str> {
        self.base_definition
    }

    /// Returns `true` if the member overrides a definition declared on a type other than `owner`.
    pub fn overrides_base_of(&self, owner: &str) -> bool {
        self.is_virtual
            && self
                .base_definition
                .is_some_and(|declaring| declaring != owner)
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }
}

/// Selects which members of a type a lookup returns.
///
/// A member is admitted when it matches one of the enabled lifetimes (instance, static)
/// and one of the enabled visibilities (public, non-public). With `declared_only`, members
/// inherited from base types are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingScope {
    instance: bool,
    statics: bool,
    public: bool,
    non_public: bool,
    declared_only: bool,
}

impl BindingScope {
    /// A scope that admits nothing.
    pub const fn empty() -> Self {
        Self {
            instance: false,
            statics: false,
            public: false,
            non_public: false,
            declared_only: false,
        }
    }

    pub const fn instance(mut self) -> Self {
        self.instance = true;
        self
    }

    pub const fn statics(mut self) -> Self {
        self.statics = true;
        self
    }

    pub const fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub const fn non_public(mut self) -> Self {
        self.non_public = true;
        self
    }

    pub const fn declared_only(mut self) -> Self {
        self.declared_only = true;
        self
    }

    pub fn is_declared_only(&self) -> bool {
        self.declared_only
    }

    /// Returns `true` if the member's lifetime and visibility are both admitted.
    pub fn admits(&self, member: &MemberDescriptor) -> bool {
        let lifetime = if member.is_static() { self.statics } else { self.instance };
        let visibility = match member.visibility() {
            Visibility::Public => self.public,
            Visibility::NonPublic => self.non_public,
        };

        lifetime && visibility
    }
}

impl Default for BindingScope {
    /// Public instance members, including inherited ones.
    fn default() -> Self {
        Self::empty().instance().public()
    }
}

/// Static description of a mapped type: its name, base type and declared members.
#[derive(Debug)]
pub struct TypeDescriptor {
    name: &'static str,
    base: Option<fn() -> &'static TypeDescriptor>,
    members: &'static [MemberDescriptor],
}

impl TypeDescriptor {
    /// Creates a descriptor for a type with no base type.
    pub const fn new(name: &'static str, members: &'static [MemberDescriptor]) -> Self {
        Self { name, base: None, members }
    }

    /// Sets the base type whose members this type inherits.
    pub const fn with_base(mut self, base: fn() -> &'static TypeDescriptor) -> Self {
        self.base = Some(base);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn base(&self) -> Option<&'static TypeDescriptor> {
        self.base.map(|base| base())
    }

    /// Iterates over the base chain, nearest base first.
    pub fn ancestors(&self) -> impl Iterator<Item = &'static TypeDescriptor> + use<> {
        std::iter::successors(self.base(), |descriptor| descriptor.base())
    }

    /// Returns `true` if `other` is this type or one of its bases.
    pub fn is_or_derives_from(&self, other: &TypeDescriptor) -> bool {
        self.name == other.name || self.ancestors().any(|ancestor| ancestor.name == other.name)
    }

    /// Members declared directly on this type.
    pub fn declared_members(&self) -> &'static [MemberDescriptor] {
        self.members
    }

    /// Finds a member declared directly on this type.
    pub fn declared_member(&self, name: &str) -> Option<&'static MemberDescriptor> {
        self.members
            .iter()
            .find(|member| member.name() == name)
    }

    /// Returns the members admitted by `scope`.
    ///
    /// Declared members come first. Unless the scope is declared-only, inherited members follow,
    /// nearest base first, skipping names already returned by a more derived type.
    pub fn members(&self, scope: BindingScope) -> Vec<&'static MemberDescriptor> {
        let mut members: Vec<&'static MemberDescriptor> = self
            .members
            .iter()
            .filter(|member| scope.admits(member))
            .collect();

        if scope.is_declared_only() {
            return members;
        }

        for ancestor in self.ancestors() {
            for member in ancestor.declared_members() {
                if scope.admits(member) && !members.iter().any(|seen| seen.name() == member.name()) {
                    members.push(member);
                }
            }
        }

        members
    }
}
