//! Object-to-document mapping.
//!
//! Each mapped type publishes a static [`TypeDescriptor`] and implements [`Mapped`]. A
//! [`ClassMap`] selects which of its members become document elements and under which names.
//! Class maps are usually filled by [conventions](convention) and then adjusted explicitly.
//! Once every class map is registered, the [`ClassMapRegistry`] encodes and decodes values.

pub mod class_map;
pub mod codec;
pub mod convention;
pub mod member;
pub mod registry;

pub use class_map::{ClassMap, ID_ELEMENT, MemberMap};
pub use codec::{DocumentReader, Mapped, MappedObject, MemberValue};
pub use convention::{
    Convention,
    ConventionPack,
    NamedIdMemberConvention,
    ReadOnlyMembersConvention,
    ReadWriteMembersConvention,
};
pub use member::{BindingScope, MemberDescriptor, MemberKind, TypeDescriptor, ValueType, Visibility};
pub use registry::{ClassMapBuilder, ClassMapRegistry, ClassMapRegistryBuilder, ConventionRegistry};
