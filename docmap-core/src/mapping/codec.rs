//! Traits connecting Rust types to their class maps, and the reader used while decoding.

use bson::{Bson, Document, de::deserialize_from_bson};
use serde::de::DeserializeOwned;

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    mapping::{
        class_map::ClassMap,
        member::TypeDescriptor,
        registry::ClassMapRegistry,
    },
};

/// A type that can be encoded to and decoded from documents through a class map.
///
/// # Example
///
/// ```ignore
/// use docmap::mapping::{DocumentReader, Mapped, MemberDescriptor, MemberValue, TypeDescriptor};
///
/// static PHONE_NUMBER: TypeDescriptor = TypeDescriptor::new(
///     "PhoneNumber",
///     &[MemberDescriptor::property("value")],
/// );
///
/// impl Mapped for PhoneNumber {
///     fn descriptor() -> &'static TypeDescriptor {
///         &PHONE_NUMBER
///     }
///
///     fn member(&self, name: &str) -> Option<MemberValue<'_>> {
///         match name {
///             "value" => Some(MemberValue::value(self.value.clone())),
///             _ => None,
///         }
///     }
///
///     fn decode(reader: &DocumentReader<'_>) -> DocumentStoreResult<Self> {
///         Ok(Self { value: reader.value("value")? })
///     }
/// }
/// ```
pub trait Mapped: Send + Sync + Sized + 'static {
    /// Returns the static description of this type's members.
    fn descriptor() -> &'static TypeDescriptor;

    /// Reads a member by name, including members inherited from base types.
    ///
    /// Returns `None` if the type has no readable member with that name.
    fn member(&self, name: &str) -> Option<MemberValue<'_>>;

    /// Rebuilds a value from the elements its class map exposes.
    fn decode(reader: &DocumentReader<'_>) -> DocumentStoreResult<Self>;
}

/// Object-safe view over a [`Mapped`] value, used for nested encoding.
pub trait MappedObject: Send + Sync {
    fn type_descriptor(&self) -> &'static TypeDescriptor;

    fn read_member(&self, name: &str) -> Option<MemberValue<'_>>;
}

impl<T: Mapped> MappedObject for T {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        T::descriptor()
    }

    fn read_member(&self, name: &str) -> Option<MemberValue<'_>> {
        self.member(name)
    }
}

/// The value of a member, as handed to the encoder.
pub enum MemberValue<'a> {
    /// A value stored as-is.
    Value(Bson),
    /// A nested object encoded through its own class map.
    Object(&'a dyn MappedObject),
    /// A list of nested objects, each encoded through its own class map.
    List(Vec<&'a dyn MappedObject>),
}

impl<'a> MemberValue<'a> {
    pub fn value(value: impl Into<Bson>) -> Self {
        MemberValue::Value(value.into())
    }

    pub fn object<T: Mapped>(object: &'a T) -> Self {
        MemberValue::Object(object)
    }

    pub fn list<T: Mapped>(items: &'a [T]) -> Self {
        MemberValue::List(
            items
                .iter()
                .map(|item| item as &dyn MappedObject)
                .collect(),
        )
    }
}

impl std::fmt::Debug for MemberValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            MemberValue::Object(object) => f
                .debug_tuple("Object")
                .field(&object.type_descriptor().name())
                .finish(),
            MemberValue::List(items) => f
                .debug_tuple("List")
                .field(&items.len())
                .finish(),
        }
    }
}

/// Reads members of one type out of a document, resolving element names through its class map.
pub struct DocumentReader<'a> {
    registry: &'a ClassMapRegistry,
    class_map: &'a ClassMap,
    document: &'a Document,
}

impl<'a> DocumentReader<'a> {
    pub(crate) fn new(
        registry: &'a ClassMapRegistry,
        class_map: &'a ClassMap,
        document: &'a Document,
    ) -> Self {
        Self { registry, class_map, document }
    }

    /// The raw document being decoded.
    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn type_name(&self) -> &'static str {
        self.class_map.type_name()
    }

    fn element_name(&self, member: &str) -> DocumentStoreResult<Option<&'a str>> {
        Ok(self
            .registry
            .find_member_map(self.class_map, member)?
            .map(|map| map.element_name()))
    }

    fn required(&self, member: &str) -> DocumentStoreResult<&'a Bson> {
        let element = self
            .element_name(member)?
            .ok_or_else(|| DocumentStoreError::Mapping(format!(
                "member '{}' of type {} is not mapped",
                member,
                self.type_name(),
            )))?;

        self.document
            .get(element)
            .ok_or_else(|| DocumentStoreError::Serialization(format!(
                "missing element '{}' for member '{}' of type {}",
                element,
                member,
                self.type_name(),
            )))
    }

    /// Reads a required member.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Mapping`] if the member is not mapped and
    /// [`DocumentStoreError::Serialization`] if the element is missing or has the wrong type.
    pub fn value<V: DeserializeOwned>(&self, member: &str) -> DocumentStoreResult<V> {
        Ok(deserialize_from_bson(self.required(member)?.clone())?)
    }

    /// Reads a member that may be unmapped, missing or null.
    pub fn optional<V: DeserializeOwned>(&self, member: &str) -> DocumentStoreResult<Option<V>> {
        let element = match self.element_name(member)? {
            Some(element) => element,
            None => return Ok(None),
        };

        match self.document.get(element) {
            None | Some(Bson::Null) => Ok(None),
            Some(value) => Ok(Some(deserialize_from_bson(value.clone())?)),
        }
    }

    /// Reads a required nested object through its own class map.
    pub fn object<T: Mapped>(&self, member: &str) -> DocumentStoreResult<T> {
        match self.required(member)? {
            Bson::Document(document) => self.registry.decode::<T>(document),
            other => Err(DocumentStoreError::Serialization(format!(
                "member '{}' of type {} expected a document, found {:?}",
                member,
                self.type_name(),
                other.element_type(),
            ))),
        }
    }

    /// Reads a required list of nested objects, preserving element order.
    pub fn list<T: Mapped>(&self, member: &str) -> DocumentStoreResult<Vec<T>> {
        match self.required(member)? {
            Bson::Array(items) => items
                .iter()
                .map(|item| match item {
                    Bson::Document(document) => self.registry.decode::<T>(document),
                    other => Err(DocumentStoreError::Serialization(format!(
                        "member '{}' of type {} expected a list of documents, found {:?}",
                        member,
                        self.type_name(),
                        other.element_type(),
                    ))),
                })
                .collect(),
            other => Err(DocumentStoreError::Serialization(format!(
                "member '{}' of type {} expected an array, found {:?}",
                member,
                self.type_name(),
                other.element_type(),
            ))),
        }
    }

    /// Decodes the part of the document owned by the base type `B`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Mapping`] if `B` is not a base of the type being decoded.
    pub fn base<B: Mapped>(&self) -> DocumentStoreResult<B> {
        let descriptor = self.class_map.descriptor();

        if !descriptor
            .ancestors()
            .any(|ancestor| ancestor.name() == B::descriptor().name())
        {
            return Err(DocumentStoreError::Mapping(format!(
                "type {} is not a base of {}",
                B::descriptor().name(),
                descriptor.name(),
            )));
        }

        self.registry.decode::<B>(self.document)
    }
}
