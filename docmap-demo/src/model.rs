//! The entities stored by the demo: a person with a set of contacts holding phone numbers.
//!
//! Every entity exposes read-only accessors only. Members reach the document through
//! [`ReadOnlyMembersConvention`](docmap::mapping::ReadOnlyMembersConvention), registered in
//! [`crate::mapping`].

use std::fmt;

use docmap::prelude::*;

static ENTITY: TypeDescriptor = TypeDescriptor::new(
    "Entity",
    &[MemberDescriptor::property("id")],
);

static PHONE_NUMBER: TypeDescriptor = TypeDescriptor::new(
    "PhoneNumber",
    &[MemberDescriptor::property("value")],
)
.with_base(entity);

static CONTACTS: TypeDescriptor = TypeDescriptor::new(
    "Contacts",
    &[MemberDescriptor::property("phones").list(phone_number)],
)
.with_base(entity);

static PERSON: TypeDescriptor = TypeDescriptor::new(
    "Person",
    &[
        MemberDescriptor::property("name"),
        MemberDescriptor::property("contacts").object(contacts),
    ],
)
.with_base(entity);

fn entity() -> &'static TypeDescriptor {
    &ENTITY
}

fn phone_number() -> &'static TypeDescriptor {
    &PHONE_NUMBER
}

fn contacts() -> &'static TypeDescriptor {
    &CONTACTS
}

/// Base of every stored type: an identifier assigned once, at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    id: ObjectId,
}

impl Entity {
    pub fn new() -> Self {
        Self { id: ObjectId::new() }
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl Identified for Entity {
    fn object_id(&self) -> &ObjectId {
        &self.id
    }
}

impl Mapped for Entity {
    fn descriptor() -> &'static TypeDescriptor {
        &ENTITY
    }

    fn member(&self, name: &str) -> Option<MemberValue<'_>> {
        match name {
            "id" => Some(MemberValue::value(self.id)),
            _ => None,
        }
    }

    fn decode(reader: &DocumentReader<'_>) -> DocumentStoreResult<Self> {
        Ok(Self { id: reader.value("id")? })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber {
    entity: Entity,
    value: String,
}

impl PhoneNumber {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            entity: Entity::new(),
            value: value.into(),
        }
    }

    pub fn id(&self) -> &ObjectId {
        self.entity.id()
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl Mapped for PhoneNumber {
    fn descriptor() -> &'static TypeDescriptor {
        &PHONE_NUMBER
    }

    fn member(&self, name: &str) -> Option<MemberValue<'_>> {
        match name {
            "value" => Some(MemberValue::value(self.value.clone())),
            _ => self.entity.member(name),
        }
    }

    fn decode(reader: &DocumentReader<'_>) -> DocumentStoreResult<Self> {
        Ok(Self {
            entity: reader.base()?,
            value: reader.value("value")?,
        })
    }
}

/// An ordered collection of phone numbers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Contacts {
    entity: Entity,
    phones: Vec<PhoneNumber>,
}

impl Contacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> &ObjectId {
        self.entity.id()
    }

    /// Returns a snapshot of the phone numbers.
    ///
    /// Changing the returned list does not affect these contacts; use
    /// [`add_phone`](Self::add_phone) instead.
    pub fn phones(&self) -> Vec<PhoneNumber> {
        self.phones.clone()
    }

    pub fn add_phone(&mut self, phone: PhoneNumber) {
        self.phones.push(phone);
    }
}

impl Mapped for Contacts {
    fn descriptor() -> &'static TypeDescriptor {
        &CONTACTS
    }

    fn member(&self, name: &str) -> Option<MemberValue<'_>> {
        match name {
            "phones" => Some(MemberValue::list(&self.phones)),
            _ => self.entity.member(name),
        }
    }

    fn decode(reader: &DocumentReader<'_>) -> DocumentStoreResult<Self> {
        Ok(Self {
            entity: reader.base()?,
            phones: reader.list("phones")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Document)]
#[document(collection = "test")]
pub struct Person {
    #[document(id)]
    entity: Entity,
    name: String,
    contacts: Contacts,
}

impl Person {
    pub fn new(name: impl Into<String>, contacts: Contacts) -> Self {
        Self {
            entity: Entity::new(),
            name: name.into(),
            contacts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contacts(&self) -> &Contacts {
        &self.contacts
    }
}

impl Mapped for Person {
    fn descriptor() -> &'static TypeDescriptor {
        &PERSON
    }

    fn member(&self, name: &str) -> Option<MemberValue<'_>> {
        match name {
            "name" => Some(MemberValue::value(self.name.clone())),
            "contacts" => Some(MemberValue::object(&self.contacts)),
            _ => self.entity.member(name),
        }
    }

    fn decode(reader: &DocumentReader<'_>) -> DocumentStoreResult<Self> {
        Ok(Self {
            entity: reader.base()?,
            name: reader.value("name")?,
            contacts: reader.object("contacts")?,
        })
    }
}
