use std::sync::Arc;

use docmap::{memory::InMemoryServer, prelude::*};

#[derive(Debug, Clone, PartialEq)]
struct Key(ObjectId);

impl Identified for Key {
    fn object_id(&self) -> &ObjectId {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Document)]
#[document(collection = "tags")]
struct Tag {
    #[document(id)]
    key: Key,
    label: String,
}

static TAG: TypeDescriptor = TypeDescriptor::new(
    "Tag",
    &[
        MemberDescriptor::property("key"),
        MemberDescriptor::property("label"),
    ],
);

impl Mapped for Tag {
    fn descriptor() -> &'static TypeDescriptor {
        &TAG
    }

    fn member(&self, name: &str) -> Option<MemberValue<'_>> {
        match name {
            "key" => Some(MemberValue::value(self.key.0)),
            "label" => Some(MemberValue::value(self.label.clone())),
            _ => None,
        }
    }

    fn decode(reader: &DocumentReader<'_>) -> DocumentStoreResult<Self> {
        Ok(Self {
            key: Key(reader.value("key")?),
            label: reader.value("label")?,
        })
    }
}

#[derive(Debug, Clone, Document)]
#[document(collection = "plain")]
struct Plain {
    id: ObjectId,
}

static PLAIN: TypeDescriptor = TypeDescriptor::new("Plain", &[MemberDescriptor::field("id")]);

impl Mapped for Plain {
    fn descriptor() -> &'static TypeDescriptor {
        &PLAIN
    }

    fn member(&self, name: &str) -> Option<MemberValue<'_>> {
        (name == "id").then(|| MemberValue::value(self.id))
    }

    fn decode(reader: &DocumentReader<'_>) -> DocumentStoreResult<Self> {
        Ok(Self { id: reader.value("id")? })
    }
}

fn registry() -> ClassMapRegistry {
    let mut builder = ClassMapRegistry::builder();
    builder.register_conventions(
        "Conventions",
        ConventionPack::new().with(ReadOnlyMembersConvention::new()),
        |_| true,
    );
    builder
        .register_class_map::<Tag>(|m| {
            m.auto_map()?;
            m.set_id_member("key")?;
            Ok(())
        })
        .unwrap();

    builder.build().unwrap()
}

#[test]
fn derive_reads_the_marked_identifier() {
    let id = ObjectId::new();
    let tag = Tag { key: Key(id), label: "red".to_string() };

    assert_eq!(Tag::collection_name(), "tags");
    assert_eq!(tag.id(), &id);
}

#[test]
fn derive_falls_back_to_a_field_named_id() {
    let plain = Plain { id: ObjectId::new() };

    assert_eq!(Plain::collection_name(), "plain");
    assert_eq!(plain.id(), &plain.id);
}

#[tokio::test]
async fn derived_documents_round_trip_through_a_store() {
    let server = InMemoryServer::builder().start().await.unwrap();
    let store = DocumentStore::new(server.connect("tags").await.unwrap(), Arc::new(registry()));
    let tags = store.typed_collection::<Tag>();

    let tag = Tag { key: Key(ObjectId::new()), label: "red".to_string() };
    tags.insert_one(tag.clone()).await.unwrap();

    let fetched = tags.get(vec![*tag.id()]).await.unwrap();
    assert_eq!(fetched, vec![tag.clone()]);

    let stored = store.collection("tags").get(vec![*tag.id()]).await.unwrap();
    assert_eq!(stored[0].get_object_id("_id").unwrap(), *tag.id());
    assert_eq!(stored[0].get_str("label").unwrap(), "red");

    server.dispose().await.unwrap();
}
