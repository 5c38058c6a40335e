use std::{collections::HashSet, sync::Arc};

use docmap::{
    bson::{Bson, doc},
    memory::InMemoryServer,
    prelude::*,
};
use docmap_demo::{Contacts, Person, PhoneNumber, class_maps};

#[test]
fn person_with_empty_contacts_round_trips() {
    let registry = class_maps().unwrap();
    let person = Person::new("Paul", Contacts::new());

    let encoded = person.to_document(&registry).unwrap();
    let decoded = Person::from_document(&encoded, &registry).unwrap();

    assert_eq!(decoded, person);
    assert_eq!(decoded.name(), "Paul");
    assert!(decoded.contacts().phones().is_empty());
}

#[test]
fn stored_document_uses_the_mapped_element_names() {
    let registry = class_maps().unwrap();
    let mut contacts = Contacts::new();
    let phone = PhoneNumber::new("123-123");
    contacts.add_phone(phone.clone());
    let person = Person::new("Paul", contacts.clone());

    let encoded = person.to_document(&registry).unwrap();

    assert_eq!(
        encoded,
        doc! {
            "_id": *person.id(),
            "name": "Paul",
            "contacts": {
                "_id": *contacts.id(),
                "phones": [
                    { "_id": *phone.id(), "value": "123-123" },
                ],
            },
        },
    );
}

#[test]
fn json_form_uses_extended_json_for_identifiers() {
    let registry = class_maps().unwrap();
    let person = Person::new("Paul", Contacts::new());

    let json = person.to_json(&registry).unwrap();

    assert_eq!(json["name"], "Paul");
    assert_eq!(json["_id"]["$oid"], person.id().to_hex());
    assert_eq!(json["contacts"]["phones"].as_array().map(Vec::len), Some(0));
}

#[test]
fn phones_keep_their_order_through_a_round_trip() {
    let registry = class_maps().unwrap();
    let mut contacts = Contacts::new();
    for value in ["123-123", "456-456", "789-789"] {
        contacts.add_phone(PhoneNumber::new(value));
    }
    let person = Person::new("Paul", contacts);

    let decoded = Person::from_document(&person.to_document(&registry).unwrap(), &registry).unwrap();
    let values: Vec<String> = decoded
        .contacts()
        .phones()
        .iter()
        .map(|phone| phone.value().to_string())
        .collect();

    assert_eq!(values, vec!["123-123", "456-456", "789-789"]);
}

#[test]
fn decoding_without_a_required_element_fails() {
    let registry = class_maps().unwrap();
    let person = Person::new("Paul", Contacts::new());
    let mut encoded = person.to_document(&registry).unwrap();
    encoded.remove("name");

    assert!(matches!(
        Person::from_document(&encoded, &registry),
        Err(DocumentStoreError::Serialization(_)),
    ));
}

#[test]
fn mutating_the_phone_snapshot_leaves_contacts_unchanged() {
    let mut contacts = Contacts::new();
    contacts.add_phone(PhoneNumber::new("123-123"));

    let mut snapshot = contacts.phones();
    snapshot.clear();

    assert_eq!(contacts.phones().len(), 1);
}

#[test]
fn ten_thousand_entities_have_distinct_identifiers() {
    let ids: HashSet<ObjectId> = (0..10_000)
        .map(|_| *PhoneNumber::new("000").id())
        .collect();

    assert_eq!(ids.len(), 10_000);
}

#[tokio::test]
async fn person_is_stored_under_its_identifier() {
    let server = InMemoryServer::builder().start().await.unwrap();
    let store = DocumentStore::new(server.connect("Person").await.unwrap(), Arc::new(class_maps().unwrap()));
    let person = Person::new("Paul", Contacts::new());

    store.typed_collection::<Person>().insert_one(person.clone()).await.unwrap();

    let raw = store.collection("test").get(vec![*person.id()]).await.unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].get("_id"), Some(&Bson::ObjectId(*person.id())));
    assert_eq!(raw[0].get_document("contacts").unwrap().get_array("phones").unwrap().len(), 0);

    let err = store
        .typed_collection::<Person>()
        .insert_one(person)
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::DocumentAlreadyExists(_, _)));

    server.dispose().await.unwrap();
}
