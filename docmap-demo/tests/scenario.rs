use std::sync::Arc;

use docmap::{memory::InMemoryServer, prelude::*};
use docmap_demo::{Contacts, Person, PhoneNumber, class_maps, run, scenario::UPDATED_PHONE};

async fn store(server: &InMemoryServer) -> DocumentStore<docmap::memory::InMemoryStore> {
    DocumentStore::new(server.connect("Person").await.unwrap(), Arc::new(class_maps().unwrap()))
}

fn phone_filter(registry: &ClassMapRegistry, person: &Person, phone: &ObjectId) -> Expr {
    Filter::eq(registry.element_path::<Person>(&["id"]).unwrap(), *person.id()).and(Filter::elem_match(
        registry.element_path::<Person>(&["contacts", "phones"]).unwrap(),
        Filter::eq(registry.element_path::<PhoneNumber>(&["id"]).unwrap(), *phone),
    ))
}

fn positional_update(registry: &ClassMapRegistry) -> Update {
    Update::builder()
        .set(
            registry
                .element_path::<Person>(&["contacts", "phones", "$", "value"])
                .unwrap(),
            UPDATED_PHONE,
        )
        .build()
}

#[tokio::test]
async fn scenario_fetches_paul_and_updates_nothing() {
    let server = InMemoryServer::builder().start().await.unwrap();
    let store = store(&server).await;

    let report = run(&store).await.unwrap();

    assert_eq!(report.fetched.name(), "Paul");
    assert!(report.fetched.contacts().phones().is_empty());
    assert_eq!(report.phones(), "");
    assert!(report.updated.is_none());
    assert!(!store.list_collections().await.unwrap().contains(&"test".to_string()));

    server.dispose().await.unwrap();
}

#[tokio::test]
async fn positional_update_changes_only_the_matched_phone() {
    let server = InMemoryServer::builder().start().await.unwrap();
    let store = store(&server).await;
    let people = store.typed_collection::<Person>();

    let first = PhoneNumber::new("123-123");
    let second = PhoneNumber::new("456-456");
    let mut contacts = Contacts::new();
    contacts.add_phone(first.clone());
    contacts.add_phone(second.clone());
    let person = Person::new("Paul", contacts);
    people.insert_one(person.clone()).await.unwrap();

    let before = people
        .find_one_and_update(
            phone_filter(store.registry(), &person, second.id()),
            positional_update(store.registry()),
        )
        .await
        .unwrap();
    assert_eq!(before, Some(person.clone()));

    let after = people.get(vec![*person.id()]).await.unwrap().remove(0);
    let values: Vec<String> = after
        .contacts()
        .phones()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(values, vec!["123-123".to_string(), UPDATED_PHONE.to_string()]);
    assert_eq!(after.contacts().phones()[1].id(), second.id());

    server.dispose().await.unwrap();
}

#[tokio::test]
async fn unmatched_update_leaves_the_person_unchanged() {
    let server = InMemoryServer::builder().start().await.unwrap();
    let store = store(&server).await;
    let people = store.typed_collection::<Person>();

    let mut contacts = Contacts::new();
    contacts.add_phone(PhoneNumber::new("123-123"));
    let person = Person::new("Paul", contacts);
    people.insert_one(person.clone()).await.unwrap();

    let absent = PhoneNumber::new("000");
    let updated = people
        .find_one_and_update(
            phone_filter(store.registry(), &person, absent.id()),
            positional_update(store.registry()),
        )
        .await
        .unwrap();

    assert!(updated.is_none());
    assert_eq!(people.get(vec![*person.id()]).await.unwrap(), vec![person]);

    server.dispose().await.unwrap();
}

#[tokio::test]
async fn disposing_the_server_discards_stored_people() {
    let server = InMemoryServer::builder().start().await.unwrap();
    let store = store(&server).await;
    let person = Person::new("Paul", Contacts::new());

    store.typed_collection::<Person>().insert_one(person.clone()).await.unwrap();
    server.dispose().await.unwrap();

    assert!(store.typed_collection::<Person>().get(vec![*person.id()]).await.unwrap().is_empty());
}
