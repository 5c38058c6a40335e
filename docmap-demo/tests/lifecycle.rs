use std::{future, sync::Arc};

use docmap::{
    memory::{InMemoryServer, InMemoryStore},
    prelude::*,
};
use docmap_demo::{Contacts, Person, class_maps, lifecycle::serve, run};

type Signal = std::io::Result<&'static str>;

async fn store_with_paul(server: &InMemoryServer) -> (DocumentStore<InMemoryStore>, Person) {
    let store = DocumentStore::new(server.connect("Person").await.unwrap(), Arc::new(class_maps().unwrap()));
    let person = Person::new("Paul", Contacts::new());
    store.typed_collection::<Person>().insert_one(person.clone()).await.unwrap();
    (store, person)
}

async fn explode(_backend: InMemoryStore) -> anyhow::Result<()> {
    panic!("scenario blew up");
}

#[tokio::test]
async fn panicking_run_still_disposes_the_server() {
    let server = InMemoryServer::builder().start().await.unwrap();
    let (store, person) = store_with_paul(&server).await;

    let err = serve(server, "Person", future::pending::<Signal>(), explode)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("panicked"));
    assert!(store.typed_collection::<Person>().get(vec![*person.id()]).await.unwrap().is_empty());
}

#[tokio::test]
async fn shutdown_signal_interrupts_the_run_and_disposes_the_server() {
    let server = InMemoryServer::builder().start().await.unwrap();
    let (store, person) = store_with_paul(&server).await;

    let err = serve(server, "Person", future::ready::<Signal>(Ok("SIGTERM")), |_backend| {
        future::pending::<anyhow::Result<()>>()
    })
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "interrupted by SIGTERM");
    assert!(store.typed_collection::<Person>().get(vec![*person.id()]).await.unwrap().is_empty());
}

#[tokio::test]
async fn completed_run_returns_its_value_after_disposing() {
    let server = InMemoryServer::builder().start().await.unwrap();
    let (store, person) = store_with_paul(&server).await;

    let report = serve(server, "Person", future::pending::<Signal>(), |backend| async move {
        let store = DocumentStore::new(backend, Arc::new(class_maps()?));
        Ok(run(&store).await?)
    })
    .await
    .unwrap();

    assert_eq!(report.fetched.name(), "Paul");
    assert!(store.typed_collection::<Person>().get(vec![*person.id()]).await.unwrap().is_empty());
}
