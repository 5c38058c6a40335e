//! The insert, fetch and positional-update walk-through run by the demo binary.

use docmap::prelude::*;
use tracing::info;

use crate::model::{Contacts, Person, PhoneNumber};

/// Value written by the positional update.
pub const UPDATED_PHONE: &str = "111-222";

/// What the scenario observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    /// The person as read back after inserting it.
    pub fetched: Person,
    /// The person matched by the find-and-update, if any.
    pub updated: Option<Person>,
}

impl ScenarioReport {
    /// The fetched person's phone numbers joined by `", "`.
    pub fn phones(&self) -> String {
        self.fetched
            .contacts()
            .phones()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Runs the scenario against `store`.
///
/// 1. Inserts a person named "Paul" with no phone numbers and reads it back by id.
/// 2. Prints the name and the phone numbers.
/// 3. Tries to set the value of a phone number that the person does not have, through the
///    positional element matched by `elem_match`. Nothing matches, so nothing changes.
/// 4. Drops the person collection.
///
/// # Errors
///
/// Returns any error raised by the store, and [`DocumentStoreError::DocumentNotFound`] if
/// the inserted person cannot be read back.
pub async fn run<B: StoreBackend>(store: &DocumentStore<B>) -> DocumentStoreResult<ScenarioReport> {
    let people = store.typed_collection::<Person>();
    let registry = store.registry();

    let person = Person::new("Paul", Contacts::new());
    let id = *person.id();
    people.insert_one(person).await?;

    let fetched = people
        .get(vec![id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DocumentStoreError::DocumentNotFound(id.to_hex(), people.name().to_string()))?;

    let report = ScenarioReport { fetched, updated: None };

    println!("{}", report.fetched.name());
    println!("{}", report.phones());

    let absent = PhoneNumber::new(String::new());
    let filter = Filter::eq(registry.element_path::<Person>(&["id"])?, id).and(Filter::elem_match(
        registry.element_path::<Person>(&["contacts", "phones"])?,
        Filter::eq(registry.element_path::<PhoneNumber>(&["id"])?, *absent.id()),
    ));
    let update = Update::builder()
        .set(
            registry.element_path::<Person>(&["contacts", "phones", "$", "value"])?,
            UPDATED_PHONE,
        )
        .build();

    let updated = people.find_one_and_update(filter, update).await?;
    info!(person = %id, matched = updated.is_some(), "positional update finished");

    store.drop_collection(Person::collection_name()).await?;

    Ok(ScenarioReport { updated, ..report })
}
