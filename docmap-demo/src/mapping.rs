//! Class map configuration for the demo entities.

use docmap::prelude::*;

use crate::model::{Contacts, Person, PhoneNumber};

/// Name under which the read-only members convention pack is registered.
pub const CONVENTIONS: &str = "Conventions";

/// Builds the registry used by every store in the demo.
///
/// The read-only members convention is registered for all types before any class map, so
/// each `auto_map` call picks up the entities' read-only accessors. Element names are then
/// pinned explicitly.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Mapping`] if a member is missing or two members collide on
/// an element name.
pub fn class_maps() -> DocumentStoreResult<ClassMapRegistry> {
    let mut builder = ClassMapRegistry::builder();

    builder.register_conventions(
        CONVENTIONS,
        ConventionPack::new().with(ReadOnlyMembersConvention::new()),
        |_| true,
    );

    builder
        .register_class_map::<PhoneNumber>(|m| {
            m.auto_map()?;
            m.map_member("value")?.set_element_name("value");
            Ok(())
        })?
        .register_class_map::<Contacts>(|m| {
            m.auto_map()?;
            m.map_member("phones")?.set_element_name("phones");
            Ok(())
        })?
        .register_class_map::<Person>(|m| {
            m.auto_map()?;
            m.map_member("name")?.set_element_name("name");
            m.map_member("contacts")?.set_element_name("contacts");
            Ok(())
        })?;

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    use docmap::mapping::ID_ELEMENT;

    fn element_names(registry: &ClassMapRegistry, type_name: &str) -> Vec<String> {
        registry
            .class_map(type_name)
            .unwrap()
            .member_maps()
            .iter()
            .map(|map| map.element_name().to_string())
            .collect()
    }

    #[test]
    fn every_entity_has_a_class_map() {
        let registry = class_maps().unwrap();
        let mut names: Vec<&str> = registry.type_names().collect();
        names.sort();

        assert_eq!(names, vec!["Contacts", "Entity", "Person", "PhoneNumber"]);
    }

    #[test]
    fn element_names_are_pinned() {
        let registry = class_maps().unwrap();

        assert_eq!(element_names(&registry, "Entity"), vec![ID_ELEMENT]);
        assert_eq!(element_names(&registry, "PhoneNumber"), vec!["value"]);
        assert_eq!(element_names(&registry, "Contacts"), vec!["phones"]);
        assert_eq!(element_names(&registry, "Person"), vec!["name", "contacts"]);
    }

    #[test]
    fn element_paths_resolve_through_nested_types() {
        let registry = class_maps().unwrap();

        assert_eq!(registry.element_path::<Person>(&["id"]).unwrap(), "_id");
        assert_eq!(
            registry
                .element_path::<Person>(&["contacts", "phones", "$", "value"])
                .unwrap(),
            "contacts.phones.$.value",
        );
    }
}
