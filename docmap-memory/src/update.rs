//! Applies [`Update`](docmap_core::update::Update) operations to in-memory documents.

use bson::{Bson, Document};

use docmap_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    mapping::ID_ELEMENT,
    update::{POSITIONAL, UpdateVisitor},
};

/// The slot an operation acts on once its path has been walked.
enum Leaf<'a> {
    Field(&'a mut Document, &'a str),
    Element(&'a mut Vec<Bson>, usize),
}

type LeafFn<'f> = dyn FnMut(Leaf<'_>) -> DocumentStoreResult<()> + 'f;

/// Most `Null` elements a single operation may insert to reach an array index.
const MAX_PADDING: usize = 1_500_000;

fn array_index(segment: &str) -> DocumentStoreResult<usize> {
    segment.parse::<usize>().map_err(|_| {
        DocumentStoreError::Update(format!(
            "cannot use the part '{}' to traverse an array",
            segment,
        ))
    })
}

/// Grows `items` with `Null` until `index` is in bounds.
fn pad_to(items: &mut Vec<Bson>, index: usize) -> DocumentStoreResult<()> {
    if index < items.len() {
        return Ok(());
    }

    if index - items.len() > MAX_PADDING {
        return Err(DocumentStoreError::Update(format!(
            "array index {} would pad an array of length {} by more than {} elements",
            index,
            items.len(),
            MAX_PADDING,
        )));
    }

    items.resize(index + 1, Bson::Null);

    Ok(())
}

fn modify_document(
    document: &mut Document,
    segments: &[String],
    create: bool,
    leaf: &mut LeafFn<'_>,
) -> DocumentStoreResult<()> {
    let Some((head, rest)) = segments.split_first() else {
        return Err(DocumentStoreError::Update("empty update path".to_string()));
    };

    if rest.is_empty() {
        return leaf(Leaf::Field(document, head));
    }

    if !document.contains_key(head) {
        if !create {
            return Ok(());
        }
        document.insert(head.clone(), Document::new());
    }

    match document.get_mut(head) {
        Some(child) => modify_value(child, rest, create, leaf),
        None => Ok(()),
    }
}

fn modify_value(
    value: &mut Bson,
    segments: &[String],
    create: bool,
    leaf: &mut LeafFn<'_>,
) -> DocumentStoreResult<()> {
    match value {
        Bson::Document(document) => modify_document(document, segments, create, leaf),
        Bson::Array(items) => {
            let Some((head, rest)) = segments.split_first() else {
                return Err(DocumentStoreError::Update("empty update path".to_string()));
            };
            let index = array_index(head)?;

            if rest.is_empty() {
                return leaf(Leaf::Element(items, index));
            }

            if index >= items.len() {
                if !create {
                    return Ok(());
                }
                pad_to(items, index)?;
            }

            let child = &mut items[index];
            if create && matches!(child, Bson::Null) {
                *child = Bson::Document(Document::new());
            }

            modify_value(child, rest, create, leaf)
        }
        other if create => Err(DocumentStoreError::Update(format!(
            "cannot create field '{}' in element of type {:?}",
            segments.first().map(String::as_str).unwrap_or_default(),
            other.element_type(),
        ))),
        _ => Ok(()),
    }
}

/// Applies update operations to one document.
///
/// `positional` is the array index recorded while matching the update's filter; it replaces
/// the positional segment in every path.
pub(crate) struct DocumentUpdater<'a> {
    document: &'a mut Document,
    positional: Option<usize>,
}

impl<'a> DocumentUpdater<'a> {
    pub fn new(document: &'a mut Document, positional: Option<usize>) -> Self {
        Self { document, positional }
    }

    fn segments(&self, path: &str) -> DocumentStoreResult<Vec<String>> {
        let segments = path
            .split('.')
            .map(|segment| {
                if segment == POSITIONAL {
                    return self
                        .positional
                        .map(|index| index.to_string())
                        .ok_or_else(|| DocumentStoreError::Update(format!(
                            "the positional operator did not find the match needed from the query for path '{}'",
                            path,
                        )));
                }

                if segment.parse::<i64>().is_ok_and(|index| index < 0) {
                    return Err(DocumentStoreError::Update(format!(
                        "negative array index '{}' in path '{}'",
                        segment, path,
                    )));
                }

                if segment.is_empty() {
                    return Err(DocumentStoreError::Update(format!("empty segment in path '{}'", path)));
                }

                Ok(segment.to_string())
            })
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        if segments.first().is_some_and(|head| head == ID_ELEMENT) {
            return Err(DocumentStoreError::Update(format!(
                "performing an update on the path '{}' would modify the immutable field '{}'",
                path, ID_ELEMENT,
            )));
        }

        Ok(segments)
    }
}

impl UpdateVisitor for DocumentUpdater<'_> {
    type Error = DocumentStoreError;

    fn visit_set(&mut self, path: &str, value: &Bson) -> Result<(), Self::Error> {
        let segments = self.segments(path)?;

        modify_document(self.document, &segments, true, &mut |leaf| {
            match leaf {
                Leaf::Field(document, key) => {
                    document.insert(key, value.clone());
                }
                Leaf::Element(items, index) => {
                    pad_to(items, index)?;
                    items[index] = value.clone();
                }
            }

            Ok(())
        })
    }

    fn visit_unset(&mut self, path: &str) -> Result<(), Self::Error> {
        let segments = self.segments(path)?;

        modify_document(self.document, &segments, false, &mut |leaf| {
            match leaf {
                Leaf::Field(document, key) => {
                    document.remove(key);
                }
                Leaf::Element(items, index) => {
                    if let Some(item) = items.get_mut(index) {
                        *item = Bson::Null;
                    }
                }
            }

            Ok(())
        })
    }

    fn visit_push(&mut self, path: &str, value: &Bson) -> Result<(), Self::Error> {
        let segments = self.segments(path)?;

        modify_document(self.document, &segments, true, &mut |leaf| {
            let target = match leaf {
                Leaf::Field(document, key) => {
                    if !document.contains_key(key) {
                        document.insert(key, Bson::Array(Vec::new()));
                    }
                    document.get_mut(key)
                }
                Leaf::Element(items, index) => {
                    pad_to(items, index)?;
                    let item = &mut items[index];
                    if matches!(item, Bson::Null) {
                        *item = Bson::Array(Vec::new());
                    }
                    Some(item)
                }
            };

            match target {
                Some(Bson::Array(items)) => {
                    items.push(value.clone());
                    Ok(())
                }
                Some(other) => Err(DocumentStoreError::Update(format!(
                    "cannot push to non-array element of type {:?}",
                    other.element_type(),
                ))),
                None => Ok(()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};
    use docmap_core::update::Update;

    fn apply(document: &mut Document, positional: Option<usize>, update: Update) -> DocumentStoreResult<()> {
        DocumentUpdater::new(document, positional).visit_update(&update)
    }

    fn phones() -> Document {
        doc! {
            "_id": ObjectId::new(),
            "contacts": {
                "phones": [
                    { "_id": ObjectId::new(), "value": "123-123" },
                    { "_id": ObjectId::new(), "value": "555-000" },
                ],
            },
        }
    }

    #[test]
    fn positional_set_changes_only_the_matched_element() {
        let mut document = phones();
        apply(&mut document, Some(1), Update::builder().set("contacts.phones.$.value", "111-222").build()).unwrap();

        let items = document.get_document("contacts").unwrap().get_array("phones").unwrap();
        assert_eq!(items[0].as_document().unwrap().get_str("value").unwrap(), "123-123");
        assert_eq!(items[1].as_document().unwrap().get_str("value").unwrap(), "111-222");
    }

    #[test]
    fn positional_without_match_is_rejected() {
        let mut document = phones();
        let err = apply(&mut document, None, Update::builder().set("contacts.phones.$.value", "x").build())
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::Update(_)));
    }

    #[test]
    fn negative_indexes_are_rejected() {
        let mut document = phones();
        let err = apply(&mut document, None, Update::builder().set("contacts.phones.-1.value", "x").build())
            .unwrap_err();

        assert!(err.to_string().contains("negative array index"));
    }

    #[test]
    fn out_of_range_indexes_are_rejected() {
        for path in ["tags.18446744073709551615", "tags.4000000000", "matrix.4000000000.value"] {
            let mut document = doc! { "_id": 1, "tags": [], "matrix": [] };
            let before = document.clone();

            let err = apply(&mut document, None, Update::builder().set(path, "x").build()).unwrap_err();
            assert!(matches!(err, DocumentStoreError::Update(_)), "{}", path);
            assert_eq!(document, before);
        }

        let mut document = doc! { "_id": 1, "tags": [] };
        let err = apply(&mut document, None, Update::builder().push("tags.4000000000", "x").build()).unwrap_err();
        assert!(matches!(err, DocumentStoreError::Update(_)));
    }

    #[test]
    fn set_creates_missing_documents_and_pads_arrays() {
        let mut document = doc! { "_id": 1, "tags": [] };
        apply(
            &mut document,
            None,
            Update::builder()
                .set("profile.address.city", "Oslo")
                .set("tags.2", "c")
                .build(),
        )
        .unwrap();

        assert_eq!(
            document.get_document("profile").unwrap().get_document("address").unwrap().get_str("city").unwrap(),
            "Oslo",
        );
        assert_eq!(document.get_array("tags").unwrap(), &vec![Bson::Null, Bson::Null, Bson::from("c")]);
    }

    #[test]
    fn unset_and_push() {
        let mut document = doc! { "_id": 1, "name": "Paul" };
        apply(
            &mut document,
            None,
            Update::builder()
                .unset("name")
                .unset("missing.path")
                .push("tags", "a")
                .push("tags", "b")
                .build(),
        )
        .unwrap();

        assert!(!document.contains_key("name"));
        assert_eq!(document.get_array("tags").unwrap().len(), 2);

        let err = apply(&mut document, None, Update::builder().push("_id", 2).build()).unwrap_err();
        assert!(matches!(err, DocumentStoreError::Update(_)));
    }

    #[test]
    fn scalar_in_path_is_rejected() {
        let mut document = doc! { "_id": 1, "name": "Paul" };
        let err = apply(&mut document, None, Update::builder().set("name.first", "P").build()).unwrap_err();

        assert!(matches!(err, DocumentStoreError::Update(_)));
    }
}
