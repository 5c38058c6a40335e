//! Filter evaluation against in-memory documents.
//!
//! Field names are element paths. Each segment steps into an embedded document; when a
//! segment meets an array, a numeric segment selects one element and any other segment fans
//! out across the array's embedded documents. A comparison matches if any value reached
//! this way, or any element of a reached array, matches.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use docmap_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, FieldOp, QueryVisitor},
};

/// Comparable view of a BSON value. Integers and doubles compare as numbers.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    ObjectId(ObjectId),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Values with no ordering or equality semantics here.
    Other,
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(items) => Comparable::Array(items.iter().map(Comparable::from).collect()),
            Bson::Document(document) => Comparable::Map(
                document
                    .iter()
                    .map(|(key, value)| (key.as_str(), Comparable::from(value)))
                    .collect(),
            ),
            _ => Comparable::Other,
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Collects every value reachable from `value` along `segments`.
fn collect_path<'a>(value: &'a Bson, segments: &[&str], out: &mut Vec<&'a Bson>) {
    let Some((head, rest)) = segments.split_first() else {
        out.push(value);
        return;
    };

    match value {
        Bson::Document(document) => {
            if let Some(child) = document.get(*head) {
                collect_path(child, rest, out);
            }
        }
        Bson::Array(items) => match head.parse::<usize>() {
            Ok(index) => {
                if let Some(child) = items.get(index) {
                    collect_path(child, rest, out);
                }
            }
            Err(_) => {
                for item in items {
                    if let Bson::Document(document) = item {
                        if let Some(child) = document.get(*head) {
                            collect_path(child, rest, out);
                        }
                    }
                }
            }
        },
        _ => {}
    }
}

/// Returns every value reachable from `document` along the dotted `path`.
pub(crate) fn resolve_path<'a>(document: &'a Document, path: &str) -> Vec<&'a Bson> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();

    if let Some((head, rest)) = segments.split_first() {
        if let Some(value) = document.get(*head) {
            collect_path(value, rest, &mut out);
        }
    }

    out
}

fn compare(field_value: &Bson, op: &FieldOp, value: &Bson) -> bool {
    let left = Comparable::from(field_value);
    let right = Comparable::from(value);

    match op {
        FieldOp::Eq => left == right,
        FieldOp::Ne => left != right,
        FieldOp::Gt => left.partial_cmp(&right) == Some(Ordering::Greater),
        FieldOp::Gte => matches!(left.partial_cmp(&right), Some(Ordering::Greater | Ordering::Equal)),
        FieldOp::Lt => left.partial_cmp(&right) == Some(Ordering::Less),
        FieldOp::Lte => matches!(left.partial_cmp(&right), Some(Ordering::Less | Ordering::Equal)),
        FieldOp::Contains | FieldOp::NotContains => match (&left, &right) {
            (Comparable::String(haystack), Comparable::String(needle)) => haystack.contains(needle),
            (Comparable::Array(items), needle) => items.iter().any(|item| item == needle),
            _ => false,
        },
        FieldOp::StartsWith => match (&left, &right) {
            (Comparable::String(text), Comparable::String(prefix)) => text.starts_with(prefix),
            _ => false,
        },
        FieldOp::EndsWith => match (&left, &right) {
            (Comparable::String(text), Comparable::String(suffix)) => text.ends_with(suffix),
            _ => false,
        },
        FieldOp::AnyOf | FieldOp::NoneOf => match (&left, &right) {
            (Comparable::Array(items), Comparable::Array(candidates)) => {
                candidates.iter().any(|candidate| items.contains(candidate))
            }
            (Comparable::Array(items), candidate) => items.contains(candidate),
            (single, Comparable::Array(candidates)) => candidates.contains(single),
            (single, candidate) => single == candidate,
        },
    }
}

/// Evaluates filters against one document.
///
/// Remembers the array index matched by the first successful `elem_match`, which positional
/// updates use to address the matched element.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
    positional: Option<usize>,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document, positional: None }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }

    /// Index of the array element matched by the first successful `elem_match`, if any.
    pub fn positional(&self) -> Option<usize> {
        self.positional
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        expr: &Expr,
    ) -> DocumentStoreResult<Vec<Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::new(document).evaluate(expr)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }

    fn matches_any(&self, field: &str, op: &FieldOp, value: &Bson) -> bool {
        resolve_path(self.document, field)
            .into_iter()
            .any(|candidate| {
                compare(candidate, op, value)
                    || match (candidate, op) {
                        (Bson::Array(items), FieldOp::Eq | FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte | FieldOp::StartsWith | FieldOp::EndsWith) => {
                            items.iter().any(|item| compare(item, op, value))
                        }
                        _ => false,
                    }
            })
    }
}

impl QueryVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        let positional = self.positional;
        let matched = self.visit_expr(expr)?;
        self.positional = positional;

        Ok(!matched)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(!resolve_path(self.document, field).is_empty() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(match op {
            FieldOp::Ne => !self.matches_any(field, &FieldOp::Eq, value),
            FieldOp::NotContains => !self.matches_any(field, &FieldOp::Contains, value),
            FieldOp::NoneOf => !self.matches_any(field, &FieldOp::AnyOf, value),
            _ => self.matches_any(field, op, value),
        })
    }

    fn visit_elem_match(&mut self, field: &str, filter: &Expr) -> Result<Self::Output, Self::Error> {
        for candidate in resolve_path(self.document, field) {
            let Bson::Array(items) = candidate else {
                continue;
            };

            for (index, item) in items.iter().enumerate() {
                let Bson::Document(element) = item else {
                    continue;
                };

                if DocumentEvaluator::new(element).evaluate(filter)? {
                    self.positional.get_or_insert(index);
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docmap_core::query::Filter;

    fn person(phone_ids: &[ObjectId]) -> Document {
        let phones: Vec<Bson> = phone_ids
            .iter()
            .map(|id| Bson::Document(doc! { "_id": *id, "value": "123-123" }))
            .collect();

        doc! {
            "_id": ObjectId::new(),
            "name": "Paul",
            "contacts": { "_id": ObjectId::new(), "phones": phones },
        }
    }

    #[test]
    fn object_ids_compare_by_value() {
        let document = person(&[]);
        let id = document.get_object_id("_id").unwrap();

        assert!(DocumentEvaluator::new(&document).evaluate(&Filter::eq("_id", id)).unwrap());
        assert!(!DocumentEvaluator::new(&document).evaluate(&Filter::eq("_id", ObjectId::new())).unwrap());
    }

    #[test]
    fn dotted_paths_fan_out_across_arrays() {
        let first = ObjectId::new();
        let document = person(&[ObjectId::new(), first]);

        let found = DocumentEvaluator::new(&document)
            .evaluate(&Filter::eq("contacts.phones._id", first))
            .unwrap();
        assert!(found);

        let by_index = DocumentEvaluator::new(&document)
            .evaluate(&Filter::eq("contacts.phones.1._id", first))
            .unwrap();
        assert!(by_index);
    }

    #[test]
    fn elem_match_records_the_matched_index() {
        let target = ObjectId::new();
        let document = person(&[ObjectId::new(), ObjectId::new(), target]);

        let mut evaluator = DocumentEvaluator::new(&document);
        let matched = evaluator
            .evaluate(&Filter::elem_match("contacts.phones", Filter::eq("_id", target)))
            .unwrap();

        assert!(matched);
        assert_eq!(evaluator.positional(), Some(2));
    }

    #[test]
    fn elem_match_on_empty_array_matches_nothing() {
        let document = person(&[]);
        let mut evaluator = DocumentEvaluator::new(&document);

        let matched = evaluator
            .evaluate(&Filter::elem_match("contacts.phones", Filter::eq("_id", ObjectId::new())))
            .unwrap();

        assert!(!matched);
        assert_eq!(evaluator.positional(), None);
    }

    #[test]
    fn negated_operators_match_missing_elements() {
        let document = person(&[]);

        assert!(DocumentEvaluator::new(&document).evaluate(&Filter::ne("nickname", "P")).unwrap());
        assert!(!DocumentEvaluator::new(&document).evaluate(&Filter::exists("nickname")).unwrap());
        assert!(DocumentEvaluator::new(&document).evaluate(&Filter::not_exists("nickname")).unwrap());
    }

    #[test]
    fn empty_groups() {
        let document = person(&[]);

        assert!(DocumentEvaluator::new(&document).evaluate(&Filter::and(Vec::new())).unwrap());
        assert!(!DocumentEvaluator::new(&document).evaluate(&Filter::or(Vec::new())).unwrap());
    }

    #[test]
    fn string_operators() {
        let document = person(&[]);
        let evaluate = |expr: Expr| DocumentEvaluator::new(&document).evaluate(&expr).unwrap();

        assert!(evaluate(Filter::starts_with("name", "Pa")));
        assert!(evaluate(Filter::ends_with("name", "ul")));
        assert!(evaluate(Filter::contains("name", "au")));
        assert!(evaluate(Filter::any_of("name", vec!["Paul", "Peter"])));
        assert!(evaluate(Filter::none_of("name", vec!["Peter"])));
    }
}
