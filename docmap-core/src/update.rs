//! Partial updates applied to stored documents.
//!
//! An [`Update`] is an ordered list of operations on element paths. A path segment equal to
//! [`POSITIONAL`] addresses the array element matched by the
//! [`elem_match`](crate::query::Filter::elem_match) filter the update is applied with.
//!
//! ```ignore
//! use docmap::update::{Update, POSITIONAL};
//!
//! let path = registry.element_path::<Person>(&["contacts", "phones", POSITIONAL, "value"])?;
//! let update = Update::builder().set(path, "111-222").build();
//! ```

use bson::Bson;

use crate::error::DocumentStoreError;

/// Path segment addressing the array element matched by the update's filter.
pub const POSITIONAL: &str = "$";

/// One modification of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Replaces the element at `path`, creating missing intermediate documents.
    Set { path: String, value: Bson },
    /// Removes the element at `path` if present.
    Unset { path: String },
    /// Appends `value` to the array at `path`, creating the array if missing.
    Push { path: String, value: Bson },
}

impl UpdateOp {
    pub fn path(&self) -> &str {
        match self {
            UpdateOp::Set { path, .. } | UpdateOp::Unset { path } | UpdateOp::Push { path, .. } => path,
        }
    }

    /// Returns `true` if the path contains the positional segment.
    pub fn is_positional(&self) -> bool {
        self.path().split('.').any(|segment| segment == POSITIONAL)
    }
}

/// Operations applied to a document in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub ops: Vec<UpdateOp>,
}

impl Update {
    pub fn builder() -> UpdateBuilder {
        UpdateBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateBuilder {
    update: Update,
}

impl UpdateBuilder {
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.update.ops.push(UpdateOp::Set { path: path.into(), value: value.into() });
        self
    }

    pub fn unset(mut self, path: impl Into<String>) -> Self {
        self.update.ops.push(UpdateOp::Unset { path: path.into() });
        self
    }

    pub fn push(mut self, path: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.update.ops.push(UpdateOp::Push { path: path.into(), value: value.into() });
        self
    }

    pub fn build(self) -> Update {
        self.update
    }
}

/// Which version of the document a find-and-update call returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnDocument {
    /// The document as it was before the update.
    #[default]
    Before,
    /// The document after the update was applied.
    After,
}

/// Walks the operations of an [`Update`].
pub trait UpdateVisitor {
    type Error: Into<DocumentStoreError>;

    fn visit_set(&mut self, path: &str, value: &Bson) -> Result<(), Self::Error>;
    fn visit_unset(&mut self, path: &str) -> Result<(), Self::Error>;
    fn visit_push(&mut self, path: &str, value: &Bson) -> Result<(), Self::Error>;

    fn visit_update(&mut self, update: &Update) -> Result<(), Self::Error> {
        for op in &update.ops {
            match op {
                UpdateOp::Set { path, value } => self.visit_set(path, value)?,
                UpdateOp::Unset { path } => self.visit_unset(path)?,
                UpdateOp::Push { path, value } => self.visit_push(path, value)?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_operation_order() {
        let update = Update::builder()
            .set("name", "Paul")
            .push("contacts.phones", "x")
            .unset("nickname")
            .build();

        let paths: Vec<&str> = update.ops.iter().map(|op| op.path()).collect();
        assert_eq!(paths, vec!["name", "contacts.phones", "nickname"]);
    }

    #[test]
    fn positional_paths_are_detected_by_segment() {
        let update = Update::builder()
            .set("contacts.phones.$.value", "111-222")
            .set("price$", 1)
            .build();

        assert!(update.ops[0].is_positional());
        assert!(!update.ops[1].is_positional());
    }

    #[test]
    fn return_document_defaults_to_before() {
        assert_eq!(ReturnDocument::default(), ReturnDocument::Before);
    }
}
