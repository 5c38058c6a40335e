//! Translation of filters and updates into MongoDB query and update documents.

use bson::{Bson, Document, doc};

use docmap_core::{
    error::DocumentStoreError,
    query::{Expr, FieldOp, QueryVisitor},
    update::{Update, UpdateVisitor},
};

fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

/// Translates filter expressions into MongoDB query documents.
pub(crate) struct MongoQueryTranslator;

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Ne => doc! { "$ne": value },
                FieldOp::Gt => doc! { "$gt": value },
                FieldOp::Gte => doc! { "$gte": value },
                FieldOp::Lt => doc! { "$lt": value },
                FieldOp::Lte => doc! { "$lte": value },
                FieldOp::Contains => match value {
                    Bson::String(s) => doc! { "$regex": escape_regex(s) },
                    Bson::Array(items) => doc! { "$all": items },
                    other => doc! { "$eq": other },
                },
                FieldOp::NotContains => match value {
                    Bson::String(s) => doc! { "$not": { "$regex": escape_regex(s) } },
                    Bson::Array(items) => doc! { "$nin": items },
                    other => doc! { "$ne": other },
                },
                FieldOp::StartsWith => match value {
                    Bson::String(s) => doc! { "$regex": format!("^{}", escape_regex(s)) },
                    _ => return Err(DocumentStoreError::Backend("StartsWith operator requires a string value".to_string())),
                },
                FieldOp::EndsWith => match value {
                    Bson::String(s) => doc! { "$regex": format!("{}$", escape_regex(s)) },
                    _ => return Err(DocumentStoreError::Backend("EndsWith operator requires a string value".to_string())),
                },
                FieldOp::AnyOf => match value {
                    Bson::Array(_) => doc! { "$in": value },
                    other => doc! { "$in": [other] },
                },
                FieldOp::NoneOf => match value {
                    Bson::Array(_) => doc! { "$nin": value },
                    other => doc! { "$nin": [other] },
                },
            }
        })
    }

    fn visit_elem_match(&mut self, field: &str, filter: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$elemMatch": self.visit_expr(filter)? },
        })
    }
}

/// Collects update operations into a MongoDB update document.
#[derive(Default)]
pub(crate) struct MongoUpdateTranslator {
    set: Document,
    unset: Document,
    push: Document,
}

impl MongoUpdateTranslator {
    pub fn translate(update: &Update) -> Result<Document, DocumentStoreError> {
        let mut translator = Self::default();
        translator.visit_update(update)?;

        let mut document = Document::new();
        for (operator, fields) in [("$set", translator.set), ("$unset", translator.unset), ("$push", translator.push)] {
            if !fields.is_empty() {
                document.insert(operator, fields);
            }
        }

        Ok(document)
    }

    fn check_path(path: &str) -> Result<(), DocumentStoreError> {
        match path
            .split('.')
            .find(|segment| segment.parse::<i64>().is_ok_and(|index| index < 0))
        {
            Some(segment) => Err(DocumentStoreError::Update(format!(
                "negative array index '{}' in path '{}'",
                segment, path,
            ))),
            None => Ok(()),
        }
    }
}

impl UpdateVisitor for MongoUpdateTranslator {
    type Error = DocumentStoreError;

    fn visit_set(&mut self, path: &str, value: &Bson) -> Result<(), Self::Error> {
        Self::check_path(path)?;
        self.set.insert(path, value.clone());

        Ok(())
    }

    fn visit_unset(&mut self, path: &str) -> Result<(), Self::Error> {
        Self::check_path(path)?;
        self.unset.insert(path, "");

        Ok(())
    }

    fn visit_push(&mut self, path: &str, value: &Bson) -> Result<(), Self::Error> {
        Self::check_path(path)?;
        self.push.insert(path, value.clone());

        Ok(())
    }
}
