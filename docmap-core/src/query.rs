//! Filter expressions and queries over stored documents.
//!
//! Field names in filters are element paths: dotted names that walk into embedded documents
//! and fan out across arrays. Use
//! [`ClassMapRegistry::element_path`](crate::mapping::ClassMapRegistry::element_path) to
//! derive them from member names instead of spelling element names by hand.
//!
//! ```ignore
//! use docmap::query::{Filter, Query, SortDirection};
//!
//! let phones = registry.element_path::<Person>(&["contacts", "phones"])?;
//! let phone_id = registry.element_path::<PhoneNumber>(&["id"])?;
//!
//! let filter = Filter::eq("_id", person.id)
//!     .and(Filter::elem_match(phones, Filter::eq(phone_id, phone.id)));
//!
//! let query = Query::builder()
//!     .filter(filter)
//!     .sort("name", SortDirection::Asc)
//!     .limit(10)
//!     .build();
//! ```
//!
//! Backends consume expressions through [`QueryVisitor`].

use bson::Bson;

use crate::error::DocumentStoreError;

/// Order in which sorted results are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest values first.
    Asc,
    /// Largest values first.
    Desc,
}

/// Orders query results by one element path.
#[derive(Debug, Clone)]
pub struct Sort {
    /// Element path whose first resolved value is the sort key.
    pub field: String,
    /// Direction of the ordering.
    pub direction: SortDirection,
}

/// Comparison applied by an [`Expr::Field`] expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Equal to the value.
    Eq,
    /// Not equal to the value; also matches when the element is missing.
    Ne,
    /// Greater than the value.
    Gt,
    /// Greater than or equal to the value.
    Gte,
    /// Less than the value.
    Lt,
    /// Less than or equal to the value.
    Lte,
    /// Substring of a string, or member of an array.
    Contains,
    /// Neither a substring nor an array member.
    NotContains,
    /// String prefix.
    StartsWith,
    /// String suffix.
    EndsWith,
    /// The element equals, or the array holds, any of the given values.
    AnyOf,
    /// The element equals, and the array holds, none of the given values.
    NoneOf,
}

/// A predicate over a document.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Every expression must match.
    And(Vec<Expr>),
    /// At least one expression must match.
    Or(Vec<Expr>),
    /// The expression must not match.
    Not(Box<Expr>),
    /// Matches when the element at the path is present (`true`) or absent (`false`).
    Exists(String, bool),
    /// Compares the values at an element path.
    Field {
        /// Element path; dotted segments walk embedded documents and fan out over arrays.
        field: String,
        /// Comparison to apply.
        op: FieldOp,
        /// Operand of the comparison.
        value: Bson,
    },
    /// Matches when at least one element of the array at `field` is a document satisfying
    /// `filter`. Paths inside `filter` are relative to the array element.
    ///
    /// The first matching element is the one addressed by the positional path segment
    /// [`POSITIONAL`](crate::update::POSITIONAL) in an update applied with this filter.
    ElemMatch {
        field: String,
        filter: Box<Expr>,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines with `other` under AND, flattening into an existing AND list.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines with `other` under OR, flattening into an existing OR list.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression.
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }
}

/// Filter, paging and ordering for a read.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Documents must match this expression; `None` matches everything.
    pub filter: Option<Expr>,
    /// Maximum number of documents returned.
    pub limit: Option<usize>,
    /// Number of matching documents skipped before the first one returned.
    pub offset: Option<usize>,
    /// Ordering applied before `offset` and `limit`.
    pub sort: Option<Sort>,
}

impl Query {
    /// A query matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a [`QueryBuilder`].
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

/// Constructors for [`Expr`] values.
///
/// Field names are element paths, as stored, not member names. Values accept anything
/// convertible into [`Bson`].
///
/// ```ignore
/// use docmap::query::Filter;
///
/// let expr = Filter::eq("name", "Paul").and(Filter::exists("contacts.phones"));
/// ```
pub struct Filter;

impl Filter {
    /// Creates an equality filter expression.
    ///
    /// Matches documents where any value at `field` equals `value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// Creates an inequality filter expression.
    ///
    /// Matches documents where no value at `field` equals `value`, including documents without the element.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    /// Creates a greater-than filter expression.
    ///
    /// Matches documents where a value at `field` is greater than `value`.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    /// Creates a greater-than-or-equal filter expression.
    ///
    /// Matches documents where a value at `field` is greater than or equal to `value`.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    /// Creates a less-than filter expression.
    ///
    /// Matches documents where a value at `field` is less than `value`.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    /// Creates a less-than-or-equal filter expression.
    ///
    /// Matches documents where a value at `field` is less than or equal to `value`.
    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    /// Creates a string prefix filter expression.
    ///
    /// Matches documents where a string at `field` starts with `value`.
    pub fn starts_with(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::StartsWith, value.into())
    }

    /// Creates a string suffix filter expression.
    ///
    /// Matches documents where a string at `field` ends with `value`.
    pub fn ends_with(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::EndsWith, value.into())
    }

    /// Creates a contains filter expression.
    ///
    /// Matches documents where a string at `field` contains `value` as a substring, or an array at `field` holds it.
    pub fn contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Contains, value.into())
    }

    /// Creates a not-contains filter expression.
    ///
    /// The negation of [`Filter::contains`].
    pub fn not_contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::NotContains, value.into())
    }

    /// Creates an existence filter expression.
    ///
    /// Matches documents where the element at `field` is present.
    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    /// Creates a non-existence filter expression.
    ///
    /// Matches documents where the element at `field` is absent.
    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    /// Creates a logical AND of `exprs`.
    ///
    /// An empty list matches every document.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Creates a logical OR of `exprs`.
    ///
    /// An empty list matches no document.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }

    /// Creates a set membership filter expression.
    ///
    /// Matches documents where a value at `field` equals one of `value`, which should be an
    /// array of candidates.
    pub fn any_of(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::AnyOf, value.into())
    }

    /// Creates a set exclusion filter expression.
    ///
    /// Matches documents where no value at `field` equals any of `value`, which should be an
    /// array of excluded values.
    pub fn none_of(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::NoneOf, value.into())
    }

    /// Matches documents whose array at `field` holds an element satisfying `filter`.
    ///
    /// # Arguments
    ///
    /// * `field` - Element path of the array
    /// * `filter` - Predicate evaluated against each array element
    pub fn elem_match(field: impl Into<String>, filter: Expr) -> Expr {
        Expr::ElemMatch {
            field: field.into(),
            filter: Box::new(filter),
        }
    }
}

/// Fluent construction of a [`Query`].
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Starts from a query matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter expression, replacing any previous one.
    ///
    /// # Arguments
    ///
    /// * `filter` - Expression every returned document must satisfy
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Caps the number of returned documents.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Skips the first `offset` matching documents.
    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Orders results by the value at `field`.
    ///
    /// # Arguments
    ///
    /// * `field` - Element path of the sort key
    /// * `direction` - Ascending or descending
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort { field: field.into(), direction });
        self
    }

    /// Finishes the query.
    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks an [`Expr`] tree, producing one output per node.
///
/// Backends implement this to evaluate filters in memory or translate them to a native
/// query language.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_elem_match(
        &mut self,
        field: &str,
        filter: &Expr,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
            Expr::ElemMatch { field, filter } => self.visit_elem_match(field, filter),
        }
    }
}
