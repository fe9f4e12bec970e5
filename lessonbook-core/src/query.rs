//! Query construction for collection reads.
//!
//! The gateway issues two shapes of read:
//!
//! - **Listing** ([`Query::all`]) - no filter, every document in store-native order
//! - **Search** ([`Query::search`]) - a case-insensitive literal substring match, OR-ed across
//!   the collection's searchable fields
//!
//! Filters are expressed as an [`Expr`] tree which each backend walks with a [`QueryVisitor`]:
//! the in-memory backend evaluates it directly and the MongoDB backend translates it into a
//! native filter document.
//!
//! ```ignore
//! use lessonbook::query::{Query, Filter};
//!
//! let query = Query::search(&["subject", "location"], "mat");
//! let exact = Query::filtered(Filter::eq("subject", "Mathematics"));
//! ```

use bson::Bson;

use crate::error::DocumentStoreError;

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Equal to (exact match).
    Eq,
    /// Greater than or equal to.
    Gte,
    /// String contains the value as a literal substring, ignoring case.
    ContainsIgnoreCase,
}

/// A filter expression for querying documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Logical OR of multiple expressions (any must match).
    Or(Vec<Expr>),
    /// Logical NOT of an expression (inverts the result).
    Not(Box<Expr>),
    /// Field comparison expression.
    Field {
        /// The field name to compare.
        field: String,
        /// The comparison operator.
        op: FieldOp,
        /// The value to compare against.
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines this expression with another using logical AND.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression (logical NOT).
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }
}

/// A read against one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Optional filter expression; `None` matches every document.
    pub filter: Option<Expr>,
}

impl Query {
    /// A query returning every document.
    pub fn all() -> Self {
        Query { filter: None }
    }

    /// A query restricted by `filter`.
    pub fn filtered(filter: Expr) -> Self {
        Query { filter: Some(filter) }
    }

    /// Builds a free-text search over `fields`.
    ///
    /// A document matches when any of the fields contains `term` as a case-insensitive literal
    /// substring. The term is trimmed first; an empty term matches every document. When no
    /// fields are searchable a non-empty term matches nothing.
    pub fn search<S: AsRef<str>>(fields: &[S], term: &str) -> Self {
        let term = term.trim();

        if term.is_empty() {
            return Query::all();
        }

        Query::filtered(Filter::or(
            fields
                .iter()
                .map(|field| Filter::contains_ignore_case(field.as_ref(), term)),
        ))
    }
}

/// Helper struct for constructing filter expressions.
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the specified value.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// Matches documents where the field is greater than or equal to the specified value.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    /// Matches documents where the string field contains `needle`, ignoring case.
    pub fn contains_ignore_case(field: impl Into<String>, needle: impl Into<String>) -> Expr {
        Expr::field(field.into(), FieldOp::ContainsIgnoreCase, Bson::String(needle.into()))
    }

    /// Combines multiple expressions such that all must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Combines multiple expressions such that any can match.
    ///
    /// An empty list matches nothing.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }
}

pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}
