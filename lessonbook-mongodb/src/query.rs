//! Query translation from lessonbook expressions to MongoDB filter documents.

use bson::{Document, Bson, doc};

use lessonbook_core::{
    query::{QueryVisitor, Expr, FieldOp},
    error::DocumentStoreError,
};


/// Characters with special meaning in MongoDB's PCRE patterns.
const REGEX_METACHARACTERS: &[char] = &[
    '\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$', '#', '-',
];

/// Escapes `term` so it matches itself literally inside a `$regex`.
pub(crate) fn escape_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());

    for c in term.chars() {
        if REGEX_METACHARACTERS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

/// Translates query expressions into MongoDB query documents.
pub(crate) struct MongoQueryTranslator;

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Ok(doc! {});
        }

        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        // MongoDB rejects an empty `$or`; an empty disjunction matches nothing.
        if exprs.is_empty() {
            return Ok(doc! { "$nor": [{}] });
        }

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

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Gte => doc! { "$gte": value },
                FieldOp::ContainsIgnoreCase => match value {
                    Bson::String(s) => doc! { "$regex": escape_pattern(s), "$options": "i" },
                    _ => return Err(DocumentStoreError::Backend("ContainsIgnoreCase requires a string value".to_string())),
                },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessonbook_core::query::{Filter, Query};

    fn translate(query: Query) -> Document {
        query
            .filter
            .map(|expr| MongoQueryTranslator.visit_expr(&expr).unwrap())
            .unwrap_or_default()
    }

    #[test]
    fn escapes_metacharacters() {
        assert_eq!(escape_pattern("math"), "math");
        assert_eq!(escape_pattern(".*"), "\\.\\*");
        assert_eq!(escape_pattern("C++ (adv)"), "C\\+\\+ \\(adv\\)");
        assert_eq!(escape_pattern("a|b$"), "a\\|b\\$");
    }

    #[test]
    fn search_becomes_case_insensitive_or() {
        let filter = translate(Query::search(&["subject", "location"], "st. a"));

        assert_eq!(
            filter,
            doc! {
                "$or": [
                    { "subject": { "$regex": "st\\. a", "$options": "i" } },
                    { "location": { "$regex": "st\\. a", "$options": "i" } },
                ]
            }
        );
    }

    #[test]
    fn empty_or_matches_nothing() {
        let fields: [&str; 0] = [];
        assert_eq!(translate(Query::search(&fields, "x")), doc! { "$nor": [{}] });
    }

    #[test]
    fn listing_has_no_filter() {
        assert_eq!(translate(Query::all()), doc! {});
    }

    #[test]
    fn negation_uses_nor() {
        let filter = translate(Query::filtered(Filter::eq("space", 0).not()));
        assert_eq!(filter, doc! { "$nor": [{ "space": { "$eq": 0 } }] });
    }
}
