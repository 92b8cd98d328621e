//! Filter Algebra (§4.1): a backend-agnostic AST for structured filter
//! expressions, a parser from the wire JSON shape, and an in-memory
//! evaluator used by backends (and tests) that don't compile to SQL.

mod eval;
mod parse;

use serde::{Deserialize, Serialize};

/// Comparison operator used inside `{field: {op: value}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A parsed filter expression (§4.1). Backends compile this into their own
/// predicate form; a backend that cannot express a variant must fail with
/// `FilterError::UnsupportedOp` rather than silently drop it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpr {
    Eq(String, serde_json::Value),
    In(String, Vec<serde_json::Value>),
    NotIn(String, Vec<serde_json::Value>),
    Cmp(String, CmpOp, serde_json::Value),
    Like(String, String),
    ILike(String, String),
    IsNull(String),
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
}

pub use eval::matches;
pub use parse::parse;

impl FilterExpr {
    /// Parse the wire JSON shape described in §4.1.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, crate::errors::FilterError> {
        parse(value)
    }

    /// Evaluate this expression against a JSON document using dotted-path lookup.
    pub fn matches(&self, doc: &serde_json::Value) -> bool {
        eval::matches(self, doc)
    }

    /// True if `self` is a specialization of `other`: every constraint in
    /// `other` is implied by `self` (used by read-routing to decide whether a
    /// query's filter can be served by a single sub-store's `routing_filter`,
    /// §4.6).
    ///
    /// Conservative: only handles the common case of conjunctions of `Eq`
    /// constraints, which is what `routing_filter`s are expected to be. Any
    /// other shape in `other` returns `false` (meaning: search main + all
    /// active sub-stores rather than risk an incorrect narrowing).
    pub fn specializes(&self, other: &FilterExpr) -> bool {
        let other_eqs = match flatten_eqs(other) {
            Some(eqs) => eqs,
            None => return false,
        };
        let self_eqs = match flatten_eqs(self) {
            Some(eqs) => eqs,
            None => return false,
        };
        other_eqs.iter().all(|(field, value)| {
            self_eqs
                .iter()
                .any(|(f, v)| f == field && v == value)
        })
    }
}

fn flatten_eqs(expr: &FilterExpr) -> Option<Vec<(String, serde_json::Value)>> {
    match expr {
        FilterExpr::Eq(field, value) => Some(vec![(field.clone(), value.clone())]),
        FilterExpr::And(parts) => {
            let mut out = Vec::new();
            for part in parts {
                out.extend(flatten_eqs(part)?);
            }
            Some(out)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn specializes_matches_narrower_eq_set() {
        let routing_filter = FilterExpr::And(vec![FilterExpr::Eq(
            "metadata.scope".into(),
            json!("work"),
        )]);
        let query_filter = FilterExpr::And(vec![
            FilterExpr::Eq("metadata.scope".into(), json!("work")),
            FilterExpr::Eq("metadata.user_id".into(), json!("u1")),
        ]);
        assert!(query_filter.specializes(&routing_filter));
        assert!(!routing_filter.specializes(&query_filter));
    }
}
