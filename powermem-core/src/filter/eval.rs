use regex::RegexBuilder;
use serde_json::Value;

use super::{CmpOp, FilterExpr};

/// Evaluate `expr` against `doc`, resolving dotted field paths (e.g.
/// `metadata.scope`) by walking nested JSON objects. Used by the in-memory
/// store backend and by anything that wants to filter without a SQL
/// compiler in front of it.
pub fn matches(expr: &FilterExpr, doc: &Value) -> bool {
    match expr {
        FilterExpr::Eq(field, value) => resolve(doc, field) == Some(value),
        FilterExpr::In(field, values) => {
            resolve(doc, field).is_some_and(|v| values.iter().any(|candidate| candidate == v))
        }
        FilterExpr::NotIn(field, values) => {
            !resolve(doc, field).is_some_and(|v| values.iter().any(|candidate| candidate == v))
        }
        FilterExpr::Cmp(field, op, value) => resolve(doc, field)
            .zip(Some(value))
            .map(|(lhs, rhs)| compare(lhs, rhs, *op))
            .unwrap_or(false),
        FilterExpr::Like(field, pattern) => resolve_str(doc, field)
            .is_some_and(|text| like_matches(&text, pattern, false)),
        FilterExpr::ILike(field, pattern) => {
            resolve_str(doc, field).is_some_and(|text| like_matches(&text, pattern, true))
        }
        FilterExpr::IsNull(field) => matches!(resolve(doc, field), None | Some(Value::Null)),
        FilterExpr::And(parts) => parts.iter().all(|p| matches(p, doc)),
        FilterExpr::Or(parts) => parts.iter().any(|p| matches(p, doc)),
    }
}

fn compare(lhs: &Value, rhs: &Value, op: CmpOp) -> bool {
    if op == CmpOp::Ne {
        return lhs != rhs;
    }
    let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else {
        return match op {
            CmpOp::Eq => lhs == rhs,
            _ => false,
        };
    };
    match op {
        CmpOp::Eq => a == b,
        CmpOp::Ne => a != b,
        CmpOp::Gt => a > b,
        CmpOp::Gte => a >= b,
        CmpOp::Lt => a < b,
        CmpOp::Lte => a <= b,
    }
}

/// `%` is the only wildcard honored, matching the SQL `LIKE` convention the
/// SQLite backend compiles this down to. Literal segments between `%`s are
/// regex-escaped and joined with `.*`, anchored at both ends so an
/// unwildcarded pattern still requires a full match.
fn like_matches(text: &str, pattern: &str, case_insensitive: bool) -> bool {
    let body = pattern.split('%').map(regex::escape).collect::<Vec<_>>().join(".*");
    let anchored = format!("^{body}$");
    match RegexBuilder::new(&anchored).case_insensitive(case_insensitive).build() {
        Ok(regex) => regex.is_match(text),
        Err(_) => false,
    }
}

fn resolve<'a>(doc: &'a Value, dotted_path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in dotted_path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn resolve_str(doc: &Value, dotted_path: &str) -> Option<String> {
    resolve(doc, dotted_path).and_then(|v| v.as_str()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "metadata": {"scope": "work", "importance_score": 0.7},
            "content": "Remember to buy milk",
        })
    }

    #[test]
    fn eq_on_dotted_path() {
        let expr = FilterExpr::Eq("metadata.scope".into(), json!("work"));
        assert!(matches(&expr, &doc()));
    }

    #[test]
    fn cmp_numeric() {
        let expr = FilterExpr::Cmp("metadata.importance_score".into(), CmpOp::Gte, json!(0.5));
        assert!(matches(&expr, &doc()));
        let expr = FilterExpr::Cmp("metadata.importance_score".into(), CmpOp::Gte, json!(0.9));
        assert!(!matches(&expr, &doc()));
    }

    #[test]
    fn like_with_wildcards() {
        let expr = FilterExpr::ILike("content".into(), "%MILK%".into());
        assert!(matches(&expr, &doc()));
    }

    #[test]
    fn is_null_on_missing_field() {
        let expr = FilterExpr::IsNull("metadata.deleted_at".into());
        assert!(matches(&expr, &doc()));
    }
}
