use serde_json::Value;

use crate::errors::FilterError;

use super::{CmpOp, FilterExpr};

const KNOWN_OPS: &[&str] = &["eq", "ne", "gt", "gte", "lt", "lte", "in", "nin", "like", "ilike"];

/// Parse the wire JSON shape described in §4.1:
/// - `{field: primitive}` → equality
/// - `{field: [values...]}` → IN
/// - `{field: {op: value, ...}}` → one `Cmp`/`In`/`Like` per op, ANDed
/// - `{field: null}` → IS NULL
/// - `{"AND": [...]}`, `{"OR": [...]}` → nesting
pub fn parse(value: &Value) -> Result<FilterExpr, FilterError> {
    let obj = value
        .as_object()
        .ok_or_else(|| FilterError::Malformed("filter must be a JSON object".into()))?;

    if obj.is_empty() {
        return Ok(FilterExpr::And(Vec::new()));
    }

    let mut clauses = Vec::new();
    for (key, val) in obj {
        match key.as_str() {
            "AND" | "and" => clauses.push(FilterExpr::And(parse_array(val)?)),
            "OR" | "or" => clauses.push(FilterExpr::Or(parse_array(val)?)),
            field => clauses.push(parse_field(field, val)?),
        }
    }

    Ok(if clauses.len() == 1 {
        clauses.into_iter().next().unwrap()
    } else {
        FilterExpr::And(clauses)
    })
}

fn parse_array(value: &Value) -> Result<Vec<FilterExpr>, FilterError> {
    value
        .as_array()
        .ok_or_else(|| FilterError::Malformed("AND/OR expects an array of expressions".into()))?
        .iter()
        .map(parse)
        .collect()
}

fn parse_field(field: &str, value: &Value) -> Result<FilterExpr, FilterError> {
    match value {
        Value::Null => Ok(FilterExpr::IsNull(field.to_string())),
        Value::Array(items) => Ok(FilterExpr::In(field.to_string(), items.clone())),
        Value::Object(ops) => {
            let mut parts = Vec::with_capacity(ops.len());
            for (op, op_value) in ops {
                parts.push(parse_op(field, op, op_value)?);
            }
            Ok(if parts.len() == 1 {
                parts.into_iter().next().unwrap()
            } else {
                FilterExpr::And(parts)
            })
        }
        primitive => Ok(FilterExpr::Eq(field.to_string(), primitive.clone())),
    }
}

fn parse_op(field: &str, op: &str, value: &Value) -> Result<FilterExpr, FilterError> {
    match op {
        "eq" => Ok(FilterExpr::Eq(field.to_string(), value.clone())),
        "ne" => Ok(FilterExpr::Cmp(field.to_string(), CmpOp::Ne, value.clone())),
        "gt" => Ok(FilterExpr::Cmp(field.to_string(), CmpOp::Gt, value.clone())),
        "gte" => Ok(FilterExpr::Cmp(field.to_string(), CmpOp::Gte, value.clone())),
        "lt" => Ok(FilterExpr::Cmp(field.to_string(), CmpOp::Lt, value.clone())),
        "lte" => Ok(FilterExpr::Cmp(field.to_string(), CmpOp::Lte, value.clone())),
        "in" => {
            let items = value
                .as_array()
                .ok_or_else(|| FilterError::Malformed(format!("'{op}' expects an array")))?;
            Ok(FilterExpr::In(field.to_string(), items.clone()))
        }
        "nin" => {
            let items = value
                .as_array()
                .ok_or_else(|| FilterError::Malformed(format!("'{op}' expects an array")))?;
            Ok(FilterExpr::NotIn(field.to_string(), items.clone()))
        }
        "like" => Ok(FilterExpr::Like(field.to_string(), as_str(value)?)),
        "ilike" => Ok(FilterExpr::ILike(field.to_string(), as_str(value)?)),
        other => Err(FilterError::Malformed(format!(
            "unknown operator '{other}', expected one of {KNOWN_OPS:?}"
        ))),
    }
}

fn as_str(value: &Value) -> Result<String, FilterError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| FilterError::Malformed("like/ilike expect a string pattern".into()))
}
