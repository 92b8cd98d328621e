//! `proptest` strategies for `FilterExpr` and `MemoryRecord` (§4.1, §3.1).
//! Kept shallow on recursion depth so generated `And`/`Or` trees stay
//! readable in a shrunk failure case rather than producing pages of nested
//! noise.

use proptest::prelude::*;
use serde_json::{Map, Value};

use powermem_core::filter::{CmpOp, FilterExpr};
use powermem_core::memory::{MemoryId, MemoryRecord, ScopeKeys};

const FIELD_NAMES: &[&str] = &["kind", "scope_keys.user_id", "metadata.project", "priority"];

fn field_name() -> impl Strategy<Value = String> {
    prop::sample::select(FIELD_NAMES).prop_map(str::to_string)
}

fn json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-z]{1,8}".prop_map(Value::from),
    ]
}

fn cmp_op() -> impl Strategy<Value = CmpOp> {
    prop_oneof![
        Just(CmpOp::Eq),
        Just(CmpOp::Ne),
        Just(CmpOp::Gt),
        Just(CmpOp::Gte),
        Just(CmpOp::Lt),
        Just(CmpOp::Lte),
    ]
}

fn leaf_filter() -> impl Strategy<Value = FilterExpr> {
    prop_oneof![
        (field_name(), json_scalar()).prop_map(|(f, v)| FilterExpr::Eq(f, v)),
        (field_name(), prop::collection::vec(json_scalar(), 0..4)).prop_map(|(f, v)| FilterExpr::In(f, v)),
        (field_name(), prop::collection::vec(json_scalar(), 0..4)).prop_map(|(f, v)| FilterExpr::NotIn(f, v)),
        (field_name(), cmp_op(), json_scalar()).prop_map(|(f, op, v)| FilterExpr::Cmp(f, op, v)),
        (field_name(), "[a-z%]{1,8}").prop_map(|(f, p)| FilterExpr::Like(f, p)),
        (field_name(), "[a-z%]{1,8}").prop_map(|(f, p)| FilterExpr::ILike(f, p)),
        field_name().prop_map(FilterExpr::IsNull),
    ]
}

/// A `FilterExpr` tree, at most 3 levels of `And`/`Or` nesting and at most
/// 4 children per level.
pub fn filter_expr() -> impl Strategy<Value = FilterExpr> {
    leaf_filter().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(FilterExpr::And),
            prop::collection::vec(inner, 0..4).prop_map(FilterExpr::Or),
        ]
    })
}

/// A conjunction of `Eq` clauses only — the shape `routing_filter`s are
/// expected to have, and the only shape `FilterExpr::specializes` actually
/// reasons about.
pub fn eq_conjunction() -> impl Strategy<Value = FilterExpr> {
    prop::collection::vec((field_name(), json_scalar()), 0..4)
        .prop_map(|pairs| FilterExpr::And(pairs.into_iter().map(|(f, v)| FilterExpr::Eq(f, v)).collect()))
}

fn scope_keys_strategy() -> impl Strategy<Value = ScopeKeys> {
    (
        prop::option::of("[a-z]{1,6}"),
        prop::option::of("[a-z]{1,6}"),
        prop::option::of("[a-z]{1,6}"),
        prop::option::of("[a-z]{1,6}"),
    )
        .prop_map(|(user_id, agent_id, run_id, actor_id)| ScopeKeys {
            user_id,
            agent_id,
            run_id,
            actor_id,
        })
}

/// A `MemoryRecord` with arbitrary content, a small fixed-dimension dense
/// embedding, and an arbitrary scope. `id`/timestamps are fixed so two
/// records from this strategy always compare by content/scope alone.
pub fn memory_record(dims: usize) -> impl Strategy<Value = MemoryRecord> {
    (
        "[a-zA-Z0-9 ]{1,64}",
        prop::collection::vec(-1.0f32..1.0f32, dims..=dims),
        scope_keys_strategy(),
    )
        .prop_map(move |(content, dense_embedding, scope_keys)| {
            MemoryRecord::new(MemoryId(1), content, dense_embedding, scope_keys, chrono::Utc::now())
        })
}

/// A bare JSON metadata object, useful for feeding `FilterExpr::matches`
/// directly without going through a full `MemoryRecord` payload.
pub fn json_document() -> impl Strategy<Value = Value> {
    prop::collection::hash_map(field_name(), json_scalar(), 0..4).prop_map(|map| {
        let mut object = Map::new();
        for (k, v) in map {
            object.insert(k, v);
        }
        Value::Object(object)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn filter_expr_strategy_round_trips_through_matches(expr in filter_expr(), doc in json_document()) {
            // Evaluation must terminate and return a bool for any generated
            // tree against any generated document; this is a smoke test for
            // the generators themselves, not a correctness property of
            // `matches`.
            let _ = expr.matches(&doc);
        }

        #[test]
        fn eq_conjunction_specializes_itself(expr in eq_conjunction()) {
            prop_assert!(expr.specializes(&expr));
        }

        #[test]
        fn memory_record_strategy_preserves_embedding_dims(record in memory_record(8)) {
            prop_assert_eq!(record.dense_embedding.len(), 8);
        }
    }
}
