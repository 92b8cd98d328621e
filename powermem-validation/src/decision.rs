//! Per-fact decision response validation (§4.7 step 4): for each new fact
//! against its top-K similar existing records, the LLM must emit exactly
//! one of ADD / UPDATE / DELETE / NONE. A response that doesn't parse
//! against this schema falls back to ADD rather than failing the call —
//! losing a conflict-resolution decision is cheaper than losing the fact.

use serde::Deserialize;
use tracing::warn;

use powermem_core::memory::MemoryId;

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Add,
    Update { existing_id: MemoryId, new_text: String },
    Delete { existing_id: MemoryId },
    None,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawAction {
    Add,
    Update,
    Delete,
    None,
}

#[derive(Deserialize)]
struct RawDecision {
    action: RawAction,
    #[serde(default)]
    existing_id: Option<i64>,
    #[serde(default)]
    new_text: Option<String>,
}

/// Parses the LLM's per-fact decision response. Any shape that doesn't fit
/// the schema — bad JSON, an `update`/`delete` missing `existing_id`, an
/// unrecognized `action` — falls back to [`Decision::Add`], logged at
/// `warn` so a systematically broken prompt is still visible.
pub fn validate_decision(raw_response: &str) -> Decision {
    match serde_json::from_str::<RawDecision>(raw_response) {
        Ok(RawDecision {
            action: RawAction::Add,
            ..
        }) => Decision::Add,
        Ok(RawDecision {
            action: RawAction::None,
            ..
        }) => Decision::None,
        Ok(RawDecision {
            action: RawAction::Update,
            existing_id: Some(id),
            new_text: Some(new_text),
        }) => Decision::Update {
            existing_id: MemoryId::new(id),
            new_text,
        },
        Ok(RawDecision {
            action: RawAction::Delete,
            existing_id: Some(id),
            ..
        }) => Decision::Delete {
            existing_id: MemoryId::new(id),
        },
        Ok(_) => {
            warn!("decision response missing required fields for its action, defaulting to ADD");
            Decision::Add
        }
        Err(err) => {
            warn!(error = %err, "malformed decision response, defaulting to ADD");
            Decision::Add
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add() {
        assert_eq!(validate_decision(r#"{"action":"add"}"#), Decision::Add);
    }

    #[test]
    fn parses_none() {
        assert_eq!(validate_decision(r#"{"action":"none"}"#), Decision::None);
    }

    #[test]
    fn parses_update_with_fields() {
        let decision = validate_decision(r#"{"action":"update","existing_id":42,"new_text":"refined"}"#);
        assert_eq!(
            decision,
            Decision::Update {
                existing_id: MemoryId::new(42),
                new_text: "refined".to_string(),
            }
        );
    }

    #[test]
    fn parses_delete_with_id() {
        let decision = validate_decision(r#"{"action":"delete","existing_id":7}"#);
        assert_eq!(
            decision,
            Decision::Delete {
                existing_id: MemoryId::new(7),
            }
        );
    }

    #[test]
    fn update_missing_new_text_falls_back_to_add() {
        assert_eq!(validate_decision(r#"{"action":"update","existing_id":1}"#), Decision::Add);
    }

    #[test]
    fn delete_missing_existing_id_falls_back_to_add() {
        assert_eq!(validate_decision(r#"{"action":"delete"}"#), Decision::Add);
    }

    #[test]
    fn malformed_json_falls_back_to_add() {
        assert_eq!(validate_decision("not json at all"), Decision::Add);
    }

    #[test]
    fn unknown_action_falls_back_to_add() {
        assert_eq!(validate_decision(r#"{"action":"archive"}"#), Decision::Add);
    }
}
