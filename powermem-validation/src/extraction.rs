//! Fact-extraction response validation (§4.7 step 2): the LLM is asked for
//! a JSON array of short self-contained facts, each carrying an optional
//! importance score. A default is substituted for a missing score; the
//! result is capped at `cap` facts regardless of how many the LLM returned.

use serde::Deserialize;

use powermem_core::errors::{IngestError, PowerMemError, PowerMemResult};

/// Used when the LLM omits `importance_score` on a fact (§4.7 step 2).
pub const DEFAULT_IMPORTANCE: f64 = 0.65;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFact {
    pub content: String,
    pub importance_score: f64,
}

#[derive(Deserialize)]
struct RawFact {
    content: String,
    #[serde(default)]
    importance_score: Option<f64>,
}

#[derive(Deserialize)]
struct RawExtraction {
    facts: Vec<RawFact>,
}

/// Parses the LLM's fact-extraction response, clamps each importance score
/// to `[0,1]`, defaults a missing one to [`DEFAULT_IMPORTANCE`], and
/// truncates to `cap` facts (default N=32 per §4.7 step 2).
///
/// Unlike per-fact decisions, a malformed extraction response has no safe
/// fallback value — there's no fact to default to — so this surfaces a
/// typed error for the caller to treat the same as an unavailable LLM.
pub fn validate_extraction(raw_response: &str, cap: usize) -> PowerMemResult<Vec<ExtractedFact>> {
    let parsed: RawExtraction = serde_json::from_str(raw_response)
        .map_err(|err| PowerMemError::Ingest(IngestError::MalformedExtraction(err.to_string())))?;

    let mut facts: Vec<ExtractedFact> = parsed
        .facts
        .into_iter()
        .filter(|f| !f.content.trim().is_empty())
        .map(|f| ExtractedFact {
            content: f.content,
            importance_score: f.importance_score.unwrap_or(DEFAULT_IMPORTANCE).clamp(0.0, 1.0),
        })
        .collect();

    facts.truncate(cap);
    Ok(facts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_extraction() {
        let raw = r#"{"facts":[{"content":"likes coffee","importance_score":0.9},{"content":"lives in Oslo"}]}"#;
        let facts = validate_extraction(raw, 32).unwrap();
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].importance_score, 0.9);
        assert_eq!(facts[1].importance_score, DEFAULT_IMPORTANCE);
    }

    #[test]
    fn truncates_to_cap() {
        let facts_json: Vec<String> = (0..50).map(|i| format!(r#"{{"content":"fact {i}"}}"#)).collect();
        let raw = format!(r#"{{"facts":[{}]}}"#, facts_json.join(","));
        let facts = validate_extraction(&raw, 32).unwrap();
        assert_eq!(facts.len(), 32);
    }

    #[test]
    fn drops_blank_facts() {
        let raw = r#"{"facts":[{"content":"  "},{"content":"real fact"}]}"#;
        let facts = validate_extraction(raw, 32).unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].content, "real fact");
    }

    #[test]
    fn clamps_out_of_range_importance() {
        let raw = r#"{"facts":[{"content":"x","importance_score":5.0}]}"#;
        let facts = validate_extraction(raw, 32).unwrap();
        assert_eq!(facts[0].importance_score, 1.0);
    }

    #[test]
    fn malformed_json_is_a_typed_error() {
        let err = validate_extraction("not json", 32).unwrap_err();
        assert!(matches!(
            err,
            PowerMemError::Ingest(IngestError::MalformedExtraction(_))
        ));
    }
}
