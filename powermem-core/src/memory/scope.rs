//! Identity scope keys (§3.1): the opaque identifiers used both for
//! filtering and for default isolation between callers.

use serde::{Deserialize, Serialize};

use crate::filter::FilterExpr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeKeys {
    pub user_id: Option<String>,
    pub agent_id: Option<String>,
    pub run_id: Option<String>,
    pub actor_id: Option<String>,
}

impl ScopeKeys {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.agent_id.is_none()
            && self.run_id.is_none()
            && self.actor_id.is_none()
    }

    /// True if every key present on `self` is also present and equal on
    /// `other`. Used to enforce that a caller's declared scope includes the
    /// record being read/mutated (identity scoping, §9 auth boundary).
    pub fn is_subset_of(&self, other: &ScopeKeys) -> bool {
        field_subset(&self.user_id, &other.user_id)
            && field_subset(&self.agent_id, &other.agent_id)
            && field_subset(&self.run_id, &other.run_id)
            && field_subset(&self.actor_id, &other.actor_id)
    }

    /// Render as a JSON object under the `metadata.scope_keys.*` dotted
    /// paths the Filter Algebra addresses.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "user_id": self.user_id,
            "agent_id": self.agent_id,
            "run_id": self.run_id,
            "actor_id": self.actor_id,
        })
    }

    /// Builds the implicit identity-scope filter every read/probe against a
    /// store should AND onto the caller's own filter (§3.4 I-scope):
    /// `None` if the caller declared no scope at all.
    pub fn as_filter(&self) -> Option<FilterExpr> {
        let json = self.to_json();
        let mut clauses = Vec::new();
        for (field, value) in [
            ("scope_keys.user_id", json.get("user_id")),
            ("scope_keys.agent_id", json.get("agent_id")),
            ("scope_keys.run_id", json.get("run_id")),
            ("scope_keys.actor_id", json.get("actor_id")),
        ] {
            if let Some(value) = value.filter(|v| !v.is_null()) {
                clauses.push(FilterExpr::Eq(field.to_string(), value.clone()));
            }
        }
        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(FilterExpr::And(clauses)),
        }
    }
}

fn field_subset(mine: &Option<String>, theirs: &Option<String>) -> bool {
    match mine {
        None => true,
        Some(value) => theirs.as_deref() == Some(value.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scope_is_subset_of_anything() {
        assert!(ScopeKeys::default().is_subset_of(&ScopeKeys {
            user_id: Some("u1".into()),
            ..Default::default()
        }));
    }

    #[test]
    fn mismatched_field_is_not_subset() {
        let caller = ScopeKeys {
            user_id: Some("u1".into()),
            ..Default::default()
        };
        let record = ScopeKeys {
            user_id: Some("u2".into()),
            ..Default::default()
        };
        assert!(!caller.is_subset_of(&record));
    }
}
