//! Profile Store blob shape (C10, §4.10, §6.3's profile row): either
//! free-form `profile_content` or a nested `topics` mapping, or both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProfileBlob {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Value>,
}

impl ProfileBlob {
    pub fn is_empty(&self) -> bool {
        self.profile_content.is_none() && self.topics.is_none()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A profile row as persisted (§6.4): the blob plus its `user_id` and
/// bookkeeping timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub user_id: String,
    pub blob: ProfileBlob,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
