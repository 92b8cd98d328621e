//! User-profile extraction knobs (§4.10), plus prompt override (§6.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// `false` disables profile extraction entirely; `add()` becomes a no-op
    /// and `add_profile=true` on search always returns `None`.
    pub enabled: bool,
    /// Path to the SQLite database backing the profile table. `:memory:`
    /// for tests.
    pub database_path: String,
    pub custom_profile_extraction_prompt: Option<String>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: "powermem.db".to_string(),
            custom_profile_extraction_prompt: None,
        }
    }
}
