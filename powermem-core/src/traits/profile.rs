//! Profile Store contract (C10, §4.10). Defined here rather than in the
//! profile crate itself so retrieval can accept `add_profile=true` without
//! depending on the profile crate's storage choice.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::PowerMemResult;

#[async_trait]
pub trait ProfileLookup: Send + Sync {
    /// Current profile blob for `user_id`, if one has been extracted yet.
    /// Never fails on "no profile" — that's `Ok(None)`, not an error.
    async fn profile_blob(&self, user_id: &str) -> PowerMemResult<Option<Value>>;
}
