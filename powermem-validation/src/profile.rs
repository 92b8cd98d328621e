//! Profile-extraction response validation (§4.10): the LLM is given the
//! current blob plus a new conversation and asked to return the *complete*
//! replacement blob. Unlike decision validation there's no safe default to
//! fall back to — a malformed response means the safest thing is to leave
//! the existing blob untouched, so this returns `None` rather than an
//! empty blob that would erase prior profile data.

use tracing::warn;

use powermem_core::profile::ProfileBlob;

pub fn validate_profile_extraction(raw_response: &str) -> Option<ProfileBlob> {
    match serde_json::from_str::<ProfileBlob>(raw_response) {
        Ok(blob) if blob.is_empty() => {
            warn!("profile extraction returned an empty blob, keeping existing profile");
            None
        }
        Ok(blob) => Some(blob),
        Err(err) => {
            warn!(error = %err, "malformed profile extraction response, keeping existing profile");
            None
        }
    }
}
