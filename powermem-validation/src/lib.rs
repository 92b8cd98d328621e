//! Schema validation for the LLM response shapes the ingest and profile
//! pipelines depend on: the fact-extraction array and per-fact
//! ADD/UPDATE/DELETE/NONE decision (§4.7), and the profile-extraction blob
//! (§4.10). Decision validation always succeeds — it degrades to `Add` on
//! any schema violation rather than failing the ingest call, per the
//! propagation policy in §4.7's failure semantics. Profile validation
//! degrades to "no change" instead, since there's no safe fabricated blob
//! to fall back to.

mod decision;
mod extraction;
mod profile;

pub use decision::{validate_decision, Decision};
pub use extraction::{validate_extraction, ExtractedFact, DEFAULT_IMPORTANCE};
pub use profile::validate_profile_extraction;
