//! Fact-extraction and reconciliation knobs (§4.4), plus prompt overrides (§6.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// `false` skips fact extraction/reconciliation and stores messages verbatim.
    pub intelligent_mode: bool,
    /// Hard cap on facts a single extraction call may return (§4.4 step 2).
    pub max_facts_per_extraction: usize,
    /// `K` in the similarity probe against existing records (§4.4 step 3).
    pub similarity_probe_top_k: usize,
    /// Hard cap on the rendered conversation's token count before the
    /// fact-extraction call; guards the extraction prompt, distinct from
    /// `max_facts_per_extraction`'s cap on the LLM's own output.
    pub max_extraction_tokens: usize,
    pub custom_fact_extraction_prompt: Option<String>,
    pub custom_update_memory_prompt: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            intelligent_mode: true,
            max_facts_per_extraction: 32,
            similarity_probe_top_k: 5,
            max_extraction_tokens: 8_000,
            custom_fact_extraction_prompt: None,
            custom_update_memory_prompt: None,
        }
    }
}
