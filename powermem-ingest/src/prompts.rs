//! Default prompt text for the two LLM calls the intelligent pipeline makes
//! (§4.7 steps 2 and 4). Callers override either via `IngestConfig`'s
//! `custom_fact_extraction_prompt`/`custom_update_memory_prompt`, or
//! per-call via `IngestRequest::prompt_override`.

pub const DEFAULT_FACT_EXTRACTION_PROMPT: &str = "\
You extract short, self-contained facts worth remembering from a \
conversation. Respond with JSON only, shaped as \
{\"facts\":[{\"content\":\"...\",\"importance_score\":0.0-1.0}]}. \
Each fact must stand alone without referring to 'the user said' or \
conversational context. Omit trivial or redundant statements.";

pub const DEFAULT_DECISION_PROMPT: &str = "\
You reconcile a new candidate fact against a short list of existing \
memories for the same user. Respond with JSON only, shaped as \
{\"action\":\"add\"|\"update\"|\"delete\"|\"none\",\"existing_id\":<int>,\"new_text\":\"...\"}. \
Use 'add' when the fact is new and does not conflict with anything listed. \
Use 'update' when an existing memory should be refined or extended by the \
new fact (include existing_id and the full new_text). Use 'delete' when \
the new fact shows an existing memory is now false (include existing_id). \
Use 'none' when the new fact is an exact semantic duplicate of an existing \
one.";
