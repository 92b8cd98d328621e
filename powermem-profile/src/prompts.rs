//! Default prompt for the profile-extraction LLM call (§4.10). Overridable
//! via `ProfileConfig::custom_profile_extraction_prompt`.

pub const DEFAULT_PROFILE_EXTRACTION_PROMPT: &str = "\
You maintain a running profile of a user from their conversations. You are \
given the user's current profile (empty if none yet) and a new \
conversation. Respond with JSON only, shaped as \
{\"profile_content\":\"...\"} or {\"topics\":{...}} or both. Return the \
COMPLETE replacement profile, not just what changed — merge the new \
conversation's information into the existing profile rather than \
discarding it. Omit a field entirely if the profile has nothing for it.";
