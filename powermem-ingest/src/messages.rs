//! Message-input normalization (§4.7 step 1): `messages` arrives as a bare
//! string, a single message, or a list of role/content messages. Image and
//! audio parts are out of scope here — the `Llm`/`Embedder` contracts this
//! workspace exposes (§4.2) are text-only, so there is no multimodal
//! rendering branch to call into; a provider that wants one would need its
//! own, separately-scoped trait.

use powermem_core::traits::ChatMessage;

#[derive(Debug, Clone)]
pub enum MessageInput {
    Text(String),
    Single(ChatMessage),
    Many(Vec<ChatMessage>),
}

impl MessageInput {
    pub fn normalize(self) -> Vec<ChatMessage> {
        match self {
            MessageInput::Text(text) => vec![ChatMessage::user(text)],
            MessageInput::Single(message) => vec![message],
            MessageInput::Many(messages) => messages,
        }
    }
}

impl From<String> for MessageInput {
    fn from(value: String) -> Self {
        MessageInput::Text(value)
    }
}

impl From<&str> for MessageInput {
    fn from(value: &str) -> Self {
        MessageInput::Text(value.to_string())
    }
}

/// Flattens a normalized message list into one block of text for the
/// fact-extraction prompt, prefixing each line with its role so the LLM can
/// tell who said what.
pub fn render_messages(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", role_label(m.role), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Joins message contents with no role prefix — the literal text a
/// pass-through (non-`infer`) add stores and hashes, as distinct from the
/// role-labeled block `render_messages` builds for the extraction prompt.
pub fn render_plain_content(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn role_label(role: powermem_core::traits::ChatRole) -> &'static str {
    use powermem_core::traits::ChatRole;
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_input_normalizes_to_single_user_message() {
        let messages = MessageInput::from("remember this").normalize();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "remember this");
    }

    #[test]
    fn render_joins_role_prefixed_lines() {
        let messages = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        assert_eq!(render_messages(&messages), "user: hi\nassistant: hello");
    }
}
