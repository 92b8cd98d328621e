//! Generic OpenAI-compatible HTTP provider: one `reqwest::Client` backs
//! chat completions, embeddings, and (when the endpoint supports it)
//! reranking. Works against OpenAI itself, Ollama's OpenAI-compatible
//! surface, or any self-hosted server speaking the same wire shape.

use std::time::Duration;

use async_trait::async_trait;
use backoff::{future::retry, Error as BackoffError, ExponentialBackoffBuilder};
use serde::{Deserialize, Serialize};

use powermem_core::errors::{PowerMemError, PowerMemResult, ProviderError};
use powermem_core::traits::{ChatMessage, ChatOptions, ChatResponse, ChatRole, EmbedAction, Embedder, Llm, ResponseFormat};

/// Sends `builder`, retrying transient failures (connect/timeout errors, 5xx
/// responses) with exponential backoff capped at 3 attempts and +/-20% jitter
/// (upstream transient errors are retried before being surfaced). 4xx
/// responses and non-transport send failures return on the first attempt.
async fn send_with_retry(builder: reqwest::RequestBuilder) -> Result<reqwest::Response, reqwest::Error> {
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(200))
        .with_randomization_factor(0.2)
        .with_multiplier(2.0)
        .with_max_elapsed_time(Some(Duration::from_secs(10)))
        .build();

    let mut attempt = 0u32;
    retry(policy, move || {
        attempt += 1;
        let last_attempt = attempt >= 3;
        let builder = builder.try_clone().expect("provider requests never stream a body");
        async move {
            let response = builder.send().await.map_err(|err| {
                if !last_attempt && (err.is_timeout() || err.is_connect()) {
                    BackoffError::transient(err)
                } else {
                    BackoffError::permanent(err)
                }
            })?;
            if !last_attempt && response.status().is_server_error() {
                return Err(BackoffError::transient(response.error_for_status().unwrap_err()));
            }
            Ok(response)
        }
    })
    .await
}

pub struct HttpProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    chat_model: String,
    embed_model: String,
    dims: usize,
}

impl HttpProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, chat_model: impl Into<String>, embed_model: impl Into<String>, dims: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            chat_model: chat_model.into(),
            embed_model: embed_model.into(),
            dims,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<WireResponseFormat>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct WireResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

fn role_str(role: ChatRole) -> &'static str {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

#[async_trait]
impl Llm for HttpProvider {
    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> PowerMemResult<ChatResponse> {
        let wire_messages: Vec<WireMessage<'_>> = messages
            .iter()
            .map(|m| WireMessage {
                role: role_str(m.role),
                content: &m.content,
            })
            .collect();

        let request = ChatCompletionRequest {
            model: &self.chat_model,
            messages: wire_messages,
            temperature: options.temperature,
            response_format: matches!(options.response_format, ResponseFormat::Json)
                .then_some(WireResponseFormat { kind: "json_object" }),
        };

        let response = send_with_retry(self.request(reqwest::Method::POST, "/chat/completions").json(&request))
            .await
            .map_err(|e| PowerMemError::Provider(ProviderError::LlmUnavailable(e.to_string())))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PowerMemError::Provider(ProviderError::LlmUnavailable(body)));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| PowerMemError::Provider(ProviderError::LlmMalformed(e.to_string())))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| PowerMemError::Provider(ProviderError::LlmMalformed("empty choices array".into())))?;

        Ok(ChatResponse { text })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for HttpProvider {
    async fn embed(&self, text: &str, action: EmbedAction) -> PowerMemResult<Vec<f32>> {
        Ok(self.embed_batch(&[text.to_string()], action).await?.into_iter().next().unwrap_or_default())
    }

    async fn embed_batch(&self, texts: &[String], _action: EmbedAction) -> PowerMemResult<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.embed_model,
            input: texts.iter().map(String::as_str).collect(),
        };

        let response = send_with_retry(self.request(reqwest::Method::POST, "/embeddings").json(&request))
            .await
            .map_err(|e| PowerMemError::Provider(ProviderError::EmbedderUnavailable(e.to_string())))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PowerMemError::Provider(ProviderError::EmbedderUnavailable(body)));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| PowerMemError::Provider(ProviderError::LlmMalformed(e.to_string())))?;

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
