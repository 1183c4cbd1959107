//! Reasoning backend boundary and per-participant chat sessions.
//!
//! The core never reasons about language itself: it supplies a system
//! prompt and conversation history to a [`ReasoningBackend`] and takes
//! whatever utterance comes back. The production backend is an
//! OpenAI-compatible chat API; tests substitute scripted backends.

use std::sync::Arc;
use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::DebateError;

/// Seam to the external agent/LLM runtime.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Produce one utterance for the given conversation history.
    async fn complete(
        &self,
        history: &[ChatCompletionRequestMessage],
        max_tokens: u32,
    ) -> Result<String, DebateError>;
}

/// OpenAI-compatible chat backend.
#[derive(Clone)]
pub struct LlmClient {
    api_base: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ReasoningBackend for LlmClient {
    async fn complete(
        &self,
        history: &[ChatCompletionRequestMessage],
        max_tokens: u32,
    ) -> Result<String, DebateError> {
        // Custom HTTP client with explicit timeouts; some local
        // OpenAI-compatible servers use self-signed certificates.
        let http_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DebateError::Config(format!("Failed to create HTTP client: {e}")))?;

        let config = OpenAIConfig::new()
            .with_api_key(&self.api_key)
            .with_api_base(&self.api_base);
        let client = Client::with_config(config).with_http_client(http_client);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .max_completion_tokens(max_tokens)
            .messages(history.to_vec())
            .build()?;

        // Retry with exponential backoff: 1s, 2s, 4s.
        let max_retries = 3;
        let mut last_error = None;

        for attempt in 0..max_retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
            }

            match client.chat().create(request.clone()).await {
                Ok(response) => {
                    let content = response
                        .choices
                        .first()
                        .and_then(|c| c.message.content.clone())
                        .unwrap_or_default();
                    return Ok(content);
                }
                Err(e) => {
                    debug!("chat completion attempt {} failed: {e}", attempt + 1);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .map(DebateError::from)
            .unwrap_or_else(|| DebateError::Config("Unknown API error after retries".to_string())))
    }
}

/// Conversation history for one participant.
///
/// Keeps the system prompt plus alternating cue/utterance messages, and
/// lets other participants' statements be injected as observations so
/// each agent reasons over the debate so far.
pub struct AgentSession {
    name: String,
    backend: Arc<dyn ReasoningBackend>,
    history: Vec<ChatCompletionRequestMessage>,
}

impl AgentSession {
    pub fn new(
        name: impl Into<String>,
        system_prompt: &str,
        backend: Arc<dyn ReasoningBackend>,
    ) -> Self {
        Self {
            name: name.into(),
            backend,
            history: vec![ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage {
                    content: system_prompt.to_string().into(),
                    name: None,
                },
            )],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add another participant's statement to this session's context.
    pub fn observe(&mut self, note: impl Into<String>) {
        self.history.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage {
                content: note.into().into(),
                name: None,
            },
        ));
    }

    /// Prompt this participant with `cue` and return their sanitized
    /// utterance. Empty or near-empty responses are retried a few times
    /// before giving up.
    pub async fn speak(&mut self, cue: &str, max_tokens: u32) -> Result<String, DebateError> {
        self.observe(cue.to_string());

        let max_empty_retries = 3;
        let mut utterance = String::new();

        for attempt in 0..max_empty_retries {
            let response = self.backend.complete(&self.history, max_tokens).await?;
            utterance = sanitize_response(&response);

            if utterance.trim().len() > 10 {
                break;
            }
            if attempt < max_empty_retries - 1 {
                warn!(
                    "empty response from {} (attempt {}/{}), retrying",
                    self.name,
                    attempt + 1,
                    max_empty_retries
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }

        if utterance.trim().len() <= 10 {
            return Err(DebateError::EmptyResponse {
                speaker: self.name.clone(),
                retries: max_empty_retries,
            });
        }

        self.history.push(ChatCompletionRequestMessage::Assistant(
            ChatCompletionRequestAssistantMessage {
                content: Some(utterance.clone().into()),
                name: None,
                tool_calls: None,
                refusal: None,
                audio: None,
                function_call: None,
            },
        ));

        Ok(utterance)
    }
}

/// Sanitize a model response by stripping reasoning tokens and XML-like
/// tags, so only spoken words reach the transcript and the speakers.
fn sanitize_response(response: &str) -> String {
    let tags_to_strip = [
        "thinking",
        "think",
        "reflection",
        "reflect",
        "internal",
        "reasoning",
        "thought",
        "scratch",
        "scratchpad",
        "plan",
        "analysis",
        "analyze",
        "consider",
        "pondering",
        "deliberation",
    ];

    let mut result = response.to_string();

    for tag in &tags_to_strip {
        // Match <tag>...</tag> including attributes and newlines.
        let pattern = format!(r"(?is)<{tag}[^>]*>.*?</{tag}>", tag = tag);
        if let Ok(re) = regex::Regex::new(&pattern) {
            result = re.replace_all(&result, "").to_string();
        }
    }

    // Remove any remaining orphaned opening/closing tags.
    if let Ok(orphan_re) = regex::Regex::new(r"</?[\w]+[^>]*>") {
        result = orphan_re.replace_all(&result, "").to_string();
    }

    // Strip markdown emphasis markers.
    result = result.replace('*', "");

    // Collapse runs of whitespace.
    if let Ok(ws_re) = regex::Regex::new(r"\s+") {
        result = ws_re.replace_all(&result, " ").to_string();
    }

    result.trim().to_string()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Backend that replays a fixed list of responses, for tests.
    pub struct ScriptedBackend {
        responses: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        pub fn new<I, S>(responses: I) -> Arc<Self>
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            let mut responses: Vec<String> = responses.into_iter().map(Into::into).collect();
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
            })
        }
    }

    #[async_trait]
    impl ReasoningBackend for ScriptedBackend {
        async fn complete(
            &self,
            _history: &[ChatCompletionRequestMessage],
            _max_tokens: u32,
        ) -> Result<String, DebateError> {
            Ok(self
                .responses
                .lock()
                .expect("script lock poisoned")
                .pop()
                .unwrap_or_default())
        }
    }
}
