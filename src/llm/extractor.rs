//! LLM-backed extraction capability.
//!
//! Sends the instruction and the message to an `LlmProvider` and cleans the
//! reply into `Some(value)` or `None`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::capabilities::Extractor;
use crate::error::{ConfigError, ExtractionError};
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Tuning for extraction calls.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Temperature for the extraction call.
    pub temperature: f32,
    /// Max tokens for the reply. Extracted values are short.
    pub max_tokens: u32,
    /// Message text beyond this many characters is not sent.
    pub max_message_chars: usize,
    /// Deadline for one LLM call. `None` waits for the provider.
    pub request_timeout: Option<Duration>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 128,
            max_message_chars: 4000,
            request_timeout: None,
        }
    }
}

impl ExtractorConfig {
    /// Defaults, overridden by `EMAIL_CAPTURE_MAX_MESSAGE_CHARS` and
    /// `EMAIL_CAPTURE_LLM_TIMEOUT_SECS` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("EMAIL_CAPTURE_MAX_MESSAGE_CHARS") {
            config.max_message_chars = parse_max_chars(&raw)?;
        }
        if let Ok(raw) = std::env::var("EMAIL_CAPTURE_LLM_TIMEOUT_SECS") {
            config.request_timeout = Some(parse_timeout_secs(&raw)?);
        }
        Ok(config)
    }
}

fn parse_timeout_secs(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Duration::from_secs(n)),
        _ => Err(ConfigError::InvalidValue {
            key: "EMAIL_CAPTURE_LLM_TIMEOUT_SECS".to_string(),
            message: format!("expected a positive number of seconds, got '{raw}'"),
        }),
    }
}

fn parse_max_chars(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            key: "EMAIL_CAPTURE_MAX_MESSAGE_CHARS".to_string(),
            message: format!("expected a positive integer, got '{raw}'"),
        }),
    }
}

/// Extraction capability backed by an LLM.
pub struct LlmExtractor {
    llm: Arc<dyn LlmProvider>,
    config: ExtractorConfig,
}

impl LlmExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>, config: ExtractorConfig) -> Self {
        Self { llm, config }
    }

    fn build_request(&self, instruction: &str, message: &str) -> CompletionRequest {
        CompletionRequest::new(vec![
            ChatMessage::system(build_system_prompt()),
            ChatMessage::user(build_user_prompt(
                instruction,
                message,
                self.config.max_message_chars,
            )),
        ])
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens)
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn ask(
        &self,
        instruction: &str,
        message: &str,
    ) -> Result<Option<String>, ExtractionError> {
        let request = self.build_request(instruction, message);
        let response = match self.config.request_timeout {
            Some(after) => tokio::time::timeout(after, self.llm.complete(request))
                .await
                .map_err(|_| ExtractionError::Timeout { after })??,
            None => self.llm.complete(request).await?,
        };
        let value = parse_extraction_response(&response.content);

        debug!(
            model = self.llm.model_name(),
            raw_response = %response.content,
            found = value.is_some(),
            "Extraction reply parsed"
        );
        Ok(value)
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_system_prompt() -> String {
    "You are an extraction engine. Apply the user's instruction to the message and \
     reply with ONLY the extracted value, exactly as it appears in the message.\n\n\
     Rules:\n\
     - No explanations, labels, quotes, or punctuation around the value\n\
     - If the message contains several candidates, reply with the first one\n\
     - If the message does not contain the requested value, reply with NONE"
        .to_string()
}

fn build_user_prompt(instruction: &str, message: &str, max_chars: usize) -> String {
    let content_preview: String = message.chars().take(max_chars).collect();
    format!("{instruction}\n\nMessage:\n{content_preview}")
}

// ── Response parsing ────────────────────────────────────────────────

/// Clean a model reply into an extracted value.
///
/// Strips a markdown code fence, one layer of matching quotes and trailing
/// sentence punctuation. A reply that is not a single token containing `@`
/// is the model saying "nothing found" (`NONE`, `NONE.`, a full sentence)
/// and becomes `None`.
fn parse_extraction_response(raw: &str) -> Option<String> {
    let mut text = strip_code_fence(raw.trim()).trim();

    for quote in ['"', '\'', '`'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            text = text[1..text.len() - 1].trim();
            break;
        }
    }

    let text = text.trim_end_matches(['.', '!']);
    if text.is_empty() || text.contains(char::is_whitespace) || !text.contains('@') {
        return None;
    }
    Some(text.to_string())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(after) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = after.strip_suffix("```") else {
        return text;
    };
    // Drop an info string such as ```text
    match inner.split_once('\n') {
        Some((first, rest)) if !first.contains(' ') => rest,
        _ => inner,
    }
}
