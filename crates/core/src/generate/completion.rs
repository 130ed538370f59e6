use async_trait::async_trait;
use serde_json::Value;

/// Failure modes a completion transport can report. Anything else an
/// implementation hits should be folded into one of these.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("completion request timed out")]
    Timeout,
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

/// Capability to turn a prompt into a structured JSON value. Transport
/// details (HTTP framing, socket retries, auth) live behind this trait,
/// outside the core. Implementations must return syntactically valid JSON
/// shaped by `response_schema` and use their most deterministic decoding
/// mode; retry policy, if any, is theirs.
#[async_trait]
pub trait TextCompletionService: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        response_schema: &Value,
    ) -> Result<Value, CompletionError>;
}

/// Stand-in used when no model transport is wired up. Always unavailable,
/// which sends the resolver down the fallback chain.
#[derive(Debug, Default)]
pub struct DisabledCompletionService;

#[async_trait]
impl TextCompletionService for DisabledCompletionService {
    async fn generate(&self, _prompt: &str, _schema: &Value) -> Result<Value, CompletionError> {
        Err(CompletionError::ServiceUnavailable(
            "no completion service configured".to_string(),
        ))
    }
}
