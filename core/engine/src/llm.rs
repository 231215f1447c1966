use async_trait::async_trait;

use crate::error::EngineResult;

#[derive(Debug, Clone)]
pub struct LlmMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct LlmOptions {
    pub max_tokens: Option<u32>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

/// External language-model provider contract (SPEC_FULL.md §6). A provider
/// turns a system prompt plus an ordered message history into a single
/// reply string.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[LlmMessage],
        options: &LlmOptions,
    ) -> EngineResult<String>;
}

/// Offline fallback used whenever no external provider is configured. It
/// never fails and never needs credentials.
pub struct EchoProvider;

#[async_trait]
impl LlmProvider for EchoProvider {
    async fn generate(
        &self,
        _system_prompt: &str,
        messages: &[LlmMessage],
        _options: &LlmOptions,
    ) -> EngineResult<String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or("");
        Ok(format!("[echo] you said: {last_user}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_provider_reflects_last_user_message() {
        let provider = EchoProvider;
        let messages = vec![
            LlmMessage { role: "user".into(), content: "hello".into() },
            LlmMessage { role: "assistant".into(), content: "hi".into() },
            LlmMessage { role: "user".into(), content: "how are you".into() },
        ];
        let reply = provider
            .generate("system", &messages, &LlmOptions::default())
            .await
            .unwrap();
        assert_eq!(reply, "[echo] you said: how are you");
    }
}
