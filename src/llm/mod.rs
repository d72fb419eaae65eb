//! LLM integration for inbox-tasks.
//!
//! `LlmProvider` is the seam the task extractor talks to; `OpenAiProvider`
//! is the only backend and speaks the chat-completions wire format directly
//! over `reqwest`.

mod openai;
pub mod provider;

pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;

use crate::config::LlmConfig;

/// Create the LLM provider from configuration.
pub fn create_provider(client: reqwest::Client, config: &LlmConfig) -> Arc<dyn LlmProvider> {
    tracing::info!("Using OpenAI (model: {})", config.model);
    Arc::new(OpenAiProvider::new(client, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_reports_model() {
        let mut config = LlmConfig::new("sk-test");
        config.model = "gpt-4o-mini".to_string();
        let provider = create_provider(reqwest::Client::new(), &config);
        assert_eq!(provider.model_name(), "gpt-4o-mini");
    }
}
