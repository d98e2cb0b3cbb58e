//! Provider adapters for OpenAI-compatible HTTP APIs.
//!
//! [`OpenAiClient`] covers plain chat-only endpoints. [`DeepSeekClient`] adds
//! the beta endpoint family: fill-in-middle and assistant prefix completion.
//! Both share [`ChatEndpoint`] for the chat routes.

pub mod deepseek;
pub mod openai;

pub use deepseek::DeepSeekClient;
pub use openai::OpenAiClient;

use std::time::Duration;

use tracing::{info, warn};

use crate::client::types::ChunkStream;
use crate::client::validation::validate_request;
use crate::client::LlmClient;
use crate::pipeline;
use crate::registry::{ConnectionSettings, ProviderConfig, ProviderType, DEEPSEEK_BETA_URL};
use crate::transport::HttpTransport;
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, StreamChunk};
use crate::{Error, ErrorContext, Result};

/// `base` joined with `path`, tolerating a trailing slash on the base.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Chat routes of one provider: `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct ChatEndpoint {
    transport: HttpTransport,
    config: ProviderConfig,
}

impl ChatEndpoint {
    pub fn new(transport: HttpTransport, config: ProviderConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    fn prepare(&self, request: &ChatCompletionRequest, stream: bool) -> ChatCompletionRequest {
        for warning in validate_request(request, &self.config) {
            warn!(provider = %self.config.name, model = %request.model, "{}", warning);
        }
        ChatCompletionRequest {
            stream,
            ..request.clone()
        }
    }

    pub async fn chat(&self, base_url: &str, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let url = endpoint(base_url, "chat/completions");
        let body = self.prepare(request, false);
        info!(
            provider = %self.config.name,
            model = %body.model,
            endpoint = %url,
            stream = false,
            "dispatching chat completion"
        );
        self.transport.post_json(&url, &body).await
    }

    pub async fn chat_stream(
        &self,
        base_url: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChunkStream<StreamChunk>> {
        let url = endpoint(base_url, "chat/completions");
        let body = self.prepare(request, true);
        info!(
            provider = %self.config.name,
            model = %body.model,
            endpoint = %url,
            stream = true,
            "dispatching chat completion"
        );
        let bytes = self.transport.post_stream(&url, &body).await?;
        Ok(ChunkStream::new(pipeline::chat_stream(bytes)))
    }
}

fn validate_base_url(raw: &str, field: &str) -> Result<String> {
    let parsed = url::Url::parse(raw).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid base URL '{}'", raw),
            ErrorContext::new()
                .with_field_path(field)
                .with_details(e.to_string())
                .with_source("create_client"),
        )
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::configuration_with_context(
            format!("base URL '{}' must use http or https", raw),
            ErrorContext::new()
                .with_field_path(field)
                .with_source("create_client"),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Build the adapter for `settings` with the environment's HTTP timeout.
pub fn create_client(settings: &ConnectionSettings) -> Result<Box<dyn LlmClient>> {
    create_client_with_timeout(settings, None)
}

pub(crate) fn create_client_with_timeout(
    settings: &ConnectionSettings,
    timeout: Option<Duration>,
) -> Result<Box<dyn LlmClient>> {
    let base_url = settings.effective_base_url();
    if base_url.is_empty() {
        return Err(Error::configuration_with_context(
            "a base URL is required for this provider",
            ErrorContext::new()
                .with_field_path("settings.base_url")
                .with_source("create_client"),
        ));
    }
    let base_url = validate_base_url(base_url, "settings.base_url")?;

    let mut config = settings.provider.config().clone();
    config.base_url = base_url.clone();
    if settings.provider == ProviderType::Custom && !settings.custom_name.is_empty() {
        config.name = settings.custom_name.clone();
    }
    if !settings.model.is_empty() {
        config.default_model = settings.model.clone();
    }

    let api_key = (!settings.api_key.is_empty()).then(|| settings.api_key.clone());
    let transport = HttpTransport::new(settings.provider.id(), api_key, timeout)?;
    let chat = ChatEndpoint::new(transport, config);

    let client: Box<dyn LlmClient> = match settings.provider {
        ProviderType::DeepSeek | ProviderType::Custom => {
            let beta_default = if settings.provider == ProviderType::DeepSeek && settings.base_url.is_empty() {
                DEEPSEEK_BETA_URL.to_string()
            } else {
                base_url.clone()
            };
            let beta_base_url = match settings.beta_base_url.as_deref() {
                Some(raw) if !raw.is_empty() => validate_base_url(raw, "settings.beta_base_url")?,
                _ => beta_default,
            };
            Box::new(DeepSeekClient::new(chat, base_url, beta_base_url))
        }
        // Anthropic is reached through its OpenAI-compatible chat route.
        ProviderType::OpenAi | ProviderType::Anthropic => Box::new(OpenAiClient::new(chat, base_url)),
    };

    if !client.capabilities().accepts_model(settings.effective_model()) {
        warn!(
            provider = %client.capabilities().name,
            model = %settings.effective_model(),
            "model is not in the provider's known list"
        );
    }
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: ProviderType, base_url: &str) -> ConnectionSettings {
        ConnectionSettings {
            provider,
            api_key: "sk-test".into(),
            base_url: base_url.into(),
            ..ConnectionSettings::new(provider)
        }
    }

    #[test]
    fn test_endpoint_join() {
        assert_eq!(endpoint("https://api.deepseek.com/", "/chat/completions"), "https://api.deepseek.com/chat/completions");
        assert_eq!(endpoint("http://h/v1", "completions"), "http://h/v1/completions");
    }

    #[test]
    fn test_factory_dispatch() {
        let ds = create_client(&settings(ProviderType::DeepSeek, "")).unwrap();
        assert!(ds.as_fim().is_some());
        assert_eq!(ds.capabilities().base_url, "https://api.deepseek.com");

        let oa = create_client(&settings(ProviderType::OpenAi, "")).unwrap();
        assert!(oa.as_fim().is_none());

        let an = create_client(&settings(ProviderType::Anthropic, "")).unwrap();
        assert!(an.as_fim().is_none());
        assert_eq!(an.capabilities().name, "Anthropic");
    }

    #[test]
    fn test_custom_requires_valid_base_url() {
        let err = create_client(&settings(ProviderType::Custom, "")).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));

        let err = create_client(&settings(ProviderType::Custom, "not a url")).unwrap_err();
        assert_eq!(err.context().and_then(|c| c.field_path.as_deref()), Some("settings.base_url"));

        let err = create_client(&settings(ProviderType::Custom, "ftp://example.com")).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));

        let mut s = settings(ProviderType::Custom, "http://localhost:8080/");
        s.custom_name = "Local".into();
        let client = create_client(&s).unwrap();
        assert_eq!(client.capabilities().name, "Local");
        assert_eq!(client.capabilities().base_url, "http://localhost:8080");
        assert!(client.as_fim().is_some());
    }
}
