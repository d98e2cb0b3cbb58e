use crate::client::LlmClient;
use crate::drivers::create_client_with_timeout;
use crate::registry::{ConnectionSettings, ProviderType};
use crate::Result;
use std::time::Duration;

/// Builder for provider clients.
///
/// Unset fields fall back to the provider's defaults; the API key falls back
/// to the OS keyring and then `<PROVIDER>_API_KEY`.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    settings: ConnectionSettings,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    pub fn new(provider: ProviderType) -> Self {
        Self {
            settings: ConnectionSettings::new(provider),
            timeout: None,
        }
    }

    pub fn from_settings(settings: ConnectionSettings) -> Self {
        Self {
            settings,
            timeout: None,
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.settings.api_key = key.into();
        self
    }

    /// Override the provider's base URL (required for custom endpoints, handy
    /// for mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.settings.base_url = url.into();
        self
    }

    /// Where FIM and prefix completion requests go.
    pub fn beta_base_url(mut self, url: impl Into<String>) -> Self {
        self.settings.beta_base_url = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.settings.model = model.into();
        self
    }

    pub fn custom_name(mut self, name: impl Into<String>) -> Self {
        self.settings.custom_name = name.into();
        self
    }

    /// Overrides `FLOWWRITE_HTTP_TIMEOUT_SECS`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn build(self) -> Result<Box<dyn LlmClient>> {
        create_client_with_timeout(&self.settings, self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let client = ClientBuilder::new(ProviderType::DeepSeek)
            .api_key("sk-test")
            .base_url("http://127.0.0.1:9/")
            .model("deepseek-reasoner")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(client.capabilities().base_url, "http://127.0.0.1:9");
        assert_eq!(client.capabilities().default_model, "deepseek-reasoner");
    }

    #[test]
    fn test_invalid_beta_url_is_rejected() {
        let err = ClientBuilder::new(ProviderType::Custom)
            .api_key("k")
            .base_url("http://localhost:1234")
            .beta_base_url("::nope")
            .build()
            .unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("settings.beta_base_url")
        );
    }
}
