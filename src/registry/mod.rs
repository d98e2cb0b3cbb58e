//! Provider registry: the capability matrix of known providers and the
//! connection settings a client is built from.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    DeepSeek,
    OpenAi,
    Anthropic,
    Custom,
}

impl ProviderType {
    pub const ALL: [ProviderType; 4] = [
        ProviderType::DeepSeek,
        ProviderType::OpenAi,
        ProviderType::Anthropic,
        ProviderType::Custom,
    ];

    /// Lowercase identifier, also used for keyring entries and `<ID>_API_KEY`.
    pub fn id(&self) -> &'static str {
        match self {
            ProviderType::DeepSeek => "deepseek",
            ProviderType::OpenAi => "openai",
            ProviderType::Anthropic => "anthropic",
            ProviderType::Custom => "custom",
        }
    }

    pub fn config(&self) -> &'static ProviderConfig {
        let idx = match self {
            ProviderType::DeepSeek => 0,
            ProviderType::OpenAi => 1,
            ProviderType::Anthropic => 2,
            ProviderType::Custom => 3,
        };
        &PROVIDERS[idx]
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderType::ALL
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::configuration(format!(
                    "unknown provider '{}' (expected one of: deepseek, openai, anthropic, custom)",
                    s
                ))
            })
    }
}

/// What a provider can do and where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub provider: ProviderType,
    pub name: String,
    pub base_url: String,
    pub default_model: String,
    pub models: Vec<String>,
    pub supports_thinking_mode: bool,
    #[serde(rename = "supportsFIM")]
    pub supports_fim: bool,
    pub supports_prefix_completion: bool,
}

impl ProviderConfig {
    /// An empty model list means any model is accepted.
    pub fn accepts_model(&self, model: &str) -> bool {
        self.models.is_empty() || self.models.iter().any(|m| m == model)
    }
}

fn entry(
    provider: ProviderType,
    name: &str,
    base_url: &str,
    default_model: &str,
    models: &[&str],
    rich: bool,
) -> ProviderConfig {
    ProviderConfig {
        provider,
        name: name.to_string(),
        base_url: base_url.to_string(),
        default_model: default_model.to_string(),
        models: models.iter().map(|m| m.to_string()).collect(),
        supports_thinking_mode: rich,
        supports_fim: rich,
        supports_prefix_completion: rich,
    }
}

/// Indexed in [`ProviderType::ALL`] order.
pub static PROVIDERS: Lazy<[ProviderConfig; 4]> = Lazy::new(|| {
    [
        entry(
            ProviderType::DeepSeek,
            "DeepSeek",
            "https://api.deepseek.com",
            "deepseek-chat",
            &["deepseek-chat", "deepseek-reasoner"],
            true,
        ),
        entry(
            ProviderType::OpenAi,
            "OpenAI",
            "https://api.openai.com/v1",
            "gpt-4o",
            &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-4", "gpt-3.5-turbo"],
            false,
        ),
        entry(
            ProviderType::Anthropic,
            "Anthropic",
            "https://api.anthropic.com/v1",
            "claude-sonnet-4-20250514",
            &[
                "claude-opus-4-20250514",
                "claude-sonnet-4-20250514",
                "claude-haiku-3-20250514",
            ],
            false,
        ),
        entry(ProviderType::Custom, "Custom", "", "", &[], true),
    ]
});

pub const DEEPSEEK_BETA_URL: &str = "https://api.deepseek.com/beta";

/// User-facing connection choice. Empty strings fall back to the provider's
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSettings {
    pub provider: ProviderType,
    #[serde(default)]
    pub custom_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta_base_url: Option<String>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            provider: ProviderType::DeepSeek,
            custom_name: String::new(),
            api_key: String::new(),
            base_url: String::new(),
            model: "deepseek-chat".to_string(),
            beta_base_url: None,
        }
    }
}

impl ConnectionSettings {
    pub fn new(provider: ProviderType) -> Self {
        Self {
            provider,
            model: provider.config().default_model.clone(),
            ..Default::default()
        }
    }

    pub fn effective_base_url(&self) -> &str {
        if self.base_url.is_empty() {
            &self.provider.config().base_url
        } else {
            &self.base_url
        }
    }

    pub fn effective_model(&self) -> &str {
        if self.model.is_empty() {
            &self.provider.config().default_model
        } else {
            &self.model
        }
    }

    /// Display name; custom providers may carry their own.
    pub fn display_name(&self) -> &str {
        if self.provider == ProviderType::Custom && !self.custom_name.is_empty() {
            &self.custom_name
        } else {
            &self.provider.config().name
        }
    }
}
