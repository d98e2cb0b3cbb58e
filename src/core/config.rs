//! Per-node call configuration: where to send the request, how to sample,
//! and the two prompts that make up the message list.

use serde::{Deserialize, Serialize};

use super::textblock::{NodeId, TextBlockList};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiConnection {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl Default for ApiConnection {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiParameters {
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
    pub stop_sequences: Vec<String>,
    pub streaming: bool,
}

impl Default for ApiParameters {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 4096,
            top_p: 1.0,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            stop_sequences: Vec::new(),
            streaming: true,
        }
    }
}

/// Partial connection update; `Some` fields override.
#[derive(Debug, Clone, Default)]
pub struct ConnectionPatch {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

/// Partial parameter update; `Some` fields override.
#[derive(Debug, Clone, Default)]
pub struct ParametersPatch {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub presence_penalty: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub stop_sequences: Option<Vec<String>>,
    pub streaming: Option<bool>,
}

/// Connection, sampling parameters and prompts of one node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeConfiguration {
    pub connection: ApiConnection,
    pub parameters: ApiParameters,
    pub system_prompt: TextBlockList,
    pub user_prompt: TextBlockList,
}

impl NodeConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct nodes referenced from either prompt, system prompt first.
    pub fn dependencies(&self) -> Vec<NodeId> {
        let mut deps = self.system_prompt.dependencies();
        for id in self.user_prompt.dependencies() {
            if !deps.contains(&id) {
                deps.push(id);
            }
        }
        deps
    }

    pub fn with_connection(&self, patch: ConnectionPatch) -> Self {
        let current = &self.connection;
        Self {
            connection: ApiConnection {
                endpoint: patch.endpoint.unwrap_or_else(|| current.endpoint.clone()),
                api_key: patch.api_key.unwrap_or_else(|| current.api_key.clone()),
                model: patch.model.unwrap_or_else(|| current.model.clone()),
            },
            ..self.clone()
        }
    }

    pub fn with_parameters(&self, patch: ParametersPatch) -> Self {
        let p = &self.parameters;
        Self {
            parameters: ApiParameters {
                temperature: patch.temperature.unwrap_or(p.temperature),
                max_tokens: patch.max_tokens.unwrap_or(p.max_tokens),
                top_p: patch.top_p.unwrap_or(p.top_p),
                presence_penalty: patch.presence_penalty.unwrap_or(p.presence_penalty),
                frequency_penalty: patch.frequency_penalty.unwrap_or(p.frequency_penalty),
                stop_sequences: patch
                    .stop_sequences
                    .unwrap_or_else(|| p.stop_sequences.clone()),
                streaming: patch.streaming.unwrap_or(p.streaming),
            },
            ..self.clone()
        }
    }

    pub fn with_system_prompt(&self, system_prompt: TextBlockList) -> Self {
        Self {
            system_prompt,
            ..self.clone()
        }
    }

    pub fn with_user_prompt(&self, user_prompt: TextBlockList) -> Self {
        Self {
            user_prompt,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::textblock::AnyTextBlock;

    #[test]
    fn test_defaults_match_editor_defaults() {
        let config = NodeConfiguration::new();
        assert_eq!(config.connection.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.connection.model, "gpt-4o");
        assert_eq!(config.parameters.max_tokens, 4096);
        assert!(config.parameters.streaming);
    }

    #[test]
    fn test_dependencies_union_both_prompts() {
        let config = NodeConfiguration::new()
            .with_system_prompt(TextBlockList::new().append(AnyTextBlock::virtual_ref("a")))
            .with_user_prompt(
                TextBlockList::new()
                    .append(AnyTextBlock::virtual_ref("b"))
                    .append(AnyTextBlock::virtual_ref("a")),
            );
        assert_eq!(config.dependencies(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_patches_only_override_given_fields() {
        let base = NodeConfiguration::new();
        let next = base
            .with_connection(ConnectionPatch {
                model: Some("deepseek-chat".into()),
                ..Default::default()
            })
            .with_parameters(ParametersPatch {
                temperature: Some(0.2),
                ..Default::default()
            });

        assert_eq!(next.connection.model, "deepseek-chat");
        assert_eq!(next.connection.endpoint, base.connection.endpoint);
        assert_eq!(next.parameters.temperature, 0.2);
        assert_eq!(next.parameters.max_tokens, base.parameters.max_tokens);
        assert_eq!(base.parameters.temperature, 0.7);
    }
}
