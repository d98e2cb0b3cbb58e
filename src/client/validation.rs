//! Advisory request checks.
//!
//! Nothing here blocks a call. Adapters log the returned warnings and send the
//! request unchanged.

use crate::registry::ProviderConfig;
use crate::types::{ChatCompletionRequest, ChatMessage, MessageRole, ResponseFormatType};

/// Sampling parameters a reasoning model ignores.
pub fn validate_thinking_mode(request: &ChatCompletionRequest) -> Vec<String> {
    if !request.is_thinking_mode() {
        return Vec::new();
    }

    [
        ("temperature", request.temperature.is_some()),
        ("top_p", request.top_p.is_some()),
        ("presence_penalty", request.presence_penalty.is_some()),
        ("frequency_penalty", request.frequency_penalty.is_some()),
    ]
    .into_iter()
    .filter(|(_, set)| *set)
    .map(|(name, _)| format!("{} is not supported in thinking mode", name))
    .collect()
}

/// JSON mode only works when the prompt itself asks for JSON.
pub fn validate_json_mode(request: &ChatCompletionRequest) -> Vec<String> {
    let json_mode = matches!(
        request.response_format.map(|f| f.kind),
        Some(ResponseFormatType::JsonObject)
    );
    if !json_mode {
        return Vec::new();
    }

    let mentions_json = request
        .messages
        .iter()
        .any(|m| m.content.to_lowercase().contains("json"));
    if mentions_json {
        Vec::new()
    } else {
        vec![
            "Prompt must contain the word \"json\" when using json_object response format"
                .to_string(),
        ]
    }
}

pub fn validate_prefix_completion(messages: &[ChatMessage]) -> Vec<String> {
    match messages.last() {
        Some(last) if last.is_prefix() && last.role != MessageRole::Assistant => vec![
            "Prefix completion requires the last message to have role \"assistant\"".to_string(),
        ],
        _ => Vec::new(),
    }
}

/// All request checks plus what the target provider can actually do.
pub fn validate_request(request: &ChatCompletionRequest, provider: &ProviderConfig) -> Vec<String> {
    let mut warnings = validate_thinking_mode(request);
    warnings.extend(validate_json_mode(request));
    warnings.extend(validate_prefix_completion(&request.messages));

    if request.is_thinking_mode() && !provider.supports_thinking_mode {
        warnings.push(format!(
            "{} does not support thinking mode",
            provider.name
        ));
    }
    if request.messages.iter().any(ChatMessage::is_prefix) && !provider.supports_prefix_completion {
        warnings.push(format!(
            "{} does not support prefix completion",
            provider.name
        ));
    }
    if !provider.accepts_model(&request.model) {
        warnings.push(format!(
            "model {} is not listed for {}",
            request.model, provider.name
        ));
    }

    warnings
}
