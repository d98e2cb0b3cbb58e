//! Completion client contract, builder and request checks.
//!
//! Adapters live in [`crate::drivers`]; this module holds what callers code
//! against.

pub mod builder;
pub mod core;
pub mod types;
pub mod validation;

pub use builder::ClientBuilder;
pub use self::core::{fim_completion, fim_completion_stream, FimClient, LlmClient};
pub use types::{CancelHandle, ChunkStream};
pub use validation::{
    validate_json_mode, validate_prefix_completion, validate_request, validate_thinking_mode,
};
