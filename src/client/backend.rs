//! The model-backend capability.
//!
//! The evaluation loops never see a concrete model implementation, only
//! this trait: something that turns a prompt into text and can give its
//! resources back. Concrete backends are selected by configuration, not by
//! a type hierarchy.

use crate::models::Result;

/// A chat-capable model backend.
pub trait ChatBackend {
    /// Display name, used in logs and output filenames.
    fn name(&self) -> &str;

    /// Generate a response for `prompt`, optionally under a system prompt.
    /// Blocks until generation completes.
    fn chat(&self, prompt: &str, system_prompt: Option<&str>, max_new_tokens: u32)
        -> Result<String>;

    /// Free the backend's exclusive resources. Idempotent; the backend must
    /// not be used for generation afterwards.
    fn release(&mut self);
}
