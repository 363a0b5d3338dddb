//! Conversation store error types

use thiserror::Error;

/// Errors raised by the template registry and adapter resolution
#[derive(Debug, Error)]
pub enum ConvError {
    /// A template name was looked up in the registry but was never registered
    #[error("Conversation template not found: '{0}'")]
    TemplateNotFound(String),

    /// An override was requested for an adapter that does not expose a
    /// rebindable template resolver
    #[error("Adapter '{0}' does not expose a rebindable template resolver")]
    InvalidOverrideTarget(String),
}

impl ConvError {
    /// Check if this error is a missing-template lookup
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConvError::TemplateNotFound(_))
    }
}
