//! Session runner boundary
//!
//! The launcher hands the runner one `ChatConfig` and the launcher's
//! registries, exactly once per process. The runner owns the loop from
//! there until the user exits; the first template resolution happens
//! inside it, after startup configuration is fully applied.

use async_trait::async_trait;
use eyre::Result;

pub mod backend;
pub mod shell;

pub use backend::{BackendError, CompletionBackend, GenerationRequest, GenerationResponse, HttpBackend};
pub use shell::ChatShell;

use crate::config::ChatConfig;
use crate::launch::Launcher;

/// An interactive session over a served model
#[async_trait]
pub trait SessionRunner {
    /// Drive the session to completion
    async fn run(&mut self, chat: &ChatConfig, launcher: &Launcher) -> Result<()>;
}
