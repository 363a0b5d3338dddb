//! ModelChat - command-line launcher for a conversational model serving session
//!
//! The launcher parses the CLI, loads the optional config file, applies
//! startup configuration to the conversation registries (template
//! registration first, resolver override second), and hands a single
//! `ChatConfig` to the session runner. Template and adapter semantics
//! live in the `convstore` crate.
//!
//! # Modules
//!
//! - [`cli`] - command-line argument definitions
//! - [`config`] - config file loading and `ChatConfig` validation
//! - [`launch`] - registry ownership and startup ordering
//! - [`session`] - the session runner boundary, shell, and backend

pub mod cli;
pub mod config;
pub mod launch;
pub mod session;

// Re-export commonly used types
pub use cli::Cli;
pub use config::{ChatConfig, ConfigError, Device, DisplayStyle, Dtype, LauncherConfig, XftDtype};
pub use launch::{LaunchError, Launcher};
pub use session::{ChatShell, CompletionBackend, HttpBackend, SessionRunner};
