//! ConvStore - Conversation templates and adapter resolution
//!
//! The conversation side of the modelchat launcher: named prompt-format
//! templates, the process-wide registry they live in, and the model
//! adapters that pick a default template from a model path.
//!
//! # Core Concepts
//!
//! - **Templates are values**: immutable once built, compared by value
//! - **One registry per process**: constructed at startup, wired by
//!   reference, mutated only through `register`
//! - **Resolution is a pure read**: what an adapter resolves to depends
//!   only on the registries' state at call time
//! - **Overrides are kind-scoped**: rebinding an adapter's resolver
//!   affects every resolution for that kind until the process exits
//!
//! # Modules
//!
//! - [`template`] - `ConvTemplate` and `SeparatorStyle`
//! - [`registry`] - the name -> template mapping
//! - [`builtins`] - library-default templates
//! - [`conversation`] - live conversation state and prompt assembly
//! - [`adapter`] - adapter kinds and the resolver-override mechanism
//! - [`error`] - error types

pub mod adapter;
pub mod builtins;
pub mod conversation;
pub mod error;
pub mod registry;
pub mod template;

// Re-export commonly used types
pub use adapter::{AdapterKind, AdapterRegistry};
pub use conversation::{Conversation, Turn};
pub use error::ConvError;
pub use registry::TemplateRegistry;
pub use template::{ConvTemplate, SeparatorStyle};
