//! Model adapters and default-template resolution
//!
//! Each adapter kind represents one family of conversational models and
//! knows how to pick a default template from a model path. The resolver
//! for a kind can be rebound at startup to a fixed template name; the
//! rebinding is kind-scoped and lasts for the process lifetime, so every
//! later resolution for that kind goes through it.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::ConvError;
use crate::registry::TemplateRegistry;
use crate::template::ConvTemplate;

/// The closed set of model families the launcher can pair with a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    Vicuna,
    Alpaca,
    ChatGlm,
    FastChatT5,
    Qwen,
    /// Catch-all for unrecognized paths; must stay last in match order
    Base,
}

impl AdapterKind {
    /// All kinds in match order; `Base` matches everything and goes last
    pub const ALL: [AdapterKind; 6] = [
        AdapterKind::Vicuna,
        AdapterKind::Alpaca,
        AdapterKind::ChatGlm,
        AdapterKind::FastChatT5,
        AdapterKind::Qwen,
        AdapterKind::Base,
    ];

    /// Config-file name of this adapter
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vicuna => "vicuna",
            Self::Alpaca => "alpaca",
            Self::ChatGlm => "chatglm",
            Self::FastChatT5 => "fastchat-t5",
            Self::Qwen => "qwen",
            Self::Base => "base",
        }
    }

    /// Parse an adapter name from config
    pub fn from_name(name: &str) -> Option<Self> {
        debug!(%name, "AdapterKind::from_name: called");
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Whether a model path belongs to this family
    pub fn matches(&self, model_path: &str) -> bool {
        let path = model_path.to_lowercase();
        match self {
            Self::Vicuna => path.contains("vicuna"),
            Self::Alpaca => path.contains("alpaca"),
            Self::ChatGlm => path.contains("chatglm"),
            Self::FastChatT5 => path.contains("t5"),
            Self::Qwen => path.contains("qwen"),
            Self::Base => true,
        }
    }

    /// Whether this kind exposes the resolver rebind hook
    ///
    /// `Base` does not: its template choice is fixed by construction, so
    /// there is nothing to rebind.
    pub fn supports_override(&self) -> bool {
        !matches!(self, Self::Base)
    }

    /// Built-in pattern resolution: model path -> template name
    fn builtin_template_name(&self, model_path: &str) -> &'static str {
        let path = model_path.to_lowercase();
        match self {
            // Old vicuna weights predate the v1 prompt format
            Self::Vicuna => {
                if path.contains("v0") {
                    "zero_shot"
                } else {
                    "vicuna_v1.1"
                }
            }
            Self::Alpaca => "alpaca",
            Self::ChatGlm => "chatglm",
            Self::FastChatT5 => "fastchat-t5",
            Self::Qwen => "chatml",
            Self::Base => "zero_shot",
        }
    }
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Adapter resolution state for the process
///
/// Holds the per-kind resolver slots. A kind with no entry resolves
/// through its built-in path matcher; an entry pins it to a fixed
/// template name, looked up in the registry at call time so a later
/// re-registration under that name takes effect on future resolutions.
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    overrides: HashMap<AdapterKind, String>,
}

impl AdapterRegistry {
    /// Create a registry with every kind on its built-in resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the adapter for a model path (first match wins, `Base` last)
    pub fn match_adapter(&self, model_path: &str) -> AdapterKind {
        let kind = AdapterKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.matches(model_path))
            .unwrap_or(AdapterKind::Base);
        debug!(%model_path, adapter = %kind, "AdapterRegistry::match_adapter: matched");
        kind
    }

    /// Rebind an adapter kind's resolver to a fixed template name
    ///
    /// Installing twice is last-write-wins, matching the template
    /// registry's own overwrite policy. The template name is not checked
    /// here; a missing name surfaces as `TemplateNotFound` on the first
    /// resolution that uses it.
    pub fn install_override(&mut self, adapter: &str, template_name: &str) -> Result<(), ConvError> {
        debug!(%adapter, %template_name, "AdapterRegistry::install_override: called");
        let kind = AdapterKind::from_name(adapter)
            .ok_or_else(|| ConvError::InvalidOverrideTarget(adapter.to_string()))?;
        if !kind.supports_override() {
            return Err(ConvError::InvalidOverrideTarget(adapter.to_string()));
        }
        info!(adapter = %kind, template = %template_name, "Installing default-template override");
        self.overrides.insert(kind, template_name.to_string());
        Ok(())
    }

    /// The fixed template name installed for a kind, if any
    pub fn override_for(&self, kind: AdapterKind) -> Option<&str> {
        self.overrides.get(&kind).map(String::as_str)
    }

    /// Resolve the default template for `kind` and `model_path`
    ///
    /// Pure read of the registries' current state: an installed override
    /// ignores the model path and looks its fixed name up now, not at
    /// install time.
    pub fn resolve_default_template<'a>(
        &self,
        kind: AdapterKind,
        model_path: &str,
        templates: &'a TemplateRegistry,
    ) -> Result<&'a ConvTemplate, ConvError> {
        let name = match self.overrides.get(&kind) {
            Some(fixed) => {
                debug!(adapter = %kind, template = %fixed, "resolve_default_template: override active, ignoring model path");
                fixed.as_str()
            }
            None => kind.builtin_template_name(model_path),
        };
        templates.get(name)
    }

    /// Match and resolve in one step
    pub fn resolve_for_path<'a>(
        &self,
        model_path: &str,
        templates: &'a TemplateRegistry,
    ) -> Result<&'a ConvTemplate, ConvError> {
        let kind = self.match_adapter(model_path);
        self.resolve_default_template(kind, model_path, templates)
    }
}
