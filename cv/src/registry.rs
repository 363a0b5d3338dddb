//! Process-wide template registry
//!
//! One owned mapping from template name to template, constructed during
//! startup and wired by reference to every consumer. Registration is the
//! only mutation; later resolution calls are pure reads.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::ConvError;
use crate::template::ConvTemplate;

/// Name -> template mapping
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<String, ConvTemplate>,
}

impl TemplateRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Create a registry seeded with the built-in templates
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtins::register_builtins(&mut registry);
        debug!(count = registry.len(), "TemplateRegistry::with_builtins: seeded");
        registry
    }

    /// Register a template under its own name
    ///
    /// Re-registering an existing name overwrites the previous entry;
    /// this is the supported way to replace a built-in.
    pub fn register(&mut self, template: ConvTemplate) {
        let replaced = self.templates.contains_key(&template.name);
        info!(name = %template.name, replaced, "Registering conversation template");
        self.templates.insert(template.name.clone(), template);
    }

    /// Look up a template by exact name
    pub fn get(&self, name: &str) -> Result<&ConvTemplate, ConvError> {
        debug!(%name, "TemplateRegistry::get: called");
        self.templates
            .get(name)
            .ok_or_else(|| ConvError::TemplateNotFound(name.to_string()))
    }

    /// Check whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Number of registered templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Registered names, sorted for stable display
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::SeparatorStyle;

    fn template(name: &str, sep: &str) -> ConvTemplate {
        ConvTemplate::new(name, "sys", ("User", "Bot"), SeparatorStyle::AddColonSingle, sep, None)
    }

    #[test]
    fn test_register_get_round_trip() {
        let mut registry = TemplateRegistry::new();
        let t = template("custom", "\n");
        registry.register(t.clone());

        assert_eq!(registry.get("custom").unwrap(), &t);
    }

    #[test]
    fn test_reregister_overwrites() {
        let mut registry = TemplateRegistry::new();
        registry.register(template("custom", "\n"));
        registry.register(template("custom", " "));

        assert_eq!(registry.get("custom").unwrap().sep, " ");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_missing_is_not_found_and_leaves_registry_unchanged() {
        let registry = TemplateRegistry::with_builtins();
        let before = registry.len();

        let err = registry.get("does-not-exist").unwrap_err();
        assert!(matches!(err, ConvError::TemplateNotFound(ref name) if name == "does-not-exist"));
        assert_eq!(registry.len(), before);
    }

    #[test]
    fn test_names_are_exact_no_case_folding() {
        let mut registry = TemplateRegistry::new();
        registry.register(template("Custom", "\n"));

        assert!(registry.get("custom").is_err());
        assert!(registry.get("Custom").is_ok());
    }

    #[test]
    fn test_builtins_are_seeded() {
        let registry = TemplateRegistry::with_builtins();
        for name in ["zero_shot", "vicuna_v1.1", "alpaca", "chatml", "chatglm", "fastchat-t5"] {
            assert!(registry.contains(name), "missing builtin: {}", name);
        }
    }
}
