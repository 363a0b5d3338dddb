//! Startup wiring for the chat session
//!
//! The launcher owns the two registries for the process lifetime and
//! applies the config file in a fixed order: template registration first,
//! override installation second, so an override may reference the
//! template it ships with. The session runner receives the launcher by
//! reference and performs the first resolution after both steps.

use thiserror::Error;
use tracing::{debug, info};

use convstore::{AdapterRegistry, ConvError, Conversation, TemplateRegistry};

use crate::config::{ChatConfig, ConfigError, LauncherConfig};

/// Errors surfaced while applying startup configuration
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Conv(#[from] ConvError),
}

/// Owns the registries and applies startup configuration to them
#[derive(Debug)]
pub struct Launcher {
    pub templates: TemplateRegistry,
    pub adapters: AdapterRegistry,
}

impl Launcher {
    /// Create a launcher with built-in templates and untouched resolvers
    pub fn new() -> Self {
        Self {
            templates: TemplateRegistry::with_builtins(),
            adapters: AdapterRegistry::new(),
        }
    }

    /// Apply the config file: register the custom template (if any),
    /// then install the resolver override (if any)
    pub fn apply(&mut self, config: &LauncherConfig) -> Result<(), LaunchError> {
        debug!(
            has_template = config.template.is_some(),
            has_override = config.override_.is_some(),
            "Launcher::apply: called"
        );

        if let Some(template_config) = &config.template {
            let template = template_config.to_template()?;
            self.templates.register(template);
        }

        if let Some(override_config) = &config.override_ {
            self.adapters
                .install_override(&override_config.adapter, &override_config.template)?;
        }

        Ok(())
    }

    /// Build the conversation for a session
    ///
    /// `--conv-template` picks a template by name directly; otherwise the
    /// model path goes through adapter resolution (honoring any installed
    /// override). `--conv-system-msg` replaces the template's system
    /// message for this session only.
    pub fn start_conversation(&self, chat: &ChatConfig) -> Result<Conversation, ConvError> {
        let template = match &chat.conv_template {
            Some(name) => {
                debug!(%name, "start_conversation: template picked by name");
                self.templates.get(name)?
            }
            None => {
                let kind = self.adapters.match_adapter(&chat.model_path);
                self.adapters
                    .resolve_default_template(kind, &chat.model_path, &self.templates)?
            }
        };
        info!(template = %template.name, model_path = %chat.model_path, "Using conversation template");

        let mut conversation = Conversation::new(template.clone());
        if let Some(message) = &chat.conv_system_msg {
            conversation.set_system_message(message.clone());
        }
        Ok(conversation)
    }
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn chat_config(args: &[&str]) -> ChatConfig {
        let mut full = vec!["mc"];
        full.extend_from_slice(args);
        ChatConfig::from_cli(&Cli::parse_from(full)).unwrap()
    }

    fn fine_tune_config() -> LauncherConfig {
        serde_yaml::from_str(
            r#"
template:
  name: vicuna_v1.2
  system-message: "You are a test engineer."
  roles: [human, gpt]
  sep-style: add-colon-two
  sep: " "
  sep2: "</s>"

override:
  adapter: vicuna
  template: vicuna_v1.2
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_apply_registers_then_overrides() {
        let mut launcher = Launcher::new();
        launcher.apply(&fine_tune_config()).unwrap();

        assert!(launcher.templates.contains("vicuna_v1.2"));
        assert_eq!(
            launcher.adapters.override_for(convstore::AdapterKind::Vicuna),
            Some("vicuna_v1.2")
        );
    }

    #[test]
    fn test_apply_empty_config_is_a_no_op() {
        let mut launcher = Launcher::new();
        let before = launcher.templates.len();

        launcher.apply(&LauncherConfig::default()).unwrap();
        assert_eq!(launcher.templates.len(), before);
    }

    #[test]
    fn test_apply_rejects_bad_override_target() {
        let mut launcher = Launcher::new();
        let config: LauncherConfig = serde_yaml::from_str(
            r#"
override:
  adapter: base
  template: chatml
"#,
        )
        .unwrap();

        let err = launcher.apply(&config).unwrap_err();
        assert!(matches!(err, LaunchError::Conv(ConvError::InvalidOverrideTarget(_))));
    }

    #[test]
    fn test_apply_rejects_bad_template_config() {
        let mut launcher = Launcher::new();
        let config: LauncherConfig = serde_yaml::from_str(
            r#"
template:
  name: broken
  roles: [a, b]
  sep-style: no-such-style
"#,
        )
        .unwrap();

        let err = launcher.apply(&config).unwrap_err();
        assert!(matches!(err, LaunchError::Config(ConfigError::InvalidChoice { .. })));
        // The failed template never lands in the registry
        assert!(!launcher.templates.contains("broken"));
    }

    #[test]
    fn test_start_conversation_resolves_through_override() {
        let mut launcher = Launcher::new();
        launcher.apply(&fine_tune_config()).unwrap();

        // A path the vicuna adapter matches, but whose pattern resolution
        // would pick vicuna_v1.1 - the override wins
        let conversation = launcher
            .start_conversation(&chat_config(&["--model-path", "lmsys/vicuna-7b-v1.5"]))
            .unwrap();
        assert_eq!(conversation.template.name, "vicuna_v1.2");
        assert_eq!(conversation.system_message, "You are a test engineer.");
    }

    #[test]
    fn test_start_conversation_by_template_name() {
        let launcher = Launcher::new();
        let conversation = launcher
            .start_conversation(&chat_config(&["--conv-template", "chatml"]))
            .unwrap();
        assert_eq!(conversation.template.name, "chatml");

        let err = launcher
            .start_conversation(&chat_config(&["--conv-template", "does-not-exist"]))
            .unwrap_err();
        assert!(matches!(err, ConvError::TemplateNotFound(_)));
    }

    #[test]
    fn test_start_conversation_system_message_override() {
        let launcher = Launcher::new();
        let conversation = launcher
            .start_conversation(&chat_config(&[
                "--conv-template",
                "vicuna_v1.1",
                "--conv-system-msg",
                "Answer in one word.",
            ]))
            .unwrap();

        assert_eq!(conversation.system_message, "Answer in one word.");
        // The registered template itself is untouched
        assert_ne!(
            launcher.templates.get("vicuna_v1.1").unwrap().system_message,
            "Answer in one word."
        );
    }

    #[test]
    fn test_unmatched_path_falls_back_to_base() {
        let launcher = Launcher::new();
        let conversation = launcher
            .start_conversation(&chat_config(&["--model-path", "./checkpoints/checkpoint-500"]))
            .unwrap();
        assert_eq!(conversation.template.name, "zero_shot");
    }
}
