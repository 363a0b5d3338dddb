//! Integration tests for the launcher startup contract
//!
//! These tests cover the order the launcher must preserve: template
//! registration before override installation, both before the first
//! resolution call, with late-bound lookups against live registry state.

use clap::Parser;
use std::io::Write;

use convstore::{AdapterKind, ConvError, ConvTemplate, SeparatorStyle};
use modelchat::cli::Cli;
use modelchat::config::{ChatConfig, ConfigError, LauncherConfig};
use modelchat::launch::Launcher;

const FINE_TUNE_YAML: &str = r#"
serving:
  endpoint: http://127.0.0.1:8000
  timeout-ms: 60000

template:
  name: vicuna_v1.2
  system-message: "You are a test engineer generating API request parameters."
  roles: [human, gpt]
  sep-style: add-colon-two
  sep: " "
  sep2: "</s>"

override:
  adapter: vicuna
  template: vicuna_v1.2
"#;

fn chat_config(args: &[&str]) -> ChatConfig {
    let mut full = vec!["mc"];
    full.extend_from_slice(args);
    ChatConfig::from_cli(&Cli::parse_from(full)).unwrap()
}

fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("modelchat.yml");
    let mut file = std::fs::File::create(&path).expect("Failed to create config file");
    file.write_all(content.as_bytes()).expect("Failed to write config");
    (dir, path)
}

// =============================================================================
// Config file loading
// =============================================================================

#[test]
fn test_explicit_config_path_must_load() {
    let missing = std::path::PathBuf::from("/nonexistent/modelchat.yml");
    let err = LauncherConfig::load(Some(&missing)).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_malformed_config_file_is_a_parse_error() {
    let (_dir, path) = write_config("template: [not, a, mapping]");
    let err = LauncherConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_config_file_round_trip() {
    let (_dir, path) = write_config(FINE_TUNE_YAML);
    let config = LauncherConfig::load(Some(&path)).unwrap();

    assert_eq!(config.serving.timeout_ms, 60000);
    assert_eq!(config.template.as_ref().unwrap().name, "vicuna_v1.2");
    assert_eq!(config.override_.as_ref().unwrap().adapter, "vicuna");
}

// =============================================================================
// Startup ordering and resolution
// =============================================================================

#[test]
fn test_fine_tune_startup_end_to_end() {
    let (_dir, path) = write_config(FINE_TUNE_YAML);
    let config = LauncherConfig::load(Some(&path)).unwrap();

    let mut launcher = Launcher::new();
    launcher.apply(&config).unwrap();

    // The rebound resolver ignores the model path entirely
    let resolved = launcher
        .adapters
        .resolve_default_template(AdapterKind::Vicuna, "some/other/model", &launcher.templates)
        .unwrap();
    assert_eq!(resolved.name, "vicuna_v1.2");
    assert_eq!(resolved.roles, ("human".to_string(), "gpt".to_string()));
    assert_eq!(resolved.sep_style, SeparatorStyle::AddColonTwo);

    // And the session the runner starts uses it
    let conversation = launcher
        .start_conversation(&chat_config(&["--model-path", "ronniewy/vicuna_api_parameters"]))
        .unwrap();
    assert_eq!(conversation.template.name, "vicuna_v1.2");
    assert!(conversation.system_message.starts_with("You are a test engineer"));
}

#[test]
fn test_reregistration_changes_future_resolutions() {
    let (_dir, path) = write_config(FINE_TUNE_YAML);
    let config = LauncherConfig::load(Some(&path)).unwrap();

    let mut launcher = Launcher::new();
    launcher.apply(&config).unwrap();

    // Replace the template under the overridden name after installation
    launcher.templates.register(ConvTemplate::new(
        "vicuna_v1.2",
        "Replaced after install.",
        ("human", "gpt"),
        SeparatorStyle::AddColonTwo,
        " ",
        Some("</s>".to_string()),
    ));

    let resolved = launcher
        .adapters
        .resolve_default_template(AdapterKind::Vicuna, "lmsys/vicuna-7b-v1.5", &launcher.templates)
        .unwrap();
    assert_eq!(resolved.system_message, "Replaced after install.");
}

#[test]
fn test_override_without_its_template_fails_on_first_resolution() {
    let (_dir, path) = write_config(
        r#"
override:
  adapter: vicuna
  template: never-registered
"#,
    );
    let config = LauncherConfig::load(Some(&path)).unwrap();

    let mut launcher = Launcher::new();
    // Installation succeeds; the name is looked up late
    launcher.apply(&config).unwrap();

    let err = launcher
        .start_conversation(&chat_config(&["--model-path", "lmsys/vicuna-7b-v1.5"]))
        .unwrap_err();
    assert!(matches!(err, ConvError::TemplateNotFound(ref name) if name == "never-registered"));

    // Other adapters are untouched
    let conversation = launcher
        .start_conversation(&chat_config(&["--model-path", "Qwen/Qwen-7B-Chat"]))
        .unwrap();
    assert_eq!(conversation.template.name, "chatml");
}

#[test]
fn test_conv_template_flag_bypasses_adapter_resolution() {
    let (_dir, path) = write_config(FINE_TUNE_YAML);
    let config = LauncherConfig::load(Some(&path)).unwrap();

    let mut launcher = Launcher::new();
    launcher.apply(&config).unwrap();

    // Explicit template name wins over the overridden resolver
    let conversation = launcher
        .start_conversation(&chat_config(&[
            "--model-path",
            "lmsys/vicuna-7b-v1.5",
            "--conv-template",
            "alpaca",
        ]))
        .unwrap();
    assert_eq!(conversation.template.name, "alpaca");
}
