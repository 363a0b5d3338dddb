//! Launcher configuration types, loading, and validation
//!
//! Two layers live here: the optional YAML config file (custom template
//! registration, resolver override, serving endpoint) and `ChatConfig`,
//! the structured object handed to the session runner once per process.
//! Validation is type and choice-set checking only; any failure aborts
//! startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use convstore::{ConvTemplate, SeparatorStyle};

use crate::cli::Cli;

/// Bit-widths accepted for GPTQ quantization
const GPTQ_WBITS: [u32; 5] = [2, 3, 4, 8, 16];

/// Bit-widths accepted for AWQ quantization
const AWQ_WBITS: [u32; 2] = [4, 16];

/// Configuration errors; all abort startup with a clear message
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {field}. Use: {allowed}")]
    InvalidChoice {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },

    #[error("Invalid template config: {0}")]
    InvalidTemplate(String),

    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Device the serving process runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
    Mps,
    Xpu,
    Npu,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda => write!(f, "cuda"),
            Self::Mps => write!(f, "mps"),
            Self::Xpu => write!(f, "xpu"),
            Self::Npu => write!(f, "npu"),
        }
    }
}

/// Numeric precision for model weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Float32,
    Float16,
    Bfloat16,
}

impl std::fmt::Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float32 => write!(f, "float32"),
            Self::Float16 => write!(f, "float16"),
            Self::Bfloat16 => write!(f, "bfloat16"),
        }
    }
}

/// Precision mode for the xFasterTransformer framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum XftDtype {
    #[value(name = "fp16")]
    #[serde(rename = "fp16")]
    Fp16,
    #[value(name = "bf16")]
    #[serde(rename = "bf16")]
    Bf16,
    #[value(name = "int8")]
    #[serde(rename = "int8")]
    Int8,
    #[value(name = "bf16_fp16")]
    #[serde(rename = "bf16_fp16")]
    Bf16Fp16,
    #[value(name = "bf16_int8")]
    #[serde(rename = "bf16_int8")]
    Bf16Int8,
}

/// Display style for the interactive session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStyle {
    /// Plain stdin/stdout shell
    Simple,
    /// Accepted for compatibility; degrades to the simple shell
    Rich,
    /// Newline-delimited turns on stdin, for driving from scripts
    Programmatic,
}

impl std::fmt::Display for DisplayStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Rich => write!(f, "rich"),
            Self::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// Launcher config file (`.modelchat.yml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Serving backend connection
    pub serving: ServingConfig,

    /// Zero-or-one template to register at startup
    pub template: Option<TemplateConfig>,

    /// Zero-or-one resolver override to install after registration
    #[serde(rename = "override")]
    pub override_: Option<OverrideConfig>,
}

impl LauncherConfig {
    /// Load configuration with fallback chain
    ///
    /// An explicit path must load; the implicit locations
    /// (`.modelchat.yml`, then the user config dir) are skipped with a
    /// warning when unreadable.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            debug!(?path, "LauncherConfig::load: explicit path");
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".modelchat.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("modelchat").join("modelchat.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        debug!("LauncherConfig::load: no config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }
}

/// Serving backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServingConfig {
    /// Base URL of the completion endpoint
    pub endpoint: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 120_000,
        }
    }
}

/// A custom template declared in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Registry name; re-registering a built-in name replaces it
    pub name: String,

    /// System message (may be empty)
    #[serde(rename = "system-message", default)]
    pub system_message: String,

    /// Exactly two role labels, user first
    pub roles: Vec<String>,

    /// Separator style name
    #[serde(rename = "sep-style")]
    pub sep_style: String,

    /// Primary separator
    #[serde(default)]
    pub sep: String,

    /// Secondary separator
    #[serde(default)]
    pub sep2: Option<String>,
}

impl TemplateConfig {
    /// Validate and build the template value
    pub fn to_template(&self) -> Result<ConvTemplate, ConfigError> {
        debug!(name = %self.name, "TemplateConfig::to_template: called");
        let sep_style: SeparatorStyle = self.sep_style.parse().map_err(|_| ConfigError::InvalidChoice {
            field: "template.sep-style",
            value: self.sep_style.clone(),
            allowed: "add-colon-single, add-colon-two, no-colon-single, chat-ml",
        })?;

        if self.roles.len() != 2 {
            return Err(ConfigError::InvalidTemplate(format!(
                "'{}' must declare exactly two roles, got {}",
                self.name,
                self.roles.len()
            )));
        }

        if sep_style == SeparatorStyle::AddColonTwo && self.sep2.is_none() {
            return Err(ConfigError::InvalidTemplate(format!(
                "'{}' uses add-colon-two, which requires sep2",
                self.name
            )));
        }

        Ok(ConvTemplate::new(
            self.name.clone(),
            self.system_message.clone(),
            (self.roles[0].clone(), self.roles[1].clone()),
            sep_style,
            self.sep.clone(),
            self.sep2.clone(),
        ))
    }
}

/// A resolver override declared in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideConfig {
    /// Adapter kind to rebind
    pub adapter: String,

    /// Template name the adapter resolves to from now on
    pub template: String,
}

/// GPTQ quantization parameters
#[derive(Debug, Clone, Serialize)]
pub struct GptqConfig {
    pub ckpt: Option<String>,
    pub wbits: u32,
    pub groupsize: i32,
    pub act_order: bool,
}

/// AWQ quantization parameters
#[derive(Debug, Clone, Serialize)]
pub struct AwqConfig {
    pub ckpt: Option<String>,
    pub wbits: u32,
    pub groupsize: i32,
}

/// ExLlamaV2 framework settings, present only when enabled
#[derive(Debug, Clone, Serialize)]
pub struct ExllamaConfig {
    pub max_seq_len: u32,
    pub gpu_split: Option<String>,
}

/// xFasterTransformer framework settings, present only when enabled
#[derive(Debug, Clone, Serialize)]
pub struct XftConfig {
    pub max_seq_len: u32,
    pub dtype: Option<XftDtype>,
}

/// The structured configuration object handed to the session runner
///
/// Built once from the CLI, validated here, then read-only. The runner
/// owns the semantics of every field; the launcher only carries them.
#[derive(Debug, Clone, Serialize)]
pub struct ChatConfig {
    pub model_path: String,
    pub revision: String,
    pub device: Device,
    pub gpus: Option<String>,
    pub num_gpus: u32,
    pub max_gpu_memory: Option<String>,
    pub dtype: Option<Dtype>,
    pub load_8bit: bool,
    pub cpu_offloading: bool,
    pub gptq: GptqConfig,
    pub awq: AwqConfig,
    pub exllama: Option<ExllamaConfig>,
    pub xft: Option<XftConfig>,
    pub conv_template: Option<String>,
    pub conv_system_msg: Option<String>,
    pub temperature: f32,
    pub repetition_penalty: f32,
    pub max_new_tokens: u32,
    pub no_history: bool,
    pub style: DisplayStyle,
    pub multiline: bool,
    pub mouse: bool,
    pub judge_sent_end: bool,
    pub debug: bool,
}

impl ChatConfig {
    /// Validate CLI arguments and build the runner config
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        debug!(model_path = %cli.model_path, "ChatConfig::from_cli: called");

        if !GPTQ_WBITS.contains(&cli.gptq_wbits) {
            return Err(ConfigError::InvalidChoice {
                field: "--gptq-wbits",
                value: cli.gptq_wbits.to_string(),
                allowed: "2, 3, 4, 8, or 16",
            });
        }

        if !AWQ_WBITS.contains(&cli.awq_wbits) {
            return Err(ConfigError::InvalidChoice {
                field: "--awq-wbits",
                value: cli.awq_wbits.to_string(),
                allowed: "4 or 16",
            });
        }

        Ok(Self {
            model_path: cli.model_path.clone(),
            revision: cli.revision.clone(),
            device: cli.device,
            gpus: cli.gpus.clone(),
            num_gpus: cli.num_gpus,
            max_gpu_memory: cli.max_gpu_memory.clone(),
            dtype: cli.dtype,
            load_8bit: cli.load_8bit,
            cpu_offloading: cli.cpu_offloading,
            gptq: GptqConfig {
                ckpt: cli.gptq_ckpt.clone(),
                wbits: cli.gptq_wbits,
                groupsize: cli.gptq_groupsize,
                act_order: cli.gptq_act_order,
            },
            awq: AwqConfig {
                ckpt: cli.awq_ckpt.clone(),
                wbits: cli.awq_wbits,
                groupsize: cli.awq_groupsize,
            },
            exllama: cli.enable_exllama.then(|| ExllamaConfig {
                max_seq_len: cli.exllama_max_seq_len,
                gpu_split: cli.exllama_gpu_split.clone(),
            }),
            xft: cli.enable_xft.then(|| XftConfig {
                max_seq_len: cli.xft_max_seq_len,
                dtype: cli.xft_dtype,
            }),
            conv_template: cli.conv_template.clone(),
            conv_system_msg: cli.conv_system_msg.clone(),
            temperature: cli.temperature,
            repetition_penalty: cli.repetition_penalty,
            max_new_tokens: cli.max_new_tokens,
            no_history: cli.no_history,
            style: cli.style,
            multiline: cli.multiline,
            mouse: cli.mouse,
            judge_sent_end: cli.judge_sent_end,
            debug: cli.debug,
        })
    }
}
