//! CLI argument definitions
//!
//! Mirrors the flag surface of the serving session: model selection,
//! device and quantization plumbing, acceleration-framework toggles, and
//! the interactive-session options. The launcher validates choice sets
//! and hands everything to the runner as one `ChatConfig`.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Device, DisplayStyle, Dtype, XftDtype};

/// ModelChat - chat with a served model from the command line
#[derive(Debug, Parser)]
#[command(
    name = "mc",
    about = "Chat with a conversational model served on a local endpoint",
    version
)]
pub struct Cli {
    /// Path to the model weights: a local folder or a Hugging Face repo ID
    #[arg(long, default_value = "lmsys/vicuna-7b-v1.5")]
    pub model_path: String,

    /// Hugging Face Hub model revision identifier
    #[arg(long, default_value = "main")]
    pub revision: String,

    /// The device type
    #[arg(long, value_enum, default_value = "cuda")]
    pub device: Device,

    /// A single GPU like 1 or multiple GPUs like 0,2
    #[arg(long)]
    pub gpus: Option<String>,

    /// Number of GPUs to use
    #[arg(long, default_value_t = 1)]
    pub num_gpus: u32,

    /// Maximum memory per GPU for storing model weights, e.g. '13Gib'
    #[arg(long)]
    pub max_gpu_memory: Option<String>,

    /// Override the default dtype; unset picks float16 on GPU and float32 on CPU
    #[arg(long, value_enum)]
    pub dtype: Option<Dtype>,

    /// Use 8-bit quantization
    #[arg(long)]
    pub load_8bit: bool,

    /// Only with 8-bit quantization: offload weights that don't fit on the GPU to the CPU
    #[arg(long)]
    pub cpu_offloading: bool,

    /// Used for GPTQ: path to the local GPTQ checkpoint
    #[arg(long)]
    pub gptq_ckpt: Option<String>,

    /// Used for GPTQ: bits to use for quantization (2, 3, 4, 8, or 16)
    #[arg(long, default_value_t = 16)]
    pub gptq_wbits: u32,

    /// Used for GPTQ: groupsize to use for quantization; -1 uses full row
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub gptq_groupsize: i32,

    /// Used for GPTQ: apply the activation order heuristic
    #[arg(long)]
    pub gptq_act_order: bool,

    /// Used for AWQ: path to the local AWQ checkpoint
    #[arg(long)]
    pub awq_ckpt: Option<String>,

    /// Used for AWQ: bits to use for quantization (4 or 16)
    #[arg(long, default_value_t = 16)]
    pub awq_wbits: u32,

    /// Used for AWQ: groupsize to use for quantization; -1 uses full row
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub awq_groupsize: i32,

    /// Enable the ExLlamaV2 inference framework
    #[arg(long)]
    pub enable_exllama: bool,

    /// Max sequence length for the ExLlamaV2 framework
    #[arg(long, default_value_t = 4096)]
    pub exllama_max_seq_len: u32,

    /// Comma-separated VRAM (in GB) to use per GPU, e.g. 20,7,7
    #[arg(long)]
    pub exllama_gpu_split: Option<String>,

    /// Enable the xFasterTransformer inference framework
    #[arg(long)]
    pub enable_xft: bool,

    /// Max sequence length for the xFasterTransformer framework
    #[arg(long, default_value_t = 4096)]
    pub xft_max_seq_len: u32,

    /// Precision mode for xFasterTransformer
    #[arg(long, value_enum)]
    pub xft_dtype: Option<XftDtype>,

    /// Conversation template name; bypasses adapter resolution entirely
    #[arg(long)]
    pub conv_template: Option<String>,

    /// Conversation system message override
    #[arg(long)]
    pub conv_system_msg: Option<String>,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    /// Repetition penalty
    #[arg(long, default_value_t = 1.0)]
    pub repetition_penalty: f32,

    /// Maximum new tokens per reply
    #[arg(long, default_value_t = 512)]
    pub max_new_tokens: u32,

    /// Start every exchange from an empty history
    #[arg(long)]
    pub no_history: bool,

    /// Display style
    #[arg(long, value_enum, default_value = "simple")]
    pub style: DisplayStyle,

    /// Enable multiline input; end a line with '\' to continue it
    #[arg(long)]
    pub multiline: bool,

    /// [Rich style] Enable mouse support for cursor positioning
    #[arg(long)]
    pub mouse: bool,

    /// Enable the correction logic that interrupts sentences cut off at EOS
    #[arg(long)]
    pub judge_sent_end: bool,

    /// Print useful debug information (e.g., prompts)
    #[arg(long)]
    pub debug: bool,

    /// Path to the launcher config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
