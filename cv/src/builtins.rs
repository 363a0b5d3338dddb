//! Built-in conversation templates
//!
//! Seeded into every registry before the launcher runs. The launcher's
//! config file can re-register any of these names to replace them.

use tracing::debug;

use crate::registry::TemplateRegistry;
use crate::template::{ConvTemplate, SeparatorStyle};

/// Register the built-in templates into `registry`
pub fn register_builtins(registry: &mut TemplateRegistry) {
    debug!("register_builtins: called");

    registry.register(ConvTemplate::new(
        "zero_shot",
        "A chat between a curious human and an artificial intelligence assistant. \
         The assistant gives helpful, detailed, and polite answers to the human's questions.",
        ("Human", "Assistant"),
        SeparatorStyle::AddColonSingle,
        "\n### ",
        None,
    ));

    registry.register(ConvTemplate::new(
        "vicuna_v1.1",
        "A chat between a curious user and an artificial intelligence assistant. \
         The assistant gives helpful, detailed, and polite answers to the user's questions.",
        ("USER", "ASSISTANT"),
        SeparatorStyle::AddColonTwo,
        " ",
        Some("</s>".to_string()),
    ));

    registry.register(ConvTemplate::new(
        "alpaca",
        "Below is an instruction that describes a task. \
         Write a response that appropriately completes the request.",
        ("### Instruction", "### Response"),
        SeparatorStyle::AddColonTwo,
        "\n\n",
        Some("</s>".to_string()),
    ));

    registry.register(ConvTemplate::new(
        "chatml",
        "You are a helpful assistant.",
        ("<|im_start|>user", "<|im_start|>assistant"),
        SeparatorStyle::ChatMl,
        "<|im_end|>",
        None,
    ));

    registry.register(ConvTemplate::new(
        "chatglm",
        "",
        ("问", "答"),
        SeparatorStyle::AddColonSingle,
        "\n\n",
        None,
    ));

    registry.register(ConvTemplate::new(
        "fastchat-t5",
        "",
        ("Human", "Assistant"),
        SeparatorStyle::AddColonSingle,
        "\n",
        None,
    ));
}
