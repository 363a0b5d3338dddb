//! Conversation template value types

use serde::{Deserialize, Serialize};
use tracing::debug;

/// How turns are joined when a conversation is rendered to a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeparatorStyle {
    /// `role: message` pairs joined with a single separator
    AddColonSingle,
    /// `role: message` pairs with alternating separators (`sep` after the
    /// first role of each exchange, `sep2` after the second)
    AddColonTwo,
    /// `rolemessage` with no colon, joined with a single separator
    NoColonSingle,
    /// ChatML-style blocks; role labels carry the `<|im_start|>` token and
    /// `sep` is the end-of-block token
    ChatMl,
}

impl SeparatorStyle {
    /// Get the config-file spelling of this style
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddColonSingle => "add-colon-single",
            Self::AddColonTwo => "add-colon-two",
            Self::NoColonSingle => "no-colon-single",
            Self::ChatMl => "chat-ml",
        }
    }
}

impl std::fmt::Display for SeparatorStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for SeparatorStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "SeparatorStyle::from_str: called");
        match s {
            "add-colon-single" => Ok(Self::AddColonSingle),
            "add-colon-two" => Ok(Self::AddColonTwo),
            "no-colon-single" => Ok(Self::NoColonSingle),
            "chat-ml" => Ok(Self::ChatMl),
            _ => Err(format!(
                "Unknown separator style: '{}'. Use: add-colon-single, add-colon-two, no-colon-single, or chat-ml",
                s
            )),
        }
    }
}

/// One named conversation prompt format
///
/// Templates are immutable value objects: constructed once at startup
/// (built-ins or launcher config), then only read. The registry owns the
/// name -> template mapping; a `Conversation` takes its own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvTemplate {
    /// Unique name within the registry
    pub name: String,
    /// System message prepended to the prompt (may be empty)
    #[serde(default)]
    pub system_message: String,
    /// Role labels, user first
    pub roles: (String, String),
    /// Turn-joining style
    pub sep_style: SeparatorStyle,
    /// Primary separator
    pub sep: String,
    /// Secondary separator, required by `AddColonTwo`
    #[serde(default)]
    pub sep2: Option<String>,
}

impl ConvTemplate {
    /// Create a new template
    pub fn new(
        name: impl Into<String>,
        system_message: impl Into<String>,
        roles: (impl Into<String>, impl Into<String>),
        sep_style: SeparatorStyle,
        sep: impl Into<String>,
        sep2: Option<String>,
    ) -> Self {
        let name = name.into();
        debug!(%name, ?sep_style, "ConvTemplate::new: called");
        Self {
            name,
            system_message: system_message.into(),
            roles: (roles.0.into(), roles.1.into()),
            sep_style,
            sep: sep.into(),
            sep2,
        }
    }

    /// The string the backend should stop generating at, if the style
    /// defines one
    pub fn stop_token(&self) -> Option<&str> {
        match self.sep_style {
            SeparatorStyle::AddColonTwo => self.sep2.as_deref(),
            SeparatorStyle::ChatMl => Some(self.sep.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vicuna() -> ConvTemplate {
        ConvTemplate::new(
            "vicuna_v1.1",
            "A chat between a user and an assistant.",
            ("USER", "ASSISTANT"),
            SeparatorStyle::AddColonTwo,
            " ",
            Some("</s>".to_string()),
        )
    }

    #[test]
    fn test_template_equality_is_by_value() {
        assert_eq!(vicuna(), vicuna());

        let mut other = vicuna();
        other.sep = "\n".to_string();
        assert_ne!(vicuna(), other);
    }

    #[test]
    fn test_sep_style_round_trip() {
        for style in [
            SeparatorStyle::AddColonSingle,
            SeparatorStyle::AddColonTwo,
            SeparatorStyle::NoColonSingle,
            SeparatorStyle::ChatMl,
        ] {
            let parsed: SeparatorStyle = style.name().parse().unwrap();
            assert_eq!(parsed, style);
        }
        assert!("colon-ish".parse::<SeparatorStyle>().is_err());
    }

    #[test]
    fn test_sep_style_serde_spelling() {
        let json = serde_json::to_string(&SeparatorStyle::AddColonTwo).unwrap();
        assert_eq!(json, "\"add-colon-two\"");
    }

    #[test]
    fn test_stop_token_per_style() {
        assert_eq!(vicuna().stop_token(), Some("</s>"));

        let chatml = ConvTemplate::new(
            "chatml",
            "",
            ("<|im_start|>user", "<|im_start|>assistant"),
            SeparatorStyle::ChatMl,
            "<|im_end|>",
            None,
        );
        assert_eq!(chatml.stop_token(), Some("<|im_end|>"));

        let single = ConvTemplate::new("s", "", ("Human", "Assistant"), SeparatorStyle::AddColonSingle, "\n", None);
        assert_eq!(single.stop_token(), None);
    }
}
