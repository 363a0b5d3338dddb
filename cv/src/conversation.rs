//! Conversation state and prompt assembly
//!
//! A `Conversation` pairs one template with the turns taken so far and
//! renders the prompt the serving backend completes. A trailing turn with
//! no content renders as the bare role header, which is how the next
//! model reply is requested.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::template::{ConvTemplate, SeparatorStyle};

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Role label, taken from the template's role pair
    pub role: String,
    /// Message text; `None` marks the slot the model fills next
    pub content: Option<String>,
}

/// A live conversation: an owned template copy plus accumulated turns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// The template this conversation renders with
    pub template: ConvTemplate,
    /// Effective system message; starts as the template's and may be
    /// overridden for the session
    pub system_message: String,
    /// Turns in order
    pub turns: Vec<Turn>,
}

impl Conversation {
    /// Start an empty conversation from a template
    pub fn new(template: ConvTemplate) -> Self {
        debug!(template = %template.name, "Conversation::new: called");
        let system_message = template.system_message.clone();
        Self {
            template,
            system_message,
            turns: Vec::new(),
        }
    }

    /// Replace the system message for this session
    pub fn set_system_message(&mut self, message: impl Into<String>) {
        self.system_message = message.into();
        debug!(len = self.system_message.len(), "Conversation::set_system_message: replaced");
    }

    /// The user-side role label
    pub fn user_role(&self) -> &str {
        &self.template.roles.0
    }

    /// The assistant-side role label
    pub fn assistant_role(&self) -> &str {
        &self.template.roles.1
    }

    /// Append a completed turn
    pub fn append(&mut self, role: impl Into<String>, content: impl Into<String>) {
        let role = role.into();
        debug!(%role, "Conversation::append: called");
        self.turns.push(Turn {
            role,
            content: Some(content.into()),
        });
    }

    /// Append an empty turn for the model to fill
    pub fn append_placeholder(&mut self, role: impl Into<String>) {
        let role = role.into();
        debug!(%role, "Conversation::append_placeholder: called");
        self.turns.push(Turn { role, content: None });
    }

    /// Fill the trailing placeholder (or overwrite the last turn's content)
    pub fn fill_last(&mut self, content: impl Into<String>) {
        if let Some(turn) = self.turns.last_mut() {
            turn.content = Some(content.into());
        } else {
            debug!("Conversation::fill_last: no turns to fill");
        }
    }

    /// Remove and return the last turn
    pub fn pop_last(&mut self) -> Option<Turn> {
        let turn = self.turns.pop();
        debug!(popped = turn.is_some(), "Conversation::pop_last: called");
        turn
    }

    /// Remove the last exchange (trailing assistant turn, if any, plus the
    /// user turn before it). Returns whether anything was removed.
    pub fn pop_exchange(&mut self) -> bool {
        debug!(turns = self.turns.len(), "Conversation::pop_exchange: called");
        if self.turns.is_empty() {
            return false;
        }
        if self.turns.last().map(|t| t.role.clone()) == Some(self.assistant_role().to_string()) {
            self.turns.pop();
        }
        self.turns.pop();
        true
    }

    /// Drop all turns, keeping the template and system message
    pub fn reset(&mut self) {
        debug!(turns = self.turns.len(), "Conversation::reset: clearing");
        self.turns.clear();
    }

    /// Render the full prompt for the backend
    pub fn get_prompt(&self) -> String {
        match self.template.sep_style {
            SeparatorStyle::AddColonSingle => self.render_colon_single(),
            SeparatorStyle::AddColonTwo => self.render_colon_two(),
            SeparatorStyle::NoColonSingle => self.render_no_colon(),
            SeparatorStyle::ChatMl => self.render_chatml(),
        }
    }

    fn render_colon_single(&self) -> String {
        let sep = &self.template.sep;
        let mut ret = if self.system_message.is_empty() {
            String::new()
        } else {
            format!("{}{}", self.system_message, sep)
        };
        for turn in &self.turns {
            match &turn.content {
                Some(content) => ret.push_str(&format!("{}: {}{}", turn.role, content, sep)),
                None => ret.push_str(&format!("{}:", turn.role)),
            }
        }
        ret
    }

    fn render_colon_two(&self) -> String {
        // sep after user turns, sep2 after assistant turns
        let seps = [
            self.template.sep.as_str(),
            self.template.sep2.as_deref().unwrap_or_default(),
        ];
        let mut ret = if self.system_message.is_empty() {
            String::new()
        } else {
            format!("{}{}", self.system_message, seps[0])
        };
        for (i, turn) in self.turns.iter().enumerate() {
            match &turn.content {
                Some(content) => ret.push_str(&format!("{}: {}{}", turn.role, content, seps[i % 2])),
                None => ret.push_str(&format!("{}:", turn.role)),
            }
        }
        ret
    }

    fn render_no_colon(&self) -> String {
        let sep = &self.template.sep;
        let mut ret = self.system_message.clone();
        for turn in &self.turns {
            match &turn.content {
                Some(content) => ret.push_str(&format!("{}{}{}", turn.role, content, sep)),
                None => ret.push_str(&turn.role),
            }
        }
        ret
    }

    fn render_chatml(&self) -> String {
        // Role labels carry the <|im_start|> token; the style owns the
        // system block framing
        let sep = &self.template.sep;
        let mut ret = if self.system_message.is_empty() {
            String::new()
        } else {
            format!("<|im_start|>system\n{}{}\n", self.system_message, sep)
        };
        for turn in &self.turns {
            match &turn.content {
                Some(content) => ret.push_str(&format!("{}\n{}{}\n", turn.role, content, sep)),
                None => ret.push_str(&format!("{}\n", turn.role)),
            }
        }
        ret
    }
}
