//! Interactive chat shell
//!
//! A plain line-oriented session: read a message, render the prompt with
//! the active conversation template, send it to the completion backend,
//! print the reply. In-session `!!` commands manage the transcript.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use convstore::Conversation;

use crate::config::{ChatConfig, DisplayStyle};
use crate::launch::Launcher;
use crate::session::SessionRunner;
use crate::session::backend::{CompletionBackend, GenerationRequest};

/// In-session commands, prefixed with `!!`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Exit,
    Reset,
    Remove,
    Regen,
    Save(PathBuf),
    Load(PathBuf),
}

/// One line of user input, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput {
    /// A message for the model
    Message(String),
    /// A recognized `!!` command
    Command(ShellCommand),
    /// A `!!` line that is not a valid command
    BadCommand(String),
}

/// Classify one input line
pub fn parse_input(input: &str) -> ParsedInput {
    let input = input.trim();
    if !input.starts_with("!!") {
        return ParsedInput::Message(input.to_string());
    }

    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let argument = parts.next();

    match (command, argument) {
        ("!!exit", None) => ParsedInput::Command(ShellCommand::Exit),
        ("!!reset", None) => ParsedInput::Command(ShellCommand::Reset),
        ("!!remove", None) => ParsedInput::Command(ShellCommand::Remove),
        ("!!regen", None) => ParsedInput::Command(ShellCommand::Regen),
        ("!!save", Some(path)) => ParsedInput::Command(ShellCommand::Save(PathBuf::from(path))),
        ("!!load", Some(path)) => ParsedInput::Command(ShellCommand::Load(PathBuf::from(path))),
        ("!!save", None) | ("!!load", None) => {
            ParsedInput::BadCommand(format!("{} needs a file name", command))
        }
        _ => ParsedInput::BadCommand(format!(
            "Unknown command: {}. Use: !!exit, !!reset, !!remove, !!regen, !!save <file>, !!load <file>",
            command
        )),
    }
}

/// Cut the reply at the stop token, if the server echoed one, and trim
fn clean_reply(text: &str, stop: Option<&str>) -> String {
    let mut text = text;
    if let Some(stop) = stop
        && let Some(idx) = text.find(stop)
    {
        text = &text[..idx];
    }
    text.trim().to_string()
}

/// What the loop does after a command
enum Flow {
    Continue,
    Quit,
}

/// The shipped session runner: a plain readline shell
pub struct ChatShell {
    backend: Arc<dyn CompletionBackend>,
}

impl ChatShell {
    /// Create a shell over a completion backend
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Render the prompt for the trailing placeholder, complete it, and
    /// fill the placeholder with the cleaned reply
    async fn generate_reply(&self, conversation: &mut Conversation, chat: &ChatConfig) -> Result<String> {
        let prompt = conversation.get_prompt();
        if chat.debug {
            println!("{}", format!("[prompt]\n{}", prompt).dimmed());
        }
        debug!(prompt_len = prompt.len(), "generate_reply: sending prompt");

        let request = GenerationRequest {
            model: chat.model_path.clone(),
            prompt,
            temperature: chat.temperature,
            repetition_penalty: chat.repetition_penalty,
            max_new_tokens: chat.max_new_tokens,
            stop: conversation.template.stop_token().map(str::to_string),
        };
        let response = self.backend.generate(&request).await?;

        let text = clean_reply(&response.text, conversation.template.stop_token());
        conversation.fill_last(text.clone());
        Ok(text)
    }

    /// Append one exchange and generate the reply
    async fn process_turn(&self, conversation: &mut Conversation, chat: &ChatConfig, message: &str) -> Result<String> {
        if chat.no_history {
            conversation.reset();
        }
        let user_role = conversation.user_role().to_string();
        let assistant_role = conversation.assistant_role().to_string();
        conversation.append(user_role, message);
        conversation.append_placeholder(assistant_role);
        self.generate_reply(conversation, chat).await
    }

    /// Execute a `!!` command
    async fn handle_command(
        &self,
        command: ShellCommand,
        conversation: &mut Conversation,
        chat: &ChatConfig,
    ) -> Result<Flow> {
        debug!(?command, "handle_command: called");
        match command {
            ShellCommand::Exit => return Ok(Flow::Quit),
            ShellCommand::Reset => {
                conversation.reset();
                println!("{}", "Conversation cleared.".dimmed());
            }
            ShellCommand::Remove => {
                if conversation.pop_exchange() {
                    println!("{}", "Removed the last exchange.".dimmed());
                } else {
                    println!("{}", "Nothing to remove.".dimmed());
                }
            }
            ShellCommand::Regen => {
                let assistant_role = conversation.assistant_role().to_string();
                if conversation.turns.last().map(|t| t.role.clone()) == Some(assistant_role.clone()) {
                    conversation.pop_last();
                    conversation.append_placeholder(assistant_role.clone());
                    match self.generate_reply(conversation, chat).await {
                        Ok(text) => {
                            println!("{} {}", format!("{}:", assistant_role).bright_blue(), text);
                        }
                        Err(e) => {
                            eprintln!("{} {}", "Error:".red(), e);
                            conversation.pop_last();
                        }
                    }
                } else {
                    println!("{}", "Nothing to regenerate.".dimmed());
                }
            }
            ShellCommand::Save(path) => match serde_json::to_string_pretty(conversation) {
                Ok(json) => match std::fs::write(&path, json) {
                    Ok(()) => println!("Saved conversation to {}", path.display()),
                    Err(e) => eprintln!("{} Failed to save {}: {}", "Error:".red(), path.display(), e),
                },
                Err(e) => eprintln!("{} Failed to serialize conversation: {}", "Error:".red(), e),
            },
            ShellCommand::Load(path) => match std::fs::read_to_string(&path) {
                Ok(json) => match serde_json::from_str::<Conversation>(&json) {
                    Ok(loaded) => {
                        *conversation = loaded;
                        println!("Loaded conversation from {}", path.display());
                    }
                    Err(e) => eprintln!("{} Failed to parse {}: {}", "Error:".red(), path.display(), e),
                },
                Err(e) => eprintln!("{} Failed to read {}: {}", "Error:".red(), path.display(), e),
            },
        }
        Ok(Flow::Continue)
    }

    /// The readline loop
    async fn run_interactive(&mut self, conversation: &mut Conversation, chat: &ChatConfig) -> Result<()> {
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        println!();
        println!("{}", "ModelChat interactive session".bright_cyan().bold());
        println!("Template: {}", conversation.template.name);
        println!(
            "Commands: {} (empty line also exits)",
            "!!exit !!reset !!remove !!regen !!save <file> !!load <file>".yellow()
        );
        println!();

        loop {
            let prompt_label = format!("{}: ", conversation.user_role()).bright_green().to_string();
            let readline = rl.readline(&prompt_label);

            match readline {
                Ok(line) => {
                    let mut input = line.trim().to_string();
                    // An empty line ends the session, like !!exit
                    if input.is_empty() {
                        break;
                    }
                    let _ = rl.add_history_entry(&input);

                    if chat.multiline {
                        while input.ends_with('\\') {
                            input.pop();
                            input.push('\n');
                            match rl.readline("... ") {
                                Ok(next) => input.push_str(next.trim_end()),
                                Err(_) => break,
                            }
                        }
                    }

                    match parse_input(&input) {
                        ParsedInput::Command(command) => {
                            match self.handle_command(command, conversation, chat).await? {
                                Flow::Continue => continue,
                                Flow::Quit => break,
                            }
                        }
                        ParsedInput::BadCommand(message) => {
                            println!("{} {}", "?".yellow(), message);
                            continue;
                        }
                        ParsedInput::Message(message) => {
                            match self.process_turn(conversation, chat, &message).await {
                                Ok(text) => {
                                    let label = format!("{}:", conversation.assistant_role());
                                    println!("{} {}", label.bright_blue(), text);
                                }
                                Err(e) => {
                                    // Keep the session alive; drop the half-finished exchange
                                    eprintln!("{} {}", "Error:".red(), e);
                                    conversation.pop_exchange();
                                }
                            }
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Newline-delimited turns on stdin, replies on stdout, no editing
    async fn run_programmatic(&mut self, conversation: &mut Conversation, chat: &ChatConfig) -> Result<()> {
        debug!("run_programmatic: called");
        let stdin = std::io::stdin();
        loop {
            let mut line = String::new();
            let n = stdin
                .lock()
                .read_line(&mut line)
                .map_err(|e| eyre::eyre!("Failed to read stdin: {}", e))?;
            if n == 0 {
                break;
            }
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            let text = self.process_turn(conversation, chat, input).await?;
            println!("{}", text);
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRunner for ChatShell {
    async fn run(&mut self, chat: &ChatConfig, launcher: &Launcher) -> Result<()> {
        let mut conversation = launcher.start_conversation(chat)?;

        if chat.mouse {
            warn!("Mouse support belongs to the rich display; ignoring --mouse");
        }
        match chat.style {
            DisplayStyle::Programmatic => self.run_programmatic(&mut conversation, chat).await,
            DisplayStyle::Rich => {
                warn!("Rich display is not available; falling back to the simple shell");
                self.run_interactive(&mut conversation, chat).await
            }
            DisplayStyle::Simple => self.run_interactive(&mut conversation, chat).await,
        }
    }
}
