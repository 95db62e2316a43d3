//! Turn-based terminal chat.
//!
//! Each plain line is a question; the answer is printed and both are
//! appended to the session history. Slash commands act on the previous
//! exchange or the session:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `/vague` | Feedback `"too vague"` on the previous answer |
//! | `/unhelpful` | Feedback `"not helpful"` on the previous answer |
//! | `/feedback <label>` | Feedback with an arbitrary label |
//! | `/history` | Reprint the conversation |
//! | `/help` | List commands |
//! | `/quit`, `/exit` | End the session (so does EOF) |

use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::agent::SupportBot;
use crate::config::Config;
use crate::feedback::Feedback;
use crate::models::{Role, Turn};

const BANNER: &str = "Customer Support Bot. Ask anything about our policies or services.";

const HELP: &str = "commands: /vague, /unhelpful, /feedback <label>, /history, /help, /quit";

/// Conversation state owned by the chat UI. Append-only.
#[derive(Debug, Default)]
pub struct ChatSession {
    history: Vec<Turn>,
    last_question: Option<String>,
    last_answer: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    fn record_answer(&mut self, question: &str, answer: &str) {
        self.history.push(Turn::user(question));
        self.history.push(Turn::assistant(answer));
        self.last_question = Some(question.to_string());
        self.last_answer = Some(answer.to_string());
    }

    fn record_feedback(&mut self, feedback: &Feedback, answer: &str) {
        self.history
            .push(Turn::user(format!("[feedback: {}]", feedback.label())));
        self.history.push(Turn::assistant(answer));
        self.last_answer = Some(answer.to_string());
    }

    /// Write the history as pretty JSON.
    pub fn write_transcript(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.history)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write transcript: {}", path.display()))
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    Empty,
    Ask(String),
    Feedback(Feedback),
    History,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if !line.starts_with('/') {
        return Command::Ask(line.to_string());
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    match name {
        "/quit" | "/exit" => Command::Quit,
        "/history" => Command::History,
        "/help" => Command::Help,
        "/vague" => Command::Feedback(Feedback::TooVague),
        "/unhelpful" => Command::Feedback(Feedback::NotHelpful),
        "/feedback" if !rest.is_empty() => Command::Feedback(Feedback::parse(rest)),
        "/feedback" => Command::Help,
        other => Command::Unknown(other.to_string()),
    }
}

fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "bot",
    }
}

/// Drive a chat session over `input`/`output` until `/quit` or EOF.
///
/// A failing question is reported on `output` and the session continues.
/// With `interactive`, a `you> ` prompt is written before each read.
pub async fn run_chat<R, W>(
    bot: &SupportBot,
    session: &mut ChatSession,
    input: R,
    mut output: W,
    interactive: bool,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output
        .write_all(format!("{}\n{}\n", BANNER, HELP).as_bytes())
        .await?;

    let mut lines = input.lines();
    loop {
        if interactive {
            output.write_all(b"you> ").await?;
            output.flush().await?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let reply = match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Help => HELP.to_string(),
            Command::Unknown(name) => format!("unknown command {}. {}", name, HELP),
            Command::History => {
                let mut out = String::new();
                for turn in session.history() {
                    out.push_str(&format!("{}> {}\n", speaker(turn.role), turn.content));
                }
                output.write_all(out.as_bytes()).await?;
                continue;
            }
            Command::Ask(question) => match bot.answer(&question).await {
                Ok(answer) => {
                    session.record_answer(&question, &answer);
                    format!("bot> {}", answer)
                }
                Err(e) => {
                    tracing::error!(error = %e, "answering failed");
                    format!("error: {:#}", e)
                }
            },
            Command::Feedback(feedback) => {
                match (session.last_question.clone(), session.last_answer.clone()) {
                    (Some(question), Some(answer)) => {
                        match bot.adjust(&question, &answer, &feedback).await {
                            Ok(adjusted) => {
                                session.record_feedback(&feedback, &adjusted);
                                format!("bot> {}", adjusted)
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "adjusting failed");
                                format!("error: {:#}", e)
                            }
                        }
                    }
                    _ => "nothing to give feedback on yet; ask a question first".to_string(),
                }
            }
        };

        output.write_all(format!("{}\n", reply).as_bytes()).await?;
        output.flush().await?;
    }

    output.flush().await?;
    Ok(())
}

/// CLI entry point for `support-bot chat`.
pub async fn run_chat_cli(config: &Config, transcript: Option<&Path>) -> Result<()> {
    let bot = SupportBot::initialize(config).await?;
    let mut session = ChatSession::new();

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    let interactive = atty::is(atty::Stream::Stdin);

    run_chat(&bot, &mut session, stdin, stdout, interactive).await?;

    if let Some(path) = transcript {
        session.write_transcript(path)?;
        tracing::info!(path = %path.display(), turns = session.history().len(), "transcript written");
    }

    Ok(())
}
