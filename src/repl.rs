//! Front-ends that drive a [`Session`]: the interactive loop, a single
//! message from the command line, and a message piped on stdin.

use crate::error::{Error, Result};
use crate::input::LineSource;
use crate::llm::ChatBackend;
use crate::output::Renderer;
use crate::session::{ModelChange, Session};
use std::borrow::Cow;
use std::io::{ErrorKind, Write};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error, warn};

/// A line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Exit,
    Help,
    List,
    /// `model` with the requested id, if one was given.
    Model(Option<&'a str>),
    Chat(&'a str),
    Blank,
}

impl<'a> Command<'a> {
    /// Keywords match the first word case-insensitively. `exit`, `help` and
    /// `list` only count when they stand alone; otherwise the line is chat.
    /// Any first word starting with `model` is a model command, and the
    /// second word is the requested id.
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Self::Blank;
        };
        let arg = words.next();

        match (first.to_ascii_lowercase().as_str(), arg) {
            ("exit", None) => Self::Exit,
            ("help", None) => Self::Help,
            ("list", None) => Self::List,
            (word, name) if word.starts_with("model") => Self::Model(name),
            _ => Self::Chat(line),
        }
    }
}

/// Read commands until `exit` or end of input.
///
/// A line that cannot be decoded is reported and skipped.
pub async fn run_interactive<B, L, W>(
    session: &mut Session<B>,
    input: &mut L,
    out: &mut W,
    renderer: Renderer,
) -> Result<()>
where
    B: ChatBackend,
    L: LineSource,
    W: Write,
{
    renderer.clear_screen(out)?;
    renderer.banner(out, session.model())?;

    let prompt = renderer.prompt_text();
    loop {
        let line = match input.read_line(&prompt) {
            Ok(Some(line)) => line,
            Ok(None) => {
                writeln!(out)?;
                debug!("end of input");
                break;
            }
            Err(Error::Io(e)) if e.kind() == ErrorKind::InvalidData => {
                warn!("skipping unreadable input line: {e}");
                renderer.warning(out, "Input was not valid UTF-8 and was ignored.")?;
                continue;
            }
            Err(e) => return Err(e),
        };

        match Command::parse(&line) {
            Command::Exit => {
                renderer.info(out, "Bye!")?;
                break;
            }
            Command::Help => renderer.help(out)?,
            Command::List => list_models(session, out, renderer).await?,
            Command::Model(None) => {
                renderer.warning(out, "Invalid command. Usage: model MODEL_NAME")?
            }
            Command::Model(Some(name)) => change_model(session, name, out, renderer).await?,
            Command::Chat(text) => submit_and_print(session, text, out, renderer).await?,
            Command::Blank => {}
        }
    }
    Ok(())
}

/// Submit the command-line words as one message.
pub async fn run_text<B, W>(
    session: &mut Session<B>,
    words: &[String],
    out: &mut W,
    renderer: Renderer,
) -> Result<()>
where
    B: ChatBackend,
    W: Write,
{
    let message = words.join(" ");
    submit_and_print(session, &message, out, renderer).await
}

/// Read stdin to the end and submit it as one message, if it is not blank.
pub async fn run_stdin<B, R, W>(
    session: &mut Session<B>,
    mut input: R,
    out: &mut W,
    renderer: Renderer,
    show_hint: bool,
) -> Result<()>
where
    B: ChatBackend,
    R: AsyncRead + Unpin,
    W: Write,
{
    if show_hint {
        renderer.stdin_hint(out)?;
    }
    let mut raw = Vec::new();
    input.read_to_end(&mut raw).await?;
    let buf = String::from_utf8_lossy(&raw);
    if matches!(buf, Cow::Owned(_)) {
        warn!("stdin was not valid UTF-8; invalid bytes were replaced");
    }
    let message = buf.trim();
    if message.is_empty() {
        debug!("no input on stdin");
        return Ok(());
    }
    submit_and_print(session, message, out, renderer).await
}

/// Remote failures are logged, not returned; only output errors propagate.
async fn submit_and_print<B, W>(
    session: &mut Session<B>,
    text: &str,
    out: &mut W,
    renderer: Renderer,
) -> Result<()>
where
    B: ChatBackend,
    W: Write,
{
    match session.submit(text).await {
        Ok(reply) => renderer.reply(out, &reply)?,
        Err(e) => error!(model = %session.model(), "Error getting response: {e}"),
    }
    Ok(())
}

async fn list_models<B, W>(session: &Session<B>, out: &mut W, renderer: Renderer) -> Result<()>
where
    B: ChatBackend,
    W: Write,
{
    match session.list_models().await {
        Ok(ids) => renderer.model_list(out, session.model(), &ids)?,
        Err(e) => error!("Error listing models: {e}"),
    }
    Ok(())
}

async fn change_model<B, W>(
    session: &mut Session<B>,
    name: &str,
    out: &mut W,
    renderer: Renderer,
) -> Result<()>
where
    B: ChatBackend,
    W: Write,
{
    match session.change_model(name).await {
        Ok(ModelChange::Changed) => {
            renderer.info(out, &format!("Model successfully changed to: {name}"))?
        }
        Ok(ModelChange::NotFound) => renderer.warning(
            out,
            &format!(
                "Model not found. Keeping the current model: {}",
                session.model()
            ),
        )?,
        Err(e) => error!("Error checking model catalog: {e}"),
    }
    Ok(())
}
