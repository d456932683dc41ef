//! Terminal rendering for the chat front-ends.
//!
//! Styling is plain ANSI escapes and is dropped entirely when colour is off,
//! so output stays clean when piped.

use std::io::{self, IsTerminal, Write};

const ANSI_RESET: &str = "\x1b[0m";
const ANSI_BRIGHT: &str = "\x1b[1m";
const ANSI_RED: &str = "\x1b[31m";
const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_CYAN: &str = "\x1b[36m";
const ANSI_WHITE: &str = "\x1b[37m";
const ANSI_BG_BLACK: &str = "\x1b[40m";
const ANSI_BG_RED: &str = "\x1b[41m";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub const PROMPT: &str = "Prompt: >>> ";
pub const REPLY_LABEL: &str = "Assistant: >>> ";

pub const HELP_TEXT: &str = "\
Commands:
  list                  List available models
  model MODEL_NAME      Change the current model
  help                  Show this help
  exit                  Exit interactive mode";

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Colour only when the config allows it, `NO_COLOR` is unset and stdout is a tty.
    pub fn detect(config_color: bool) -> Self {
        let color =
            config_color && std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self::new(color)
    }

    fn styled(&self, styles: &[&str], text: &str) -> String {
        if self.color {
            format!("{}{text}{ANSI_RESET}", styles.concat())
        } else {
            text.to_string()
        }
    }

    pub fn clear_screen(&self, out: &mut impl Write) -> io::Result<()> {
        if self.color {
            write!(out, "{CLEAR_SCREEN}")?;
        }
        Ok(())
    }

    pub fn banner(&self, out: &mut impl Write, model: &str) -> io::Result<()> {
        writeln!(
            out,
            "{}",
            self.styled(
                &[ANSI_BRIGHT, ANSI_BG_RED, ANSI_WHITE],
                "Interactive Assistant Mode. Type 'exit' to quit or 'help' for commands."
            )
        )?;
        writeln!(
            out,
            "{}",
            self.styled(&[ANSI_BRIGHT, ANSI_GREEN], &format!("Model in use: {model}"))
        )
    }

    pub fn prompt_text(&self) -> String {
        self.styled(&[ANSI_BRIGHT, ANSI_YELLOW, ANSI_BG_BLACK], PROMPT)
    }

    pub fn reply(&self, out: &mut impl Write, text: &str) -> io::Result<()> {
        writeln!(
            out,
            "{} {text}",
            self.styled(&[ANSI_CYAN, ANSI_BRIGHT, ANSI_BG_BLACK], REPLY_LABEL)
        )
    }

    pub fn info(&self, out: &mut impl Write, msg: &str) -> io::Result<()> {
        writeln!(out, "{msg}")
    }

    pub fn warning(&self, out: &mut impl Write, msg: &str) -> io::Result<()> {
        writeln!(out, "{}", self.styled(&[ANSI_RED], msg))
    }

    pub fn help(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{HELP_TEXT}")
    }

    /// Current model first, then the catalog ids in sorted order.
    pub fn model_list(&self, out: &mut impl Write, current: &str, ids: &[String]) -> io::Result<()> {
        writeln!(out, "Current model: {current}")?;
        let mut sorted: Vec<&String> = ids.iter().collect();
        sorted.sort();
        for id in sorted {
            writeln!(out, "{id}")?;
        }
        Ok(())
    }

    pub fn stdin_hint(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(
            out,
            "Reading input from standard input. Press Ctrl+D (or Ctrl+Z on Windows) to end input."
        )
    }
}
