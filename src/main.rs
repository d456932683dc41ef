use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use clirpiai::config::{Config, LlmConfig};
use clirpiai::input::{LineEditor, ReaderInput};
use clirpiai::llm::LlmClient;
use clirpiai::output::Renderer;
use clirpiai::repl;
use clirpiai::session::Session;
use std::io::{IsTerminal, Write};
use std::process::ExitCode;
use tracing::error;

#[derive(Parser, Debug)]
#[command(
    name = "clirpiai",
    about = "Chat with an LLM from the terminal",
    override_usage = "clirpiai -i [--model MODEL_NAME]\n       \
                      clirpiai -t [--model MODEL_NAME] TEXT...\n       \
                      clirpiai -s [--model MODEL_NAME]",
    group(
        ArgGroup::new("mode")
            .required(true)
            .args(["interactive", "text", "stdin"])
    )
)]
struct Cli {
    /// Interactive mode
    #[arg(short = 'i')]
    interactive: bool,

    /// Respond to TEXT and exit
    #[arg(short = 't', requires = "message")]
    text: bool,

    /// Read one message from standard input
    #[arg(short = 's')]
    stdin: bool,

    /// Model to use instead of the configured default
    #[arg(long, value_name = "MODEL_NAME")]
    model: Option<String>,

    /// Message for -t; words are joined with spaces
    #[arg(
        value_name = "TEXT",
        conflicts_with_all = ["interactive", "stdin"],
        trailing_var_arg = true
    )]
    message: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Mode {
    Interactive,
    Text,
    Stdin,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.interactive {
            Mode::Interactive
        } else if self.text {
            Mode::Text
        } else {
            Mode::Stdin
        }
    }
}

fn build_llm_client(llm_config: &LlmConfig) -> clirpiai::error::Result<LlmClient> {
    LlmClient::from_config(
        llm_config.provider.clone(),
        llm_config.max_tokens,
        llm_config.api_key_env.clone(),
        llm_config.base_url.clone(),
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("clirpiai=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help is reported through the error path but is not a failure.
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            e.print().ok();
            return code;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = Config::default_path();
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let mut stdout = std::io::stdout().lock();
    dispatch(&cli, &config, &mut stdout).await
}

/// Build the client before touching the terminal so a missing key prints nothing.
async fn dispatch<W: Write>(cli: &Cli, config: &Config, out: &mut W) -> Result<()> {
    let client = build_llm_client(&config.llm)?;
    let model = cli.model.clone().unwrap_or_else(|| config.llm.model.clone());
    let mut session = Session::new(client, model, config.system_prompt());
    let renderer = Renderer::detect(config.chat.color);

    match cli.mode() {
        Mode::Interactive => {
            if std::io::stdin().is_terminal() {
                let mut input = LineEditor::new()?;
                repl::run_interactive(&mut session, &mut input, out, renderer).await?
            } else {
                let mut input = ReaderInput::new(std::io::stdin().lock(), std::io::stdout());
                repl::run_interactive(&mut session, &mut input, out, renderer).await?
            }
        }
        Mode::Text => repl::run_text(&mut session, &cli.message, out, renderer).await?,
        Mode::Stdin => {
            let show_hint = std::io::stdin().is_terminal();
            repl::run_stdin(&mut session, tokio::io::stdin(), out, renderer, show_hint).await?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("clirpiai").chain(args.iter().copied()))
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn interactive_with_model() {
        let cli = parse(&["-i", "--model", "gpt-4o"]).unwrap();
        assert_eq!(cli.mode(), Mode::Interactive);
        assert_eq!(cli.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn text_collects_all_words() {
        let cli = parse(&["-t", "--model", "gpt-4o", "what", "is", "rust?"]).unwrap();
        assert_eq!(cli.mode(), Mode::Text);
        assert_eq!(cli.model.as_deref(), Some("gpt-4o"));
        assert_eq!(cli.message, vec!["what", "is", "rust?"]);
    }

    #[test]
    fn text_words_after_first_may_look_like_flags() {
        let cli = parse(&["-t", "explain", "-i", "flag"]).unwrap();
        assert_eq!(cli.mode(), Mode::Text);
        assert_eq!(cli.message, vec!["explain", "-i", "flag"]);
    }

    #[test]
    fn stdin_mode() {
        let cli = parse(&["-s"]).unwrap();
        assert_eq!(cli.mode(), Mode::Stdin);
        assert!(cli.model.is_none());
    }

    #[test]
    fn text_without_message_is_usage_error() {
        let err = parse(&["-t"]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn mode_is_required() {
        assert!(parse(&[]).unwrap_err().use_stderr());
        assert!(parse(&["--model", "gpt-4o"]).unwrap_err().use_stderr());
    }

    #[test]
    fn modes_conflict() {
        assert!(parse(&["-i", "-s"]).is_err());
    }

    #[test]
    fn message_requires_text_mode() {
        assert!(parse(&["-i", "hello"]).unwrap_err().use_stderr());
        assert!(parse(&["-s", "hello"]).unwrap_err().use_stderr());
        assert!(parse(&["--model", "gpt-4o", "hello"]).is_err());
    }

    #[tokio::test]
    async fn missing_credential_stops_before_any_mode() {
        let mut config = Config::default();
        config.llm.api_key_env = Some("CLIRPIAI_TEST_KEY_THAT_IS_NEVER_SET".into());

        for args in [&["-i"][..], &["-s"], &["-t", "hello"]] {
            let cli = parse(args).unwrap();
            let mut out = Vec::new();

            let err = dispatch(&cli, &config, &mut out).await.unwrap_err();

            assert!(
                matches!(
                    err.downcast_ref::<clirpiai::error::Error>(),
                    Some(clirpiai::error::Error::MissingCredential { .. })
                ),
                "{args:?}: got {err:?}"
            );
            assert!(out.is_empty(), "{args:?} printed {:?}", String::from_utf8_lossy(&out));
        }
    }

    #[test]
    fn help_is_not_a_failure() {
        let err = parse(&["-h"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert!(!err.use_stderr());
    }
}
