use std::path::PathBuf;

use clap::Parser;
use colored::*;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use opsh::core::{ConfigError, OpshError, OpshResult, Platform, Session, TerminalInterface};
use opsh::services::{AiTranslator, ConfigStore, ShellCommandExecutor};
use opsh::ui::setup::run_setup;
use opsh::ui::{LineEditor, Shell};

const LOG_ENV: &str = "OPSH_LOG";

#[derive(Parser)]
#[command(name = "opsh", version)]
#[command(about = "Talk to your terminal in plain English")]
struct Cli {
    /// Translate and run a single request, then exit
    #[arg(short = 'c', long = "command", num_args = 1.., value_name = "TEXT")]
    command: Vec<String>,

    /// Config file to use instead of the per-user default
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Run AI-suggested commands without asking first
    #[arg(short, long)]
    yes: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    install_panic_hook();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> OpshResult<i32> {
    let store = ConfigStore::locate(cli.config)?;
    let mut editor = LineEditor::new(Some(store.history_path()))?;

    let config = match store.load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "configuration unavailable, starting setup");
            match &e {
                ConfigError::Missing(_) => editor.display_output(&format!(
                    "\n{}\nTalk to your terminal in plain English.",
                    "🚀 Welcome to OpSH!".bold()
                )),
                _ => editor.display_error(&e.to_string()),
            }
            run_setup(&mut editor, &store, None)?.ok_or_else(|| {
                OpshError::Config(ConfigError::Invalid(
                    "authentication is required to use OpSH".to_string(),
                ))
            })?
        }
    };

    let platform = Platform::current().profile();
    let cwd = std::env::current_dir()
        .map_err(|e| OpshError::Fatal(format!("cannot read the current directory: {}", e)))?;
    let session = Session::new(cwd, platform);
    let translator = AiTranslator::with_default_config()?;
    let executor = ShellCommandExecutor::new(platform);

    let mut shell = Shell::new(session, config, store, translator, executor, editor)
        .skip_confirmation(cli.yes);

    if !cli.command.is_empty() {
        return shell.run_once(&cli.command.join(" ")).await;
    }

    let result = shell.run().await;
    shell.terminal_mut().save_history();
    result.map(|_| 0)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("opsh=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        error!(%info, "panic");
        eprintln!("{}", format!("fatal: {}", info).red());
    }));
}
