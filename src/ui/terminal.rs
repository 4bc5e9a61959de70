use std::any::Any;
use std::panic::AssertUnwindSafe;

use chrono::Local;
use colored::*;
use futures::FutureExt;
use tracing::{debug, error};

use crate::core::classifier::{classify, Builtin, Verdict};
use crate::core::config::Config;
use crate::core::lib::{
    AIProcessor, CommandExecutor, ExecOutcome, ExecutionError, Input, OpshError, OpshResult,
    TerminalInterface, TranslationError, TranslationRequest,
};
use crate::core::session::{prompt_label, Session, Source};
use crate::services::config::ConfigStore;
use crate::ui::setup::run_setup;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str = "─────────────────────────────────────────";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// The interactive session loop.
pub struct Shell<P, X, T> {
    session: Session,
    config: Config,
    store: ConfigStore,
    translator: P,
    executor: X,
    terminal: T,
    skip_confirm: bool,
}

impl<P, X, T> Shell<P, X, T>
where
    P: AIProcessor,
    X: CommandExecutor,
    T: TerminalInterface,
{
    pub fn new(
        session: Session,
        config: Config,
        store: ConfigStore,
        translator: P,
        executor: X,
        terminal: T,
    ) -> Self {
        Self {
            session,
            config,
            store,
            translator,
            executor,
            terminal,
            skip_confirm: false,
        }
    }

    /// Runs AI suggestions without asking, regardless of the config.
    pub fn skip_confirmation(mut self, skip: bool) -> Self {
        self.skip_confirm = skip;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    /// Reads and handles lines until an exit word, an interrupt at the
    /// prompt, end of input, or a fatal error. Always prints the summary.
    pub async fn run(&mut self) -> OpshResult<()> {
        self.terminal.display_output(&format!(
            "{} ready! Type naturally or use !help\n",
            "OpSH".bold()
        ));
        let result = match AssertUnwindSafe(self.run_loop()).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(OpshError::Fatal(panic_message(payload.as_ref()))),
        };
        if let Err(e) = &result {
            error!(error = %e, "session aborted");
        }
        self.goodbye();
        result
    }

    async fn run_loop(&mut self) -> OpshResult<()> {
        loop {
            let prompt = prompt_label(self.session.cwd());
            let line = match self.terminal.read_line(&prompt)? {
                Input::Line(line) => line,
                Input::Interrupted | Input::Eof => return Ok(()),
            };

            match self.handle_line(&line).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => return Ok(()),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => self.report(&e.to_string()),
            }
        }
    }

    /// Classifies one line and routes it.
    pub async fn handle_line(&mut self, line: &str) -> OpshResult<Flow> {
        let verdict = classify(line, self.session.platform());
        if verdict != Verdict::Empty {
            self.terminal.add_history(line.trim());
        }

        match verdict {
            Verdict::Empty => Ok(Flow::Continue),
            Verdict::Direct(command) => {
                self.run_command(&command, &command, Source::Direct).await?;
                Ok(Flow::Continue)
            }
            Verdict::Builtin(builtin) => self.run_builtin(builtin).await,
            Verdict::Natural(text) => {
                let Some(command) = self.translate_and_confirm(&text).await? else {
                    return Ok(Flow::Continue);
                };
                self.run_command(&text, &command, Source::Ai).await?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Single-shot mode: translate `text`, run it and return its exit code.
    pub async fn run_once(&mut self, text: &str) -> OpshResult<i32> {
        let Some(command) = self.translate_and_confirm(text).await? else {
            return Ok(1);
        };
        let outcome = self.execute(text, &command, Source::Ai).await?;
        Ok(outcome.exit_code)
    }

    async fn run_builtin(&mut self, builtin: Builtin) -> OpshResult<Flow> {
        debug!(key = builtin.key(), "built-in");
        match builtin {
            Builtin::Exit => return Ok(Flow::Exit),
            Builtin::Help => self.terminal.display_output(&help_text()),
            Builtin::Credits => self.terminal.display_output(&credits_text()),
            Builtin::Version => {
                let text = self.version_text();
                self.terminal.display_output(&text);
            }
            Builtin::History => {
                let text = self.history_text();
                self.terminal.display_output(&text);
            }
            Builtin::Auth => match run_setup(&mut self.terminal, &self.store, Some(&self.config))? {
                Some(config) => {
                    self.config = config;
                    self.terminal
                        .display_output(&"✓ Authentication updated!\n".green().to_string());
                }
                None => self.terminal.display_output("Authentication unchanged."),
            },
            Builtin::Passthrough(command) => {
                self.run_command(&command, &command, Source::Direct).await?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Asks the AI for a command and, when enabled, for the user's go-ahead.
    async fn translate_and_confirm(&mut self, text: &str) -> OpshResult<Option<String>> {
        let platform = self.session.platform();
        let (cwd, history) = self.session.context();
        let request = TranslationRequest {
            text,
            platform,
            cwd,
            history,
        };

        let translated = tokio::select! {
            result = self.translator.translate(&self.config, &request) => result,
            _ = tokio::signal::ctrl_c() => Err(TranslationError::Cancelled),
        };
        let command = translated?;
        self.session.count_ai_call();

        if self.skip_confirm || !self.config.confirm {
            self.terminal
                .display_output(&format!("→ {}", command).yellow().to_string());
            return Ok(Some(command));
        }

        match self.terminal.read_line(&format!("→ {} [Enter to run] ", command))? {
            Input::Line(answer) if answer.trim().is_empty() => Ok(Some(command)),
            _ => {
                self.terminal.display_output("Cancelled.");
                Ok(None)
            }
        }
    }

    /// Executes and records. Commands that fail to start are not recorded.
    async fn execute(&mut self, input: &str, command: &str, source: Source) -> OpshResult<ExecOutcome> {
        let outcome = self.executor.execute(command, self.session.cwd()).await?;
        self.session.set_cwd(outcome.cwd_after.clone());
        self.session.record(input, command, source);
        Ok(outcome)
    }

    async fn run_command(&mut self, input: &str, command: &str, source: Source) -> OpshResult<()> {
        let outcome = self.execute(input, command, source).await?;
        if !outcome.success() {
            return Err(ExecutionError::ExitStatus(outcome.exit_code).into());
        }
        Ok(())
    }

    fn report(&mut self, message: &str) {
        let line = message.lines().map(str::trim).collect::<Vec<_>>().join(" ");
        self.terminal.display_error(&line);
    }

    fn version_text(&self) -> String {
        let platform = self.session.platform();
        format!(
            "\n{} v{}\nPlatform: {} ({}) [{}]\nProvider: {} ({})\nConfig: {}\n",
            "OpSH".bold(),
            VERSION,
            platform.os_name,
            platform.shell_name,
            platform.tag,
            self.config.provider,
            self.config.model(),
            self.store.path().display()
        )
    }

    fn history_text(&self) -> String {
        let history = self.session.history();
        if history.is_empty() {
            return "No commands yet.".to_string();
        }
        history
            .iter()
            .enumerate()
            .map(|(i, record)| {
                format!(
                    "{:>3}. [{}] {}  {}",
                    i + 1,
                    record.source,
                    record.timestamp.with_timezone(&Local).format("%H:%M:%S"),
                    record.command
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn goodbye(&mut self) {
        let summary = self.session.summary();
        self.terminal.display_output(&format!(
            "\n{}\n{}\n{}\n{}\n",
            RULE.cyan(),
            summary,
            "Goodbye! Thanks for using OpSH".cyan(),
            RULE.cyan()
        ));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panic: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panic: {}", msg)
    } else {
        "panic".to_string()
    }
}

pub fn help_text() -> String {
    let mut lines: Vec<String> = Builtin::NAMED
        .iter()
        .map(|(name, about)| format!("{} - {}", format!("{:<12}", format!("!{}", name)).cyan(), about))
        .collect();
    lines.push(format!("{} - Run command directly (bypass AI)", format!("{:<12}", "!<cmd>").cyan()));
    lines.push(format!("{} - Exit OpSH (also quit, bye)", format!("{:<12}", "exit").cyan()));
    lines.push(format!("{} - Stop a running command, or exit at the prompt", format!("{:<12}", "Ctrl+C").cyan()));
    lines.join("\n") + "\n"
}

pub fn credits_text() -> String {
    format!(
        "\n{}\n{} v{} - Open Natural Language Shell\nBased on {} by Junaid Mahmood\nhttps://github.com/junaid-mahmood/nlsh\n\n☕ Support: {}\n{}\n",
        RULE.cyan(),
        "OpSH".bold(),
        VERSION,
        "nlsh".cyan(),
        "https://ko-fi.com/ai_dev_2024".yellow(),
        RULE.cyan()
    )
}
