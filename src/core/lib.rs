use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::config::{Config, Provider};
use crate::core::platform::PlatformProfile;
use crate::core::session::CommandRecord;

/// Turns a natural-language request into a single command line.
#[async_trait::async_trait]
pub trait AIProcessor {
    async fn translate<'a>(
        &'a self,
        config: &'a Config,
        request: &'a TranslationRequest<'a>,
    ) -> Result<String, TranslationError>;
}

/// Runs a resolved command line on behalf of the session.
#[async_trait::async_trait]
pub trait CommandExecutor {
    async fn execute<'a>(&'a self, command: &'a str, cwd: &'a Path) -> Result<ExecOutcome, ExecutionError>;
}

pub trait TerminalInterface {
    fn read_line(&mut self, prompt: &str) -> OpshResult<Input>;
    fn add_history(&mut self, line: &str);
    fn display_output(&mut self, output: &str);
    fn display_error(&mut self, error: &str);
}

/// One read from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    Interrupted,
    Eof,
}

/// Everything the translator is allowed to see about the session.
#[derive(Debug, Clone, Copy)]
pub struct TranslationRequest<'a> {
    pub text: &'a str,
    pub platform: &'static PlatformProfile,
    pub cwd: &'a Path,
    pub history: &'a [CommandRecord],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    pub exit_code: i32,
    pub cwd_after: PathBuf,
}

impl ExecOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no configuration found at {}", .0.display())]
    Missing(PathBuf),
    #[error("configuration at {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("could not determine a per-user configuration directory")]
    NoConfigDir,
    #[error("configuration I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("the AI response did not contain a command")]
    Empty,
}

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("AI request timed out")]
    Timeout,
    #[error("could not reach the AI service: {0}")]
    Network(String),
    #[error("rate limit hit - wait a moment and try again")]
    RateLimited,
    #[error("{0} rejected the API key - run !auth to update your credentials")]
    Unauthorized(Provider),
    #[error("{provider} returned HTTP {status}: {body}")]
    Http {
        provider: Provider,
        status: u16,
        body: String,
    },
    #[error("malformed AI response: {0}")]
    Malformed(String),
    #[error(transparent)]
    Extraction(#[from] ParseError),
    #[error("translation cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("command exited with status {0}")]
    ExitStatus(i32),
    #[error("{verb}: {target}: {reason}")]
    ChangeDirectory {
        verb: String,
        target: String,
        reason: String,
    },
    #[error("command interrupted")]
    Interrupted,
    #[error("empty command")]
    Empty,
}

#[derive(Error, Debug)]
pub enum OpshError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Translation(#[from] TranslationError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("fatal: {0}")]
    Fatal(String),
}

impl OpshError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, OpshError::Fatal(_))
    }
}

pub type OpshResult<T> = Result<T, OpshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_points_at_auth_builtin() {
        let err = TranslationError::Unauthorized(Provider::Groq);
        assert_eq!(
            err.to_string(),
            "groq rejected the API key - run !auth to update your credentials"
        );
    }

    #[test]
    fn only_fatal_is_fatal() {
        assert!(OpshError::Fatal("boom".into()).is_fatal());
        assert!(!OpshError::from(ExecutionError::ExitStatus(2)).is_fatal());
        assert!(!OpshError::from(TranslationError::Timeout).is_fatal());
    }
}
