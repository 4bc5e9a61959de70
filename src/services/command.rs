use std::env;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};
use which::which;

use crate::core::lib::{CommandExecutor, ExecOutcome, ExecutionError};
use crate::core::platform::PlatformProfile;

/// Shell operators that make a `cd` line something the host shell must run.
const SHELL_OPERATORS: &[&str] = &["&&", "||", ";", "|"];

#[derive(Debug, Clone)]
pub struct ShellCommandExecutor {
    profile: &'static PlatformProfile,
    shell_path: PathBuf,
    shell_args: Vec<String>,
}

impl ShellCommandExecutor {
    pub fn new(profile: &'static PlatformProfile) -> Self {
        Self {
            profile,
            shell_path: resolve_shell(profile),
            shell_args: profile.shell_args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Uses an explicit shell program instead of the platform default.
    pub fn with_shell(mut self, shell_path: impl Into<PathBuf>, args: &[&str]) -> Self {
        self.shell_path = shell_path.into();
        self.shell_args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Returns the directory-change target when `command` is a plain `cd`.
    fn directory_change<'c>(&self, command: &'c str) -> Option<(&'c str, &'c str)> {
        let (verb, args) = self.profile.split_cd(command)?;
        if SHELL_OPERATORS.iter().any(|op| args.contains(op)) {
            return None;
        }
        Some((verb, args))
    }

    fn handle_cd(&self, verb: &str, args: &str, cwd: &Path) -> Result<ExecOutcome, ExecutionError> {
        let fail = |target: &str, reason: String| ExecutionError::ChangeDirectory {
            verb: verb.to_string(),
            target: target.to_string(),
            reason,
        };

        let target = cd_target(args);
        if target == "-" {
            return Err(fail(target, "previous directory is not tracked; give a path".to_string()));
        }
        let path = if target.is_empty() || target == "~" {
            dirs::home_dir().ok_or_else(|| fail("~", "no home directory".to_string()))?
        } else if let Some(rest) = target.strip_prefix("~/").or_else(|| target.strip_prefix("~\\")) {
            dirs::home_dir()
                .ok_or_else(|| fail(target, "no home directory".to_string()))?
                .join(rest)
        } else {
            let candidate = Path::new(target);
            if candidate.is_absolute() {
                candidate.to_path_buf()
            } else {
                cwd.join(candidate)
            }
        };

        let resolved = std::fs::canonicalize(&path).map_err(|e| fail(target, e.to_string()))?;
        if !resolved.is_dir() {
            return Err(fail(target, "Not a directory".to_string()));
        }
        env::set_current_dir(&resolved).map_err(|e| fail(target, e.to_string()))?;

        info!(cwd = %resolved.display(), "changed directory");
        Ok(ExecOutcome {
            exit_code: 0,
            cwd_after: resolved,
        })
    }

    async fn spawn(&self, command: &str, cwd: &Path) -> Result<ExecOutcome, ExecutionError> {
        debug!(shell = %self.shell_path.display(), %command, "spawning");
        let mut child = TokioCommand::new(&self.shell_path)
            .args(&self.shell_args)
            .arg(command)
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let waited = tokio::select! {
            status = child.wait() => Some(status),
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(status) = waited else {
            warn!("interrupt received, stopping child");
            let _ = child.kill().await;
            return Err(ExecutionError::Interrupted);
        };
        let status = status.map_err(|source| ExecutionError::Spawn {
            command: command.to_string(),
            source,
        })?;

        let exit_code = exit_code(status);
        debug!(exit_code, "child exited");
        Ok(ExecOutcome {
            exit_code,
            cwd_after: cwd.to_path_buf(),
        })
    }
}

#[async_trait::async_trait]
impl CommandExecutor for ShellCommandExecutor {
    async fn execute<'a>(&'a self, command: &'a str, cwd: &'a Path) -> Result<ExecOutcome, ExecutionError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(ExecutionError::Empty);
        }

        if let Some((verb, args)) = self.directory_change(command) {
            return self.handle_cd(verb, args, cwd);
        }

        self.spawn(command, cwd).await
    }
}

/// Strips quotes and a PowerShell `-Path`/`-LiteralPath` flag from a cd argument.
fn cd_target(args: &str) -> &str {
    let mut target = args.trim();
    for flag in ["-LiteralPath", "-Path"] {
        if let Some(rest) = target.strip_prefix(flag) {
            if rest.starts_with(char::is_whitespace) {
                target = rest.trim();
                break;
            }
        }
    }
    for quote in ['"', '\''] {
        if target.len() >= 2 && target.starts_with(quote) && target.ends_with(quote) {
            return &target[1..target.len() - 1];
        }
    }
    target
}

fn resolve_shell(profile: &PlatformProfile) -> PathBuf {
    if !profile.is_windows() {
        if let Ok(shell) = env::var("SHELL") {
            if !shell.trim().is_empty() {
                return PathBuf::from(shell);
            }
        }
    }
    profile
        .shell_candidates
        .iter()
        .find_map(|name| which(name).ok())
        .unwrap_or_else(|| {
            let fallback = if profile.is_windows() { "powershell" } else { "/bin/sh" };
            warn!(fallback, "no shell found on PATH");
            PathBuf::from(fallback)
        })
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|s| 128 + s))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
