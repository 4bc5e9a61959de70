use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::core::platform::PlatformProfile;

/// Records kept for context.
pub const HISTORY_CAPACITY: usize = 20;
/// Records shown to the translator.
pub const CONTEXT_RECORDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Direct,
    Ai,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Source::Direct => f.write_str("direct"),
            Source::Ai => f.write_str("ai"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub input: String,
    pub command: String,
    pub source: Source,
    pub timestamp: DateTime<Utc>,
}

/// Bounded FIFO of executed commands.
#[derive(Debug, Clone)]
pub struct History {
    records: VecDeque<CommandRecord>,
    capacity: usize,
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Appends a record stamped now, evicting the oldest when full.
    ///
    /// Timestamps are strictly increasing even when the clock does not advance
    /// between two calls.
    pub fn push(&mut self, input: &str, command: &str, source: Source) -> &CommandRecord {
        let mut timestamp = Utc::now();
        if let Some(last) = self.records.back() {
            if timestamp <= last.timestamp {
                timestamp = last.timestamp + chrono::Duration::microseconds(1);
            }
        }

        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(CommandRecord {
            input: input.to_string(),
            command: command.to_string(),
            source,
            timestamp,
        });
        &self.records[self.records.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandRecord> {
        self.records.iter()
    }

    /// The newest `n` records, oldest first.
    pub fn recent(&mut self, n: usize) -> &[CommandRecord] {
        let records = self.records.make_contiguous();
        let start = records.len().saturating_sub(n);
        &records[start..]
    }
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

/// State of one interactive run, from startup to shutdown.
#[derive(Debug)]
pub struct Session {
    cwd: PathBuf,
    history: History,
    started: Instant,
    commands_run: u64,
    ai_calls: u64,
    platform: &'static PlatformProfile,
}

impl Session {
    pub fn new(cwd: impl Into<PathBuf>, platform: &'static PlatformProfile) -> Self {
        Self {
            cwd: cwd.into(),
            history: History::default(),
            started: Instant::now(),
            commands_run: 0,
            ai_calls: 0,
            platform,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn set_cwd(&mut self, cwd: PathBuf) {
        self.cwd = cwd;
    }

    pub fn platform(&self) -> &'static PlatformProfile {
        self.platform
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Splits the session into the pieces a translation request borrows.
    pub fn context(&mut self) -> (&Path, &[CommandRecord]) {
        (&self.cwd, self.history.recent(CONTEXT_RECORDS))
    }

    pub fn record(&mut self, input: &str, command: &str, source: Source) {
        self.history.push(input, command, source);
        self.commands_run += 1;
    }

    pub fn count_ai_call(&mut self) {
        self.ai_calls += 1;
    }

    pub fn commands_run(&self) -> u64 {
        self.commands_run
    }

    pub fn ai_calls(&self) -> u64 {
        self.ai_calls
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn summary(&self) -> String {
        let secs = self.elapsed().as_secs();
        format!(
            "Session: {}m {}s | Commands: {} | AI calls: {}",
            secs / 60,
            secs % 60,
            self.commands_run,
            self.ai_calls
        )
    }
}

/// Prompt label built from the last two components of `cwd`.
pub fn prompt_label(cwd: &Path) -> String {
    let components: Vec<String> = cwd
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let dir_display = match components.as_slice() {
        [] => "/".to_string(),
        [only] => only.clone(),
        [.., parent, last] => format!("{}/{}", parent, last),
    };
    format!("opsh[{}]> ", dir_display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::Platform;

    #[test]
    fn history_never_exceeds_capacity() {
        let mut history = History::with_capacity(3);
        for i in 0..10 {
            history.push(&format!("in {}", i), &format!("cmd {}", i), Source::Direct);
            assert!(history.len() <= 3);
        }
        let kept: Vec<&str> = history.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(kept, vec!["cmd 7", "cmd 8", "cmd 9"]);
    }

    #[test]
    fn default_capacity_evicts_oldest_first() {
        let mut history = History::default();
        for i in 0..=HISTORY_CAPACITY {
            history.push("x", &i.to_string(), Source::Ai);
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.iter().next().unwrap().command, "1");
    }

    #[test]
    fn repeated_commands_get_distinct_timestamps() {
        let mut history = History::default();
        let first = history.push("ls", "ls", Source::Direct).clone();
        let second = history.push("ls", "ls", Source::Direct).clone();
        assert_eq!(first.command, second.command);
        assert!(second.timestamp > first.timestamp);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn recent_returns_newest_in_order() {
        let mut history = History::default();
        for i in 0..8 {
            history.push("x", &i.to_string(), Source::Direct);
        }
        let recent: Vec<&str> = history.recent(3).iter().map(|r| r.command.as_str()).collect();
        assert_eq!(recent, vec!["5", "6", "7"]);
        assert_eq!(history.recent(50).len(), 8);
    }

    #[test]
    fn counters_follow_records() {
        let mut session = Session::new("/tmp", Platform::Linux.profile());
        session.record("ls", "ls", Source::Direct);
        session.count_ai_call();
        assert_eq!(session.commands_run(), 1);
        assert_eq!(session.ai_calls(), 1);
        assert!(session.summary().contains("Commands: 1 | AI calls: 1"));
    }

    #[test]
    fn prompt_shows_last_two_components() {
        assert_eq!(prompt_label(Path::new("/home/ada/projects/opsh")), "opsh[projects/opsh]> ");
        assert_eq!(prompt_label(Path::new("/home")), "opsh[home]> ");
        assert_eq!(prompt_label(Path::new("/")), "opsh[/]> ");
    }
}
