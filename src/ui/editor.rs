use std::borrow::Cow;
use std::path::PathBuf;

use colored::*;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{Highlighter, MatchingBracketHighlighter};
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, EditMode, Editor};
use tracing::debug;

use crate::core::classifier::{Builtin, BUILTIN_MARKER};
use crate::core::lib::{Input, OpshError, OpshResult, TerminalInterface};

pub struct OpshCompleter {
    filename_completer: FilenameCompleter,
}

impl OpshCompleter {
    fn new() -> Self {
        Self {
            filename_completer: FilenameCompleter::new(),
        }
    }
}

impl Completer for OpshCompleter {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, ctx: &rustyline::Context<'_>)
        -> rustyline::Result<(usize, Vec<Pair>)> {
        // `!he<TAB>` completes built-in names
        let head = &line[..pos];
        if let Some(partial) = head.strip_prefix(BUILTIN_MARKER) {
            if !partial.contains(char::is_whitespace) {
                let matches = Builtin::NAMED
                    .iter()
                    .filter(|(name, _)| name.starts_with(partial))
                    .map(|(name, _)| Pair {
                        display: format!("{}{}", BUILTIN_MARKER, name),
                        replacement: format!("{}{}", BUILTIN_MARKER, name),
                    })
                    .collect();
                return Ok((0, matches));
            }
        }

        self.filename_completer.complete(line, pos, ctx)
    }
}

pub struct OpshHelper {
    completer: OpshCompleter,
    highlighter: MatchingBracketHighlighter,
    hinter: HistoryHinter,
}

impl rustyline::Helper for OpshHelper {}

impl OpshHelper {
    fn new() -> Self {
        Self {
            completer: OpshCompleter::new(),
            highlighter: MatchingBracketHighlighter::new(),
            hinter: HistoryHinter {},
        }
    }
}

impl Completer for OpshHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, ctx: &rustyline::Context<'_>)
        -> rustyline::Result<(usize, Vec<Pair>)> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Validator for OpshHelper {}

impl Highlighter for OpshHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_char(&self, line: &str, pos: usize, forced: bool) -> bool {
        self.highlighter.highlight_char(line, pos, forced)
    }
}

impl Hinter for OpshHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &rustyline::Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

/// Interactive terminal backed by rustyline.
pub struct LineEditor {
    editor: Editor<OpshHelper, DefaultHistory>,
    history_path: Option<PathBuf>,
}

impl LineEditor {
    pub fn new(history_path: Option<PathBuf>) -> OpshResult<Self> {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .auto_add_history(false)
            .build();
        let mut editor = Editor::with_config(config)
            .map_err(|e| OpshError::Fatal(format!("failed to initialise line editor: {}", e)))?;
        editor.set_helper(Some(OpshHelper::new()));

        if let Some(path) = &history_path {
            if let Err(e) = editor.load_history(path) {
                debug!(path = %path.display(), error = %e, "no saved line history");
            }
        }

        Ok(Self {
            editor,
            history_path,
        })
    }

    pub fn save_history(&mut self) {
        let Some(path) = &self.history_path else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = self.editor.save_history(path) {
            debug!(path = %path.display(), error = %e, "could not save line history");
        }
    }
}

impl TerminalInterface for LineEditor {
    fn read_line(&mut self, prompt: &str) -> OpshResult<Input> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Input::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(e) => Err(OpshError::Fatal(format!("failed to read input: {}", e))),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }

    fn display_output(&mut self, output: &str) {
        println!("{}", output);
    }

    fn display_error(&mut self, error: &str) {
        eprintln!("{}", error.red());
    }
}
