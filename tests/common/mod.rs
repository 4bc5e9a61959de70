use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use opsh::core::{
    AIProcessor, CommandExecutor, Config, ExecOutcome, ExecutionError, Input, OpshError,
    OpshResult, TerminalInterface, TranslationError, TranslationRequest,
};

type Reply = Box<dyn Fn(&TranslationRequest<'_>) -> Result<String, TranslationError> + Send + Sync>;

/// (request text, platform tag, number of history records sent)
pub type TranslatorCall = (String, String, usize);

pub struct FakeTranslator {
    reply: Reply,
    pub calls: Arc<Mutex<Vec<TranslatorCall>>>,
}

#[allow(dead_code)]
impl FakeTranslator {
    pub fn replying(command: &str) -> Self {
        let command = command.to_string();
        Self {
            reply: Box::new(move |_| Ok(command.clone())),
            calls: Arc::default(),
        }
    }

    pub fn panicking(message: &'static str) -> Self {
        Self {
            reply: Box::new(move |_| -> Result<String, TranslationError> { panic!("{}", message) }),
            calls: Arc::default(),
        }
    }

    pub fn failing(error: fn() -> TranslationError) -> Self {
        Self {
            reply: Box::new(move |_| Err(error())),
            calls: Arc::default(),
        }
    }
}

#[async_trait::async_trait]
impl AIProcessor for FakeTranslator {
    async fn translate<'a>(
        &'a self,
        _config: &'a Config,
        request: &'a TranslationRequest<'a>,
    ) -> Result<String, TranslationError> {
        self.calls.lock().unwrap().push((
            request.text.to_string(),
            request.platform.tag.to_string(),
            request.history.len(),
        ));
        (self.reply)(request)
    }
}

pub struct FakeExecutor {
    exit_code: i32,
    pub calls: Arc<Mutex<Vec<(String, PathBuf)>>>,
}

#[allow(dead_code)]
impl FakeExecutor {
    pub fn new() -> Self {
        Self::exiting_with(0)
    }

    pub fn exiting_with(exit_code: i32) -> Self {
        Self {
            exit_code,
            calls: Arc::default(),
        }
    }
}

#[async_trait::async_trait]
impl CommandExecutor for FakeExecutor {
    async fn execute<'a>(&'a self, command: &'a str, cwd: &'a Path) -> Result<ExecOutcome, ExecutionError> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), cwd.to_path_buf()));
        Ok(ExecOutcome {
            exit_code: self.exit_code,
            cwd_after: cwd.to_path_buf(),
        })
    }
}

/// Feeds canned input and captures everything shown to the user.
#[derive(Default)]
pub struct ScriptedTerminal {
    inputs: VecDeque<Input>,
    fatal_when_exhausted: bool,
    pub prompts: Vec<String>,
    pub outputs: Vec<String>,
    pub errors: Vec<String>,
    pub history: Vec<String>,
}

#[allow(dead_code)]
impl ScriptedTerminal {
    pub fn with_lines(lines: &[&str]) -> Self {
        Self {
            inputs: lines.iter().map(|l| Input::Line(l.to_string())).collect(),
            ..Self::default()
        }
    }

    pub fn then(mut self, input: Input) -> Self {
        self.inputs.push_back(input);
        self
    }

    pub fn then_fail(mut self) -> Self {
        self.fatal_when_exhausted = true;
        self
    }

    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }

    pub fn all_output(&self) -> String {
        self.outputs.join("\n")
    }
}

impl TerminalInterface for ScriptedTerminal {
    fn read_line(&mut self, prompt: &str) -> OpshResult<Input> {
        self.prompts.push(prompt.to_string());
        match self.inputs.pop_front() {
            Some(input) => Ok(input),
            None if self.fatal_when_exhausted => {
                Err(OpshError::Fatal("terminal went away".to_string()))
            }
            None => Ok(Input::Eof),
        }
    }

    fn add_history(&mut self, line: &str) {
        self.history.push(line.to_string());
    }

    fn display_output(&mut self, output: &str) {
        self.outputs.push(output.to_string());
    }

    fn display_error(&mut self, error: &str) {
        self.errors.push(error.to_string());
    }
}
