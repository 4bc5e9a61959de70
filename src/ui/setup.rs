use colored::*;

use crate::core::config::{Config, Provider};
use crate::core::lib::{Input, OpshResult, TerminalInterface};
use crate::services::config::ConfigStore;

const MAX_ATTEMPTS: usize = 3;

/// Collects a provider and API key, persists them and returns the new config.
///
/// Returns `Ok(None)` when the user backs out (interrupt, end of input, empty
/// key or too many invalid provider choices); nothing is written in that case.
pub fn run_setup<T: TerminalInterface + ?Sized>(
    terminal: &mut T,
    store: &ConfigStore,
    current: Option<&Config>,
) -> OpshResult<Option<Config>> {
    terminal.display_output(&format!("\n{}\n", "🔐 OpSH Setup".bold()));
    terminal.display_output("OpSH turns plain English into shell commands using a hosted AI model.");
    for (i, provider) in Provider::ALL.iter().enumerate() {
        terminal.display_output(&format!("  {}) {}", i + 1, provider));
    }

    let default = current.map(|c| c.provider).unwrap_or(Provider::Groq);
    let mut provider = None;
    for _ in 0..MAX_ATTEMPTS {
        let answer = match terminal.read_line(&format!("Provider [{}]: ", default))? {
            Input::Line(answer) => answer,
            Input::Interrupted | Input::Eof => return Ok(None),
        };
        if answer.trim().is_empty() {
            provider = Some(default);
            break;
        }
        match answer.parse::<Provider>() {
            Ok(p) => {
                provider = Some(p);
                break;
            }
            Err(e) => terminal.display_error(&e.to_string()),
        }
    }
    let Some(provider) = provider else {
        return Ok(None);
    };

    terminal.display_output(&format!(
        "{} {}",
        "Get a key at:".cyan(),
        provider.key_url().cyan()
    ));
    let api_key = match terminal.read_line(&format!("Paste your {} API key: ", provider))? {
        Input::Line(key) => key.trim().to_string(),
        Input::Interrupted | Input::Eof => return Ok(None),
    };
    if api_key.is_empty() {
        terminal.display_error("No API key provided.");
        return Ok(None);
    }

    let mut config = Config::new(provider, api_key);
    if let Some(current) = current {
        config.confirm = current.confirm;
        if current.provider == provider {
            config.model = current.model.clone();
        }
    }

    store.save(&config)?;
    terminal.display_output(&format!(
        "{} {}",
        "✓ Saved to".green(),
        store.path().display()
    ));
    Ok(Some(config))
}
