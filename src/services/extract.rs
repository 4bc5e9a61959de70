use crate::core::lib::ParseError;

const FENCE: &str = "```";
const PROMPT_MARKERS: &[&str] = &["PS> ", "$ ", "> "];

/// Pulls exactly one command line out of a free-form model response.
///
/// If the text contains a ``` fence, the first non-blank line inside the first
/// fenced block is used (up to the closing fence, or the end of the text when
/// the fence is never closed). A fence closed on its own opening line yields
/// the text between the two fences. Otherwise the first non-blank line is used.
/// The line is then trimmed and stripped of a leading `COMMAND:` label, a
/// `PS> `, `$ ` or `> ` prompt marker, and enclosing single backticks.
pub fn extract_command(raw: &str) -> Result<String, ParseError> {
    let line = match raw.find(FENCE) {
        Some(start) => {
            let after = &raw[start + FENCE.len()..];
            let (opening, rest) = after.split_once('\n').unwrap_or((after, ""));
            match opening.find(FENCE) {
                // Closed on the same line: ```ls -la```
                Some(end) => first_non_blank(&opening[..end]),
                // Otherwise the rest of the opening line is an info string (```bash).
                None => first_non_blank(rest.split(FENCE).next().unwrap_or("")),
            }
        }
        None => first_non_blank(raw),
    };

    let command = line.map(clean).unwrap_or_default();
    if command.is_empty() {
        Err(ParseError::Empty)
    } else {
        Ok(command)
    }
}

fn first_non_blank(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}

fn clean(line: &str) -> String {
    let mut line = line.trim();
    if let Some(rest) = line.strip_prefix("COMMAND:") {
        line = rest.trim();
    }
    for marker in PROMPT_MARKERS {
        if let Some(rest) = line.strip_prefix(marker) {
            line = rest.trim();
            break;
        }
    }
    if line.len() >= 2 && line.starts_with('`') && line.ends_with('`') {
        line = line[1..line.len() - 1].trim();
    }
    line.to_string()
}
