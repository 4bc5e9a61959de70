use crate::core::platform::PlatformProfile;

/// Marker that introduces a built-in command.
pub const BUILTIN_MARKER: char = '!';

const EXIT_WORDS: &[&str] = &["exit", "quit", "bye", "goodbye"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builtin {
    Auth,
    Help,
    Credits,
    Version,
    History,
    Exit,
    /// `!<cmd>`: run the rest of the line as a literal command.
    Passthrough(String),
}

impl Builtin {
    /// Named built-ins with their help text, in display order.
    pub const NAMED: [(&'static str, &'static str); 5] = [
        ("auth", "Change AI provider or API key"),
        ("version", "Show version info"),
        ("history", "List commands run this session"),
        ("credits", "Show credits"),
        ("help", "Show this help"),
    ];

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "auth" => Some(Builtin::Auth),
            "help" => Some(Builtin::Help),
            "credits" => Some(Builtin::Credits),
            "version" => Some(Builtin::Version),
            "history" => Some(Builtin::History),
            _ => None,
        }
    }

    /// Handler key used for dispatch and logging.
    pub fn key(&self) -> &'static str {
        match self {
            Builtin::Auth => "auth",
            Builtin::Help => "help",
            Builtin::Credits => "credits",
            Builtin::Version => "version",
            Builtin::History => "history",
            Builtin::Exit => "exit",
            Builtin::Passthrough(_) => "passthrough",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing to do; reprompt.
    Empty,
    Direct(String),
    Builtin(Builtin),
    Natural(String),
}

/// Decides how a typed line is handled.
///
/// Direct-command matching is case-sensitive and keyed by the first
/// whitespace-delimited token: it must appear in the platform's `commands` or
/// `cd_verbs`, start with one of its `prefixes`, or be the whole line and
/// appear in `standalone`.
pub fn classify(input: &str, profile: &PlatformProfile) -> Verdict {
    let line = input.trim();
    if line.is_empty() {
        return Verdict::Empty;
    }

    if EXIT_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w)) {
        return Verdict::Builtin(Builtin::Exit);
    }

    if let Some(rest) = line.strip_prefix(BUILTIN_MARKER) {
        let rest = rest.trim();
        if rest.is_empty() {
            return Verdict::Empty;
        }
        return Verdict::Builtin(
            Builtin::from_key(rest).unwrap_or_else(|| Builtin::Passthrough(rest.to_string())),
        );
    }

    if is_direct(line, profile) {
        Verdict::Direct(line.to_string())
    } else {
        Verdict::Natural(line.to_string())
    }
}

fn is_direct(line: &str, profile: &PlatformProfile) -> bool {
    let Some(first) = line.split_whitespace().next() else {
        return false;
    };

    profile.commands.contains(&first)
        || profile.split_cd(line).is_some()
        || (first == line && profile.standalone.contains(&first))
        || profile.prefixes.iter().any(|p| first.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::Platform;

    fn linux(line: &str) -> Verdict {
        classify(line, Platform::Linux.profile())
    }

    fn windows(line: &str) -> Verdict {
        classify(line, Platform::Windows.profile())
    }

    #[test]
    fn blank_lines_are_noops() {
        assert_eq!(linux(""), Verdict::Empty);
        assert_eq!(linux("   \t "), Verdict::Empty);
        assert_eq!(linux("!"), Verdict::Empty);
    }

    #[test]
    fn every_listed_command_is_direct() {
        for platform in [Platform::Windows, Platform::Macos, Platform::Linux] {
            let profile = platform.profile();
            for token in profile.commands.iter().chain(profile.cd_verbs) {
                let line = format!("{} something", token);
                assert_eq!(
                    classify(&line, profile),
                    Verdict::Direct(line.clone()),
                    "{} on {}",
                    token,
                    profile.tag
                );
            }
        }
    }

    #[test]
    fn standalone_tokens_only_match_whole_line() {
        assert_eq!(linux("find"), Verdict::Direct("find".into()));
        assert_eq!(
            linux("find all large files"),
            Verdict::Natural("find all large files".into())
        );
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(linux("Git status"), Verdict::Natural("Git status".into()));
        assert_eq!(
            windows("get-childitem *.py"),
            Verdict::Natural("get-childitem *.py".into())
        );
        assert_eq!(
            windows("Get-ChildItem *.py"),
            Verdict::Direct("Get-ChildItem *.py".into())
        );
    }

    #[test]
    fn path_prefixes_are_direct() {
        assert_eq!(linux("./build.sh --release"), Verdict::Direct("./build.sh --release".into()));
        assert_eq!(linux("~/bin/tool"), Verdict::Direct("~/bin/tool".into()));
        assert_eq!(windows(".\\setup.ps1"), Verdict::Direct(".\\setup.ps1".into()));
    }

    #[test]
    fn glued_cd_is_direct_on_windows() {
        assert_eq!(windows("cd.."), Verdict::Direct("cd..".into()));
        assert_eq!(windows("cd\\"), Verdict::Direct("cd\\".into()));
        assert_eq!(linux("cd.."), Verdict::Natural("cd..".into()));
    }

    #[test]
    fn input_is_trimmed() {
        assert_eq!(linux("  git status  "), Verdict::Direct("git status".into()));
    }

    #[test]
    fn natural_language_falls_through() {
        assert_eq!(
            linux("list all python files"),
            Verdict::Natural("list all python files".into())
        );
    }

    #[test]
    fn bang_lines_are_builtins() {
        assert_eq!(linux("!help"), Verdict::Builtin(Builtin::Help));
        assert_eq!(linux("!auth"), Verdict::Builtin(Builtin::Auth));
        assert_eq!(linux("!credits"), Verdict::Builtin(Builtin::Credits));
        assert_eq!(linux("!version"), Verdict::Builtin(Builtin::Version));
        assert_eq!(linux("!history"), Verdict::Builtin(Builtin::History));
        assert_eq!(
            linux("!make deploy"),
            Verdict::Builtin(Builtin::Passthrough("make deploy".into()))
        );
        assert_eq!(
            linux("!list files"),
            Verdict::Builtin(Builtin::Passthrough("list files".into()))
        );
    }

    #[test]
    fn bang_lines_never_reach_the_translator() {
        for line in ["!help", "!x", "!cd /tmp", "!!", "! ls"] {
            assert!(matches!(linux(line), Verdict::Builtin(_)), "{}", line);
        }
    }

    #[test]
    fn exit_words_ignore_case() {
        for word in ["exit", "QUIT", "Bye", "goodbye"] {
            assert_eq!(linux(word), Verdict::Builtin(Builtin::Exit));
        }
        assert_eq!(linux("exit now please"), Verdict::Natural("exit now please".into()));
    }

    #[test]
    fn keys_round_trip() {
        for (key, _) in Builtin::NAMED {
            assert_eq!(Builtin::from_key(key).map(|b| b.key()), Some(key));
        }
    }
}
