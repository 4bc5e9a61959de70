//! Per-platform command tables.
//!
//! The classifier and the executor both read from here, so a verb that is
//! treated as a directory change is also always recognised as a direct command.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Macos,
    Linux,
}

#[derive(Debug)]
pub struct PlatformProfile {
    /// Identifier sent to the AI backend, e.g. `windows-powershell`.
    pub tag: &'static str,
    pub os_name: &'static str,
    pub shell_name: &'static str,
    /// Programs tried in order when spawning commands.
    pub shell_candidates: &'static [&'static str],
    /// Arguments placed before the command line.
    pub shell_args: &'static [&'static str],
    /// First tokens that always mean a literal command.
    pub commands: &'static [&'static str],
    /// Tokens that only count as a command when they are the whole line.
    pub standalone: &'static [&'static str],
    /// First-token prefixes that mark a literal command.
    pub prefixes: &'static [&'static str],
    pub cd_verbs: &'static [&'static str],
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Macos
        } else {
            Platform::Linux
        }
    }

    pub fn profile(self) -> &'static PlatformProfile {
        match self {
            Platform::Windows => &WINDOWS,
            Platform::Macos => &MACOS,
            Platform::Linux => &LINUX,
        }
    }
}

impl PlatformProfile {
    pub fn is_cd_verb(&self, token: &str) -> bool {
        self.cd_verbs.contains(&token)
    }

    /// Splits a directory-change line into verb and argument.
    ///
    /// PowerShell also accepts `cd..` and `cd\` with no space, which come
    /// back as `("cd", "..")` and `("cd", "\\")`.
    pub fn split_cd<'l>(&self, line: &'l str) -> Option<(&'l str, &'l str)> {
        let (verb, args) = match line.split_once(char::is_whitespace) {
            Some((verb, args)) => (verb, args.trim()),
            None => (line, ""),
        };
        if self.is_cd_verb(verb) {
            return Some((verb, args));
        }
        if self.is_windows() {
            if let Some(rest) = line.strip_prefix("cd") {
                if rest.starts_with('.') || rest.starts_with('\\') {
                    return Some((&line[..2], rest.trim()));
                }
            }
        }
        None
    }

    pub fn is_windows(&self) -> bool {
        self.tag == WINDOWS.tag
    }
}

const UNIX_COMMANDS: &[&str] = &[
    "ls", "ll", "pwd", "clear", "whoami", "cat", "head", "tail", "less", "touch", "stat", "grep",
    "awk", "sed", "cut", "tr", "xargs", "wc", "uniq", "diff", "tar", "zip", "unzip", "gzip",
    "gunzip", "bzip2", "rm", "cp", "mv", "mkdir", "rmdir", "ln", "chmod", "chown", "chgrp", "echo",
    "df", "du", "mount", "umount", "ping", "curl", "wget", "ssh", "scp", "netstat", "ifconfig",
    "git", "npm", "node", "npx", "yarn", "pnpm", "python", "python3", "pip", "pip3", "cargo",
    "rustc", "go", "java", "javac", "make", "cmake", "gcc", "g++", "clang", "apt", "apt-get",
    "yum", "dnf", "pacman", "brew", "snap", "flatpak", "sudo", "su", "docker", "kubectl", "aws",
    "gcloud", "az", "vi", "vim", "nano", "emacs", "code", "xdg-open", "export", "source", "alias",
    "man", "which", "whereis", "kill", "killall",
];

const UNIX_STANDALONE: &[&str] = &[
    "date", "cal", "uptime", "top", "htop", "ps", "jobs", "bg", "fg", "find", "sort", "id",
    "groups", "passwd", "free", "ip", "history", "open",
];

const UNIX_PREFIXES: &[&str] = &["./", "../", "/", "~", "$", ">", "|", "&&", ";"];

static LINUX: PlatformProfile = PlatformProfile {
    tag: "unix-bash",
    os_name: "Linux",
    shell_name: "bash",
    shell_candidates: &["bash", "sh"],
    shell_args: &["-c"],
    commands: UNIX_COMMANDS,
    standalone: UNIX_STANDALONE,
    prefixes: UNIX_PREFIXES,
    cd_verbs: &["cd", "chdir"],
};

static MACOS: PlatformProfile = PlatformProfile {
    tag: "macos-zsh",
    os_name: "macOS",
    shell_name: "zsh",
    shell_candidates: &["zsh", "bash", "sh"],
    shell_args: &["-c"],
    commands: UNIX_COMMANDS,
    standalone: UNIX_STANDALONE,
    prefixes: UNIX_PREFIXES,
    cd_verbs: &["cd", "chdir"],
};

static WINDOWS: PlatformProfile = PlatformProfile {
    tag: "windows-powershell",
    os_name: "Windows",
    shell_name: "PowerShell",
    shell_candidates: &["pwsh", "powershell"],
    shell_args: &["-NoProfile", "-Command"],
    commands: &[
        "dir", "type", "copy", "move", "del", "ren", "rename", "md", "mkdir", "rd", "rmdir",
        "echo", "attrib", "xcopy", "robocopy", "ls", "cat", "ipconfig", "ping", "netstat",
        "nslookup", "tracert", "arp", "tasklist", "taskkill", "findstr", "where", "git", "npm",
        "node", "npx", "yarn", "pnpm", "python", "python3", "py", "pip", "pip3", "cargo", "rustc",
        "go", "java", "javac", "dotnet", "nuget", "curl", "wget", "ssh", "scp", "docker",
        "kubectl", "code", "notepad", "explorer",
    ],
    standalone: &[
        "cls", "clear", "pwd", "whoami", "date", "time", "systeminfo", "hostname", "ver", "tree",
        "more", "sort", "find", "set", "path",
    ],
    prefixes: &[
        "Get-", "Set-", "New-", "Remove-", "Copy-", "Move-", "Out-", "Write-", "Read-", "Start-",
        "Stop-", "Invoke-", "Test-", "Select-", "Where-", "ForEach-", "Sort-", "Group-", "./",
        ".\\", "/", "\\", "~", "$", ">", "|", "&&", ";",
    ],
    cd_verbs: &["cd", "chdir", "Set-Location"],
};
