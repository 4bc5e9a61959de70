use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::config::{Config, Provider};
use crate::core::lib::{AIProcessor, OpshError, OpshResult, TranslationError, TranslationRequest};
use crate::services::extract::extract_command;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

const GROQ_BASE_URL: &str = "https://api.groq.com";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const ERROR_BODY_LIMIT: usize = 200;

const POWERSHELL_HINTS: &str = "Use PowerShell cmdlets and syntax, for example:
- List files: Get-ChildItem (or dir)
- Find files: Get-ChildItem -Recurse -Filter \"*.py\"
- Current directory: Get-Location
- Remove, copy, move: Remove-Item, Copy-Item, Move-Item
- Create directory: New-Item -ItemType Directory
- View file: Get-Content
- Processes: Get-Process, Stop-Process -Name \"name\"
- Network: ipconfig, Test-NetConnection";

/// Talks to the hosted completion APIs.
#[derive(Debug, Clone)]
pub struct AiTranslator {
    client: Client,
    groq_base_url: String,
    gemini_base_url: String,
    retry_backoff: Duration,
}

impl AiTranslator {
    pub fn new(timeout: Duration) -> OpshResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OpshError::Fatal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            groq_base_url: GROQ_BASE_URL.to_string(),
            gemini_base_url: GEMINI_BASE_URL.to_string(),
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        })
    }

    pub fn with_default_config() -> OpshResult<Self> {
        Self::new(DEFAULT_TIMEOUT)
    }

    /// Points one provider at a different host, e.g. a local mock server.
    pub fn with_base_url(mut self, provider: Provider, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        match provider {
            Provider::Groq => self.groq_base_url = base_url,
            Provider::Gemini => self.gemini_base_url = base_url,
        }
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    async fn send_once(
        &self,
        config: &Config,
        preamble: &str,
        text: &str,
    ) -> Result<String, TranslationError> {
        let model = config.model();
        let request = match config.provider {
            Provider::Groq => {
                let body = ChatRequest {
                    model,
                    messages: vec![
                        ChatMessage { role: "system", content: preamble },
                        ChatMessage { role: "user", content: text },
                    ],
                    temperature: 0.0,
                };
                self.client
                    .post(format!("{}/openai/v1/chat/completions", self.groq_base_url))
                    .bearer_auth(&config.api_key)
                    .json(&body)
            }
            Provider::Gemini => {
                let body = GenerateContentRequest {
                    system_instruction: GeminiContent {
                        role: None,
                        parts: vec![GeminiPart { text: preamble }],
                    },
                    contents: vec![GeminiContent {
                        role: Some("user"),
                        parts: vec![GeminiPart { text }],
                    }],
                    generation_config: GenerationConfig { temperature: 0.0 },
                };
                self.client
                    .post(format!(
                        "{}/v1beta/models/{}:generateContent",
                        self.gemini_base_url, model
                    ))
                    .header("x-goog-api-key", &config.api_key)
                    .json(&body)
            }
        };

        debug!(provider = %config.provider, model, "sending translation request");
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        debug!(status = status.as_u16(), "translation response received");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TranslationError::RateLimited);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TranslationError::Unauthorized(config.provider));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslationError::Http {
                provider: config.provider,
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let body = response.text().await.map_err(map_transport_error)?;
        reply_text(config.provider, &body)
    }
}

#[async_trait::async_trait]
impl AIProcessor for AiTranslator {
    async fn translate<'a>(
        &'a self,
        config: &'a Config,
        request: &'a TranslationRequest<'a>,
    ) -> Result<String, TranslationError> {
        let preamble = build_preamble(request);

        let mut retried = false;
        let reply = loop {
            match self.send_once(config, &preamble, request.text).await {
                Err(TranslationError::RateLimited) if !retried => {
                    let backoff_ms = self.retry_backoff.as_millis() as u64;
                    warn!(backoff_ms, "rate limited, retrying once");
                    tokio::time::sleep(self.retry_backoff).await;
                    retried = true;
                }
                other => break other?,
            }
        };

        let command = extract_command(&reply)?;
        debug!(%command, "extracted command");
        Ok(command)
    }
}

/// System preamble: platform, working directory, recent commands and output rules.
pub fn build_preamble(request: &TranslationRequest<'_>) -> String {
    let platform = request.platform;
    let mut preamble = format!(
        "You translate requests into shell commands. Convert the user's request into a single {} command for {}.\nPlatform: {}\n",
        platform.shell_name, platform.os_name, platform.tag
    );
    if platform.is_windows() {
        preamble.push_str(POWERSHELL_HINTS);
        preamble.push('\n');
    }
    preamble.push_str(&format!("Current directory: {}\n\n", request.cwd.display()));

    preamble.push_str("Recent commands:\n");
    if request.history.is_empty() {
        preamble.push_str("(none)\n");
    } else {
        for (i, record) in request.history.iter().enumerate() {
            preamble.push_str(&format!("{}. $ {}\n", i + 1, record.command));
        }
    }

    preamble.push_str(
        "\nRules:
- Reply with the command only, on one line
- No explanations, no markdown, no backticks
- If the request is ambiguous, make a reasonable assumption
- Prefer simple, common commands
- Use the recent commands for context (\"do that again\", \"delete the file I just made\")",
    );
    preamble
}

/// Pulls the model's text out of a provider response body.
pub fn reply_text(provider: Provider, body: &str) -> Result<String, TranslationError> {
    let malformed = |e: serde_json::Error| TranslationError::Malformed(e.to_string());
    let text = match provider {
        Provider::Groq => {
            let parsed: ChatResponse = serde_json::from_str(body).map_err(malformed)?;
            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
        }
        Provider::Gemini => {
            let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(malformed)?;
            parsed
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content)
                .map(|content| {
                    content
                        .parts
                        .into_iter()
                        .filter_map(|p| p.text)
                        .collect::<Vec<_>>()
                        .join("")
                })
        }
    };

    text.filter(|t| !t.trim().is_empty())
        .ok_or_else(|| TranslationError::Malformed(format!("{} response contained no text", provider)))
}

fn map_transport_error(e: reqwest::Error) -> TranslationError {
    if e.is_timeout() {
        TranslationError::Timeout
    } else if e.is_decode() {
        TranslationError::Malformed(e.to_string())
    } else {
        TranslationError::Network(e.to_string())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::Platform;
    use crate::core::session::{History, Source};
    use std::path::Path;

    #[test]
    fn preamble_names_platform_and_history() {
        let mut history = History::default();
        history.push("ls", "ls", Source::Direct);
        history.push("show disk usage", "du -sh .", Source::Ai);
        let request = TranslationRequest {
            text: "delete that",
            platform: Platform::Linux.profile(),
            cwd: Path::new("/srv/app"),
            history: history.recent(5),
        };

        let preamble = build_preamble(&request);
        assert!(preamble.contains("Platform: unix-bash"));
        assert!(preamble.contains("bash command for Linux"));
        assert!(preamble.contains("Current directory: /srv/app"));
        assert!(preamble.contains("1. $ ls\n2. $ du -sh .\n"));
        assert!(!preamble.contains("Get-ChildItem"));
    }

    #[test]
    fn windows_preamble_carries_cmdlet_hints() {
        let request = TranslationRequest {
            text: "list all python files",
            platform: Platform::Windows.profile(),
            cwd: Path::new("C:\\Users\\ada"),
            history: &[],
        };
        let preamble = build_preamble(&request);
        assert!(preamble.contains("Platform: windows-powershell"));
        assert!(preamble.contains("Get-ChildItem -Recurse"));
        assert!(preamble.contains("(none)"));
    }

    #[test]
    fn groq_reply_text() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"ls -la"}}]}"#;
        assert_eq!(reply_text(Provider::Groq, body).unwrap(), "ls -la");
    }

    #[test]
    fn gemini_reply_joins_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"git "},{"text":"status"}]}}]}"#;
        assert_eq!(reply_text(Provider::Gemini, body).unwrap(), "git status");
    }

    #[test]
    fn missing_text_is_malformed() {
        assert!(matches!(
            reply_text(Provider::Groq, r#"{"choices":[]}"#),
            Err(TranslationError::Malformed(_))
        ));
        assert!(matches!(
            reply_text(Provider::Gemini, r#"{"candidates":[{"finishReason":"SAFETY"}]}"#),
            Err(TranslationError::Malformed(_))
        ));
        assert!(matches!(
            reply_text(Provider::Gemini, "<html>oops</html>"),
            Err(TranslationError::Malformed(_))
        ));
    }
}
