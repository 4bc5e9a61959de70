use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::lib::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Groq,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Groq, Provider::Gemini];

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Groq => "llama-3.3-70b-versatile",
            Provider::Gemini => "gemini-2.0-flash",
        }
    }

    /// Where a user can create a key for this provider.
    pub fn key_url(self) -> &'static str {
        match self {
            Provider::Groq => "https://console.groq.com/keys",
            Provider::Gemini => "https://aistudio.google.com/apikey",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" | "1" => Ok(Provider::Groq),
            "gemini" | "2" => Ok(Provider::Gemini),
            other => Err(ConfigError::Invalid(format!("unknown provider '{}'", other))),
        }
    }
}

fn default_confirm() -> bool {
    true
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub provider: Provider,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_confirm")]
    pub confirm: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("confirm", &self.confirm)
            .finish()
    }
}

impl Config {
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: None,
            confirm: true,
        }
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("api_key is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document_with_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"provider": "gemini", "api_key": "abc"}"#).unwrap();
        assert_eq!(config.provider, Provider::Gemini);
        assert!(config.confirm);
        assert_eq!(config.model(), "gemini-2.0-flash");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let parsed = serde_json::from_str::<Config>(r#"{"provider": "openai", "api_key": "abc"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn blank_key_fails_validation() {
        let config = Config::new(Provider::Groq, "   ");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let config = Config::new(Provider::Groq, "gsk_secret");
        assert!(!format!("{:?}", config).contains("gsk_secret"));
    }

    #[test]
    fn provider_accepts_menu_numbers() {
        assert_eq!("2".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!(" Groq ".parse::<Provider>().unwrap(), Provider::Groq);
        assert!("3".parse::<Provider>().is_err());
    }
}
