pub mod analytics;
pub mod compiler;
pub mod domain;
pub mod llm;
pub mod orchestrator;
pub mod source;
pub mod time;
pub mod views;

pub mod config {
    use anyhow::{bail, Context};
    use std::time::Duration;

    const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/v1/chat/completions";
    const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:latest";
    const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
    const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-latest";
    const DEFAULT_ANTHROPIC_MAX_TOKENS: u32 = 1024;
    const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 45;
    const DEFAULT_TOOL_BASE_URL: &str = "http://localhost:8000";
    const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 20;
    const DEFAULT_PORT: u16 = 3000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub oracle_provider: Option<String>,
        pub ollama_url: Option<String>,
        pub ollama_model: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub anthropic_base_url: Option<String>,
        pub anthropic_model: Option<String>,
        pub anthropic_max_tokens: Option<String>,
        pub oracle_timeout_secs: Option<String>,
        pub tool_base_url: Option<String>,
        pub tool_api_key: Option<String>,
        pub tool_timeout_secs: Option<String>,
        pub sentry_dsn: Option<String>,
        pub port: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum OracleConfig {
        Disabled,
        Ollama(OllamaConfig),
        Anthropic(AnthropicConfig),
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct OllamaConfig {
        pub url: String,
        pub model: String,
        pub timeout: Duration,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct AnthropicConfig {
        pub api_key: String,
        pub base_url: String,
        pub model: String,
        pub max_tokens: u32,
        pub timeout: Duration,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SourceConfig {
        pub base_url: String,
        pub api_key: Option<String>,
        pub timeout: Duration,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        /// Same as [`Settings::from_env`] with an injectable variable lookup.
        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
            Ok(Self {
                oracle_provider: var("ORACLE_PROVIDER"),
                ollama_url: var("OLLAMA_URL"),
                ollama_model: var("OLLAMA_MODEL"),
                anthropic_api_key: var("ANTHROPIC_API_KEY"),
                anthropic_base_url: var("ANTHROPIC_BASE_URL"),
                anthropic_model: var("ANTHROPIC_MODEL"),
                anthropic_max_tokens: var("ANTHROPIC_MAX_TOKENS"),
                oracle_timeout_secs: var("ORACLE_TIMEOUT_SECS"),
                tool_base_url: var("TOOL_BASE_URL"),
                tool_api_key: var("TOOL_API_KEY"),
                tool_timeout_secs: var("TOOL_TIMEOUT_SECS"),
                sentry_dsn: var("SENTRY_DSN"),
                port: var("PORT"),
            })
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required when ORACLE_PROVIDER=anthropic")
        }

        pub fn oracle(&self) -> anyhow::Result<OracleConfig> {
            let timeout = Duration::from_secs(parse_or(
                "ORACLE_TIMEOUT_SECS",
                self.oracle_timeout_secs.as_deref(),
                DEFAULT_ORACLE_TIMEOUT_SECS,
            )?);

            let provider = self
                .oracle_provider
                .as_deref()
                .map(|p| p.trim().to_ascii_lowercase());
            match provider.as_deref() {
                None | Some("ollama") => Ok(OracleConfig::Ollama(OllamaConfig {
                    url: or_default(&self.ollama_url, DEFAULT_OLLAMA_URL),
                    model: or_default(&self.ollama_model, DEFAULT_OLLAMA_MODEL),
                    timeout,
                })),
                Some("anthropic") => Ok(OracleConfig::Anthropic(AnthropicConfig {
                    api_key: self.require_anthropic_api_key()?.to_string(),
                    base_url: or_default(&self.anthropic_base_url, DEFAULT_ANTHROPIC_BASE_URL),
                    model: or_default(&self.anthropic_model, DEFAULT_ANTHROPIC_MODEL),
                    max_tokens: parse_or(
                        "ANTHROPIC_MAX_TOKENS",
                        self.anthropic_max_tokens.as_deref(),
                        DEFAULT_ANTHROPIC_MAX_TOKENS,
                    )?,
                    timeout,
                })),
                Some("none") | Some("off") => Ok(OracleConfig::Disabled),
                Some(other) => bail!("unknown ORACLE_PROVIDER {other:?} (expected ollama, anthropic or none)"),
            }
        }

        pub fn source(&self) -> anyhow::Result<SourceConfig> {
            Ok(SourceConfig {
                base_url: or_default(&self.tool_base_url, DEFAULT_TOOL_BASE_URL),
                api_key: self.tool_api_key.clone(),
                timeout: Duration::from_secs(parse_or(
                    "TOOL_TIMEOUT_SECS",
                    self.tool_timeout_secs.as_deref(),
                    DEFAULT_TOOL_TIMEOUT_SECS,
                )?),
            })
        }

        pub fn port(&self) -> anyhow::Result<u16> {
            parse_or("PORT", self.port.as_deref(), DEFAULT_PORT)
        }
    }

    fn or_default(value: &Option<String>, default: &str) -> String {
        value.clone().unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(key: &str, raw: Option<&str>, default: T) -> anyhow::Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match raw {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("{key} must be a number (got {raw:?})")),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        fn settings(vars: &[(&str, &str)]) -> Settings {
            let map: HashMap<String, String> = vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Settings::from_lookup(|key| map.get(key).cloned()).unwrap()
        }

        #[test]
        fn defaults_to_local_ollama_and_tool_api() {
            let s = settings(&[]);
            assert_eq!(
                s.oracle().unwrap(),
                OracleConfig::Ollama(OllamaConfig {
                    url: DEFAULT_OLLAMA_URL.to_string(),
                    model: DEFAULT_OLLAMA_MODEL.to_string(),
                    timeout: Duration::from_secs(45),
                })
            );
            let source = s.source().unwrap();
            assert_eq!(source.base_url, "http://localhost:8000");
            assert_eq!(source.timeout, Duration::from_secs(20));
            assert_eq!(s.port().unwrap(), 3000);
        }

        #[test]
        fn anthropic_requires_key() {
            assert!(settings(&[("ORACLE_PROVIDER", "anthropic")]).oracle().is_err());

            let s = settings(&[
                ("ORACLE_PROVIDER", "Anthropic"),
                ("ANTHROPIC_API_KEY", "sk-test"),
                ("ORACLE_TIMEOUT_SECS", "5"),
            ]);
            let OracleConfig::Anthropic(cfg) = s.oracle().unwrap() else {
                panic!("expected anthropic config");
            };
            assert_eq!(cfg.api_key, "sk-test");
            assert_eq!(cfg.timeout, Duration::from_secs(5));
        }

        #[test]
        fn oracle_can_be_disabled() {
            assert_eq!(settings(&[("ORACLE_PROVIDER", "none")]).oracle().unwrap(), OracleConfig::Disabled);
            assert!(settings(&[("ORACLE_PROVIDER", "gpt")]).oracle().is_err());
        }

        #[test]
        fn rejects_non_numeric_values() {
            assert!(settings(&[("TOOL_TIMEOUT_SECS", "soon")]).source().is_err());
            assert!(settings(&[("PORT", "http")]).port().is_err());
        }

        #[test]
        fn blank_values_count_as_unset() {
            let s = settings(&[("TOOL_BASE_URL", "  "), ("TOOL_API_KEY", "")]);
            let source = s.source().unwrap();
            assert_eq!(source.base_url, DEFAULT_TOOL_BASE_URL);
            assert_eq!(source.api_key, None);
        }
    }
}
