use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::llm::prompts::Language;
use crate::models::FallbackPolicy;
use crate::table::ColumnMapping;

pub const DEFAULT_KEYWORDS: &[&str] = &["챗봇", "Chatbot"];
pub const DEFAULT_TITLE_COLUMN: &str = "제목";
pub const DEFAULT_ABSTRACT_COLUMN: &str = "국문 초록 (Abstract)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl std::str::FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Ok(ProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            other => Err(Error::Config(format!("unknown LLM_PROVIDER '{}'", other))),
        }
    }
}

impl ProviderKind {
    pub fn key_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub directory: PathBuf,
    pub keywords: Vec<String>,
    pub language: Language,
    pub columns: ColumnMapping,
    pub fallback: FallbackPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let provider = env::var("LLM_PROVIDER")
            .ok()
            .map(|v| v.parse::<ProviderKind>())
            .transpose()?
            .unwrap_or(ProviderKind::OpenAi);

        let api_key = env::var(provider.key_var()).ok().filter(|v| !v.trim().is_empty());

        let model = env::var("LLM_MODEL").ok().filter(|v| !v.trim().is_empty());

        let directory = env::var("PAPERSCREEN_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let keywords = env::var("PAPERSCREEN_KEYWORDS")
            .ok()
            .map(|v| parse_keyword_list(&v))
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect());

        let language = env::var("PAPERSCREEN_LANGUAGE")
            .ok()
            .map(|v| v.parse::<Language>())
            .transpose()?
            .unwrap_or_default();

        let columns = ColumnMapping {
            title: env::var("TITLE_COLUMN").unwrap_or_else(|_| DEFAULT_TITLE_COLUMN.to_string()),
            abstract_text: env::var("ABSTRACT_COLUMN")
                .unwrap_or_else(|_| DEFAULT_ABSTRACT_COLUMN.to_string()),
        };

        let fallback = env::var("EXCLUDE_UNCLASSIFIED")
            .ok()
            .map(|v| v.to_lowercase() == "true")
            .map(|exclude| if exclude { FallbackPolicy::Exclude } else { FallbackPolicy::Keep })
            .unwrap_or_default();

        Ok(Self {
            provider,
            api_key,
            model,
            directory,
            keywords,
            language,
            columns,
            fallback,
        })
    }

    /// The key is only needed once the classifier stage actually runs.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "{} environment variable not set",
                self.provider.key_var()
            ))
        })
    }
}

pub fn parse_keyword_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub keywords: Vec<String>,
    pub language: Language,
    pub fallback: FallbackPolicy,
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            language: Language::default(),
            fallback: FallbackPolicy::default(),
            show_progress: false,
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            keywords: config.keywords.clone(),
            language: config.language,
            fallback: config.fallback,
            show_progress: true,
        }
    }
}
