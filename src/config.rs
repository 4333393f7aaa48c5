use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::language::{Language, LanguageError};

pub const CONFIG_FILE: &str = ".patch-digest.toml";
pub const LANGUAGE_ENV: &str = "CODE_LANGUAGE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Code language is not set; pass --language, set CODE_LANGUAGE or add code_language to .patch-digest.toml")]
    MissingLanguage,

    #[error(transparent)]
    Language(#[from] LanguageError),
}

/// Configuration loaded from `.patch-digest.toml`.
///
/// All fields are optional; the language may come from the environment or
/// the command line instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Source language of the patched files, e.g. "Python".
    pub code_language: Option<String>,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    #[serde(default)]
    pub pretty: bool,
}

impl Config {
    /// Load `.patch-digest.toml` from the current directory, falling back to
    /// defaults when it is absent, then apply `CODE_LANGUAGE`.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        Ok(config.with_language(std::env::var(LANGUAGE_ENV).ok()))
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Override the configured language; empty values are ignored.
    pub fn with_language(mut self, language: Option<String>) -> Self {
        if let Some(language) = language.filter(|l| !l.trim().is_empty()) {
            self.code_language = Some(language);
        }
        self
    }

    pub fn language(&self) -> Result<Language, ConfigError> {
        let tag = self
            .code_language
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .ok_or(ConfigError::MissingLanguage)?;
        Ok(tag.parse::<Language>()?)
    }
}
