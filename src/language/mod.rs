pub mod registry;

pub use registry::{diff_parser, get_language_parser, LanguageParser, SourceParser};

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("Unsupported language: {0}")]
    Unsupported(String),

    #[error("Failed to load {language} grammar: {reason}")]
    Grammar { language: Language, reason: String },
}

/// Languages with a registered grammar.
///
/// Names are the canonical ones reported by workspace language detection
/// and are matched case-sensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Rust,
    /// The unified-diff patch grammar itself.
    Diff,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::Rust, Language::Diff];

    pub fn name(self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::Rust => "Rust",
            Language::Diff => "Diff",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = LanguageError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|language| language.name() == tag)
            .ok_or_else(|| LanguageError::Unsupported(tag.to_string()))
    }
}

pub fn is_language_supported(tag: &str) -> bool {
    tag.parse::<Language>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_names() {
        assert_eq!("Python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("Rust".parse::<Language>().unwrap(), Language::Rust);
        assert_eq!("Diff".parse::<Language>().unwrap(), Language::Diff);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert!(!is_language_supported("python"));
        assert!(!is_language_supported("DIFF"));
        assert!(is_language_supported("Python"));
    }

    #[test]
    fn test_unknown_language_error() {
        let err = "Cobol".parse::<Language>().unwrap_err();
        assert!(matches!(err, LanguageError::Unsupported(ref tag) if tag == "Cobol"));
        assert_eq!(err.to_string(), "Unsupported language: Cobol");
    }

    #[test]
    fn test_display_round_trips_name() {
        for language in Language::ALL {
            assert_eq!(language.to_string().parse::<Language>().unwrap(), language);
        }
    }
}
