use tracing::debug;
use tree_sitter::{Parser, Query};

use super::{Language, LanguageError};
use crate::diff::DiffParser;

/// Query selecting the identifier-class tokens of each source grammar.
const PYTHON_IDENTIFIERS: &str = "(identifier) @identifier";
const RUST_IDENTIFIERS: &str =
    "[(identifier) (type_identifier) (field_identifier)] @identifier";

/// A ready-to-use parser for one registered grammar.
///
/// Parsers keep internal parse state, so every digest obtains its own
/// instances instead of sharing them.
#[derive(Debug)]
pub enum LanguageParser {
    Diff(DiffParser),
    Source(SourceParser),
}

impl LanguageParser {
    pub fn language(&self) -> Language {
        match self {
            LanguageParser::Diff(_) => Language::Diff,
            LanguageParser::Source(source) => source.language,
        }
    }

    pub fn into_diff(self) -> Option<DiffParser> {
        match self {
            LanguageParser::Diff(parser) => Some(parser),
            LanguageParser::Source(_) => None,
        }
    }
}

/// A tree-sitter parser bound to a source grammar, with its compiled
/// identifier query.
pub struct SourceParser {
    pub(crate) language: Language,
    pub(crate) parser: Parser,
    pub(crate) identifiers: Query,
}

impl std::fmt::Debug for SourceParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceParser")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

fn grammar_for(language: Language) -> Option<(tree_sitter::Language, &'static str)> {
    match language {
        Language::Python => Some((tree_sitter_python::LANGUAGE.into(), PYTHON_IDENTIFIERS)),
        Language::Rust => Some((tree_sitter_rust::LANGUAGE.into(), RUST_IDENTIFIERS)),
        Language::Diff => None,
    }
}

/// The diff grammar is built in and always loads.
pub fn diff_parser() -> DiffParser {
    DiffParser::new()
}

/// Build a fresh parser for `language`.
///
/// Nothing is returned unless both the grammar and its identifier query
/// loaded successfully.
pub fn get_language_parser(language: Language) -> Result<LanguageParser, LanguageError> {
    let Some((grammar, query_source)) = grammar_for(language) else {
        debug!(%language, "resolved diff grammar");
        return Ok(LanguageParser::Diff(diff_parser()));
    };

    let mut parser = Parser::new();
    parser
        .set_language(&grammar)
        .map_err(|e| LanguageError::Grammar {
            language,
            reason: e.to_string(),
        })?;
    let identifiers = Query::new(&grammar, query_source).map_err(|e| LanguageError::Grammar {
        language,
        reason: format!("identifier query: {e}"),
    })?;

    debug!(%language, "resolved source grammar");
    Ok(LanguageParser::Source(SourceParser {
        language,
        parser,
        identifiers,
    }))
}

/// Resolve a language tag straight to a parser.
pub fn resolve(tag: &str) -> Result<LanguageParser, LanguageError> {
    get_language_parser(tag.parse()?)
}
