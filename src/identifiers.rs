use tracing::warn;
use tree_sitter::{QueryCursor, StreamingIterator};

use crate::digest::Identifier;
use crate::language::{LanguageParser, SourceParser};

/// Identifiers on a single line, ordered by column.
///
/// The line is parsed on its own, so it is usually not a complete statement;
/// tokens inside error regions are still reported. A line the grammar cannot
/// parse at all yields no identifiers rather than an error.
pub fn extract_identifiers(parser: &mut LanguageParser, line: &str) -> Vec<Identifier> {
    match parser {
        LanguageParser::Source(source) => source.identifiers_in(line),
        LanguageParser::Diff(_) => Vec::new(),
    }
}

impl SourceParser {
    pub fn identifiers_in(&mut self, line: &str) -> Vec<Identifier> {
        if line.trim().is_empty() {
            return Vec::new();
        }

        let Some(tree) = self.parser.parse(line, None) else {
            warn!(language = %self.language, line, "grammar failed to parse line");
            return Vec::new();
        };

        let mut found: Vec<(usize, &str)> = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.identifiers, tree.root_node(), line.as_bytes());
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let node = capture.node;
                if node.is_missing() {
                    continue;
                }
                match node.utf8_text(line.as_bytes()) {
                    Ok(name) if !name.is_empty() => found.push((node.start_byte(), name)),
                    _ => {}
                }
            }
        }

        found.sort_by_key(|(start, _)| *start);
        found.dedup_by_key(|(start, _)| *start);
        found
            .into_iter()
            .filter_map(|(start, name)| {
                Some(Identifier {
                    name: name.to_string(),
                    character: utf16_column(line, start)?,
                })
            })
            .collect()
    }
}

/// Byte offset within `line` to a UTF-16 column.
fn utf16_column(line: &str, byte: usize) -> Option<usize> {
    line.get(..byte).map(|prefix| prefix.encode_utf16().count())
}
