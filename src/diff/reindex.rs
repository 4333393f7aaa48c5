use super::syntax::{select, NodeKind, SyntaxNode, SyntaxTree};
use super::DiffError;
use crate::digest::ChangeKind;

/// A changed line with its zero-based coordinate, before identifier
/// extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedLine {
    pub line: usize,
    pub kind: ChangeKind,
    pub text: String,
}

/// One-based start lines from a hunk's `@@` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRanges {
    pub old_start: usize,
    pub new_start: usize,
}

/// Text of the hunk's `@@ ... @@` header, used to name it in errors.
pub fn hunk_header(tree: &SyntaxTree, hunk: &SyntaxNode) -> String {
    match hunk.child_of_kind(NodeKind::Location) {
        Some(location) => tree.text(location).trim_end().to_string(),
        None => String::from("<missing header>"),
    }
}

pub fn hunk_ranges(tree: &SyntaxTree, hunk: &SyntaxNode) -> Result<HunkRanges, DiffError> {
    let malformed = |reason: &str| DiffError::MalformedHunk {
        header: hunk_header(tree, hunk),
        reason: reason.to_string(),
    };

    let location = hunk
        .child_of_kind(NodeKind::Location)
        .ok_or_else(|| malformed("missing location header"))?;

    let mut old_start = None;
    let mut new_start = None;
    for range in select(location, NodeKind::LineRange) {
        let text = tree.text(range);
        let slot = match text.as_bytes().first() {
            Some(b'-') => &mut old_start,
            Some(b'+') => &mut new_start,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(parse_range_start(&text).ok_or_else(|| {
                malformed(&format!("unparsable line range `{text}`"))
            })?);
        }
    }

    Ok(HunkRanges {
        old_start: old_start.ok_or_else(|| malformed("missing old line range"))?,
        new_start: new_start.ok_or_else(|| malformed("missing new line range"))?,
    })
}

/// `-12,5` -> 12. The count after the comma is not needed for indexing.
fn parse_range_start(range: &str) -> Option<usize> {
    let digits = range.get(1..)?;
    let start = digits.split(',').next()?;
    start.parse().ok()
}

/// Walk the hunk body and assign every added or deleted line its zero-based
/// line in the new or old file respectively.
pub fn reindex_hunk(tree: &SyntaxTree, hunk: &SyntaxNode) -> Result<Vec<IndexedLine>, DiffError> {
    let HunkRanges {
        old_start,
        new_start,
    } = hunk_ranges(tree, hunk)?;
    let mut old_cursor = old_start;
    let mut new_cursor = new_start;

    let Some(changes) = select(hunk, NodeKind::Changes).into_iter().next() else {
        return Ok(Vec::new());
    };

    let overflow = || DiffError::MalformedHunk {
        header: hunk_header(tree, hunk),
        reason: "line range overflows".to_string(),
    };

    let mut lines = Vec::new();
    for change in select(changes, NodeKind::ChangeLine) {
        let raw = tree.bytes(change);
        let kind = match raw.first() {
            Some(b'+') => ChangeKind::Addition,
            Some(b'-') => ChangeKind::Deletion,
            _ => {
                old_cursor = old_cursor.checked_add(1).ok_or_else(overflow)?;
                new_cursor = new_cursor.checked_add(1).ok_or_else(overflow)?;
                continue;
            }
        };

        let cursor = match kind {
            ChangeKind::Addition => &mut new_cursor,
            ChangeKind::Deletion => &mut old_cursor,
        };
        let line = cursor.checked_sub(1).ok_or_else(|| DiffError::MalformedHunk {
            header: hunk_header(tree, hunk),
            reason: format!("{kind} before line 1 of the file"),
        })?;
        *cursor = cursor.checked_add(1).ok_or_else(overflow)?;

        lines.push(IndexedLine {
            line,
            kind,
            text: String::from_utf8_lossy(&raw[1..]).trim_end().to_string(),
        });
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffParser;

    fn first_hunk(patch: &str) -> (SyntaxTree, SyntaxNode) {
        let tree = DiffParser::new().parse(patch.as_bytes());
        let hunk = select(tree.root_node(), NodeKind::Hunk)[0].clone();
        (tree, hunk)
    }

    #[test]
    fn test_context_advances_both_cursors() {
        let (tree, hunk) = first_hunk("--- a.py\n+++ a.py\n@@ -1,2 +1,3 @@\n x = 1\n-y = 2\n+y = 3\n+z = y + 1\n");
        let lines = reindex_hunk(&tree, &hunk).unwrap();
        assert_eq!(
            lines,
            vec![
                IndexedLine { line: 1, kind: ChangeKind::Deletion, text: "y = 2".into() },
                IndexedLine { line: 1, kind: ChangeKind::Addition, text: "y = 3".into() },
                IndexedLine { line: 2, kind: ChangeKind::Addition, text: "z = y + 1".into() },
            ]
        );
    }

    #[test]
    fn test_consecutive_changes_count_up_from_start() {
        let (tree, hunk) = first_hunk("--- a\n+++ b\n@@ -7,3 +9,2 @@\n-a\n-b\n-c\n+d\n+e\n");
        let lines = reindex_hunk(&tree, &hunk).unwrap();
        let deletions: Vec<usize> = lines
            .iter()
            .filter(|l| l.kind == ChangeKind::Deletion)
            .map(|l| l.line)
            .collect();
        let additions: Vec<usize> = lines
            .iter()
            .filter(|l| l.kind == ChangeKind::Addition)
            .map(|l| l.line)
            .collect();
        assert_eq!(deletions, vec![6, 7, 8]);
        assert_eq!(additions, vec![8, 9]);
    }

    #[test]
    fn test_blank_lines_and_indentation() {
        let (tree, hunk) = first_hunk("--- a\n+++ b\n@@ -1 +1,3 @@\n\n+    return x   \r\n+\n");
        let lines = reindex_hunk(&tree, &hunk).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line, 1);
        assert_eq!(lines[0].text, "    return x");
        assert_eq!(lines[1].line, 2);
        assert_eq!(lines[1].text, "");
    }

    #[test]
    fn test_context_with_marker_like_content() {
        let (tree, hunk) = first_hunk("--- a\n+++ b\n@@ -1,2 +1,2 @@\n -x\n-y\n+z\n");
        let lines = reindex_hunk(&tree, &hunk).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line, 1);
        assert_eq!(lines[0].kind, ChangeKind::Deletion);
    }

    #[test]
    fn test_ranges_without_counts() {
        let (tree, hunk) = first_hunk("--- a\n+++ b\n@@ -4 +5 @@\n-a\n+b\n");
        assert_eq!(
            hunk_ranges(&tree, &hunk).unwrap(),
            HunkRanges { old_start: 4, new_start: 5 }
        );
    }

    #[test]
    fn test_missing_range_is_malformed() {
        let (tree, hunk) = first_hunk("--- a\n+++ b\n@@ -x +1,2 @@\n+new\n");
        let err = reindex_hunk(&tree, &hunk).unwrap_err();
        match err {
            DiffError::MalformedHunk { header, reason } => {
                assert_eq!(header, "@@ -x +1,2 @@");
                assert_eq!(reason, "missing old line range");
            }
        }
    }

    #[test]
    fn test_oversized_range_is_malformed() {
        let (tree, hunk) = first_hunk("--- a\n+++ b\n@@ -1 +99999999999999999999999 @@\n+new\n");
        assert!(reindex_hunk(&tree, &hunk).is_err());
    }

    #[test]
    fn test_range_at_usize_max_overflows() {
        let (tree, hunk) = first_hunk("--- a\n+++ b\n@@ -1 +18446744073709551615 @@\n x\n+y\n");
        let err = reindex_hunk(&tree, &hunk).unwrap_err();
        match err {
            DiffError::MalformedHunk { header, reason } => {
                assert_eq!(header, "@@ -1 +18446744073709551615 @@");
                assert_eq!(reason, "line range overflows");
            }
        }
    }

    #[test]
    fn test_addition_on_last_representable_line_overflows() {
        let (tree, hunk) = first_hunk("--- a\n+++ b\n@@ -1 +18446744073709551615 @@\n+y\n");
        assert!(reindex_hunk(&tree, &hunk).is_err());
    }

    #[test]
    fn test_addition_at_line_zero_is_malformed() {
        let (tree, hunk) = first_hunk("--- a\n+++ b\n@@ -0,0 +0,0 @@\n+new\n");
        let err = reindex_hunk(&tree, &hunk).unwrap_err();
        assert!(err.to_string().contains("addition before line 1"));
    }

    #[test]
    fn test_new_file_hunk() {
        let (tree, hunk) = first_hunk("--- /dev/null\n+++ b\n@@ -0,0 +1,2 @@\n+a\n+b\n");
        let lines: Vec<usize> = reindex_hunk(&tree, &hunk).unwrap().iter().map(|l| l.line).collect();
        assert_eq!(lines, vec![0, 1]);
    }
}
