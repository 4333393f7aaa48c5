use std::sync::LazyLock;

use regex::bytes::Regex;
use tracing::{debug, trace};

use super::syntax::{NodeKind, SyntaxNode, SyntaxTree};

static LINE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+][0-9]+(?:,[0-9]+)?$").expect("line range pattern is valid")
});

#[derive(Debug, Clone, Copy)]
struct Line {
    start: usize,
    /// Exclusive, not counting the newline.
    end: usize,
}

/// Parser for the unified diff grammar.
///
/// Never fails: input that does not fit the grammar ends up in error nodes
/// or is skipped, and consumers decide whether what is left is usable.
#[derive(Debug, Default)]
pub struct DiffParser {
    lines: Vec<Line>,
}

impl DiffParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&mut self, source: &[u8]) -> SyntaxTree {
        self.split_lines(source);

        let mut builder = TreeBuilder::default();
        let mut index = 0;
        while index < self.lines.len() {
            let line = self.lines[index];
            let bytes = &source[line.start..line.end];

            if bytes.starts_with(b"diff ") {
                builder.open_block(line.start);
                builder.block_push(line, SyntaxNode::new(NodeKind::Command, line.start, line.end));
                index += 1;
                continue;
            }

            if bytes.starts_with(b"--- ") && !builder.hunk_expects_lines() {
                let next = self.lines.get(index + 1).copied();
                if let Some(next) = next.filter(|n| source[n.start..n.end].starts_with(b"+++ ")) {
                    builder.close_hunk();
                    if builder.block_has_files_or_hunks() {
                        builder.open_block(line.start);
                    }
                    builder.block_push(line, file_header(source, line, NodeKind::OldFile));
                    builder.block_push(next, file_header(source, next, NodeKind::NewFile));
                    index += 2;
                    continue;
                }
            }

            if bytes.starts_with(b"@@") {
                let location = location(source, line);
                let counts = hunk_counts(source, &location);
                builder.open_hunk(line, location, counts);
                index += 1;
                continue;
            }

            if builder.in_hunk() {
                match bytes.first() {
                    marker @ (None | Some(b' ') | Some(b'+') | Some(b'-')) => {
                        builder.push_change(line, marker.copied());
                        index += 1;
                        continue;
                    }
                    // "\ No newline at end of file"
                    Some(b'\\') => {
                        index += 1;
                        continue;
                    }
                    _ => builder.close_hunk(),
                }
            }

            if builder.in_block() {
                builder.block_push(line, SyntaxNode::new(NodeKind::Header, line.start, line.end));
            } else {
                trace!(offset = line.start, "skipping preamble line");
            }
            index += 1;
        }

        let root = builder.finish(source.len());
        debug!(
            bytes = source.len(),
            lines = self.lines.len(),
            blocks = root.children().len(),
            "parsed diff"
        );
        SyntaxTree::new(source.to_vec(), root)
    }

    fn split_lines(&mut self, source: &[u8]) {
        self.lines.clear();
        let mut start = 0;
        for (offset, byte) in source.iter().enumerate() {
            if *byte == b'\n' {
                self.lines.push(Line { start, end: offset });
                start = offset + 1;
            }
        }
        if start < source.len() {
            self.lines.push(Line {
                start,
                end: source.len(),
            });
        }
    }
}

/// `--- name` / `+++ name`, with the name cut at the first tab.
fn file_header(source: &[u8], line: Line, kind: NodeKind) -> SyntaxNode {
    let mut header = SyntaxNode::new(kind, line.start, line.end);
    let name_start = line.start + 4;
    let rest = &source[name_start..line.end];
    let rest = match rest.iter().position(|b| *b == b'\t') {
        Some(tab) => &rest[..tab],
        None => rest,
    };
    let name_len = rest.trim_ascii_end().len();
    if name_len == 0 {
        header.push(SyntaxNode::new(NodeKind::Error, name_start, line.end));
    } else {
        header.push(SyntaxNode::new(NodeKind::Filename, name_start, name_start + name_len));
    }
    header
}

/// `@@ -a[,b] +c[,d] @@ optional section heading`
fn location(source: &[u8], line: Line) -> SyntaxNode {
    let bytes = &source[line.start..line.end];
    let body_start = 2;
    let closing = bytes[body_start..]
        .windows(2)
        .position(|w| w == b"@@")
        .map(|pos| body_start + pos);
    let body_end = closing.unwrap_or(bytes.len());

    let mut node = SyntaxNode::new(
        NodeKind::Location,
        line.start,
        line.start + closing.map_or(bytes.len(), |pos| pos + 2),
    );

    let mut offset = body_start;
    for token in bytes[body_start..body_end].split(|b| b.is_ascii_whitespace()) {
        if !token.is_empty() {
            let start = line.start + offset;
            let kind = if LINE_RANGE.is_match(token) {
                NodeKind::LineRange
            } else {
                NodeKind::Error
            };
            node.push(SyntaxNode::new(kind, start, start + token.len()));
        }
        offset += token.len() + 1;
    }

    if closing.is_none() {
        node.push(SyntaxNode::new(NodeKind::Error, line.end, line.end));
    }
    node
}

/// Old and new line counts from `@@ -a,b +c,d @@`. A range without a comma
/// counts one line.
fn hunk_counts(source: &[u8], location: &SyntaxNode) -> LineCounts {
    let mut counts = LineCounts::default();
    for range in location.children() {
        if range.kind() != NodeKind::LineRange {
            continue;
        }
        let token = &source[range.start_byte()..range.end_byte()];
        let slot = match token.first() {
            Some(b'-') => &mut counts.old,
            Some(b'+') => &mut counts.new,
            _ => continue,
        };
        if slot.is_none() {
            *slot = range_count(&token[1..]);
        }
    }
    counts
}

fn range_count(range: &[u8]) -> Option<usize> {
    match range.iter().position(|b| *b == b',') {
        Some(comma) => std::str::from_utf8(&range[comma + 1..]).ok()?.parse().ok(),
        None => Some(1),
    }
}

/// Body lines a hunk header announces and that have not been seen yet.
/// `None` when the header carries no usable count for that side.
#[derive(Debug, Default, Clone, Copy)]
struct LineCounts {
    old: Option<usize>,
    new: Option<usize>,
}

impl LineCounts {
    fn pending(&self) -> bool {
        self.old.is_some_and(|n| n > 0) || self.new.is_some_and(|n| n > 0)
    }

    fn consume(&mut self, marker: Option<u8>) {
        let (old, new) = match marker {
            Some(b'-') => (1, 0),
            Some(b'+') => (0, 1),
            _ => (1, 1),
        };
        self.old = self.old.map(|n| n.saturating_sub(old));
        self.new = self.new.map(|n| n.saturating_sub(new));
    }
}

struct OpenHunk {
    node: SyntaxNode,
    changes: SyntaxNode,
    remaining: LineCounts,
}

#[derive(Default)]
struct TreeBuilder {
    blocks: Vec<SyntaxNode>,
    block: Option<SyntaxNode>,
    hunk: Option<OpenHunk>,
}

impl TreeBuilder {
    fn in_block(&self) -> bool {
        self.block.is_some()
    }

    fn in_hunk(&self) -> bool {
        self.hunk.is_some()
    }

    /// The open hunk's header announces body lines not seen yet, so a
    /// `--- `/`+++ ` pair is still part of the body.
    fn hunk_expects_lines(&self) -> bool {
        self.hunk.as_ref().is_some_and(|hunk| hunk.remaining.pending())
    }

    fn block_has_files_or_hunks(&self) -> bool {
        self.block.as_ref().is_some_and(|block| {
            block.children().iter().any(|child| {
                matches!(
                    child.kind(),
                    NodeKind::OldFile | NodeKind::NewFile | NodeKind::Hunk
                )
            })
        })
    }

    fn open_block(&mut self, start: usize) {
        self.close_block();
        self.block = Some(SyntaxNode::new(NodeKind::Block, start, start));
    }

    fn block_push(&mut self, line: Line, child: SyntaxNode) {
        self.block
            .get_or_insert_with(|| SyntaxNode::new(NodeKind::Block, line.start, line.start))
            .push(child);
    }

    fn open_hunk(&mut self, line: Line, location: SyntaxNode, remaining: LineCounts) {
        self.close_hunk();
        let mut node = SyntaxNode::new(NodeKind::Hunk, line.start, line.end);
        node.push(location);
        self.hunk = Some(OpenHunk {
            node,
            changes: SyntaxNode::new(NodeKind::Changes, line.end, line.end),
            remaining,
        });
    }

    fn push_change(&mut self, line: Line, marker: Option<u8>) {
        if let Some(hunk) = self.hunk.as_mut() {
            hunk.changes
                .push(SyntaxNode::new(NodeKind::ChangeLine, line.start, line.end));
            hunk.remaining.consume(marker);
        }
    }

    fn close_hunk(&mut self) {
        if let Some(OpenHunk { mut node, changes, .. }) = self.hunk.take() {
            let start = node.start_byte();
            node.push(changes);
            self.block_push(
                Line {
                    start,
                    end: node.end_byte(),
                },
                node,
            );
        }
    }

    fn close_block(&mut self) {
        self.close_hunk();
        if let Some(block) = self.block.take() {
            self.blocks.push(block);
        }
    }

    fn finish(mut self, len: usize) -> SyntaxNode {
        self.close_block();
        let mut root = SyntaxNode::new(NodeKind::Source, 0, len);
        for block in self.blocks {
            root.push(block);
        }
        root
    }
}
