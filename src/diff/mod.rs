pub mod parser;
pub mod reindex;
pub mod syntax;

pub use parser::DiffParser;
pub use reindex::{hunk_header, reindex_hunk, IndexedLine};
pub use syntax::{select, NodeKind, SyntaxNode, SyntaxTree};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("Malformed hunk `{header}`: {reason}")]
    MalformedHunk { header: String, reason: String },
}

/// Filename from a block's `---` or `+++` header, if the block has one.
pub fn block_file(tree: &SyntaxTree, block: &SyntaxNode, side: NodeKind) -> Option<String> {
    let header = block.child_of_kind(side)?;
    let name = select(header, NodeKind::Filename).into_iter().next()?;
    Some(tree.text(name).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_file_sides() {
        let tree = DiffParser::new().parse(b"--- /dev/null\n+++ b/new.py\n@@ -0,0 +1 @@\n+x\n");
        let block = select(tree.root_node(), NodeKind::Block)[0];
        assert_eq!(block_file(&tree, block, NodeKind::OldFile).as_deref(), Some("/dev/null"));
        assert_eq!(block_file(&tree, block, NodeKind::NewFile).as_deref(), Some("b/new.py"));
    }

    #[test]
    fn test_block_file_missing_header() {
        let tree = DiffParser::new().parse(b"@@ -1 +1 @@\n-x\n+y\n");
        let block = select(tree.root_node(), NodeKind::Block)[0];
        assert_eq!(block_file(&tree, block, NodeKind::OldFile), None);
        assert_eq!(block_file(&tree, block, NodeKind::NewFile), None);
    }
}
