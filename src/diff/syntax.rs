use std::borrow::Cow;

/// Node kinds produced by the diff grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Source,
    Block,
    /// `diff --git a/x b/x`
    Command,
    /// Extended header lines such as `index`, `new file mode`, `rename from`.
    Header,
    OldFile,
    NewFile,
    Filename,
    Hunk,
    /// `@@ -a,b +c,d @@`
    Location,
    LineRange,
    Changes,
    ChangeLine,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    kind: NodeKind,
    start_byte: usize,
    end_byte: usize,
    children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub(crate) fn new(kind: NodeKind, start_byte: usize, end_byte: usize) -> Self {
        Self {
            kind,
            start_byte,
            end_byte,
            children: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, child: SyntaxNode) {
        if self.children.is_empty() && self.start_byte == self.end_byte {
            self.start_byte = child.start_byte;
        }
        self.end_byte = self.end_byte.max(child.end_byte);
        self.children.push(child);
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn start_byte(&self) -> usize {
        self.start_byte
    }

    pub fn end_byte(&self) -> usize {
        self.end_byte
    }

    pub fn children(&self) -> &[SyntaxNode] {
        &self.children
    }

    pub fn child_of_kind(&self, kind: NodeKind) -> Option<&SyntaxNode> {
        self.children.iter().find(|child| child.kind == kind)
    }

    pub fn is_error(&self) -> bool {
        self.kind == NodeKind::Error
    }

    /// True if this node or any descendant is an error node.
    pub fn has_error(&self) -> bool {
        self.is_error() || self.children.iter().any(SyntaxNode::has_error)
    }
}

/// Parsed patch: the source bytes plus the tree spanning them.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: Vec<u8>,
    root: SyntaxNode,
}

impl SyntaxTree {
    pub(crate) fn new(source: Vec<u8>, root: SyntaxNode) -> Self {
        Self { source, root }
    }

    pub fn root_node(&self) -> &SyntaxNode {
        &self.root
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn bytes(&self, node: &SyntaxNode) -> &[u8] {
        &self.source[node.start_byte..node.end_byte]
    }

    /// Node text, decoded lossily since patches may carry any encoding.
    pub fn text(&self, node: &SyntaxNode) -> Cow<'_, str> {
        String::from_utf8_lossy(self.bytes(node))
    }
}

/// Every node of `kind` at or below `node`.
///
/// Result order is whatever the traversal produced and must not be taken
/// as source order; use [`select`] when order matters.
pub fn captures(node: &SyntaxNode, kind: NodeKind) -> Vec<&SyntaxNode> {
    let mut found = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind == kind {
            found.push(current);
        }
        stack.extend(current.children.iter());
    }
    found
}

/// [`captures`] re-sorted by start byte, i.e. in source order.
pub fn select(node: &SyntaxNode, kind: NodeKind) -> Vec<&SyntaxNode> {
    let mut found = captures(node, kind);
    found.sort_by_key(|n| n.start_byte);
    found
}
