//! Markdown node tree for streaming rendering.
//!
//! The tree is rebuilt from the full accumulated source on every chunk, so
//! the model favours a plain owned enum over spans into the source. Two
//! properties matter to the streaming layer:
//!
//! - a trailing fenced block whose closing fence has not arrived yet is
//!   reported as a single [`CodeBlock`] with `loading = true`;
//! - "the last block" is tracked by document-order descent, never by
//!   scanning for any loading flag. Inline nodes are descended into but are
//!   never the last block.

mod builder;
mod normalize;

pub use builder::parse;
pub use normalize::normalize_stream;

/// A fenced or indented code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
    /// Closing fence not yet seen in the stream.
    pub loading: bool,
    /// Diff-flavoured (`diff` / `patch` info string).
    pub diff: bool,
}

impl CodeBlock {
    /// Code with at most one trailing newline removed; the form used for
    /// highlighting and cache keys.
    pub fn trimmed_code(&self) -> &str {
        self.code.strip_suffix('\n').unwrap_or(&self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Document { children: Vec<Node> },
    Paragraph { children: Vec<Node> },
    Heading { level: u8, children: Vec<Node> },
    BlockQuote { children: Vec<Node> },
    List { ordered: bool, start: u64, items: Vec<Node> },
    Item { children: Vec<Node> },
    CodeBlock(CodeBlock),
    Table { header: Box<Node>, rows: Vec<Node> },
    Row { cells: Vec<Node> },
    Cell { children: Vec<Node> },
    Rule,
    HtmlBlock { raw: String },
    FootnoteDefinition { label: String, children: Vec<Node> },

    // Inline kinds. Descended during walks, never "the last block".
    Text { text: String },
    Strong { children: Vec<Node> },
    Emphasis { children: Vec<Node> },
    Strikethrough { children: Vec<Node> },
    InlineCode { code: String },
    Link { url: String, children: Vec<Node> },
    Image { url: String, children: Vec<Node> },
    HardBreak,
    SoftBreak,
    FootnoteReference { label: String },
    TaskMarker { checked: bool },
    InlineHtml { raw: String },
}

impl Node {
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Node::Text { .. }
                | Node::Strong { .. }
                | Node::Emphasis { .. }
                | Node::Strikethrough { .. }
                | Node::InlineCode { .. }
                | Node::Link { .. }
                | Node::Image { .. }
                | Node::HardBreak
                | Node::SoftBreak
                | Node::FootnoteReference { .. }
                | Node::TaskMarker { .. }
                | Node::InlineHtml { .. }
        )
    }

    /// A block for the purposes of last-block tracking: anything that is
    /// neither inline nor the document root.
    fn is_block(&self) -> bool {
        !self.is_inline() && !matches!(self, Node::Document { .. })
    }

    /// Direct children in source order, across every container shape
    /// (`children`, `items`, `rows`, `cells`, `header`).
    pub fn child_nodes(&self) -> Vec<&Node> {
        match self {
            Node::Document { children }
            | Node::Paragraph { children }
            | Node::Heading { children, .. }
            | Node::BlockQuote { children }
            | Node::Item { children }
            | Node::Cell { children }
            | Node::FootnoteDefinition { children, .. }
            | Node::Strong { children }
            | Node::Emphasis { children }
            | Node::Strikethrough { children }
            | Node::Link { children, .. }
            | Node::Image { children, .. } => children.iter().collect(),
            Node::List { items, .. } => items.iter().collect(),
            Node::Table { header, rows } => {
                std::iter::once(header.as_ref()).chain(rows.iter()).collect()
            }
            Node::Row { cells } => cells.iter().collect(),
            _ => Vec::new(),
        }
    }

    fn child_nodes_mut(&mut self) -> Vec<&mut Node> {
        match self {
            Node::Document { children }
            | Node::Paragraph { children }
            | Node::Heading { children, .. }
            | Node::BlockQuote { children }
            | Node::Item { children }
            | Node::Cell { children }
            | Node::FootnoteDefinition { children, .. }
            | Node::Strong { children }
            | Node::Emphasis { children }
            | Node::Strikethrough { children }
            | Node::Link { children, .. }
            | Node::Image { children, .. } => children.iter_mut().collect(),
            Node::List { items, .. } => items.iter_mut().collect(),
            Node::Table { header, rows } => {
                std::iter::once(header.as_mut()).chain(rows.iter_mut()).collect()
            }
            Node::Row { cells } => cells.iter_mut().collect(),
            _ => Vec::new(),
        }
    }
}

/// The last block visited by a document-order descent, or `None` for a
/// document without blocks.
pub fn last_block(doc: &Node) -> Option<&Node> {
    let mut last = None;
    fn visit<'a>(node: &'a Node, last: &mut Option<&'a Node>) {
        if node.is_block() {
            *last = Some(node);
        }
        for child in node.child_nodes() {
            visit(child, last);
        }
    }
    visit(doc, &mut last);
    last
}

/// Mutable access to the node [`last_block`] would return.
pub fn last_block_mut(doc: &mut Node) -> Option<&mut Node> {
    fn subtree_has_block(node: &Node) -> bool {
        node.is_block() || node.child_nodes().iter().any(|c| subtree_has_block(c))
    }
    fn descend(node: &mut Node) -> Option<&mut Node> {
        let from_child = node
            .child_nodes()
            .iter()
            .rposition(|c| subtree_has_block(c));
        match from_child {
            Some(i) => descend(node.child_nodes_mut().swap_remove(i)),
            None if node.is_block() => Some(node),
            None => None,
        }
    }
    descend(doc)
}

/// The stream-authoritative loading block: the document-order-last block,
/// and only when that block is a code block still awaiting its fence.
/// Loading flags anywhere else in the tree are ignored.
pub fn trailing_loading_code_block(doc: &Node) -> Option<&CodeBlock> {
    match last_block(doc) {
        Some(Node::CodeBlock(block)) if block.loading => Some(block),
        _ => None,
    }
}

/// The last code block in document order, loading or not.
pub fn last_code_block(doc: &Node) -> Option<&CodeBlock> {
    let mut last = None;
    fn visit<'a>(node: &'a Node, last: &mut Option<&'a CodeBlock>) {
        if let Node::CodeBlock(block) = node {
            *last = Some(block);
        }
        for child in node.child_nodes() {
            visit(child, last);
        }
    }
    visit(doc, &mut last);
    last
}

/// Every code block in document order.
pub fn code_blocks(doc: &Node) -> Vec<&CodeBlock> {
    let mut out = Vec::new();
    fn visit<'a>(node: &'a Node, out: &mut Vec<&'a CodeBlock>) {
        if let Node::CodeBlock(block) = node {
            out.push(block);
        }
        for child in node.child_nodes() {
            visit(child, out);
        }
    }
    visit(doc, &mut out);
    out
}
