//! `pulldown-cmark` event stream → node tree.
//!
//! The builder keeps a frame stack mirroring the open tags. Every `Start`
//! pushes a frame and every `End` pops one, so the two always balance even
//! for tags this model has no shape for: those become passthrough frames
//! whose children splice into the parent.

use crate::{CodeBlock, Node, last_block_mut};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

/// Parse the (normalised) accumulated source into a document node.
///
/// A trailing fence left open by the stream marks the document-order-last
/// block as `loading` when that block is a code block.
pub fn parse(source: &str) -> Node {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(source, options) {
        builder.push_event(event);
    }
    let mut doc = builder.finish();

    if ends_inside_fence(source)
        && let Some(Node::CodeBlock(block)) = last_block_mut(&mut doc)
    {
        block.loading = true;
    }
    doc
}

enum Pending {
    Document,
    Paragraph,
    Heading(u8),
    BlockQuote,
    List { ordered: bool, start: u64 },
    Item,
    CodeBlock { language: String, code: String },
    Table { header: Option<Node>, rows: Vec<Node> },
    TableHead,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link { url: String },
    Image { url: String },
    FootnoteDefinition { label: String },
    HtmlBlock { raw: String },
    Passthrough,
}

struct Frame {
    pending: Pending,
    children: Vec<Node>,
}

impl Frame {
    fn new(pending: Pending) -> Self {
        Self {
            pending,
            children: Vec::new(),
        }
    }
}

struct TreeBuilder {
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame::new(Pending::Document)],
        }
    }

    fn push_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.push_child(Node::InlineCode {
                code: code.into_string(),
            }),
            Event::Html(html) => self.html(&html),
            Event::InlineHtml(html) => self.push_child(Node::InlineHtml {
                raw: html.into_string(),
            }),
            Event::SoftBreak => self.push_child(Node::SoftBreak),
            Event::HardBreak => self.push_child(Node::HardBreak),
            Event::Rule => self.push_child(Node::Rule),
            Event::FootnoteReference(label) => self.push_child(Node::FootnoteReference {
                label: label.into_string(),
            }),
            Event::TaskListMarker(checked) => self.push_child(Node::TaskMarker { checked }),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let pending = match tag {
            Tag::Paragraph => Pending::Paragraph,
            Tag::Heading { level, .. } => Pending::Heading(heading_rank(level)),
            Tag::BlockQuote(_) => Pending::BlockQuote,
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                Pending::CodeBlock {
                    language,
                    code: String::new(),
                }
            }
            Tag::List(start) => Pending::List {
                ordered: start.is_some(),
                start: start.unwrap_or(1),
            },
            Tag::Item => Pending::Item,
            Tag::FootnoteDefinition(label) => Pending::FootnoteDefinition {
                label: label.into_string(),
            },
            Tag::Table(_) => Pending::Table {
                header: None,
                rows: Vec::new(),
            },
            Tag::TableHead => Pending::TableHead,
            Tag::TableRow => Pending::TableRow,
            Tag::TableCell => Pending::TableCell,
            Tag::Emphasis => Pending::Emphasis,
            Tag::Strong => Pending::Strong,
            Tag::Strikethrough => Pending::Strikethrough,
            Tag::Link { dest_url, .. } => Pending::Link {
                url: dest_url.into_string(),
            },
            Tag::Image { dest_url, .. } => Pending::Image {
                url: dest_url.into_string(),
            },
            Tag::HtmlBlock => Pending::HtmlBlock { raw: String::new() },
            _ => Pending::Passthrough,
        };
        self.stack.push(Frame::new(pending));
    }

    fn end(&mut self) {
        // The document frame stays at the bottom; tag events balance above it.
        if self.stack.len() < 2 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let children = frame.children;
        match frame.pending {
            Pending::Document => {}
            Pending::Paragraph => self.push_child(Node::Paragraph { children }),
            Pending::Heading(level) => self.push_child(Node::Heading { level, children }),
            Pending::BlockQuote => self.push_child(Node::BlockQuote { children }),
            Pending::List { ordered, start } => self.push_child(Node::List {
                ordered,
                start,
                items: children,
            }),
            Pending::Item => self.push_child(Node::Item { children }),
            Pending::CodeBlock { language, code } => {
                let diff = matches!(language.as_str(), "diff" | "patch");
                self.push_child(Node::CodeBlock(CodeBlock {
                    language,
                    code,
                    loading: false,
                    diff,
                }));
            }
            Pending::Table { header, rows } => {
                let header = header.unwrap_or(Node::Row { cells: Vec::new() });
                self.push_child(Node::Table {
                    header: Box::new(header),
                    rows,
                });
            }
            Pending::TableHead => {
                let row = Node::Row { cells: children };
                if let Pending::Table { header, .. } = &mut self.top().pending {
                    *header = Some(row);
                }
            }
            Pending::TableRow => {
                let row = Node::Row { cells: children };
                if let Pending::Table { rows, .. } = &mut self.top().pending {
                    rows.push(row);
                }
            }
            Pending::TableCell => self.push_child(Node::Cell { children }),
            Pending::Emphasis => self.push_child(Node::Emphasis { children }),
            Pending::Strong => self.push_child(Node::Strong { children }),
            Pending::Strikethrough => self.push_child(Node::Strikethrough { children }),
            Pending::Link { url } => self.push_child(Node::Link { url, children }),
            Pending::Image { url } => self.push_child(Node::Image { url, children }),
            Pending::FootnoteDefinition { label } => {
                self.push_child(Node::FootnoteDefinition { label, children })
            }
            Pending::HtmlBlock { raw } => self.push_child(Node::HtmlBlock { raw }),
            Pending::Passthrough => self.top().children.extend(children),
        }
    }

    fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.end();
        }
        let root = self.stack.pop();
        Node::Document {
            children: root.map(|f| f.children).unwrap_or_default(),
        }
    }

    /// Text lands in the open code block or HTML block when one is on top
    /// of the stack, otherwise becomes a text node.
    fn text(&mut self, text: &str) {
        let top = self.top();
        match &mut top.pending {
            Pending::CodeBlock { code, .. } => code.push_str(text),
            Pending::HtmlBlock { raw } => raw.push_str(text),
            _ => top.children.push(Node::Text {
                text: text.to_string(),
            }),
        }
    }

    fn html(&mut self, html: &str) {
        let top = self.top();
        match &mut top.pending {
            Pending::HtmlBlock { raw } => raw.push_str(html),
            _ => top.children.push(Node::HtmlBlock {
                raw: html.to_string(),
            }),
        }
    }

    fn top(&mut self) -> &mut Frame {
        // The stack is never empty: the document frame is pushed at
        // construction and `end` refuses to pop it.
        self.stack.last_mut().expect("document frame present")
    }

    fn push_child(&mut self, node: Node) {
        self.top().children.push(node);
    }
}

fn heading_rank(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Line scan of the raw source: does it end inside an open fence?
///
/// Tracks the fence character and run length so `~~~` cannot close a
/// backtick fence and a longer opener requires an equally long closer.
fn ends_inside_fence(source: &str) -> bool {
    let mut open: Option<(u8, usize)> = None;
    for line in source.lines() {
        let trimmed = line.trim_start_matches(' ');
        let indent = line.len() - trimmed.len();
        if indent > 3 {
            continue;
        }
        let Some(&first) = trimmed.as_bytes().first() else {
            continue;
        };
        if first != b'`' && first != b'~' {
            continue;
        }
        let run = trimmed.bytes().take_while(|&b| b == first).count();
        if run < 3 {
            continue;
        }
        match open {
            None => {
                // Backtick info strings may not contain further backticks.
                if first == b'`' && trimmed[run..].contains('`') {
                    continue;
                }
                open = Some((first, run));
            }
            Some((ch, len)) => {
                if first == ch && run >= len && trimmed[run..].trim().is_empty() {
                    open = None;
                }
                // A fence line of the other character is block content.
            }
        }
    }
    open.is_some()
}
