//! Block and inline pretty-printing.

use crate::style::Style;
use crate::theme::Theme;
use core_markdown::{CodeBlock, Node};
use core_text::visible_width;

/// Options for one render pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    pub theme: &'a Theme,
    pub color: bool,
    /// Width used for thematic breaks; table columns size to content.
    pub width: Option<usize>,
    /// Omit the closing fence of the trailing loading code block.
    pub streaming: bool,
}

/// Cache-style lookup consulted for every non-loading code block. `None`
/// renders the plain (or diff-coloured) body.
pub type HighlightLookup<'a> = dyn FnMut(&str, &str) -> Option<String> + 'a;

/// Render a document to styled text ending in exactly one `\n`.
/// An empty document renders to the empty string.
pub fn render_tree(
    doc: &Node,
    opts: &RenderOptions<'_>,
    highlight: &mut HighlightLookup<'_>,
) -> String {
    let mut cx = RenderCx { opts, highlight };
    let blocks = match doc {
        Node::Document { children } => cx.render_mixed(children, "\n\n"),
        other => cx.render_mixed(std::slice::from_ref(other), "\n\n"),
    };
    if blocks.is_empty() {
        return String::new();
    }
    let mut out = blocks;
    out.push('\n');
    out
}

struct RenderCx<'a, 'b> {
    opts: &'a RenderOptions<'a>,
    highlight: &'a mut HighlightLookup<'b>,
}

impl RenderCx<'_, '_> {
    fn theme(&self) -> &Theme {
        self.opts.theme
    }

    fn color(&self) -> bool {
        self.opts.color
    }

    /// Render a mixed child list: consecutive inline nodes form one
    /// segment, block nodes render on their own, segments joined by `sep`.
    /// Tight list items carry bare inline children, which is why block
    /// containers cannot assume block-only content.
    fn render_mixed(&mut self, children: &[Node], sep: &str) -> String {
        let mut segments: Vec<String> = Vec::new();
        let mut run: Vec<&Node> = Vec::new();
        for child in children {
            if child.is_inline() {
                run.push(child);
            } else {
                if !run.is_empty() {
                    segments.push(self.render_inline_run(&run));
                    run.clear();
                }
                if let Some(block) = self.render_block(child) {
                    segments.push(block);
                }
            }
        }
        if !run.is_empty() {
            segments.push(self.render_inline_run(&run));
        }
        segments.join(sep)
    }

    fn render_block(&mut self, node: &Node) -> Option<String> {
        match node {
            Node::Paragraph { children } => Some(self.render_inline(children)),
            Node::Heading { level, children } => {
                let text = format!(
                    "{} {}",
                    "#".repeat(usize::from(*level)),
                    self.render_inline(children)
                );
                Some(self.theme().heading.paint(&text, self.color()))
            }
            Node::BlockQuote { children } => {
                let inner = self.render_mixed(children, "\n\n");
                let marker = self.theme().blockquote.paint(">", self.color());
                Some(
                    inner
                        .split('\n')
                        .map(|line| {
                            if line.is_empty() {
                                marker.clone()
                            } else {
                                format!("{marker} {line}")
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n"),
                )
            }
            Node::List {
                ordered,
                start,
                items,
            } => Some(self.render_list(*ordered, *start, items)),
            Node::Item { children } => Some(self.render_mixed(children, "\n")),
            Node::CodeBlock(block) => Some(self.render_code_block(block)),
            Node::Table { header, rows } => Some(self.render_table(header, rows)),
            Node::Rule => {
                let width = self.opts.width.unwrap_or(3).max(1);
                Some(self.theme().rule.paint(&"─".repeat(width), self.color()))
            }
            Node::HtmlBlock { raw } => {
                let trimmed = raw.trim_end_matches('\n');
                if trimmed.is_empty() {
                    None
                } else {
                    Some(self.theme().html.paint(trimmed, self.color()))
                }
            }
            Node::FootnoteDefinition { label, children } => {
                let inner = self.render_mixed(children, "\n");
                Some(format!("[^{label}]: {inner}"))
            }
            Node::Document { children } => Some(self.render_mixed(children, "\n\n")),
            // Row/Cell only occur under Table and are handled there.
            Node::Row { .. } | Node::Cell { .. } => None,
            inline => Some(self.render_inline(std::slice::from_ref(inline))),
        }
    }

    fn render_list(&mut self, ordered: bool, start: u64, items: &[Node]) -> String {
        let mut lines: Vec<String> = Vec::new();
        for (i, item) in items.iter().enumerate() {
            let marker = if ordered {
                format!("{}. ", start + i as u64)
            } else {
                "- ".to_string()
            };
            let indent = " ".repeat(visible_width(&marker));
            let painted_marker = self.theme().list_marker.paint(&marker, self.color());
            let body = match item {
                Node::Item { children } => self.render_mixed(children, "\n"),
                other => self
                    .render_block(other)
                    .unwrap_or_default(),
            };
            for (j, line) in body.split('\n').enumerate() {
                if j == 0 {
                    lines.push(format!("{painted_marker}{line}"));
                } else if line.is_empty() {
                    lines.push(String::new());
                } else {
                    lines.push(format!("{indent}{line}"));
                }
            }
        }
        lines.join("\n")
    }

    fn render_code_block(&mut self, block: &CodeBlock) -> String {
        let theme = *self.theme();
        let color = self.color();
        let open = theme
            .code_fence
            .paint(&format!("```{}", block.language), color);

        let code = block.trimmed_code();
        let body = if block.loading {
            theme.code_text.paint(code, color)
        } else if let Some(highlighted) = (self.highlight)(code, &block.language) {
            highlighted
        } else if block.diff {
            self.render_diff_body(code)
        } else {
            theme.code_text.paint(code, color)
        };

        let mut lines = vec![open];
        if !body.is_empty() {
            lines.push(body);
        }
        if !(block.loading && self.opts.streaming) {
            lines.push(theme.code_fence.paint("```", color));
        }
        lines.join("\n")
    }

    fn render_diff_body(&self, code: &str) -> String {
        let theme = self.theme();
        let color = self.color();
        code.split('\n')
            .map(|line| {
                let style = if line.starts_with("+++")
                    || line.starts_with("---")
                    || line.starts_with("diff ")
                    || line.starts_with("index ")
                {
                    theme.diff_meta
                } else if line.starts_with('+') {
                    theme.diff_add
                } else if line.starts_with('-') {
                    theme.diff_remove
                } else if line.starts_with("@@") {
                    theme.diff_hunk
                } else {
                    theme.code_text
                };
                style.paint(line, color)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_table(&mut self, header: &Node, rows: &[Node]) -> String {
        let header_cells = self.row_cells(header);
        let body_rows: Vec<Vec<String>> = rows.iter().map(|row| self.row_cells(row)).collect();

        let columns = header_cells
            .len()
            .max(body_rows.iter().map(Vec::len).max().unwrap_or(0));
        let mut widths = vec![0usize; columns];
        for row in std::iter::once(&header_cells).chain(body_rows.iter()) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(visible_width(cell));
            }
        }

        let border = |s: &str| self.theme().table_border.paint(s, self.color());
        let format_row = |cells: &[String]| {
            let mut line = border("|");
            for (i, width) in widths.iter().enumerate() {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                let pad = width.saturating_sub(visible_width(cell));
                line.push(' ');
                line.push_str(cell);
                line.push_str(&" ".repeat(pad));
                line.push(' ');
                line.push_str(&border("|"));
            }
            line
        };

        let mut lines = vec![format_row(&header_cells)];
        let mut separator = border("|");
        for width in &widths {
            separator.push_str(&border(&format!("{}|", "-".repeat(width + 2))));
        }
        lines.push(separator);
        for row in &body_rows {
            lines.push(format_row(row));
        }
        lines.join("\n")
    }

    fn row_cells(&mut self, row: &Node) -> Vec<String> {
        match row {
            Node::Row { cells } => cells
                .iter()
                .map(|cell| match cell {
                    Node::Cell { children } => self.render_inline(children),
                    other => self.render_inline(std::slice::from_ref(other)),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn render_inline_run(&mut self, nodes: &[&Node]) -> String {
        nodes
            .iter()
            .map(|node| self.render_inline_node(node))
            .collect()
    }

    fn render_inline(&mut self, nodes: &[Node]) -> String {
        nodes
            .iter()
            .map(|node| self.render_inline_node(node))
            .collect()
    }

    fn render_inline_node(&mut self, node: &Node) -> String {
        let theme = *self.theme();
        let color = self.color();
        match node {
            Node::Text { text } => text.clone(),
            Node::Strong { children } => {
                let inner = self.render_inline(children);
                Style::plain().bold().paint(&inner, color)
            }
            Node::Emphasis { children } => {
                let inner = self.render_inline(children);
                Style::plain().italic().paint(&inner, color)
            }
            Node::Strikethrough { children } => {
                let inner = self.render_inline(children);
                Style::plain().strike().paint(&inner, color)
            }
            Node::InlineCode { code } => theme.inline_code.paint(&format!("`{code}`"), color),
            Node::Link { url, children } => {
                let text = self.render_inline(children);
                let painted = theme.link.paint(&text, color);
                if url.is_empty() || *url == text {
                    painted
                } else {
                    format!("{painted} ({url})")
                }
            }
            Node::Image { url, children } => {
                let alt = self.render_inline(children);
                format!("![{alt}]({url})")
            }
            Node::HardBreak | Node::SoftBreak => "\n".to_string(),
            Node::FootnoteReference { label } => format!("[^{label}]"),
            Node::TaskMarker { checked } => {
                if *checked {
                    "[x] ".to_string()
                } else {
                    "[ ] ".to_string()
                }
            }
            Node::InlineHtml { raw } => theme.html.paint(raw, color),
            block => self.render_block(block).unwrap_or_default(),
        }
    }
}
