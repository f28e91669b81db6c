//! Markdown to ANSI text, with syntect highlighting for fenced code.

use markdown::{mdast, to_mdast, ParseOptions};
use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use tracing::debug;

use crate::core::component::Text;
use crate::core::style::{Color, Style, Theme};
use crate::core::text::width::visible_width;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "base16-ocean.dark";
/// Thematic breaks have no width to fill at this stage, so they get a fixed one.
const RULE_WIDTH: usize = 40;
const LIST_INDENT: usize = 2;

/// Highlight `code` as `language` at the process color depth. Unknown languages come back
/// unchanged.
pub fn highlight_code(code: &str, language: &str) -> String {
    let Some(syntax) = SYNTAX_SET.find_syntax_by_token(language) else {
        return code.to_string();
    };
    let Some(theme) = THEME_SET.themes.get(CODE_THEME) else {
        return code.to_string();
    };
    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut out = Vec::new();
    for line in code.split('\n') {
        // The newline-aware syntax set expects each line to keep its terminator.
        let with_newline = format!("{line}\n");
        let ranges = match highlighter.highlight_line(&with_newline, &SYNTAX_SET) {
            Ok(ranges) => ranges,
            Err(err) => {
                debug!(error = %err, language, "highlighting failed");
                return code.to_string();
            }
        };
        let mut styled = String::new();
        for (style, piece) in ranges {
            let piece = piece.trim_end_matches('\n');
            if piece.is_empty() {
                continue;
            }
            let fg = style.foreground;
            styled.push_str(&Color::Rgb(fg.r, fg.g, fg.b).paint(piece));
        }
        out.push(styled);
    }
    out.join("\n")
}

/// Render Markdown as a styled string. Inline code is painted with `code_color`.
pub fn render_markdown(text: &str, code_color: Option<Color>) -> String {
    let root = match to_mdast(text, &ParseOptions::gfm()) {
        Ok(node) => node,
        Err(err) => {
            debug!(error = %err, "markdown parse failed, showing source");
            return text.to_string();
        }
    };
    let renderer = MarkdownRenderer {
        code_color: code_color.unwrap_or(Theme::BLUE),
    };
    let blocks = match &root {
        mdast::Node::Root(root) => root.children.as_slice(),
        other => std::slice::from_ref(other),
    };
    renderer.blocks(blocks).join("\n\n")
}

/// A wrapping [`Text`] element showing rendered Markdown.
pub fn markdown_text(text: &str) -> Text {
    Text::new(render_markdown(text, None))
}

struct MarkdownRenderer {
    code_color: Color,
}

impl MarkdownRenderer {
    fn blocks(&self, nodes: &[mdast::Node]) -> Vec<String> {
        nodes
            .iter()
            .filter_map(|node| self.block(node))
            .collect()
    }

    fn block(&self, node: &mdast::Node) -> Option<String> {
        let rendered = match node {
            mdast::Node::Heading(heading) => Style::bold(&self.inline(&heading.children)),
            mdast::Node::Paragraph(paragraph) => self.inline(&paragraph.children),
            mdast::Node::Code(code) => match code.lang.as_deref() {
                Some(lang) => highlight_code(&code.value, lang),
                None => code.value.clone(),
            },
            mdast::Node::List(list) => self.list(list, 0).join("\n"),
            mdast::Node::Blockquote(quote) => {
                let bar = Theme::GRAY.paint("│ ");
                self.blocks(&quote.children)
                    .join("\n\n")
                    .split('\n')
                    .map(|line| format!("{bar}{line}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            mdast::Node::ThematicBreak(_) => Style::dim(&"─".repeat(RULE_WIDTH)),
            mdast::Node::Table(table) => self.table(table),
            mdast::Node::Html(html) => html.value.trim().to_string(),
            mdast::Node::Text(_)
            | mdast::Node::Strong(_)
            | mdast::Node::Emphasis(_)
            | mdast::Node::InlineCode(_)
            | mdast::Node::Link(_) => self.inline(std::slice::from_ref(node)),
            _ => return None,
        };
        Some(rendered)
    }

    fn inline(&self, nodes: &[mdast::Node]) -> String {
        let mut out = String::new();
        for node in nodes {
            match node {
                mdast::Node::Text(text) => out.push_str(&text.value),
                mdast::Node::Strong(strong) => out.push_str(&Style::bold(&self.inline(&strong.children))),
                mdast::Node::Emphasis(emphasis) => {
                    out.push_str(&Style::italic(&self.inline(&emphasis.children)))
                }
                mdast::Node::Delete(delete) => {
                    out.push_str(&Style::strikethrough(&self.inline(&delete.children)))
                }
                mdast::Node::InlineCode(code) => out.push_str(&self.code_color.paint(&code.value)),
                mdast::Node::Link(link) => {
                    out.push_str(&Style::underline(&self.inline(&link.children)));
                    if plain_text(&link.children) != link.url {
                        out.push_str(&Style::dim(&format!(" ({})", link.url)));
                    }
                }
                mdast::Node::Image(image) => out.push_str(if image.alt.is_empty() {
                    &image.url
                } else {
                    &image.alt
                }),
                mdast::Node::Break(_) => out.push('\n'),
                mdast::Node::Html(html) => out.push_str(&html.value),
                _ => {}
            }
        }
        out
    }

    fn list(&self, list: &mdast::List, depth: usize) -> Vec<String> {
        let indent = " ".repeat(depth * LIST_INDENT);
        let start = list.start.unwrap_or(1);
        let mut lines = Vec::new();
        for (idx, node) in list.children.iter().enumerate() {
            let mdast::Node::ListItem(item) = node else {
                continue;
            };
            let bullet = if list.ordered {
                format!("{}. ", start + idx as u32)
            } else {
                "• ".to_string()
            };
            let hang = " ".repeat(visible_width(&bullet));
            let mut first = true;
            for child in &item.children {
                if let mdast::Node::List(nested) = child {
                    lines.extend(self.list(nested, depth + 1));
                    continue;
                }
                let Some(rendered) = self.block(child) else {
                    continue;
                };
                for line in rendered.split('\n') {
                    let lead = if first { &bullet } else { &hang };
                    lines.push(format!("{indent}{lead}{line}"));
                    first = false;
                }
            }
            if first {
                lines.push(format!("{indent}{}", bullet.trim_end()));
            }
        }
        lines
    }

    fn table(&self, table: &mdast::Table) -> String {
        let sep = Theme::GRAY.paint(" │ ");
        table
            .children
            .iter()
            .filter_map(|row| match row {
                mdast::Node::TableRow(row) => Some(row),
                _ => None,
            })
            .map(|row| {
                row.children
                    .iter()
                    .map(|cell| match cell {
                        mdast::Node::TableCell(cell) => self.inline(&cell.children),
                        _ => String::new(),
                    })
                    .collect::<Vec<_>>()
                    .join(&sep)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn plain_text(nodes: &[mdast::Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            mdast::Node::Text(text) => out.push_str(&text.value),
            mdast::Node::InlineCode(code) => out.push_str(&code.value),
            mdast::Node::Strong(strong) => out.push_str(&plain_text(&strong.children)),
            mdast::Node::Emphasis(emphasis) => out.push_str(&plain_text(&emphasis.children)),
            mdast::Node::Delete(delete) => out.push_str(&plain_text(&delete.children)),
            _ => {}
        }
    }
    out
}
