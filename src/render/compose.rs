//! Composes laid-out elements into lines of styled text.
//!
//! Every element's content goes through the same pipeline: fit to the content box, then
//! padding, background, border and margin. Each returned line is exactly as wide as the
//! element's resolved width and there are exactly as many lines as its resolved height.

use crate::core::component::{Axis, Border, Node, Props, Spacing};
use crate::core::style::Color;
use crate::core::text::ansi::{segments, Segment, SgrState};
use crate::core::text::slice::fit_to_width;
use crate::runtime::tree::{ElementTree, NodeId};

/// Renders the laid-out element `id` and its collapsed descendants.
///
/// Panics when `id` is a widget or has not been laid out.
pub fn render(tree: &ElementTree, id: NodeId) -> Vec<String> {
    let node = tree
        .node(id)
        .unwrap_or_else(|| panic!("{id:?} is not mounted"));
    let props = node
        .props()
        .unwrap_or_else(|| panic!("cannot render widget {} directly", node.kind_name()));
    let width = tree.width(id);
    let height = tree.height(id);
    let content_width = width.saturating_sub(props.chrome(Axis::Horizontal));
    let content_height = height.saturating_sub(props.chrome(Axis::Vertical));

    let body = match node {
        Node::Text(text) => text.lines(Some(content_width)),
        Node::Box(flex) => {
            let children = tree.collapsed_children(id);
            match flex.flex {
                Axis::Vertical => stack(tree, children),
                Axis::Horizontal => columns(tree, children),
            }
        }
        Node::Widget(_) => unreachable!("widgets have no props"),
    };

    decorate(body, props, content_width, content_height, width, height)
}

fn stack(tree: &ElementTree, children: &[NodeId]) -> Vec<String> {
    let mut lines = Vec::new();
    for child in children {
        let rendered = render(tree, *child);
        if !rendered.is_empty() {
            lines.extend(rendered);
        }
    }
    lines
}

fn columns(tree: &ElementTree, children: &[NodeId]) -> Vec<String> {
    let rendered: Vec<(usize, Vec<String>)> = children
        .iter()
        .map(|child| (tree.width(*child), render(tree, *child)))
        .collect();
    let rows = rendered.iter().map(|(_, lines)| lines.len()).max().unwrap_or(0);
    (0..rows)
        .map(|row| {
            rendered
                .iter()
                .map(|(width, lines)| match lines.get(row) {
                    Some(line) => line.clone(),
                    None => " ".repeat(*width),
                })
                .collect()
        })
        .collect()
}

fn decorate(
    body: Vec<String>,
    props: &Props,
    content_width: usize,
    content_height: usize,
    width: usize,
    height: usize,
) -> Vec<String> {
    let mut lines = fit(body, content_width, content_height);
    lines = pad(lines, &props.padding, content_width);
    if let Some(color) = props.background {
        lines = lines
            .iter()
            .map(|line| with_background(line, color))
            .collect();
    }
    if let Some(border) = props.border {
        let inner = content_width + props.padding.along(Axis::Horizontal);
        lines = frame(lines, &border, inner);
    }
    let framed =
        content_width + props.chrome(Axis::Horizontal) - props.margin.along(Axis::Horizontal);
    lines = pad(lines, &props.margin, framed);

    if props.chrome(Axis::Horizontal) > width || props.chrome(Axis::Vertical) > height {
        lines = fit(lines, width, height);
    }
    lines
}

/// Cuts or pads `lines` to exactly `width` x `height`.
pub fn fit(mut lines: Vec<String>, width: usize, height: usize) -> Vec<String> {
    lines.truncate(height);
    let mut out: Vec<String> = lines
        .iter()
        .map(|line| fit_to_width(line, width))
        .collect();
    out.resize_with(height, || " ".repeat(width));
    out
}

fn pad(lines: Vec<String>, spacing: &Spacing, width: usize) -> Vec<String> {
    if *spacing == Spacing::default() {
        return lines;
    }
    let blank = " ".repeat(width + spacing.left + spacing.right);
    let left = " ".repeat(spacing.left);
    let right = " ".repeat(spacing.right);
    let mut out = Vec::with_capacity(lines.len() + spacing.top + spacing.bottom);
    out.extend(std::iter::repeat(blank.clone()).take(spacing.top));
    out.extend(lines.into_iter().map(|line| format!("{left}{line}{right}")));
    out.extend(std::iter::repeat(blank).take(spacing.bottom));
    out
}

/// Paints `line` on `color`, re-applying the background after any code that clears it.
fn with_background(line: &str, color: Color) -> String {
    let open = format!("\x1b[{}m", color.bg_params());
    let mut out = open.clone();
    let mut state = SgrState::default();
    for segment in segments(line) {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Escape(escape) => {
                out.push_str(escape.text);
                if let Some(params) = escape.sgr_params() {
                    state.apply(params);
                    if state.bg.is_none() {
                        out.push_str(&open);
                    }
                }
            }
        }
    }
    out.push_str("\x1b[49m");
    out
}

fn frame(lines: Vec<String>, border: &Border, inner: usize) -> Vec<String> {
    let style = border.style;
    let sides = border.sides;
    let paint = |glyphs: String| match border.color {
        Some(color) => color.paint(&glyphs),
        None => glyphs,
    };
    let edge = |left: char, fill: char, right: char| {
        let mut glyphs = String::new();
        if sides.left {
            glyphs.push(left);
        }
        glyphs.extend(std::iter::repeat(fill).take(inner));
        if sides.right {
            glyphs.push(right);
        }
        paint(glyphs)
    };

    let mut out = Vec::with_capacity(lines.len() + 2);
    if sides.top {
        out.push(edge(style.top_left, style.top, style.top_right));
    }
    let left = if sides.left {
        paint(style.left.to_string())
    } else {
        String::new()
    };
    let right = if sides.right {
        paint(style.right.to_string())
    } else {
        String::new()
    };
    out.extend(lines.into_iter().map(|line| format!("{left}{line}{right}")));
    if sides.bottom {
        out.push(edge(style.bottom_left, style.bottom, style.bottom_right));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::component::{Flex, Sides, Styled, Text};
    use crate::core::style::BorderStyle;
    use crate::core::text::ansi::strip_styles;
    use crate::core::text::width::visible_width;

    fn rendered(root: impl Into<Node>, width: usize) -> Vec<String> {
        let mut tree = ElementTree::new();
        let root = tree.mount_root(root);
        tree.layout(Some(width), None);
        render(&tree, root)
    }

    #[test]
    fn bordered_box_meets_the_width_contract() {
        let lines = rendered(
            Flex::vertical()
                .width(20)
                .border(Border::new(BorderStyle::SINGLE))
                .padding(1)
                .child(Text::new("hello")),
            80,
        );
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|line| visible_width(line) == 20));
        assert_eq!(lines[0], format!("┌{}┐", "─".repeat(18)));
        assert_eq!(lines[2], format!("│ hello{} │", " ".repeat(11)));
    }

    #[test]
    fn partial_border_skips_corners() {
        let border = Border::new(BorderStyle::ROUND).sides(Sides {
            top: true,
            right: false,
            bottom: false,
            left: false,
        });
        let lines = rendered(Text::new("ab").border(border), 80);
        assert_eq!(lines, vec!["──", "ab"]);
    }

    #[test]
    fn horizontal_children_are_padded_to_the_tallest() {
        let lines = rendered(
            Flex::horizontal()
                .child(Text::new("a\nb"))
                .child(Text::new("cc")),
            80,
        );
        assert_eq!(lines, vec!["acc", "b  "]);
    }

    #[test]
    fn empty_children_add_no_lines() {
        let lines = rendered(
            Flex::vertical()
                .child(Text::new("top"))
                .child(Text::new(""))
                .child(Text::new("end")),
            80,
        );
        assert_eq!(lines, vec!["top", "end"]);
    }

    #[test]
    fn margin_surrounds_the_border() {
        let lines = rendered(
            Text::new("x")
                .border(Border::new(BorderStyle::CLASSIC))
                .margin(Spacing::sides(1, 0, 0, 2)),
            80,
        );
        assert_eq!(lines, vec!["     ", "  +-+", "  |x|", "  +-+"]);
    }

    #[test]
    fn background_survives_inner_resets() {
        let line = with_background("a\x1b[0mb", Color::RED);
        let bg = format!("\x1b[{}m", Color::RED.bg_params());
        assert_eq!(line, format!("{bg}a\x1b[0m{bg}b\x1b[49m"));
        assert_eq!(strip_styles(&line), "ab");
    }

    #[test]
    fn chrome_wider_than_the_node_is_clamped() {
        let lines = rendered(
            Flex::vertical()
                .width(3)
                .padding(Spacing::horizontal(2))
                .child(Text::new("abc")),
            80,
        );
        assert!(lines.iter().all(|line| visible_width(line) == 3));
    }

    #[test]
    fn rule_spans_the_available_width() {
        let lines = rendered(
            Flex::vertical()
                .child(Text::new("title"))
                .child(Text::rule()),
            12,
        );
        assert_eq!(lines, vec!["title       ", "────────────"]);
    }
}
