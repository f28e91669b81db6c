//! Unified diff rendering for edit previews.

use crate::core::component::{Flex, Length, Node, Styled, Text};
use crate::core::style::Theme;

const GUTTER: usize = 5;

/// Starting old/new line numbers from a `@@ -a,b +c,d @@` header.
fn hunk_start(header: &str) -> Option<(usize, usize)> {
    let mut parts = header.split_whitespace().skip(1);
    let old = parts.next()?.strip_prefix('-')?;
    let new = parts.next()?.strip_prefix('+')?;
    let first = |range: &str| range.split(',').next()?.parse::<usize>().ok();
    Some((first(old)?, first(new)?))
}

fn row(number: usize, body: String) -> Node {
    Flex::horizontal()
        .width(Length::Fraction(1.0))
        .child(Text::new(Theme::GRAY.paint(&format!("{number:>4}"))).width(GUTTER))
        .child(Text::new(body).width(Length::Fraction(1.0)))
        .into()
}

/// Render `lines` of a unified diff, each still carrying its `\n`. The two file header lines
/// are skipped. Rejected diffs use faded backgrounds.
pub fn diff_view(lines: &[String], rejected: bool) -> Flex {
    let (removed_bg, added_bg) = if rejected {
        (Theme::FADED_RED, Theme::FADED_GREEN)
    } else {
        (Theme::DARK_RED, Theme::DARK_GREEN)
    };
    let mut rows: Vec<Node> = Vec::new();
    let (mut old_line, mut new_line) = (1, 1);

    for line in lines.iter().skip(2) {
        let content = line.strip_suffix('\n').unwrap_or(line);
        let delta = content.get(1..).unwrap_or("");
        let number = if line.starts_with("@@") {
            if let Some((old, new)) = hunk_start(content) {
                (old_line, new_line) = (old, new);
            }
            if !rows.is_empty() {
                rows.push(Text::new(Theme::GRAY.paint(" ... ")).into());
            }
            continue;
        } else if line.starts_with('-') {
            let body = Theme::WHITE.paint(&format!("-  {delta}"));
            rows.push(row(old_line, removed_bg.paint_bg(&body)));
            old_line += 1;
            old_line - 1
        } else if line.starts_with('+') {
            let body = Theme::WHITE.paint(&format!("+  {delta}"));
            rows.push(row(new_line, added_bg.paint_bg(&body)));
            new_line += 1;
            new_line - 1
        } else if line.starts_with(' ') {
            rows.push(row(old_line, Theme::WHITE.paint(&format!("   {delta}"))));
            old_line += 1;
            new_line += 1;
            old_line - 1
        } else {
            continue;
        };
        if !line.ends_with('\n') {
            rows.push(row(number, "\\ No newline at end of file".to_string()));
        }
    }

    Flex::vertical()
        .width(Length::Fraction(1.0))
        .children(rows.into_iter().map(Some))
}
