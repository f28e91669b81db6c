use ask_tui::{fit_to_width, slice_styled, strip_styles, visible_width, wrap_lines, Style, Wrap};
use proptest::prelude::*;

proptest! {
    #[test]
    fn slices_reassemble_the_plain_text(text in "[ -~]{0,40}", cut in any::<prop::sample::Index>()) {
        let styled = Style::bold(&text);
        let len = text.len();
        let at = cut.index(len + 1);
        let left = slice_styled(&styled, 0, at);
        let right = slice_styled(&styled, at, len);
        prop_assert_eq!(strip_styles(&left) + &strip_styles(&right), text);
    }

    #[test]
    fn slice_windows_have_their_width(text in "[ -~]{0,40}", a in any::<prop::sample::Index>(), b in any::<prop::sample::Index>()) {
        let styled = format!("ab{}", Style::underline(&text));
        let plain = strip_styles(&styled);
        let (mut start, mut end) = (a.index(plain.len() + 1), b.index(plain.len() + 1));
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        let window = slice_styled(&styled, start, end);
        prop_assert_eq!(visible_width(&window), end - start);
        prop_assert_eq!(strip_styles(&window), &plain[start..end]);
    }

    #[test]
    fn fit_to_width_is_exact(text in "[ -~]{0,40}", width in 0usize..50) {
        let styled = Style::italic(&text);
        prop_assert_eq!(visible_width(&fit_to_width(&styled, width)), width);
    }

    #[test]
    fn wrapped_lines_fit_and_are_stable(text in "[a-z ]{0,60}", width in 1usize..20) {
        for mode in [Wrap::Exact, Wrap::Words, Wrap::WordsWithCursor] {
            for line in wrap_lines(&text, width, mode) {
                prop_assert!(visible_width(&line) <= width);
                prop_assert_eq!(wrap_lines(&line, width, mode), vec![line.clone()]);
            }
        }
    }

    #[test]
    fn exact_and_cursor_wrapping_drop_nothing(text in "[a-z ]{0,60}", width in 1usize..20) {
        for mode in [Wrap::Exact, Wrap::WordsWithCursor] {
            prop_assert_eq!(wrap_lines(&text, width, mode).concat(), text.clone());
        }
    }
}

#[test]
fn wide_graphemes_count_two_columns() {
    assert_eq!(visible_width("日本"), 4);
    assert_eq!(visible_width(&Style::underline("ab")), 2);
    assert_eq!(strip_styles(&fit_to_width("日本語", 5)), "日本 ");
}
