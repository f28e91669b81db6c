//! Bordered selection dialog used for approvals.

use std::rc::Rc;

use crate::core::component::{
    Border, Controller, Flex, Length, Node, Spacing, Styled, Text, Widget,
};
use crate::core::style::{BorderStyle, Color, Style, Theme};
use crate::runtime::context::Context;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionItem {
    pub label: String,
    /// Shortcut hint shown after the label.
    pub keybinding: Option<String>,
}

impl OptionItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            keybinding: None,
        }
    }

    pub fn keybinding(mut self, keybinding: impl Into<String>) -> Self {
        self.keybinding = Some(keybinding.into());
        self
    }
}

#[derive(Clone)]
pub struct OptionList {
    pub title: String,
    /// Lines shown between the title and the question, already styled.
    pub details: Vec<String>,
    pub question: String,
    pub options: Vec<OptionItem>,
    pub color: Color,
    pub on_select: Option<Rc<dyn Fn(usize)>>,
    pub on_cancel: Option<Rc<dyn Fn()>>,
}

impl OptionList {
    pub fn new(title: impl Into<String>, options: Vec<OptionItem>) -> Self {
        Self {
            title: title.into(),
            details: Vec::new(),
            question: String::new(),
            options,
            color: Theme::BLUE,
            on_select: None,
            on_cancel: None,
        }
    }

    pub fn details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    pub fn question(mut self, question: impl Into<String>) -> Self {
        self.question = question.into();
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn on_select(mut self, callback: impl Fn(usize) + 'static) -> Self {
        self.on_select = Some(Rc::new(callback));
        self
    }

    pub fn on_cancel(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_cancel = Some(Rc::new(callback));
        self
    }
}

impl Widget for OptionList {
    type Controller = OptionListController;
}

pub struct OptionListController {
    selected: usize,
}

impl OptionListController {
    pub fn selected(&self) -> usize {
        self.selected
    }
}

fn option_line(item: &OptionItem, idx: usize, active: bool, color: Color) -> String {
    if active {
        let mut line = format!("❯ {}. {}", idx + 1, item.label);
        if let Some(key) = &item.keybinding {
            line.push_str(&format!(" ({key})"));
        }
        return color.paint(&line);
    }
    let mut line = format!("  {} {}", Theme::GRAY.paint(&format!("{}.", idx + 1)), item.label);
    if let Some(key) = &item.keybinding {
        line.push_str(&format!(" ({})", Theme::GRAY.paint(key)));
    }
    line
}

impl Controller for OptionListController {
    type Widget = OptionList;

    fn create(_widget: &OptionList) -> Self {
        Self { selected: 0 }
    }

    fn contents(&self, widget: &OptionList) -> Vec<Option<Node>> {
        let options = Flex::vertical().children(widget.options.iter().enumerate().map(
            |(idx, item)| {
                Some(Text::new(option_line(item, idx, idx == self.selected, widget.color)).into())
            },
        ));
        let details = Flex::vertical()
            .margin(Spacing::sides(0, 0, 1, 2))
            .visible(!widget.details.is_empty())
            .children(
                widget
                    .details
                    .iter()
                    .map(|line| Some(Text::new(line.clone()).into())),
            );
        let dialog = Flex::vertical()
            .width(Length::Fraction(1.0))
            .border(Border::new(BorderStyle::ROUND).color(widget.color))
            .padding(Spacing::horizontal(1))
            .margin(Spacing::top(1))
            .child(Text::new(Style::bold(&widget.color.paint(&widget.title))).margin(Spacing::bottom(1)))
            .child(details)
            .slot((!widget.question.is_empty()).then(|| Text::new(widget.question.clone()).into()))
            .child(options);
        vec![Some(dialog.into())]
    }

    fn handle_input(&mut self, widget: &OptionList, ctx: &mut Context<'_, Self>, input: &str) {
        let last = widget.options.len().saturating_sub(1);
        match input {
            "\x1b[A" | "\x10" => self.selected = self.selected.saturating_sub(1),
            "\x1b[B" | "\x0e" => self.selected = (self.selected + 1).min(last),
            "\r" => {
                if let Some(on_select) = &widget.on_select {
                    on_select(self.selected);
                }
            }
            "\x1b" => {
                if let Some(on_cancel) = &widget.on_cancel {
                    on_cancel();
                }
            }
            _ => return,
        }
        ctx.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::text::ansi::strip_styles;
    use crate::render::compose::render;
    use crate::runtime::tree::ElementTree;
    use std::cell::Cell;

    fn dialog() -> OptionList {
        OptionList::new(
            "Bash command",
            vec![
                OptionItem::new("Yes"),
                OptionItem::new("No").keybinding("esc"),
            ],
        )
        .question("Do you want to proceed?")
    }

    #[test]
    fn renders_a_bordered_prompt_with_numbered_options() {
        let mut tree = ElementTree::new();
        let root = tree.mount_root(Flex::vertical().child(dialog().into_node()));
        tree.layout(Some(30), None);
        let lines: Vec<String> = render(&tree, root).iter().map(|l| strip_styles(l)).collect();
        assert_eq!(lines[0], " ".repeat(30));
        assert!(lines[1].starts_with('╭'));
        assert!(lines[2].starts_with("│ Bash command "));
        assert!(lines[2].ends_with(" │"));
        assert!(lines.iter().any(|line| line.contains("❯ 1. Yes")));
        assert!(lines.iter().any(|line| line.contains("  2. No (esc)")));
        assert!(lines.last().unwrap().starts_with('╰'));
    }

    #[test]
    fn arrows_move_and_enter_selects() {
        let chosen = Rc::new(Cell::new(None));
        let seen = Rc::clone(&chosen);
        let cancelled = Rc::new(Cell::new(false));
        let cancel_seen = Rc::clone(&cancelled);
        let widget = dialog()
            .on_select(move |idx| seen.set(Some(idx)))
            .on_cancel(move || cancel_seen.set(true));

        let mut tree = ElementTree::new();
        tree.mount_root(Flex::vertical().child(widget.into_node()));
        let id = tree.find::<OptionListController>().unwrap();

        for key in ["\x1b[B", "\x0e", "\x1b[B"] {
            tree.propagate(key);
        }
        assert_eq!(tree.controller::<OptionListController>(id).unwrap().selected(), 1);
        tree.propagate("\x10");
        tree.propagate("\r");
        assert_eq!(chosen.get(), Some(0));
        tree.propagate("\x1b");
        assert!(cancelled.get());
    }
}
