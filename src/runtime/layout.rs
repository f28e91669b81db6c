//! Flex layout: collapse, per-axis lengths, then absolute offsets.
//!
//! Lengths are computed top-down, horizontal first. A Text's height depends on the width it
//! wrapped at, so the vertical pass reads the widths the horizontal pass stored.
//!
//! Children are offered space in three tiers against a running `remaining` budget:
//! fixed cells first, then content-sized children, then fractions. Only a container whose
//! flex axis is the axis being computed consumes the budget as children take it; along the
//! cross axis every child is offered the same space.

use tracing::trace;

use crate::core::component::{Axis, Length, Node};
use crate::core::text::width::max_line_width;
use crate::runtime::tree::{ElementTree, NodeId};

impl ElementTree {
    /// Lays out the whole tree from the root. `None` leaves an axis unconstrained.
    ///
    /// Panics when no root is mounted or the root is a widget.
    pub fn layout(&mut self, width: Option<usize>, height: Option<usize>) {
        let root = self.root.expect("layout requires a mounted root");
        assert!(
            !matches!(self.nodes.get(&root), Some(Node::Widget(_))),
            "layout root must be an element"
        );
        self.collapse(root);
        self.compute_lengths(root, Axis::Horizontal, width);
        self.compute_lengths(root, Axis::Vertical, height);
        self.offsets.insert(root, (0, 0));
        self.compute_offsets(root);
        trace!(
            width = self.width(root),
            height = self.height(root),
            nodes = self.len(),
            "layout"
        );
    }

    fn collapse(&mut self, id: NodeId) {
        let mut collapsed = Vec::new();
        for child in self.children(id).iter().flatten() {
            self.collect_elements(*child, &mut collapsed);
        }
        for child in &collapsed {
            self.collapse(*child);
        }
        self.collapsed.insert(id, collapsed);
    }

    fn collect_elements(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match self.nodes.get(&id) {
            Some(Node::Widget(_)) => {
                for child in self.children(id).iter().flatten() {
                    self.collect_elements(*child, out);
                }
            }
            Some(node) => {
                if node.props().is_some_and(|props| props.visible) {
                    out.push(id);
                }
            }
            None => {}
        }
    }

    fn flex_of(&self, id: NodeId) -> Axis {
        match self.nodes.get(&id) {
            Some(Node::Box(flex)) => flex.flex,
            _ => Axis::Vertical,
        }
    }

    fn element_length(&self, id: NodeId, axis: Axis) -> (Length, usize) {
        let props = self
            .nodes
            .get(&id)
            .and_then(Node::props)
            .unwrap_or_else(|| panic!("{id:?} is not a mounted element"));
        (props.length(axis), props.chrome(axis))
    }

    fn resolved(&self, id: NodeId, axis: Axis) -> usize {
        match axis {
            Axis::Horizontal => self.width(id),
            Axis::Vertical => self.height(id),
        }
    }

    fn store(&mut self, id: NodeId, axis: Axis, length: usize) {
        match axis {
            Axis::Horizontal => self.widths.insert(id, length),
            Axis::Vertical => self.heights.insert(id, length),
        };
    }

    fn compute_lengths(&mut self, id: NodeId, axis: Axis, available: Option<usize>) {
        let flex = self.flex_of(id);
        let (own, chrome) = self.element_length(id, axis);
        let collapsed = self.collapsed_children(id).to_vec();
        let lengths: Vec<Length> = collapsed
            .iter()
            .map(|child| self.element_length(*child, axis).0)
            .collect();

        let available = match own {
            Length::Cells(cells) => Some(available.map_or(cells, |avail| avail.min(cells))),
            _ => available,
        };
        let content = available.map(|avail| avail.saturating_sub(chrome));
        let mut remaining = content;
        let consumes = flex == axis;

        for (child, length) in collapsed.iter().zip(&lengths) {
            if let Length::Cells(cells) = *length {
                let offered = remaining.map_or(cells, |rem| rem.min(cells));
                self.compute_lengths(*child, axis, Some(offered));
                if consumes {
                    self.consume(&mut remaining, *child, axis);
                }
            }
        }

        for (child, length) in collapsed.iter().zip(&lengths) {
            let content_sized = match length {
                Length::Auto => true,
                Length::Fraction(_) => remaining.is_none(),
                Length::Cells(_) => false,
            };
            if content_sized {
                self.compute_lengths(*child, axis, remaining);
                if consumes {
                    self.consume(&mut remaining, *child, axis);
                }
            }
        }

        if let Some(budget) = remaining {
            let total: f32 = lengths
                .iter()
                .filter_map(|length| match length {
                    Length::Fraction(fraction) => Some(*fraction),
                    _ => None,
                })
                .sum();
            let scale = if consumes {
                budget as f32 / total.max(1.0)
            } else {
                budget as f32
            };
            for (child, length) in collapsed.iter().zip(&lengths) {
                if let Length::Fraction(fraction) = *length {
                    let rem = remaining.unwrap_or(0);
                    let offered = rem.min((fraction * scale) as usize);
                    self.compute_lengths(*child, axis, Some(offered));
                    if consumes {
                        self.consume(&mut remaining, *child, axis);
                    }
                }
            }
        }

        let length = match (own, available) {
            (Length::Cells(cells), _) => cells,
            (Length::Fraction(_), Some(avail)) => avail,
            _ => self.content_length(id, axis, content, &collapsed) + chrome,
        };
        let length = available.map_or(length, |avail| length.min(avail));
        self.store(id, axis, length);
    }

    fn consume(&self, remaining: &mut Option<usize>, child: NodeId, axis: Axis) {
        if let Some(rem) = remaining.as_mut() {
            *rem = rem.saturating_sub(self.resolved(child, axis));
        }
    }

    /// Size of the content box when the node sizes to content.
    fn content_length(
        &self,
        id: NodeId,
        axis: Axis,
        content: Option<usize>,
        collapsed: &[NodeId],
    ) -> usize {
        match self.nodes.get(&id) {
            Some(Node::Text(text)) => match axis {
                Axis::Horizontal => max_line_width(&text.lines(content)),
                Axis::Vertical => {
                    let width = self
                        .width(id)
                        .saturating_sub(text.props.chrome(Axis::Horizontal));
                    text.lines(Some(width)).len()
                }
            },
            _ => {
                let lengths = collapsed.iter().map(|child| self.resolved(*child, axis));
                if self.flex_of(id) == axis {
                    lengths.sum()
                } else {
                    lengths.max().unwrap_or(0)
                }
            }
        }
    }

    fn compute_offsets(&mut self, id: NodeId) {
        let (x, y) = self.offset(id);
        let (dx, dy) = self
            .nodes
            .get(&id)
            .and_then(Node::props)
            .map_or((0, 0), |props| props.content_origin());
        let flex = self.flex_of(id);
        let (mut x, mut y) = (x + dx, y + dy);
        for child in self.collapsed_children(id).to_vec() {
            self.offsets.insert(child, (x, y));
            match flex {
                Axis::Horizontal => x += self.width(child),
                Axis::Vertical => y += self.height(child),
            }
            self.compute_offsets(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::component::{Axis, Border, Flex, Length, Spacing, Styled, Text};
    use crate::core::style::BorderStyle;
    use crate::runtime::tree::ElementTree;

    fn laid_out(root: Flex, width: Option<usize>) -> (ElementTree, crate::runtime::tree::NodeId) {
        let mut tree = ElementTree::new();
        let root = tree.mount_root(root);
        tree.layout(width, None);
        (tree, root)
    }

    #[test]
    fn fixed_children_sum_along_flex_and_max_across() {
        let row = Flex::horizontal()
            .child(Text::new("a").width(10))
            .child(Text::new("b").width(20));
        let (tree, root) = laid_out(row, Some(80));
        assert_eq!((tree.width(root), tree.height(root)), (30, 1));

        let column = Flex::vertical()
            .child(Text::new("a").width(10))
            .child(Text::new("b").width(20));
        let (tree, root) = laid_out(column, Some(80));
        assert_eq!((tree.width(root), tree.height(root)), (20, 2));
    }

    #[test]
    fn text_height_follows_wrapped_width() {
        let (tree, root) = laid_out(
            Flex::vertical().child(Text::new("aaa bbb ccc").width(5)),
            Some(80),
        );
        let text = tree.collapsed_children(root)[0];
        assert_eq!(tree.width(text), 5);
        assert_eq!(tree.height(text), 3);
    }

    #[test]
    fn fractions_share_the_flex_axis() {
        let row = Flex::horizontal()
            .width(100)
            .child(Text::new("").width(Length::fraction(0.3)))
            .child(Text::new("").width(Length::fraction(0.7)));
        let (tree, root) = laid_out(row, Some(200));
        let widths: Vec<usize> = tree
            .collapsed_children(root)
            .iter()
            .map(|id| tree.width(*id))
            .collect();
        assert_eq!(widths, vec![30, 70]);
    }

    #[test]
    fn cross_axis_fractions_each_get_the_whole_budget() {
        let column = Flex::vertical()
            .width(40)
            .child(Text::new("").width(Length::fraction(0.5)))
            .child(Text::new("").width(Length::fraction(0.5)));
        let (tree, root) = laid_out(column, Some(80));
        let widths: Vec<usize> = tree
            .collapsed_children(root)
            .iter()
            .map(|id| tree.width(*id))
            .collect();
        assert_eq!(widths, vec![20, 20]);

        let column = Flex::vertical()
            .width(40)
            .child(Text::new("").width(Length::fraction(1.0)))
            .child(Text::new("").width(Length::fraction(1.0)));
        let (tree, root) = laid_out(column, Some(80));
        let widths: Vec<usize> = tree
            .collapsed_children(root)
            .iter()
            .map(|id| tree.width(*id))
            .collect();
        assert_eq!(widths, vec![40, 40]);
    }

    #[test]
    fn content_sized_children_take_what_fixed_ones_leave() {
        let row = Flex::horizontal()
            .width(20)
            .child(Text::new("one two three four five"))
            .child(Text::new("x").width(5));
        let (tree, root) = laid_out(row, Some(80));
        let kids = tree.collapsed_children(root).to_vec();
        assert_eq!(tree.width(kids[1]), 5);
        // Wrapped at 15 columns: "one two three" / "four five".
        assert_eq!(tree.width(kids[0]), 13);
        assert_eq!(tree.height(kids[0]), 2);
        assert_eq!(tree.offset(kids[0]), (0, 0));
        assert_eq!(tree.offset(kids[1]), (13, 0));
    }

    #[test]
    fn chrome_is_added_and_offsets_start_inside_it() {
        let boxed = Flex::vertical()
            .border(Border::new(BorderStyle::ROUND))
            .padding(Spacing::horizontal(1))
            .margin(Spacing::top(1))
            .child(Text::new("hello"));
        let (tree, root) = laid_out(boxed, Some(80));
        assert_eq!(tree.width(root), 5 + 2 + 2);
        assert_eq!(tree.height(root), 1 + 2 + 1);
        let text = tree.collapsed_children(root)[0];
        assert_eq!(tree.offset(text), (2, 2));
    }

    #[test]
    fn invisible_elements_are_skipped() {
        let column = Flex::vertical()
            .child(Text::new("shown"))
            .child(Text::new("hidden").visible(false));
        let (tree, root) = laid_out(column, Some(80));
        assert_eq!(tree.collapsed_children(root).len(), 1);
        assert_eq!(tree.height(root), 1);
    }

    #[test]
    fn width_is_clamped_to_available() {
        let (tree, root) = laid_out(
            Flex::vertical().child(Text::new("x").width(50)),
            Some(30),
        );
        assert_eq!(tree.width(root), 30);
        assert_eq!(tree.width(tree.collapsed_children(root)[0]), 30);
    }

    #[test]
    fn unconstrained_axis_sizes_to_content() {
        let (tree, root) = laid_out(Flex::new(Axis::Vertical).child(Text::new("a\nb\nc")), None);
        assert_eq!((tree.width(root), tree.height(root)), (1, 3));
    }
}
