//! Component model: Text and Box elements, widgets and the controller contract.
//!
//! A [`Node`] is plain data recreated on every `contents()` call. Elements render directly;
//! a widget's subtree comes from its long-lived [`Controller`], which the tree keeps alive
//! across reconciliation for as long as a widget of the same type occupies the same slot.

use std::any::{Any, TypeId};
use std::fmt;

use crate::core::style::{BorderStyle, Color};
use crate::core::text::width::TAB_WIDTH;
use crate::core::text::wrap::{wrap_lines, Wrap};
use crate::runtime::context::{Context, Effects};
use crate::runtime::tree::{ElementTree, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    Horizontal,
    #[default]
    Vertical,
}

/// Size along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Length {
    /// Size to content.
    #[default]
    Auto,
    Cells(usize),
    /// Share of the space offered by the parent, in (0, 1].
    Fraction(f32),
}

impl Length {
    pub fn fraction(value: f32) -> Self {
        assert!(
            value > 0.0 && value <= 1.0,
            "fractional length must be in (0, 1], got {value}"
        );
        Length::Fraction(value)
    }
}

impl From<usize> for Length {
    fn from(cells: usize) -> Self {
        Length::Cells(cells)
    }
}

impl From<f32> for Length {
    fn from(value: f32) -> Self {
        Length::fraction(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Spacing {
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
    pub left: usize,
}

impl Spacing {
    pub const fn all(n: usize) -> Self {
        Self {
            top: n,
            right: n,
            bottom: n,
            left: n,
        }
    }

    pub const fn sides(top: usize, right: usize, bottom: usize, left: usize) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Left and right only.
    pub const fn horizontal(n: usize) -> Self {
        Self::sides(0, n, 0, n)
    }

    /// Top and bottom only.
    pub const fn vertical(n: usize) -> Self {
        Self::sides(n, 0, n, 0)
    }

    pub const fn top(n: usize) -> Self {
        Self::sides(n, 0, 0, 0)
    }

    pub const fn bottom(n: usize) -> Self {
        Self::sides(0, 0, n, 0)
    }

    pub const fn left(n: usize) -> Self {
        Self::sides(0, 0, 0, n)
    }

    pub fn along(&self, axis: Axis) -> usize {
        match axis {
            Axis::Horizontal => self.left + self.right,
            Axis::Vertical => self.top + self.bottom,
        }
    }
}

impl From<usize> for Spacing {
    fn from(n: usize) -> Self {
        Spacing::all(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sides {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Sides {
    pub const ALL: Sides = Sides {
        top: true,
        right: true,
        bottom: true,
        left: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub style: BorderStyle,
    pub sides: Sides,
    pub color: Option<Color>,
}

impl Border {
    pub fn new(style: BorderStyle) -> Self {
        Self {
            style,
            sides: Sides::ALL,
            color: None,
        }
    }

    pub fn sides(mut self, sides: Sides) -> Self {
        self.sides = sides;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn along(&self, axis: Axis) -> usize {
        match axis {
            Axis::Horizontal => self.sides.left as usize + self.sides.right as usize,
            Axis::Vertical => self.sides.top as usize + self.sides.bottom as usize,
        }
    }
}

/// Sizing and decoration shared by both element kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct Props {
    pub width: Length,
    pub height: Length,
    pub margin: Spacing,
    pub padding: Spacing,
    pub border: Option<Border>,
    pub background: Option<Color>,
    pub visible: bool,
}

impl Default for Props {
    fn default() -> Self {
        Self {
            width: Length::Auto,
            height: Length::Auto,
            margin: Spacing::default(),
            padding: Spacing::default(),
            border: None,
            background: None,
            visible: true,
        }
    }
}

impl Props {
    pub fn length(&self, axis: Axis) -> Length {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// Margin + border + padding thickness on `axis`.
    pub fn chrome(&self, axis: Axis) -> usize {
        self.margin.along(axis)
            + self.padding.along(axis)
            + self.border.map_or(0, |border| border.along(axis))
    }

    /// Offset of the content area from the node's top-left corner.
    pub fn content_origin(&self) -> (usize, usize) {
        let (border_left, border_top) = self.border.map_or((0, 0), |border| {
            (border.sides.left as usize, border.sides.top as usize)
        });
        (
            self.margin.left + border_left + self.padding.left,
            self.margin.top + border_top + self.padding.top,
        )
    }
}

/// Builder methods for anything carrying [`Props`].
pub trait Styled: Sized {
    fn props_mut(&mut self) -> &mut Props;

    fn width(mut self, width: impl Into<Length>) -> Self {
        self.props_mut().width = width.into();
        self
    }

    fn height(mut self, height: impl Into<Length>) -> Self {
        self.props_mut().height = height.into();
        self
    }

    fn margin(mut self, margin: impl Into<Spacing>) -> Self {
        self.props_mut().margin = margin.into();
        self
    }

    fn padding(mut self, padding: impl Into<Spacing>) -> Self {
        self.props_mut().padding = padding.into();
        self
    }

    fn border(mut self, border: Border) -> Self {
        self.props_mut().border = Some(border);
        self
    }

    fn background(mut self, color: Color) -> Self {
        self.props_mut().background = Some(color);
        self
    }

    fn visible(mut self, visible: bool) -> Self {
        self.props_mut().visible = visible;
        self
    }
}

/// Leaf element. It has no children by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub content: String,
    pub wrap: Wrap,
    /// When set, the line is this glyph repeated across the content width.
    pub fill: Option<char>,
    pub props: Props,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            wrap: Wrap::default(),
            fill: None,
            props: Props::default(),
        }
    }

    /// A full-width horizontal rule.
    pub fn rule() -> Self {
        Self {
            fill: Some('─'),
            ..Self::new("")
        }
        .width(Length::Fraction(1.0))
        .height(Length::Cells(1))
    }

    pub fn wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = wrap;
        self
    }

    /// Content lines at `width` columns, or unwrapped when no width is known yet. Empty
    /// content has no lines.
    pub fn lines(&self, width: Option<usize>) -> Vec<String> {
        if let Some(fill) = self.fill {
            return vec![fill.to_string().repeat(width.unwrap_or(0))];
        }
        if self.content.is_empty() {
            return Vec::new();
        }
        let content = self.content.replace('\t', &" ".repeat(TAB_WIDTH));
        match width {
            Some(width) => wrap_lines(&content, width, self.wrap),
            None => content.split('\n').map(str::to_string).collect(),
        }
    }
}

impl Styled for Text {
    fn props_mut(&mut self) -> &mut Props {
        &mut self.props
    }
}

/// Flex container (the Box element). Children are stacked along `flex`.
#[derive(Debug, Default)]
pub struct Flex {
    pub flex: Axis,
    pub props: Props,
    pub children: Vec<Option<Node>>,
}

impl Flex {
    pub fn new(flex: Axis) -> Self {
        Self {
            flex,
            props: Props::default(),
            children: Vec::new(),
        }
    }

    pub fn vertical() -> Self {
        Self::new(Axis::Vertical)
    }

    pub fn horizontal() -> Self {
        Self::new(Axis::Horizontal)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(Some(node.into()));
        self
    }

    /// Adds a slot that may be empty, keeping index alignment for reconciliation.
    pub fn slot(mut self, node: Option<Node>) -> Self {
        self.children.push(node);
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Option<Node>>) -> Self {
        self.children.extend(nodes);
        self
    }
}

impl Styled for Flex {
    fn props_mut(&mut self) -> &mut Props {
        &mut self.props
    }
}

pub enum Node {
    Text(Text),
    Box(Flex),
    Widget(WidgetNode),
}

impl Node {
    /// Sizing props for elements; widgets have none of their own.
    pub fn props(&self) -> Option<&Props> {
        match self {
            Node::Text(text) => Some(&text.props),
            Node::Box(flex) => Some(&flex.props),
            Node::Widget(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Text(_) => "Text",
            Node::Box(_) => "Box",
            Node::Widget(widget) => widget.type_name(),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(text) => f.debug_tuple("Text").field(&text.content).finish(),
            Node::Box(flex) => f
                .debug_struct("Box")
                .field("flex", &flex.flex)
                .field("children", &flex.children)
                .finish(),
            Node::Widget(widget) => f.debug_tuple("Widget").field(&widget.type_name()).finish(),
        }
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

impl From<Flex> for Node {
    fn from(flex: Flex) -> Self {
        Node::Box(flex)
    }
}

impl From<WidgetNode> for Node {
    fn from(widget: WidgetNode) -> Self {
        Node::Widget(widget)
    }
}

/// Props shape of a stateful component. The value is rebuilt every frame by its parent.
pub trait Widget: Sized + 'static {
    type Controller: Controller<Widget = Self>;

    fn into_node(self) -> Node {
        Node::Widget(WidgetNode::new(self))
    }
}

/// Long-lived state and behavior behind a [`Widget`].
///
/// Hooks receive the current widget props by reference; a controller that needs to post
/// state changes from elsewhere takes a [`Handle`](crate::runtime::context::Handle) from its
/// mount context.
pub trait Controller: Sized + 'static {
    type Widget: Widget<Controller = Self>;

    fn create(widget: &Self::Widget) -> Self;

    fn contents(&self, widget: &Self::Widget) -> Vec<Option<Node>>;

    /// Called after construction, before the first `contents()`.
    fn handle_mount(&mut self, _widget: &Self::Widget, _ctx: &mut Context<'_, Self>) {}

    /// Called when a new widget of the same type takes over this controller's slot.
    fn handle_update(&mut self, _old: &Self::Widget, _new: &Self::Widget) {}

    fn handle_input(&mut self, _widget: &Self::Widget, _ctx: &mut Context<'_, Self>, _input: &str) {
    }

    fn handle_unmount(&mut self, _widget: &Self::Widget) {}
}

/// Type-erased widget slot stored in the tree.
pub(crate) trait AnyWidget {
    fn type_name(&self) -> &'static str;
    fn controller_type(&self) -> TypeId;
    fn mount(&mut self, id: NodeId, tree: &ElementTree) -> Effects;
    /// Moves `next`'s props into this slot, keeping the controller. Hands `next` back when
    /// it belongs to a different controller type.
    fn migrate(&mut self, next: Box<dyn AnyWidget>) -> Result<(), Box<dyn AnyWidget>>;
    fn contents(&self) -> Vec<Option<Node>>;
    fn input(&mut self, id: NodeId, tree: &ElementTree, input: &str) -> Effects;
    fn apply(&mut self, update: Box<dyn FnOnce(&mut dyn Any) + Send>);
    fn unmount(&mut self);
    fn controller_any(&self) -> Option<&dyn Any>;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

struct Slot<C: Controller> {
    widget: C::Widget,
    controller: Option<C>,
}

impl<C: Controller> AnyWidget for Slot<C> {
    fn type_name(&self) -> &'static str {
        let full = std::any::type_name::<C::Widget>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn controller_type(&self) -> TypeId {
        TypeId::of::<C>()
    }

    fn mount(&mut self, id: NodeId, tree: &ElementTree) -> Effects {
        let mut controller = C::create(&self.widget);
        let mut ctx = Context::new(id, tree);
        controller.handle_mount(&self.widget, &mut ctx);
        self.controller = Some(controller);
        ctx.into_effects()
    }

    fn migrate(&mut self, next: Box<dyn AnyWidget>) -> Result<(), Box<dyn AnyWidget>> {
        if next.controller_type() != TypeId::of::<C>() {
            return Err(next);
        }
        let next = next
            .into_any()
            .downcast::<Slot<C>>()
            .expect("controller type checked above");
        let old = std::mem::replace(&mut self.widget, next.widget);
        if let Some(controller) = self.controller.as_mut() {
            controller.handle_update(&old, &self.widget);
        }
        Ok(())
    }

    fn contents(&self) -> Vec<Option<Node>> {
        self.controller
            .as_ref()
            .map(|controller| controller.contents(&self.widget))
            .unwrap_or_default()
    }

    fn input(&mut self, id: NodeId, tree: &ElementTree, input: &str) -> Effects {
        let Some(controller) = self.controller.as_mut() else {
            return Effects::default();
        };
        let mut ctx = Context::new(id, tree);
        controller.handle_input(&self.widget, &mut ctx, input);
        ctx.into_effects()
    }

    fn apply(&mut self, update: Box<dyn FnOnce(&mut dyn Any) + Send>) {
        if let Some(controller) = self.controller.as_mut() {
            update(controller);
        }
    }

    fn unmount(&mut self) {
        if let Some(controller) = self.controller.as_mut() {
            controller.handle_unmount(&self.widget);
        }
    }

    fn controller_any(&self) -> Option<&dyn Any> {
        self.controller.as_ref().map(|c| c as &dyn Any)
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A widget value inside a [`Node`].
pub struct WidgetNode(pub(crate) Box<dyn AnyWidget>);

impl WidgetNode {
    pub fn new<W: Widget>(widget: W) -> Self {
        WidgetNode(Box::new(Slot::<W::Controller> {
            widget,
            controller: None,
        }))
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// The mounted controller, when it is a `C`.
    pub fn controller<C: Controller>(&self) -> Option<&C> {
        self.0.controller_any()?.downcast_ref::<C>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_normalizes_to_four_sides() {
        assert_eq!(Spacing::from(2), Spacing::sides(2, 2, 2, 2));
        assert_eq!(Spacing::horizontal(1).along(Axis::Horizontal), 2);
        assert_eq!(Spacing::horizontal(1).along(Axis::Vertical), 0);
    }

    #[test]
    fn chrome_sums_margin_border_padding() {
        let text = Text::new("x")
            .margin(Spacing::left(1))
            .padding(1)
            .border(Border::new(BorderStyle::SINGLE));
        assert_eq!(text.props.chrome(Axis::Horizontal), 1 + 2 + 2);
        assert_eq!(text.props.chrome(Axis::Vertical), 2 + 2);
        assert_eq!(text.props.content_origin(), (3, 2));
    }

    #[test]
    fn partial_border_counts_enabled_sides_only() {
        let border = Border::new(BorderStyle::ROUND).sides(Sides {
            top: true,
            right: false,
            bottom: false,
            left: true,
        });
        assert_eq!(border.along(Axis::Horizontal), 1);
        assert_eq!(border.along(Axis::Vertical), 1);
    }

    #[test]
    #[should_panic(expected = "fractional length")]
    fn fraction_above_one_is_rejected() {
        let _ = Length::fraction(1.5);
    }

    #[test]
    fn text_lines_expand_tabs_and_wrap() {
        let text = Text::new("a\tb c");
        assert_eq!(text.lines(None), vec!["a    b c"]);
        assert_eq!(Text::new("ab cd").lines(Some(3)), vec!["ab", "cd"]);
    }

    #[test]
    fn rule_fills_its_width() {
        assert_eq!(Text::rule().lines(Some(3)), vec!["───"]);
    }
}
