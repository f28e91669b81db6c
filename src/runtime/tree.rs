//! Element tree: node storage, parent/child links, geometry and the dirty set.
//!
//! The tree owns every mounted node. Box children and widget contents are moved out of
//! their parent node into `children`, so a node is reachable only by its [`NodeId`].

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::trace;

use crate::core::component::{Controller, Node};
use crate::runtime::context::{Effects, Handle, Message, Updater};

/// Identity of a mounted node. Never reused within one tree.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(u64);

impl NodeId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

pub struct ElementTree {
    pub(crate) root: Option<NodeId>,
    next_id: u64,
    pub(crate) nodes: HashMap<NodeId, Node>,
    pub(crate) parents: HashMap<NodeId, NodeId>,
    pub(crate) children: HashMap<NodeId, Vec<Option<NodeId>>>,
    pub(crate) collapsed: HashMap<NodeId, Vec<NodeId>>,
    pub(crate) offsets: HashMap<NodeId, (usize, usize)>,
    pub(crate) widths: HashMap<NodeId, usize>,
    pub(crate) heights: HashMap<NodeId, usize>,
    pub(crate) dirty: HashSet<NodeId>,
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    exit_requested: bool,
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTree {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            root: None,
            next_id: 0,
            nodes: HashMap::new(),
            parents: HashMap::new(),
            children: HashMap::new(),
            collapsed: HashMap::new(),
            offsets: HashMap::new(),
            widths: HashMap::new(),
            heights: HashMap::new(),
            dirty: HashSet::new(),
            sender,
            receiver,
            exit_requested: false,
        }
    }

    pub(crate) fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id = self.next_id.checked_add(1).expect("node id overflowed u64");
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    /// Child slots as last reconciled, widgets included.
    pub fn children(&self, id: NodeId) -> &[Option<NodeId>] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Elements this node lays out, with widgets expanded and invisible elements dropped.
    pub fn collapsed_children(&self, id: NodeId) -> &[NodeId] {
        self.collapsed.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolved width. Panics when `id` has not been laid out.
    pub fn width(&self, id: NodeId) -> usize {
        self.try_width(id)
            .unwrap_or_else(|| panic!("width of {id:?} read before layout"))
    }

    /// Resolved height. Panics when `id` has not been laid out.
    pub fn height(&self, id: NodeId) -> usize {
        self.try_height(id)
            .unwrap_or_else(|| panic!("height of {id:?} read before layout"))
    }

    /// Absolute `(x, y)` of the node's top-left corner. Panics when `id` has not been laid out.
    pub fn offset(&self, id: NodeId) -> (usize, usize) {
        self.offsets
            .get(&id)
            .copied()
            .unwrap_or_else(|| panic!("offset of {id:?} read before layout"))
    }

    pub fn try_width(&self, id: NodeId) -> Option<usize> {
        self.widths.get(&id).copied()
    }

    pub fn try_height(&self, id: NodeId) -> Option<usize> {
        self.heights.get(&id).copied()
    }

    /// Distance from the root; the root is 0.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parents.get(&current) {
            current = *parent;
            depth += 1;
        }
        depth
    }

    pub fn mark_dirty(&mut self, id: NodeId) {
        if self.nodes.contains_key(&id) {
            self.dirty.insert(id);
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub(crate) fn sender(&self) -> Sender<Message> {
        self.sender.clone()
    }

    pub fn updater(&self) -> Updater {
        Updater::new(self.sender())
    }

    /// The controller mounted at `id`, when it is a `C`.
    pub fn controller<C: Controller>(&self, id: NodeId) -> Option<&C> {
        match self.nodes.get(&id)? {
            Node::Widget(widget) => widget.controller::<C>(),
            _ => None,
        }
    }

    /// First mounted widget (pre-order) whose controller is a `C`.
    pub fn find<C: Controller>(&self) -> Option<NodeId> {
        let root = self.root?;
        self.preorder(root)
            .into_iter()
            .find(|id| self.controller::<C>(*id).is_some())
    }

    pub fn handle<C: Controller>(&self, id: NodeId) -> Option<Handle<C>> {
        self.controller::<C>(id)?;
        Some(Handle::new(id, self.sender()))
    }

    pub(crate) fn preorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            order.push(id);
            for child in self.children(id).iter().rev().flatten() {
                stack.push(*child);
            }
        }
        order
    }

    pub(crate) fn apply_effects(&mut self, id: NodeId, effects: Effects) {
        if effects.invalidate {
            self.mark_dirty(id);
        }
        if effects.exit {
            self.exit_requested = true;
        }
    }

    /// Delivers `input` to every mounted widget in tree order.
    pub fn propagate(&mut self, input: &str) {
        let Some(root) = self.root else {
            return;
        };
        for id in self.preorder(root) {
            let Some(mut node) = self.nodes.remove(&id) else {
                continue;
            };
            let effects = match &mut node {
                Node::Widget(widget) => widget.0.input(id, self, input),
                _ => Effects::default(),
            };
            self.nodes.insert(id, node);
            self.apply_effects(id, effects);
        }
    }

    /// Applies queued out-of-band updates. Returns how many reached a mounted controller.
    pub fn drain_messages(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.receiver.try_recv() {
            match message {
                Message::Update { id, apply } => match self.nodes.get_mut(&id) {
                    Some(Node::Widget(widget)) => {
                        widget.0.apply(apply);
                        self.dirty.insert(id);
                        applied += 1;
                    }
                    _ => trace!(id = id.raw(), "dropped update for unmounted widget"),
                },
                Message::Exit => self.exit_requested = true,
            }
        }
        applied
    }

    /// Indented outline of node kinds and widget type names.
    pub fn format(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.format_node(root, 0, &mut out);
        }
        out
    }

    fn format_node(&self, id: NodeId, level: usize, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let prefix = if level > 0 {
            format!("{}└─", "  ".repeat(level - 1))
        } else {
            String::new()
        };
        let _ = match node {
            Node::Text(text) => writeln!(out, "{prefix}Text({:?})", text.content),
            other => writeln!(out, "{prefix}{}", other.kind_name()),
        };
        for child in self.children(id).iter().flatten() {
            self.format_node(*child, level + 1, out);
        }
    }
}
