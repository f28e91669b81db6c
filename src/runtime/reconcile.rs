//! Mount, update and unmount: folds freshly produced contents into the element tree.
//!
//! Slots are matched by index. A node that keeps its kind (and, for widgets, its controller
//! type) at a slot keeps its id, so controller state survives the parent's re-render.

use std::mem;

use tracing::{debug, trace};

use crate::core::component::{Node, WidgetNode};
use crate::runtime::tree::{ElementTree, NodeId};

impl ElementTree {
    /// Mounts `node` as the root, or reconciles it against the current root.
    pub fn mount_root(&mut self, node: impl Into<Node>) -> NodeId {
        let node = node.into();
        if let Some(root) = self.root {
            match self.try_update_in_place(root, node) {
                Ok(()) => return root,
                Err(node) => {
                    self.unmount(root);
                    let id = self.mount(node, None);
                    self.root = Some(id);
                    return id;
                }
            }
        }
        let id = self.mount(node, None);
        self.root = Some(id);
        id
    }

    /// Registers `node` and its subtree under `parent`.
    ///
    /// A widget's controller is created and `handle_mount` runs before its contents are read.
    pub(crate) fn mount(&mut self, node: Node, parent: Option<NodeId>) -> NodeId {
        let id = self.allocate_id();
        if let Some(parent) = parent {
            self.parents.insert(id, parent);
        }
        self.children.insert(id, Vec::new());
        match node {
            Node::Text(text) => {
                self.nodes.insert(id, Node::Text(text));
            }
            Node::Box(mut flex) => {
                let slots = mem::take(&mut flex.children);
                self.nodes.insert(id, Node::Box(flex));
                self.reconcile_children(id, slots);
            }
            Node::Widget(mut widget) => {
                debug!(id = id.raw(), widget = widget.type_name(), "mount");
                let effects = widget.0.mount(id, self);
                let contents = widget.0.contents();
                self.nodes.insert(id, Node::Widget(widget));
                self.apply_effects(id, effects);
                self.reconcile_children(id, contents);
            }
        }
        id
    }

    /// Re-reads a widget's contents and reconciles them against its current children.
    /// Elements carry no contents of their own, so updating one is a no-op.
    pub fn update(&mut self, id: NodeId) {
        let contents = match self.nodes.get(&id) {
            Some(Node::Widget(widget)) => widget.0.contents(),
            _ => return,
        };
        trace!(id = id.raw(), "update");
        self.reconcile_children(id, contents);
    }

    /// Updates every dirty node, parents first. Returns how many were updated.
    pub fn reconcile_dirty(&mut self) -> usize {
        let mut pending: Vec<NodeId> = mem::take(&mut self.dirty).into_iter().collect();
        pending.sort_by_key(|id| (self.depth(*id), *id));
        let mut updated = 0;
        for id in pending {
            if !self.nodes.contains_key(&id) {
                continue;
            }
            self.update(id);
            updated += 1;
        }
        updated
    }

    fn reconcile_children(&mut self, id: NodeId, next: Vec<Option<Node>>) {
        let previous = self.children.remove(&id).unwrap_or_default();
        let len = previous.len().max(next.len());
        let mut next = next.into_iter();
        let mut slots = Vec::with_capacity(len);

        for index in 0..len {
            let old = previous.get(index).copied().flatten();
            let new = next.next().flatten();
            let slot = match (old, new) {
                (None, None) => None,
                (None, Some(node)) => Some(self.mount(node, Some(id))),
                (Some(old), None) => {
                    self.unmount(old);
                    None
                }
                (Some(old), Some(node)) => match self.try_update_in_place(old, node) {
                    Ok(()) => Some(old),
                    Err(node) => {
                        self.unmount(old);
                        Some(self.mount(node, Some(id)))
                    }
                },
            };
            slots.push(slot);
        }

        self.children.insert(id, slots);
    }

    /// Moves `next` into the slot held by `id` when the kinds agree. Hands `next` back
    /// otherwise, leaving `id` untouched.
    fn try_update_in_place(&mut self, id: NodeId, next: Node) -> Result<(), Node> {
        let Some(current) = self.nodes.remove(&id) else {
            return Err(next);
        };
        match (current, next) {
            (Node::Text(_), Node::Text(text)) => {
                self.nodes.insert(id, Node::Text(text));
                Ok(())
            }
            (Node::Box(_), Node::Box(mut flex)) => {
                let slots = mem::take(&mut flex.children);
                self.nodes.insert(id, Node::Box(flex));
                self.reconcile_children(id, slots);
                Ok(())
            }
            (Node::Widget(mut widget), Node::Widget(incoming)) => {
                match widget.0.migrate(incoming.0) {
                    Ok(()) => {
                        let contents = widget.0.contents();
                        self.nodes.insert(id, Node::Widget(widget));
                        self.reconcile_children(id, contents);
                        Ok(())
                    }
                    Err(incoming) => {
                        self.nodes.insert(id, Node::Widget(widget));
                        Err(Node::Widget(WidgetNode(incoming)))
                    }
                }
            }
            (current, next) => {
                self.nodes.insert(id, current);
                Err(next)
            }
        }
    }

    /// Removes `id` and its subtree, children first, then fires `handle_unmount`.
    pub fn unmount(&mut self, id: NodeId) {
        let slots = self.children.remove(&id).unwrap_or_default();
        for child in slots.into_iter().flatten() {
            self.unmount(child);
        }
        if let Some(parent) = self.parents.remove(&id) {
            if let Some(slots) = self.children.get_mut(&parent) {
                for slot in slots.iter_mut().filter(|slot| **slot == Some(id)) {
                    *slot = None;
                }
            }
        }
        self.collapsed.remove(&id);
        self.offsets.remove(&id);
        self.widths.remove(&id);
        self.heights.remove(&id);
        self.dirty.remove(&id);
        if self.root == Some(id) {
            self.root = None;
        }
        if let Some(Node::Widget(mut widget)) = self.nodes.remove(&id) {
            debug!(id = id.raw(), widget = widget.type_name(), "unmount");
            widget.0.unmount();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::core::component::{Controller, Flex, Node, Text, Widget};
    use crate::runtime::context::Context;
    use crate::runtime::tree::ElementTree;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Probe {
        name: &'static str,
        log: Log,
        show_child: bool,
    }

    struct ProbeController {
        mounts: usize,
        updates: usize,
    }

    impl Widget for Probe {
        type Controller = ProbeController;
    }

    impl Controller for ProbeController {
        type Widget = Probe;

        fn create(_widget: &Probe) -> Self {
            Self {
                mounts: 0,
                updates: 0,
            }
        }

        fn handle_mount(&mut self, widget: &Probe, _ctx: &mut Context<'_, Self>) {
            self.mounts += 1;
            widget.log.borrow_mut().push(format!("mount {}", widget.name));
        }

        fn handle_update(&mut self, _old: &Probe, _new: &Probe) {
            self.updates += 1;
        }

        fn handle_unmount(&mut self, widget: &Probe) {
            widget.log.borrow_mut().push(format!("unmount {}", widget.name));
        }

        fn contents(&self, widget: &Probe) -> Vec<Option<Node>> {
            let child = widget.show_child.then(|| {
                Probe {
                    name: "child",
                    log: widget.log.clone(),
                    show_child: false,
                }
                .into_node()
            });
            vec![Some(Text::new(widget.name).into()), child]
        }
    }

    fn probe(name: &'static str, log: &Log, show_child: bool) -> Node {
        Probe {
            name,
            log: log.clone(),
            show_child,
        }
        .into_node()
    }

    #[test]
    fn mount_runs_before_children_and_unmount_runs_children_first() {
        let log = Log::default();
        let mut tree = ElementTree::new();
        let root = tree.mount_root(Flex::vertical().slot(Some(probe("parent", &log, true))));
        tree.mount_root(Flex::vertical().slot(None));
        assert_eq!(
            *log.borrow(),
            vec!["mount parent", "mount child", "unmount child", "unmount parent"]
        );
        assert_eq!(tree.children(root), &[None]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn same_type_keeps_controller_and_id() {
        let log = Log::default();
        let mut tree = ElementTree::new();
        let root = tree.mount_root(Flex::vertical().child(probe("a", &log, false)));
        let widget = tree.children(root)[0].unwrap();

        tree.mount_root(Flex::vertical().child(probe("b", &log, false)));
        assert_eq!(tree.children(root)[0], Some(widget));
        let controller = tree.controller::<ProbeController>(widget).unwrap();
        assert_eq!((controller.mounts, controller.updates), (1, 1));

        let label = tree.children(widget)[0].unwrap();
        match tree.node(label) {
            Some(Node::Text(text)) => assert_eq!(text.content, "b"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn kind_change_replaces_the_node() {
        let log = Log::default();
        let mut tree = ElementTree::new();
        let root = tree.mount_root(Flex::vertical().child(probe("a", &log, false)));
        let widget = tree.children(root)[0].unwrap();

        tree.mount_root(Flex::vertical().child(Text::new("plain")));
        let replacement = tree.children(root)[0].unwrap();
        assert_ne!(replacement, widget);
        assert!(!tree.contains(widget));
        assert_eq!(*log.borrow(), vec!["mount a", "unmount a"]);
    }

    #[test]
    fn shorter_contents_clear_trailing_slots() {
        let mut tree = ElementTree::new();
        let root = tree.mount_root(
            Flex::vertical()
                .child(Text::new("a"))
                .child(Text::new("b"))
                .child(Text::new("c")),
        );
        tree.mount_root(Flex::vertical().child(Text::new("a")));
        let slots = tree.children(root);
        assert_eq!(slots.len(), 3);
        assert!(slots[0].is_some());
        assert_eq!(&slots[1..], &[None, None]);
    }

    #[test]
    fn dirty_nodes_that_were_unmounted_are_skipped() {
        let log = Log::default();
        let mut tree = ElementTree::new();
        let root = tree.mount_root(Flex::vertical().child(probe("p", &log, true)));
        let parent = tree.children(root)[0].unwrap();
        let child = tree.children(parent)[1].unwrap();
        tree.mark_dirty(child);
        tree.unmount(child);
        assert_eq!(tree.reconcile_dirty(), 0);
    }
}
