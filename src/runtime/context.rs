//! Controller-facing handles: the hook context, typed update handles, and the exit updater.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::mpsc::Sender;

use crate::core::component::{Axis, Controller};
use crate::runtime::tree::{ElementTree, NodeId};

/// Side effects requested by a controller hook, applied by the tree once the hook returns.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Effects {
    pub(crate) invalidate: bool,
    pub(crate) exit: bool,
}

pub(crate) type Apply = Box<dyn FnOnce(&mut dyn Any) + Send>;

pub(crate) enum Message {
    Update { id: NodeId, apply: Apply },
    Exit,
}

/// Passed to controller hooks while the tree is borrowed.
pub struct Context<'a, C> {
    id: NodeId,
    tree: &'a ElementTree,
    effects: Effects,
    _controller: PhantomData<fn(&mut C)>,
}

impl<'a, C: Controller> Context<'a, C> {
    pub(crate) fn new(id: NodeId, tree: &'a ElementTree) -> Self {
        Self {
            id,
            tree,
            effects: Effects::default(),
            _controller: PhantomData,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Schedule this widget for reconciliation before the next frame.
    pub fn invalidate(&mut self) {
        self.effects.invalidate = true;
    }

    /// Ask the main loop to stop after this pass.
    pub fn exit(&mut self) {
        self.effects.exit = true;
    }

    /// A `Send` handle that can mutate this controller from elsewhere.
    pub fn handle(&self) -> Handle<C> {
        Handle::new(self.id, self.tree.sender())
    }

    pub fn updater(&self) -> Updater {
        Updater::new(self.tree.sender())
    }

    /// Content width of the element in slot `index` of this widget's contents, as of the
    /// last layout pass. `None` before the first layout or for an empty slot.
    pub fn child_content_width(&self, index: usize) -> Option<usize> {
        let child = self.tree.children(self.id).get(index).copied().flatten()?;
        let width = self.tree.try_width(child)?;
        let chrome = self
            .tree
            .node(child)
            .and_then(|node| node.props())
            .map_or(0, |props| props.chrome(Axis::Horizontal));
        Some(width.saturating_sub(chrome))
    }

    pub(crate) fn into_effects(self) -> Effects {
        self.effects
    }
}

/// Posts state changes to one mounted controller through the tree's queue.
///
/// Updates are applied by the main loop on its next pass; the controller is marked dirty
/// afterwards. Updates for a controller that has since been unmounted are dropped.
pub struct Handle<C> {
    id: NodeId,
    sender: Sender<Message>,
    _controller: PhantomData<fn(&mut C)>,
}

impl<C> Clone for Handle<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            sender: self.sender.clone(),
            _controller: PhantomData,
        }
    }
}

impl<C: Controller> Handle<C> {
    pub(crate) fn new(id: NodeId, sender: Sender<Message>) -> Self {
        Self {
            id,
            sender,
            _controller: PhantomData,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Queue `update`. Returns false once the tree is gone.
    pub fn update<F>(&self, update: F) -> bool
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        let apply: Apply = Box::new(move |controller: &mut dyn Any| {
            if let Some(controller) = controller.downcast_mut::<C>() {
                update(controller);
            }
        });
        self.sender
            .send(Message::Update { id: self.id, apply })
            .is_ok()
    }

    pub fn exit(&self) -> bool {
        self.sender.send(Message::Exit).is_ok()
    }
}

/// Requests loop exit from any thread.
#[derive(Clone)]
pub struct Updater {
    sender: Sender<Message>,
}

impl Updater {
    pub(crate) fn new(sender: Sender<Message>) -> Self {
        Self { sender }
    }

    pub fn exit(&self) -> bool {
        self.sender.send(Message::Exit).is_ok()
    }
}
