// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory document for tests: capture → target → bubble dispatch, a manual clock,
//! and recorded emissions.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use hashbrown::HashMap;
use kurbo::{Point, Rect, Vec2};

use crate::binder::PointerBindings;
use crate::click::ClickMarker;
use crate::host::{
    ElementInfo, ElementTag, Handler, Host, ListenPhase, ListenerHandle, RawEvent, RawInput,
    SyntheticInit, Task,
};
use crate::types::TouchPoint;

pub(crate) type NodeId = u32;

pub(crate) const DOCUMENT: NodeId = 0;
pub(crate) const BODY: NodeId = 1;

#[derive(Default)]
struct NodeData {
    parent: Option<NodeId>,
    info: ElementInfo,
    id: Option<String>,
    classes: Vec<&'static str>,
    marker: Option<ClickMarker>,
    rect: Option<Rect>,
}

struct Registered {
    id: u64,
    phase: ListenPhase,
    handler: Rc<Handler<TestHost>>,
}

type Table = HashMap<(NodeId, String), Vec<Registered>>;

/// A synthetic event passed to [`Host::emit`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Emitted {
    pub(crate) node: NodeId,
    pub(crate) event_type: String,
    pub(crate) init: SyntheticInit<NodeId>,
}

pub(crate) struct TestHost {
    nodes: RefCell<Vec<NodeData>>,
    listeners: Rc<RefCell<Table>>,
    next_listener: Cell<u64>,
    clock: Cell<u64>,
    scroll: Cell<Vec2>,
    deferred: RefCell<Vec<Task<Self>>>,
    ready: RefCell<Vec<Task<Self>>>,
    emitted: RefCell<Vec<Emitted>>,
    published: Cell<bool>,
}

pub(crate) struct TestHandle {
    table: Weak<RefCell<Table>>,
    key: (NodeId, String),
    id: u64,
}

impl ListenerHandle for TestHandle {
    fn remove(self) {
        let Some(table) = self.table.upgrade() else {
            return;
        };
        let mut table = table.borrow_mut();
        if let Some(list) = table.get_mut(&self.key) {
            list.retain(|r| r.id != self.id);
            if list.is_empty() {
                table.remove(&self.key);
            }
        }
    }
}

impl TestHost {
    /// A document containing only a body.
    pub(crate) fn new() -> Rc<Self> {
        let host = Self {
            nodes: RefCell::new(vec![NodeData::default(), NodeData::default()]),
            listeners: Rc::new(RefCell::new(HashMap::new())),
            next_listener: Cell::new(0),
            clock: Cell::new(10_000),
            scroll: Cell::new(Vec2::ZERO),
            deferred: RefCell::new(Vec::new()),
            ready: RefCell::new(Vec::new()),
            emitted: RefCell::new(Vec::new()),
            published: Cell::new(false),
        };
        host.nodes.borrow_mut()[BODY as usize].parent = Some(DOCUMENT);
        Rc::new(host)
    }

    /// Append an element under `parent`.
    pub(crate) fn add(&self, parent: NodeId, tag: ElementTag) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(NodeData {
            parent: Some(parent),
            info: ElementInfo {
                tag,
                ..ElementInfo::default()
            },
            ..NodeData::default()
        });
        NodeId::try_from(nodes.len() - 1).expect("test documents stay small")
    }

    pub(crate) fn update(&self, node: NodeId, f: impl FnOnce(&mut ElementInfo)) {
        f(&mut self.nodes.borrow_mut()[node as usize].info);
    }

    pub(crate) fn set_marker(&self, node: NodeId, marker: ClickMarker) {
        self.nodes.borrow_mut()[node as usize].marker = Some(marker);
    }

    pub(crate) fn set_rect(&self, node: NodeId, rect: Rect) {
        self.nodes.borrow_mut()[node as usize].rect = Some(rect);
    }

    pub(crate) fn set_id(&self, node: NodeId, id: &str) {
        self.nodes.borrow_mut()[node as usize].id = Some(id.to_string());
    }

    pub(crate) fn add_class(&self, node: NodeId, class: &'static str) {
        self.nodes.borrow_mut()[node as usize].classes.push(class);
    }

    pub(crate) fn set_scroll(&self, scroll: Vec2) {
        self.scroll.set(scroll);
    }

    pub(crate) fn advance(&self, ms: u64) {
        self.clock.set(self.clock.get() + ms);
    }

    /// Run the document-ready callbacks.
    pub(crate) fn make_ready(&self) {
        let tasks = core::mem::take(&mut *self.ready.borrow_mut());
        for task in tasks {
            task(self);
        }
    }

    /// Run deferred tasks until none remain.
    pub(crate) fn flush(&self) {
        loop {
            let tasks = core::mem::take(&mut *self.deferred.borrow_mut());
            if tasks.is_empty() {
                return;
            }
            for task in tasks {
                task(self);
            }
        }
    }

    pub(crate) fn published(&self) -> bool {
        self.published.get()
    }

    pub(crate) fn emitted(&self) -> Vec<Emitted> {
        self.emitted.borrow().clone()
    }

    pub(crate) fn emitted_of(&self, event_type: &str) -> Vec<Emitted> {
        self.emitted
            .borrow()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    pub(crate) fn clear_emitted(&self) {
        self.emitted.borrow_mut().clear();
    }

    /// Number of listeners for `event_type` on `node`.
    pub(crate) fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners
            .borrow()
            .get(&(node, event_type.to_string()))
            .map_or(0, Vec::len)
    }

    /// Whether any listener for `event_type` exists anywhere.
    pub(crate) fn listens_to(&self, event_type: &str) -> bool {
        self.listeners
            .borrow()
            .keys()
            .any(|(_, ty)| ty == event_type)
    }

    /// Dispatch `event` through capture, target, and (if it bubbles) bubble phases.
    pub(crate) fn dispatch(&self, event_type: &str, event: &RawInput<NodeId>) {
        let mut path = vec![event.target];
        while let Some(parent) = self.parent(path.last().expect("path starts non-empty")) {
            path.push(parent);
        }
        path.reverse();
        let (target, ancestors) = path.split_last().expect("path contains the target");

        for node in ancestors {
            if self.run(*node, event_type, ListenPhase::Capture, event) {
                return;
            }
        }
        // Stopping propagation at the target still runs the target's other listeners.
        self.run(*target, event_type, ListenPhase::Capture, event);
        if self.run(*target, event_type, ListenPhase::Bubble, event) {
            return;
        }
        if !event.bubbles {
            return;
        }
        for node in ancestors.iter().rev() {
            if self.run(*node, event_type, ListenPhase::Bubble, event) {
                return;
            }
        }
    }

    /// Run listeners; returns whether propagation was stopped.
    fn run(
        &self,
        node: NodeId,
        event_type: &str,
        phase: ListenPhase,
        event: &RawInput<NodeId>,
    ) -> bool {
        let handlers: Vec<_> = self
            .listeners
            .borrow()
            .get(&(node, event_type.to_string()))
            .map(|list| {
                list.iter()
                    .filter(|r| r.phase == phase)
                    .map(|r| r.handler.clone())
                    .collect()
            })
            .unwrap_or_default();
        for handler in handlers {
            if event.immediate_propagation_stopped() {
                break;
            }
            handler(self, event);
        }
        event.propagation_stopped()
    }
}

impl Host for TestHost {
    type Node = NodeId;
    type Event = RawInput<NodeId>;
    type Handle = TestHandle;

    fn listen(
        &self,
        node: &NodeId,
        event_type: &str,
        phase: ListenPhase,
        handler: Handler<Self>,
    ) -> TestHandle {
        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        let key = (*node, event_type.to_string());
        self.listeners
            .borrow_mut()
            .entry(key.clone())
            .or_default()
            .push(Registered {
                id,
                phase,
                handler: Rc::new(handler),
            });
        TestHandle {
            table: Rc::downgrade(&self.listeners),
            key,
            id,
        }
    }

    fn emit(&self, node: &NodeId, event_type: &str, init: SyntheticInit<NodeId>) {
        self.emitted.borrow_mut().push(Emitted {
            node: *node,
            event_type: event_type.to_string(),
            init: init.clone(),
        });
        self.dispatch(event_type, &RawInput::synthetic(*node, init));
    }

    fn document(&self) -> NodeId {
        DOCUMENT
    }

    fn body(&self) -> NodeId {
        BODY
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(*node as usize)?.parent
    }

    fn by_id(&self, id: &str) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        let index = nodes.iter().position(|n| n.id.as_deref() == Some(id))?;
        NodeId::try_from(index).ok()
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.nodes
            .borrow()
            .get(*node as usize)
            .is_some_and(|n| n.classes.contains(&class))
    }

    fn element(&self, node: &NodeId) -> ElementInfo {
        self.nodes
            .borrow()
            .get(*node as usize)
            .map(|n| n.info.clone())
            .unwrap_or_default()
    }

    fn click_marker(&self, node: &NodeId) -> Option<ClickMarker> {
        self.nodes.borrow().get(*node as usize)?.marker
    }

    fn element_from_point(&self, point: Point) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        let index = nodes
            .iter()
            .rposition(|n| n.rect.is_some_and(|r| r.contains(point)))?;
        NodeId::try_from(index).ok()
    }

    fn scroll_offset(&self) -> Vec2 {
        self.scroll.get()
    }

    fn now(&self) -> u64 {
        self.clock.get()
    }

    fn defer(&self, task: Task<Self>) {
        self.deferred.borrow_mut().push(task);
    }

    fn on_ready(&self, task: Task<Self>) {
        self.ready.borrow_mut().push(task);
    }

    fn publish_bindings(&self, _bindings: &PointerBindings<Self>) {
        self.published.set(true);
    }
}

/// Touch event with one changed contact `identifier` at page point `at`, where
/// `active` lists the identifiers still on the surface.
pub(crate) fn touch_event(
    target: NodeId,
    identifier: u32,
    at: Point,
    active: &[u32],
) -> RawInput<NodeId> {
    let contact = TouchPoint::new(identifier, target, at);
    let touches = active
        .iter()
        .map(|&id| {
            if id == identifier {
                contact.clone()
            } else {
                TouchPoint::new(id, target, Point::ZERO)
            }
        })
        .collect();
    RawInput::touch(target, touches, vec![contact])
}

/// Plain click or mouse button event at the origin.
pub(crate) fn mouse_event(target: NodeId) -> RawInput<NodeId> {
    RawInput::mouse(target, Point::ZERO).with_which(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_runs_capture_then_bubble() {
        let host = TestHost::new();
        let child = host.add(BODY, ElementTag::Other);
        let seen = Rc::new(RefCell::new(Vec::new()));
        for (node, phase) in [
            (DOCUMENT, ListenPhase::Bubble),
            (DOCUMENT, ListenPhase::Capture),
            (child, ListenPhase::Bubble),
        ] {
            let seen = seen.clone();
            let _ = host.listen(
                &node,
                "tap",
                phase,
                Box::new(move |_, _| seen.borrow_mut().push((node, phase))),
            );
        }
        host.dispatch("tap", &mouse_event(child));
        assert_eq!(
            *seen.borrow(),
            vec![
                (DOCUMENT, ListenPhase::Capture),
                (child, ListenPhase::Bubble),
                (DOCUMENT, ListenPhase::Bubble),
            ]
        );
    }

    #[test]
    fn stop_in_capture_skips_target() {
        let host = TestHost::new();
        let child = host.add(BODY, ElementTag::Other);
        let reached = Rc::new(Cell::new(false));
        let _ = host.listen(
            &DOCUMENT,
            "tap",
            ListenPhase::Capture,
            Box::new(|_, e| e.stop_propagation()),
        );
        let flag = reached.clone();
        let _ = host.listen(
            &child,
            "tap",
            ListenPhase::Bubble,
            Box::new(move |_, _| flag.set(true)),
        );
        host.dispatch("tap", &mouse_event(child));
        assert!(!reached.get());
    }

    #[test]
    fn removed_listener_is_gone() {
        let host = TestHost::new();
        let handle = host.listen(&BODY, "tap", ListenPhase::Bubble, Box::new(|_, _| {}));
        assert_eq!(host.listener_count(BODY, "tap"), 1);
        handle.remove();
        assert_eq!(host.listener_count(BODY, "tap"), 0);
        assert!(!host.listens_to("tap"));
    }
}
