// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host integration: the services this crate consumes and the raw event view it reads.
//!
//! ## Overview
//!
//! The crate does not own a document, an event bus or a clock. A host (a `web-sys`
//! binding, a test harness, an embedded browser shell) implements [`Host`] and hands
//! raw events to the handlers registered through [`Host::listen`].
//!
//! Raw events are read through [`RawEvent`]. Every accessor has a default that models
//! an absent field (`None`, `false`, empty), so a host only overrides what its engine
//! actually reports. [`RawInput`] is a plain-data implementation for hosts that
//! convert engine events into values up front.
//!
//! ## Handlers
//!
//! Handlers receive the host by reference along with the event. This keeps the
//! closures stored by the host free of references back to it.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt::Debug;

use kurbo::{Point, Vec2};

use crate::binder::PointerBindings;
use crate::click::ClickMarker;
use crate::types::{Buttons, Modifiers, PointerId, PointerType, TouchPoint};

/// Listener callback registered with [`Host::listen`].
pub type Handler<H> = Box<dyn Fn(&H, &<H as Host>::Event)>;

/// Work item for [`Host::defer`] and [`Host::on_ready`].
pub type Task<H> = Box<dyn FnOnce(&H)>;

/// Propagation phase a listener is registered for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ListenPhase {
    /// Runs on the way down, before any target or bubble listener.
    Capture,
    /// Runs at the target and on the way up.
    Bubble,
}

/// Handle returned by [`Host::listen`].
pub trait ListenerHandle {
    /// Detach the listener.
    fn remove(self);
}

/// Element facts the click emulator needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementInfo {
    /// Tag category.
    pub tag: ElementTag,
    /// Value of the `type` attribute, for form controls.
    pub control_type: ControlType,
    /// Whether the element is a disabled form control.
    pub disabled: bool,
    /// The `for` attribute of a label.
    pub html_for: Option<String>,
}

impl ElementInfo {
    /// Whether a suppressed native click must still run its default action.
    ///
    /// Media and text controls need it for playback and keyboard popup; radios and
    /// checkboxes need it to keep their checked state in sync.
    pub fn keeps_native_click(&self) -> bool {
        matches!(
            self.tag,
            ElementTag::Audio | ElementTag::Video | ElementTag::TextArea | ElementTag::Input
        ) || matches!(self.control_type, ControlType::Radio | ControlType::Checkbox)
    }
}

/// Tag categories the pointer layer distinguishes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ElementTag {
    /// `<label>`
    Label,
    /// `<input>`
    Input,
    /// `<textarea>`
    TextArea,
    /// `<audio>`
    Audio,
    /// `<video>`
    Video,
    /// Anything else.
    #[default]
    Other,
}

/// Control types the pointer layer distinguishes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ControlType {
    /// `type="radio"`
    Radio,
    /// `type="checkbox"`
    Checkbox,
    /// Any other or no type.
    #[default]
    Other,
}

/// Pointer attributes carried by a native pointer event.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NativePointer {
    /// Engine-assigned pointer id.
    pub pointer_id: PointerId,
    /// Device kind.
    pub pointer_type: PointerType,
    /// Whether this is the primary pointer of its type.
    pub is_primary: bool,
    /// Normalized pressure.
    pub pressure: f64,
    /// Contact width.
    pub width: f64,
    /// Contact height.
    pub height: f64,
    /// Tilt along the x axis in degrees.
    pub tilt_x: f64,
    /// Tilt along the y axis in degrees.
    pub tilt_y: f64,
}

/// Read-only view of a raw engine event.
pub trait RawEvent<K> {
    /// Node the event was dispatched to.
    fn target(&self) -> K;

    /// Node whose listener is currently running.
    fn current_target(&self) -> Option<K> {
        None
    }

    /// Secondary node for over/out style events.
    fn related_target(&self) -> Option<K> {
        None
    }

    /// Viewport coordinates.
    fn client(&self) -> Option<Point> {
        None
    }

    /// Page coordinates.
    fn page(&self) -> Option<Point> {
        None
    }

    /// Screen coordinates.
    fn screen(&self) -> Option<Point> {
        None
    }

    /// Pressed-button bitmask, when the engine reports one.
    fn buttons(&self) -> Option<Buttons> {
        None
    }

    /// Legacy single-button code.
    fn which(&self) -> Option<u16> {
        None
    }

    /// Contact pressure, when the engine reports one.
    fn pressure(&self) -> Option<f64> {
        None
    }

    /// Held modifier keys.
    fn modifiers(&self) -> Modifiers {
        Modifiers::empty()
    }

    /// All contacts currently on the surface.
    fn touches(&self) -> &[TouchPoint<K>] {
        &[]
    }

    /// Contacts that changed in this event; `None` for events that are not touch events.
    fn changed_touches(&self) -> Option<&[TouchPoint<K>]> {
        None
    }

    /// Contacts that started on the target.
    fn target_touches(&self) -> &[TouchPoint<K>] {
        &[]
    }

    /// Pointer attributes of a native pointer event.
    fn native_pointer(&self) -> Option<NativePointer> {
        None
    }

    /// Whether this is a click synthesized by the click emulator.
    fn is_synthetic_click(&self) -> bool {
        false
    }

    /// Cancel the default action.
    fn prevent_default(&self);

    /// Stop propagation to further nodes.
    fn stop_propagation(&self);

    /// Stop propagation, including remaining listeners on the current node.
    fn stop_immediate_propagation(&self) {
        self.stop_propagation();
    }
}

/// Copy of a touch event's lists and modifiers carried by synthetic touch events.
///
/// Fields are copied one by one rather than by iterating the source's properties:
/// some engines expose touch lists and modifier flags as non-enumerable.
#[derive(Clone, Debug, PartialEq)]
pub struct EventSnapshot<K> {
    /// Viewport coordinates.
    pub client: Option<Point>,
    /// Page coordinates.
    pub page: Option<Point>,
    /// Screen coordinates.
    pub screen: Option<Point>,
    /// Held modifiers.
    pub modifiers: Modifiers,
    /// Active contacts.
    pub touches: Vec<TouchPoint<K>>,
    /// Changed contacts.
    pub changed_touches: Option<Vec<TouchPoint<K>>>,
    /// Contacts that started on the original target.
    pub target_touches: Vec<TouchPoint<K>>,
}

impl<K: Clone> EventSnapshot<K> {
    /// Copy the touch-related state of `event`.
    pub fn of<E: RawEvent<K> + ?Sized>(event: &E) -> Self {
        Self {
            client: event.client(),
            page: event.page(),
            screen: event.screen(),
            modifiers: event.modifiers(),
            touches: event.touches().to_vec(),
            changed_touches: event.changed_touches().map(<[_]>::to_vec),
            target_touches: event.target_touches().to_vec(),
        }
    }
}

/// Initialization data for an event emitted through [`Host::emit`].
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticInit<K> {
    /// Whether the event bubbles.
    pub bubbles: bool,
    /// Whether the event can be canceled.
    pub cancelable: bool,
    /// Secondary node for over/out events.
    pub related_target: Option<K>,
    /// Marks clicks generated by the click emulator.
    pub synthetic_click: bool,
    /// Payload copied from the raw event this one derives from.
    pub snapshot: Option<EventSnapshot<K>>,
}

impl<K> SyntheticInit<K> {
    /// Bubbling, cancelable click marked as synthetic.
    pub fn click() -> Self {
        Self {
            bubbles: true,
            cancelable: true,
            related_target: None,
            synthetic_click: true,
            snapshot: None,
        }
    }

    /// Bubbling hover transition with a cross reference.
    pub fn hover(related_target: K) -> Self {
        Self {
            bubbles: true,
            cancelable: false,
            related_target: Some(related_target),
            synthetic_click: false,
            snapshot: None,
        }
    }

    /// Attach the touch state of the event that triggered this one.
    pub fn with_snapshot(mut self, snapshot: EventSnapshot<K>) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Bubbling copy of another event's touch state.
    pub fn copy_of(snapshot: EventSnapshot<K>) -> Self {
        Self {
            bubbles: true,
            cancelable: false,
            related_target: None,
            synthetic_click: false,
            snapshot: Some(snapshot),
        }
    }
}

/// Services the pointer layer consumes from its environment.
pub trait Host: Sized + 'static {
    /// Node handle. Cheap to clone.
    type Node: Clone + PartialEq + Debug + 'static;
    /// Raw event type handed to handlers.
    type Event: RawEvent<Self::Node> + 'static;
    /// Listener handle.
    type Handle: ListenerHandle + 'static;

    /// Register `handler` for `event_type` events reaching `node` in `phase`.
    fn listen(
        &self,
        node: &Self::Node,
        event_type: &str,
        phase: ListenPhase,
        handler: Handler<Self>,
    ) -> Self::Handle;

    /// Dispatch a synthetic event of `event_type` at `node`.
    fn emit(&self, node: &Self::Node, event_type: &str, init: SyntheticInit<Self::Node>);

    /// The document node; document-wide listeners attach here.
    fn document(&self) -> Self::Node;

    /// The body node.
    fn body(&self) -> Self::Node;

    /// Parent of `node`, `None` at the root.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Node with the given id attribute.
    fn by_id(&self, id: &str) -> Option<Self::Node>;

    /// Whether `node` carries the CSS class `class`.
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    /// Element facts for `node`.
    fn element(&self, node: &Self::Node) -> ElementInfo;

    /// Fast-click opt-in marker set directly on `node`.
    fn click_marker(&self, node: &Self::Node) -> Option<ClickMarker>;

    /// Topmost node at the given viewport point.
    fn element_from_point(&self, point: Point) -> Option<Self::Node>;

    /// Current page scroll offset.
    fn scroll_offset(&self) -> Vec2;

    /// Current time in milliseconds.
    fn now(&self) -> u64;

    /// Run `task` after the current event dispatch pass completes.
    fn defer(&self, task: Task<Self>);

    /// Run `task` once the document is ready.
    fn on_ready(&self, task: Task<Self>);

    /// Receive the bindings table for namespace-style discovery.
    ///
    /// Only called when [`PointerConfig::extend_namespace`](crate::config::PointerConfig::extend_namespace) is set.
    fn publish_bindings(&self, bindings: &PointerBindings<Self>) {
        let _ = bindings;
    }
}

/// Plain-data raw event.
///
/// Propagation and default-prevention requests are recorded in cells so the event can
/// be shared immutably between listeners.
#[derive(Clone, Debug)]
pub struct RawInput<K> {
    /// Dispatch target.
    pub target: K,
    /// Node whose listener is running.
    pub current_target: Option<K>,
    /// Secondary node.
    pub related_target: Option<K>,
    /// Viewport coordinates.
    pub client: Option<Point>,
    /// Page coordinates.
    pub page: Option<Point>,
    /// Screen coordinates.
    pub screen: Option<Point>,
    /// Pressed-button bitmask.
    pub buttons: Option<Buttons>,
    /// Legacy button code.
    pub which: Option<u16>,
    /// Pressure.
    pub pressure: Option<f64>,
    /// Held modifiers.
    pub modifiers: Modifiers,
    /// Active contacts.
    pub touches: Vec<TouchPoint<K>>,
    /// Changed contacts.
    pub changed_touches: Option<Vec<TouchPoint<K>>>,
    /// Contacts that started on the target.
    pub target_touches: Vec<TouchPoint<K>>,
    /// Native pointer attributes.
    pub native: Option<NativePointer>,
    /// Synthetic click marker.
    pub synthetic_click: bool,
    /// Whether the event bubbles.
    pub bubbles: bool,
    /// Whether the event can be canceled.
    pub cancelable: bool,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    immediate_propagation_stopped: Cell<bool>,
}

impl<K: Clone + PartialEq> RawInput<K> {
    /// Event at `target` with every optional field absent.
    pub fn new(target: K) -> Self {
        Self {
            target,
            current_target: None,
            related_target: None,
            client: None,
            page: None,
            screen: None,
            buttons: None,
            which: None,
            pressure: None,
            modifiers: Modifiers::empty(),
            touches: Vec::new(),
            changed_touches: None,
            target_touches: Vec::new(),
            native: None,
            synthetic_click: false,
            bubbles: false,
            cancelable: false,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
            immediate_propagation_stopped: Cell::new(false),
        }
    }

    /// Bubbling mouse event at viewport point `client`.
    pub fn mouse(target: K, client: Point) -> Self {
        Self {
            client: Some(client),
            page: Some(client),
            screen: Some(client),
            bubbles: true,
            cancelable: true,
            ..Self::new(target)
        }
    }

    /// Bubbling touch event with the given active and changed contacts.
    ///
    /// The event's own coordinates are those of the first changed contact.
    pub fn touch(target: K, touches: Vec<TouchPoint<K>>, changed: Vec<TouchPoint<K>>) -> Self {
        let target_touches = touches
            .iter()
            .filter(|t| t.target == target)
            .cloned()
            .collect();
        let first = changed.first();
        Self {
            client: first.and_then(|t| t.client),
            page: first.map(|t| t.page),
            screen: first.map(|t| t.screen),
            touches,
            target_touches,
            changed_touches: Some(changed),
            bubbles: true,
            cancelable: true,
            ..Self::new(target)
        }
    }

    /// Event built from a [`SyntheticInit`], as a host would for [`Host::emit`].
    pub fn synthetic(target: K, init: SyntheticInit<K>) -> Self {
        let mut event = Self {
            related_target: init.related_target,
            synthetic_click: init.synthetic_click,
            bubbles: init.bubbles,
            cancelable: init.cancelable,
            ..Self::new(target)
        };
        if let Some(snapshot) = init.snapshot {
            event.client = snapshot.client;
            event.page = snapshot.page;
            event.screen = snapshot.screen;
            event.modifiers = snapshot.modifiers;
            event.touches = snapshot.touches;
            event.changed_touches = snapshot.changed_touches;
            event.target_touches = snapshot.target_touches;
        }
        event
    }

    /// Set the legacy button code.
    pub fn with_which(mut self, which: u16) -> Self {
        self.which = Some(which);
        self
    }

    /// Set the button bitmask.
    pub fn with_buttons(mut self, buttons: Buttons) -> Self {
        self.buttons = Some(buttons);
        self
    }

    /// Attach native pointer attributes.
    pub fn with_native(mut self, native: NativePointer) -> Self {
        self.native = Some(native);
        self
    }

    /// Whether a listener called [`RawEvent::prevent_default`].
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Whether a listener stopped propagation.
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// Whether a listener stopped immediate propagation.
    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped.get()
    }
}

impl<K: Clone> RawEvent<K> for RawInput<K> {
    fn target(&self) -> K {
        self.target.clone()
    }

    fn current_target(&self) -> Option<K> {
        self.current_target.clone()
    }

    fn related_target(&self) -> Option<K> {
        self.related_target.clone()
    }

    fn client(&self) -> Option<Point> {
        self.client
    }

    fn page(&self) -> Option<Point> {
        self.page
    }

    fn screen(&self) -> Option<Point> {
        self.screen
    }

    fn buttons(&self) -> Option<Buttons> {
        self.buttons
    }

    fn which(&self) -> Option<u16> {
        self.which
    }

    fn pressure(&self) -> Option<f64> {
        self.pressure
    }

    fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    fn touches(&self) -> &[TouchPoint<K>] {
        &self.touches
    }

    fn changed_touches(&self) -> Option<&[TouchPoint<K>]> {
        self.changed_touches.as_deref()
    }

    fn target_touches(&self) -> &[TouchPoint<K>] {
        &self.target_touches
    }

    fn native_pointer(&self) -> Option<NativePointer> {
        self.native
    }

    fn is_synthetic_click(&self) -> bool {
        self.synthetic_click
    }

    fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_propagation_stopped.set(true);
    }
}
