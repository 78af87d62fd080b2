// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pointer runtime: shared state and document-level wiring.
//!
//! [`Pointer`] owns everything that would otherwise be page-global: the time of the
//! last touch (for the mouse cooldown), the click candidate, the hovered node and the
//! listeners installed on the document. Each runtime is independent, so several can
//! coexist over different hosts.
//!
//! On touch engines, once the host reports the document ready:
//!
//! - With native pointer events, a capturing pointer-down listener starts tap tracking.
//!   Hover comes from the engine.
//! - Without them, capturing `touchstart` and bubbling `touchmove`/`touchend` listeners
//!   drive the [`HoverTracker`] and emit `touch.over`, `touch.out`, `touch.move` and
//!   `touch.end`.
//!
//! Tap tracking installs its own capturing listeners the first time a tap arms.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::Point;

use crate::binder::{PointerBindings, Tier, select_source};
use crate::click::{ClickEmulator, ClickPhase, find_marker};
use crate::config::{Capabilities, PointerConfig};
use crate::host::{
    ElementTag, EventSnapshot, Host, ListenPhase, ListenerHandle, RawEvent, SyntheticInit,
};
use crate::hover::{HoverTracker, HoverTransition, hit_test_point};
use crate::types::{Gesture, TOUCH_END, TOUCH_MOVE, TOUCH_OUT, TOUCH_OVER};

/// Native events swallowed after a synthetic click.
const SUPPRESSED_EVENTS: [&str; 3] = ["click", "mousedown", "mouseup"];

/// State shared between the runtime and the listeners it installs.
pub(crate) struct Context<H: Host> {
    pub(crate) caps: Capabilities,
    pub(crate) config: PointerConfig,
    pub(crate) last_touch: Cell<Option<u64>>,
    pub(crate) click: RefCell<ClickEmulator<H::Node>>,
    pub(crate) hover: RefCell<Option<HoverTracker<H::Node>>>,
    handles: RefCell<Vec<H::Handle>>,
    disposed: Cell<bool>,
}

impl<H: Host> Context<H> {
    fn new(caps: Capabilities, config: PointerConfig) -> Self {
        Self {
            caps,
            click: RefCell::new(ClickEmulator::from_config(&config)),
            config,
            last_touch: Cell::new(None),
            hover: RefCell::new(None),
            handles: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
        }
    }

    /// Whether a mouse event at `now` is outside the cooldown after the last touch.
    pub(crate) fn mouse_allowed(&self, now: u64) -> bool {
        self.last_touch
            .get()
            .is_none_or(|t| now > t.saturating_add(self.config.mouse_cooldown))
    }

    fn keep(&self, handle: H::Handle) {
        self.handles.borrow_mut().push(handle);
    }
}

/// A pointer runtime over one host.
pub struct Pointer<H: Host> {
    host: Rc<H>,
    ctx: Rc<Context<H>>,
    bindings: PointerBindings<H>,
}

impl<H: Host> Pointer<H> {
    /// Create the runtime and pick the binding tier for `caps`.
    ///
    /// On touch engines, hover and tap tracking are installed once the host runs its
    /// ready callbacks.
    pub fn new(host: Rc<H>, caps: Capabilities, config: PointerConfig) -> Self {
        let ctx = Rc::new(Context::new(caps, config));
        let bindings = PointerBindings::new(Rc::downgrade(&host), select_source(&ctx));

        if caps.touch {
            let ready = ctx.clone();
            host.on_ready(Box::new(move |host| install_touch_tracking(host, &ready)));
        }
        if ctx.config.extend_namespace {
            host.publish_bindings(&bindings);
        }

        Self {
            host,
            ctx,
            bindings,
        }
    }

    /// The gesture bindings.
    pub fn bindings(&self) -> &PointerBindings<H> {
        &self.bindings
    }

    /// The host this runtime listens on.
    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    /// Capabilities the runtime was created with.
    pub fn capabilities(&self) -> Capabilities {
        self.ctx.caps
    }

    /// Tier backing the bindings.
    pub fn tier(&self) -> Tier {
        self.bindings.tier()
    }

    /// Phase of the click emulator.
    pub fn click_phase(&self) -> ClickPhase {
        self.ctx.click.borrow().phase()
    }

    /// Node currently hovered by touch, once hover tracking is installed.
    pub fn hovered(&self) -> Option<H::Node> {
        self.ctx.hover.borrow().as_ref().map(|t| t.hovered().clone())
    }

    /// Remove every document listener this runtime installed.
    ///
    /// Subscriptions made through [`bindings`](Self::bindings) are owned by their callers
    /// and stay attached.
    pub fn dispose(self) {
        self.ctx.disposed.set(true);
        let handles = core::mem::take(&mut *self.ctx.handles.borrow_mut());
        log::debug!("disposing {} document listeners", handles.len());
        for handle in handles {
            handle.remove();
        }
    }
}

impl<H: Host> fmt::Debug for Pointer<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pointer")
            .field("caps", &self.ctx.caps)
            .field("tier", &self.tier())
            .field("click_phase", &self.click_phase())
            .finish_non_exhaustive()
    }
}

/// Client position of an event, falling back to its first changed contact.
fn event_client<K, E: RawEvent<K> + ?Sized>(event: &E) -> Option<Point> {
    event.client().or_else(|| {
        event
            .changed_touches()
            .and_then(<[_]>::first)
            .map(|t| t.client_or_page())
    })
}

/// Page position of an event, falling back to its first changed contact.
fn event_page<K, E: RawEvent<K> + ?Sized>(event: &E) -> Option<Point> {
    event.page().or_else(|| {
        event
            .changed_touches()
            .and_then(<[_]>::first)
            .map(|t| t.page)
    })
}

fn node_under<H: Host>(host: &H, ctx: &Context<H>, event: &H::Event) -> Option<H::Node> {
    let page = event_page(event)?;
    host.element_from_point(hit_test_point(
        page,
        host.scroll_offset(),
        ctx.caps.legacy_hit_test,
    ))
}

/// Emit the out/over pair, carrying the contacts of the touch that moved the hover.
fn emit_transition<H: Host>(
    host: &H,
    transition: HoverTransition<H::Node>,
    event: &H::Event,
) {
    let HoverTransition { out, over } = transition;
    let snapshot = EventSnapshot::of(event);
    host.emit(
        &out,
        TOUCH_OUT,
        SyntheticInit::hover(over.clone()).with_snapshot(snapshot.clone()),
    );
    host.emit(&over, TOUCH_OVER, SyntheticInit::hover(out).with_snapshot(snapshot));
}

fn install_touch_tracking<H: Host>(host: &H, ctx: &Rc<Context<H>>) {
    if ctx.disposed.get() {
        return;
    }
    let document = host.document();

    if ctx.caps.pointer {
        let prefixed = ctx.caps.ms_pointer;
        let c = ctx.clone();
        ctx.keep(host.listen(
            &document,
            Gesture::Down.native_event(prefixed),
            ListenPhase::Capture,
            Box::new(move |host, event| {
                begin_tap(
                    host,
                    &c,
                    event,
                    Gesture::Move.native_event(prefixed),
                    Gesture::Up.native_event(prefixed),
                );
            }),
        ));
        return;
    }

    *ctx.hover.borrow_mut() = Some(HoverTracker::new(host.body()));

    // Capturing, so `touch.over` precedes every `touchstart` handler, including ones
    // that stop the event.
    let c = ctx.clone();
    ctx.keep(host.listen(
        &document,
        "touchstart",
        ListenPhase::Capture,
        Box::new(move |host, event| {
            let transition = c
                .hover
                .borrow_mut()
                .as_mut()
                .map(|hover| hover.touch_start(event.target()));
            if let Some(transition) = transition {
                emit_transition(host, transition, event);
            }
            begin_tap(host, &c, event, "touchmove", "touchend");
        }),
    ));

    let c = ctx.clone();
    ctx.keep(host.listen(
        &document,
        "touchmove",
        ListenPhase::Bubble,
        Box::new(move |host, event| {
            let Some(node) = node_under(host, &c, event) else {
                return;
            };
            let transition = c
                .hover
                .borrow_mut()
                .as_mut()
                .and_then(|hover| hover.touch_move(node.clone()));
            if let Some(transition) = transition {
                emit_transition(host, transition, event);
            }
            host.emit(
                &node,
                TOUCH_MOVE,
                SyntheticInit::copy_of(EventSnapshot::of(event)),
            );
        }),
    ));

    let c = ctx.clone();
    ctx.keep(host.listen(
        &document,
        "touchend",
        ListenPhase::Bubble,
        Box::new(move |host, event| {
            // Released outside the viewport.
            let node = node_under(host, &c, event).unwrap_or_else(|| host.body());
            host.emit(
                &node,
                TOUCH_END,
                SyntheticInit::copy_of(EventSnapshot::of(event)),
            );
        }),
    ));
}

fn begin_tap<H: Host>(
    host: &H,
    ctx: &Rc<Context<H>>,
    event: &H::Event,
    move_type: &'static str,
    end_type: &'static str,
) {
    let target = event.target();
    let marker = if host.element(&target).disabled {
        None
    } else {
        find_marker(host, &target)
    };
    let origin = event_client(event).unwrap_or(Point::ZERO);

    let mut click = ctx.click.borrow_mut();
    if !click.on_start(target, origin, marker) {
        return;
    }
    log::debug!("tap armed at {origin:?}");
    if !click.install_listeners() {
        return;
    }
    drop(click);
    install_click_listeners(host, ctx, move_type, end_type);
}

fn install_click_listeners<H: Host>(
    host: &H,
    ctx: &Rc<Context<H>>,
    move_type: &'static str,
    end_type: &'static str,
) {
    let document = host.document();

    let c = ctx.clone();
    ctx.keep(host.listen(
        &document,
        move_type,
        ListenPhase::Capture,
        Box::new(move |_, event| {
            let position = event_client(event).unwrap_or(Point::ZERO);
            c.click.borrow_mut().on_move(&event.target(), position);
        }),
    ));

    let c = ctx.clone();
    ctx.keep(host.listen(
        &document,
        end_type,
        ListenPhase::Capture,
        Box::new(move |host, event| {
            if !c.click.borrow_mut().on_end(host.now()) {
                return;
            }
            let target = click_target(host, event.target());
            log::debug!("synthetic click on {target:?}");
            host.defer(Box::new(move |host| {
                host.emit(&target, "click", SyntheticInit::click());
            }));
        }),
    ));

    for event_type in SUPPRESSED_EVENTS {
        let c = ctx.clone();
        ctx.keep(host.listen(
            &document,
            event_type,
            ListenPhase::Capture,
            Box::new(move |host, event| suppress_native(host, &c, event_type, event)),
        ));
    }
}

/// A label forwards its click to the control it names.
fn click_target<H: Host>(host: &H, target: H::Node) -> H::Node {
    let info = host.element(&target);
    if info.tag != ElementTag::Label {
        return target;
    }
    info.html_for
        .as_deref()
        .and_then(|id| host.by_id(id))
        .unwrap_or(target)
}

/// Swallow a native event that trails a synthetic click.
///
/// The late native click may land on a different node than the synthetic one, for
/// example whatever was underneath a menu the synthetic click closed, so every node
/// is covered.
fn suppress_native<H: Host>(host: &H, ctx: &Context<H>, event_type: &str, event: &H::Event) {
    if !ctx
        .click
        .borrow()
        .suppresses(host.now(), event.is_synthetic_click())
    {
        return;
    }
    let target = event.target();
    let info = host.element(&target);
    if info.tag == ElementTag::Input
        && ctx
            .config
            .exempt_class
            .as_deref()
            .is_some_and(|class| host.has_class(&target, class))
    {
        return;
    }
    log::trace!("suppressing native {event_type} on {target:?}");
    event.stop_propagation();
    event.stop_immediate_propagation();
    if event_type == "click" && !info.keeps_native_click() {
        event.prevent_default();
    }
}
