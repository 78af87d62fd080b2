// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability-driven subscription of pointer gestures.
//!
//! ## Overview
//!
//! Each [`Gesture`] is backed by a mouse, a touch and a native pointer event (see
//! [`Gesture::events`]). Which of them a [`Binding`] listens to is decided once, when the
//! [`Pointer`](crate::runtime::Pointer) runtime is created, by picking one
//! [`PointerSource`]:
//!
//! 1. [`NativeSource`] when the engine has native pointer events. Events are already
//!    pointer-shaped and are passed through ([`PointerEvent::passthrough`]).
//! 2. [`TouchMouseSource`] when the engine has touch events. Touch events are
//!    normalized; mouse events are dropped for a cooldown after the last touch because
//!    browsers emulate a mouse sequence after each tap.
//! 3. [`MouseSource`] otherwise. No touch listener is ever attached, which keeps older
//!    desktop engines cheap.
//!
//! A [`Subscription`] owns every underlying listener handle and removes them together.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::fmt;

use smallvec::{SmallVec, smallvec};

use crate::event::{PointerEvent, normalize};
use crate::host::{Host, ListenPhase, ListenerHandle};
use crate::runtime::Context;
use crate::types::{Gesture, SourceKind};

/// Pointer listener shared by the raw listeners of one subscription.
pub type Listener<H> =
    Rc<dyn Fn(&PointerEvent<'_, <H as Host>::Node, <H as Host>::Event>)>;

/// Which raw streams back the bindings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Native pointer events.
    Native,
    /// Touch events, with mouse events outside the touch cooldown.
    TouchAndMouse,
    /// Mouse events only.
    MouseOnly,
}

/// Listener handles attached for one [`Binding::subscribe`] call.
#[must_use = "dropping a subscription leaves its listeners attached"]
pub struct Subscription<Hd> {
    handles: SmallVec<[Hd; 2]>,
}

impl<Hd: ListenerHandle> Subscription<Hd> {
    /// Detach every underlying listener.
    pub fn remove(self) {
        for handle in self.handles {
            handle.remove();
        }
    }

    /// Number of raw listeners backing this subscription.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether nothing was attached (the host is gone).
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl<Hd> fmt::Debug for Subscription<Hd> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("handles", &self.handles.len())
            .finish()
    }
}

/// Strategy that attaches raw listeners for a gesture.
pub trait PointerSource<H: Host> {
    /// The tier this source implements.
    fn tier(&self) -> Tier;

    /// Attach raw listeners on `node` that deliver `gesture` to `listener`.
    fn subscribe(
        &self,
        host: &H,
        gesture: Gesture,
        node: &H::Node,
        listener: Listener<H>,
    ) -> Subscription<H::Handle>;
}

/// Native pointer events, passed through without normalization.
#[derive(Copy, Clone, Debug)]
pub struct NativeSource {
    /// Use `MSPointer*` event names.
    pub prefixed: bool,
}

impl<H: Host> PointerSource<H> for NativeSource {
    fn tier(&self) -> Tier {
        Tier::Native
    }

    fn subscribe(
        &self,
        host: &H,
        gesture: Gesture,
        node: &H::Node,
        listener: Listener<H>,
    ) -> Subscription<H::Handle> {
        let handle = host.listen(
            node,
            gesture.native_event(self.prefixed),
            ListenPhase::Bubble,
            Box::new(move |_, raw| listener(&PointerEvent::passthrough(raw, gesture))),
        );
        Subscription {
            handles: smallvec![handle],
        }
    }
}

/// Touch events plus mouse events outside the touch cooldown.
pub struct TouchMouseSource<H: Host> {
    ctx: Rc<Context<H>>,
}

impl<H: Host> TouchMouseSource<H> {
    pub(crate) fn new(ctx: Rc<Context<H>>) -> Self {
        Self { ctx }
    }
}

impl<H: Host> fmt::Debug for TouchMouseSource<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TouchMouseSource")
            .field("last_touch", &self.ctx.last_touch.get())
            .finish()
    }
}

impl<H: Host> PointerSource<H> for TouchMouseSource<H> {
    fn tier(&self) -> Tier {
        Tier::TouchAndMouse
    }

    fn subscribe(
        &self,
        host: &H,
        gesture: Gesture,
        node: &H::Node,
        listener: Listener<H>,
    ) -> Subscription<H::Handle> {
        let events = gesture.events();

        let ctx = self.ctx.clone();
        let on_touch = listener.clone();
        let touch = host.listen(
            node,
            events.touch,
            ListenPhase::Bubble,
            Box::new(move |host, raw| {
                ctx.last_touch.set(Some(host.now()));
                for event in normalize(raw, SourceKind::Touch, gesture) {
                    on_touch(&event);
                }
            }),
        );

        let ctx = self.ctx.clone();
        let mouse = host.listen(
            node,
            events.mouse,
            ListenPhase::Bubble,
            Box::new(move |host, raw| {
                if !ctx.mouse_allowed(host.now()) {
                    log::trace!("dropping {} emulated after touch", events.mouse);
                    return;
                }
                for event in normalize(raw, SourceKind::Mouse, gesture) {
                    listener(&event);
                }
            }),
        );

        Subscription {
            handles: smallvec![touch, mouse],
        }
    }
}

/// Mouse events only.
#[derive(Copy, Clone, Debug, Default)]
pub struct MouseSource;

impl<H: Host> PointerSource<H> for MouseSource {
    fn tier(&self) -> Tier {
        Tier::MouseOnly
    }

    fn subscribe(
        &self,
        host: &H,
        gesture: Gesture,
        node: &H::Node,
        listener: Listener<H>,
    ) -> Subscription<H::Handle> {
        let handle = host.listen(
            node,
            gesture.events().mouse,
            ListenPhase::Bubble,
            Box::new(move |_, raw| {
                for event in normalize(raw, SourceKind::Mouse, gesture) {
                    listener(&event);
                }
            }),
        );
        Subscription {
            handles: smallvec![handle],
        }
    }
}

/// Pick the source for the runtime's capabilities.
pub(crate) fn select_source<H: Host>(ctx: &Rc<Context<H>>) -> Rc<dyn PointerSource<H>> {
    let caps = ctx.caps;
    let source: Rc<dyn PointerSource<H>> = if caps.pointer {
        Rc::new(NativeSource {
            prefixed: caps.ms_pointer,
        })
    } else if caps.touch {
        Rc::new(TouchMouseSource::new(ctx.clone()))
    } else {
        Rc::new(MouseSource)
    };
    log::debug!("pointer bindings use {:?}", source.tier());
    source
}

/// Subscribe function for one gesture.
pub struct Binding<H: Host> {
    gesture: Gesture,
    source: Rc<dyn PointerSource<H>>,
    host: Weak<H>,
}

impl<H: Host> Binding<H> {
    /// Gesture delivered by this binding.
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Tier backing this binding.
    pub fn tier(&self) -> Tier {
        self.source.tier()
    }

    /// Deliver this gesture on `node` to `listener`.
    ///
    /// Returns an empty subscription if the host has been dropped.
    pub fn subscribe<F>(&self, node: &H::Node, listener: F) -> Subscription<H::Handle>
    where
        F: Fn(&PointerEvent<'_, H::Node, H::Event>) + 'static,
    {
        let Some(host) = self.host.upgrade() else {
            log::debug!("{:?} subscription after host teardown", self.gesture);
            return Subscription {
                handles: SmallVec::new(),
            };
        };
        self.source
            .subscribe(&host, self.gesture, node, Rc::new(listener))
    }
}

impl<H: Host> Clone for Binding<H> {
    fn clone(&self) -> Self {
        Self {
            gesture: self.gesture,
            source: self.source.clone(),
            host: self.host.clone(),
        }
    }
}

impl<H: Host> fmt::Debug for Binding<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("gesture", &self.gesture)
            .field("tier", &self.source.tier())
            .finish_non_exhaustive()
    }
}

/// The eight pointer gestures, each bound to the tier chosen at startup.
pub struct PointerBindings<H: Host> {
    /// `pointer.down`
    pub down: Binding<H>,
    /// `pointer.move`
    pub r#move: Binding<H>,
    /// `pointer.up`
    pub up: Binding<H>,
    /// `pointer.cancel`
    pub cancel: Binding<H>,
    /// `pointer.over`
    pub over: Binding<H>,
    /// `pointer.out`
    pub out: Binding<H>,
    /// `pointer.enter`
    pub enter: Binding<H>,
    /// `pointer.leave`
    pub leave: Binding<H>,
}

impl<H: Host> PointerBindings<H> {
    pub(crate) fn new(host: Weak<H>, source: Rc<dyn PointerSource<H>>) -> Self {
        let bind = |gesture| Binding {
            gesture,
            source: source.clone(),
            host: host.clone(),
        };
        Self {
            down: bind(Gesture::Down),
            r#move: bind(Gesture::Move),
            up: bind(Gesture::Up),
            cancel: bind(Gesture::Cancel),
            over: bind(Gesture::Over),
            out: bind(Gesture::Out),
            enter: bind(Gesture::Enter),
            leave: bind(Gesture::Leave),
        }
    }

    /// Tier backing every binding.
    pub fn tier(&self) -> Tier {
        self.down.tier()
    }

    /// Binding for `gesture`.
    pub fn get(&self, gesture: Gesture) -> &Binding<H> {
        match gesture {
            Gesture::Down => &self.down,
            Gesture::Move => &self.r#move,
            Gesture::Up => &self.up,
            Gesture::Cancel => &self.cancel,
            Gesture::Over => &self.over,
            Gesture::Out => &self.out,
            Gesture::Enter => &self.enter,
            Gesture::Leave => &self.leave,
        }
    }
}

impl<H: Host> fmt::Debug for PointerBindings<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerBindings")
            .field("tier", &self.tier())
            .finish_non_exhaustive()
    }
}
