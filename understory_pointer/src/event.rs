// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Normalized pointer events and the translation from raw mouse and touch events.
//!
//! ## Overview
//!
//! [`normalize`] turns one raw event into the pointer events it stands for:
//!
//! - A mouse event yields exactly one event with pointer id `1`, always primary.
//! - A touch event yields one event per *changed* contact, so lifting two fingers at
//!   once produces two `pointer.up` events from a single raw `touchend`.
//!
//! The resulting [`PointerEvent`] is a value built from the raw event's fields plus
//! the derived pointer attributes. It borrows the raw event: [`PointerEvent::original`]
//! reaches fields this crate does not model and [`PointerEvent::prevent_default`]
//! forwards to it.
//!
//! ## Derived attributes
//!
//! - `buttons` comes from the raw bitmask or, when absent, from the legacy `which` code
//!   (see [`Buttons::from_which`]). A touch contact counts as the primary button while
//!   it is on the surface.
//! - `pressure` is the engine's value when non-zero, otherwise `0.5` while any button is
//!   down and `0.0` otherwise.
//! - `width`, `height`, `tilt_x` and `tilt_y` are `0.0`; neither source reports them.
//!
//! ## Primary touch
//!
//! A changed contact is primary when it is the first of the event's *active* touches,
//! which identifies the finger that started a multi-touch gesture. When the last finger
//! lifts no touches remain active; the first changed contact is then primary.
//!
//! ```
//! use kurbo::Point;
//! use understory_pointer::event::normalize;
//! use understory_pointer::host::RawInput;
//! use understory_pointer::types::{Gesture, SourceKind, TouchPoint};
//!
//! let a = TouchPoint::new(0, 1_u32, Point::new(10.0, 10.0));
//! let b = TouchPoint::new(1, 1_u32, Point::new(40.0, 10.0));
//! let raw = RawInput::touch(1_u32, vec![a.clone(), b.clone()], vec![a, b]);
//!
//! let events = normalize(&raw, SourceKind::Touch, Gesture::Down);
//! assert_eq!(events.len(), 2);
//! assert_eq!(events[0].pointer_id.get(), 2);
//! assert!(events[0].is_primary);
//! assert_eq!(events[1].pointer_id.get(), 3);
//! assert!(!events[1].is_primary);
//! ```

use core::fmt;

use kurbo::Point;
use smallvec::{SmallVec, smallvec};

use crate::host::RawEvent;
use crate::types::{
    Buttons, Gesture, MOUSE_POINTER_ID, Modifiers, PointerId, PointerType, SourceKind, TouchPoint,
    touch_pointer_id,
};

/// Pressure reported while a button or contact is down and the engine reports none.
pub const ACTIVE_PRESSURE: f64 = 0.5;

/// Events produced from one raw event. Mouse input never spills.
pub type Normalized<'a, K, E> = SmallVec<[PointerEvent<'a, K, E>; 1]>;

/// A pointer event in the unified model.
pub struct PointerEvent<'a, K, E: ?Sized> {
    /// Normalized event type, e.g. `pointer.down`.
    pub event_type: &'static str,
    /// Gesture this event was delivered for.
    pub gesture: Gesture,
    /// Pointer identifier.
    pub pointer_id: PointerId,
    /// Device kind.
    pub pointer_type: PointerType,
    /// Whether this is the primary pointer.
    pub is_primary: bool,
    /// Pressure in `0.0..=1.0`.
    pub pressure: f64,
    /// Contact width.
    pub width: f64,
    /// Contact height.
    pub height: f64,
    /// Tilt along the x axis.
    pub tilt_x: f64,
    /// Tilt along the y axis.
    pub tilt_y: f64,
    /// Pressed buttons.
    pub buttons: Buttons,
    /// Viewport coordinates.
    pub client: Point,
    /// Page coordinates.
    pub page: Point,
    /// Screen coordinates.
    pub screen: Point,
    /// Node the pointer is over.
    pub target: K,
    /// Node whose listener is running.
    pub current_target: Option<K>,
    /// Secondary node for over/out events.
    pub related_target: Option<K>,
    /// Held modifier keys.
    pub modifiers: Modifiers,
    original: &'a E,
}

impl<'a, K, E> PointerEvent<'a, K, E>
where
    K: Clone,
    E: RawEvent<K> + ?Sized,
{
    /// Mouse pointer type, for comparisons without string literals.
    pub const POINTER_TYPE_MOUSE: PointerType = PointerType::Mouse;
    /// Touch pointer type.
    pub const POINTER_TYPE_TOUCH: PointerType = PointerType::Touch;
    /// Pen pointer type.
    pub const POINTER_TYPE_PEN: PointerType = PointerType::Pen;

    /// The raw event this one was built from.
    pub fn original(&self) -> &'a E {
        self.original
    }

    /// Cancel the default action of the raw event.
    pub fn prevent_default(&self) {
        self.original.prevent_default();
    }

    /// Stop propagation of the raw event.
    pub fn stop_propagation(&self) {
        self.original.stop_propagation();
    }

    /// Wrap a native pointer event, copying its pointer attributes verbatim.
    ///
    /// Engines that omit the attributes get mouse defaults.
    pub fn passthrough(raw: &'a E, gesture: Gesture) -> Self {
        let mut event = Self::mouse(raw, gesture);
        match raw.native_pointer() {
            Some(native) => {
                event.pointer_id = native.pointer_id;
                event.pointer_type = native.pointer_type;
                event.is_primary = native.is_primary;
                event.pressure = native.pressure;
                event.width = native.width;
                event.height = native.height;
                event.tilt_x = native.tilt_x;
                event.tilt_y = native.tilt_y;
            }
            None => log::trace!("native {gesture:?} event without pointer attributes"),
        }
        event
    }

    fn base(raw: &'a E, gesture: Gesture, pointer_type: PointerType) -> Self {
        Self {
            event_type: gesture.events().event_type,
            gesture,
            pointer_id: MOUSE_POINTER_ID,
            pointer_type,
            is_primary: true,
            pressure: 0.0,
            width: 0.0,
            height: 0.0,
            tilt_x: 0.0,
            tilt_y: 0.0,
            buttons: Buttons::empty(),
            client: raw.client().unwrap_or(Point::ZERO),
            page: raw.page().unwrap_or(Point::ZERO),
            screen: raw.screen().unwrap_or(Point::ZERO),
            target: raw.target(),
            current_target: raw.current_target(),
            related_target: raw.related_target(),
            modifiers: raw.modifiers(),
            original: raw,
        }
    }

    fn mouse(raw: &'a E, gesture: Gesture) -> Self {
        let buttons = raw
            .buttons()
            .unwrap_or_else(|| Buttons::from_which(raw.which().unwrap_or(0)));
        Self {
            buttons,
            pressure: pressure_for(raw.pressure(), buttons),
            ..Self::base(raw, gesture, PointerType::Mouse)
        }
    }

    fn touch(raw: &'a E, gesture: Gesture, touch: &TouchPoint<K>, is_primary: bool) -> Self {
        let buttons = raw.buttons().unwrap_or(if gesture.contact_active() {
            Buttons::PRIMARY
        } else {
            Buttons::empty()
        });
        let client = touch.client_or_page();
        Self {
            pointer_id: touch_pointer_id(touch.identifier),
            is_primary,
            buttons,
            pressure: pressure_for(touch.force.or(raw.pressure()), buttons),
            client,
            page: touch.page,
            screen: touch.screen,
            target: touch.target.clone(),
            current_target: Some(touch.target.clone()),
            ..Self::base(raw, gesture, PointerType::Touch)
        }
    }

    /// Touch-flavored event from the raw event's own fields, for events without a
    /// changed-contact list (the synthetic hover events).
    fn touch_from_event(raw: &'a E, gesture: Gesture) -> Self {
        let base = Self::base(raw, gesture, PointerType::Touch);
        let buttons = raw.buttons().unwrap_or(if gesture.contact_active() {
            Buttons::PRIMARY
        } else {
            Buttons::empty()
        });
        let page = raw.page().unwrap_or(base.page);
        Self {
            pointer_id: touch_pointer_id(0),
            buttons,
            pressure: pressure_for(raw.pressure(), buttons),
            client: raw.client().unwrap_or(page),
            page,
            current_target: Some(base.target.clone()),
            ..base
        }
    }
}

impl<K: fmt::Debug, E: ?Sized> fmt::Debug for PointerEvent<'_, K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerEvent")
            .field("event_type", &self.event_type)
            .field("pointer_id", &self.pointer_id)
            .field("pointer_type", &self.pointer_type)
            .field("is_primary", &self.is_primary)
            .field("buttons", &self.buttons)
            .field("pressure", &self.pressure)
            .field("client", &self.client)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

fn pressure_for(reported: Option<f64>, buttons: Buttons) -> f64 {
    match reported {
        Some(p) if p > 0.0 => p,
        _ if buttons.is_empty() => 0.0,
        _ => ACTIVE_PRESSURE,
    }
}

/// Translate a raw mouse or touch event into pointer events for `gesture`.
pub fn normalize<'a, K, E>(raw: &'a E, source: SourceKind, gesture: Gesture) -> Normalized<'a, K, E>
where
    K: Clone + PartialEq,
    E: RawEvent<K> + ?Sized,
{
    match source {
        SourceKind::Mouse => smallvec![PointerEvent::mouse(raw, gesture)],
        SourceKind::Touch => {
            let Some(changed) = raw.changed_touches() else {
                return smallvec![PointerEvent::touch_from_event(raw, gesture)];
            };
            let primary = raw
                .touches()
                .first()
                .or(changed.first())
                .map(|t| t.identifier);
            changed
                .iter()
                .map(|t| PointerEvent::touch(raw, gesture, t, Some(t.identifier) == primary))
                .collect()
        }
    }
}
