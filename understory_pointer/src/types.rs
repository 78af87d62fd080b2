// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared vocabulary: pointer kinds, button and modifier flags, gestures, and touch points.

use core::num::NonZeroU64;

use kurbo::Point;

/// Pointer identifier.
///
/// The mouse always uses `1`; touch contacts are offset by [`TOUCH_POINTER_ID_OFFSET`].
pub type PointerId = NonZeroU64;

/// Identifier reported for the mouse.
pub const MOUSE_POINTER_ID: PointerId = NonZeroU64::MIN;

/// Offset added to touch identifiers so they never collide with [`MOUSE_POINTER_ID`].
///
/// Touch identifiers may start at zero, so the smallest touch pointer id is `2`.
pub const TOUCH_POINTER_ID_OFFSET: u64 = 2;

/// Pointer id for a touch contact.
pub fn touch_pointer_id(identifier: u32) -> PointerId {
    NonZeroU64::MIN.saturating_add(u64::from(identifier) + (TOUCH_POINTER_ID_OFFSET - 1))
}

/// Kind of device behind a pointer event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum PointerType {
    /// Mouse or other indirect pointing device.
    #[default]
    Mouse,
    /// Direct touch contact.
    Touch,
    /// Stylus.
    Pen,
}

impl PointerType {
    /// Label used by the DOM `pointerType` attribute.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mouse => "mouse",
            Self::Touch => "touch",
            Self::Pen => "pen",
        }
    }

    /// Parse a DOM `pointerType` label.
    ///
    /// IE10 reports numeric codes (`2` touch, `3` pen, `4` mouse); those are accepted too.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "mouse" | "4" => Some(Self::Mouse),
            "touch" | "2" => Some(Self::Touch),
            "pen" | "3" => Some(Self::Pen),
            _ => None,
        }
    }
}

/// Raw stream a normalized event was translated from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A mouse event.
    Mouse,
    /// A touch event.
    Touch,
}

bitflags::bitflags! {
    /// Pressed buttons, using the DOM `buttons` bit layout.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Buttons: u16 {
        /// Left button, or an active touch contact.
        const PRIMARY   = 0b0000_0001;
        /// Right button.
        const SECONDARY = 0b0000_0010;
        /// Middle button.
        const AUXILIARY = 0b0000_0100;
    }
}

impl Buttons {
    /// Derive the bitmask from a legacy single-button `which` code.
    ///
    /// `which` numbers buttons left, middle, right, while the bitmask orders them
    /// left, right, middle, so `2` and `3` swap.
    ///
    /// ```
    /// use understory_pointer::types::Buttons;
    ///
    /// assert_eq!(Buttons::from_which(1), Buttons::PRIMARY);
    /// assert_eq!(Buttons::from_which(2), Buttons::AUXILIARY);
    /// assert_eq!(Buttons::from_which(3), Buttons::SECONDARY);
    /// assert_eq!(Buttons::from_which(0), Buttons::empty());
    /// ```
    pub const fn from_which(which: u16) -> Self {
        match which {
            1 => Self::PRIMARY,
            2 => Self::AUXILIARY,
            3 => Self::SECONDARY,
            _ => Self::empty(),
        }
    }
}

bitflags::bitflags! {
    /// Modifier keys held during an event.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Shift key.
        const SHIFT = 0b0000_0001;
        /// Control key.
        const CTRL  = 0b0000_0010;
        /// Alt / Option key.
        const ALT   = 0b0000_0100;
        /// Meta / Command key.
        const META  = 0b0000_1000;
    }
}

/// Synthetic event emitted on the node under the finger before a touch-start is handled.
pub const TOUCH_OVER: &str = "touch.over";
/// Synthetic event emitted on the previously hovered node when the finger moves away.
pub const TOUCH_OUT: &str = "touch.out";
/// Synthetic touch-move, targeted at the node currently under the finger.
pub const TOUCH_MOVE: &str = "touch.move";
/// Synthetic touch-end, targeted at the node under the release point.
pub const TOUCH_END: &str = "touch.end";

/// Abstract pointer gesture exposed by [`PointerBindings`](crate::binder::PointerBindings).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Gesture {
    /// A button is pressed or a contact begins.
    Down,
    /// The pointer moves.
    Move,
    /// A button is released or a contact ends.
    Up,
    /// The pointer is lost.
    Cancel,
    /// The pointer moves onto a node.
    Over,
    /// The pointer moves off a node.
    Out,
    /// The pointer enters a node.
    Enter,
    /// The pointer leaves a node.
    Leave,
}

/// Raw event names backing one [`Gesture`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GestureEvents {
    /// Event type of the normalized event, e.g. `pointer.down`.
    pub event_type: &'static str,
    /// Mouse analogue.
    pub mouse: &'static str,
    /// Touch analogue (native or synthetic).
    pub touch: &'static str,
    /// Native pointer analogue.
    pub native: &'static str,
    /// Native pointer analogue on engines that prefix pointer events (IE10).
    pub native_prefixed: &'static str,
}

impl Gesture {
    /// All gestures in binding order.
    pub const ALL: [Self; 8] = [
        Self::Down,
        Self::Move,
        Self::Up,
        Self::Cancel,
        Self::Over,
        Self::Out,
        Self::Enter,
        Self::Leave,
    ];

    /// Raw event names for this gesture.
    ///
    /// `enter` and `leave` ride on the over/out streams, which bubble on every
    /// tier, so the three tiers deliver the same semantics.
    pub const fn events(self) -> GestureEvents {
        let (event_type, mouse, touch, native, native_prefixed) = match self {
            Self::Down => (
                "pointer.down",
                "mousedown",
                "touchstart",
                "pointerdown",
                "MSPointerDown",
            ),
            Self::Move => (
                "pointer.move",
                "mousemove",
                "touchmove",
                "pointermove",
                "MSPointerMove",
            ),
            Self::Up => (
                "pointer.up",
                "mouseup",
                TOUCH_END,
                "pointerup",
                "MSPointerUp",
            ),
            Self::Cancel => (
                "pointer.cancel",
                "mouseleave",
                "touchcancel",
                "pointercancel",
                "MSPointerCancel",
            ),
            Self::Over => (
                "pointer.over",
                "mouseover",
                TOUCH_OVER,
                "pointerover",
                "MSPointerOver",
            ),
            Self::Out => (
                "pointer.out",
                "mouseout",
                TOUCH_OUT,
                "pointerout",
                "MSPointerOut",
            ),
            Self::Enter => (
                "pointer.enter",
                "mouseover",
                TOUCH_OVER,
                "pointerover",
                "MSPointerOver",
            ),
            Self::Leave => (
                "pointer.leave",
                "mouseout",
                TOUCH_OUT,
                "pointerout",
                "MSPointerOut",
            ),
        };
        GestureEvents {
            event_type,
            mouse,
            touch,
            native,
            native_prefixed,
        }
    }

    /// Native pointer event name, honoring the IE10 prefix.
    pub const fn native_event(self, prefixed: bool) -> &'static str {
        let events = self.events();
        if prefixed {
            events.native_prefixed
        } else {
            events.native
        }
    }

    /// Whether a touch contact is still on the surface when this gesture fires.
    pub(crate) const fn contact_active(self) -> bool {
        !matches!(self, Self::Up | Self::Cancel)
    }
}

/// One contact point of a touch event.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchPoint<K> {
    /// Identifier assigned by the engine, stable for the life of the contact.
    pub identifier: u32,
    /// Node the contact started on.
    pub target: K,
    /// Viewport coordinates; some older engines omit them.
    pub client: Option<Point>,
    /// Page coordinates.
    pub page: Point,
    /// Screen coordinates.
    pub screen: Point,
    /// Contact force in `0.0..=1.0`, when the engine reports one.
    pub force: Option<f64>,
}

impl<K> TouchPoint<K> {
    /// A contact at `page`, with client and screen coordinates equal to it.
    pub fn new(identifier: u32, target: K, page: Point) -> Self {
        Self {
            identifier,
            target,
            client: Some(page),
            page,
            screen: page,
            force: None,
        }
    }

    /// Client coordinates, or page coordinates when the engine reports none.
    pub fn client_or_page(&self) -> Point {
        self.client.unwrap_or(self.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn which_codes_map_to_bitmask() {
        assert_eq!(Buttons::from_which(1).bits(), 1);
        assert_eq!(Buttons::from_which(2).bits(), 4);
        assert_eq!(Buttons::from_which(3).bits(), 2);
        for which in [0, 4, 5, 255, u16::MAX] {
            assert_eq!(Buttons::from_which(which).bits(), 0, "which {which}");
        }
    }

    #[test]
    fn touch_ids_never_collide_with_mouse() {
        assert_eq!(MOUSE_POINTER_ID.get(), 1);
        assert_eq!(touch_pointer_id(0).get(), 2);
        assert_eq!(touch_pointer_id(7).get(), 9);
        assert_eq!(touch_pointer_id(u32::MAX).get(), u64::from(u32::MAX) + 2);
    }

    #[test]
    fn pointer_type_labels_round_trip() {
        for ty in [PointerType::Mouse, PointerType::Touch, PointerType::Pen] {
            assert_eq!(PointerType::from_label(ty.as_str()), Some(ty));
        }
        assert_eq!(PointerType::from_label("2"), Some(PointerType::Touch));
        assert_eq!(PointerType::from_label("stylus"), None);
    }

    #[test]
    fn native_names_honor_prefix() {
        assert_eq!(Gesture::Down.native_event(false), "pointerdown");
        assert_eq!(Gesture::Down.native_event(true), "MSPointerDown");
        assert_eq!(Gesture::Up.events().touch, TOUCH_END);
        assert_eq!(Gesture::Enter.events().touch, TOUCH_OVER);
    }

    #[test]
    fn contact_is_released_on_up_and_cancel() {
        assert!(Gesture::Down.contact_active());
        assert!(Gesture::Move.contact_active());
        assert!(Gesture::Over.contact_active());
        assert!(!Gesture::Up.contact_active());
        assert!(!Gesture::Cancel.contact_active());
    }
}
