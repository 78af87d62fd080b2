// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_pointer --heading-base-level=0

//! Understory Pointer: one pointer-event vocabulary over mouse, touch and native pointer input.
//!
//! ## Overview
//!
//! Applications subscribe to eight gestures (`pointer.down`, `pointer.move`, `pointer.up`,
//! `pointer.cancel`, `pointer.over`, `pointer.out`, `pointer.enter`, `pointer.leave`) and
//! receive a [`PointerEvent`] regardless of which raw stream the engine produced.
//! The crate does not own a document or an event loop. The environment implements
//! [`Host`](crate::host::Host) and feeds raw events to the listeners this crate registers.
//!
//! ## Tiers
//!
//! [`Pointer::new`](crate::runtime::Pointer::new) picks one tier from the engine's
//! [`Capabilities`](crate::config::Capabilities):
//!
//! - Native pointer events are passed through untouched.
//! - Touch engines get normalized touch events, plus mouse events that arrive more than
//!   a cooldown after the last touch (emulated mouse events are dropped).
//! - Everything else gets normalized mouse events only.
//!
//! ## Touch engines
//!
//! Touch input lacks hover and delays clicks. Once the document is ready the runtime:
//!
//! - emulates hover with `touch.over`/`touch.out` and re-dispatches `touch.move` and
//!   `touch.end` on the node under the finger ([`hover`]);
//! - fires an immediate synthetic click for taps on nodes opted in with a
//!   [`ClickMarker`](crate::click::ClickMarker), then swallows the late native click
//!   ([`click`]).
//!
//! ## Normalization
//!
//! [`normalize`](crate::event::normalize) is also usable on its own:
//!
//! ```
//! use kurbo::Point;
//! use understory_pointer::event::normalize;
//! use understory_pointer::host::RawInput;
//! use understory_pointer::types::{Buttons, Gesture, SourceKind};
//!
//! let raw = RawInput::mouse(7_u32, Point::new(12.0, 30.0)).with_which(3);
//! let events = normalize(&raw, SourceKind::Mouse, Gesture::Down);
//!
//! let down = &events[0];
//! assert_eq!(down.event_type, "pointer.down");
//! assert_eq!(down.pointer_id.get(), 1);
//! assert_eq!(down.buttons, Buttons::SECONDARY);
//! assert_eq!(down.pressure, 0.5);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod binder;
pub mod click;
pub mod config;
pub mod event;
pub mod host;
pub mod hover;
pub mod runtime;
pub mod types;

#[cfg(test)]
mod test_host;

pub use binder::{Binding, PointerBindings, Subscription, Tier};
pub use config::{Capabilities, PointerConfig};
pub use event::{PointerEvent, normalize};
pub use host::{Host, RawEvent, RawInput};
pub use runtime::Pointer;
pub use types::{Buttons, Gesture, Modifiers, PointerId, PointerType};
