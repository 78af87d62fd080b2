// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability flags and tunables.

use alloc::borrow::Cow;

/// Input capabilities of the host engine, probed once by the host.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Touch events are supported.
    pub touch: bool,
    /// Native pointer events are supported.
    pub pointer: bool,
    /// Native pointer event names carry the `MS` prefix (IE10).
    pub ms_pointer: bool,
    /// Point hit-testing expects page rather than viewport coordinates (iOS before 5).
    pub legacy_hit_test: bool,
}

impl Capabilities {
    /// Desktop engine with mouse events only.
    pub const MOUSE_ONLY: Self = Self {
        touch: false,
        pointer: false,
        ms_pointer: false,
        legacy_hit_test: false,
    };

    /// Touch engine without native pointer events.
    pub const TOUCH: Self = Self {
        touch: true,
        ..Self::MOUSE_ONLY
    };

    /// Engine with native pointer events.
    pub const POINTER: Self = Self {
        pointer: true,
        ..Self::MOUSE_ONLY
    };
}

/// Tunables for the binder and the click emulator.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerConfig {
    /// How long after a touch event emulated mouse events are dropped, in milliseconds.
    pub mouse_cooldown: u64,
    /// How long after a synthetic click native clicks are suppressed, in milliseconds.
    pub fire_window: u64,
    /// Movement tolerance in pixels for markers that do not specify one.
    pub default_click_threshold: f64,
    /// Class marking `<input>` elements that are clicked programmatically off screen;
    /// native events on them are never suppressed.
    pub exempt_class: Option<Cow<'static, str>>,
    /// Hand the bindings table to [`Host::publish_bindings`](crate::host::Host::publish_bindings).
    pub extend_namespace: bool,
}

impl PointerConfig {
    /// Milliseconds used for both [`mouse_cooldown`](Self::mouse_cooldown) and
    /// [`fire_window`](Self::fire_window) by default.
    pub const EVENT_FIRE_TIME_THRESHOLD: u64 = 1000;

    /// Default movement tolerance in pixels.
    pub const CLICK_DEFAULT_THRESHOLD: f64 = 4.0;
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            mouse_cooldown: Self::EVENT_FIRE_TIME_THRESHOLD,
            fire_window: Self::EVENT_FIRE_TIME_THRESHOLD,
            default_click_threshold: Self::CLICK_DEFAULT_THRESHOLD,
            exempt_class: Some(Cow::Borrowed("dijitOffScreen")),
            extend_namespace: false,
        }
    }
}
