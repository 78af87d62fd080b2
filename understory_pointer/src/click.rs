// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fast-click emulation for touch input.
//!
//! Touch browsers delay the native `click` by roughly 300ms to detect double taps.
//! Nodes that opt in with a [`ClickMarker`] (on themselves or an ancestor) get a
//! synthetic click as soon as the finger lifts, and the late native click, along with
//! the `mousedown`/`mouseup` pair emulated before it, is swallowed.
//!
//! ## State machine
//!
//! [`ClickEmulator`] holds a single candidate tap, not one per finger:
//!
//! - **Idle** → **Armed**: a touch-start on a qualifying, enabled node.
//! - **Armed** → **Tracking**: a move that stays on the node and within the per-axis
//!   thresholds.
//! - **Armed**/**Tracking** → **Idle**: a move that leaves the node or exceeds a threshold.
//! - **Armed**/**Tracking** → **Fired**: the touch ends; the caller dispatches the click.
//! - Any state → **Armed** or **Idle** on the next touch-start, which overwrites the
//!   candidate.
//!
//! Thresholds are inclusive: a displacement equal to the threshold keeps the tap.
//!
//! ```
//! use kurbo::Point;
//! use understory_pointer::click::{ClickEmulator, ClickMarker, ClickPhase};
//!
//! let mut clicks: ClickEmulator<u32> = ClickEmulator::new();
//!
//! clicks.on_start(7, Point::new(10.0, 10.0), Some(ClickMarker::Uniform(4.0)));
//! assert_eq!(clicks.phase(), ClickPhase::Armed);
//!
//! // 4px is still a tap.
//! assert!(clicks.on_move(&7, Point::new(14.0, 10.0)));
//! assert!(clicks.on_end(1_000));
//! assert_eq!(clicks.phase(), ClickPhase::Fired);
//!
//! // The browser's own click shows up 300ms later and is swallowed.
//! assert!(clicks.suppresses(1_300, false));
//! // The synthetic click itself passes.
//! assert!(!clicks.suppresses(1_000, true));
//! ```
//!
//! Dragging past the threshold cancels the tap:
//!
//! ```
//! # use kurbo::Point;
//! # use understory_pointer::click::{ClickEmulator, ClickMarker, ClickPhase};
//! let mut clicks: ClickEmulator<u32> = ClickEmulator::new();
//! clicks.on_start(7, Point::new(10.0, 10.0), Some(ClickMarker::Enabled(true)));
//! assert!(!clicks.on_move(&7, Point::new(10.0, 15.0)));
//! assert_eq!(clicks.phase(), ClickPhase::Idle);
//! assert!(!clicks.on_end(1_000));
//! ```

use kurbo::{Point, Vec2};

use crate::config::PointerConfig;
use crate::host::Host;

/// Fast-click opt-in set on a node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ClickMarker {
    /// Opt in (`true`) with the default threshold.
    Enabled(bool),
    /// Opt in with the same threshold on both axes, in pixels.
    Uniform(f64),
    /// Opt in with separate thresholds per axis, in pixels.
    Axes {
        /// Horizontal threshold.
        x: f64,
        /// Vertical threshold.
        y: f64,
    },
}

impl ClickMarker {
    /// Whether the marker opts in. `Enabled(false)` and `Uniform(0.0)` do not.
    pub fn is_set(self) -> bool {
        match self {
            Self::Enabled(on) => on,
            Self::Uniform(t) => t != 0.0,
            Self::Axes { .. } => true,
        }
    }

    /// Per-axis thresholds; unset or zero axes use `default`.
    pub fn thresholds(self, default: f64) -> Vec2 {
        let or_default = |t: f64| if t == 0.0 { default } else { t };
        match self {
            Self::Enabled(_) => Vec2::new(default, default),
            Self::Uniform(t) => Vec2::new(or_default(t), or_default(t)),
            Self::Axes { x, y } => Vec2::new(or_default(x), or_default(y)),
        }
    }
}

/// Find the marker on `node` or its nearest marked ancestor.
///
/// Markers that do not opt in are skipped, so an ancestor's marker still applies.
pub fn find_marker<H: Host>(host: &H, node: &H::Node) -> Option<ClickMarker> {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if let Some(marker) = host.click_marker(&n).filter(|m| m.is_set()) {
            return Some(marker);
        }
        current = host.parent(&n);
    }
    None
}

/// Phase of the click emulator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClickPhase {
    /// No tap is being tracked.
    Idle,
    /// A qualifying touch-start was seen.
    Armed,
    /// Moves have been seen and all stayed within the thresholds.
    Tracking,
    /// The tap ended and a synthetic click is due.
    Fired,
}

/// The tap currently being tracked.
#[derive(Clone, Debug, PartialEq)]
pub struct ClickCandidate<K> {
    /// Node the tap started on.
    pub target: K,
    /// Client position at touch-start.
    pub origin: Point,
    /// Allowed displacement per axis.
    pub threshold: Vec2,
}

/// Single-slot tap tracker with native click suppression.
#[derive(Clone, Debug)]
pub struct ClickEmulator<K> {
    candidate: Option<ClickCandidate<K>>,
    phase: ClickPhase,
    fired_at: Option<u64>,
    listeners_installed: bool,
    /// Threshold for markers without one, in pixels.
    pub default_threshold: f64,
    /// How long after a synthetic click native events are suppressed, in milliseconds.
    pub fire_window: u64,
}

impl<K: Clone + PartialEq> ClickEmulator<K> {
    /// Emulator with a 4px default threshold and a 1000ms suppression window.
    pub fn new() -> Self {
        Self::with_thresholds(
            PointerConfig::CLICK_DEFAULT_THRESHOLD,
            PointerConfig::EVENT_FIRE_TIME_THRESHOLD,
        )
    }

    /// Emulator with custom thresholds.
    pub fn with_thresholds(default_threshold: f64, fire_window: u64) -> Self {
        Self {
            candidate: None,
            phase: ClickPhase::Idle,
            fired_at: None,
            listeners_installed: false,
            default_threshold,
            fire_window,
        }
    }

    /// Emulator configured from `config`.
    pub fn from_config(config: &PointerConfig) -> Self {
        Self::with_thresholds(config.default_click_threshold, config.fire_window)
    }

    /// Record a touch-start on `target` at client position `origin`.
    ///
    /// `marker` is the result of [`find_marker`], or `None` for disabled targets.
    /// Returns `true` when the tap is armed. Any previous candidate is dropped.
    pub fn on_start(&mut self, target: K, origin: Point, marker: Option<ClickMarker>) -> bool {
        match marker.filter(|m| m.is_set()) {
            Some(marker) => {
                self.candidate = Some(ClickCandidate {
                    target,
                    origin,
                    threshold: marker.thresholds(self.default_threshold),
                });
                self.phase = ClickPhase::Armed;
                true
            }
            None => {
                self.candidate = None;
                self.phase = ClickPhase::Idle;
                false
            }
        }
    }

    /// Validate a move against the candidate.
    ///
    /// Returns `true` while the tap is still valid. Once invalid, the candidate stays
    /// invalid until the next touch-start.
    pub fn on_move(&mut self, target: &K, position: Point) -> bool {
        let Some(candidate) = &self.candidate else {
            return false;
        };
        let within = candidate.target == *target
            && abs_diff(position.x, candidate.origin.x) <= candidate.threshold.x
            && abs_diff(position.y, candidate.origin.y) <= candidate.threshold.y;
        if within {
            self.phase = ClickPhase::Tracking;
        } else {
            log::debug!("tap on {:?} canceled by movement", candidate.origin);
            self.candidate = None;
            self.phase = ClickPhase::Idle;
        }
        within
    }

    /// Record the end of the touch at time `now`.
    ///
    /// Returns `true` when a synthetic click should be dispatched; the suppression
    /// window starts at `now`.
    pub fn on_end(&mut self, now: u64) -> bool {
        if self.candidate.take().is_none() {
            self.phase = ClickPhase::Idle;
            return false;
        }
        self.fired_at = Some(now);
        self.phase = ClickPhase::Fired;
        true
    }

    /// Whether a `click`, `mousedown` or `mouseup` arriving at `now` must be swallowed.
    pub fn suppresses(&self, now: u64, synthetic: bool) -> bool {
        !synthetic
            && self
                .fired_at
                .is_some_and(|fired| now <= fired.saturating_add(self.fire_window))
    }

    /// Mark the document listeners as installed.
    ///
    /// Returns `true` only on the first call.
    pub fn install_listeners(&mut self) -> bool {
        !core::mem::replace(&mut self.listeners_installed, true)
    }

    /// Whether the document listeners have been installed.
    pub fn listeners_installed(&self) -> bool {
        self.listeners_installed
    }

    /// Current phase.
    pub fn phase(&self) -> ClickPhase {
        self.phase
    }

    /// The tap being tracked, if any.
    pub fn candidate(&self) -> Option<&ClickCandidate<K>> {
        self.candidate.as_ref()
    }

    /// When the last synthetic click was fired.
    pub fn fired_at(&self) -> Option<u64> {
        self.fired_at
    }
}

impl<K: Clone + PartialEq> Default for ClickEmulator<K> {
    fn default() -> Self {
        Self::new()
    }
}

fn abs_diff(a: f64, b: f64) -> f64 {
    if a >= b { a - b } else { b - a }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed(marker: ClickMarker) -> ClickEmulator<u32> {
        let mut clicks = ClickEmulator::new();
        assert!(clicks.on_start(42, Point::new(100.0, 100.0), Some(marker)));
        clicks
    }

    #[test]
    fn tap_without_movement_fires() {
        let mut clicks = armed(ClickMarker::Uniform(4.0));
        assert!(clicks.on_end(5_000));
        assert_eq!(clicks.phase(), ClickPhase::Fired);
        assert_eq!(clicks.fired_at(), Some(5_000));
        assert!(clicks.candidate().is_none());
    }

    #[test]
    fn move_at_threshold_keeps_tap() {
        let mut clicks = armed(ClickMarker::Uniform(4.0));
        assert!(clicks.on_move(&42, Point::new(104.0, 96.0)));
        assert_eq!(clicks.phase(), ClickPhase::Tracking);
        assert!(clicks.on_end(10));
    }

    #[test]
    fn move_past_threshold_cancels_tap() {
        let mut clicks = armed(ClickMarker::Uniform(4.0));
        assert!(!clicks.on_move(&42, Point::new(105.0, 100.0)));
        assert_eq!(clicks.phase(), ClickPhase::Idle);
        // Moving back does not revive it.
        assert!(!clicks.on_move(&42, Point::new(100.0, 100.0)));
        assert!(!clicks.on_end(10));
        assert_eq!(clicks.fired_at(), None);
    }

    #[test]
    fn axes_are_checked_independently() {
        let mut clicks = armed(ClickMarker::Axes { x: 10.0, y: 2.0 });
        assert!(clicks.on_move(&42, Point::new(110.0, 102.0)));
        assert!(!clicks.on_move(&42, Point::new(110.0, 103.0)));
    }

    #[test]
    fn zero_axis_uses_default() {
        assert_eq!(
            ClickMarker::Axes { x: 0.0, y: 9.0 }.thresholds(4.0),
            Vec2::new(4.0, 9.0)
        );
        assert_eq!(ClickMarker::Enabled(true).thresholds(4.0), Vec2::new(4.0, 4.0));
    }

    #[test]
    fn move_onto_other_target_cancels_tap() {
        let mut clicks = armed(ClickMarker::Enabled(true));
        assert!(!clicks.on_move(&7, Point::new(100.0, 100.0)));
        assert!(!clicks.on_end(10));
    }

    #[test]
    fn unset_marker_does_not_arm() {
        let mut clicks: ClickEmulator<u32> = ClickEmulator::new();
        assert!(!clicks.on_start(1, Point::ZERO, Some(ClickMarker::Enabled(false))));
        assert!(!clicks.on_start(1, Point::ZERO, Some(ClickMarker::Uniform(0.0))));
        assert!(!clicks.on_start(1, Point::ZERO, None));
        assert_eq!(clicks.phase(), ClickPhase::Idle);
    }

    #[test]
    fn new_start_overwrites_candidate() {
        let mut clicks = armed(ClickMarker::Enabled(true));
        clicks.on_start(7, Point::new(0.0, 0.0), Some(ClickMarker::Enabled(true)));
        assert_eq!(clicks.candidate().map(|c| c.target), Some(7));
        // A non-qualifying start clears it.
        clicks.on_start(8, Point::new(0.0, 0.0), None);
        assert!(clicks.candidate().is_none());
    }

    #[test]
    fn suppression_window_is_bounded() {
        let mut clicks = armed(ClickMarker::Enabled(true));
        assert!(!clicks.suppresses(0, false));
        clicks.on_end(1_000);
        assert!(clicks.suppresses(1_000, false));
        assert!(clicks.suppresses(1_999, false));
        assert!(clicks.suppresses(2_000, false));
        assert!(!clicks.suppresses(2_001, false));
        assert!(!clicks.suppresses(1_500, true));
    }

    #[test]
    fn install_guard_trips_once() {
        let mut clicks: ClickEmulator<u32> = ClickEmulator::new();
        assert!(!clicks.listeners_installed());
        assert!(clicks.install_listeners());
        assert!(!clicks.install_listeners());
        assert!(clicks.listeners_installed());
    }
}
