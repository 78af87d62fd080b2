// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hover emulation for touch engines without native pointer events.
//!
//! Touch input has no notion of hovering: a `touchmove` keeps targeting the node the
//! finger went down on. [`HoverTracker`] remembers the node last reported under the
//! finger and reports the out/over pair whenever it changes. The runtime turns each
//! [`HoverTransition`] into `touch.out` on the old node and `touch.over` on the new one,
//! each naming the other as its related target.
//!
//! ```
//! use understory_pointer::hover::{HoverTracker, HoverTransition};
//!
//! // Seeded with the body.
//! let mut hover = HoverTracker::new(0_u32);
//!
//! // Touch-start always reports a transition, even onto the hovered node.
//! assert_eq!(hover.touch_start(4), HoverTransition { out: 0, over: 4 });
//!
//! // Moves only report real changes.
//! assert_eq!(hover.touch_move(4), None);
//! assert_eq!(hover.touch_move(5), Some(HoverTransition { out: 4, over: 5 }));
//! assert_eq!(hover.hovered(), &5);
//! ```

use kurbo::{Point, Vec2};

/// The node left and the node entered by a hover change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoverTransition<K> {
    /// Previously hovered node; receives `touch.out`.
    pub out: K,
    /// Newly hovered node; receives `touch.over`.
    pub over: K,
}

/// Tracks the single node currently under the finger.
#[derive(Clone, Debug)]
pub struct HoverTracker<K> {
    hovered: K,
}

impl<K: Clone + PartialEq> HoverTracker<K> {
    /// Tracker with `initial` (normally the body) as the hovered node.
    pub fn new(initial: K) -> Self {
        Self { hovered: initial }
    }

    /// The node currently considered hovered.
    pub fn hovered(&self) -> &K {
        &self.hovered
    }

    /// A touch started on `target`.
    pub fn touch_start(&mut self, target: K) -> HoverTransition<K> {
        let out = core::mem::replace(&mut self.hovered, target.clone());
        HoverTransition { out, over: target }
    }

    /// The finger is now over `node`. Returns the transition if the node changed.
    pub fn touch_move(&mut self, node: K) -> Option<HoverTransition<K>> {
        if self.hovered == node {
            return None;
        }
        Some(self.touch_start(node))
    }
}

/// Viewport point to hit-test for a touch at page coordinates `page`.
///
/// Engines with `legacy_hit_test` take page coordinates directly.
pub fn hit_test_point(page: Point, scroll: Vec2, legacy_hit_test: bool) -> Point {
    if legacy_hit_test { page } else { page - scroll }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_on_hovered_node_still_reports() {
        let mut hover = HoverTracker::new(1_u32);
        assert_eq!(hover.touch_start(1), HoverTransition { out: 1, over: 1 });
    }

    #[test]
    fn moves_report_each_change_once() {
        let mut hover = HoverTracker::new(1_u32);
        hover.touch_start(2);
        assert_eq!(hover.touch_move(3), Some(HoverTransition { out: 2, over: 3 }));
        assert_eq!(hover.touch_move(3), None);
        assert_eq!(hover.touch_move(2), Some(HoverTransition { out: 3, over: 2 }));
        assert_eq!(hover.hovered(), &2);
    }

    #[test]
    fn hit_point_subtracts_scroll() {
        let page = Point::new(50.0, 500.0);
        let scroll = Vec2::new(0.0, 400.0);
        assert_eq!(hit_test_point(page, scroll, false), Point::new(50.0, 100.0));
        assert_eq!(hit_test_point(page, scroll, true), page);
    }
}
