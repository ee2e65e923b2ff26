// touch/mod.rs — touch events and sources
//
// Every input path (evdev panel, preview window mouse, tests) produces the
// same TouchEvent in logical 480×480 coordinates.

pub mod evdev;

use std::time::Instant;

use crate::config::TouchConfig;
use crate::pixelui::{LOGICAL_H, LOGICAL_W};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchKind {
    Down,
    Move,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub kind: TouchKind,
    pub x: i32,
    pub y: i32,
    pub timestamp: Instant,
}

impl TouchEvent {
    pub fn new(kind: TouchKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            x,
            y,
            timestamp: Instant::now(),
        }
    }
    pub fn down(x: i32, y: i32) -> Self {
        Self::new(TouchKind::Down, x, y)
    }
    pub fn moved(x: i32, y: i32) -> Self {
        Self::new(TouchKind::Move, x, y)
    }
    pub fn up(x: i32, y: i32) -> Self {
        Self::new(TouchKind::Up, x, y)
    }
}

/// Anything that can be drained for touch events once per frame.
pub trait TouchSource {
    /// Non-blocking: returns whatever arrived since the last call.
    fn poll(&mut self) -> Vec<TouchEvent>;
}

// ── orientation ───────────────────────────────────────────────────────────────

/// Panel mounting corrections applied after axis mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Orientation {
    pub swap_xy: bool,
    pub invert_x: bool,
    pub invert_y: bool,
}

impl Orientation {
    pub fn from_config(cfg: &TouchConfig) -> Self {
        Self {
            swap_xy: cfg.swap_xy,
            invert_x: cfg.invert_x,
            invert_y: cfg.invert_y,
        }
    }

    pub fn apply(&self, mut x: i32, mut y: i32) -> (i32, i32) {
        if self.swap_xy {
            std::mem::swap(&mut x, &mut y);
        }
        if self.invert_x {
            x = LOGICAL_W - 1 - x;
        }
        if self.invert_y {
            y = LOGICAL_H - 1 - y;
        }
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_orientation() {
        assert_eq!(Orientation::default().apply(10, 470), (10, 470));
    }

    #[test]
    fn swap_then_invert() {
        let o = Orientation {
            swap_xy: true,
            invert_x: true,
            invert_y: false,
        };
        assert_eq!(o.apply(10, 100), (379, 10));
    }
}
