//! Keyboard and joystick input
//!
//! Collects raw key/joystick state between frames and turns it into a
//! `TickInput`. The same input is fed to every substep of a frame.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::TickInput;

/// Knob travel (fraction of max) below which the joystick reads as centred
pub const JOYSTICK_DEAD_ZONE: f32 = 0.15;

/// Logical game keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Dash,
    Laser,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" | "w" | "W" => Some(Key::Up),
            "ArrowDown" | "s" | "S" => Some(Key::Down),
            "ArrowLeft" | "a" | "A" => Some(Key::Left),
            "ArrowRight" | "d" | "D" => Some(Key::Right),
            " " | "Spacebar" => Some(Key::Dash),
            "e" | "E" => Some(Key::Laser),
            _ => None,
        }
    }
}

/// On-screen joystick state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Joystick {
    /// Knob displacement from the base centre, in pixels
    pub offset: Vec2,
    /// Knob travel limit in pixels
    pub max_travel: f32,
    pub active: bool,
}

impl Joystick {
    pub fn new(max_travel: f32) -> Self {
        Self {
            offset: Vec2::ZERO,
            max_travel,
            active: false,
        }
    }

    /// Drag the knob; displacement is limited to `max_travel`
    pub fn drag(&mut self, offset: Vec2) {
        self.active = true;
        self.offset = offset.clamp_length_max(self.max_travel);
    }

    pub fn release(&mut self) {
        self.active = false;
        self.offset = Vec2::ZERO;
    }

    /// Normalized direction, or zero inside the dead zone
    pub fn direction(&self) -> Vec2 {
        if !self.active || self.max_travel <= 0.0 {
            return Vec2::ZERO;
        }
        if self.offset.length() > self.max_travel * JOYSTICK_DEAD_ZONE {
            self.offset.normalize_or_zero()
        } else {
            Vec2::ZERO
        }
    }
}

/// Input gathered between frames
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: BTreeSet<Key>,
    pub joystick: Joystick,
    /// Laser button on the touch layout
    pub laser_button: bool,
    /// Dash requested by a tap; consumed by the next `tick_input`
    dash_tap: bool,
}

impl InputState {
    pub fn new(joystick_travel: f32) -> Self {
        Self {
            joystick: Joystick::new(joystick_travel),
            ..Self::default()
        }
    }

    pub fn key_down(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// One-shot dash from a touch tap
    pub fn tap_dash(&mut self) {
        self.dash_tap = true;
    }

    /// Drop everything held (window blur)
    pub fn clear(&mut self) {
        self.held.clear();
        self.joystick.release();
        self.laser_button = false;
        self.dash_tap = false;
    }

    /// Keyboard direction, diagonals normalized
    pub fn keyboard_direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.is_held(Key::Up) {
            dir.y -= 1.0;
        }
        if self.is_held(Key::Down) {
            dir.y += 1.0;
        }
        if self.is_held(Key::Left) {
            dir.x -= 1.0;
        }
        if self.is_held(Key::Right) {
            dir.x += 1.0;
        }
        dir.normalize_or_zero()
    }

    /// Build this frame's tick input; a deflected joystick overrides the keys
    pub fn tick_input(&mut self) -> TickInput {
        let stick = self.joystick.direction();
        let movement = if stick != Vec2::ZERO {
            stick
        } else {
            self.keyboard_direction()
        };
        let dash = self.is_held(Key::Dash) || std::mem::take(&mut self.dash_tap);
        TickInput {
            movement,
            dash,
            laser: self.is_held(Key::Laser) || self.laser_button,
        }
    }
}
