//! Data Dash - A top-down dash-and-collect arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, hazards, collisions, game state)
//! - `tuning`: Data-driven game balance (levels, feedback table, entity constants)
//! - `input`: Keyboard/joystick to movement vector
//! - `ui`: HUD model (objective, approval, feedback feed, overlays)
//! - `render`: Full-frame drawing onto a 2D canvas
//! - `platform`: Collaborator seams (sound output, display) and event routing

pub mod assets;
#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod input;
pub mod platform;
pub mod render;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use settings::Settings;
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game loop constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 6;
    /// Largest real frame delta accepted (seconds); longer stalls are clipped
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Viewports at or below this width use the narrow (touch) layout
    pub const NARROW_LAYOUT_MAX_WIDTH: f32 = 768.0;
}

/// Axis-aligned rectangle in canvas pixels (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Inclusive point containment (edges count as inside)
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Convert seconds to milliseconds
#[inline]
pub fn secs_to_ms(secs: f32) -> f32 {
    secs * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_edges() {
        let r = Rect::new(10.0, 10.0, 20.0, 5.0);
        assert!(r.contains(Vec2::new(10.0, 10.0)));
        assert!(r.contains(Vec2::new(30.0, 15.0)));
        assert!(!r.contains(Vec2::new(30.1, 15.0)));
        assert_eq!(r.center(), Vec2::new(20.0, 12.5));
    }
}
