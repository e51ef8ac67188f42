//! Scene drawing
//!
//! `draw_frame` paints the whole scene from a `GameState` onto anything that
//! implements `Canvas`. The browser implements it on a 2D canvas context;
//! tests implement it with a recorder.

use glam::Vec2;

use crate::Rect;
use crate::settings::Settings;
use crate::sim::player::DASH_PARTICLE_FULL_LIFE;
use crate::sim::{GameState, HazardPhase};

/// Sprites the scene can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sprite {
    Player,
    /// Index into the rival sprite list
    Rival(usize),
}

/// Minimal 2D drawing surface
pub trait Canvas {
    fn clear(&mut self, width: f32, height: f32);
    fn set_alpha(&mut self, alpha: f32);
    fn fill_rect(&mut self, rect: Rect, color: &str);
    fn stroke_rect(&mut self, rect: Rect, color: &str, line_width: f32);
    fn line(&mut self, from: Vec2, to: Vec2, color: &str, line_width: f32);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: &str);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: &str, line_width: f32);
    /// Draw a loaded sprite; returns `false` if it is not available
    fn draw_sprite(&mut self, sprite: Sprite, rect: Rect) -> bool;
}

const GRID_SPACING: f32 = 50.0;
const BACKDROP_FILL: &str = "rgba(74, 74, 138, 0.1)";
const BACKDROP_LINE: &str = "rgba(74, 74, 138, 0.2)";
const ZONE_FILL: &str = "rgba(0, 255, 0, 0.3)";
const ZONE_BORDER: &str = "#00ff00";
const PACKET_FILL: &str = "#00ffff";
const PACKET_LINES: &str = "rgba(255, 255, 255, 0.8)";
const PLAYER_PLACEHOLDER: &str = "#4a4a8a";
const RIVAL_PLACEHOLDER: &str = "#aa3344";
const HAZARD_WARNING: &str = "rgba(255, 200, 0, 0.8)";
const HAZARD_ACTIVE: &str = "rgba(255, 40, 40, 0.45)";

/// Blink period while invulnerable
const BLINK_MS: f64 = 100.0;

/// Draw one frame: backdrop, target zone, packets, player, dash trail,
/// laser, rivals with their hazards, explosion sparks
pub fn draw_frame<C: Canvas + ?Sized>(canvas: &mut C, state: &GameState, settings: &Settings) {
    let (w, h) = (state.viewport.width, state.viewport.height);
    canvas.clear(w, h);
    draw_backdrop(canvas, w, h);
    draw_target_zone(canvas, state);
    draw_packets(canvas, state);
    draw_player(canvas, state, settings);
    if settings.particles {
        draw_trail(canvas, state);
    }
    draw_laser(canvas, state);
    draw_rivals(canvas, state);
    if settings.particles {
        draw_sparks(canvas, state);
    }
}

fn draw_backdrop<C: Canvas + ?Sized>(canvas: &mut C, w: f32, h: f32) {
    canvas.fill_rect(Rect::new(w * 0.1, h * 0.1, w * 0.2, h * 0.15), BACKDROP_FILL);
    canvas.fill_rect(Rect::new(w * 0.7, h * 0.6, w * 0.15, h * 0.2), BACKDROP_FILL);
    canvas.stroke_rect(Rect::new(w * 0.5, h * 0.2, w * 0.25, h * 0.3), BACKDROP_LINE, 1.0);

    let mut x = 0.0;
    while x < w {
        canvas.line(Vec2::new(x, 0.0), Vec2::new(x, h), BACKDROP_LINE, 1.0);
        x += GRID_SPACING;
    }
    let mut y = 0.0;
    while y < h {
        canvas.line(Vec2::new(0.0, y), Vec2::new(w, y), BACKDROP_LINE, 1.0);
        y += GRID_SPACING;
    }
}

fn draw_target_zone<C: Canvas + ?Sized>(canvas: &mut C, state: &GameState) {
    let zone = &state.target_zone;
    canvas.set_alpha(if zone.active { 1.0 } else { 0.3 });
    canvas.fill_circle(zone.center, zone.radius, ZONE_FILL);
    canvas.stroke_circle(zone.center, zone.radius, ZONE_BORDER, 2.0);
    canvas.set_alpha(1.0);
}

fn draw_packets<C: Canvas + ?Sized>(canvas: &mut C, state: &GameState) {
    for packet in state.collectibles.iter().filter(|c| !c.collected) {
        let top_left = packet.pos - packet.size / 2.0;
        let rect = Rect::new(top_left.x, top_left.y, packet.size.x, packet.size.y);
        canvas.fill_rect(rect, PACKET_FILL);
        for y in [rect.y + 2.0, rect.y + rect.h / 2.0, rect.y + rect.h - 2.0] {
            canvas.line(
                Vec2::new(rect.x + 2.0, y),
                Vec2::new(rect.x + rect.w - 2.0, y),
                PACKET_LINES,
                1.0,
            );
        }
    }
}

fn draw_player<C: Canvas + ?Sized>(canvas: &mut C, state: &GameState, settings: &Settings) {
    let player = &state.player;
    let blink = player.is_invulnerable()
        && !settings.reduced_motion
        && (state.clock_ms / BLINK_MS).floor() as u64 % 2 == 1;
    canvas.set_alpha(if blink { 0.5 } else { 1.0 });
    let bounds = player.bounds();
    if !canvas.draw_sprite(Sprite::Player, bounds) {
        canvas.fill_rect(bounds, PLAYER_PLACEHOLDER);
    }
    canvas.set_alpha(1.0);
}

fn draw_trail<C: Canvas + ?Sized>(canvas: &mut C, state: &GameState) {
    let width = state.player.size.x;
    for p in state.player.trail.iter() {
        let life = p.life as f32 / DASH_PARTICLE_FULL_LIFE;
        let alpha = (life * 0.7).clamp(0.0, 1.0);
        let size = (width * 0.3 * life).max(0.0);
        canvas.set_alpha(alpha * 0.5);
        canvas.fill_circle(p.pos, size * 1.5, "rgb(0, 255, 255)");
        canvas.set_alpha(alpha);
        canvas.fill_circle(p.pos, size * 0.7, "#ffffff");
    }
    canvas.set_alpha(1.0);
}

fn draw_laser<C: Canvas + ?Sized>(canvas: &mut C, state: &GameState) {
    if !state.player.is_firing() {
        return;
    }
    let beam = state.player.laser_segment(&state.tuning.player);
    let width = beam.half_width * 2.0;
    canvas.line(beam.start, beam.end, "red", width);
    canvas.line(beam.start, beam.end, "white", width * 0.4);
}

fn draw_rivals<C: Canvas + ?Sized>(canvas: &mut C, state: &GameState) {
    let radius = state.tuning.rival.hazard_radius;
    for rival in state.rivals.iter().filter(|r| !r.destroyed) {
        let bounds = rival.bounds();
        if !canvas.draw_sprite(Sprite::Rival(rival.sprite), bounds) {
            canvas.fill_rect(bounds, RIVAL_PLACEHOLDER);
        }
        match rival.hazard {
            HazardPhase::Warning { .. } => {
                canvas.stroke_circle(rival.hazard_target, radius, HAZARD_WARNING, 2.0);
            }
            HazardPhase::Active { .. } => {
                canvas.fill_circle(rival.hazard_target, radius, HAZARD_ACTIVE);
            }
            HazardPhase::Idle { .. } => {}
        }
    }
}

fn draw_sparks<C: Canvas + ?Sized>(canvas: &mut C, state: &GameState) {
    for spark in state.particles.sparks.iter() {
        canvas.set_alpha(spark.life.clamp(0.0, 1.0));
        canvas.fill_circle(spark.pos, spark.size, spark.color.css());
    }
    canvas.set_alpha(1.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{GameState, Viewport};

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear,
        Alpha(f32),
        FillRect(String),
        StrokeRect,
        Line(String),
        FillCircle(String),
        StrokeCircle(String),
        Sprite(Sprite),
    }

    /// Records calls; sprites are "loaded" only when `sprites` is set
    #[derive(Default)]
    struct Recorder {
        ops: Vec<Op>,
        sprites: bool,
    }

    impl Canvas for Recorder {
        fn clear(&mut self, _w: f32, _h: f32) {
            self.ops.push(Op::Clear);
        }
        fn set_alpha(&mut self, alpha: f32) {
            self.ops.push(Op::Alpha(alpha));
        }
        fn fill_rect(&mut self, _rect: Rect, color: &str) {
            self.ops.push(Op::FillRect(color.into()));
        }
        fn stroke_rect(&mut self, _rect: Rect, _color: &str, _w: f32) {
            self.ops.push(Op::StrokeRect);
        }
        fn line(&mut self, _a: Vec2, _b: Vec2, color: &str, _w: f32) {
            self.ops.push(Op::Line(color.into()));
        }
        fn fill_circle(&mut self, _c: Vec2, _r: f32, color: &str) {
            self.ops.push(Op::FillCircle(color.into()));
        }
        fn stroke_circle(&mut self, _c: Vec2, _r: f32, color: &str, _w: f32) {
            self.ops.push(Op::StrokeCircle(color.into()));
        }
        fn draw_sprite(&mut self, sprite: Sprite, _rect: Rect) -> bool {
            self.ops.push(Op::Sprite(sprite));
            self.sprites
        }
    }

    fn position(ops: &[Op], pred: impl Fn(&Op) -> bool) -> usize {
        ops.iter().position(pred).unwrap_or(usize::MAX)
    }

    #[test]
    fn test_draw_order() {
        let mut state = GameState::with_default_tuning(4, Viewport::new(1000.0, 800.0));
        state.start();
        let mut canvas = Recorder {
            sprites: true,
            ..Recorder::default()
        };
        draw_frame(&mut canvas, &state, &Settings::default());
        let ops = &canvas.ops;

        assert_eq!(ops[0], Op::Clear);
        let grid = position(ops, |o| *o == Op::Line(BACKDROP_LINE.into()));
        let zone = position(ops, |o| *o == Op::FillCircle(ZONE_FILL.into()));
        let packet = position(ops, |o| *o == Op::FillRect(PACKET_FILL.into()));
        let player = position(ops, |o| *o == Op::Sprite(Sprite::Player));
        let rival = position(ops, |o| matches!(o, Op::Sprite(Sprite::Rival(_))));
        assert!(grid < zone && zone < packet && packet < player && player < rival);

        // 1000/50 vertical + 800/50 horizontal grid lines
        let grid_lines = ops.iter().filter(|o| **o == Op::Line(BACKDROP_LINE.into())).count();
        assert_eq!(grid_lines, 36);
    }

    #[test]
    fn test_placeholders_when_sprites_missing() {
        let state = GameState::with_default_tuning(4, Viewport::new(1000.0, 800.0));
        let mut canvas = Recorder::default();
        draw_frame(&mut canvas, &state, &Settings::default());
        let placeholders = canvas
            .ops
            .iter()
            .filter(|o| **o == Op::FillRect(RIVAL_PLACEHOLDER.into()))
            .count();
        assert_eq!(placeholders, 3);
        assert!(canvas.ops.contains(&Op::FillRect(PLAYER_PLACEHOLDER.into())));
    }

    #[test]
    fn test_hazard_circles_and_laser() {
        let mut state = GameState::with_default_tuning(4, Viewport::new(1000.0, 800.0));
        state.start();
        state.rivals[0].hazard = HazardPhase::Warning { remaining_ms: 300.0 };
        state.rivals[1].hazard = HazardPhase::Active { remaining_ms: 300.0 };
        state.rivals[2].destroy();
        let _ = state.player.try_fire_laser(0.0, &state.tuning.player);

        let mut canvas = Recorder::default();
        draw_frame(&mut canvas, &state, &Settings::default());
        assert!(canvas.ops.contains(&Op::StrokeCircle(HAZARD_WARNING.into())));
        assert!(canvas.ops.contains(&Op::FillCircle(HAZARD_ACTIVE.into())));
        assert!(canvas.ops.contains(&Op::Line("red".into())));
        let rivals_drawn = canvas
            .ops
            .iter()
            .filter(|o| matches!(o, Op::Sprite(Sprite::Rival(_))))
            .count();
        assert_eq!(rivals_drawn, 2);
    }

    #[test]
    fn test_reduced_motion_disables_blink() {
        let mut state = GameState::with_default_tuning(4, Viewport::new(1000.0, 800.0));
        state.player.invulnerable_ms = 500.0;
        state.clock_ms = 150.0;

        let mut canvas = Recorder::default();
        draw_frame(&mut canvas, &state, &Settings::default());
        assert!(canvas.ops.contains(&Op::Alpha(0.5)));

        let calm = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        let mut canvas = Recorder::default();
        draw_frame(&mut canvas, &state, &calm);
        assert!(!canvas.ops.contains(&Op::Alpha(0.5)));
    }
}
