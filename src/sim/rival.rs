//! Rivals: horizontal patrol plus a telegraphed hazard attack
//!
//! The hazard cycles `Idle -> Warning -> Active -> Idle`. Each phase owns its
//! countdown, so there is no way to be warning and active at once.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::within_reach;
use super::player::Player;
use crate::Rect;
use crate::tuning::{LevelConfig, RivalTuning};

/// Hazard sub-state with the time left in the current phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HazardPhase {
    Idle { remaining_ms: f32 },
    Warning { remaining_ms: f32 },
    Active { remaining_ms: f32 },
}

impl HazardPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, HazardPhase::Active { .. })
    }
}

/// Phase changes reported by `Rival::update`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HazardChange {
    Warned { target: Vec2 },
    Activated,
    Ended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rival {
    pub id: u32,
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Spawn anchor (top-left); patrol is centred here
    pub spawn: Vec2,
    /// Pixels per second
    pub speed: f32,
    /// +1 moving right, -1 moving left
    pub direction: f32,
    /// Half-width of the patrol range around the spawn anchor
    pub patrol_range: f32,
    pub hazard: HazardPhase,
    /// Where the current (or last) hazard is centred
    pub hazard_target: Vec2,
    /// Base idle time between hazards for this level
    pub hazard_cooldown_ms: f32,
    /// Dodge feedback already granted for this hazard cycle
    pub dodge_given: bool,
    /// Hazard damage already applied this cycle
    pub hazard_given: bool,
    pub destroyed: bool,
    /// Index into the rival sprite list
    pub sprite: usize,
}

impl Rival {
    /// Spawn a rival at a random anchor in the right half of the viewport
    pub fn spawn<R: Rng>(
        rng: &mut R,
        id: u32,
        viewport: Vec2,
        level: &LevelConfig,
        tuning: &RivalTuning,
        sprite_count: usize,
    ) -> Self {
        let spawn = Vec2::new(
            viewport.x * (0.5 + rng.random::<f32>() * 0.3),
            viewport.y * (0.15 + rng.random::<f32>() * 0.7),
        );
        let speed = tuning.base_speed * level.rival_speed_multiplier * (0.8 + rng.random::<f32>() * 0.4);
        let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let patrol_range = tuning.patrol_range_min + rng.random::<f32>() * tuning.patrol_range_spread;

        let base = level.rival_hazard_cooldown_base_ms;
        let first_idle = base * (1.0 - rng.random::<f32>())
            + rng.random::<f32>() * tuning.hazard_cooldown_jitter_ms
            + tuning.first_hazard_grace_ms;
        let sprite = if sprite_count > 0 {
            rng.random_range(0..sprite_count)
        } else {
            0
        };

        Self {
            id,
            pos: spawn,
            size: Vec2::new(tuning.width, tuning.height),
            spawn,
            speed,
            direction,
            patrol_range,
            hazard: HazardPhase::Idle { remaining_ms: first_idle },
            hazard_target: Vec2::ZERO,
            hazard_cooldown_ms: base,
            dodge_given: false,
            hazard_given: false,
            destroyed: false,
            sprite,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }

    pub fn half_width(&self) -> f32 {
        self.size.x / 2.0
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size.x, self.size.y)
    }

    /// Patrol bounds for the left edge, clamped to the viewport
    pub fn patrol_bounds(&self, viewport: Vec2) -> (f32, f32) {
        let left = (self.spawn.x - self.patrol_range).max(0.0);
        let right = (self.spawn.x + self.patrol_range).min(viewport.x - self.size.x);
        (left, right.max(left))
    }

    /// Move along the patrol line and advance the hazard cycle
    pub fn update<R: Rng>(
        &mut self,
        rng: &mut R,
        dt: f32,
        viewport: Vec2,
        player: &Player,
        tuning: &RivalTuning,
    ) -> Option<HazardChange> {
        if self.destroyed {
            return None;
        }

        self.patrol(dt, viewport);
        self.advance_hazard(rng, crate::secs_to_ms(dt), viewport, player, tuning)
    }

    fn patrol(&mut self, dt: f32, viewport: Vec2) {
        let (left, right) = self.patrol_bounds(viewport);
        let intended = self.pos.x + self.speed * dt * self.direction;
        if (self.direction > 0.0 && intended >= right) || (self.direction < 0.0 && intended <= left) {
            self.direction = -self.direction;
        }
        self.pos.x = intended.clamp(left, right);
        self.pos.y = self.pos.y.clamp(0.0, (viewport.y - self.size.y).max(0.0));
    }

    fn advance_hazard<R: Rng>(
        &mut self,
        rng: &mut R,
        dt_ms: f32,
        viewport: Vec2,
        player: &Player,
        tuning: &RivalTuning,
    ) -> Option<HazardChange> {
        match &mut self.hazard {
            HazardPhase::Idle { remaining_ms } => {
                *remaining_ms -= dt_ms;
                if *remaining_ms > 0.0 {
                    return None;
                }
                let target = Self::aim(rng, player, viewport, tuning);
                self.hazard_target = target;
                self.hazard = HazardPhase::Warning {
                    remaining_ms: tuning.hazard_warning_ms,
                };
                log::debug!("rival {} warning at ({:.0}, {:.0})", self.id, target.x, target.y);
                Some(HazardChange::Warned { target })
            }
            HazardPhase::Warning { remaining_ms } => {
                *remaining_ms -= dt_ms;
                if *remaining_ms > 0.0 {
                    return None;
                }
                self.hazard = HazardPhase::Active {
                    remaining_ms: tuning.hazard_active_ms,
                };
                self.hazard_given = false;
                self.dodge_given = false;
                Some(HazardChange::Activated)
            }
            HazardPhase::Active { remaining_ms } => {
                *remaining_ms -= dt_ms;
                if *remaining_ms > 0.0 {
                    return None;
                }
                let idle = self.hazard_cooldown_ms + rng.random::<f32>() * tuning.hazard_cooldown_jitter_ms;
                self.hazard = HazardPhase::Idle { remaining_ms: idle };
                self.hazard_given = false;
                self.dodge_given = false;
                Some(HazardChange::Ended)
            }
        }
    }

    /// Lead the player along its last direction, add jitter, keep on screen
    fn aim<R: Rng>(rng: &mut R, player: &Player, viewport: Vec2, tuning: &RivalTuning) -> Vec2 {
        let lead = player.center() + player.facing * tuning.hazard_lead_distance;
        let jitter = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5) * tuning.hazard_aim_jitter;
        let r = tuning.hazard_radius;
        let min = Vec2::splat(r);
        let max = (viewport - Vec2::splat(r)).max(min);
        (lead + jitter).clamp(min, max)
    }

    /// Player overlaps the active hazard (invulnerability is the caller's concern)
    pub fn hazard_touches(&self, player: &Player, tuning: &RivalTuning) -> bool {
        !self.destroyed
            && self.hazard.is_active()
            && within_reach(player.center(), self.hazard_target, tuning.hazard_radius + player.half_width())
    }

    /// Dashing player skimming the edge of an active hazard, once per cycle
    pub fn check_dodge(&self, player: &Player, tuning: &RivalTuning) -> bool {
        if self.destroyed || self.dodge_given || !self.hazard.is_active() || !player.is_dashing() {
            return false;
        }
        let distance = player.center().distance(self.hazard_target);
        let half = player.half_width();
        distance > tuning.hazard_radius - half && distance < tuning.hazard_radius + 1.5 * half
    }

    /// Permanently remove the rival and cancel its hazard
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.hazard = HazardPhase::Idle {
            remaining_ms: self.hazard_cooldown_ms,
        };
    }
}
