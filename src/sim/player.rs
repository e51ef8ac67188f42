//! The player: movement, dash, laser and post-hit invulnerability
//!
//! All ability end-states are countdowns decremented by `update`, and all
//! cooldowns are measured against the simulation clock handed in by the
//! caller. Nothing here reads wall-clock time.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::LaserSegment;
use super::particles::{Particle, ParticleArena};
use crate::Rect;
use crate::tuning::PlayerTuning;

/// Why an ability attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Denial {
    /// The ability is still running
    AlreadyActive,
    /// Cooldown has this many milliseconds left
    Cooldown { remaining_ms: f32 },
}

/// Result of trying to use an ability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AbilityOutcome {
    Started,
    Denied(Denial),
}

impl AbilityOutcome {
    pub fn started(&self) -> bool {
        matches!(self, AbilityOutcome::Started)
    }
}

/// A timed ability with a cooldown measured from its last start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ability {
    /// Milliseconds until the active effect ends (0 = inactive)
    pub active_ms: f32,
    /// Clock time of the last start; `None` means never used this level
    pub last_start_ms: Option<f64>,
}

impl Ability {
    pub fn is_active(&self) -> bool {
        self.active_ms > 0.0
    }

    fn try_start(&mut self, now_ms: f64, cooldown_ms: f32, duration_ms: f32) -> AbilityOutcome {
        if self.is_active() {
            return AbilityOutcome::Denied(Denial::AlreadyActive);
        }
        if let Some(last) = self.last_start_ms {
            let elapsed = (now_ms - last) as f32;
            if elapsed < cooldown_ms {
                return AbilityOutcome::Denied(Denial::Cooldown {
                    remaining_ms: cooldown_ms - elapsed,
                });
            }
        }
        self.active_ms = duration_ms;
        self.last_start_ms = Some(now_ms);
        AbilityOutcome::Started
    }

    fn tick(&mut self, dt_ms: f32) {
        self.active_ms = (self.active_ms - dt_ms).max(0.0);
    }
}

/// Dash trail particle (per-tick velocity with drag, integer life)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashParticle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Ticks left; the particle is removed at 0
    pub life: u32,
}

/// Life of a fresh burst particle, used to scale trail visuals
pub const DASH_PARTICLE_FULL_LIFE: f32 = 40.0;

impl Particle for DashParticle {
    fn step(&mut self, _dt: f32) -> bool {
        if self.life == 0 {
            return false;
        }
        self.life -= 1;
        self.pos += self.vel;
        self.vel *= 0.95;
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner in canvas pixels
    pub pos: Vec2,
    pub size: Vec2,
    pub speed: f32,
    /// Last non-zero movement input (laser aim and hazard prediction)
    pub facing: Vec2,
    pub dash: Ability,
    pub laser: Ability,
    /// Milliseconds of invulnerability left
    pub invulnerable_ms: f32,
    pub trail: ParticleArena<DashParticle>,
    /// Milliseconds since the last trail particle
    trail_timer_ms: f32,
}

impl Player {
    pub fn new(pos: Vec2, tuning: &PlayerTuning) -> Self {
        Self {
            pos,
            size: Vec2::new(tuning.width, tuning.height),
            speed: tuning.speed,
            facing: Vec2::X,
            dash: Ability::default(),
            laser: Ability::default(),
            invulnerable_ms: 0.0,
            trail: ParticleArena::default(),
            trail_timer_ms: 0.0,
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

    pub fn is_dashing(&self) -> bool {
        self.dash.is_active()
    }

    pub fn is_firing(&self) -> bool {
        self.laser.is_active()
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ms > 0.0
    }

    /// Integrate movement, clamp to the viewport and advance all timers
    pub fn update<R: Rng>(
        &mut self,
        rng: &mut R,
        movement: Vec2,
        dt: f32,
        viewport: Vec2,
        tuning: &PlayerTuning,
    ) {
        let dt_ms = crate::secs_to_ms(dt);

        if movement != Vec2::ZERO {
            self.facing = movement;
            let multiplier = if self.is_dashing() {
                tuning.dash_speed_multiplier
            } else {
                1.0
            };
            self.pos += movement * self.speed * multiplier * dt;
        }
        let max = (viewport - self.size).max(Vec2::ZERO);
        self.pos = self.pos.clamp(Vec2::ZERO, max);

        self.trail.update(dt);

        if self.is_dashing() {
            self.trail_timer_ms += dt_ms;
            if self.trail_timer_ms >= tuning.dash_trail_interval_ms {
                self.trail_timer_ms = 0.0;
                self.spawn_trail_particle(rng);
            }
        }

        self.dash.tick(dt_ms);
        self.laser.tick(dt_ms);
        self.invulnerable_ms = (self.invulnerable_ms - dt_ms).max(0.0);
    }

    fn spawn_trail_particle<R: Rng>(&mut self, rng: &mut R) {
        let spread = 10.0;
        let offset = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5) * spread;
        let jitter = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5) * 2.0;
        self.trail.spawn(DashParticle {
            pos: self.center() + offset,
            vel: -self.facing * 2.0 + jitter,
            life: rng.random_range(30..50),
        });
    }

    /// Start a dash if off cooldown; spawns the opening particle burst
    pub fn try_dash<R: Rng>(&mut self, rng: &mut R, now_ms: f64, tuning: &PlayerTuning) -> AbilityOutcome {
        let outcome = self
            .dash
            .try_start(now_ms, tuning.dash_cooldown_ms, tuning.dash_duration_ms);
        if outcome.started() {
            self.trail_timer_ms = 0.0;
            self.spawn_dash_burst(rng);
        } else {
            log::trace!("dash denied: {:?}", outcome);
        }
        outcome
    }

    /// Eight-point radial burst, biased opposite to travel on each moving axis
    fn spawn_dash_burst<R: Rng>(&mut self, rng: &mut R) {
        const BURST: usize = 8;
        let center = self.center();
        for i in 0..BURST {
            let angle = i as f32 / BURST as f32 * std::f32::consts::TAU;
            let speed = 2.0 + rng.random::<f32>() * 2.0;
            let radial = Vec2::from_angle(angle) * speed;
            let base = Vec2::new(
                if self.facing.x != 0.0 { -self.facing.x * 3.0 } else { radial.x },
                if self.facing.y != 0.0 { -self.facing.y * 3.0 } else { radial.y },
            );
            let jitter = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5) * 2.0;
            self.trail.spawn(DashParticle {
                pos: center,
                vel: base + jitter,
                life: rng.random_range(40..60),
            });
        }
    }

    /// Fire the laser if off cooldown
    pub fn try_fire_laser(&mut self, now_ms: f64, tuning: &PlayerTuning) -> AbilityOutcome {
        let outcome = self
            .laser
            .try_start(now_ms, tuning.laser_cooldown_ms, tuning.laser_duration_ms);
        if !outcome.started() {
            log::trace!("laser denied: {:?}", outcome);
        }
        outcome
    }

    /// The beam from the player's centre along its facing
    pub fn laser_segment(&self, tuning: &PlayerTuning) -> LaserSegment {
        LaserSegment::new(self.center(), self.facing, tuning.laser_range, tuning.laser_width)
    }

    /// Begin post-hit invulnerability; returns `false` if already invulnerable
    pub fn make_invulnerable(&mut self, tuning: &PlayerTuning) -> bool {
        if self.is_invulnerable() {
            return false;
        }
        self.invulnerable_ms = tuning.invulnerability_ms;
        true
    }
}
