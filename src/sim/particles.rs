//! Cosmetic particles
//!
//! Particles never affect gameplay. They live in a slot arena: dead slots are
//! recycled through a free list so indices stay stable while iterating, and the
//! arena compacts itself once most slots are dead.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Something the arena can advance one tick
pub trait Particle {
    /// Advance one tick; return `false` once the particle is dead
    fn step(&mut self, dt: f32) -> bool;
}

/// Slot arena with free-list reuse and periodic compaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleArena<P> {
    slots: Vec<Option<P>>,
    free: Vec<usize>,
    live: usize,
    capacity: usize,
}

impl<P> Default for ParticleArena<P> {
    fn default() -> Self {
        Self::with_capacity(MAX_PARTICLES)
    }
}

/// Upper bound on live particles per arena
pub const MAX_PARTICLES: usize = 512;

impl<P> ParticleArena<P> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            capacity,
        }
    }

    /// Insert a particle; returns `false` (and drops it) when the arena is full
    pub fn spawn(&mut self, particle: P) -> bool {
        if self.live >= self.capacity {
            return false;
        }
        match self.free.pop() {
            Some(i) => self.slots[i] = Some(particle),
            None => self.slots.push(Some(particle)),
        }
        self.live += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.slots.iter().flatten()
    }

    fn kill(&mut self, i: usize) {
        if self.slots[i].take().is_some() {
            self.live -= 1;
            self.free.push(i);
        }
    }

    /// Once at least half the slots are dead, drop every dead slot and clear
    /// the free list. Live particles keep their relative order but move to
    /// new indices.
    pub fn compact(&mut self) {
        let dead = self.slots.len() - self.live;
        if dead == 0 || dead * 2 < self.slots.len() {
            return;
        }
        self.slots.retain(Option::is_some);
        self.free.clear();
    }
}

impl<P: Particle> ParticleArena<P> {
    /// Advance every live particle and recycle the dead ones
    pub fn update(&mut self, dt: f32) {
        for i in 0..self.slots.len() {
            let alive = match self.slots[i].as_mut() {
                Some(p) => p.step(dt),
                None => continue,
            };
            if !alive {
                self.kill(i);
            }
        }
        self.compact();
    }
}

/// Explosion palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SparkColor {
    /// #FFD700
    Gold,
    /// #FF4500
    OrangeRed,
}

impl SparkColor {
    pub fn css(&self) -> &'static str {
        match self {
            SparkColor::Gold => "#FFD700",
            SparkColor::OrangeRed => "#FF4500",
        }
    }
}

/// Explosion spark: linear drift, fading life, shrinking size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spark {
    pub pos: Vec2,
    /// Pixels per tick
    pub vel: Vec2,
    pub color: SparkColor,
    pub size: f32,
    /// 1.0 at spawn, dead at 0
    pub life: f32,
    /// Life lost per second
    pub decay: f32,
}

impl Particle for Spark {
    fn step(&mut self, dt: f32) -> bool {
        self.pos += self.vel;
        self.life -= self.decay * dt;
        self.size *= 0.99;
        self.life > 0.0
    }
}

/// Scene-level particle effects (rival disintegration)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticleSystem {
    pub sparks: ParticleArena<Spark>,
}

impl ParticleSystem {
    /// Burst of `count` sparks at `pos`
    pub fn explode<R: Rng>(&mut self, rng: &mut R, pos: Vec2, color: SparkColor, count: usize) {
        for _ in 0..count {
            let vel = Vec2::new(
                (rng.random::<f32>() - 0.5) * 8.0,
                (rng.random::<f32>() - 0.5) * 8.0,
            );
            let spark = Spark {
                pos,
                vel,
                color,
                size: rng.random::<f32>() * 4.0 + 2.0,
                life: 1.0,
                decay: rng.random::<f32>() * 0.2 + 0.3,
            };
            if !self.sparks.spawn(spark) {
                break;
            }
        }
    }

    /// Gold and orange-red double burst used when a rival is destroyed
    pub fn disintegrate<R: Rng>(&mut self, rng: &mut R, pos: Vec2) {
        self.explode(rng, pos, SparkColor::Gold, 30);
        self.explode(rng, pos, SparkColor::OrangeRed, 15);
    }

    pub fn update(&mut self, dt: f32) {
        self.sparks.update(dt);
    }

    pub fn clear(&mut self) {
        self.sparks.clear();
    }
}
