//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod collectible;
pub mod collision;
pub mod particles;
pub mod player;
pub mod rival;
pub mod state;
pub mod tick;

pub use collectible::{Collectible, PlacementReport, exclusion_zones, place_collectibles};
pub use collision::{LaserSegment, aabb_overlap, within_reach};
pub use particles::{ParticleArena, ParticleSystem, Spark, SparkColor};
pub use player::{Ability, AbilityOutcome, DashParticle, Denial, Player};
pub use rival::{HazardPhase, Rival};
pub use state::{GameEvent, GamePhase, GameState, Screen, TargetZone, Viewport};
pub use tick::{FrameStepper, TickInput, tick};
