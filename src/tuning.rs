//! Data-driven game balance
//!
//! Every number the simulation reads lives here: entity sizes and timings,
//! the ordered level table and the feedback table. `Tuning::default()` is the
//! shipped balance; `Tuning::from_json` loads an override and validates it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading or validating tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read {0}: {1}")]
    Io(String, String),
    #[error("tuning JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level table is empty")]
    NoLevels,
    #[error("{what} must be positive (got {value})")]
    NonPositive { what: &'static str, value: f32 },
    #[error("level {level}: target ratio ({x}, {y}) outside 0..=1")]
    TargetOutOfRange { level: u32, x: f32, y: f32 },
    #[error("feedback table has no entry for `{0:?}`")]
    MissingFeedback(FeedbackTrigger),
}

/// Player constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub width: f32,
    pub height: f32,
    /// Pixels per second
    pub speed: f32,
    pub dash_speed_multiplier: f32,
    pub dash_cooldown_ms: f32,
    pub dash_duration_ms: f32,
    /// Trail particle cadence while dashing
    pub dash_trail_interval_ms: f32,
    pub laser_cooldown_ms: f32,
    pub laser_duration_ms: f32,
    pub laser_range: f32,
    pub laser_width: f32,
    pub invulnerability_ms: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            width: 56.0,
            height: 56.0,
            speed: 180.0,
            dash_speed_multiplier: 2.5,
            dash_cooldown_ms: 1500.0,
            dash_duration_ms: 400.0,
            dash_trail_interval_ms: 20.0,
            laser_cooldown_ms: 2000.0,
            laser_duration_ms: 150.0,
            laser_range: 300.0,
            laser_width: 5.0,
            invulnerability_ms: 1000.0,
        }
    }
}

impl PlayerTuning {
    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }
}

/// Rival constants (per-level values live in `LevelConfig`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RivalTuning {
    pub width: f32,
    pub height: f32,
    /// Pixels per second before level multiplier and per-rival variance
    pub base_speed: f32,
    pub patrol_range_min: f32,
    pub patrol_range_spread: f32,
    pub hazard_radius: f32,
    pub hazard_warning_ms: f32,
    pub hazard_active_ms: f32,
    /// Random extra idle time added to the level's base cooldown
    pub hazard_cooldown_jitter_ms: f32,
    /// Extra grace before a rival's first hazard in a level
    pub first_hazard_grace_ms: f32,
    /// How far ahead of the player (along its last direction) hazards aim
    pub hazard_lead_distance: f32,
    /// Full width of the random aim offset on each axis
    pub hazard_aim_jitter: f32,
}

impl Default for RivalTuning {
    fn default() -> Self {
        Self {
            width: 38.0,
            height: 38.0,
            base_speed: 60.0,
            patrol_range_min: 70.0,
            patrol_range_spread: 60.0,
            hazard_radius: 50.0,
            hazard_warning_ms: 800.0,
            hazard_active_ms: 1000.0,
            hazard_cooldown_jitter_ms: 1500.0,
            first_hazard_grace_ms: 4000.0,
            hazard_lead_distance: 50.0,
            hazard_aim_jitter: 40.0,
        }
    }
}

impl RivalTuning {
    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectibleTuning {
    pub radius: f32,
    pub width: f32,
    pub height: f32,
    /// Rejection-sampling attempts per collectible before giving up
    pub max_attempts: u32,
    pub top_margin: f32,
    pub bottom_margin: f32,
    pub bottom_margin_narrow: f32,
}

impl Default for CollectibleTuning {
    fn default() -> Self {
        Self {
            radius: 10.0,
            width: 15.0,
            height: 10.0,
            max_attempts: 100,
            top_margin: 40.0,
            bottom_margin: 50.0,
            bottom_margin_narrow: 150.0,
        }
    }
}

/// One entry of the ordered level table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    pub level: u32,
    pub num_rivals: u32,
    pub num_collectibles: u32,
    /// Target zone centre as a fraction of viewport width
    pub target_x_ratio: f32,
    /// Target zone centre as a fraction of viewport height
    pub target_y_ratio: f32,
    pub objective_text: String,
    pub rival_speed_multiplier: f32,
    pub rival_hazard_cooldown_base_ms: f32,
}

/// Named gameplay triggers that map to feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackTrigger {
    Dash,
    Halfway,
    Dodge,
    HazardHit,
    RivalCollision,
    Collect,
    DestroyRival,
    Win,
}

impl FeedbackTrigger {
    pub const ALL: [FeedbackTrigger; 8] = [
        FeedbackTrigger::Dash,
        FeedbackTrigger::Halfway,
        FeedbackTrigger::Dodge,
        FeedbackTrigger::HazardHit,
        FeedbackTrigger::RivalCollision,
        FeedbackTrigger::Collect,
        FeedbackTrigger::DestroyRival,
        FeedbackTrigger::Win,
    ];
}

/// Sound cues understood by the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SoundId {
    Dash,
    Collect,
    Win,
    FeedbackPositive,
    FeedbackNegative,
    HazardWarn,
    LaserFire,
    RivalDestroyed,
    PlayerHit,
    GameOver,
}

/// Feedback table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub trigger: FeedbackTrigger,
    pub text: String,
    /// Signed change applied to approval
    pub approval: i32,
    #[serde(default)]
    pub sound: Option<SoundId>,
    /// Scientific pitch notation, e.g. "C5"
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub negative: bool,
}

/// Complete balance data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub rival: RivalTuning,
    pub collectible: CollectibleTuning,
    pub target_zone_radius: f32,
    /// Approval at the start of every level
    pub starting_approval: u8,
    pub max_approval: u8,
    pub level_transition_ms: f32,
    pub levels: Vec<LevelConfig>,
    pub feedback: Vec<FeedbackEntry>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            rival: RivalTuning::default(),
            collectible: CollectibleTuning::default(),
            target_zone_radius: 40.0,
            starting_approval: 10,
            max_approval: 100,
            level_transition_ms: 2500.0,
            levels: default_levels(),
            feedback: default_feedback(),
        }
    }
}

fn level(
    level: u32,
    num_rivals: u32,
    num_collectibles: u32,
    (target_x_ratio, target_y_ratio): (f32, f32),
    objective_text: &str,
    rival_speed_multiplier: f32,
    rival_hazard_cooldown_base_ms: f32,
) -> LevelConfig {
    LevelConfig {
        level,
        num_rivals,
        num_collectibles,
        target_x_ratio,
        target_y_ratio,
        objective_text: objective_text.to_string(),
        rival_speed_multiplier,
        rival_hazard_cooldown_base_ms,
    }
}

fn default_levels() -> Vec<LevelConfig> {
    vec![
        level(1, 3, 5, (0.85, 0.8), "Objective: Reach the Viral Stage!", 1.0, 3500.0),
        level(2, 4, 7, (0.15, 0.2), "Objective: Reach the Upload Point!", 1.1, 3000.0),
        level(3, 5, 8, (0.5, 0.15), "Objective: Secure the Data Core!", 1.15, 2800.0),
        level(4, 6, 10, (0.8, 0.2), "Objective: Final Broadcast Point!", 1.2, 2500.0),
    ]
}

fn feedback(
    trigger: FeedbackTrigger,
    text: &str,
    approval: i32,
    sound: SoundId,
    note: Option<&str>,
    negative: bool,
) -> FeedbackEntry {
    FeedbackEntry {
        trigger,
        text: text.to_string(),
        approval,
        sound: Some(sound),
        note: note.map(str::to_string),
        negative,
    }
}

fn default_feedback() -> Vec<FeedbackEntry> {
    use FeedbackTrigger as T;
    vec![
        feedback(T::Dash, "#KovuBoost!", 3, SoundId::Dash, None, false),
        feedback(T::Halfway, "Looking good! #Progress", 5, SoundId::FeedbackPositive, Some("G4"), false),
        feedback(T::Dodge, "Nice dodge! #Skillz", 4, SoundId::FeedbackPositive, Some("A4"), false),
        feedback(T::HazardHit, "Hazard Hit! Approval Lost!", -15, SoundId::PlayerHit, None, true),
        feedback(T::RivalCollision, "Collision! Ouch!", -10, SoundId::PlayerHit, None, true),
        feedback(T::Collect, "Data Packet! +Approval!", 5, SoundId::Collect, Some("C5"), false),
        feedback(T::DestroyRival, "#Victory! Community Morale Soaring!", 10, SoundId::RivalDestroyed, None, false),
        feedback(T::Win, "#Victory! Community Morale Soaring!", 20, SoundId::Win, Some("C5"), false),
    ]
}

impl Tuning {
    /// Parse and validate tuning from JSON (missing sections take defaults)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check invariants the simulation relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.levels.is_empty() {
            return Err(TuningError::NoLevels);
        }
        let dims = [
            ("player.width", self.player.width),
            ("player.height", self.player.height),
            ("player.speed", self.player.speed),
            ("rival.width", self.rival.width),
            ("rival.height", self.rival.height),
            ("rival.hazard_radius", self.rival.hazard_radius),
            ("collectible.radius", self.collectible.radius),
            ("target_zone_radius", self.target_zone_radius),
        ];
        for (what, value) in dims {
            if value <= 0.0 || !value.is_finite() {
                return Err(TuningError::NonPositive { what, value });
            }
        }
        for lvl in &self.levels {
            let in_range = |r: f32| (0.0..=1.0).contains(&r);
            if !in_range(lvl.target_x_ratio) || !in_range(lvl.target_y_ratio) {
                return Err(TuningError::TargetOutOfRange {
                    level: lvl.level,
                    x: lvl.target_x_ratio,
                    y: lvl.target_y_ratio,
                });
            }
        }
        for trigger in FeedbackTrigger::ALL {
            if self.feedback_for(trigger).is_none() {
                return Err(TuningError::MissingFeedback(trigger));
            }
        }
        Ok(())
    }

    /// Level config for a 1-based level number; `None` past the last level
    pub fn level(&self, number: u32) -> Option<&LevelConfig> {
        let index = number.checked_sub(1)? as usize;
        self.levels.get(index)
    }

    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// First feedback row matching the trigger
    pub fn feedback_for(&self, trigger: FeedbackTrigger) -> Option<&FeedbackEntry> {
        self.feedback.iter().find(|f| f.trigger == trigger)
    }
}
