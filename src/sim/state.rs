//! Game state and level orchestration
//!
//! `GameState` owns every entity for its whole lifetime. Level setup rebuilds
//! the player, rivals and packets from scratch, so nothing (including pending
//! ability or hazard countdowns) survives into the next level.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collectible::{Collectible, PlacementArea, place_collectibles};
use super::particles::ParticleSystem;
use super::player::Player;
use super::rival::Rival;
use crate::consts::NARROW_LAYOUT_MAX_WIDTH;
use crate::tuning::{FeedbackTrigger, SoundId, Tuning};

/// Canvas size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Phone-sized layout with on-screen controls
    pub fn is_narrow(&self) -> bool {
        self.width <= NARROW_LAYOUT_MAX_WIDTH
    }
}

/// Top-level game phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title/briefing; the level-1 scene is shown but frozen
    Intro,
    /// Active gameplay
    Playing,
    /// Frozen between levels while the transition plays
    LevelTransition { remaining_ms: f32 },
    /// Last level cleared
    Win,
    /// Approval hit zero
    GameOver,
}

impl GamePhase {
    /// Overlay shown while in this phase
    pub fn screen(&self) -> Option<Screen> {
        match self {
            GamePhase::Intro => Some(Screen::Intro),
            GamePhase::Playing => None,
            GamePhase::LevelTransition { .. } => Some(Screen::LevelTransition),
            GamePhase::Win => Some(Screen::Win),
            GamePhase::GameOver => Some(Screen::GameOver),
        }
    }
}

/// Full-screen overlays the display collaborator can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Intro,
    LevelTransition,
    Win,
    GameOver,
}

/// Level exit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetZone {
    pub center: Vec2,
    pub radius: f32,
    /// Set once every rival is destroyed and every packet collected
    pub active: bool,
}

/// Everything the outside world needs to hear about, in emission order
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    LevelStarted { level: u32, rivals: u32, collectibles: u32 },
    Objective(String),
    Approval(u8),
    Feedback { trigger: FeedbackTrigger, text: String, negative: bool },
    Sound { id: SoundId, note: Option<String> },
    RivalsDestroyed { destroyed: u32, total: u32 },
    HazardWarning { rival: u32, target: Vec2 },
    HazardActivated { rival: u32 },
    HazardEnded { rival: u32 },
    RivalDestroyed { rival: u32, at: Vec2 },
    TargetZoneActivated,
    ShowScreen(Screen),
    HideScreen(Screen),
}

/// Complete game state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub viewport: Viewport,
    pub phase: GamePhase,
    /// Current level number (1-based)
    pub level: u32,
    /// Simulation clock; advances only while playing
    pub clock_ms: f64,
    pub time_ticks: u64,
    pub approval: u8,
    pub player: Player,
    pub rivals: Vec<Rival>,
    pub collectibles: Vec<Collectible>,
    pub collected: u32,
    /// Packets actually placed this level (may be below the configured count)
    pub total_collectibles: u32,
    pub target_zone: TargetZone,
    pub halfway_reached: bool,
    pub particles: ParticleSystem,
    /// Number of rival sprites to pick from
    pub rival_sprite_count: usize,
    #[serde(skip)]
    events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Build the intro scene (level 1, frozen) with the given balance data
    pub fn new(seed: u64, tuning: Tuning, viewport: Viewport) -> Self {
        let player = Player::new(Self::player_spawn(viewport), &tuning.player);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            viewport,
            phase: GamePhase::Intro,
            level: 1,
            clock_ms: 0.0,
            time_ticks: 0,
            approval: tuning.starting_approval,
            player,
            rivals: Vec::new(),
            collectibles: Vec::new(),
            collected: 0,
            total_collectibles: 0,
            target_zone: TargetZone {
                center: Vec2::ZERO,
                radius: tuning.target_zone_radius,
                active: false,
            },
            halfway_reached: false,
            particles: ParticleSystem::default(),
            rival_sprite_count: crate::assets::AssetManifest::default().rivals.len(),
            tuning,
            events: Vec::new(),
            next_id: 1,
        };
        state.setup_level(true);
        state
    }

    /// Intro scene with the shipped balance
    pub fn with_default_tuning(seed: u64, viewport: Viewport) -> Self {
        Self::new(seed, Tuning::default(), viewport)
    }

    fn player_spawn(viewport: Viewport) -> Vec2 {
        Vec2::new(viewport.width / 4.0, viewport.height / 2.0)
    }

    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events emitted since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// External "start" signal; only meaningful from the intro
    pub fn start(&mut self) {
        if self.phase != GamePhase::Intro {
            log::debug!("start ignored in {:?}", self.phase);
            return;
        }
        self.begin_run();
    }

    /// External "restart" signal; valid from any phase
    pub fn restart(&mut self) {
        self.begin_run();
    }

    fn begin_run(&mut self) {
        if let Some(screen) = self.phase.screen() {
            self.emit(GameEvent::HideScreen(screen));
        }
        self.level = 1;
        self.phase = GamePhase::Playing;
        self.setup_level(true);
        log::info!("Run started (seed {})", self.seed);
    }

    /// Viewport changed. Mid-run the current level is rebuilt for the new size.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        if matches!(self.phase, GamePhase::Playing | GamePhase::LevelTransition { .. }) {
            log::info!("Viewport now {}x{}, rebuilding level {}", viewport.width, viewport.height, self.level);
            self.setup_level(false);
        }
    }

    /// Rebuild every entity for the current level
    pub(crate) fn setup_level(&mut self, reset_approval: bool) {
        let Some(config) = self.tuning.level(self.level).cloned() else {
            self.win();
            return;
        };
        let viewport = self.viewport;

        if reset_approval {
            self.approval = self.tuning.starting_approval.min(self.tuning.max_approval);
        }
        self.player = Player::new(Self::player_spawn(viewport), &self.tuning.player);
        self.target_zone = TargetZone {
            center: Vec2::new(viewport.width * config.target_x_ratio, viewport.height * config.target_y_ratio),
            radius: self.tuning.target_zone_radius,
            active: false,
        };

        self.rivals.clear();
        for _ in 0..config.num_rivals {
            let id = self.next_entity_id();
            let rival = Rival::spawn(
                &mut self.rng,
                id,
                viewport.size(),
                &config,
                &self.tuning.rival,
                self.rival_sprite_count,
            );
            self.rivals.push(rival);
        }

        let area = PlacementArea {
            viewport,
            player_spawn: Self::player_spawn(viewport),
            player_half_width: self.tuning.player.half_width(),
            zone_center: self.target_zone.center,
            zone_radius: self.target_zone.radius,
            rivals: &self.rivals,
        };
        let (collectibles, report) =
            place_collectibles(&mut self.rng, config.num_collectibles, &area, &self.tuning.collectible);
        self.collectibles = collectibles;
        self.total_collectibles = report.placed;
        self.collected = 0;
        self.halfway_reached = false;
        self.particles.clear();

        log::info!(
            "Level {} ready: {} rivals, {}/{} packets",
            config.level,
            config.num_rivals,
            report.placed,
            report.requested
        );
        self.emit(GameEvent::LevelStarted {
            level: self.level,
            rivals: config.num_rivals,
            collectibles: report.placed,
        });
        self.emit(GameEvent::Approval(self.approval));
        self.emit(GameEvent::RivalsDestroyed {
            destroyed: 0,
            total: config.num_rivals,
        });
        self.emit_objective();
    }

    /// Objective line shown in the HUD
    pub fn objective_text(&self) -> String {
        match self.tuning.level(self.level) {
            Some(config) if self.target_zone.active => config.objective_text.clone(),
            _ => format!("Collect Data! ({}/{})", self.collected, self.total_collectibles),
        }
    }

    pub(crate) fn emit_objective(&mut self) {
        let text = self.objective_text();
        self.emit(GameEvent::Objective(text));
    }

    pub fn destroyed_rivals(&self) -> u32 {
        self.rivals.iter().filter(|r| r.destroyed).count() as u32
    }

    pub fn all_rivals_destroyed(&self) -> bool {
        self.rivals.iter().all(|r| r.destroyed)
    }

    pub fn all_collected(&self) -> bool {
        self.collected >= self.total_collectibles
    }

    pub fn is_last_level(&self) -> bool {
        self.level >= self.tuning.level_count()
    }

    /// Look up a trigger in the feedback table and apply it: approval change
    /// (clamped), HUD message and sound. Game over fires the first time
    /// approval reaches zero.
    pub fn trigger_feedback(&mut self, trigger: FeedbackTrigger) {
        let Some(entry) = self.tuning.feedback_for(trigger).cloned() else {
            log::warn!("No feedback entry for {:?}", trigger);
            return;
        };

        let approval = (i32::from(self.approval) + entry.approval).clamp(0, i32::from(self.tuning.max_approval));
        self.approval = approval as u8;
        self.emit(GameEvent::Approval(self.approval));
        self.emit(GameEvent::Feedback {
            trigger,
            text: entry.text,
            negative: entry.negative,
        });
        if let Some(id) = entry.sound {
            self.emit(GameEvent::Sound { id, note: entry.note });
        }

        if self.approval == 0 {
            self.game_over();
        }
    }

    /// Damage the player unless invulnerable; returns whether it landed
    pub fn apply_damage(&mut self, trigger: FeedbackTrigger) -> bool {
        if !self.player.make_invulnerable(&self.tuning.player) {
            return false;
        }
        self.trigger_feedback(trigger);
        true
    }

    fn game_over(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.phase = GamePhase::GameOver;
        log::info!("Game over on level {}", self.level);
        self.emit(GameEvent::Sound {
            id: SoundId::GameOver,
            note: None,
        });
        self.emit(GameEvent::ShowScreen(Screen::GameOver));
    }

    pub(crate) fn start_level_transition(&mut self) {
        self.phase = GamePhase::LevelTransition {
            remaining_ms: self.tuning.level_transition_ms,
        };
        log::info!("Level {} cleared", self.level);
        self.emit(GameEvent::Sound {
            id: SoundId::Win,
            note: Some("C5".to_string()),
        });
        self.emit(GameEvent::ShowScreen(Screen::LevelTransition));
    }

    pub(crate) fn finish_level_transition(&mut self) {
        self.level += 1;
        self.emit(GameEvent::HideScreen(Screen::LevelTransition));
        self.phase = GamePhase::Playing;
        self.setup_level(true);
    }

    pub(crate) fn win(&mut self) {
        self.phase = GamePhase::Win;
        log::info!("All levels cleared");
        self.trigger_feedback(FeedbackTrigger::Win);
        self.emit(GameEvent::ShowScreen(Screen::Win));
    }

    /// Serialized snapshot of the whole simulation
    pub fn snapshot_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
