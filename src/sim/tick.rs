//! Fixed timestep simulation tick
//!
//! One call advances the game by one step. While playing, the order within a
//! step is fixed: player, abilities, rivals (patrol, hazard, damage, dodge),
//! packets, particles, halfway bonus, then the win check. Nothing after a
//! game over runs for the rest of the step.

use glam::Vec2;

use super::collision::{aabb_overlap, within_reach};
use super::rival::HazardChange;
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::tuning::{FeedbackTrigger, SoundId};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Desired direction; longer than 1 is normalized
    pub movement: Vec2,
    /// Dash held this tick
    pub dash: bool,
    /// Laser held this tick
    pub laser: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    match state.phase {
        GamePhase::Playing => step_playing(state, input, dt),
        GamePhase::LevelTransition { remaining_ms } => {
            let remaining_ms = remaining_ms - crate::secs_to_ms(dt);
            if remaining_ms > 0.0 {
                state.phase = GamePhase::LevelTransition { remaining_ms };
            } else {
                state.finish_level_transition();
            }
        }
        GamePhase::Intro | GamePhase::Win | GamePhase::GameOver => {}
    }
}

/// Converts real frame time into fixed ticks
#[derive(Debug, Clone, Default)]
pub struct FrameStepper {
    accumulator: f32,
}

impl FrameStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any owed time (after a restart or a long pause)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Run the ticks owed for one frame and return how many ran.
    ///
    /// `sample` is called at most once, and only when a tick will run, so
    /// one-shot inputs such as a dash tap are not lost on short frames.
    pub fn advance(&mut self, state: &mut GameState, frame_dt: f32, sample: impl FnOnce() -> TickInput) -> u32 {
        self.accumulator += frame_dt.min(MAX_FRAME_DT);
        if self.accumulator < SIM_DT {
            return 0;
        }

        let input = sample();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }
}

fn still_playing(state: &GameState) -> bool {
    state.phase == GamePhase::Playing
}

fn step_playing(state: &mut GameState, input: &TickInput, dt: f32) {
    state.time_ticks += 1;
    state.clock_ms += f64::from(crate::secs_to_ms(dt));

    let movement = input.movement.clamp_length_max(1.0);
    let viewport = state.viewport.size();
    state
        .player
        .update(&mut state.rng, movement, dt, viewport, &state.tuning.player);

    if input.dash
        && state
            .player
            .try_dash(&mut state.rng, state.clock_ms, &state.tuning.player)
            .started()
    {
        state.trigger_feedback(FeedbackTrigger::Dash);
    }

    if input.laser && state.player.try_fire_laser(state.clock_ms, &state.tuning.player).started() {
        state.emit(GameEvent::Sound {
            id: SoundId::LaserFire,
            note: None,
        });
        fire_laser(state);
    }

    update_rivals(state, dt);
    if !still_playing(state) {
        return;
    }

    collect_packets(state);
    if !still_playing(state) {
        return;
    }

    state.particles.update(dt);

    if !state.halfway_reached && state.player.pos.x > state.viewport.width / 2.0 {
        state.halfway_reached = true;
        state.trigger_feedback(FeedbackTrigger::Halfway);
    }

    check_win(state);
}

/// Destroy the first live rival the beam touches
fn fire_laser(state: &mut GameState) {
    let beam = state.player.laser_segment(&state.tuning.player);
    let Some(index) = state
        .rivals
        .iter()
        .position(|r| !r.destroyed && beam.hits(r.center(), r.half_width()))
    else {
        return;
    };

    let at = state.rivals[index].center();
    let id = state.rivals[index].id;
    state.rivals[index].destroy();
    log::debug!("rival {} destroyed", id);

    state.trigger_feedback(FeedbackTrigger::DestroyRival);
    state.particles.disintegrate(&mut state.rng, at);
    state.emit(GameEvent::RivalDestroyed { rival: id, at });
    state.emit(GameEvent::RivalsDestroyed {
        destroyed: state.destroyed_rivals(),
        total: state.rivals.len() as u32,
    });
    state.emit_objective();
}

fn update_rivals(state: &mut GameState, dt: f32) {
    let viewport = state.viewport.size();
    for i in 0..state.rivals.len() {
        let change = state.rivals[i].update(&mut state.rng, dt, viewport, &state.player, &state.tuning.rival);
        let id = state.rivals[i].id;
        match change {
            Some(HazardChange::Warned { target }) => {
                state.emit(GameEvent::HazardWarning { rival: id, target });
                state.emit(GameEvent::Sound {
                    id: SoundId::HazardWarn,
                    note: None,
                });
            }
            Some(HazardChange::Activated) => state.emit(GameEvent::HazardActivated { rival: id }),
            Some(HazardChange::Ended) => state.emit(GameEvent::HazardEnded { rival: id }),
            None => {}
        }

        if !state.rivals[i].hazard_given
            && state.rivals[i].hazard_touches(&state.player, &state.tuning.rival)
            && state.apply_damage(FeedbackTrigger::HazardHit)
        {
            state.rivals[i].hazard_given = true;
        }
        if !still_playing(state) {
            return;
        }

        if !state.rivals[i].destroyed && aabb_overlap(&state.player.bounds(), &state.rivals[i].bounds()) {
            state.apply_damage(FeedbackTrigger::RivalCollision);
        }
        if !still_playing(state) {
            return;
        }

        if state.rivals[i].check_dodge(&state.player, &state.tuning.rival) {
            state.rivals[i].dodge_given = true;
            state.trigger_feedback(FeedbackTrigger::Dodge);
        }
    }
}

fn collect_packets(state: &mut GameState) {
    for i in 0..state.collectibles.len() {
        if state.collectibles[i].try_collect(&state.player) {
            state.collected += 1;
            state.trigger_feedback(FeedbackTrigger::Collect);
            state.emit_objective();
            if !still_playing(state) {
                return;
            }
        }
    }
}

fn check_win(state: &mut GameState) {
    if !state.target_zone.active && state.all_collected() && state.all_rivals_destroyed() {
        state.target_zone.active = true;
        log::info!("Target zone open on level {}", state.level);
        state.emit(GameEvent::TargetZoneActivated);
        state.emit_objective();
    }

    let reach = state.target_zone.radius + state.player.half_width();
    if state.target_zone.active && within_reach(state.player.center(), state.target_zone.center, reach) {
        if state.is_last_level() {
            state.win();
        } else {
            state.start_level_transition();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputState;
    use crate::sim::player::Ability;
    use crate::sim::rival::HazardPhase;
    use crate::sim::state::{Screen, Viewport};

    fn playing(seed: u64) -> GameState {
        let mut s = GameState::with_default_tuning(seed, Viewport::new(1000.0, 800.0));
        s.start();
        s.drain_events();
        s
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    fn place_player_center(state: &mut GameState, center: Vec2) {
        state.player.pos = center - state.player.size / 2.0;
    }

    /// Keep every rival's hazard far from firing
    fn calm_rivals(state: &mut GameState) {
        for r in &mut state.rivals {
            r.hazard = HazardPhase::Idle { remaining_ms: 1.0e9 };
        }
    }

    fn clear_level(state: &mut GameState) {
        state.player.invulnerable_ms = 1.0e9;
        calm_rivals(state);

        for _ in 0..state.rivals.len() * 2 {
            let Some(target) = state.rivals.iter().find(|r| !r.destroyed) else {
                break;
            };
            let aim = target.center();
            place_player_center(state, aim - Vec2::new(100.0, 0.0));
            state.player.facing = Vec2::X;
            state.player.laser = Ability::default();
            tick(
                state,
                &TickInput {
                    laser: true,
                    ..idle()
                },
                SIM_DT,
            );
        }
        assert!(state.all_rivals_destroyed());

        let spots: Vec<Vec2> = state.collectibles.iter().map(|c| c.pos).collect();
        for spot in spots {
            place_player_center(state, spot);
            tick(state, &idle(), SIM_DT);
        }
        assert!(state.all_collected());
    }

    #[test]
    fn test_intro_is_frozen() {
        let mut s = GameState::with_default_tuning(1, Viewport::new(1000.0, 800.0));
        let before = s.player.pos;
        tick(
            &mut s,
            &TickInput {
                movement: Vec2::X,
                ..idle()
            },
            SIM_DT,
        );
        assert_eq!(s.player.pos, before);
        assert_eq!(s.time_ticks, 0);
    }

    #[test]
    fn test_level_one_clears_into_level_two() {
        let mut s = playing(3);
        assert_eq!(s.rivals.len(), 3);

        clear_level(&mut s);
        assert!(s.target_zone.active);

        let zone = s.target_zone.center;
        place_player_center(&mut s, zone);
        tick(&mut s, &idle(), SIM_DT);
        assert!(matches!(s.phase, GamePhase::LevelTransition { .. }));
        assert!(s.events().contains(&GameEvent::ShowScreen(Screen::LevelTransition)));

        // Frozen during the transition
        let clock = s.clock_ms;
        let mut frozen_ticks = 0;
        while matches!(s.phase, GamePhase::LevelTransition { .. }) && frozen_ticks < 200 {
            tick(&mut s, &idle(), SIM_DT);
            frozen_ticks += 1;
        }
        // 2500 ms at 60 Hz
        assert!((145..=151).contains(&frozen_ticks));
        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.level, 2);
        assert_eq!(s.rivals.len(), 4);
        assert_eq!(s.approval, 10);
        assert!(!s.target_zone.active);
        assert_eq!(s.clock_ms, clock);
    }

    #[test]
    fn test_last_level_wins() {
        let mut s = playing(8);
        s.level = 4;
        s.setup_level(true);
        clear_level(&mut s);
        let zone = s.target_zone.center;
        place_player_center(&mut s, zone);
        tick(&mut s, &idle(), SIM_DT);
        assert_eq!(s.phase, GamePhase::Win);
        assert!(s.events().contains(&GameEvent::ShowScreen(Screen::Win)));
    }

    #[test]
    fn test_zone_stays_active() {
        let mut s = playing(5);
        clear_level(&mut s);
        // Park away from the zone
        place_player_center(&mut s, Vec2::new(100.0, 100.0));
        s.drain_events();
        for _ in 0..120 {
            tick(&mut s, &idle(), SIM_DT);
            assert!(s.target_zone.active);
        }
        assert!(!s.events().contains(&GameEvent::TargetZoneActivated));
    }

    #[test]
    fn test_hazard_hit_at_low_approval_ends_game_once() {
        let mut s = playing(9);
        let center = s.player.center();
        s.rivals[0].hazard = HazardPhase::Active { remaining_ms: 500.0 };
        s.rivals[0].hazard_target = center;

        tick(&mut s, &idle(), SIM_DT);
        assert_eq!(s.approval, 0);
        assert_eq!(s.phase, GamePhase::GameOver);

        for _ in 0..30 {
            tick(&mut s, &idle(), SIM_DT);
        }
        let overs = s
            .drain_events()
            .into_iter()
            .filter(|e| *e == GameEvent::ShowScreen(Screen::GameOver))
            .count();
        assert_eq!(overs, 1);
    }

    #[test]
    fn test_invulnerability_window_blocks_second_hit() {
        let mut s = playing(10);
        s.approval = 100;
        calm_rivals(&mut s);
        let center = s.player.center();
        s.rivals[0].hazard = HazardPhase::Active { remaining_ms: 5000.0 };
        s.rivals[0].hazard_target = center;
        let overlap = s.player.pos;
        s.rivals[1].spawn = overlap;
        s.rivals[1].pos = overlap;

        tick(&mut s, &idle(), SIM_DT);
        assert_eq!(s.approval, 85);

        // Half a second later the body is still overlapping
        for _ in 0..30 {
            s.rivals[1].pos = overlap;
            tick(&mut s, &idle(), SIM_DT);
        }
        assert_eq!(s.approval, 85);

        // The hazard already landed this cycle; the body hits once invulnerability ends
        for _ in 0..40 {
            s.rivals[1].pos = overlap;
            tick(&mut s, &idle(), SIM_DT);
        }
        assert_eq!(s.approval, 75);
    }

    #[test]
    fn test_dash_held_fires_once_per_cooldown() {
        let mut s = playing(11);
        s.drain_events();
        let held = TickInput {
            movement: Vec2::X,
            dash: true,
            ..idle()
        };
        for _ in 0..60 {
            tick(&mut s, &held, SIM_DT);
        }
        let dashes = s
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::Feedback { trigger: FeedbackTrigger::Dash, .. }))
            .count();
        assert_eq!(dashes, 1);
    }

    fn dodges(state: &GameState) -> usize {
        state
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::Feedback { trigger: FeedbackTrigger::Dodge, .. }))
            .count()
    }

    #[test]
    fn test_dash_past_hazard_edge_dodges_once_per_cycle() {
        let mut s = playing(15);
        calm_rivals(&mut s);
        s.player.invulnerable_ms = 1.0e9;
        for r in s.rivals.iter_mut().skip(1) {
            r.destroy();
        }
        s.rivals[0].spawn = Vec2::new(20.0, 20.0);
        s.rivals[0].pos = Vec2::new(20.0, 20.0);

        // Outside the 78 px damage reach, inside the 92 px dodge ring
        place_player_center(&mut s, Vec2::new(500.0, 400.0));
        s.rivals[0].hazard_target = Vec2::new(415.0, 400.0);
        s.rivals[0].hazard = HazardPhase::Active { remaining_ms: 500.0 };

        let dash = TickInput {
            dash: true,
            ..idle()
        };
        tick(&mut s, &dash, SIM_DT);
        assert!(s.player.is_dashing());
        for _ in 0..99 {
            tick(&mut s, &idle(), SIM_DT);
        }
        assert_eq!(dodges(&s), 1);
        assert!(matches!(s.rivals[0].hazard, HazardPhase::Idle { .. }));
        assert!(!s.rivals[0].dodge_given);

        // Next cycle: the warning runs out and the ring is live again
        s.rivals[0].hazard = HazardPhase::Warning { remaining_ms: 1.0 };
        tick(&mut s, &dash, SIM_DT);
        assert!(s.rivals[0].hazard.is_active());
        for _ in 0..20 {
            tick(&mut s, &idle(), SIM_DT);
        }
        assert_eq!(dodges(&s), 2);
        assert!(
            !s.events()
                .iter()
                .any(|e| matches!(e, GameEvent::Feedback { trigger: FeedbackTrigger::HazardHit, .. }))
        );
    }

    #[test]
    fn test_dash_tap_survives_short_frames() {
        let mut s = playing(16);
        calm_rivals(&mut s);
        let mut input = InputState::new(40.0);
        let mut stepper = FrameStepper::new();

        // 100 Hz frames: every other frame owes no tick
        input.tap_dash();
        assert_eq!(stepper.advance(&mut s, 0.01, || input.tick_input()), 0);
        assert!(!s.player.is_dashing());
        assert_eq!(stepper.advance(&mut s, 0.01, || input.tick_input()), 1);
        assert!(s.player.is_dashing());
        let dashes = s
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::Feedback { trigger: FeedbackTrigger::Dash, .. }))
            .count();
        assert_eq!(dashes, 1);
    }

    #[test]
    fn test_long_stall_is_clipped() {
        let mut s = playing(17);
        calm_rivals(&mut s);
        let mut stepper = FrameStepper::new();
        let ran = stepper.advance(&mut s, 5.0, TickInput::default);
        assert!((5..=MAX_SUBSTEPS).contains(&ran));
        assert_eq!(s.time_ticks, u64::from(ran));
    }

    #[test]
    fn test_laser_misses_rival_outside_beam() {
        let mut s = playing(12);
        calm_rivals(&mut s);
        s.player.invulnerable_ms = 1.0e9;
        let aim = s.rivals[0].center();
        // Beam is 5 wide and the rival 38; 40 px of vertical offset clears both
        place_player_center(&mut s, aim - Vec2::new(100.0, 40.0));
        s.player.facing = Vec2::X;
        for r in s.rivals.iter_mut().skip(1) {
            r.destroy();
        }
        tick(
            &mut s,
            &TickInput {
                laser: true,
                ..idle()
            },
            SIM_DT,
        );
        assert!(s.player.is_firing());
        assert!(!s.rivals[0].destroyed);
    }

    #[test]
    fn test_halfway_bonus_once() {
        let mut s = playing(13);
        s.player.invulnerable_ms = 1.0e9;
        calm_rivals(&mut s);
        s.player.pos.x = 600.0;
        tick(&mut s, &idle(), SIM_DT);
        s.player.pos.x = 100.0;
        tick(&mut s, &idle(), SIM_DT);
        s.player.pos.x = 700.0;
        tick(&mut s, &idle(), SIM_DT);
        let halfway = s
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::Feedback { trigger: FeedbackTrigger::Halfway, .. }))
            .count();
        assert_eq!(halfway, 1);
    }

    #[test]
    fn test_diagonal_input_is_normalized() {
        let mut s = playing(14);
        calm_rivals(&mut s);
        s.player.invulnerable_ms = 1.0e9;
        let before = s.player.pos;
        tick(
            &mut s,
            &TickInput {
                movement: Vec2::new(1.0, 1.0),
                ..idle()
            },
            SIM_DT,
        );
        let moved = (s.player.pos - before).length();
        assert!((moved - 180.0 * SIM_DT).abs() < 1e-3);
    }

    #[test]
    fn test_same_seed_same_inputs_same_state() {
        let script: Vec<TickInput> = (0..600)
            .map(|i| TickInput {
                movement: Vec2::from_angle(i as f32 * 0.05),
                dash: i % 97 == 0,
                laser: i % 131 == 0,
            })
            .collect();

        let run = || {
            let mut s = playing(77);
            for input in &script {
                tick(&mut s, input, SIM_DT);
            }
            s.snapshot_json().expect("snapshot")
        };
        assert_eq!(run(), run());
    }
}
