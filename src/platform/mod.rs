//! Platform abstraction layer
//!
//! The simulation only emits `GameEvent`s. This module defines the two
//! collaborators that consume them (sound output and the HUD display) and
//! routes each event to the right one. The browser build plugs in Web Audio
//! and the DOM; the native build logs.

use crate::sim::{GameEvent, Screen};
use crate::tuning::SoundId;

/// Something that can play the game's sound cues
pub trait SoundOutput {
    /// Play a cue, optionally pitched to a named note ("C5")
    fn play(&mut self, sound: SoundId, note: Option<&str>);
}

/// Something that can show HUD state
pub trait Display {
    fn set_level(&mut self, level: u32);
    fn set_objective(&mut self, text: &str);
    fn set_approval(&mut self, approval: u8);
    fn set_rivals(&mut self, destroyed: u32, total: u32);
    fn show_feedback(&mut self, text: &str, negative: bool);
    fn show_screen(&mut self, screen: Screen);
    fn hide_screen(&mut self, screen: Screen);
}

/// Sound output that only logs (native runs and muted sessions)
#[derive(Debug, Default)]
pub struct LogSound;

impl SoundOutput for LogSound {
    fn play(&mut self, sound: SoundId, note: Option<&str>) {
        log::debug!("sound {:?} {}", sound, note.unwrap_or(""));
    }
}

/// Forward simulation events to the collaborators, in order
pub fn route_events<S, D>(events: &[GameEvent], sound: &mut S, display: &mut D)
where
    S: SoundOutput + ?Sized,
    D: Display + ?Sized,
{
    for event in events {
        match event {
            GameEvent::LevelStarted { level, .. } => display.set_level(*level),
            GameEvent::Objective(text) => display.set_objective(text),
            GameEvent::Approval(value) => display.set_approval(*value),
            GameEvent::Feedback { text, negative, .. } => display.show_feedback(text, *negative),
            GameEvent::Sound { id, note } => sound.play(*id, note.as_deref()),
            GameEvent::RivalsDestroyed { destroyed, total } => display.set_rivals(*destroyed, *total),
            GameEvent::ShowScreen(screen) => display.show_screen(*screen),
            GameEvent::HideScreen(screen) => display.hide_screen(*screen),
            GameEvent::HazardWarning { .. }
            | GameEvent::HazardActivated { .. }
            | GameEvent::HazardEnded { .. }
            | GameEvent::RivalDestroyed { .. }
            | GameEvent::TargetZoneActivated => {}
        }
    }
}

/// Frequency in Hz of a note name like "C5" or "F#4" (equal temperament, A4 = 440)
pub fn note_frequency(note: &str) -> Option<f32> {
    let mut chars = note.chars();
    let letter = chars.next()?;
    let base: i32 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let rest = chars.as_str();
    let (shift, octave) = match rest.strip_prefix('#') {
        Some(octave) => (1, octave),
        None => match rest.strip_prefix('b') {
            Some(octave) => (-1, octave),
            None => (0, rest),
        },
    };
    let octave: i32 = octave.parse().ok()?;
    let semitones_from_a4 = (octave - 4) * 12 + base + shift - 9;
    Some(440.0 * 2f32.powf(semitones_from_a4 as f32 / 12.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::Hud;

    #[derive(Default)]
    struct RecordingSound(Vec<(SoundId, Option<String>)>);

    impl SoundOutput for RecordingSound {
        fn play(&mut self, sound: SoundId, note: Option<&str>) {
            self.0.push((sound, note.map(str::to_string)));
        }
    }

    #[test]
    fn test_note_frequencies() {
        let close = |a: f32, b: f32| (a - b).abs() < 0.05;
        assert!(close(note_frequency("A4").unwrap_or(0.0), 440.0));
        assert!(close(note_frequency("C5").unwrap_or(0.0), 523.25));
        assert!(close(note_frequency("G4").unwrap_or(0.0), 392.0));
        assert!(close(note_frequency("F#4").unwrap_or(0.0), 369.99));
        assert_eq!(note_frequency("H2"), None);
        assert_eq!(note_frequency("C"), None);
    }

    #[test]
    fn test_routes_to_collaborators() {
        let events = vec![
            GameEvent::LevelStarted {
                level: 2,
                rivals: 4,
                collectibles: 7,
            },
            GameEvent::Objective("Collect Data! (0/7)".into()),
            GameEvent::Approval(10),
            GameEvent::Feedback {
                trigger: crate::tuning::FeedbackTrigger::HazardHit,
                text: "Ouch".into(),
                negative: true,
            },
            GameEvent::Sound {
                id: SoundId::PlayerHit,
                note: None,
            },
            GameEvent::RivalsDestroyed { destroyed: 1, total: 4 },
            GameEvent::HideScreen(Screen::Intro),
            GameEvent::TargetZoneActivated,
        ];
        let mut sound = RecordingSound::default();
        let mut hud = Hud::new(100);
        route_events(&events, &mut sound, &mut hud);

        assert_eq!(sound.0, vec![(SoundId::PlayerHit, None)]);
        assert_eq!(hud.level, 2);
        assert_eq!(hud.objective, "Collect Data! (0/7)");
        assert_eq!(hud.approval, 10);
        assert_eq!(hud.rivals_text(), "Rivals Destroyed: 1/4");
        assert!(hud.is_live());
        let feed: Vec<_> = hud.feed().map(|m| (m.text.as_str(), m.negative)).collect();
        assert_eq!(feed, [("Ouch", true)]);
    }

    #[test]
    fn test_game_session_drives_hud() {
        use crate::sim::{GameState, Viewport};

        let mut state = GameState::with_default_tuning(21, Viewport::new(1000.0, 800.0));
        let mut hud = Hud::new(state.tuning.max_approval);
        let mut sound = RecordingSound::default();
        route_events(&state.drain_events(), &mut sound, &mut hud);
        assert_eq!(hud.overlay, Some(Screen::Intro));

        state.start();
        route_events(&state.drain_events(), &mut sound, &mut hud);
        assert!(hud.is_live());
        assert_eq!(hud.rivals_text(), "Rivals Destroyed: 0/3");
        assert_eq!(hud.approval, 10);

        state.trigger_feedback(crate::tuning::FeedbackTrigger::HazardHit);
        route_events(&state.drain_events(), &mut sound, &mut hud);
        assert_eq!(hud.approval, 0);
        assert_eq!(hud.overlay, Some(Screen::GameOver));
        assert!(sound.0.iter().any(|(id, _)| *id == SoundId::GameOver));
    }
}
