//! Audio system using Web Audio API
//!
//! Procedurally generated sound cues - no external files needed!

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::platform::{SoundOutput, note_frequency};
use crate::settings::Settings;
use crate::tuning::SoundId;

/// Oscillator shape, pitch and envelope for one cue
struct Voice {
    wave: OscillatorType,
    /// Used when the cue carries no note of its own
    default_note: &'static str,
    peak: f32,
    attack: f64,
    length: f64,
}

fn voice(sound: SoundId) -> Voice {
    let v = |wave, default_note, peak, attack, length| Voice {
        wave,
        default_note,
        peak,
        attack,
        length,
    };
    match sound {
        SoundId::Dash => v(OscillatorType::Triangle, "C4", 0.3, 0.01, 0.2),
        SoundId::Collect => v(OscillatorType::Sine, "C5", 0.3, 0.005, 0.25),
        SoundId::Win => v(OscillatorType::Sawtooth, "C5", 0.25, 0.05, 0.7),
        SoundId::FeedbackPositive => v(OscillatorType::Triangle, "G4", 0.3, 0.005, 0.3),
        SoundId::FeedbackNegative => v(OscillatorType::Sawtooth, "F2", 0.25, 0.01, 0.2),
        SoundId::HazardWarn => v(OscillatorType::Square, "A4", 0.15, 0.01, 0.12),
        SoundId::LaserFire => v(OscillatorType::Sawtooth, "G5", 0.2, 0.005, 0.15),
        SoundId::RivalDestroyed => v(OscillatorType::Square, "G2", 0.3, 0.01, 0.45),
        SoundId::PlayerHit => v(OscillatorType::Square, "C3", 0.3, 0.01, 0.3),
        SoundId::GameOver => v(OscillatorType::Sawtooth, "C2", 0.35, 0.1, 1.4),
    }
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            volume: settings.volume(),
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Recompute output volume from preferences and window focus
    pub fn apply_settings(&mut self, settings: &Settings, focused: bool) {
        self.volume = settings.volume_when(focused);
        log::debug!("audio volume {:.2}", self.volume);
    }

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    fn play_voice(&self, ctx: &AudioContext, voice: &Voice, freq: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, freq, voice.wave) else {
            return;
        };
        let t = ctx.current_time();
        let peak = self.volume * voice.peak;

        gain.gain().set_value_at_time(0.0001, t).ok();
        gain.gain()
            .linear_ramp_to_value_at_time(peak, t + voice.attack)
            .ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, t + voice.length)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + voice.length + 0.05).ok();
    }

    /// Rival destroyed - metallic clang with a falling body
    fn play_clang(&self, ctx: &AudioContext, freq: f32) {
        let t = ctx.current_time();
        let vol = self.volume;

        if let Some((osc, gain)) = self.create_osc(ctx, freq, OscillatorType::Square) {
            gain.gain().set_value_at_time(vol * 0.3, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.4)
                .ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(freq * 0.4, t + 0.35)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.45).ok();
        }

        // Inharmonic ring on top
        if let Some((osc, gain)) = self.create_osc(ctx, freq * 5.1, OscillatorType::Triangle) {
            gain.gain().set_value_at_time(vol * 0.12, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.3).ok();
        }
    }
}

impl SoundOutput for AudioManager {
    fn play(&mut self, sound: SoundId, note: Option<&str>) {
        if self.volume <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        let voice = voice(sound);
        let Some(freq) = note
            .and_then(note_frequency)
            .or_else(|| note_frequency(voice.default_note))
        else {
            log::warn!("Unplayable note {:?} for {:?}", note, sound);
            return;
        };

        match sound {
            SoundId::RivalDestroyed => self.play_clang(ctx, freq),
            _ => self.play_voice(ctx, &voice, freq),
        }
    }
}
