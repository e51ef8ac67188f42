//! HUD model
//!
//! Holds what the overlay shows: level, objective, approval meter, rivals
//! counter, the current full-screen overlay and a short feed of feedback
//! messages. The browser layer mirrors it into the DOM every frame.

use std::collections::VecDeque;

use crate::platform::Display;
use crate::sim::Screen;

/// Messages shown at once; the oldest is dropped first
pub const FEED_CAPACITY: usize = 5;
/// How long a message stays up
pub const FEED_LIFETIME_MS: f32 = 2000.0;
/// Fade-out tail at the end of a message's life
const FEED_FADE_MS: f32 = 300.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackMessage {
    pub text: String,
    pub negative: bool,
    pub age_ms: f32,
}

impl FeedbackMessage {
    /// 1.0 while fresh, fading to 0.0 over the last few hundred ms
    pub fn opacity(&self) -> f32 {
        ((FEED_LIFETIME_MS - self.age_ms) / FEED_FADE_MS).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone)]
pub struct Hud {
    pub level: u32,
    pub objective: String,
    pub approval: u8,
    pub max_approval: u8,
    pub rivals_destroyed: u32,
    pub rivals_total: u32,
    pub overlay: Option<Screen>,
    feed: VecDeque<FeedbackMessage>,
}

impl Hud {
    pub fn new(max_approval: u8) -> Self {
        Self {
            level: 1,
            objective: String::new(),
            approval: 0,
            max_approval,
            rivals_destroyed: 0,
            rivals_total: 0,
            overlay: Some(Screen::Intro),
            feed: VecDeque::with_capacity(FEED_CAPACITY),
        }
    }

    /// "Live" indicator: on whenever no overlay is up
    pub fn is_live(&self) -> bool {
        self.overlay.is_none()
    }

    /// Meter fill in 0..=1
    pub fn approval_fraction(&self) -> f32 {
        if self.max_approval == 0 {
            return 0.0;
        }
        f32::from(self.approval) / f32::from(self.max_approval)
    }

    pub fn rivals_text(&self) -> String {
        format!("Rivals Destroyed: {}/{}", self.rivals_destroyed, self.rivals_total)
    }

    pub fn feed(&self) -> impl Iterator<Item = &FeedbackMessage> {
        self.feed.iter()
    }

    /// Age the feed and expire old messages
    pub fn update(&mut self, dt_ms: f32) {
        for msg in &mut self.feed {
            msg.age_ms += dt_ms;
        }
        self.feed.retain(|m| m.age_ms < FEED_LIFETIME_MS);
    }
}

impl Display for Hud {
    fn set_level(&mut self, level: u32) {
        self.level = level;
    }

    fn set_objective(&mut self, text: &str) {
        self.objective = text.to_string();
    }

    fn set_approval(&mut self, approval: u8) {
        self.approval = approval.min(self.max_approval);
    }

    fn set_rivals(&mut self, destroyed: u32, total: u32) {
        self.rivals_destroyed = destroyed;
        self.rivals_total = total;
    }

    fn show_feedback(&mut self, text: &str, negative: bool) {
        if self.feed.len() == FEED_CAPACITY {
            self.feed.pop_front();
        }
        self.feed.push_back(FeedbackMessage {
            text: text.to_string(),
            negative,
            age_ms: 0.0,
        });
    }

    fn show_screen(&mut self, screen: Screen) {
        self.overlay = Some(screen);
    }

    fn hide_screen(&mut self, screen: Screen) {
        if self.overlay == Some(screen) {
            self.overlay = None;
        }
    }
}
