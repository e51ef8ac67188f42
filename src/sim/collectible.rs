//! Data packets and their placement
//!
//! Placement is rejection sampling: each packet gets a bounded number of
//! uniform candidates and takes the first one clear of the HUD, the player
//! spawn, the target zone and every rival spawn. A packet that finds no spot
//! is skipped, so a level can end up with fewer packets than configured.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::within_reach;
use super::player::Player;
use super::rival::Rival;
use super::state::Viewport;
use crate::Rect;
use crate::tuning::CollectibleTuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    /// Centre in canvas pixels
    pub pos: Vec2,
    pub radius: f32,
    /// Drawn packet size
    pub size: Vec2,
    pub collected: bool,
}

impl Collectible {
    pub fn new(pos: Vec2, tuning: &CollectibleTuning) -> Self {
        Self {
            pos,
            radius: tuning.radius,
            size: Vec2::new(tuning.width, tuning.height),
            collected: false,
        }
    }

    /// Mark collected if the player's centre is in reach; true only on the
    /// tick it gets picked up
    pub fn try_collect(&mut self, player: &Player) -> bool {
        if self.collected {
            return false;
        }
        if within_reach(player.center(), self.pos, self.radius + player.half_width()) {
            self.collected = true;
            return true;
        }
        false
    }
}

/// HUD regions packets must not spawn under
pub fn exclusion_zones(viewport: &Viewport) -> Vec<Rect> {
    let (w, h) = (viewport.width, viewport.height);
    let mut zones = vec![
        // Level/objective banner
        Rect::new(0.0, 0.0, w * 0.3, 50.0),
        // Approval meter
        Rect::new(w * 0.7, 0.0, w * 0.3, 100.0),
    ];
    if viewport.is_narrow() {
        // Joystick and laser button strip
        zones.push(Rect::new(0.0, h - 150.0, w, 150.0));
    }
    // Feedback feed
    zones.push(Rect::new(w * 0.7, h - 100.0, w * 0.3, 100.0));
    zones
}

/// Everything placement must keep clear of
#[derive(Debug, Clone, Copy)]
pub struct PlacementArea<'a> {
    pub viewport: Viewport,
    pub player_spawn: Vec2,
    pub player_half_width: f32,
    pub zone_center: Vec2,
    pub zone_radius: f32,
    pub rivals: &'a [Rival],
}

/// Requested vs. actually placed packets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementReport {
    pub requested: u32,
    pub placed: u32,
}

impl PlacementReport {
    pub fn shortfall(&self) -> u32 {
        self.requested - self.placed
    }
}

impl PlacementArea<'_> {
    /// Does a candidate satisfy every spacing rule?
    pub fn accepts(&self, p: Vec2, zones: &[Rect]) -> bool {
        if zones.iter().any(|z| z.contains(p)) {
            return false;
        }
        if within_reach(p, self.player_spawn, 2.0 * self.player_half_width) {
            return false;
        }
        if within_reach(p, self.zone_center, 1.5 * self.zone_radius) {
            return false;
        }
        !self
            .rivals
            .iter()
            .filter(|r| !r.destroyed)
            .any(|r| within_reach(p, r.spawn, 2.0 * r.half_width()))
    }
}

/// Place up to `count` packets inside the playable band
pub fn place_collectibles<R: Rng>(
    rng: &mut R,
    count: u32,
    area: &PlacementArea<'_>,
    tuning: &CollectibleTuning,
) -> (Vec<Collectible>, PlacementReport) {
    let zones = exclusion_zones(&area.viewport);
    let top = tuning.top_margin;
    let bottom = if area.viewport.is_narrow() {
        tuning.bottom_margin_narrow
    } else {
        tuning.bottom_margin
    };
    let span_x = (area.viewport.width - tuning.radius * 2.0).max(0.0);
    let span_y = (area.viewport.height - top - bottom).max(0.0);

    let mut placed = Vec::with_capacity(count as usize);
    for _ in 0..count {
        for _ in 0..tuning.max_attempts {
            let candidate = Vec2::new(
                tuning.radius + rng.random::<f32>() * span_x,
                top + rng.random::<f32>() * span_y,
            );
            if area.accepts(candidate, &zones) {
                placed.push(Collectible::new(candidate, tuning));
                break;
            }
        }
    }

    let report = PlacementReport {
        requested: count,
        placed: placed.len() as u32,
    };
    if report.shortfall() > 0 {
        log::warn!(
            "placed {}/{} collectibles ({}x{} viewport)",
            report.placed,
            report.requested,
            area.viewport.width,
            area.viewport.height
        );
    }
    (placed, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rivals(rng: &mut Pcg32, viewport: Viewport, tuning: &Tuning, n: u32) -> Vec<Rival> {
        (0..n)
            .map(|id| Rival::spawn(rng, id, viewport.size(), &tuning.levels[0], &tuning.rival, 4))
            .collect()
    }

    fn area<'a>(viewport: Viewport, rivals: &'a [Rival], tuning: &Tuning) -> PlacementArea<'a> {
        PlacementArea {
            viewport,
            player_spawn: Vec2::new(viewport.width / 4.0, viewport.height / 2.0),
            player_half_width: tuning.player.half_width(),
            zone_center: Vec2::new(viewport.width * 0.85, viewport.height * 0.8),
            zone_radius: tuning.target_zone_radius,
            rivals,
        }
    }

    #[test]
    fn test_exclusion_layouts() {
        let desktop = exclusion_zones(&Viewport::new(1200.0, 800.0));
        assert_eq!(desktop.len(), 3);
        let narrow = exclusion_zones(&Viewport::new(400.0, 800.0));
        assert_eq!(narrow.len(), 4);
        assert!(narrow.iter().any(|z| z.contains(Vec2::new(200.0, 700.0))));
        assert!(!desktop.iter().any(|z| z.contains(Vec2::new(600.0, 700.0))));
    }

    #[test]
    fn test_collect_once() {
        let tuning = Tuning::default();
        let mut c = Collectible::new(Vec2::new(100.0, 100.0), &tuning.collectible);
        let mut player = Player::new(Vec2::new(500.0, 500.0), &tuning.player);
        assert!(!c.try_collect(&player));
        // reach = 10 + 28
        player.pos = Vec2::new(100.0 + 37.0, 100.0) - player.size / 2.0;
        assert!(c.try_collect(&player));
        assert!(c.collected);
        assert!(!c.try_collect(&player));
    }

    #[test]
    fn test_places_requested_count_on_roomy_viewport() {
        let tuning = Tuning::default();
        let viewport = Viewport::new(1280.0, 800.0);
        let mut rng = Pcg32::seed_from_u64(11);
        let rivals = rivals(&mut rng, viewport, &tuning, 3);
        let (packets, report) = place_collectibles(&mut rng, 10, &area(viewport, &rivals, &tuning), &tuning.collectible);
        assert_eq!(report, PlacementReport { requested: 10, placed: 10 });
        assert_eq!(packets.len(), 10);
    }

    #[test]
    fn test_silent_shortfall_when_no_room() {
        let tuning = Tuning::default();
        let viewport = Viewport::new(1280.0, 800.0);
        let mut rng = Pcg32::seed_from_u64(5);
        // A player so wide that its spawn exclusion covers the whole viewport
        let crowded = PlacementArea {
            player_half_width: 10_000.0,
            ..area(viewport, &[], &tuning)
        };
        let (packets, report) = place_collectibles(&mut rng, 5, &crowded, &tuning.collectible);
        assert!(packets.is_empty());
        assert_eq!(report, PlacementReport { requested: 5, placed: 0 });
        assert_eq!(report.shortfall(), 5);
    }

    #[test]
    fn test_narrow_layout_keeps_clear_of_touch_controls() {
        let tuning = Tuning::default();
        let c = &tuning.collectible;
        assert_eq!(c.bottom_margin_narrow, 150.0);

        for (viewport, bottom) in [
            (Viewport::new(600.0, 900.0), c.bottom_margin_narrow),
            (Viewport::new(1200.0, 900.0), c.bottom_margin),
        ] {
            for seed in 0..20 {
                let mut rng = Pcg32::seed_from_u64(seed);
                let rivals = rivals(&mut rng, viewport, &tuning, 3);
                let (packets, _) = place_collectibles(&mut rng, 8, &area(viewport, &rivals, &tuning), c);
                assert!(!packets.is_empty());
                for p in &packets {
                    assert!(p.pos.y >= c.top_margin);
                    assert!(p.pos.y <= viewport.height - bottom, "y {} in {:?}", p.pos.y, viewport);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_placed_packets_respect_spacing(
            seed in any::<u64>(),
            w in 500.0f32..1600.0,
            h in 400.0f32..1000.0,
            count in 1u32..12,
        ) {
            let tuning = Tuning::default();
            let viewport = Viewport::new(w, h);
            let mut rng = Pcg32::seed_from_u64(seed);
            let rivals = rivals(&mut rng, viewport, &tuning, 4);
            let area = area(viewport, &rivals, &tuning);
            let (packets, report) = place_collectibles(&mut rng, count, &area, &tuning.collectible);
            prop_assert!(report.placed <= count);
            let zones = exclusion_zones(&viewport);
            for p in &packets {
                prop_assert!(p.pos.distance(area.player_spawn) >= 2.0 * area.player_half_width);
                prop_assert!(p.pos.distance(area.zone_center) >= 1.5 * area.zone_radius);
                for r in &rivals {
                    prop_assert!(p.pos.distance(r.spawn) >= 2.0 * r.half_width());
                }
                prop_assert!(!zones.iter().any(|z| z.contains(p.pos)));
                prop_assert!(p.pos.y >= 40.0);
            }
        }
    }
}
