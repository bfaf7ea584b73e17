//! Effect availability gatekeeper.
//!
//! The single authority consulted before any effect fires. Availability checks
//! are read-only; cooldown state only moves when hardware confirms a firing
//! through [`EffectGatekeeper::register_effect_fired`].

pub mod catalog;
pub mod mood;
pub mod texture;

pub use catalog::{
    base_cooldown_ms, divine_arsenal, hard_minimum_ms, is_oceanic, vibe_adjusted_cooldown_ms,
    vibe_arsenal, OCEANIC_EFFECTS,
};
pub use mood::{Mood, MoodPolicy, MoodProfile};
pub use texture::{curate, TextureRule, TextureVerdict};

use crate::frame::SpectralContext;
use crate::types::{EffectKind, Vibe, Zone};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;
use tracing::{debug, trace};

/// Confirmed firing ids remembered for de-duplication
const SEEN_EVENT_CAPACITY: usize = 256;

/// Why an availability check came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityReason {
    /// Nothing stands in the way
    Available,
    /// Mood force-unlock
    ForceUnlocked,
    /// Mood blocklist
    MoodBlocked,
    /// Regular cooldown still running
    Cooldown,
    /// Hard-minimum spacing still running
    HardCooldown,
}

/// Gatekeeper verdict, computed fresh per query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectAvailability {
    /// Effect may fire now
    pub available: bool,
    /// Machine-readable reason
    pub kind: AvailabilityReason,
    /// Human-readable reason
    pub reason: String,
    /// Remaining cooldown when blocked by one
    pub cooldown_remaining_ms: Option<u64>,
}

impl EffectAvailability {
    fn open(kind: AvailabilityReason, reason: String) -> Self {
        Self {
            available: true,
            kind,
            reason,
            cooldown_remaining_ms: None,
        }
    }

    fn blocked(kind: AvailabilityReason, reason: String, remaining: Option<u64>) -> Self {
        Self {
            available: false,
            kind,
            reason,
            cooldown_remaining_ms: remaining,
        }
    }
}

/// No member of a divine arsenal passed the gates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("arsenal exhausted: [{}]", join_names(.arsenal))]
pub struct ArsenalExhausted {
    /// The arsenal that was tried, in order
    pub arsenal: Vec<EffectKind>,
}

fn join_names(effects: &[EffectKind]) -> String {
    effects
        .iter()
        .map(|e| e.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A hardware-confirmed firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectFiredEvent {
    /// Unique id of the physical firing
    pub id: u64,
    /// Effect that fired
    pub effect: EffectKind,
    /// Time of the firing
    pub timestamp_ms: u64,
}

/// Cooldown state and effect policy.
#[derive(Debug, Default)]
pub struct EffectGatekeeper {
    last_fired: HashMap<EffectKind, u64>,
    fire_counts: HashMap<EffectKind, u32>,
    seen_ids: HashSet<u64>,
    seen_order: VecDeque<u64>,
}

impl EffectGatekeeper {
    /// Create an empty gatekeeper
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed firing. Returns `false` for an id already seen.
    pub fn register_effect_fired(&mut self, event: EffectFiredEvent) -> bool {
        if !self.seen_ids.insert(event.id) {
            trace!("Duplicate firing confirmation {} ignored", event.id);
            return false;
        }
        self.seen_order.push_back(event.id);
        if self.seen_order.len() > SEEN_EVENT_CAPACITY {
            if let Some(old) = self.seen_order.pop_front() {
                self.seen_ids.remove(&old);
            }
        }

        let last = self.last_fired.entry(event.effect).or_insert(0);
        *last = (*last).max(event.timestamp_ms);
        *self.fire_counts.entry(event.effect).or_default() += 1;
        debug!(
            "Cooldown registered: {} at {}ms",
            event.effect, event.timestamp_ms
        );
        true
    }

    /// When `effect` last fired
    pub fn last_fired(&self, effect: EffectKind) -> Option<u64> {
        self.last_fired.get(&effect).copied()
    }

    /// Confirmed firings of `effect` this session
    pub fn fire_count(&self, effect: EffectKind) -> u32 {
        self.fire_counts.get(&effect).copied().unwrap_or(0)
    }

    /// Cooldown after vibe override and mood scaling
    pub fn effective_cooldown_ms(
        &self,
        effect: EffectKind,
        vibe: Vibe,
        mood: &dyn MoodPolicy,
    ) -> u64 {
        mood.apply_cooldown(vibe_adjusted_cooldown_ms(effect, vibe))
    }

    /// Can `effect` fire now? First match wins: force-unlock, blocklist,
    /// cooldown.
    pub fn check_availability(
        &self,
        effect: EffectKind,
        vibe: Vibe,
        mood: &dyn MoodPolicy,
        now_ms: u64,
    ) -> EffectAvailability {
        if mood.is_effect_force_unlocked(effect) {
            return EffectAvailability::open(
                AvailabilityReason::ForceUnlocked,
                format!("{} force-unlocked by {} mood", effect, mood.mood()),
            );
        }
        if mood.is_effect_blocked(effect) {
            return EffectAvailability::blocked(
                AvailabilityReason::MoodBlocked,
                format!("{} blocked by {} mood", effect, mood.mood()),
                None,
            );
        }

        let cooldown = self.effective_cooldown_ms(effect, vibe, mood);
        if let Some(remaining) = self.remaining(effect, cooldown, now_ms) {
            return EffectAvailability::blocked(
                AvailabilityReason::Cooldown,
                format!("{} in cooldown ({}ms remaining)", effect, remaining),
                Some(remaining),
            );
        }

        EffectAvailability::open(AvailabilityReason::Available, format!("{} available", effect))
    }

    /// Hard-minimum spacing. Nothing overrides this.
    pub fn check_hard_minimum(&self, effect: EffectKind, now_ms: u64) -> EffectAvailability {
        let Some(minimum) = hard_minimum_ms(effect) else {
            return EffectAvailability::open(
                AvailabilityReason::Available,
                format!("{} has no hard minimum", effect),
            );
        };
        match self.remaining(effect, minimum, now_ms) {
            Some(remaining) => EffectAvailability::blocked(
                AvailabilityReason::HardCooldown,
                format!("HARD_COOLDOWN: {} needs {}ms more", effect, remaining),
                Some(remaining),
            ),
            None => EffectAvailability::open(
                AvailabilityReason::Available,
                format!("{} clear of hard minimum", effect),
            ),
        }
    }

    fn remaining(&self, effect: EffectKind, window_ms: u64, now_ms: u64) -> Option<u64> {
        let last = self.last_fired(effect)?;
        let elapsed = now_ms.saturating_sub(last);
        (elapsed < window_ms).then(|| window_ms - elapsed)
    }

    /// Vibe shield: a vibe exclusion is final
    pub fn is_in_vibe_arsenal(&self, effect: EffectKind, vibe: Vibe) -> bool {
        vibe_arsenal(vibe).contains(&effect)
    }

    /// Zone list plus vibe overrides, then intersected with the vibe arsenal.
    pub fn effects_allowed_for_zone(&self, zone: Zone, vibe: Vibe) -> Vec<EffectKind> {
        let arsenal = vibe_arsenal(vibe);
        let mut allowed: Vec<EffectKind> = Vec::new();
        for effect in catalog::zone_effects(zone)
            .iter()
            .chain(catalog::vibe_zone_overrides(zone, vibe))
        {
            if arsenal.contains(effect) && !allowed.contains(effect) {
                allowed.push(*effect);
            }
        }
        allowed
    }

    /// First arsenal member passing the vibe shield, availability, hard
    /// minimum and texture.
    pub fn first_available_from_arsenal(
        &self,
        arsenal: &[EffectKind],
        vibe: Vibe,
        mood: &dyn MoodPolicy,
        spectral: Option<&SpectralContext>,
        now_ms: u64,
    ) -> Result<EffectKind, ArsenalExhausted> {
        for &effect in arsenal {
            if !self.is_in_vibe_arsenal(effect, vibe) {
                trace!("Arsenal skip: {} outside the {} arsenal", effect, vibe);
                continue;
            }
            let availability = self.check_availability(effect, vibe, mood, now_ms);
            if !availability.available {
                trace!("Arsenal skip: {}", availability.reason);
                continue;
            }
            if !self.check_hard_minimum(effect, now_ms).available {
                continue;
            }
            if let Some(spectral) = spectral {
                if !curate(effect, spectral).allowed {
                    trace!("Arsenal skip: {} rejected by texture", effect);
                    continue;
                }
            }
            return Ok(effect);
        }
        Err(ArsenalExhausted {
            arsenal: arsenal.to_vec(),
        })
    }

    /// Forget every cooldown
    pub fn reset(&mut self) {
        self.last_fired.clear();
        self.fire_counts.clear();
        self.seen_ids.clear();
        self.seen_order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Texture;

    fn fired(id: u64, effect: EffectKind, timestamp_ms: u64) -> EffectFiredEvent {
        EffectFiredEvent {
            id,
            effect,
            timestamp_ms,
        }
    }

    #[test]
    fn test_fresh_effect_available() {
        let gk = EffectGatekeeper::new();
        let result = gk.check_availability(
            EffectKind::AcidSweep,
            Vibe::TechnoClub,
            &MoodProfile::default(),
            1000,
        );
        assert!(result.available);
        assert_eq!(result.kind, AvailabilityReason::Available);
    }

    #[test]
    fn test_cooldown_window_respects_mood() {
        let mut gk = EffectGatekeeper::new();
        gk.register_effect_fired(fired(1, EffectKind::AcidSweep, 10_000));
        let calm = Mood::Calm.profile();
        // 12000 * 2.0
        let blocked = gk.check_availability(EffectKind::AcidSweep, Vibe::TechnoClub, &calm, 33_999);
        assert!(!blocked.available);
        assert_eq!(blocked.cooldown_remaining_ms, Some(1));
        let open = gk.check_availability(EffectKind::AcidSweep, Vibe::TechnoClub, &calm, 34_000);
        assert!(open.available);
    }

    #[test]
    fn test_solar_flare_vibe_override() {
        let mut gk = EffectGatekeeper::new();
        gk.register_effect_fired(fired(1, EffectKind::SolarFlare, 0));
        let balanced = Mood::Balanced.profile();
        // techno: 12000 * 1.2 = 14400
        assert!(gk
            .check_availability(EffectKind::SolarFlare, Vibe::TechnoClub, &balanced, 14_400)
            .available);
        assert!(!gk
            .check_availability(EffectKind::SolarFlare, Vibe::FiestaLatina, &balanced, 14_400)
            .available);
    }

    #[test]
    fn test_force_unlock_beats_cooldown_but_not_hard_minimum() {
        let mut gk = EffectGatekeeper::new();
        gk.register_effect_fired(fired(1, EffectKind::SolarFlare, 0));
        let punk = Mood::Punk.profile();
        let result = gk.check_availability(EffectKind::SolarFlare, Vibe::PopRock, &punk, 1000);
        assert!(result.available);
        assert_eq!(result.kind, AvailabilityReason::ForceUnlocked);

        let hard = gk.check_hard_minimum(EffectKind::SolarFlare, 1000);
        assert!(!hard.available);
        assert!(hard.reason.contains("HARD_COOLDOWN"));
        assert!(gk.check_hard_minimum(EffectKind::SolarFlare, 8000).available);
    }

    #[test]
    fn test_mood_blocklist() {
        let gk = EffectGatekeeper::new();
        let result = gk.check_availability(
            EffectKind::StrobeStorm,
            Vibe::PopRock,
            &Mood::Calm.profile(),
            0,
        );
        assert!(!result.available);
        assert_eq!(result.kind, AvailabilityReason::MoodBlocked);
    }

    #[test]
    fn test_registration_idempotent_per_event() {
        let mut gk = EffectGatekeeper::new();
        assert!(gk.register_effect_fired(fired(7, EffectKind::GatlingRaid, 100)));
        assert!(!gk.register_effect_fired(fired(7, EffectKind::GatlingRaid, 100)));
        assert_eq!(gk.fire_count(EffectKind::GatlingRaid), 1);
        assert!(gk.register_effect_fired(fired(8, EffectKind::GatlingRaid, 9000)));
        assert_eq!(gk.last_fired(EffectKind::GatlingRaid), Some(9000));
    }

    #[test]
    fn test_availability_check_is_idempotent() {
        let mut gk = EffectGatekeeper::new();
        gk.register_effect_fired(fired(1, EffectKind::SkySaw, 0));
        let mood = MoodProfile::default();
        let a = gk.check_availability(EffectKind::SkySaw, Vibe::PopRock, &mood, 5000);
        let b = gk.check_availability(EffectKind::SkySaw, Vibe::PopRock, &mood, 5000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zone_vibe_intersection() {
        let gk = EffectGatekeeper::new();
        let chill_peak = gk.effects_allowed_for_zone(Zone::Peak, Vibe::ChillLounge);
        assert_eq!(chill_peak, vec![EffectKind::WhaleSong]);
        assert!(!chill_peak.contains(&EffectKind::SolarFlare));

        let latin_valley = gk.effects_allowed_for_zone(Zone::Valley, Vibe::FiestaLatina);
        assert!(latin_valley.contains(&EffectKind::CumbiaMoon));
        let techno_valley = gk.effects_allowed_for_zone(Zone::Valley, Vibe::TechnoClub);
        assert!(!techno_valley.contains(&EffectKind::CumbiaMoon));
        assert!(gk.effects_allowed_for_zone(Zone::Peak, Vibe::Idle).is_empty());
    }

    #[test]
    fn test_arsenal_falls_through_and_exhausts() {
        let mut gk = EffectGatekeeper::new();
        let mood = MoodProfile::default();
        let arsenal = divine_arsenal(Vibe::TechnoClub);
        assert_eq!(
            gk.first_available_from_arsenal(arsenal, Vibe::TechnoClub, &mood, None, 0),
            Ok(EffectKind::CoreMeltdown)
        );

        for (id, effect) in arsenal.iter().enumerate() {
            gk.register_effect_fired(fired(id as u64, *effect, 1000));
        }
        let err = gk
            .first_available_from_arsenal(arsenal, Vibe::TechnoClub, &mood, None, 2000)
            .unwrap_err();
        assert_eq!(err.arsenal, arsenal.to_vec());
        assert!(err.to_string().contains("core_meltdown"));
    }

    #[test]
    fn test_arsenal_respects_texture() {
        let gk = EffectGatekeeper::new();
        let spectral = SpectralContext {
            clarity: 0.95,
            harshness: 0.1,
            flatness: 0.1,
            centroid: 2000.0,
            texture: Texture::Clean,
        };
        // Crystal rule bans the dirty core_meltdown
        let picked = gk.first_available_from_arsenal(
            divine_arsenal(Vibe::TechnoClub),
            Vibe::TechnoClub,
            &MoodProfile::default(),
            Some(&spectral),
            0,
        );
        assert_eq!(picked, Ok(EffectKind::StrobeBurst));
    }

    #[test]
    fn test_arsenal_skips_members_outside_vibe() {
        let gk = EffectGatekeeper::new();
        let mood = MoodProfile::default();
        let arsenal = [EffectKind::CumbiaMoon, EffectKind::AcidSweep];
        assert_eq!(
            gk.first_available_from_arsenal(&arsenal, Vibe::TechnoClub, &mood, None, 0),
            Ok(EffectKind::AcidSweep)
        );
        assert!(gk
            .first_available_from_arsenal(&[EffectKind::CumbiaMoon], Vibe::TechnoClub, &mood, None, 0)
            .is_err());
    }
}
