//! Static effect tables: cooldowns, zones, arsenals.
//!
//! Every table is an exhaustive `match` so adding an effect or a vibe is a
//! compile error until it has been placed everywhere.

use crate::types::{EffectKind, Vibe, Zone};

use EffectKind::*;

/// Effects whose cooldown is owned by the oceanic physics and never bypassed
/// by a dream under chill-lounge.
pub const OCEANIC_EFFECTS: [EffectKind; 4] =
    [SolarCaustics, SchoolOfFish, WhaleSong, AbyssalJellyfish];

/// Whether `effect` is oceanic
pub fn is_oceanic(effect: EffectKind) -> bool {
    OCEANIC_EFFECTS.contains(&effect)
}

/// Base cooldown in milliseconds.
pub fn base_cooldown_ms(effect: EffectKind) -> u64 {
    match effect {
        CumbiaMoon => 25_000,
        TropicalPulse => 28_000,
        SalsaFire => 18_000,
        ClaveRhythm => 22_000,
        CorazonLatino => 20_000,
        SolarFlare => 30_000,
        StrobeBurst => 25_000,
        StrobeStorm => 40_000,
        GhostBreath => 35_000,
        TidalWave => 20_000,
        IndustrialStrobe => 10_000,
        AcidSweep => 12_000,
        CyberDualism => 15_000,
        GatlingRaid => 8_000,
        SkySaw => 10_000,
        AbyssalRise => 45_000,
        VoidMist => 15_000,
        DigitalRain => 18_000,
        DeepBreath => 20_000,
        AmbientStrobe => 14_000,
        SonarPing => 25_000,
        BinaryGlitch => 10_000,
        SeismicSnap => 12_000,
        FiberOptics => 20_000,
        CoreMeltdown => 30_000,
        SolarCaustics => 25_000,
        SchoolOfFish => 20_000,
        WhaleSong => 30_000,
        AbyssalJellyfish => 25_000,
    }
}

/// Per-vibe cooldown replacing the base value.
pub fn vibe_cooldown_override(effect: EffectKind, vibe: Vibe) -> Option<u64> {
    match (effect, vibe) {
        (SolarFlare, Vibe::TechnoClub) => Some(12_000),
        (SolarFlare, Vibe::FiestaLatina) => Some(30_000),
        _ => None,
    }
}

/// Base cooldown after the vibe override, before the mood.
pub fn vibe_adjusted_cooldown_ms(effect: EffectKind, vibe: Vibe) -> u64 {
    vibe_cooldown_override(effect, vibe).unwrap_or_else(|| base_cooldown_ms(effect))
}

/// Spacing no mood, unlock or dream may ever shorten.
pub fn hard_minimum_ms(effect: EffectKind) -> Option<u64> {
    match effect {
        SolarFlare => Some(8_000),
        StrobeStorm => Some(10_000),
        CoreMeltdown => Some(10_000),
        AbyssalRise => Some(15_000),
        _ => None,
    }
}

/// Base allow-list of a zone. The seven lists partition the catalogue.
pub fn zone_effects(zone: Zone) -> &'static [EffectKind] {
    match zone {
        Zone::Silence => &[VoidMist, SonarPing, WhaleSong],
        Zone::Valley => &[GhostBreath, FiberOptics, AbyssalJellyfish, DeepBreath],
        Zone::Ambient => &[DigitalRain, TidalWave, SolarCaustics, SchoolOfFish],
        Zone::Gentle => &[AcidSweep, AmbientStrobe, BinaryGlitch, CumbiaMoon],
        Zone::Active => &[CyberDualism, SeismicSnap, SkySaw, TropicalPulse, ClaveRhythm],
        Zone::Intense => &[IndustrialStrobe, StrobeBurst, SalsaFire, GatlingRaid, CorazonLatino],
        Zone::Peak => &[SolarFlare, CoreMeltdown, StrobeStorm, AbyssalRise],
    }
}

/// Extra zone entries for a vibe, unioned before the arsenal intersection.
pub fn vibe_zone_overrides(zone: Zone, vibe: Vibe) -> &'static [EffectKind] {
    match (vibe, zone) {
        (Vibe::FiestaLatina, Zone::Valley) => &[CumbiaMoon],
        (Vibe::FiestaLatina, Zone::Ambient) => &[TropicalPulse, ClaveRhythm],
        (Vibe::FiestaLatina, Zone::Gentle) => &[SalsaFire],
        (Vibe::ChillLounge, Zone::Active) => &[SchoolOfFish],
        (Vibe::ChillLounge, Zone::Intense) => &[SolarCaustics],
        (Vibe::ChillLounge, Zone::Peak) => &[WhaleSong],
        _ => &[],
    }
}

/// Every effect a vibe may ever fire.
pub fn vibe_arsenal(vibe: Vibe) -> &'static [EffectKind] {
    match vibe {
        Vibe::TechnoClub => &[
            GhostBreath,
            AcidSweep,
            CyberDualism,
            GatlingRaid,
            SkySaw,
            IndustrialStrobe,
            StrobeBurst,
            AbyssalRise,
            TidalWave,
            VoidMist,
            DigitalRain,
            DeepBreath,
            AmbientStrobe,
            SonarPing,
            BinaryGlitch,
            SeismicSnap,
            FiberOptics,
            CoreMeltdown,
            SolarFlare,
        ],
        Vibe::FiestaLatina => &[
            SolarFlare,
            StrobeBurst,
            TropicalPulse,
            SalsaFire,
            CumbiaMoon,
            ClaveRhythm,
            CorazonLatino,
            TidalWave,
            GhostBreath,
            StrobeStorm,
            DeepBreath,
        ],
        Vibe::PopRock => &[
            SolarFlare,
            StrobeBurst,
            StrobeStorm,
            TidalWave,
            GhostBreath,
            AcidSweep,
            SkySaw,
            AmbientStrobe,
            DeepBreath,
            VoidMist,
            AbyssalRise,
        ],
        Vibe::ChillLounge => &[
            SolarCaustics,
            SchoolOfFish,
            WhaleSong,
            AbyssalJellyfish,
            DeepBreath,
            VoidMist,
            FiberOptics,
            TidalWave,
            GhostBreath,
        ],
        Vibe::Idle => &[],
    }
}

/// Ordered weapons for a divine strike.
pub fn divine_arsenal(vibe: Vibe) -> &'static [EffectKind] {
    match vibe {
        Vibe::TechnoClub => &[CoreMeltdown, IndustrialStrobe, GatlingRaid, StrobeBurst],
        Vibe::FiestaLatina => &[SolarFlare, CorazonLatino, StrobeBurst, SalsaFire],
        Vibe::PopRock => &[SolarFlare, StrobeStorm, StrobeBurst],
        Vibe::ChillLounge => &[WhaleSong, SolarCaustics, AbyssalJellyfish],
        Vibe::Idle => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_zone_lists_partition_catalogue() {
        let mut seen = HashSet::new();
        for zone in Zone::ALL {
            for effect in zone_effects(zone) {
                assert!(seen.insert(*effect), "{} listed twice", effect);
            }
        }
        assert_eq!(seen.len(), EffectKind::ALL.len());
    }

    #[test]
    fn test_divine_arsenals_within_vibe_arsenal() {
        for vibe in Vibe::ALL {
            for effect in divine_arsenal(vibe) {
                assert!(vibe_arsenal(vibe).contains(effect));
            }
        }
    }

    #[test]
    fn test_solar_flare_vibe_cooldowns() {
        assert_eq!(vibe_adjusted_cooldown_ms(SolarFlare, Vibe::TechnoClub), 12_000);
        assert_eq!(vibe_adjusted_cooldown_ms(SolarFlare, Vibe::FiestaLatina), 30_000);
        assert_eq!(vibe_adjusted_cooldown_ms(SolarFlare, Vibe::PopRock), 30_000);
        assert_eq!(vibe_adjusted_cooldown_ms(AcidSweep, Vibe::TechnoClub), 12_000);
    }

    #[test]
    fn test_hard_minimums_below_base() {
        for effect in EffectKind::ALL {
            if let Some(min) = hard_minimum_ms(effect) {
                assert!(min < base_cooldown_ms(effect));
            }
        }
    }
}
