//! Closed vocabularies shared by every stage of the pipeline.
//!
//! Everything the engine switches on (vibes, zones, sections, effects, ...) is a
//! closed enum so the lookup tables elsewhere in the crate are exhaustive
//! `match` expressions rather than string-keyed maps.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Active musical-genre profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Vibe {
    /// Latin party music (cumbia, salsa, reggaeton)
    FiestaLatina,
    /// Techno / club music
    TechnoClub,
    /// Pop and rock
    #[default]
    PopRock,
    /// Chill / lounge
    ChillLounge,
    /// No music profile selected
    Idle,
}

impl Vibe {
    /// All vibes in declaration order
    pub const ALL: [Vibe; 5] = [
        Vibe::FiestaLatina,
        Vibe::TechnoClub,
        Vibe::PopRock,
        Vibe::ChillLounge,
        Vibe::Idle,
    ];

    /// Wire name (`"techno-club"`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Vibe::FiestaLatina => "fiesta-latina",
            Vibe::TechnoClub => "techno-club",
            Vibe::PopRock => "pop-rock",
            Vibe::ChillLounge => "chill-lounge",
            Vibe::Idle => "idle",
        }
    }
}

impl fmt::Display for Vibe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vibe {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Vibe::ALL
            .into_iter()
            .find(|v| v.as_str() == s.trim())
            .ok_or_else(|| CoreError::UnknownName {
                kind: "vibe",
                name: s.to_string(),
            })
    }
}

/// One of the seven energy bands, ordered from quietest to loudest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Near silence / AGC noise floor
    #[default]
    Silence,
    /// Real breakdowns
    Valley,
    /// Pads and soft vocals
    Ambient,
    /// Light rhythms
    Gentle,
    /// Regular groove
    Active,
    /// Hard kicks
    Intense,
    /// True drops only
    Peak,
}

impl Zone {
    /// All zones from quietest to loudest
    pub const ALL: [Zone; 7] = [
        Zone::Silence,
        Zone::Valley,
        Zone::Ambient,
        Zone::Gentle,
        Zone::Active,
        Zone::Intense,
        Zone::Peak,
    ];

    /// Silence, valley and ambient
    pub fn is_low(&self) -> bool {
        matches!(self, Zone::Silence | Zone::Valley | Zone::Ambient)
    }

    /// Intense and peak
    pub fn is_high(&self) -> bool {
        matches!(self, Zone::Intense | Zone::Peak)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Zone::Silence => "silence",
            Zone::Valley => "valley",
            Zone::Ambient => "ambient",
            Zone::Gentle => "gentle",
            Zone::Active => "active",
            Zone::Intense => "intense",
            Zone::Peak => "peak",
        };
        f.write_str(name)
    }
}

/// Normalised song section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    /// Intro
    Intro,
    /// Verse (also the fallback for unknown labels)
    #[default]
    Verse,
    /// Buildup / pre-chorus
    Buildup,
    /// Chorus
    Chorus,
    /// Drop
    Drop,
    /// Bridge (kept distinct for the fuzzy section profile)
    Bridge,
    /// Breakdown
    Breakdown,
    /// Outro
    Outro,
}

impl SectionType {
    /// Normalise an upstream section label. Unknown labels map to `Verse`.
    pub fn normalize(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "intro" => SectionType::Intro,
            "verse" => SectionType::Verse,
            "buildup" | "build" | "pre-chorus" | "prechorus" => SectionType::Buildup,
            "chorus" => SectionType::Chorus,
            "drop" => SectionType::Drop,
            "bridge" => SectionType::Bridge,
            "breakdown" => SectionType::Breakdown,
            "outro" => SectionType::Outro,
            _ => SectionType::Verse,
        }
    }

    /// Lower-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Intro => "intro",
            SectionType::Verse => "verse",
            SectionType::Buildup => "buildup",
            SectionType::Chorus => "chorus",
            SectionType::Drop => "drop",
            SectionType::Bridge => "bridge",
            SectionType::Breakdown => "breakdown",
            SectionType::Outro => "outro",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spectral texture of the current audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Texture {
    /// Tonal, uncluttered
    #[default]
    Clean,
    /// Dark / low centroid
    Warm,
    /// Loud and distorted but defined
    Harsh,
    /// Loud and smeared
    Noisy,
}

/// Which textures an effect looks right on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureCompatibility {
    /// Delicate, precise looks
    Clean,
    /// Gritty, glitchy looks
    Dirty,
    /// Fits any texture
    Universal,
}

/// Hunt engine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HuntPhase {
    /// Nothing interesting going on
    #[default]
    Sleeping,
    /// Watching a candidate moment
    Stalking,
    /// Scoring the candidate against the vibe thresholds
    Evaluating,
    /// Strike frame
    Striking,
    /// Post-strike refractory period
    Learning,
}

impl fmt::Display for HuntPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HuntPhase::Sleeping => "sleeping",
            HuntPhase::Stalking => "stalking",
            HuntPhase::Evaluating => "evaluating",
            HuntPhase::Striking => "striking",
            HuntPhase::Learning => "learning",
        };
        f.write_str(name)
    }
}

/// Direction of a short score history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Going up
    Rising,
    /// Flat
    #[default]
    Stable,
    /// Going down
    Falling,
}

/// Colour harmony strategy suggested to the external colour engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorStrategy {
    /// Neighbouring hues
    Analogous,
    /// Three evenly spaced hues
    Triadic,
    /// Opposite hues
    Complementary,
    /// Base plus the two neighbours of its complement
    SplitComplementary,
}

impl ColorStrategy {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorStrategy::Analogous => "analogous",
            ColorStrategy::Triadic => "triadic",
            ColorStrategy::Complementary => "complementary",
            ColorStrategy::SplitComplementary => "split_complementary",
        }
    }
}

impl fmt::Display for ColorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every lighting effect the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum EffectKind {
    // Latin
    TropicalPulse,
    SalsaFire,
    CumbiaMoon,
    ClaveRhythm,
    CorazonLatino,
    // Shared heavy hitters
    SolarFlare,
    StrobeStorm,
    StrobeBurst,
    TidalWave,
    GhostBreath,
    // Techno
    IndustrialStrobe,
    AcidSweep,
    CyberDualism,
    GatlingRaid,
    SkySaw,
    AbyssalRise,
    VoidMist,
    DigitalRain,
    DeepBreath,
    AmbientStrobe,
    SonarPing,
    BinaryGlitch,
    SeismicSnap,
    FiberOptics,
    CoreMeltdown,
    // Oceanic (chill)
    SolarCaustics,
    SchoolOfFish,
    WhaleSong,
    AbyssalJellyfish,
}

impl EffectKind {
    /// All effects
    pub const ALL: [EffectKind; 29] = [
        EffectKind::TropicalPulse,
        EffectKind::SalsaFire,
        EffectKind::CumbiaMoon,
        EffectKind::ClaveRhythm,
        EffectKind::CorazonLatino,
        EffectKind::SolarFlare,
        EffectKind::StrobeStorm,
        EffectKind::StrobeBurst,
        EffectKind::TidalWave,
        EffectKind::GhostBreath,
        EffectKind::IndustrialStrobe,
        EffectKind::AcidSweep,
        EffectKind::CyberDualism,
        EffectKind::GatlingRaid,
        EffectKind::SkySaw,
        EffectKind::AbyssalRise,
        EffectKind::VoidMist,
        EffectKind::DigitalRain,
        EffectKind::DeepBreath,
        EffectKind::AmbientStrobe,
        EffectKind::SonarPing,
        EffectKind::BinaryGlitch,
        EffectKind::SeismicSnap,
        EffectKind::FiberOptics,
        EffectKind::CoreMeltdown,
        EffectKind::SolarCaustics,
        EffectKind::SchoolOfFish,
        EffectKind::WhaleSong,
        EffectKind::AbyssalJellyfish,
    ];

    /// Snake-case identifier used on the wire and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::TropicalPulse => "tropical_pulse",
            EffectKind::SalsaFire => "salsa_fire",
            EffectKind::CumbiaMoon => "cumbia_moon",
            EffectKind::ClaveRhythm => "clave_rhythm",
            EffectKind::CorazonLatino => "corazon_latino",
            EffectKind::SolarFlare => "solar_flare",
            EffectKind::StrobeStorm => "strobe_storm",
            EffectKind::StrobeBurst => "strobe_burst",
            EffectKind::TidalWave => "tidal_wave",
            EffectKind::GhostBreath => "ghost_breath",
            EffectKind::IndustrialStrobe => "industrial_strobe",
            EffectKind::AcidSweep => "acid_sweep",
            EffectKind::CyberDualism => "cyber_dualism",
            EffectKind::GatlingRaid => "gatling_raid",
            EffectKind::SkySaw => "sky_saw",
            EffectKind::AbyssalRise => "abyssal_rise",
            EffectKind::VoidMist => "void_mist",
            EffectKind::DigitalRain => "digital_rain",
            EffectKind::DeepBreath => "deep_breath",
            EffectKind::AmbientStrobe => "ambient_strobe",
            EffectKind::SonarPing => "sonar_ping",
            EffectKind::BinaryGlitch => "binary_glitch",
            EffectKind::SeismicSnap => "seismic_snap",
            EffectKind::FiberOptics => "fiber_optics",
            EffectKind::CoreMeltdown => "core_meltdown",
            EffectKind::SolarCaustics => "solar_caustics",
            EffectKind::SchoolOfFish => "school_of_fish",
            EffectKind::WhaleSong => "whale_song",
            EffectKind::AbyssalJellyfish => "abyssal_jellyfish",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EffectKind::ALL
            .into_iter()
            .find(|e| e.as_str() == s.trim())
            .ok_or_else(|| CoreError::UnknownName {
                kind: "effect",
                name: s.to_string(),
            })
    }
}

/// Clamp a score into `[0, 1]`.
#[inline]
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}
