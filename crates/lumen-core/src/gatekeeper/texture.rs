//! Texture curation: some looks only fit some sounds.

use crate::frame::SpectralContext;
use crate::types::{EffectKind, Texture, TextureCompatibility};
use serde::{Deserialize, Serialize};

const CRYSTAL_CLARITY: f32 = 0.85;

/// Texture tag of an effect. Untagged effects are universal.
pub fn compatibility(effect: EffectKind) -> TextureCompatibility {
    use EffectKind::*;
    match effect {
        FiberOptics | SonarPing | SolarCaustics | SchoolOfFish | WhaleSong | AbyssalJellyfish
        | AmbientStrobe => TextureCompatibility::Clean,
        BinaryGlitch | DigitalRain | AcidSweep | IndustrialStrobe | SeismicSnap | GatlingRaid
        | CoreMeltdown | StrobeStorm => TextureCompatibility::Dirty,
        _ => TextureCompatibility::Universal,
    }
}

/// Curation rule that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureRule {
    /// Harsh or noisy audio
    Grime,
    /// Very clear audio
    Crystal,
    /// Warm audio
    Warmth,
}

/// Verdict for one effect under the current texture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureVerdict {
    /// Effect may fire
    pub allowed: bool,
    /// Probability adjustment (-1.0 is a hard block)
    pub probability_mod: f32,
    /// Rule that produced the verdict
    pub rule: Option<TextureRule>,
}

impl TextureVerdict {
    const NEUTRAL: TextureVerdict = TextureVerdict {
        allowed: true,
        probability_mod: 0.0,
        rule: None,
    };

    fn ruled(rule: TextureRule, probability_mod: f32) -> Self {
        Self {
            allowed: probability_mod > -1.0,
            probability_mod,
            rule: Some(rule),
        }
    }
}

/// Apply the first matching curation rule.
pub fn curate(effect: EffectKind, spectral: &SpectralContext) -> TextureVerdict {
    let compat = compatibility(effect);
    if compat == TextureCompatibility::Universal {
        return TextureVerdict::NEUTRAL;
    }
    let dirty = compat == TextureCompatibility::Dirty;

    if matches!(spectral.texture, Texture::Harsh | Texture::Noisy) {
        return TextureVerdict::ruled(TextureRule::Grime, if dirty { 0.30 } else { -1.0 });
    }
    if spectral.clarity > CRYSTAL_CLARITY {
        return TextureVerdict::ruled(TextureRule::Crystal, if dirty { -1.0 } else { 0.25 });
    }
    if spectral.texture == Texture::Warm {
        return TextureVerdict::ruled(TextureRule::Warmth, if dirty { -0.15 } else { 0.20 });
    }
    TextureVerdict::NEUTRAL
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectral(texture: Texture, clarity: f32) -> SpectralContext {
        SpectralContext {
            clarity,
            harshness: 0.5,
            flatness: 0.2,
            centroid: 1500.0,
            texture,
        }
    }

    #[test]
    fn test_clean_effect_blocked_by_grime() {
        let verdict = curate(EffectKind::FiberOptics, &spectral(Texture::Harsh, 0.5));
        assert!(!verdict.allowed);
        assert_eq!(verdict.probability_mod, -1.0);
        assert_eq!(verdict.rule, Some(TextureRule::Grime));
    }

    #[test]
    fn test_clean_effect_boosted_by_warmth() {
        let verdict = curate(EffectKind::FiberOptics, &spectral(Texture::Warm, 0.5));
        assert!(verdict.allowed);
        assert!((verdict.probability_mod - 0.20).abs() < 1e-6);
    }

    #[test]
    fn test_crystal_bans_dirty() {
        let verdict = curate(EffectKind::BinaryGlitch, &spectral(Texture::Clean, 0.9));
        assert!(!verdict.allowed);
        let boosted = curate(EffectKind::SonarPing, &spectral(Texture::Clean, 0.9));
        assert!(boosted.allowed);
        assert!((boosted.probability_mod - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_grime_wins_over_crystal() {
        let verdict = curate(EffectKind::GatlingRaid, &spectral(Texture::Noisy, 0.95));
        assert!(verdict.allowed);
        assert_eq!(verdict.rule, Some(TextureRule::Grime));
    }

    #[test]
    fn test_universal_never_blocked() {
        for texture in [Texture::Clean, Texture::Warm, Texture::Harsh, Texture::Noisy] {
            let verdict = curate(EffectKind::SolarFlare, &spectral(texture, 0.95));
            assert_eq!(verdict, TextureVerdict::NEUTRAL);
        }
    }
}
