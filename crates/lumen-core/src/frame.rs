//! Per-frame input snapshot and the read-only contexts derived from it.

use crate::types::{SectionType, Texture, Vibe};
use serde::{Deserialize, Serialize};

/// One colour in HSL space (`h` in degrees, `s`/`l` in 0..1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    /// Hue in degrees
    pub h: f32,
    /// Saturation
    pub s: f32,
    /// Lightness
    pub l: f32,
}

impl Hsl {
    /// Create a colour
    pub fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }
}

/// The palette currently on stage, as reported by the external colour engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Main colour
    pub primary: Option<Hsl>,
    /// Secondary colour
    pub secondary: Option<Hsl>,
    /// Ambient fill
    pub ambient: Option<Hsl>,
    /// Accent colour
    pub accent: Option<Hsl>,
    /// Contrast colour
    pub contrast: Option<Hsl>,
}

/// Stabilised audio-feature snapshot for one analysis frame.
///
/// All band/energy values are normalised to 0..1. `timestamp_ms` is the frame
/// clock used for every cooldown in the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFrame {
    /// Instantaneous energy used by the physics override
    pub energy: f32,
    /// Bass band
    pub bass: f32,
    /// Mid band
    pub mid: f32,
    /// High band
    pub high: f32,
    /// Spectral clarity
    pub clarity: f32,
    /// Spectral harshness
    pub harshness: f32,
    /// Spectral centroid in Hz
    pub spectral_centroid: f32,
    /// Spectral flatness
    pub spectral_flatness: f32,
    /// Upstream section label (normalised by the pattern sensor)
    pub section_type: String,
    /// Un-smoothed energy
    pub raw_energy: f32,
    /// Smoothed energy
    pub smoothed_energy: f32,
    /// Tempo
    pub bpm: f32,
    /// Position inside the current beat (0..1)
    pub beat_phase: f32,
    /// Syncopation estimate
    pub syncopation: f32,
    /// Kick transient detected this frame
    pub has_kick: bool,
    /// Upstream drop detector flag
    pub is_drop_active: bool,
    /// Active vibe, when the caller tracks it per frame
    pub vibe: Option<Vibe>,
    /// Palette currently on stage
    pub palette: Option<Palette>,
    /// Frame timestamp in milliseconds
    pub timestamp_ms: u64,
}

impl Default for AudioFrame {
    fn default() -> Self {
        Self {
            energy: 0.0,
            bass: 0.0,
            mid: 0.0,
            high: 0.0,
            clarity: 0.5,
            harshness: 0.0,
            spectral_centroid: 1000.0,
            spectral_flatness: 0.0,
            section_type: "verse".to_string(),
            raw_energy: 0.0,
            smoothed_energy: 0.0,
            bpm: 120.0,
            beat_phase: 0.0,
            syncopation: 0.0,
            has_kick: false,
            is_drop_active: false,
            vibe: None,
            palette: None,
            timestamp_ms: 0,
        }
    }
}

impl AudioFrame {
    /// Normalised section of this frame
    pub fn section(&self) -> SectionType {
        SectionType::normalize(&self.section_type)
    }
}

/// Texture descriptor handed to effect curation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralContext {
    /// Spectral clarity
    pub clarity: f32,
    /// Spectral harshness
    pub harshness: f32,
    /// Spectral flatness
    pub flatness: f32,
    /// Spectral centroid in Hz
    pub centroid: f32,
    /// Derived texture
    pub texture: Texture,
}

impl SpectralContext {
    /// Derive the texture from the raw spectral features.
    ///
    /// harsh+clear is `Harsh`, harsh+murky is `Noisy`, a low centroid is
    /// `Warm`, anything else is `Clean`.
    pub fn from_frame(frame: &AudioFrame) -> Self {
        let texture = if frame.harshness > 0.6 && frame.clarity > 0.7 {
            Texture::Harsh
        } else if frame.harshness > 0.6 && frame.clarity < 0.4 {
            Texture::Noisy
        } else if frame.spectral_centroid < 300.0 {
            Texture::Warm
        } else {
            Texture::Clean
        };

        Self {
            clarity: frame.clarity,
            harshness: frame.harshness,
            flatness: frame.spectral_flatness,
            centroid: frame.spectral_centroid,
            texture,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(harshness: f32, clarity: f32, centroid: f32) -> AudioFrame {
        AudioFrame {
            harshness,
            clarity,
            spectral_centroid: centroid,
            ..Default::default()
        }
    }

    #[test]
    fn test_texture_derivation() {
        assert_eq!(
            SpectralContext::from_frame(&frame_with(0.8, 0.8, 2000.0)).texture,
            Texture::Harsh
        );
        assert_eq!(
            SpectralContext::from_frame(&frame_with(0.8, 0.2, 2000.0)).texture,
            Texture::Noisy
        );
        assert_eq!(
            SpectralContext::from_frame(&frame_with(0.8, 0.5, 250.0)).texture,
            Texture::Warm
        );
        assert_eq!(
            SpectralContext::from_frame(&frame_with(0.1, 0.5, 2000.0)).texture,
            Texture::Clean
        );
    }

    #[test]
    fn test_frame_deserializes_with_defaults() {
        let frame: AudioFrame =
            serde_json::from_str(r#"{"energy":0.4,"section_type":"build","timestamp_ms":33}"#)
                .unwrap();
        assert_eq!(frame.section(), SectionType::Buildup);
        assert_eq!(frame.bpm, 120.0);
        assert!(frame.palette.is_none());
    }
}
