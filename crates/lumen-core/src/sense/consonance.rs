//! Consonance sensor: how smoothly the current frame follows the previous one.

use super::beauty::hue_distance;
use super::pattern::MusicalPattern;
use crate::frame::Palette;
use crate::types::{clamp01, SectionType};
use serde::{Deserialize, Serialize};

/// Hue interval → consonance table
const HUE_CONSONANCE: [(f32, f32, &str); 7] = [
    (0.0, 1.0, "unison"),
    (30.0, 0.85, "analogous"),
    (60.0, 0.75, "split-triadic"),
    (90.0, 0.55, "square-partial"),
    (120.0, 0.70, "triadic"),
    (150.0, 0.60, "split-complementary"),
    (180.0, 0.50, "complementary"),
];

/// How abrupt a change should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    /// Consonance >= 0.7
    #[default]
    Smooth,
    /// Consonance >= 0.4
    Moderate,
    /// Anything lower
    Abrupt,
}

/// Harmonic smoothness between two consecutive frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsonanceAnalysis {
    /// Weighted total in 0..1
    pub total_consonance: f32,
    /// Primary hue interval consonance
    pub chromatic_consonance: f32,
    /// BPM, intensity, section and direction continuity
    pub rhythmic_consonance: f32,
    /// Tension, phase, density and drop continuity
    pub emotional_consonance: f32,
    /// Closest named hue interval
    pub dominant_interval: &'static str,
    /// Transition category
    pub transition_type: TransitionType,
    /// Suggested crossfade length
    pub suggested_transition_ms: u32,
    /// Frame timestamp
    pub timestamp_ms: u64,
}

impl ConsonanceAnalysis {
    /// Cold-start value used before the sensor has produced anything
    pub fn neutral(timestamp_ms: u64) -> Self {
        Self {
            total_consonance: 0.7,
            chromatic_consonance: 0.7,
            rhythmic_consonance: 0.7,
            emotional_consonance: 0.7,
            dominant_interval: "unison",
            transition_type: TransitionType::Smooth,
            suggested_transition_ms: 500,
            timestamp_ms,
        }
    }

    fn unison(timestamp_ms: u64) -> Self {
        Self {
            total_consonance: 1.0,
            chromatic_consonance: 1.0,
            rhythmic_consonance: 1.0,
            emotional_consonance: 1.0,
            ..Self::neutral(timestamp_ms)
        }
    }
}

/// Stateful consonance sensor; compares each frame with the one before.
#[derive(Debug, Default)]
pub struct ConsonanceSensor {
    previous: Option<(Palette, MusicalPattern)>,
}

impl ConsonanceSensor {
    /// Create a new sensor
    pub fn new() -> Self {
        Self::default()
    }

    /// Score the step from the previous frame to this one.
    pub fn sense(&mut self, palette: &Palette, pattern: &MusicalPattern) -> ConsonanceAnalysis {
        let ts = pattern.timestamp_ms;
        let previous = self.previous.replace((palette.clone(), pattern.clone()));
        let Some((prev_palette, prev_pattern)) = previous else {
            return ConsonanceAnalysis::unison(ts);
        };

        let (chromatic, interval) = chromatic_consonance(&prev_palette, palette);
        let rhythmic = rhythmic_consonance(&prev_pattern, pattern);
        let emotional = emotional_consonance(&prev_pattern, pattern);
        let total = clamp01(chromatic * 0.30 + rhythmic * 0.35 + emotional * 0.35);

        ConsonanceAnalysis {
            total_consonance: total,
            chromatic_consonance: chromatic,
            rhythmic_consonance: rhythmic,
            emotional_consonance: emotional,
            dominant_interval: interval,
            transition_type: categorize(total),
            suggested_transition_ms: transition_speed(total, pattern),
            timestamp_ms: ts,
        }
    }

    /// Forget the previous frame
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

/// Consonance of moving from `current_hue` to `proposed_hue`.
pub fn evaluate_hue_change(current_hue: f32, proposed_hue: f32) -> f32 {
    let (consonance, delta, _) = nearest_interval(hue_distance(current_hue, proposed_hue));
    consonance * (-delta / 15.0).exp()
}

fn nearest_interval(distance: f32) -> (f32, f32, &'static str) {
    let mut best = HUE_CONSONANCE[0];
    let mut best_delta = 180.0;
    for entry in HUE_CONSONANCE {
        let delta = (distance - entry.0).abs();
        if delta < best_delta {
            best_delta = delta;
            best = entry;
        }
    }
    (best.1, best_delta, best.2)
}

fn chromatic_consonance(prev: &Palette, curr: &Palette) -> (f32, &'static str) {
    let prev_hue = prev.primary.map(|c| c.h).unwrap_or(0.0);
    let curr_hue = curr.primary.map(|c| c.h).unwrap_or(0.0);
    let (consonance, delta, name) = nearest_interval(hue_distance(prev_hue, curr_hue));
    let proximity = (-delta / 20.0).exp();
    ((consonance * (0.7 + 0.3 * proximity)).min(1.0), name)
}

fn rhythmic_consonance(prev: &MusicalPattern, curr: &MusicalPattern) -> f32 {
    let bpm = (-(prev.bpm - curr.bpm).abs() / 20.0).exp();
    let intensity = 1.0 - (prev.rhythmic_intensity - curr.rhythmic_intensity).abs();
    let section = if prev.section == curr.section { 1.0 } else { 0.6 };

    let reversed = (prev.is_building && curr.is_releasing) || (prev.is_releasing && curr.is_building);
    let direction = if reversed {
        0.5
    } else if prev.is_building == curr.is_building || prev.is_releasing == curr.is_releasing {
        1.0
    } else {
        0.7
    };

    bpm * 0.2 + intensity * 0.3 + section * 0.25 + direction * 0.25
}

fn emotional_consonance(prev: &MusicalPattern, curr: &MusicalPattern) -> f32 {
    let tension = 1.0 - (prev.emotional_tension - curr.emotional_tension).abs();
    let phase = if prev.energy_phase == curr.energy_phase { 1.0 } else { 0.6 };
    let density = 1.0 - (prev.harmonic_density - curr.harmonic_density).abs();
    let drop = if prev.is_drop_active != curr.is_drop_active { 0.4 } else { 1.0 };
    tension * 0.35 + phase * 0.25 + density * 0.20 + drop * 0.20
}

fn categorize(consonance: f32) -> TransitionType {
    if consonance >= 0.7 {
        TransitionType::Smooth
    } else if consonance >= 0.4 {
        TransitionType::Moderate
    } else {
        TransitionType::Abrupt
    }
}

fn transition_speed(consonance: f32, pattern: &MusicalPattern) -> u32 {
    let mut base: f32 = if consonance >= 0.8 {
        800.0
    } else if consonance >= 0.6 {
        500.0
    } else if consonance >= 0.4 {
        300.0
    } else {
        150.0
    };

    if pattern.is_drop_active {
        base = base.min(100.0);
    } else {
        match pattern.section {
            SectionType::Drop | SectionType::Chorus => base = base.min(250.0),
            SectionType::Verse | SectionType::Breakdown => base = base.max(600.0),
            _ => {}
        }
    }

    let bpm_factor = if pattern.bpm > 140.0 {
        0.8
    } else if pattern.bpm < 100.0 {
        1.2
    } else {
        1.0
    };
    (base * bpm_factor).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{AudioFrame, Hsl};
    use crate::sense::PatternSensor;
    use crate::types::Vibe;

    fn pattern_for(section: &str, bpm: f32) -> MusicalPattern {
        let frame = AudioFrame {
            section_type: section.to_string(),
            bpm,
            smoothed_energy: 0.5,
            ..Default::default()
        };
        PatternSensor::new().sense(&frame, Vibe::TechnoClub)
    }

    fn palette(hue: f32) -> Palette {
        Palette {
            primary: Some(Hsl::new(hue, 0.8, 0.5)),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_frame_is_unison() {
        let mut sensor = ConsonanceSensor::new();
        let a = sensor.sense(&palette(10.0), &pattern_for("verse", 128.0));
        assert_eq!(a.total_consonance, 1.0);
        assert_eq!(a.dominant_interval, "unison");
    }

    #[test]
    fn test_identical_frames_are_smooth() {
        let mut sensor = ConsonanceSensor::new();
        let p = pattern_for("verse", 128.0);
        sensor.sense(&palette(10.0), &p);
        let a = sensor.sense(&palette(10.0), &p);
        assert!(a.total_consonance > 0.95);
        assert_eq!(a.transition_type, TransitionType::Smooth);
        // Verse keeps transitions slow
        assert!(a.suggested_transition_ms >= 600);
    }

    #[test]
    fn test_complementary_jump_and_section_change_lower_consonance() {
        let mut sensor = ConsonanceSensor::new();
        sensor.sense(&palette(0.0), &pattern_for("verse", 128.0));
        let a = sensor.sense(&palette(180.0), &pattern_for("drop", 170.0));
        assert_eq!(a.dominant_interval, "complementary");
        assert!(a.total_consonance < 0.8);
        assert!(a.suggested_transition_ms <= 250);
    }

    #[test]
    fn test_evaluate_hue_change() {
        assert!((evaluate_hue_change(0.0, 0.0) - 1.0).abs() < 1e-6);
        assert!(evaluate_hue_change(0.0, 120.0) > evaluate_hue_change(0.0, 100.0));
    }
}
