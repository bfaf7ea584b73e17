//! Beauty sensor: golden-ratio and colour-harmony scoring of the current look.

use super::pattern::MusicalPattern;
use crate::frame::{Hsl, Palette};
use crate::types::{clamp01, Trend};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const PHI: f32 = 1.618_034;
const PHI_INVERSE: f32 = 0.618_034;
const FIBONACCI: [f32; 10] = [1.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0, 55.0];
const HARMONIC_ANGLES: [f32; 6] = [0.0, 30.0, 60.0, 120.0, 150.0, 180.0];
const MAX_HISTORY: usize = 30;

const W_PHI: f32 = 0.25;
const W_FIBONACCI: f32 = 0.20;
const W_CHROMATIC: f32 = 0.35;
const W_CONTRAST: f32 = 0.20;

/// Aesthetic score of the current palette against the music.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeautyAnalysis {
    /// Weighted total in 0..1
    pub total_beauty: f32,
    /// Golden-ratio alignment of rhythm/tension, bands and saturations
    pub phi_alignment: f32,
    /// Fibonacci-ness of the hue gaps
    pub fibonacci_distribution: f32,
    /// Pairwise hue harmony
    pub chromatic_harmony: f32,
    /// Contrast versus what the music asks for
    pub contrast_balance: f32,
    /// Direction against the last three analyses
    pub trend: Trend,
    /// Frame timestamp
    pub timestamp_ms: u64,
}

impl BeautyAnalysis {
    /// Cold-start value used before the sensor has produced anything
    pub fn neutral(timestamp_ms: u64) -> Self {
        Self {
            total_beauty: 0.5,
            phi_alignment: 0.5,
            fibonacci_distribution: 0.5,
            chromatic_harmony: 0.5,
            contrast_balance: 0.5,
            trend: Trend::Stable,
            timestamp_ms,
        }
    }
}

/// Stateful beauty sensor.
#[derive(Debug, Default)]
pub struct BeautySensor {
    history: VecDeque<f32>,
}

impl BeautySensor {
    /// Create a new sensor
    pub fn new() -> Self {
        Self::default()
    }

    /// Score `palette` against `pattern`.
    pub fn sense(&mut self, palette: &Palette, pattern: &MusicalPattern) -> BeautyAnalysis {
        let phi_alignment = phi_alignment(palette, pattern);
        let fibonacci_distribution = fibonacci_distribution(palette);
        let chromatic_harmony = chromatic_harmony(palette);
        let contrast_balance = contrast_balance(palette, pattern);

        let total_beauty = clamp01(
            phi_alignment * W_PHI
                + fibonacci_distribution * W_FIBONACCI
                + chromatic_harmony * W_CHROMATIC
                + contrast_balance * W_CONTRAST,
        );
        let trend = self.trend_for(total_beauty);

        self.history.push_back(total_beauty);
        while self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }

        BeautyAnalysis {
            total_beauty,
            phi_alignment,
            fibonacci_distribution,
            chromatic_harmony,
            contrast_balance,
            trend,
            timestamp_ms: pattern.timestamp_ms,
        }
    }

    /// Mean beauty over the history (0.5 when empty)
    pub fn average(&self) -> f32 {
        if self.history.is_empty() {
            return 0.5;
        }
        self.history.iter().sum::<f32>() / self.history.len() as f32
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.history.clear();
    }

    fn trend_for(&self, current: f32) -> Trend {
        if self.history.len() < 3 {
            return Trend::Stable;
        }
        let avg = self.history.iter().rev().take(3).sum::<f32>() / 3.0;
        let delta = current - avg;
        if delta > 0.03 {
            Trend::Rising
        } else if delta < -0.03 {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }
}

/// How well `proposed_hue` sits on a golden-angle offset from `existing`.
pub fn golden_distribution(proposed_hue: f32, existing: &[f32]) -> f32 {
    if existing.is_empty() {
        return 1.0;
    }
    const GOLDEN_OFFSET: f32 = 137.5;
    let mut best = 0.0f32;
    for &hue in existing {
        let distance = hue_distance(proposed_hue, hue);
        for i in 1..=3 {
            let target = (GOLDEN_OFFSET * i as f32) % 360.0;
            let mut deviation = (distance - target).abs();
            if deviation > 180.0 {
                deviation = 360.0 - deviation;
            }
            best = best.max((-deviation / 30.0).exp());
        }
    }
    best
}

pub(crate) fn hue_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).abs() % 360.0;
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

fn phi_alignment(palette: &Palette, pattern: &MusicalPattern) -> f32 {
    let mut score = 0.0;
    let mut checks = 0;

    let (r, t) = (pattern.rhythmic_intensity, pattern.emotional_tension);
    if r > 0.0 && t > 0.0 {
        let ratio = r.max(t) / r.min(t);
        score += (-(ratio - PHI).abs() * 2.0).exp();
        checks += 1;
    }

    let mut bands = [
        pattern.bass_presence,
        pattern.mid_presence,
        pattern.high_presence,
    ];
    bands.sort_by(f32::total_cmp);
    if bands[0] > 0.1 && bands[1] > 0.1 {
        let avg_ratio = (bands[2] / bands[1] + bands[1] / bands[0]) / 2.0;
        score += (-(avg_ratio - PHI).abs() * 1.5).exp();
        checks += 1;
    }

    if let (Some(main), Some(accent)) = (palette.primary, palette.accent) {
        let sat_diff = (main.s - accent.s).abs();
        score += (-(sat_diff - PHI_INVERSE).abs() * 3.0).exp();
        checks += 1;
    }

    if checks > 0 {
        score / checks as f32
    } else {
        0.5
    }
}

fn hues(colors: &[Option<Hsl>]) -> Vec<f32> {
    colors.iter().flatten().map(|c| c.h).collect()
}

fn fibonacci_distribution(palette: &Palette) -> f32 {
    let mut hues = hues(&[
        palette.primary,
        palette.secondary,
        palette.ambient,
        palette.accent,
        palette.contrast,
    ]);
    if hues.len() < 2 {
        return 0.5;
    }
    hues.sort_by(f32::total_cmp);

    let mut gaps: Vec<f32> = hues.windows(2).map(|w| w[1] - w[0]).collect();
    gaps.push(360.0 - hues[hues.len() - 1] + hues[0]);
    gaps.sort_by(f32::total_cmp);

    let mut fib_score = 0.0;
    for pair in gaps.windows(2) {
        if pair[0] <= f32::EPSILON {
            continue;
        }
        let ratio = pair[1] / pair[0];
        let best = (1..8)
            .map(|j| (-(ratio - FIBONACCI[j + 1] / FIBONACCI[j]).abs() * 0.5).exp())
            .fold(0.0f32, f32::max);
        fib_score += best;
    }
    fib_score / gaps.len() as f32
}

fn chromatic_harmony(palette: &Palette) -> f32 {
    let hues = hues(&[
        palette.primary,
        palette.secondary,
        palette.ambient,
        palette.accent,
    ]);
    if hues.len() < 2 {
        return 0.5;
    }

    let mut total = 0.0;
    let mut pairs = 0;
    for i in 0..hues.len() {
        for j in (i + 1)..hues.len() {
            let distance = hue_distance(hues[i], hues[j]);
            let best = HARMONIC_ANGLES
                .iter()
                .map(|target| (-(distance - target).abs() / 15.0).exp())
                .fold(0.0f32, f32::max);
            total += best;
            pairs += 1;
        }
    }
    total / pairs as f32
}

fn contrast_balance(palette: &Palette, pattern: &MusicalPattern) -> f32 {
    let target = pattern.rhythmic_intensity * 0.6 + pattern.emotional_tension * 0.4;
    let (Some(primary), Some(contrast)) = (palette.primary, palette.contrast) else {
        return 0.5;
    };
    let sat_contrast = (primary.s - contrast.s).abs();
    let hue_contrast = hue_distance(primary.h, contrast.h) / 180.0;
    let actual = sat_contrast * 0.5 + hue_contrast * 0.5;
    (-(actual - target).abs() * 3.0).exp()
}
