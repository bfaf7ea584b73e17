//! Energy-zone tracker.
//!
//! Zones rise fast and fall slow: leaving a low zone uses the raw energy so a
//! drop is caught on its first frame, entering a low zone uses the asymmetric
//! smoothed energy so a short gap does not read as silence.

use crate::types::Zone;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Upper bounds of each zone (a value below `silence` is silence, ...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneThresholds {
    /// Below this is silence
    pub silence: f32,
    /// Below this is valley
    pub valley: f32,
    /// Below this is ambient
    pub ambient: f32,
    /// Below this is gentle
    pub gentle: f32,
    /// Below this is active
    pub active: f32,
    /// Below this is intense; at or above is peak
    pub intense: f32,
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        // Calibrated for an AGC whose noise floor sits around 0.40
        Self {
            silence: 0.35,
            valley: 0.55,
            ambient: 0.70,
            gentle: 0.80,
            active: 0.90,
            intense: 0.95,
        }
    }
}

/// Configuration for [`EnergyZoneTracker`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyZoneConfig {
    /// Zone boundaries
    pub thresholds: ZoneThresholds,
    /// EMA factor when energy falls (slow)
    pub smoothing_down: f32,
    /// EMA factor when energy rises (fast)
    pub smoothing_up: f32,
    /// Time below `sustained_low_energy` before "sustained low"
    pub sustained_low_ms: u64,
    /// Time window for "sustained high"
    pub sustained_high_ms: u64,
    /// Energy considered low
    pub sustained_low_energy: f32,
    /// Energy considered high
    pub sustained_high_energy: f32,
    /// Percentile history length
    pub history_size: usize,
    /// Trend window length
    pub trend_window: usize,
    /// Max time since a low→high zone change to call it a flashbang
    pub flashbang_window_ms: u64,
}

impl Default for EnergyZoneConfig {
    fn default() -> Self {
        Self {
            thresholds: ZoneThresholds::default(),
            smoothing_down: 0.92,
            smoothing_up: 0.3,
            sustained_low_ms: 5000,
            sustained_high_ms: 3000,
            sustained_low_energy: 0.4,
            sustained_high_energy: 0.7,
            history_size: 300,
            trend_window: 10,
            flashbang_window_ms: 100,
        }
    }
}

/// Energy-zone classifier output for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyContext {
    /// Raw energy
    pub absolute: f32,
    /// Asymmetric EMA
    pub smoothed: f32,
    /// Percentile of the raw energy in the recent history (0..100)
    pub percentile: u8,
    /// Current zone
    pub zone: Zone,
    /// Zone before the last change
    pub previous_zone: Zone,
    /// When the zone last changed
    pub last_zone_change_ms: u64,
    /// -1..1, positive is rising
    pub trend: f32,
    /// Quiet for a while
    pub sustained_low: bool,
    /// Loud recently
    pub sustained_high: bool,
    /// Instant jump from a low zone into intense/peak
    pub is_flashbang: bool,
}

impl Default for EnergyContext {
    fn default() -> Self {
        Self {
            absolute: 0.0,
            smoothed: 0.0,
            percentile: 50,
            zone: Zone::Silence,
            previous_zone: Zone::Silence,
            last_zone_change_ms: 0,
            trend: 0.0,
            sustained_low: false,
            sustained_high: false,
            is_flashbang: false,
        }
    }
}

/// Stateful energy-zone tracker.
#[derive(Debug, Clone)]
pub struct EnergyZoneTracker {
    config: EnergyZoneConfig,
    smoothed: f32,
    zone: Zone,
    previous_zone: Zone,
    last_zone_change_ms: u64,
    history: VecDeque<f32>,
    trend_window: VecDeque<f32>,
    last_high_ms: Option<u64>,
    low_since_ms: Option<u64>,
}

impl Default for EnergyZoneTracker {
    fn default() -> Self {
        Self::new(EnergyZoneConfig::default())
    }
}

impl EnergyZoneTracker {
    /// Create a tracker
    pub fn new(config: EnergyZoneConfig) -> Self {
        Self {
            config,
            smoothed: 0.0,
            zone: Zone::Silence,
            previous_zone: Zone::Silence,
            last_zone_change_ms: 0,
            history: VecDeque::new(),
            trend_window: VecDeque::new(),
            last_high_ms: None,
            low_since_ms: None,
        }
    }

    /// Classify one frame of raw energy at `now_ms`.
    pub fn process(&mut self, raw: f32, now_ms: u64) -> EnergyContext {
        let factor = if raw > self.smoothed {
            self.config.smoothing_up
        } else {
            self.config.smoothing_down
        };
        self.smoothed = self.smoothed * factor + raw * (1.0 - factor);

        let next = self.determine_zone(raw, self.smoothed);
        if next != self.zone {
            self.previous_zone = self.zone;
            self.zone = next;
            self.last_zone_change_ms = now_ms;
        }

        self.history.push_back(raw);
        while self.history.len() > self.config.history_size {
            self.history.pop_front();
        }
        let percentile = self.percentile(raw);
        let trend = self.trend(raw);
        let (sustained_low, sustained_high) = self.sustained(raw, now_ms);

        let is_flashbang = self.previous_zone.is_low()
            && self.zone.is_high()
            && now_ms.saturating_sub(self.last_zone_change_ms) < self.config.flashbang_window_ms;

        EnergyContext {
            absolute: raw,
            smoothed: self.smoothed,
            percentile,
            zone: self.zone,
            previous_zone: self.previous_zone,
            last_zone_change_ms: self.last_zone_change_ms,
            trend,
            sustained_low,
            sustained_high,
            is_flashbang,
        }
    }

    /// Current zone
    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Back to silence with empty history
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    fn determine_zone(&self, raw: f32, smoothed: f32) -> Zone {
        let t = &self.config.thresholds;
        if self.zone.is_low() {
            if raw >= t.intense {
                return Zone::Peak;
            }
            if raw >= t.active {
                return Zone::Active;
            }
            if raw >= t.gentle {
                return Zone::Gentle;
            }
            if raw >= t.ambient {
                return Zone::Ambient;
            }
            if raw >= t.valley {
                return Zone::Valley;
            }
            if smoothed < t.silence {
                return Zone::Silence;
            }
            if smoothed < t.valley {
                return Zone::Valley;
            }
            return self.zone;
        }

        if smoothed >= t.intense {
            Zone::Peak
        } else if smoothed >= t.active {
            Zone::Intense
        } else if smoothed >= t.gentle {
            Zone::Active
        } else if smoothed >= t.ambient {
            Zone::Gentle
        } else if smoothed >= t.valley {
            Zone::Ambient
        } else if smoothed >= t.silence {
            Zone::Valley
        } else {
            Zone::Silence
        }
    }

    fn percentile(&self, energy: f32) -> u8 {
        if self.history.len() < 10 {
            return 50;
        }
        let lower = self.history.iter().filter(|e| **e < energy).count();
        ((lower as f32 / self.history.len() as f32) * 100.0).round() as u8
    }

    fn trend(&mut self, energy: f32) -> f32 {
        self.trend_window.push_back(energy);
        while self.trend_window.len() > self.config.trend_window {
            self.trend_window.pop_front();
        }
        let n = self.trend_window.len();
        if n < 3 {
            return 0.0;
        }
        let half = n / 2;
        let first = self.trend_window.iter().take(half).sum::<f32>() / half as f32;
        let second = self.trend_window.iter().skip(half).sum::<f32>() / (n - half) as f32;
        ((second - first) * 5.0).clamp(-1.0, 1.0)
    }

    fn sustained(&mut self, energy: f32, now_ms: u64) -> (bool, bool) {
        if energy >= self.config.sustained_high_energy {
            self.last_high_ms = Some(now_ms);
        }
        let is_low = energy < self.config.sustained_low_energy;
        if is_low {
            self.low_since_ms.get_or_insert(now_ms);
        } else {
            self.low_since_ms = None;
        }

        let sustained_low = is_low
            && self
                .low_since_ms
                .is_some_and(|since| now_ms - since >= self.config.sustained_low_ms);
        let sustained_high = energy >= self.config.sustained_high_energy
            && self
                .last_high_ms
                .is_some_and(|t| now_ms - t < self.config.sustained_high_ms);
        (sustained_low, sustained_high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_in_silence() {
        let mut tracker = EnergyZoneTracker::default();
        let ctx = tracker.process(0.1, 0);
        assert_eq!(ctx.zone, Zone::Silence);
        assert_eq!(ctx.percentile, 50);
    }

    #[test]
    fn test_rises_instantly_from_low_zone() {
        let mut tracker = EnergyZoneTracker::default();
        tracker.process(0.1, 0);
        let ctx = tracker.process(0.92, 33);
        assert_eq!(ctx.zone, Zone::Active);
        assert_eq!(ctx.previous_zone, Zone::Silence);
        assert_eq!(ctx.last_zone_change_ms, 33);
    }

    #[test]
    fn test_falls_slowly_from_high_zone() {
        let mut tracker = EnergyZoneTracker::default();
        for i in 0..60 {
            tracker.process(0.97, i * 16);
        }
        assert_eq!(tracker.zone(), Zone::Peak);
        // One quiet frame is not enough to leave the upper zones
        let ctx = tracker.process(0.1, 1000);
        assert!(ctx.zone >= Zone::Active);
    }

    #[test]
    fn test_flashbang_detection() {
        let mut tracker = EnergyZoneTracker::default();
        for i in 0..5 {
            tracker.process(0.1, i * 16);
        }
        let ctx = tracker.process(1.0, 96);
        assert_eq!(ctx.zone, Zone::Peak);
        assert!(ctx.is_flashbang);

        // A climb through the middle zones is not a flashbang
        let mut tracker = EnergyZoneTracker::default();
        tracker.process(0.1, 0);
        let ctx = tracker.process(0.92, 16);
        assert_eq!(ctx.zone, Zone::Active);
        let ctx = tracker.process(0.92, 32);
        assert!(!ctx.is_flashbang);
    }

    #[test]
    fn test_sustained_low() {
        let mut tracker = EnergyZoneTracker::default();
        let mut ctx = tracker.process(0.1, 0);
        assert!(!ctx.sustained_low);
        for t in (100..=6000).step_by(100) {
            ctx = tracker.process(0.1, t);
        }
        assert!(ctx.sustained_low);
    }

    #[test]
    fn test_trend_sign() {
        let mut tracker = EnergyZoneTracker::default();
        let mut ctx = tracker.process(0.1, 0);
        for i in 1..10 {
            ctx = tracker.process(0.1 + i as f32 * 0.05, i * 16);
        }
        assert!(ctx.trend > 0.0);
    }
}
