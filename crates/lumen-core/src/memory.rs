//! Contextual memory: rolling statistics and z-scores for energy, bass and harshness.
//!
//! Z-scores are what make "loud" relative. A song that has been quiet for thirty
//! seconds gets a large energy z-score from a moderate hit, while a song that
//! has been pounding the whole time does not.

use crate::types::SectionType;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Configuration for [`ContextualMemory`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Rolling window length in frames
    pub buffer_size: usize,
    /// Frames required before z-scores are reported
    pub min_samples: usize,
    /// |z| above this is notable
    pub z_notable: f32,
    /// |z| above this is significant
    pub z_significant: f32,
    /// |z| above this is an anomaly
    pub z_epic: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1800,
            min_samples: 10,
            z_notable: 1.5,
            z_significant: 2.0,
            z_epic: 2.5,
        }
    }
}

/// Mean / deviation / z-score of one metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    /// Window mean
    pub mean: f32,
    /// Window standard deviation
    pub std_dev: f32,
    /// Z-score of the latest sample
    pub z_score: f32,
    /// Samples in the window
    pub samples: usize,
}

/// Fixed-size rolling window with running sums.
#[derive(Debug, Clone)]
pub struct RollingStats {
    window: VecDeque<f64>,
    capacity: usize,
    sum: f64,
    sum_sq: f64,
}

impl RollingStats {
    /// Create a window holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity.min(4096)),
            capacity: capacity.max(1),
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    /// Push a sample and return the statistics including it.
    pub fn push(&mut self, value: f32, min_samples: usize) -> MetricStats {
        let v = f64::from(value);
        self.window.push_back(v);
        self.sum += v;
        self.sum_sq += v * v;
        if self.window.len() > self.capacity {
            if let Some(old) = self.window.pop_front() {
                self.sum -= old;
                self.sum_sq -= old * old;
            }
        }
        self.stats_for(value, min_samples)
    }

    fn stats_for(&self, value: f32, min_samples: usize) -> MetricStats {
        let n = self.window.len();
        if n == 0 {
            return MetricStats::default();
        }
        let mean = self.sum / n as f64;
        let variance = (self.sum_sq / n as f64 - mean * mean).max(0.0);
        let std_dev = variance.sqrt();
        let z_score = if n < min_samples || std_dev < 1e-4 {
            0.0
        } else {
            (f64::from(value) - mean) / std_dev
        };
        MetricStats {
            mean: mean as f32,
            std_dev: std_dev as f32,
            z_score: z_score as f32,
            samples: n,
        }
    }

    /// Drop every sample
    pub fn clear(&mut self) {
        self.window.clear();
        self.sum = 0.0;
        self.sum_sq = 0.0;
    }
}

/// Which metric triggered an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyMetric {
    /// Overall energy
    Energy,
    /// Bass band
    Bass,
    /// Harshness
    Harshness,
}

impl fmt::Display for AnomalyMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnomalyMetric::Energy => "energy",
            AnomalyMetric::Bass => "bass",
            AnomalyMetric::Harshness => "harshness",
        })
    }
}

/// Anomaly classification of the latest frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// |z| crossed the epic threshold
    pub is_anomaly: bool,
    /// Metric with the largest |z|
    pub metric: AnomalyMetric,
    /// Signed z of that metric
    pub z_score: f32,
    /// Human-readable reason
    pub reason: String,
}

/// Input for one memory update
#[derive(Debug, Clone, Copy)]
pub struct MemoryInput {
    /// Energy (0..1)
    pub energy: f32,
    /// Bass (0..1)
    pub bass: f32,
    /// Harshness (0..1)
    pub harshness: f32,
    /// Current section
    pub section: SectionType,
}

/// Output of one memory update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryOutput {
    /// Energy statistics
    pub energy: MetricStats,
    /// Bass statistics
    pub bass: MetricStats,
    /// Harshness statistics
    pub harshness: MetricStats,
    /// Anomaly classification
    pub anomaly: Anomaly,
}

/// Rolling per-session statistics.
#[derive(Debug, Clone)]
pub struct ContextualMemory {
    config: MemoryConfig,
    energy: RollingStats,
    bass: RollingStats,
    harshness: RollingStats,
    last_energy_z: f32,
}

impl Default for ContextualMemory {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl ContextualMemory {
    /// Create memory with the given configuration
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            energy: RollingStats::new(config.buffer_size),
            bass: RollingStats::new(config.buffer_size),
            harshness: RollingStats::new(config.buffer_size),
            config,
            last_energy_z: 0.0,
        }
    }

    /// Feed one frame and classify it.
    pub fn update(&mut self, input: MemoryInput) -> MemoryOutput {
        let min = self.config.min_samples;
        let energy = self.energy.push(input.energy, min);
        let bass = self.bass.push(input.bass, min);
        let harshness = self.harshness.push(input.harshness, min);
        self.last_energy_z = energy.z_score;

        let anomaly = self.classify(&energy, &bass, &harshness, input.section);
        MemoryOutput {
            energy,
            bass,
            harshness,
            anomaly,
        }
    }

    /// Energy z-score of the last update
    pub fn energy_z_score(&self) -> f32 {
        self.last_energy_z
    }

    /// Forget everything
    pub fn reset(&mut self) {
        self.energy.clear();
        self.bass.clear();
        self.harshness.clear();
        self.last_energy_z = 0.0;
    }

    fn classify(
        &self,
        energy: &MetricStats,
        bass: &MetricStats,
        harshness: &MetricStats,
        section: SectionType,
    ) -> Anomaly {
        let candidates = [
            (AnomalyMetric::Energy, energy.z_score),
            (AnomalyMetric::Bass, bass.z_score),
            (AnomalyMetric::Harshness, harshness.z_score),
        ];
        let (metric, z) = candidates
            .into_iter()
            .fold((AnomalyMetric::Energy, 0.0f32), |best, c| {
                if c.1.abs() > best.1.abs() {
                    c
                } else {
                    best
                }
            });
        let abs = z.abs();

        let reason = if abs >= self.config.z_epic {
            if section == SectionType::Drop && z > 0.0 {
                format!("EPIC: {} Z={:.1} in drop", metric, z)
            } else if z > 0.0 {
                format!("Anomaly: {} Z={:.1}", metric, z)
            } else {
                format!("Valley detected: {} Z={:.1}", metric, z)
            }
        } else if abs >= self.config.z_significant {
            format!("Building: {} Z={:.1}", metric, z)
        } else if abs >= self.config.z_notable {
            format!("Notable: {} Z={:.1}", metric, z)
        } else {
            "Normal".to_string()
        };

        Anomaly {
            is_anomaly: abs >= self.config.z_epic,
            metric,
            z_score: z,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(energy: f32) -> MemoryInput {
        MemoryInput {
            energy,
            bass: 0.3,
            harshness: 0.2,
            section: SectionType::Verse,
        }
    }

    #[test]
    fn test_z_score_is_zero_during_warmup() {
        let mut memory = ContextualMemory::default();
        for i in 0..5 {
            let out = memory.update(input(0.1 * i as f32));
            assert_eq!(out.energy.z_score, 0.0);
        }
    }

    #[test]
    fn test_flat_signal_has_zero_z() {
        let mut memory = ContextualMemory::default();
        for _ in 0..50 {
            memory.update(input(0.4));
        }
        assert_eq!(memory.energy_z_score(), 0.0);
    }

    #[test]
    fn test_spike_after_quiet_passage_is_epic() {
        let mut memory = ContextualMemory::default();
        for i in 0..200 {
            // Small wobble so the deviation is non-zero
            let wobble = if i % 2 == 0 { 0.02 } else { -0.02 };
            memory.update(input(0.2 + wobble));
        }
        let out = memory.update(MemoryInput {
            section: SectionType::Drop,
            ..input(0.9)
        });
        assert!(out.energy.z_score > 3.0);
        assert!(out.anomaly.is_anomaly);
        assert_eq!(out.anomaly.metric, AnomalyMetric::Energy);
        assert!(out.anomaly.reason.starts_with("EPIC"));
    }

    #[test]
    fn test_window_is_bounded() {
        let mut stats = RollingStats::new(4);
        for v in [1.0, 1.0, 1.0, 1.0, 5.0, 5.0, 5.0, 5.0] {
            stats.push(v, 1);
        }
        let out = stats.push(5.0, 1);
        assert_eq!(out.samples, 4);
        assert!((out.mean - 5.0).abs() < 1e-6);
    }
}
