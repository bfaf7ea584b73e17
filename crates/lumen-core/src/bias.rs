//! Bias detector: the engine watching its own habits.
//!
//! Advisory only. Nothing here changes a decision; the report ends up in the
//! debug output so a human can see when the show gets repetitive.

use crate::constitution::ColorDecision;
use crate::sense::beauty::hue_distance;
use crate::types::ColorStrategy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

const MIN_SAMPLES: usize = 10;
const MIN_TEMPORAL_SAMPLES: usize = 20;
const TEMPORAL_LAGS: [usize; 3] = [4, 8, 16];
const TEMPORAL_THRESHOLD: f32 = 0.85;

/// Thresholds of the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasConfig {
    /// Decisions analysed
    pub window_size: usize,
    /// Share of one hue family above which it is a preference
    pub hue_preference_threshold: f32,
    /// Share of small hue steps above which it is risk aversion
    pub risk_aversion_threshold: f32,
    /// Share of one strategy above which it is a lock
    pub strategy_lock_threshold: f32,
    /// Lowest healthy share of frames with a change
    pub min_healthy_change_rate: f32,
    /// Highest healthy share of frames with a change
    pub max_healthy_change_rate: f32,
}

impl Default for BiasConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            hue_preference_threshold: 0.4,
            risk_aversion_threshold: 0.8,
            strategy_lock_threshold: 0.6,
            min_healthy_change_rate: 0.2,
            max_healthy_change_rate: 0.7,
        }
    }
}

/// Kind of habit detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasType {
    /// One hue family dominates
    HuePreference,
    /// Changes are periodic
    TemporalPattern,
    /// Hue steps are always small
    RiskAversion,
    /// One strategy dominates
    StrategyLock,
    /// Too few or too many changes
    ChangeFrequency,
}

impl fmt::Display for BiasType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BiasType::HuePreference => "hue_preference",
            BiasType::TemporalPattern => "temporal_pattern",
            BiasType::RiskAversion => "risk_aversion",
            BiasType::StrategyLock => "strategy_lock",
            BiasType::ChangeFrequency => "change_frequency",
        })
    }
}

/// Coarse severity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    /// Below 0.25
    Low,
    /// Below 0.5
    Medium,
    /// Below 0.8
    High,
    /// 0.8 and above
    Critical,
}

impl SeverityLevel {
    /// Bucket of a normalised severity
    pub fn from_severity(severity: f32) -> Self {
        if severity >= 0.8 {
            SeverityLevel::Critical
        } else if severity >= 0.5 {
            SeverityLevel::High
        } else if severity >= 0.25 {
            SeverityLevel::Medium
        } else {
            SeverityLevel::Low
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeverityLevel::Low => "low",
            SeverityLevel::Medium => "medium",
            SeverityLevel::High => "high",
            SeverityLevel::Critical => "critical",
        })
    }
}

/// Family of neighbouring hues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HueFamily {
    /// 330..360 and 0..30
    Reds,
    /// 30..60
    Oranges,
    /// 60..90
    Yellows,
    /// 90..150
    Greens,
    /// 150..190
    Cyans,
    /// 190..250
    Blues,
    /// 250..290
    Purples,
    /// 290..330
    Magentas,
}

impl HueFamily {
    /// Family of `hue` (degrees, any range)
    pub fn of(hue: f32) -> Self {
        let hue = hue.rem_euclid(360.0);
        match hue {
            h if h < 30.0 => HueFamily::Reds,
            h if h < 60.0 => HueFamily::Oranges,
            h if h < 90.0 => HueFamily::Yellows,
            h if h < 150.0 => HueFamily::Greens,
            h if h < 190.0 => HueFamily::Cyans,
            h if h < 250.0 => HueFamily::Blues,
            h if h < 290.0 => HueFamily::Purples,
            h if h < 330.0 => HueFamily::Magentas,
            _ => HueFamily::Reds,
        }
    }
}

/// One recorded decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Frame timestamp
    pub timestamp_ms: u64,
    /// Suggested hue
    pub hue: Option<f32>,
    /// Suggested strategy
    pub strategy: Option<ColorStrategy>,
    /// Output confidence
    pub confidence: f32,
    /// Colour decision changed anything
    pub had_change: bool,
}

impl DecisionRecord {
    /// Record for an emitted output
    pub fn from_output(color: Option<&ColorDecision>, confidence: f32, timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            hue: color.and_then(|c| c.suggested_hue),
            strategy: color.and_then(|c| c.suggested_strategy),
            confidence,
            had_change: color.is_some_and(|c| c.has_change()),
        }
    }
}

/// One detected habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedBias {
    /// Kind
    pub bias_type: BiasType,
    /// Normalised severity (0..1)
    pub severity: f32,
    /// Bucket
    pub severity_level: SeverityLevel,
    /// What is going on
    pub description: String,
    /// The numbers behind it
    pub evidence: String,
    /// What to do about it
    pub recommendation: String,
}

/// Full report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiasAnalysis {
    /// Detected biases
    pub biases: Vec<DetectedBias>,
    /// At least one critical bias
    pub has_critical_bias: bool,
    /// 1 - mean severity
    pub cognitive_health: f32,
    /// Decisions analysed
    pub sample_size: usize,
}

/// Counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BiasStats {
    /// Records currently held
    pub decisions_recorded: usize,
    /// Analyses run
    pub analyses: u64,
}

/// Rolling self-analysis over recent decisions.
#[derive(Debug, Default)]
pub struct BiasDetector {
    config: BiasConfig,
    history: VecDeque<DecisionRecord>,
    last_analysis: Option<BiasAnalysis>,
    analyses: u64,
}

impl BiasDetector {
    /// Create a detector
    pub fn new(config: BiasConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Record one decision. The buffer holds at most twice the window and is
    /// trimmed back to one window when it overflows.
    pub fn record(&mut self, record: DecisionRecord) {
        self.history.push_back(record);
        let window = self.config.window_size;
        if self.history.len() > window * 2 {
            let excess = self.history.len() - window;
            self.history.drain(..excess);
        }
    }

    /// Analyse the latest window; `None` below ten records.
    pub fn analyze(&mut self) -> Option<BiasAnalysis> {
        let n = self.history.len();
        let window: Vec<DecisionRecord> = self
            .history
            .iter()
            .skip(n.saturating_sub(self.config.window_size))
            .copied()
            .collect();
        if window.len() < MIN_SAMPLES {
            return None;
        }

        let cfg = &self.config;
        let biases: Vec<DetectedBias> = [
            hue_preference(&window, cfg),
            strategy_lock(&window, cfg),
            change_frequency(&window, cfg),
            risk_aversion(&window, cfg),
            temporal_pattern(&window),
        ]
        .into_iter()
        .flatten()
        .collect();

        let has_critical_bias = biases
            .iter()
            .any(|b| b.severity_level == SeverityLevel::Critical);
        let total: f32 = biases.iter().map(|b| b.severity).sum();
        let cognitive_health = (1.0 - total / biases.len().max(1) as f32).max(0.0);

        let analysis = BiasAnalysis {
            biases,
            has_critical_bias,
            cognitive_health,
            sample_size: window.len(),
        };
        self.last_analysis = Some(analysis.clone());
        self.analyses += 1;
        Some(analysis)
    }

    /// Whether the last analysis found a critical bias
    pub fn has_critical_bias(&self) -> bool {
        self.last_analysis
            .as_ref()
            .is_some_and(|a| a.has_critical_bias)
    }

    /// `type:level` strings of the last analysis
    pub fn bias_strings(&self) -> Vec<String> {
        self.last_analysis
            .as_ref()
            .map(|a| {
                a.biases
                    .iter()
                    .map(|b| format!("{}:{}", b.bias_type, b.severity_level))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Last analysis
    pub fn last_analysis(&self) -> Option<&BiasAnalysis> {
        self.last_analysis.as_ref()
    }

    /// Counters
    pub fn stats(&self) -> BiasStats {
        BiasStats {
            decisions_recorded: self.history.len(),
            analyses: self.analyses,
        }
    }

    /// Forget everything
    pub fn reset(&mut self) {
        self.history.clear();
        self.last_analysis = None;
        self.analyses = 0;
    }
}

fn severity_over(share: f32, threshold: f32) -> f32 {
    (share - threshold) / (1.0 - threshold)
}

fn bias(
    bias_type: BiasType,
    severity: f32,
    description: String,
    evidence: String,
    recommendation: &str,
) -> DetectedBias {
    DetectedBias {
        bias_type,
        severity,
        severity_level: SeverityLevel::from_severity(severity),
        description,
        evidence,
        recommendation: recommendation.to_string(),
    }
}

fn dominant<K>(items: impl Iterator<Item = K>) -> Option<(K, usize, usize)>
where
    K: Copy + Eq + std::hash::Hash,
{
    let mut counts: HashMap<K, usize> = HashMap::new();
    let mut total = 0;
    for item in items {
        *counts.entry(item).or_default() += 1;
        total += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(key, count)| (key, count, total))
}

fn hue_preference(window: &[DecisionRecord], cfg: &BiasConfig) -> Option<DetectedBias> {
    let (family, count, total) = dominant(window.iter().filter_map(|r| r.hue.map(HueFamily::of)))?;
    if total < MIN_SAMPLES {
        return None;
    }
    let share = count as f32 / total as f32;
    if share <= cfg.hue_preference_threshold {
        return None;
    }
    Some(bias(
        BiasType::HuePreference,
        severity_over(share, cfg.hue_preference_threshold),
        format!("Excessive preference for {:?}", family),
        format!("{:.0}% of hue decisions are {:?}", share * 100.0, family),
        "Explore hues outside the dominant family",
    ))
}

fn strategy_lock(window: &[DecisionRecord], cfg: &BiasConfig) -> Option<DetectedBias> {
    let (strategy, count, total) = dominant(window.iter().filter_map(|r| r.strategy))?;
    if total < MIN_SAMPLES {
        return None;
    }
    let share = count as f32 / total as f32;
    if share <= cfg.strategy_lock_threshold {
        return None;
    }
    Some(bias(
        BiasType::StrategyLock,
        severity_over(share, cfg.strategy_lock_threshold),
        format!("Locked on strategy {}", strategy),
        format!("{:.0}% of decisions use {}", share * 100.0, strategy),
        "Explore other strategies: triadic, complementary, split complementary",
    ))
}

fn change_frequency(window: &[DecisionRecord], cfg: &BiasConfig) -> Option<DetectedBias> {
    let changes = window.iter().filter(|r| r.had_change).count();
    let rate = changes as f32 / window.len() as f32;

    if rate < cfg.min_healthy_change_rate {
        let severity = (cfg.min_healthy_change_rate - rate) / cfg.min_healthy_change_rate;
        return Some(bias(
            BiasType::ChangeFrequency,
            severity,
            "Visual stagnation: too few changes".to_string(),
            format!(
                "Only {:.0}% of frames change (minimum {:.0}%)",
                rate * 100.0,
                cfg.min_healthy_change_rate * 100.0
            ),
            "Increase exploration with subtle changes",
        ));
    }
    if rate > cfg.max_healthy_change_rate {
        return Some(bias(
            BiasType::ChangeFrequency,
            severity_over(rate, cfg.max_healthy_change_rate),
            "Visual hyperactivity: too many changes".to_string(),
            format!(
                "{:.0}% of frames change (maximum {:.0}%)",
                rate * 100.0,
                cfg.max_healthy_change_rate * 100.0
            ),
            "Change less often and favour consonance",
        ));
    }
    None
}

fn risk_aversion(window: &[DecisionRecord], cfg: &BiasConfig) -> Option<DetectedBias> {
    let hues: Vec<f32> = window.iter().filter_map(|r| r.hue).collect();
    let steps: Vec<f32> = hues
        .windows(2)
        .map(|w| hue_distance(w[0], w[1]) / 180.0)
        .collect();
    if steps.len() < MIN_SAMPLES {
        return None;
    }
    let avg = steps.iter().sum::<f32>() / steps.len() as f32;
    let small = steps.iter().filter(|s| **s < 0.1).count() as f32 / steps.len() as f32;
    if small <= cfg.risk_aversion_threshold {
        return None;
    }
    Some(bias(
        BiasType::RiskAversion,
        severity_over(small, cfg.risk_aversion_threshold),
        "Risk aversion: hue changes are always small".to_string(),
        format!(
            "{:.0}% of hue steps are under 18 degrees (avg {:.1})",
            small * 100.0,
            avg * 180.0
        ),
        "Try an occasional dramatic change (triadic, complementary)",
    ))
}

fn temporal_pattern(window: &[DecisionRecord]) -> Option<DetectedBias> {
    if window.len() < MIN_TEMPORAL_SAMPLES {
        return None;
    }
    let changes: Vec<bool> = window.iter().map(|r| r.had_change).collect();
    TEMPORAL_LAGS.iter().find_map(|&lag| {
        let matches = (lag..changes.len())
            .filter(|&i| changes[i] == changes[i - lag])
            .count();
        let rate = matches as f32 / (changes.len() - lag) as f32;
        (rate > TEMPORAL_THRESHOLD).then(|| {
            bias(
                BiasType::TemporalPattern,
                (rate - TEMPORAL_THRESHOLD) / (1.0 - TEMPORAL_THRESHOLD),
                format!("Repetitive temporal pattern (period ~{})", lag),
                format!("{:.0}% correlation at lag {}", rate * 100.0, lag),
                "Introduce timing variability",
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hue: Option<f32>, had_change: bool) -> DecisionRecord {
        DecisionRecord {
            timestamp_ms: 0,
            hue,
            strategy: None,
            confidence: 0.7,
            had_change,
        }
    }

    #[test]
    fn test_nothing_below_ten_records() {
        let mut detector = BiasDetector::default();
        for _ in 0..9 {
            detector.record(record(Some(10.0), true));
        }
        assert!(detector.analyze().is_none());
        assert!(detector.bias_strings().is_empty());
    }

    #[test]
    fn test_hue_families() {
        assert_eq!(HueFamily::of(10.0), HueFamily::Reds);
        assert_eq!(HueFamily::of(345.0), HueFamily::Reds);
        assert_eq!(HueFamily::of(360.0), HueFamily::Reds);
        assert_eq!(HueFamily::of(120.0), HueFamily::Greens);
        assert_eq!(HueFamily::of(200.0), HueFamily::Blues);
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(SeverityLevel::from_severity(0.1), SeverityLevel::Low);
        assert_eq!(SeverityLevel::from_severity(0.25), SeverityLevel::Medium);
        assert_eq!(SeverityLevel::from_severity(0.5), SeverityLevel::High);
        assert_eq!(SeverityLevel::from_severity(0.8), SeverityLevel::Critical);
    }

    #[test]
    fn test_buffer_trimmed_to_window() {
        let mut detector = BiasDetector::default();
        for _ in 0..201 {
            detector.record(record(None, false));
        }
        assert_eq!(detector.stats().decisions_recorded, 100);
    }

    #[test]
    fn test_stagnation_detected() {
        let mut detector = BiasDetector::default();
        for _ in 0..50 {
            detector.record(record(None, false));
        }
        let analysis = detector.analyze().unwrap();
        let stagnation = analysis
            .biases
            .iter()
            .find(|b| b.bias_type == BiasType::ChangeFrequency)
            .unwrap();
        assert_eq!(stagnation.severity_level, SeverityLevel::Critical);
        assert!(analysis.has_critical_bias);
        assert!(detector.has_critical_bias());
    }

    #[test]
    fn test_varied_hues_have_no_preference() {
        let mut detector = BiasDetector::default();
        let hues = [10.0, 130.0, 250.0, 50.0, 170.0, 290.0, 90.0];
        for i in 0..100 {
            detector.record(record(Some(hues[i % hues.len()]), true));
        }
        let analysis = detector.analyze().unwrap();
        assert!(analysis
            .biases
            .iter()
            .all(|b| b.bias_type != BiasType::HuePreference));
        assert!(analysis
            .biases
            .iter()
            .all(|b| b.bias_type != BiasType::RiskAversion));
    }

    #[test]
    fn test_red_preference_among_hueless_records() {
        let mut detector = BiasDetector::default();
        for i in 0..100 {
            let hue = (i < 45).then_some(if i % 2 == 0 { 5.0 } else { 350.0 });
            detector.record(record(hue, i % 3 == 0));
        }
        let analysis = detector.analyze().unwrap();
        let preference = analysis
            .biases
            .iter()
            .find(|b| b.bias_type == BiasType::HuePreference)
            .unwrap();
        assert!(preference.severity_level >= SeverityLevel::Medium);
        assert!(detector
            .bias_strings()
            .contains(&"hue_preference:critical".to_string()));
        assert!(analysis.cognitive_health < 1.0);
    }
}
