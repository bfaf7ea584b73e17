//! Sense stage: pattern, beauty and consonance sensors.
//!
//! Sensors must all have run for a frame before the hunt engine or the fuzzy
//! evaluator read their output.

pub mod beauty;
pub mod consonance;
pub mod pattern;

pub use beauty::{golden_distribution, BeautyAnalysis, BeautySensor};
pub use consonance::{evaluate_hue_change, ConsonanceAnalysis, ConsonanceSensor, TransitionType};
pub use pattern::{moment_urgency, EnergyPhase, MusicalPattern, PatternSensor};
