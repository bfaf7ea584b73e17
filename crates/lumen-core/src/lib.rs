//! Lumen Core - musical perception and effect policy for live lighting
//!
//! This crate contains the pure, per-frame building blocks of the engine:
//! - Sensors (pattern, beauty, consonance) and z-score memory
//! - Energy zones and the Drop Bridge override
//! - Hunt FSM, prediction and fuzzy inference
//! - Effect gatekeeper with moods, zones, arsenals and texture curation
//! - Bias detector and constitution guard
//!
//! Orchestration lives in `lumen-control`.

#![warn(missing_docs)]

pub mod bias;
pub mod config;
pub mod constitution;
pub mod drop_bridge;
pub mod energy;
pub mod error;
pub mod frame;
pub mod fuzzy;
pub mod gatekeeper;
pub mod hunt;
pub mod logging;
pub mod memory;
pub mod prediction;
pub mod sense;
pub mod types;

// --- Re-exports grouped by category ---

// Vocabulary & input
pub use frame::{AudioFrame, Hsl, Palette, SpectralContext};
pub use types::{
    clamp01, ColorStrategy, EffectKind, HuntPhase, SectionType, Texture, TextureCompatibility,
    Trend, Vibe, Zone,
};

// Sense
pub use memory::{ContextualMemory, MemoryConfig, MemoryInput, MemoryOutput, RollingStats};
pub use sense::{
    BeautyAnalysis, BeautySensor, ConsonanceAnalysis, ConsonanceSensor, EnergyPhase,
    MusicalPattern, PatternSensor, TransitionType,
};

// Think
pub use drop_bridge::{
    AlertLevel, DropBridge, DropBridgeConfig, DropBridgeInput, DropBridgeResult,
};
pub use energy::{EnergyContext, EnergyZoneConfig, EnergyZoneTracker, ZoneThresholds};
pub use fuzzy::{FuzzyAction, FuzzyDecision, FuzzyDecisionMaker, FuzzyInput, FuzzyScores};
pub use hunt::{HuntConfig, HuntDecision, HuntEngine, HuntInput, HuntState, VibeWeights};
pub use prediction::{MusicalPrediction, PredictionEngine, PredictionKind, SpectralBuildupDetector};

// Gate & validate
pub use bias::{BiasAnalysis, BiasConfig, BiasDetector, BiasType, DecisionRecord, SeverityLevel};
pub use constitution::{
    ColorDecision, Constitution, ConstitutionGuard, DefaultConstitutionGuard, ValidationResult,
};
pub use gatekeeper::{
    ArsenalExhausted, EffectAvailability, EffectFiredEvent, EffectGatekeeper, Mood, MoodPolicy,
    MoodProfile,
};

// Ambient
pub use config::{ConsciousConfig, EngineConfig, SessionConfig};
pub use error::{CoreError, Result};
pub use logging::LogConfig;
