//! Lumen Control - the conscious engine
//!
//! This crate wires the `lumen-core` components into the per-frame
//! Sense → Think → Dream → Validate pipeline:
//! - **Conscious engine**: session-scoped orchestrator, one `process` call per frame
//! - **Decision makers**: pluggable synthesis of hunt, fuzzy, prediction and drop bridge signals
//! - **Dream**: bounded-latency simulation raced against a deadline
//! - **Hardware boundary**: dictator lock, usage recording and firing confirmations
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumen_control::ConsciousEngine;
//! use lumen_core::{AudioFrame, EngineConfig};
//!
//! # async fn run() -> lumen_control::Result<()> {
//! let mut engine = ConsciousEngine::new(EngineConfig::default())?;
//! let output = engine.process(&AudioFrame::default()).await;
//! assert!(output.effect_decision.is_none());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`conscious`] - The orchestrator
//! - [`decision`] - Decision maker trait and default arbitration
//! - [`dream`] - Dream simulation and deadline race
//! - [`hardware`] - Fixture-side traits and confirmation channel
//! - [`output`] - Per-frame output types
//! - [`error`] - Error types

#![allow(missing_docs)]

/// The orchestrator
pub mod conscious;
/// Decision synthesis
pub mod decision;
/// Dream simulation
pub mod dream;
/// Error types
pub mod error;
/// Fixture-side boundary
pub mod hardware;
/// Output types
pub mod output;

// Re-exports
pub use conscious::{ConsciousEngine, ConsciousState, ConsciousStats};
pub use decision::{
    is_significant_decision, merge_decisions, select_effect_by_vibe, DecisionInputs, DecisionMaker,
    DecisionMakerConfig, DivineStrike, EffectSelection, HuntDecisionMaker, RawDecision,
};
pub use dream::{
    simulate_with_deadline, DreamOutcome, DreamRequest, DreamSimulator, DreamVerdict,
    ScenarioDreamSimulator,
};
pub use error::{ControlError, Result};
pub use hardware::{
    confirmation_channel, ConfirmationReceiver, ConfirmationSender, DictatorLock,
    EffectFiredEvent, EffectManager, NoDictator, NullUsageRecorder, UsageLog, UsageRecorder,
};
pub use output::{
    ConsciousnessOutput, DebugInfo, DecisionSource, EffectDecision, GateOutcome, PhysicsModifier,
};
