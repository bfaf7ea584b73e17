//! Boundary to the fixture side of the rig.
//!
//! The engine never talks to hardware. It asks an [`EffectManager`] whether an
//! exclusivity lock (the "dictator") is held, reports usage to a
//! [`UsageRecorder`], and learns that an effect really fired through
//! [`EffectFiredEvent`]s. Cooldowns are registered from those events only, so
//! a proposal that the hardware side refused never poisons the history.

use crate::error::{ControlError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use lumen_core::EffectKind;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use lumen_core::gatekeeper::EffectFiredEvent;

/// Owner of the fixtures.
pub trait EffectManager: Send + Sync {
    /// True while another controller holds exclusive access
    fn has_dictator(&self) -> bool;
}

/// Diversity bookkeeping downstream of the engine.
pub trait UsageRecorder: Send + Sync {
    /// Called once per confirmed firing
    fn record_effect_usage(&self, effect: EffectKind, timestamp_ms: u64);
}

/// Effect manager without any exclusivity lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDictator;

impl EffectManager for NoDictator {
    fn has_dictator(&self) -> bool {
        false
    }
}

/// Shareable lock flag, toggled by whoever owns the fixtures.
#[derive(Debug, Clone, Default)]
pub struct DictatorLock {
    held: Arc<AtomicBool>,
}

impl DictatorLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take or release the lock
    pub fn set(&self, held: bool) {
        self.held.store(held, Ordering::SeqCst);
    }
}

impl EffectManager for DictatorLock {
    fn has_dictator(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

/// Discards usage reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullUsageRecorder;

impl UsageRecorder for NullUsageRecorder {
    fn record_effect_usage(&self, _effect: EffectKind, _timestamp_ms: u64) {}
}

/// In-memory usage log, mostly useful for replay and tests.
#[derive(Debug, Default)]
pub struct UsageLog {
    entries: Mutex<Vec<(EffectKind, u64)>>,
}

impl UsageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every recorded firing, oldest first
    pub fn entries(&self) -> Vec<(EffectKind, u64)> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl UsageRecorder for UsageLog {
    fn record_effect_usage(&self, effect: EffectKind, timestamp_ms: u64) {
        self.entries.lock().push((effect, timestamp_ms));
    }
}

impl<T: UsageRecorder + ?Sized> UsageRecorder for Arc<T> {
    fn record_effect_usage(&self, effect: EffectKind, timestamp_ms: u64) {
        (**self).record_effect_usage(effect, timestamp_ms);
    }
}

impl<T: EffectManager + ?Sized> EffectManager for Arc<T> {
    fn has_dictator(&self) -> bool {
        (**self).has_dictator()
    }
}

/// Hardware-side handle used to confirm firings. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ConfirmationSender {
    tx: Sender<EffectFiredEvent>,
}

impl ConfirmationSender {
    /// Report that `event.effect` actually executed
    pub fn confirm(&self, event: EffectFiredEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| ControlError::ChannelClosed)
    }
}

/// Engine-side end of the confirmation channel.
#[derive(Debug)]
pub struct ConfirmationReceiver {
    rx: Receiver<EffectFiredEvent>,
}

impl ConfirmationReceiver {
    /// Every confirmation queued since the last drain, without blocking
    pub fn drain(&self) -> Vec<EffectFiredEvent> {
        self.rx.try_iter().collect()
    }
}

/// Unbounded confirmation channel.
pub fn confirmation_channel() -> (ConfirmationSender, ConfirmationReceiver) {
    let (tx, rx) = unbounded();
    (ConfirmationSender { tx }, ConfirmationReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictator_lock_shared_between_clones() {
        let lock = DictatorLock::new();
        let view = lock.clone();
        assert!(!view.has_dictator());
        lock.set(true);
        assert!(view.has_dictator());
    }

    #[test]
    fn test_drain_returns_in_order_then_empty() {
        let (tx, rx) = confirmation_channel();
        for id in 0..3 {
            tx.confirm(EffectFiredEvent {
                id,
                effect: EffectKind::StrobeBurst,
                timestamp_ms: id * 10,
            })
            .unwrap();
        }
        let ids: Vec<u64> = rx.drain().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn test_confirm_after_receiver_dropped() {
        let (tx, rx) = confirmation_channel();
        drop(rx);
        let result = tx.confirm(EffectFiredEvent {
            id: 9,
            effect: EffectKind::SolarFlare,
            timestamp_ms: 0,
        });
        assert!(matches!(result, Err(ControlError::ChannelClosed)));
    }

    #[test]
    fn test_usage_log_records() {
        let log = UsageLog::new();
        assert!(log.is_empty());
        log.record_effect_usage(EffectKind::AcidSweep, 42);
        assert_eq!(log.entries(), vec![(EffectKind::AcidSweep, 42)]);
    }
}
