//! Where spin outcomes come from once a bet has been debited.
//!
//! The controller only knows the [`SpinProvider`] trait. [`LatencySpinProvider`] is the local
//! implementation: it waits a random delay on an injected [`Clock`], then asks its own
//! [`SlotMachine`] for the outcome, which mimics a remote game server.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;

use crate::{
    error::{EngineError, Result},
    machine::{SlotMachine, SpinOutcome},
    rng::RandomSource,
    Credits,
};

/// Produces the outcome of a spin whose bet is already debited.
#[async_trait]
pub trait SpinProvider: Send + Sync {
    /// Settles eventually, with an outcome for `bet` or a failure.
    async fn spin(&self, bet: Credits) -> Result<SpinOutcome>;
}

/// Source of time for suspension points.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Resolves once `duration` has elapsed on this clock.
    async fn sleep(&self, duration: Duration);
}

/// Tokio timer. Under a paused runtime it follows virtual time.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Simulated server: random latency, then a local spin.
pub struct LatencySpinProvider {
    machine: Mutex<SlotMachine>,
    latency_rng: Mutex<Box<dyn RandomSource>>,
    min_latency: Duration,
    max_latency: Duration,
    clock: Arc<dyn Clock>,
}

impl LatencySpinProvider {
    /// Provider sleeping on the tokio timer.
    pub fn new(
        machine: SlotMachine,
        latency_rng: Box<dyn RandomSource>,
        min_latency: Duration,
        max_latency: Duration,
    ) -> Result<Self> {
        Self::with_clock(
            machine,
            latency_rng,
            min_latency,
            max_latency,
            Arc::new(TokioClock),
        )
    }

    /// Provider sleeping on `clock`. Fails if `max_latency < min_latency`.
    pub fn with_clock(
        machine: SlotMachine,
        latency_rng: Box<dyn RandomSource>,
        min_latency: Duration,
        max_latency: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if max_latency < min_latency {
            return Err(EngineError::invalid(format!(
                "max latency {:?} is below min latency {:?}",
                max_latency, min_latency
            )));
        }

        Ok(Self {
            machine: Mutex::new(machine),
            latency_rng: Mutex::new(latency_rng),
            min_latency,
            max_latency,
            clock,
        })
    }

    /// Draws the next delay: `min + floor(fraction * (max - min))` milliseconds.
    fn next_latency(&self) -> Duration {
        let min = self.min_latency.as_millis() as u64;
        let spread = (self.max_latency.as_millis() as u64).saturating_sub(min);
        let fraction = self.latency_rng.lock().next_f64();
        Duration::from_millis(min + (fraction * spread as f64).floor() as u64)
    }
}

#[async_trait]
impl SpinProvider for LatencySpinProvider {
    async fn spin(&self, bet: Credits) -> Result<SpinOutcome> {
        let latency = self.next_latency();
        debug!("Provider latency: {:?}", latency);
        self.clock.sleep(latency).await;

        self.machine.lock().spin(bet)
    }
}
