//! Sequential step execution with whole-scenario retry.
//!
//! One attempt runs every compiled step in order, pausing `step_delay`
//! between consecutive steps. The first failing step ends the attempt; if
//! attempts remain, the executor pauses `restart_delay` and starts over from
//! the first step. Nothing is rolled back and captured booking data is kept
//! across attempts.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::compiler::CompiledStep;
use super::types::{BookingResult, StepFailure};
use crate::config::ExecutorSettings;

/// A timed suspension point
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Outcome of [`StepExecutor::execute`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Whether some attempt got through every step
    pub success: bool,

    /// Attempts started, including the successful one
    pub attempts: u32,

    /// Failure that ended the last failed attempt
    pub last_failure: Option<String>,
}

/// Where an attempt stopped
#[derive(Debug)]
struct AttemptFailure {
    index: usize,
    failure: StepFailure,
}

/// Runs compiled steps under an [`ExecutorSettings`] retry policy
#[derive(Clone)]
pub struct StepExecutor {
    settings: ExecutorSettings,
    delay: Arc<dyn Delay>,
}

impl StepExecutor {
    pub fn new(settings: ExecutorSettings) -> Self {
        Self::with_delay(settings, Arc::new(TokioDelay))
    }

    pub fn with_delay(settings: ExecutorSettings, delay: Arc<dyn Delay>) -> Self {
        Self { settings, delay }
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Drive `steps` to completion, retrying the whole sequence on failure
    pub async fn execute(
        &self,
        steps: &[Box<dyn CompiledStep>],
        booking: &mut BookingResult,
    ) -> ExecutionReport {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            info!(attempt, max_attempts, steps = steps.len(), "starting scenario attempt");

            let failure = match self.run_attempt(steps, booking).await {
                Ok(()) => {
                    info!(attempt, "scenario completed");
                    return ExecutionReport {
                        success: true,
                        attempts: attempt,
                        last_failure: None,
                    };
                }
                Err(failure) => failure,
            };

            let reason = format!("step {}: {}", failure.index + 1, failure.failure);
            if attempt >= max_attempts {
                error!(attempts = attempt, "all attempts exhausted, last failure at {reason}");
                return ExecutionReport {
                    success: false,
                    attempts: attempt,
                    last_failure: Some(reason),
                };
            }

            warn!(
                attempt,
                restart_in_secs = self.settings.restart_delay.as_secs(),
                "attempt failed at {reason}, restarting scenario"
            );
            self.delay.wait(self.settings.restart_delay).await;
            attempt += 1;
        }
    }

    async fn run_attempt(
        &self,
        steps: &[Box<dyn CompiledStep>],
        booking: &mut BookingResult,
    ) -> Result<(), AttemptFailure> {
        for (index, step) in steps.iter().enumerate() {
            if index > 0 {
                self.delay.wait(self.settings.step_delay).await;
            }

            let outcome = AssertUnwindSafe(step.invoke(booking))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(StepFailure::Panicked(panic_message(panic.as_ref()))));

            match outcome {
                Ok(()) => {
                    if let Some(value) = step.result_key().and_then(|key| booking.get(key)) {
                        debug!(step = step.label(), value, "step captured data");
                    }
                }
                Err(failure) => {
                    if let StepFailure::Panicked(msg) = &failure {
                        error!(step = step.label(), "step panicked: {msg}");
                    }
                    return Err(AttemptFailure { index, failure });
                }
            }
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
