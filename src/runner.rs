//! One complete booking run and its result.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::chat::{ChatClient, ChatError};
use crate::config::{Config, ConfigurationError};
use crate::notifier::{ChatNotifier, Notifier};
use crate::session::Session;
use crate::steps::{BookingResult, StepExecutor, load_steps};

/// Result of a complete booking run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Whether some attempt completed every step
    pub success: bool,

    /// Attempts made through the scenario
    pub attempts: u32,

    /// Failure that ended the last attempt, if the run failed
    pub error: Option<String>,

    /// Data captured from clicked buttons
    pub booking: BookingResult,

    /// Whether the confirmation reached the operator
    pub notified: bool,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub started_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub finished_at: DateTime<Utc>,
}

/// Faults that stop a run before the scenario executes
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("chat session failed: {0}")]
    Session(#[from] ChatError),
}

/// Load the scenario, start the session, execute, notify on success
pub async fn run_booking(
    config: &Config,
    client: Arc<dyn ChatClient>,
    executor: &StepExecutor,
) -> Result<RunResult, RunError> {
    let started_at = Utc::now();

    let definitions = load_steps(&config.steps_file)?;
    info!(
        path = %config.steps_file.display(),
        steps = definitions.len(),
        "scenario loaded"
    );

    let session = Session::start(client, config).await?;
    let steps = session.compiler().compile(&definitions);

    let mut booking = BookingResult::new();
    let report = executor.execute(&steps, &mut booking).await;

    let notified = if report.success {
        notify_operator(&session, &booking).await
    } else {
        false
    };

    Ok(RunResult {
        success: report.success,
        attempts: report.attempts,
        error: report.last_failure,
        booking,
        notified,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Delivery problems are logged and never change the run outcome
async fn notify_operator(session: &Session, booking: &BookingResult) -> bool {
    let operator = match session.operator().await {
        Ok(peer) => peer,
        Err(e) => {
            error!("cannot resolve operator account: {e}");
            return false;
        }
    };

    let notifier = ChatNotifier::new(session.client(), operator);
    match notifier.notify(booking).await {
        Ok(()) => true,
        Err(e) => {
            error!("failed to deliver confirmation: {e}");
            false
        }
    }
}
