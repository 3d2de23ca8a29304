//! Turns declarative step definitions into executable steps.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::types::{BookingResult, ButtonMatcher, StepDefinition, StepFailure};
use crate::chat::{ChatClient, Peer};

/// How many recent messages a click step scans for an inline keyboard
pub const HISTORY_LIMIT: usize = 15;

/// An executable step bound to a chat session and target conversation.
///
/// The booking map is handed in by the executor on every invocation, so a
/// compiled step holds no mutable state of its own.
#[async_trait]
pub trait CompiledStep: Send + Sync {
    /// Label used in logs
    fn label(&self) -> &str;

    /// Booking key this step writes to, if any
    fn result_key(&self) -> Option<&str> {
        None
    }

    async fn invoke(&self, booking: &mut BookingResult) -> Result<(), StepFailure>;
}

/// Builds [`CompiledStep`]s for one chat session and target
#[derive(Clone)]
pub struct StepCompiler {
    client: Arc<dyn ChatClient>,
    target: Peer,
    history_limit: usize,
}

impl StepCompiler {
    pub fn new(client: Arc<dyn ChatClient>, target: Peer) -> Self {
        Self {
            client,
            target,
            history_limit: HISTORY_LIMIT,
        }
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Compile `definitions`, preserving their order
    pub fn compile(&self, definitions: &[StepDefinition]) -> Vec<Box<dyn CompiledStep>> {
        definitions.iter().map(|def| self.compile_one(def)).collect()
    }

    fn compile_one(&self, definition: &StepDefinition) -> Box<dyn CompiledStep> {
        let label = definition.label();
        match definition {
            StepDefinition::Command { command, .. } => Box::new(CommandAction {
                client: Arc::clone(&self.client),
                target: self.target.clone(),
                label,
                command: command.clone(),
            }),
            StepDefinition::Click {
                search_text,
                slot_kind,
                result_key,
                ..
            } => Box::new(ClickAction {
                client: Arc::clone(&self.client),
                target: self.target.clone(),
                label,
                matcher: ButtonMatcher::new(search_text.clone(), *slot_kind),
                result_key: result_key.clone(),
                history_limit: self.history_limit,
            }),
        }
    }
}

/// Sends a text command to the target
pub struct CommandAction {
    client: Arc<dyn ChatClient>,
    target: Peer,
    label: String,
    command: String,
}

#[async_trait]
impl CompiledStep for CommandAction {
    fn label(&self) -> &str {
        &self.label
    }

    async fn invoke(&self, _booking: &mut BookingResult) -> Result<(), StepFailure> {
        info!(step = %self.label, "running command step");
        match self.client.send_message(&self.target, &self.command).await {
            Ok(()) => {
                debug!(command = %self.command, "command sent");
                Ok(())
            }
            Err(e) => {
                error!(step = %self.label, "failed to send command: {e}");
                Err(StepFailure::Transport(e))
            }
        }
    }
}

/// Finds the first matching inline button in recent history and clicks it
pub struct ClickAction {
    client: Arc<dyn ChatClient>,
    target: Peer,
    label: String,
    matcher: ButtonMatcher,
    result_key: Option<String>,
    history_limit: usize,
}

impl ClickAction {
    async fn scan_and_click(&self, booking: &mut BookingResult) -> Result<(), StepFailure> {
        let messages = self
            .client
            .recent_messages(&self.target, self.history_limit)
            .await?;

        for message in &messages {
            let Some(keyboard) = &message.reply_markup else {
                continue;
            };

            for (row_index, row) in keyboard.rows.iter().enumerate() {
                for (column_index, button) in row.buttons.iter().enumerate() {
                    if !self.matcher.matches(&button.text) {
                        continue;
                    }

                    if let Some(key) = &self.result_key {
                        booking.record(key.clone(), button.text.clone());
                        debug!(key = %key, value = %button.text, "captured booking data");
                    }

                    info!(button = %button.text, "pressing button");
                    self.client
                        .click(&self.target, message.id, row_index, column_index)
                        .await?;
                    return Ok(());
                }
            }
        }

        Err(StepFailure::NoMatchFound {
            criteria: self.matcher.to_string(),
        })
    }
}

#[async_trait]
impl CompiledStep for ClickAction {
    fn label(&self) -> &str {
        &self.label
    }

    fn result_key(&self) -> Option<&str> {
        self.result_key.as_deref()
    }

    async fn invoke(&self, booking: &mut BookingResult) -> Result<(), StepFailure> {
        info!(step = %self.label, "running click step");
        let result = self.scan_and_click(booking).await;
        match &result {
            Ok(()) => {}
            Err(StepFailure::NoMatchFound { criteria }) => {
                warn!(step = %self.label, "button not found for {criteria}");
            }
            Err(e) => {
                error!(step = %self.label, "click failed: {e}");
            }
        }
        result
    }
}
