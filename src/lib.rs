//! Slot Booker - scripted chat-bot automation for booking appointment slots.
//!
//! This crate provides:
//! - Declarative scenarios loaded from YAML (commands and inline-button clicks)
//! - A step compiler binding scenarios to a live chat session
//! - A sequential executor with per-step delay and whole-scenario retry
//! - Confirmation delivery to the operator's own account
//! - An HTTP client for the session gateway that owns the chat connection
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use slot_booker::{Config, GatewayClient, StepExecutor, run_booking, session_name};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let client = GatewayClient::new(&config.gateway, session_name(&config.account.phone_number))?;
//! let executor = StepExecutor::new(config.executor);
//! let result = run_booking(&config, Arc::new(client), &executor).await?;
//! println!("booked: {}", result.success);
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod config;
pub mod logging;
pub mod notifier;
pub mod runner;
pub mod session;
pub mod steps;

// Re-export configuration
pub use config::{Config, ConfigurationError, ExecutorSettings, GatewaySettings};

// Re-export chat client types
pub use chat::{ChatClient, ChatError, GatewayClient, Message, Peer};

// Re-export scenario types
pub use steps::{
    BookingResult, CompiledStep, ExecutionReport, SlotKind, StepCompiler, StepDefinition,
    StepExecutor, StepFailure, load_steps,
};

// Re-export run orchestration
pub use notifier::{ChatNotifier, Notifier, format_confirmation};
pub use runner::{RunError, RunResult, run_booking};
pub use session::{Session, session_name};
