pub mod compiler;
pub mod executor;
pub mod loader;
pub mod types;

pub use compiler::{ClickAction, CommandAction, CompiledStep, HISTORY_LIMIT, StepCompiler};
pub use executor::{Delay, ExecutionReport, StepExecutor, TokioDelay};
pub use loader::{load_steps, parse_steps};
pub use types::{BookingResult, ButtonMatcher, SlotKind, StepDefinition, StepFailure};
