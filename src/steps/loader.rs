//! Scenario file loading.
//!
//! A scenario is a YAML document with a top-level `steps` list:
//!
//! ```yaml
//! steps:
//!   - type: command
//!     description: Open the bot
//!     command: /start
//!   - type: click
//!     description: Pick the first free date
//!     slot_kind: date
//!     result_key: date
//! ```

use std::path::Path;

use tracing::{debug, error};

use super::types::StepDefinition;
use crate::config::ConfigurationError;

/// Read and validate the scenario at `path`
pub fn load_steps(path: &Path) -> Result<Vec<StepDefinition>, ConfigurationError> {
    let raw = std::fs::read_to_string(path).map_err(|source| {
        error!(path = %path.display(), "cannot read scenario file: {source}");
        ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let steps = parse_steps(&raw, path)?;
    debug!(path = %path.display(), count = steps.len(), "scenario loaded");
    Ok(steps)
}

/// Parse scenario YAML; `origin` is only used in error messages
pub fn parse_steps(yaml: &str, origin: &Path) -> Result<Vec<StepDefinition>, ConfigurationError> {
    let document: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|source| ConfigurationError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

    let entries = match document.get("steps") {
        Some(serde_yaml::Value::Sequence(entries)) => entries.clone(),
        _ => {
            return Err(ConfigurationError::MissingSteps {
                path: origin.to_path_buf(),
            });
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let index = i + 1;
            let step: StepDefinition = serde_yaml::from_value(entry).map_err(|e| {
                ConfigurationError::InvalidStep {
                    index,
                    reason: e.to_string(),
                }
            })?;
            step.validate()
                .map_err(|reason| ConfigurationError::InvalidStep { index, reason })?;
            Ok(step)
        })
        .collect()
}
