use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::chat::ChatError;

/// One declarative scenario step, as written in the scenario file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepDefinition {
    /// Send a text command to the bot
    Command {
        #[serde(default)]
        description: String,

        #[serde(alias = "value")]
        command: String,
    },

    /// Find an inline button in recent history and click it
    Click {
        #[serde(default)]
        description: String,

        /// Case-insensitive substring of the button label
        #[serde(default, skip_serializing_if = "Option::is_none")]
        search_text: Option<String>,

        /// Heuristic used when `search_text` is absent or does not match
        #[serde(default, alias = "slot_type", skip_serializing_if = "Option::is_none")]
        slot_kind: Option<SlotKind>,

        /// Booking result key the matched label is stored under
        #[serde(default, alias = "expected_data", skip_serializing_if = "Option::is_none")]
        result_key: Option<String>,
    },
}

impl StepDefinition {
    pub fn command(description: impl Into<String>, command: impl Into<String>) -> Self {
        StepDefinition::Command {
            description: description.into(),
            command: command.into(),
        }
    }

    pub fn click_text(description: impl Into<String>, search_text: impl Into<String>) -> Self {
        StepDefinition::Click {
            description: description.into(),
            search_text: Some(search_text.into()),
            slot_kind: None,
            result_key: None,
        }
    }

    pub fn click_slot(description: impl Into<String>, slot_kind: SlotKind) -> Self {
        StepDefinition::Click {
            description: description.into(),
            search_text: None,
            slot_kind: Some(slot_kind),
            result_key: None,
        }
    }

    /// Store the matched label under `key` (click steps only)
    pub fn capture(mut self, key: impl Into<String>) -> Self {
        if let StepDefinition::Click { result_key, .. } = &mut self {
            *result_key = Some(key.into());
        }
        self
    }

    /// Human-readable label used in logs
    pub fn label(&self) -> String {
        match self {
            StepDefinition::Command { description, command } => {
                if description.is_empty() {
                    command.clone()
                } else {
                    description.clone()
                }
            }
            StepDefinition::Click {
                description,
                search_text,
                slot_kind,
                ..
            } => {
                if !description.is_empty() {
                    description.clone()
                } else {
                    ButtonMatcher::new(search_text.clone(), *slot_kind).to_string()
                }
            }
        }
    }

    /// Check the invariants serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StepDefinition::Command { command, .. } => {
                if command.trim().is_empty() {
                    return Err("command step has empty command text".to_string());
                }
            }
            StepDefinition::Click {
                search_text,
                slot_kind,
                ..
            } => {
                let has_text = search_text.as_deref().is_some_and(|s| !s.is_empty());
                if !has_text && slot_kind.is_none() {
                    return Err("click step needs 'search_text' or 'slot_kind'".to_string());
                }
            }
        }
        Ok(())
    }
}

/// Button shape heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    /// Any label containing a digit, in any script
    Date,
    /// Any label containing `:` or `-`
    Time,
    /// Any labelled button
    Confirmation,
}

impl SlotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKind::Date => "date",
            SlotKind::Time => "time",
            SlotKind::Confirmation => "confirmation",
        }
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            SlotKind::Date => text.chars().any(char::is_numeric),
            SlotKind::Time => text.contains(':') || text.contains('-'),
            SlotKind::Confirmation => true,
        }
    }
}

/// Predicate deciding whether a button label is the one a click step wants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonMatcher {
    search_text: Option<String>,
    slot_kind: Option<SlotKind>,
}

impl ButtonMatcher {
    pub fn new(search_text: Option<String>, slot_kind: Option<SlotKind>) -> Self {
        Self {
            search_text: search_text
                .filter(|s| !s.is_empty())
                .map(|s| s.to_lowercase()),
            slot_kind,
        }
    }

    /// Search text first, slot heuristic only as a fallback
    pub fn matches(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        if let Some(needle) = &self.search_text {
            if text.to_lowercase().contains(needle.as_str()) {
                return true;
            }
        }
        self.slot_kind.is_some_and(|kind| kind.matches(text))
    }
}

impl std::fmt::Display for ButtonMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.search_text, self.slot_kind) {
            (Some(text), Some(kind)) => write!(f, "'{}' or {} slot", text, kind.as_str()),
            (Some(text), None) => write!(f, "'{}'", text),
            (None, Some(kind)) => write!(f, "{} slot", kind.as_str()),
            (None, None) => write!(f, "nothing"),
        }
    }
}

/// Data captured from clicked buttons, keyed by result key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingResult(BTreeMap<String, String>);

impl BookingResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any earlier capture
    pub fn record(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BookingResult {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Why a single step did not succeed. Every variant is recoverable.
#[derive(Debug, Error)]
pub enum StepFailure {
    /// The chat session failed while sending, listing or clicking
    #[error("transport fault: {0}")]
    Transport(#[from] ChatError),

    /// Scanned all eligible messages, no button matched
    #[error("button not found for {criteria}")]
    NoMatchFound { criteria: String },

    /// The step panicked; caught by the executor
    #[error("step panicked: {0}")]
    Panicked(String),
}
