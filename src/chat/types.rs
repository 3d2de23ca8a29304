use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A conversation or account handle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Peer {
    /// Numeric identifier assigned by the chat service
    pub id: i64,

    /// Public username, if the peer has one
    #[serde(default)]
    pub username: Option<String>,
}

impl Peer {
    pub fn new(id: i64) -> Self {
        Self { id, username: None }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

impl std::fmt::Display for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.username {
            Some(name) => write!(f, "@{} ({})", name, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// A message as seen in conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,

    #[serde(default)]
    pub text: Option<String>,

    /// Inline keyboard attached to the message, if any
    #[serde(default)]
    pub reply_markup: Option<InlineKeyboard>,
}

impl Message {
    pub fn text(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: Some(text.into()),
            reply_markup: None,
        }
    }

    /// Message carrying an inline keyboard built from button labels
    pub fn with_keyboard<R, B>(id: i64, rows: R) -> Self
    where
        R: IntoIterator<Item = B>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        Self {
            id,
            text: None,
            reply_markup: Some(InlineKeyboard::from_labels(rows)),
        }
    }
}

/// Inline button layout: rows top-to-bottom, buttons left-to-right
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    #[serde(default)]
    pub rows: Vec<ButtonRow>,
}

impl InlineKeyboard {
    pub fn from_labels<R, B>(rows: R) -> Self
    where
        R: IntoIterator<Item = B>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| ButtonRow {
                    buttons: row
                        .into_iter()
                        .map(|text| Button { text: text.into() })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonRow {
    #[serde(default)]
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Visible label; buttons without one never match
    #[serde(default)]
    pub text: String,
}

/// Login material for [`super::ChatClient::connect`]
#[derive(Clone)]
pub struct Credentials {
    /// Name under which the session is persisted by the gateway
    pub session_name: String,
    pub api_id: i32,
    pub api_hash: String,
    pub phone_number: String,
    pub password: Option<String>,
    /// Device/system string reported to the chat service
    pub system_version: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("session_name", &self.session_name)
            .field("api_id", &self.api_id)
            .field("phone_number", &self.phone_number)
            .field("system_version", &self.system_version)
            .finish_non_exhaustive()
    }
}

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Any failure talking to the chat session
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request never completed (connection refused, timeout, ...)
    #[error("transport error: {0}")]
    Transport(String),

    /// The session answered with an error status
    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The answer could not be understood
    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::Decode(err.to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}
