//! Chat session abstraction.
//!
//! The booking flow never speaks the chat protocol itself. Everything it needs
//! from a logged-in account goes through [`ChatClient`]: connecting, resolving
//! a bot username, sending text, reading recent history with inline keyboards,
//! clicking a button, and asking who "me" is.

pub mod gateway;
pub mod types;

pub use gateway::GatewayClient;
pub use types::{Button, ButtonRow, ChatError, ChatResult, Credentials, InlineKeyboard, Message, Peer};

use async_trait::async_trait;

/// Fallible async operations on a single authenticated chat account.
///
/// Every failure is reported as a [`ChatError`]; callers decide whether it is
/// fatal (startup) or a recoverable step failure.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Authenticate and open the session
    async fn connect(&self, credentials: &Credentials) -> ChatResult<()>;

    /// Resolve a username (with or without `@`) to a conversation handle
    async fn resolve(&self, username: &str) -> ChatResult<Peer>;

    /// Send a plain text message to a conversation
    async fn send_message(&self, peer: &Peer, text: &str) -> ChatResult<()>;

    /// The most recent `limit` messages of a conversation, newest first
    async fn recent_messages(&self, peer: &Peer, limit: usize) -> ChatResult<Vec<Message>>;

    /// Click the inline button at `(row, column)` of a message
    async fn click(&self, peer: &Peer, message_id: i64, row: usize, column: usize) -> ChatResult<()>;

    /// The authenticated account itself
    async fn me(&self) -> ChatResult<Peer>;
}
