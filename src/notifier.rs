//! Booking confirmation delivery.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::chat::{ChatClient, ChatResult, Peer};
use crate::steps::BookingResult;

/// First line of every confirmation
pub const CONFIRMATION_HEADER: &str = "Booking confirmed ✅";

/// Delivers the final booking summary
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, booking: &BookingResult) -> ChatResult<()>;
}

/// Sends the confirmation as a chat message to a fixed recipient
pub struct ChatNotifier {
    client: Arc<dyn ChatClient>,
    recipient: Peer,
}

impl ChatNotifier {
    pub fn new(client: Arc<dyn ChatClient>, recipient: Peer) -> Self {
        Self { client, recipient }
    }
}

#[async_trait]
impl Notifier for ChatNotifier {
    async fn notify(&self, booking: &BookingResult) -> ChatResult<()> {
        let message = format_confirmation(booking);
        self.client.send_message(&self.recipient, &message).await?;
        info!(recipient = %self.recipient, "confirmation sent");
        Ok(())
    }
}

/// Header, blank line, then one `Label: value` line per captured key
pub fn format_confirmation(booking: &BookingResult) -> String {
    let mut message = String::from(CONFIRMATION_HEADER);
    if booking.is_empty() {
        return message;
    }
    message.push_str("\n\n");
    let lines: Vec<String> = booking
        .iter()
        .map(|(key, value)| format!("{}: {}", label_for(key), value))
        .collect();
    message.push_str(&lines.join("\n"));
    message
}

fn label_for(key: &str) -> &str {
    match key {
        "date" => "Date",
        "time" => "Time",
        other => other,
    }
}
