//! Chat session lifecycle.
//!
//! A [`Session`] is acquired once at startup and held for the whole run:
//! - authenticates the account through the [`ChatClient`]
//! - resolves the target bot to a conversation handle
//! - hands out step compilers bound to that conversation

use std::sync::Arc;

use tracing::info;

use crate::chat::{ChatClient, ChatResult, Credentials, Peer};
use crate::config::Config;
use crate::steps::StepCompiler;

/// System string reported on login; the default desktop string makes the
/// service terminate the account's other sessions.
pub const SYSTEM_VERSION: &str = "4.16.30-vxCUSTOM";

/// An authenticated session driving one target conversation
#[derive(Clone)]
pub struct Session {
    /// Session name the gateway persists the login under
    pub id: String,
    client: Arc<dyn ChatClient>,
    target: Peer,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Connect the account and resolve the target bot
    pub async fn start(client: Arc<dyn ChatClient>, config: &Config) -> ChatResult<Self> {
        let credentials = credentials(config);
        client.connect(&credentials).await?;
        info!(session = %credentials.session_name, "chat session started");

        let target = client.resolve(&config.target_bot).await?;
        info!(target = %target, "target conversation resolved");

        Ok(Self {
            id: credentials.session_name,
            client,
            target,
        })
    }

    pub fn target(&self) -> &Peer {
        &self.target
    }

    pub fn client(&self) -> Arc<dyn ChatClient> {
        Arc::clone(&self.client)
    }

    /// Step compiler bound to this session's target
    pub fn compiler(&self) -> StepCompiler {
        StepCompiler::new(self.client(), self.target.clone())
    }

    /// The operator's own account, recipient of notifications
    pub async fn operator(&self) -> ChatResult<Peer> {
        self.client.me().await
    }
}

/// Login material derived from configuration
pub fn credentials(config: &Config) -> Credentials {
    Credentials {
        session_name: session_name(&config.account.phone_number),
        api_id: config.account.api_id,
        api_hash: config.account.api_hash.clone(),
        phone_number: config.account.phone_number.clone(),
        password: config.account.password.clone(),
        system_version: SYSTEM_VERSION.to_string(),
    }
}

/// Session name for an account phone number
pub fn session_name(phone_number: &str) -> String {
    format!("session_{}", sanitize_name(phone_number.trim_start_matches('+')))
}

/// Sanitize a name for use in filenames
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}
