//! Scripted in-memory chat client shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use slot_booker::chat::{ChatClient, ChatError, ChatResult, Credentials, Message, Peer};
use slot_booker::config::{AccountSettings, Config, ExecutorSettings, GatewaySettings};

pub const TARGET_ID: i64 = 777;
pub const OPERATOR_ID: i64 = 42;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Click {
    pub message_id: i64,
    pub row: usize,
    pub column: usize,
}

#[derive(Default)]
struct Failures {
    connect: bool,
    send: bool,
    history: bool,
    click: bool,
    me: bool,
}

/// Replays scripted history snapshots and records every side effect.
///
/// Each `recent_messages` call consumes the next queued snapshot; the last
/// snapshot keeps being returned once the queue runs dry.
#[derive(Default)]
pub struct FakeChat {
    histories: Mutex<VecDeque<Vec<Message>>>,
    sent: Mutex<Vec<(i64, String)>>,
    clicks: Mutex<Vec<Click>>,
    history_limits: Mutex<Vec<usize>>,
    connected: Mutex<Option<Credentials>>,
    failures: Mutex<Failures>,
}

fn fault(op: &str) -> ChatError {
    ChatError::Rejected {
        status: 500,
        body: format!("{op} failed"),
    }
}

impl FakeChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(self, messages: Vec<Message>) -> Self {
        self.histories.lock().unwrap().push_back(messages);
        self
    }

    pub fn failing_connect(self) -> Self {
        self.failures.lock().unwrap().connect = true;
        self
    }

    pub fn failing_send(self) -> Self {
        self.failures.lock().unwrap().send = true;
        self
    }

    pub fn failing_history(self) -> Self {
        self.failures.lock().unwrap().history = true;
        self
    }

    pub fn failing_click(self) -> Self {
        self.failures.lock().unwrap().click = true;
        self
    }

    pub fn failing_me(self) -> Self {
        self.failures.lock().unwrap().me = true;
        self
    }

    /// Texts sent to `peer_id`, in order
    pub fn sent_to(&self, peer_id: i64) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == peer_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn clicks(&self) -> Vec<Click> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn history_limits(&self) -> Vec<usize> {
        self.history_limits.lock().unwrap().clone()
    }

    pub fn connected_as(&self) -> Option<Credentials> {
        self.connected.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for FakeChat {
    async fn connect(&self, credentials: &Credentials) -> ChatResult<()> {
        if self.failures.lock().unwrap().connect {
            return Err(fault("connect"));
        }
        *self.connected.lock().unwrap() = Some(credentials.clone());
        Ok(())
    }

    async fn resolve(&self, username: &str) -> ChatResult<Peer> {
        Ok(Peer::new(TARGET_ID).with_username(username.trim_start_matches('@')))
    }

    async fn send_message(&self, peer: &Peer, text: &str) -> ChatResult<()> {
        if self.failures.lock().unwrap().send {
            return Err(fault("send"));
        }
        self.sent.lock().unwrap().push((peer.id, text.to_string()));
        Ok(())
    }

    async fn recent_messages(&self, _peer: &Peer, limit: usize) -> ChatResult<Vec<Message>> {
        if self.failures.lock().unwrap().history {
            return Err(fault("history"));
        }
        self.history_limits.lock().unwrap().push(limit);
        let mut queue = self.histories.lock().unwrap();
        let snapshot = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        };
        Ok(snapshot.into_iter().take(limit).collect())
    }

    async fn click(&self, _peer: &Peer, message_id: i64, row: usize, column: usize) -> ChatResult<()> {
        if self.failures.lock().unwrap().click {
            return Err(fault("click"));
        }
        self.clicks.lock().unwrap().push(Click {
            message_id,
            row,
            column,
        });
        Ok(())
    }

    async fn me(&self) -> ChatResult<Peer> {
        if self.failures.lock().unwrap().me {
            return Err(fault("me"));
        }
        Ok(Peer::new(OPERATOR_ID))
    }
}

/// Configuration with zero delays pointing at `steps_file`
pub fn test_config(steps_file: PathBuf, max_attempts: u32) -> Config {
    Config {
        account: AccountSettings {
            api_id: 12345,
            api_hash: "0123456789abcdef".to_string(),
            phone_number: "+79990001122".to_string(),
            password: None,
        },
        target_bot: "@clinic_bot".to_string(),
        executor: ExecutorSettings::default()
            .step_delay(Duration::ZERO)
            .max_attempts(max_attempts)
            .restart_delay(Duration::ZERO),
        gateway: GatewaySettings::default(),
        steps_file,
    }
}

/// Date keyboard as the bot sends it after `/start`
pub fn date_keyboard(id: i64) -> Message {
    Message::with_keyboard(id, [vec!["12 June", "13 June"], vec!["Back"]])
}

/// Time keyboard as the bot sends it after a date was picked
pub fn time_keyboard(id: i64) -> Message {
    Message::with_keyboard(id, [vec!["Back"], vec!["14:00", "15:30"]])
}
