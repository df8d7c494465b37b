use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SUBSCRIBE: &str = "pusher:subscribe";
pub const UNSUBSCRIBE: &str = "pusher:unsubscribe";
pub const PING: &str = "pusher:ping";
pub const PONG: &str = "pusher:pong";
pub const CONNECTION_ESTABLISHED: &str = "pusher:connection_established";

/// A single frame on the channel socket, in either direction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChannelFrame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl ChannelFrame {
    pub fn subscribe(channel: &str) -> Self {
        Self::control(SUBSCRIBE, serde_json::json!({ "channel": channel }))
    }

    pub fn unsubscribe(channel: &str) -> Self {
        Self::control(UNSUBSCRIBE, serde_json::json!({ "channel": channel }))
    }

    pub fn pong() -> Self {
        Self::control(PONG, serde_json::json!({}))
    }

    fn control(event: &str, data: Value) -> Self {
        Self {
            event: event.to_owned(),
            channel: None,
            data,
        }
    }

    /// Payload with string-encoded JSON unwrapped.
    pub fn payload(&self) -> Value {
        match &self.data {
            Value::String(raw) => serde_json::from_str(raw).unwrap_or_else(|_| self.data.clone()),
            other => other.clone(),
        }
    }

    pub fn is_system(&self) -> bool {
        self.event.starts_with("pusher:") || self.event.starts_with("pusher_internal:")
    }
}
