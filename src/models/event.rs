//! Upstream Pusher wire types: the outer envelope, the chat message payload it
//! carries, and the control messages the client sends.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

/// Event name of a chat message on the upstream stream.
pub const CHAT_MESSAGE_EVENT: &str = "App\\Events\\ChatMessageEvent";
/// Keepalive probe sent by the upstream; answered with [`ClientMessage::Pong`].
pub const PING_EVENT: &str = "pusher:ping";

/// Badge type that marks a channel subscriber.
pub const SUBSCRIBER_BADGE: &str = "subscriber";

/// Outer frame received over the websocket.
///
/// `data` is kept raw: for chat messages it is a JSON string literal whose
/// contents are themselves JSON, so it is decoded in a second pass.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEnvelope {
    pub event: String,
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
    #[serde(default)]
    pub channel: Option<String>,
}

/// Decoded inner payload of a [`CHAT_MESSAGE_EVENT`].
///
/// Only `sender.slug` and the badge list drive rewards. Everything else is
/// optional and loosely typed so an odd value never costs a viewer a credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageEvent {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub chatroom_id: Option<serde_json::Value>,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    pub sender: Sender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sender {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// Display name only.
    #[serde(default)]
    pub username: Option<String>,
    /// Stable per-user key used for ledger lookups.
    pub slug: String,
    #[serde(default)]
    pub identity: Option<Identity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub badges: Vec<Badge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl Identity {
    /// Existence check only; badge order and duplicates do not matter.
    pub fn is_subscriber(&self) -> bool {
        self.badges.iter().any(|b| b.kind == SUBSCRIBER_BADGE)
    }
}

impl Sender {
    pub fn badges(&self) -> &[Badge] {
        self.identity.as_ref().map(|i| i.badges.as_slice()).unwrap_or_default()
    }

    /// A sender without identity has no badges, so is not a subscriber.
    pub fn is_subscriber(&self) -> bool {
        self.identity.as_ref().is_some_and(Identity::is_subscriber)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Badge>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Badge>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Messages the client sends to the upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ClientMessage {
    #[serde(rename = "pusher:subscribe")]
    Subscribe { data: SubscribePayload },
    #[serde(rename = "pusher:pong")]
    Pong { data: serde_json::Value },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribePayload {
    pub channel: String,
}

impl ClientMessage {
    /// Subscribe to the chat room of a chatroom id (`chatrooms.<id>.v2`).
    pub fn subscribe_chatroom(chatroom_id: &str) -> Self {
        ClientMessage::Subscribe {
            data: SubscribePayload {
                channel: chatroom_channel(chatroom_id),
            },
        }
    }

    pub fn pong() -> Self {
        ClientMessage::Pong {
            data: serde_json::json!({}),
        }
    }
}

pub fn chatroom_channel(chatroom_id: &str) -> String {
    format!("chatrooms.{}.v2", chatroom_id)
}
