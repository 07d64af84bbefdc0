use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Color applied to messages this client publishes.
pub const OUTGOING_COLOR: &str = "#9f4bff";
const DEFAULT_COLOR: &str = "#ffffff";
const UNKNOWN_USER: &str = "Unknown";

/// Badge shown next to a chatter's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    Founder,
    Mod,
    Vip,
    Sub,
}

impl Badge {
    pub fn label(self) -> &'static str {
        match self {
            Badge::Founder => "FOUNDER",
            Badge::Mod => "MOD",
            Badge::Vip => "VIP",
            Badge::Sub => "SUB",
        }
    }
}

/// A chat line as rendered by the chat view.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub stream_id: String,
    pub user: String,
    pub message: String,
    pub color: String,
    pub badge: Option<Badge>,
    pub timestamp: DateTime<Utc>,
}

/// Payload published on a chat topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingChatMessage {
    pub user: String,
    pub message: String,
    pub timestamp: String,
    pub color: String,
}

impl OutgoingChatMessage {
    pub fn new(user: &str, message: &str) -> Self {
        Self {
            user: user.to_string(),
            message: message.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            color: OUTGOING_COLOR.to_string(),
        }
    }
}

/// Payload received on a chat topic. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomingChatMessage {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_badge")]
    pub badge: Option<Badge>,
}

impl IncomingChatMessage {
    /// Turns a wire record into a chat line, stamped with the receive time.
    pub fn into_chat_message(self, stream_id: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4().to_string(),
            stream_id: stream_id.to_string(),
            user: non_empty_or(self.user, UNKNOWN_USER),
            message: self.message.unwrap_or_default(),
            color: non_empty_or(self.color, DEFAULT_COLOR),
            badge: self.badge,
            timestamp: Utc::now(),
        }
    }
}

impl From<&OutgoingChatMessage> for IncomingChatMessage {
    fn from(outgoing: &OutgoingChatMessage) -> Self {
        Self {
            user: Some(outgoing.user.clone()),
            message: Some(outgoing.message.clone()),
            color: Some(outgoing.color.clone()),
            badge: None,
        }
    }
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(value) if !value.is_empty() => value,
        _ => fallback.to_string(),
    }
}

// Unknown badge names are dropped instead of failing the whole message.
fn lenient_badge<'de, D>(deserializer: D) -> Result<Option<Badge>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value::<Badge>(value).ok()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewerCountBody {
    viewer_count: f64,
}

/// Parses a viewer-count publication. Accepts `123`, `{"viewerCount": 123}`
/// or a bare numeric string.
pub fn parse_viewer_count(body: &[u8]) -> Option<u64> {
    if body.is_empty() {
        return Some(0);
    }

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        return match value {
            serde_json::Value::Number(n) => n.as_f64().map(clamp_count),
            serde_json::Value::Object(_) => serde_json::from_value::<ViewerCountBody>(value)
                .ok()
                .map(|body| clamp_count(body.viewer_count)),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok().map(clamp_count),
            _ => None,
        };
    }

    std::str::from_utf8(body)
        .ok()
        .and_then(|text| text.trim().parse::<f64>().ok())
        .map(clamp_count)
}

fn clamp_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

/// Live stream as listed by the directory API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub viewer_count: u64,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub user: Option<StreamOwner>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub started_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamOwner {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub viewer_count: u64,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}
