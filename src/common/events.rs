use super::types::ChatMessage;

/// Sự kiện từ tầng mạng gửi lên UI.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    /// At least one peer is reachable.
    Connected,
    /// The last peer connection closed.
    Disconnected,
    MessageReceived(ChatMessage),
    ViewerCount { stream_id: String, count: u64 },
    PeerConnected(String),
    PeerDisconnected(String),
}
