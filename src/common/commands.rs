/// Lệnh UI gửi xuống tầng mạng.
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Subscribe to the chat and viewer-count topics of a stream.
    JoinRoom { stream_id: String },
    LeaveRoom { stream_id: String },
    /// Publish a chat line. Fire-and-forget: no acknowledgement comes back.
    SendMessage {
        stream_id: String,
        text: String,
        display_name: String,
    },
    /// Connect to a peer manually by address
    /// - address: Multiaddr của peer (ví dụ: /ip4/192.168.1.1/tcp/9000/p2p/12D3KooW...)
    ConnectToPeer { address: String },
}
