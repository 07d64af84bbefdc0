use std::collections::VecDeque;
use std::error::Error;

use crate::common::NetworkEvent;

use super::ChatTransport;

/// In-memory transport recording what the chat view asked for.
#[derive(Debug, Default)]
pub struct MockTransport {
    pub connected: bool,
    pub joined: Vec<String>,
    pub left: Vec<String>,
    /// (stream_id, text, display_name)
    pub sent: Vec<(String, String, String)>,
    pub events: VecDeque<NetworkEvent>,
}

impl MockTransport {
    pub fn push_event(&mut self, event: NetworkEvent) {
        self.events.push_back(event);
    }
}

impl ChatTransport for MockTransport {
    fn connect(&mut self) -> Result<(), Box<dyn Error>> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn join_room(&mut self, stream_id: &str) {
        self.joined.push(stream_id.to_string());
    }

    fn leave_room(&mut self, stream_id: &str) {
        self.left.push(stream_id.to_string());
    }

    fn send_message(&mut self, stream_id: &str, text: &str, display_name: &str) {
        self.sent.push((
            stream_id.to_string(),
            text.to_string(),
            display_name.to_string(),
        ));
    }

    fn poll_event(&mut self) -> Option<NetworkEvent> {
        self.events.pop_front()
    }
}
