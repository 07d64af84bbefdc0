use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

use crate::common::{Category, NetworkEvent, Stream};

const MAX_DEBUG_EVENTS: usize = 100;

/// Debug event để hiển thị thông tin mạng
#[derive(Debug, Clone)]
pub struct DebugEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub peer_id: Option<String>,
    pub message: String,
}

/// Trạng thái cục bộ của UI (everything except the chat session itself).
pub struct AppState {
    pub input_text: String,
    pub show_emojis: bool,
    pub peer_address_input: String,
    pub streams: Vec<Stream>,
    pub streams_loading: bool,
    pub categories: Vec<Category>,
    pub category_filter: Option<String>,
    pub current_stream: Option<Stream>,
    pub peers: Vec<String>,
    pub peer_last_seen: HashMap<String, DateTime<Utc>>,
    pub debug_events: VecDeque<DebugEvent>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            input_text: String::new(),
            show_emojis: false,
            peer_address_input: String::new(),
            streams: Vec::new(),
            streams_loading: false,
            categories: Vec::new(),
            category_filter: None,
            current_stream: None,
            peers: Vec::new(),
            peer_last_seen: HashMap::new(),
            debug_events: VecDeque::new(),
        }
    }

    /// Streams matching the selected category.
    pub fn visible_streams(&self) -> impl Iterator<Item = &Stream> {
        self.streams.iter().filter(|stream| match &self.category_filter {
            Some(category) => stream.category.eq_ignore_ascii_case(category),
            None => true,
        })
    }

    /// Records what the network reported; chat content is the session's job.
    pub fn observe(&mut self, event: &NetworkEvent) {
        match event {
            NetworkEvent::Connected => {
                self.add_debug_event("CONNECTED", None, "Transport connected".to_string());
            }
            NetworkEvent::Disconnected => {
                self.add_debug_event("DISCONNECTED", None, "All peers gone".to_string());
            }
            NetworkEvent::PeerConnected(peer_id) => self.add_peer(peer_id.clone()),
            NetworkEvent::PeerDisconnected(peer_id) => self.remove_peer(peer_id),
            NetworkEvent::ViewerCount { stream_id, count } => {
                if let Some(stream) = self.streams.iter_mut().find(|s| &s.id == stream_id) {
                    stream.viewer_count = *count;
                }
            }
            NetworkEvent::MessageReceived(_) => {}
        }
    }

    pub fn add_peer(&mut self, peer_id: String) {
        let now = Utc::now();
        let is_new = !self.peers.iter().any(|peer| peer == &peer_id);
        if is_new {
            self.peers.push(peer_id.clone());
        }
        self.peer_last_seen.insert(peer_id.clone(), now);

        if is_new {
            self.add_debug_event(
                "PEER_CONNECTED",
                Some(peer_id),
                format!("Peer connected at {}", now.format("%H:%M:%S")),
            );
        }
    }

    pub fn remove_peer(&mut self, peer_id: &str) {
        let now = Utc::now();
        if !self.peers.iter().any(|peer| peer == peer_id) {
            return;
        }
        self.peers.retain(|peer| peer != peer_id);

        let duration_msg = match self.peer_last_seen.get(peer_id) {
            Some(last_seen) => format!(
                " (was online for {:.1}s)",
                now.signed_duration_since(*last_seen).num_milliseconds() as f64 / 1000.0
            ),
            None => String::new(),
        };
        self.add_debug_event(
            "PEER_DISCONNECTED",
            Some(peer_id.to_string()),
            format!("Peer disconnected at {}{}", now.format("%H:%M:%S"), duration_msg),
        );
    }

    pub fn add_debug_event(&mut self, event_type: &str, peer_id: Option<String>, message: String) {
        self.debug_events.push_back(DebugEvent {
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            peer_id,
            message,
        });

        while self.debug_events.len() > MAX_DEBUG_EVENTS {
            self.debug_events.pop_front();
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
