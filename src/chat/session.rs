use std::collections::VecDeque;

use crate::common::{ChatMessage, NetworkEvent};
use crate::network::ChatTransport;

use super::Rejection;
use super::throttle::{SendDecision, ThrottleConfig, ThrottleGuard};
use super::ticker::CooldownTicker;

pub const DEFAULT_MAX_MESSAGES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// State of one mounted chat view: the room, its messages and the throttle.
pub struct ChatSession<T: ChatTransport> {
    transport: T,
    throttle_config: ThrottleConfig,
    display_name: String,
    max_messages: usize,
    stream_id: Option<String>,
    guard: ThrottleGuard,
    ticker: CooldownTicker,
    messages: VecDeque<ChatMessage>,
    /// The rejection behind the banner and its text.
    warning: Option<(Rejection, String)>,
    viewer_count: Option<u64>,
    connection: ConnectionState,
}

impl<T: ChatTransport> ChatSession<T> {
    pub fn new(transport: T, throttle_config: ThrottleConfig, display_name: impl Into<String>) -> Self {
        Self {
            transport,
            throttle_config,
            display_name: display_name.into(),
            max_messages: DEFAULT_MAX_MESSAGES,
            stream_id: None,
            guard: ThrottleGuard::new(throttle_config),
            ticker: CooldownTicker::new(),
            messages: VecDeque::new(),
            warning: None,
            viewer_count: None,
            connection: ConnectionState::Disconnected,
        }
    }

    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = max_messages.max(1);
        self
    }

    /// Opens the chat view for `stream_id`, replacing any mounted room.
    pub fn mount(&mut self, stream_id: &str) {
        if self.stream_id.as_deref() == Some(stream_id) {
            return;
        }
        if let Some(previous) = self.stream_id.take() {
            self.transport.leave_room(&previous);
            log::info!("Left chat for stream {previous}");
        }

        if !self.transport.is_connected() {
            match self.transport.connect() {
                Ok(()) => self.connection = ConnectionState::Connecting,
                Err(err) => {
                    log::error!("Failed to connect chat transport: {err}");
                    self.connection = ConnectionState::Disconnected;
                }
            }
        }

        self.transport.join_room(stream_id);
        self.stream_id = Some(stream_id.to_string());
        self.reset_view_state();
        log::info!("Mounted chat for stream {stream_id}");
    }

    /// Closes the chat view. Throttle state does not survive this.
    pub fn unmount(&mut self) {
        if let Some(stream_id) = self.stream_id.take() {
            self.transport.leave_room(&stream_id);
            log::info!("Unmounted chat for stream {stream_id}");
        }
        self.transport.disconnect();
        self.connection = ConnectionState::Disconnected;
        self.reset_view_state();
    }

    fn reset_view_state(&mut self) {
        self.guard = ThrottleGuard::new(self.throttle_config);
        self.ticker.stop();
        self.messages.clear();
        self.warning = None;
        self.viewer_count = None;
    }

    /// Runs the throttle on a user send action and forwards accepted text.
    pub fn attempt_send(&mut self, raw_text: &str, now_ms: u64) -> SendDecision {
        self.tick(now_ms);

        // No room mounted: the send control is disabled, same as blank input.
        let Some(stream_id) = self.stream_id.clone() else {
            log::warn!("Send attempted with no chat room mounted");
            return SendDecision::Rejected(Rejection::Empty);
        };

        let decision = self.guard.attempt_send(raw_text, now_ms);
        match &decision {
            SendDecision::Accepted(text) => {
                self.warning = None;
                self.ticker.start(now_ms);
                self.transport
                    .send_message(&stream_id, text, &self.display_name);
            }
            SendDecision::Rejected(rejection) => {
                log::debug!("Send rejected: {rejection:?}");
                if let Some(warning) = rejection.warning() {
                    self.warning = Some((*rejection, warning));
                }
            }
        }
        decision
    }

    /// Drives the cooldown ticker. Returns the remaining cooldown and clears
    /// a slow-mode banner once it reaches zero.
    pub fn tick(&mut self, now_ms: u64) -> u32 {
        self.ticker.poll(now_ms, &mut self.guard);
        let remaining = self.guard.cooldown_remaining();
        if remaining == 0
            && matches!(self.warning, Some((Rejection::SlowMode { .. }, _)))
        {
            self.warning = None;
        }
        remaining
    }

    /// When the next cooldown tick is due, if one is pending.
    pub fn next_tick_deadline(&self) -> Option<u64> {
        self.ticker.next_deadline()
    }

    /// A non-empty edit of the input dismisses the warning.
    pub fn on_input_changed(&mut self, input: &str) {
        if !input.is_empty() {
            self.warning = None;
        }
    }

    pub fn dismiss_warning(&mut self) {
        self.warning = None;
    }

    /// Drains transport events into the view state.
    pub fn poll_events(&mut self) -> Vec<NetworkEvent> {
        let mut drained = Vec::new();
        while let Some(event) = self.transport.poll_event() {
            self.apply_event(&event);
            drained.push(event);
        }
        drained
    }

    fn apply_event(&mut self, event: &NetworkEvent) {
        match event {
            NetworkEvent::Connected => self.connection = ConnectionState::Connected,
            NetworkEvent::Disconnected => {
                if self.transport.is_connected() {
                    self.connection = ConnectionState::Connecting;
                } else {
                    self.connection = ConnectionState::Disconnected;
                }
            }
            NetworkEvent::MessageReceived(message) => {
                if self.stream_id.as_deref() == Some(message.stream_id.as_str()) {
                    self.messages.push_back(message.clone());
                    while self.messages.len() > self.max_messages {
                        self.messages.pop_front();
                    }
                }
            }
            NetworkEvent::ViewerCount { stream_id, count } => {
                if self.stream_id.as_deref() == Some(stream_id.as_str()) {
                    self.viewer_count = Some(*count);
                }
            }
            NetworkEvent::PeerConnected(_) | NetworkEvent::PeerDisconnected(_) => {}
        }
    }

    /// Send control is enabled only for non-blank input outside cooldown.
    pub fn can_send(&self, input: &str) -> bool {
        self.stream_id.is_some() && !input.trim().is_empty() && self.guard.cooldown_remaining() == 0
    }

    pub fn input_placeholder(&self) -> String {
        match self.guard.cooldown_remaining() {
            0 => "Send a message...".to_string(),
            secs => format!("Slow mode: wait {secs}s..."),
        }
    }

    pub fn stream_id(&self) -> Option<&str> {
        self.stream_id.as_deref()
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    #[cfg(test)]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_ref().map(|(_, text)| text.as_str())
    }

    #[cfg(test)]
    pub fn cooldown_remaining(&self) -> u32 {
        self.guard.cooldown_remaining()
    }

    pub fn viewer_count(&self) -> Option<u64> {
        self.viewer_count
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::IncomingChatMessage;
    use crate::network::MockTransport;

    fn mounted() -> ChatSession<MockTransport> {
        let mut session = ChatSession::new(MockTransport::default(), ThrottleConfig::default(), "You");
        session.mount("stream-1");
        session
    }

    fn incoming(stream_id: &str, text: &str) -> NetworkEvent {
        let wire = IncomingChatMessage {
            user: Some("viewer".to_string()),
            message: Some(text.to_string()),
            ..IncomingChatMessage::default()
        };
        NetworkEvent::MessageReceived(wire.into_chat_message(stream_id))
    }

    #[test]
    fn mount_connects_and_joins() {
        let session = mounted();

        assert!(session.transport().is_connected());
        assert_eq!(session.transport().joined, vec!["stream-1".to_string()]);
        assert_eq!(session.connection(), ConnectionState::Connecting);
        assert_eq!(session.stream_id(), Some("stream-1"));
    }

    #[test]
    fn concrete_slow_mode_scenario() {
        let mut session = mounted();

        assert_eq!(
            session.attempt_send("hi", 0),
            SendDecision::Accepted("hi".to_string())
        );
        assert_eq!(session.cooldown_remaining(), 5);

        assert_eq!(
            session.attempt_send("hi", 1_000),
            SendDecision::Rejected(Rejection::Repeated)
        );
        assert_eq!(
            session.attempt_send("yo", 1_000),
            SendDecision::Rejected(Rejection::SlowMode { remaining_secs: 4 })
        );
        assert_eq!(session.warning(), Some("Slow mode active: wait 4s."));

        assert_eq!(
            session.attempt_send("yo", 6_000),
            SendDecision::Accepted("yo".to_string())
        );

        let sent = &session.transport().sent;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], ("stream-1".to_string(), "hi".to_string(), "You".to_string()));
        assert_eq!(sent[1].1, "yo");
    }

    #[test]
    fn blank_input_sets_no_warning_and_sends_nothing() {
        let mut session = mounted();

        assert_eq!(
            session.attempt_send("   ", 0),
            SendDecision::Rejected(Rejection::Empty)
        );
        assert_eq!(session.warning(), None);
        assert!(session.transport().sent.is_empty());
        assert!(!session.can_send("   "));
    }

    #[test]
    fn accepted_send_clears_previous_warning() {
        let mut session = mounted();
        session.attempt_send("a", 0);
        session.attempt_send("b", 500);
        assert!(session.warning().is_some());

        session.attempt_send("b", 5_000);
        assert_eq!(session.warning(), None);
    }

    #[test]
    fn editing_input_dismisses_warning() {
        let mut session = mounted();
        session.attempt_send("a", 0);
        session.attempt_send("a", 10);
        assert!(session.warning().is_some());

        session.on_input_changed("");
        assert!(session.warning().is_some());

        session.on_input_changed("a!");
        assert_eq!(session.warning(), None);
    }

    #[test]
    fn send_control_and_placeholder_follow_cooldown() {
        let mut session = mounted();
        assert!(session.can_send("hey"));
        assert_eq!(session.input_placeholder(), "Send a message...");

        session.attempt_send("hey", 0);
        assert!(!session.can_send("next"));
        assert_eq!(session.input_placeholder(), "Slow mode: wait 5s...");

        session.tick(2_000);
        assert_eq!(session.input_placeholder(), "Slow mode: wait 3s...");

        session.tick(5_000);
        assert!(session.can_send("next"));
        assert_eq!(session.next_tick_deadline(), None);
    }

    #[test]
    fn unmount_discards_throttle_state() {
        let mut session = mounted();
        session.attempt_send("hi", 0);

        session.unmount();
        assert!(!session.transport().is_connected());
        assert_eq!(session.transport().left, vec!["stream-1".to_string()]);

        session.mount("stream-1");
        assert_eq!(session.cooldown_remaining(), 0);
        assert_eq!(
            session.attempt_send("hi", 100),
            SendDecision::Accepted("hi".to_string())
        );
    }

    #[test]
    fn send_without_room_is_dropped() {
        let mut session = ChatSession::new(MockTransport::default(), ThrottleConfig::default(), "You");

        assert!(!session.attempt_send("hello", 0).is_accepted());
        assert!(session.transport().sent.is_empty());
    }

    #[test]
    fn events_for_other_rooms_are_ignored() {
        let mut session = mounted();
        session.transport_mut().push_event(NetworkEvent::Connected);
        session.transport_mut().push_event(incoming("stream-1", "hello"));
        session.transport_mut().push_event(incoming("stream-2", "elsewhere"));
        session.transport_mut().push_event(NetworkEvent::ViewerCount {
            stream_id: "stream-1".to_string(),
            count: 1_250,
        });
        session.transport_mut().push_event(NetworkEvent::ViewerCount {
            stream_id: "stream-2".to_string(),
            count: 9,
        });

        let drained = session.poll_events();

        assert_eq!(drained.len(), 5);
        assert_eq!(session.connection(), ConnectionState::Connected);
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.messages().next().unwrap().message, "hello");
        assert_eq!(session.viewer_count(), Some(1_250));
    }

    #[test]
    fn message_history_is_capped() {
        let mut session = ChatSession::new(MockTransport::default(), ThrottleConfig::default(), "You")
            .with_max_messages(3);
        session.mount("s");
        for i in 0..5 {
            session.transport_mut().push_event(incoming("s", &format!("m{i}")));
        }

        session.poll_events();

        let texts: Vec<_> = session.messages().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn switching_rooms_leaves_the_previous_one() {
        let mut session = mounted();
        session.mount("stream-2");

        assert_eq!(session.transport().left, vec!["stream-1".to_string()]);
        assert_eq!(
            session.transport().joined,
            vec!["stream-1".to_string(), "stream-2".to_string()]
        );
        assert_eq!(session.stream_id(), Some("stream-2"));
        assert!(session.transport().is_connected());
    }

    #[test]
    fn slow_mode_warning_clears_when_cooldown_ends() {
        let mut session = mounted();
        session.attempt_send("hi", 0);
        session.attempt_send("yo", 1_000);
        assert_eq!(session.warning(), Some("Slow mode active: wait 4s."));

        session.tick(3_000);
        assert!(session.warning().is_some());

        assert_eq!(session.tick(20_000), 0);
        assert_eq!(session.warning(), None);
    }

    #[test]
    fn repeat_warning_outlives_the_cooldown() {
        let mut session = mounted();
        session.attempt_send("hi", 0);
        session.attempt_send("hi", 1_000);

        assert_eq!(session.tick(20_000), 0);
        assert_eq!(session.warning(), Some("Do not repeat the same message."));
    }

    #[test]
    fn send_at_the_end_of_the_clock_does_not_overflow() {
        let mut session = mounted();

        assert!(session.attempt_send("x", u64::MAX).is_accepted());
        assert_eq!(session.next_tick_deadline(), Some(u64::MAX));
        assert_eq!(session.tick(u64::MAX), 4);
    }

    #[test]
    fn leaving_then_reopening_starts_fresh() {
        let mut session = mounted();
        session.attempt_send("hi", 0);
        assert!(!session.can_send("next"));

        session.unmount();
        assert_eq!(session.stream_id(), None);
        assert_eq!(session.next_tick_deadline(), None);
        assert!(!session.can_send("next"));

        session.mount("stream-1");
        assert!(session.transport().is_connected());
        assert_eq!(session.cooldown_remaining(), 0);
        assert!(session.can_send("hi"));
        assert!(session.attempt_send("hi", 1_000).is_accepted());
    }
}
