//! Client-side chat throttling: slow mode, burst detection and repeat
//! suppression.
//!
//! This is advisory UX policy for a single chat view. It is not an abuse
//! control: any client can publish on the topic directly.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const SLOW_MODE_SECONDS: u32 = 5;
pub const SPAM_WINDOW_MS: u64 = 10_000;
pub const SPAM_MAX_MSGS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    #[serde(default = "default_slow_mode_seconds")]
    pub slow_mode_seconds: u32,
    #[serde(default = "default_spam_window_ms")]
    pub spam_window_ms: u64,
    #[serde(default = "default_spam_max_msgs")]
    pub spam_max_msgs: usize,
}

fn default_slow_mode_seconds() -> u32 {
    SLOW_MODE_SECONDS
}

fn default_spam_window_ms() -> u64 {
    SPAM_WINDOW_MS
}

fn default_spam_max_msgs() -> usize {
    SPAM_MAX_MSGS
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            slow_mode_seconds: SLOW_MODE_SECONDS,
            spam_window_ms: SPAM_WINDOW_MS,
            spam_max_msgs: SPAM_MAX_MSGS,
        }
    }
}

/// Why a send attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Nothing but whitespace. The send control is simply disabled.
    Empty,
    SlowMode { remaining_secs: u32 },
    TooFast,
    Repeated,
}

impl Rejection {
    /// Text for the transient warning banner, if the rejection shows one.
    pub fn warning(&self) -> Option<String> {
        match self {
            Rejection::Empty => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "Message is empty."),
            Rejection::SlowMode { remaining_secs } => {
                write!(f, "Slow mode active: wait {remaining_secs}s.")
            }
            Rejection::TooFast => write!(f, "You are sending messages too fast. Wait a few seconds."),
            Rejection::Repeated => write!(f, "Do not repeat the same message."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendDecision {
    /// Carries the trimmed text to forward.
    Accepted(String),
    Rejected(Rejection),
}

impl SendDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SendDecision::Accepted(_))
    }
}

/// Per-session throttle state. Created empty when a chat view mounts.
#[derive(Debug, Clone)]
pub struct ThrottleGuard {
    config: ThrottleConfig,
    sent_at: VecDeque<u64>,
    last_sent: Option<String>,
    cooldown_remaining: u32,
}

impl ThrottleGuard {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            sent_at: VecDeque::with_capacity(config.spam_max_msgs),
            last_sent: None,
            cooldown_remaining: 0,
        }
    }

    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown_remaining
    }

    #[cfg(test)]
    pub fn last_sent(&self) -> Option<&str> {
        self.last_sent.as_deref()
    }

    /// Sends currently counted in the trailing window.
    #[cfg(test)]
    pub fn window_len(&self) -> usize {
        self.sent_at.len()
    }

    /// Decides whether `raw_text` may be sent at `now_ms`. Only an accepted
    /// attempt changes state (besides trimming expired window entries).
    pub fn attempt_send(&mut self, raw_text: &str, now_ms: u64) -> SendDecision {
        let text = raw_text.trim();
        if text.is_empty() {
            return SendDecision::Rejected(Rejection::Empty);
        }

        if self.last_sent.as_deref() == Some(text) {
            return SendDecision::Rejected(Rejection::Repeated);
        }

        if self.cooldown_remaining > 0 {
            return SendDecision::Rejected(Rejection::SlowMode {
                remaining_secs: self.cooldown_remaining,
            });
        }

        self.trim_window(now_ms);
        if self.sent_at.len() >= self.config.spam_max_msgs {
            return SendDecision::Rejected(Rejection::TooFast);
        }

        self.sent_at.push_back(now_ms);
        self.last_sent = Some(text.to_string());
        self.cooldown_remaining = self.config.slow_mode_seconds;

        SendDecision::Accepted(text.to_string())
    }

    /// One cooldown tick. Returns the remaining seconds.
    pub fn tick(&mut self) -> u32 {
        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);
        self.cooldown_remaining
    }

    fn trim_window(&mut self, now_ms: u64) {
        while let Some(&oldest) = self.sent_at.front() {
            if now_ms.saturating_sub(oldest) >= self.config.spam_window_ms {
                self.sent_at.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for ThrottleGuard {
    fn default() -> Self {
        Self::new(ThrottleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_slow_mode() -> ThrottleConfig {
        ThrottleConfig {
            slow_mode_seconds: 0,
            ..ThrottleConfig::default()
        }
    }

    fn drain_cooldown(guard: &mut ThrottleGuard) {
        while guard.cooldown_remaining() > 0 {
            guard.tick();
        }
    }

    #[test]
    fn whitespace_is_rejected_without_touching_state() {
        let mut guard = ThrottleGuard::default();

        for input in ["", " ", "\t\n", "   \r\n  "] {
            let decision = guard.attempt_send(input, 0);
            assert_eq!(decision, SendDecision::Rejected(Rejection::Empty));
            assert_eq!(Rejection::Empty.warning(), None);
        }

        assert_eq!(guard.cooldown_remaining(), 0);
        assert_eq!(guard.window_len(), 0);
        assert_eq!(guard.last_sent(), None);
    }

    #[test]
    fn accepted_send_updates_all_state() {
        let mut guard = ThrottleGuard::default();

        let decision = guard.attempt_send("  hello  ", 1_000);

        assert_eq!(decision, SendDecision::Accepted("hello".to_string()));
        assert_eq!(guard.cooldown_remaining(), SLOW_MODE_SECONDS);
        assert_eq!(guard.window_len(), 1);
        assert_eq!(guard.last_sent(), Some("hello"));
    }

    #[test]
    fn identical_resend_reports_repeat_regardless_of_cooldown() {
        let mut guard = ThrottleGuard::default();
        assert!(guard.attempt_send("gg", 0).is_accepted());

        assert_eq!(
            guard.attempt_send("gg ", 100),
            SendDecision::Rejected(Rejection::Repeated)
        );

        drain_cooldown(&mut guard);
        assert_eq!(
            guard.attempt_send("gg", 60_000),
            SendDecision::Rejected(Rejection::Repeated)
        );
    }

    #[test]
    fn distinct_send_during_cooldown_reports_remaining_seconds() {
        let mut guard = ThrottleGuard::default();
        assert!(guard.attempt_send("first", 0).is_accepted());
        guard.tick();
        guard.tick();

        let decision = guard.attempt_send("second", 2_000);

        assert_eq!(
            decision,
            SendDecision::Rejected(Rejection::SlowMode { remaining_secs: 3 })
        );
        assert_eq!(guard.last_sent(), Some("first"));
        assert_eq!(guard.window_len(), 1);
    }

    #[test]
    fn burst_over_limit_is_rejected_inside_window() {
        let mut guard = ThrottleGuard::new(no_slow_mode());

        for i in 0..SPAM_MAX_MSGS {
            let decision = guard.attempt_send(&format!("msg {i}"), i as u64 * 1_000);
            assert!(decision.is_accepted(), "send {i} should pass");
        }

        assert_eq!(
            guard.attempt_send("one more", 5_000),
            SendDecision::Rejected(Rejection::TooFast)
        );
        assert_eq!(guard.window_len(), SPAM_MAX_MSGS);
    }

    #[test]
    fn burst_limit_with_ticked_cooldown() {
        let mut guard = ThrottleGuard::default();

        for i in 0..SPAM_MAX_MSGS {
            drain_cooldown(&mut guard);
            assert!(guard.attempt_send(&format!("line {i}"), i as u64 * 100).is_accepted());
        }
        drain_cooldown(&mut guard);

        assert_eq!(
            guard.attempt_send("line 5", 600),
            SendDecision::Rejected(Rejection::TooFast)
        );
    }

    #[test]
    fn expired_entries_leave_the_window() {
        let mut guard = ThrottleGuard::new(no_slow_mode());
        for i in 0..SPAM_MAX_MSGS {
            assert!(guard.attempt_send(&format!("m{i}"), i as u64).is_accepted());
        }

        let after_window = SPAM_MAX_MSGS as u64 + SPAM_WINDOW_MS;
        assert!(guard.attempt_send("sixth", after_window).is_accepted());
        assert_eq!(guard.window_len(), 1);
    }

    #[test]
    fn entry_exactly_window_old_is_dropped() {
        let mut guard = ThrottleGuard::new(ThrottleConfig {
            slow_mode_seconds: 0,
            spam_window_ms: 10_000,
            spam_max_msgs: 1,
        });
        assert!(guard.attempt_send("a", 0).is_accepted());
        assert_eq!(
            guard.attempt_send("b", 9_999),
            SendDecision::Rejected(Rejection::TooFast)
        );
        assert!(guard.attempt_send("b", 10_000).is_accepted());
    }

    #[test]
    fn clock_going_backwards_keeps_entries() {
        let mut guard = ThrottleGuard::new(ThrottleConfig {
            slow_mode_seconds: 0,
            spam_window_ms: 1_000,
            spam_max_msgs: 1,
        });
        assert!(guard.attempt_send("a", 50_000).is_accepted());
        assert_eq!(
            guard.attempt_send("b", 10_000),
            SendDecision::Rejected(Rejection::TooFast)
        );
    }

    #[test]
    fn tick_never_goes_below_zero() {
        let mut guard = ThrottleGuard::default();
        assert_eq!(guard.tick(), 0);
        assert!(guard.attempt_send("x", 0).is_accepted());
        for _ in 0..10 {
            guard.tick();
        }
        assert_eq!(guard.cooldown_remaining(), 0);
    }

    #[test]
    fn warnings_are_human_readable() {
        assert_eq!(
            Rejection::SlowMode { remaining_secs: 4 }.warning().as_deref(),
            Some("Slow mode active: wait 4s.")
        );
        assert!(Rejection::TooFast.warning().unwrap().contains("too fast"));
        assert!(Rejection::Repeated.warning().unwrap().contains("repeat"));
    }

    #[test]
    fn config_fields_default_when_missing() {
        let config: ThrottleConfig = serde_json::from_str(r#"{"spam_max_msgs": 3}"#).unwrap();
        assert_eq!(config.spam_max_msgs, 3);
        assert_eq!(config.slow_mode_seconds, SLOW_MODE_SECONDS);
        assert_eq!(config.spam_window_ms, SPAM_WINDOW_MS);
    }
}
