use super::throttle::ThrottleGuard;

pub const TICK_PERIOD_MS: u64 = 1_000;

/// 1 Hz countdown driving a guard's cooldown.
///
/// Deadline based: whoever owns the event loop calls [`CooldownTicker::poll`]
/// and every tick whose deadline has passed fires. It runs only while the
/// guard has cooldown left and is restarted by the next accepted send.
#[derive(Debug, Clone, Default)]
pub struct CooldownTicker {
    next_tick_at: Option<u64>,
}

impl CooldownTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now_ms: u64) {
        self.next_tick_at = Some(now_ms.saturating_add(TICK_PERIOD_MS));
    }

    pub fn stop(&mut self) {
        self.next_tick_at = None;
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.next_tick_at.is_some()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.next_tick_at
    }

    /// Fires due ticks against `guard`. Returns how many fired.
    pub fn poll(&mut self, now_ms: u64, guard: &mut ThrottleGuard) -> u32 {
        let mut fired = 0;
        while let Some(deadline) = self.next_tick_at {
            if guard.cooldown_remaining() == 0 {
                self.next_tick_at = None;
                break;
            }
            if deadline > now_ms {
                break;
            }

            guard.tick();
            fired += 1;
            let next = deadline.saturating_add(TICK_PERIOD_MS);
            self.next_tick_at = Some(next);
            // Clock exhausted: at most one tick per poll.
            if next == deadline {
                break;
            }
        }

        if guard.cooldown_remaining() == 0 {
            self.next_tick_at = None;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::throttle::SLOW_MODE_SECONDS;

    #[test]
    fn idle_ticker_does_nothing() {
        let mut ticker = CooldownTicker::new();
        let mut guard = ThrottleGuard::default();

        assert_eq!(ticker.poll(10_000, &mut guard), 0);
        assert!(!ticker.is_running());
    }

    #[test]
    fn fires_once_per_elapsed_second() {
        let mut ticker = CooldownTicker::new();
        let mut guard = ThrottleGuard::default();
        assert!(guard.attempt_send("hi", 0).is_accepted());
        ticker.start(0);

        assert_eq!(ticker.poll(999, &mut guard), 0);
        assert_eq!(guard.cooldown_remaining(), SLOW_MODE_SECONDS);

        assert_eq!(ticker.poll(1_000, &mut guard), 1);
        assert_eq!(guard.cooldown_remaining(), SLOW_MODE_SECONDS - 1);

        assert_eq!(ticker.poll(3_500, &mut guard), 2);
        assert_eq!(guard.cooldown_remaining(), SLOW_MODE_SECONDS - 3);
        assert_eq!(ticker.next_deadline(), Some(4_000));
    }

    #[test]
    fn stops_when_cooldown_reaches_zero() {
        let mut ticker = CooldownTicker::new();
        let mut guard = ThrottleGuard::default();
        assert!(guard.attempt_send("hi", 0).is_accepted());
        ticker.start(0);

        let fired = ticker.poll(60_000, &mut guard);

        assert_eq!(fired, SLOW_MODE_SECONDS);
        assert_eq!(guard.cooldown_remaining(), 0);
        assert!(!ticker.is_running());
    }

    #[test]
    fn restart_after_accepted_send() {
        let mut ticker = CooldownTicker::new();
        let mut guard = ThrottleGuard::default();
        assert!(guard.attempt_send("a", 0).is_accepted());
        ticker.start(0);
        ticker.poll(5_000, &mut guard);
        assert!(!ticker.is_running());

        assert!(guard.attempt_send("b", 7_000).is_accepted());
        ticker.start(7_000);
        assert_eq!(ticker.next_deadline(), Some(8_000));
        assert_eq!(ticker.poll(8_000, &mut guard), 1);
    }

    #[test]
    fn deadlines_saturate_at_the_end_of_the_clock() {
        let mut ticker = CooldownTicker::new();
        let mut guard = ThrottleGuard::default();
        assert!(guard.attempt_send("hi", u64::MAX).is_accepted());
        ticker.start(u64::MAX);
        assert_eq!(ticker.next_deadline(), Some(u64::MAX));

        assert_eq!(ticker.poll(u64::MAX, &mut guard), 1);
        assert_eq!(guard.cooldown_remaining(), SLOW_MODE_SECONDS - 1);
        assert_eq!(ticker.next_deadline(), Some(u64::MAX));
    }
}
