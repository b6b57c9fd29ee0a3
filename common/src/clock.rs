use std::ops::Add;
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;

    /// Microseconds since the Unix epoch. Times before the epoch read as 0.
    fn now_micros(&self) -> i64 {
        self.now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0)
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A manually driven clock for tests.
#[derive(Debug)]
pub struct MockClock {
    now: RwLock<SystemTime>,
}

impl Clock for MockClock {
    fn now(&self) -> SystemTime {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl MockClock {
    pub fn with_time(time: SystemTime) -> Self {
        Self {
            now: RwLock::new(time),
        }
    }

    pub fn new() -> Self {
        Self::with_time(SystemTime::now())
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now = now.add(duration);
    }

    pub fn rewind(&self, duration: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now = now.checked_sub(duration).unwrap_or(UNIX_EPOCH);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_report_micros_since_epoch() {
        // given
        let clock = MockClock::with_time(UNIX_EPOCH + Duration::from_millis(1_500));

        // when
        let micros = clock.now_micros();

        // then
        assert_eq!(micros, 1_500_000);
    }

    #[test]
    fn should_advance_and_rewind() {
        // given
        let clock = MockClock::with_time(UNIX_EPOCH + Duration::from_secs(10));

        // when
        clock.advance(Duration::from_secs(5));
        clock.rewind(Duration::from_secs(20));

        // then - rewinding past the epoch saturates
        assert_eq!(clock.now(), UNIX_EPOCH);
        assert_eq!(clock.now_micros(), 0);
    }
}
