use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct IdleReadTimer {
    timeout: Duration,
    last_progress: Instant,
}

impl IdleReadTimer {
    pub fn new(timeout: Duration) -> Self {
        Self::started_at(timeout, Instant::now())
    }

    pub fn started_at(timeout: Duration, now: Instant) -> Self {
        Self {
            timeout,
            last_progress: now,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn reset(&mut self, now: Instant) {
        self.last_progress = now;
    }

    pub fn deadline(&self) -> Instant {
        self.last_progress + self.timeout
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline().saturating_duration_since(now)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline()
    }
}
