use std::sync::{Arc, Mutex, PoisonError};

use tokio::time::Instant;

/// Process-wide record of the most recent user input. The input side calls
/// `record` on every keystroke or pointer event; the tick loop reads
/// `idle_seconds` to drive the no-camera fallback.
#[derive(Clone)]
pub struct InteractionTracker {
    last: Arc<Mutex<Instant>>,
}

impl InteractionTracker {
    pub fn new() -> Self {
        Self {
            last: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn record(&self) {
        let mut guard = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Instant::now();
    }

    pub fn idle_seconds(&self) -> f64 {
        let guard = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        guard.elapsed().as_secs_f64()
    }
}

impl Default for InteractionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, Duration};

    #[tokio::test(start_paused = true)]
    async fn idle_time_grows_until_next_interaction() {
        let tracker = InteractionTracker::new();
        assert!(tracker.idle_seconds() < 1.0);

        advance(Duration::from_secs(45)).await;
        assert!(tracker.idle_seconds() >= 45.0);

        tracker.record();
        assert!(tracker.idle_seconds() < 1.0);
    }
}
