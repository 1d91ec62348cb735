//! Per-endpoint monotonic-time gate enforcing a minimum inter-request interval.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Serializes acquisitions so that no two successful `acquire()` calls on the
/// same gate are less than `interval` apart. A zero interval means no gate at
/// all (used for KEV, which is fetched once per scan and never rate-limited).
pub struct RateGate {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        RateGate {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Blocks the caller until at least `interval` has elapsed since the last
    /// successful acquisition on this gate, then stamps "now" as the last
    /// time. Always eventually returns; there is no failure mode.
    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }

        let mut last = self.last.lock().await;
        let now = Instant::now();
        if let Some(previous) = *last {
            let elapsed = now.duration_since(previous);
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn serializes_acquisitions_with_minimum_spacing() {
        let gate = Arc::new(RateGate::new(Duration::from_millis(40)));
        let start = Instant::now();

        let first = gate.clone();
        let second = gate.clone();

        first.acquire().await;
        tokio::join!(second.acquire());

        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn zero_interval_never_blocks() {
        let gate = RateGate::new(Duration::ZERO);
        let start = Instant::now();
        gate.acquire().await;
        gate.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(20));
    }
}
