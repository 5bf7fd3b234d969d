use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Time source for the attempt engine. Everything that reads the wall clock
/// or sleeps goes through this trait so tests can drive time themselves.
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
    async fn sleep(&self, duration: Duration);
}

/// Production clock: real wall time, tokio timers.
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock whose wall time is anchored to tokio's monotonic clock. Under
/// `#[tokio::test(start_paused = true)]` both `now()` and `sleep()` follow
/// virtual time, which makes countdown behavior fully deterministic.
pub struct VirtualClock {
    wall_anchor: DateTime<Utc>,
    monotonic_anchor: tokio::time::Instant,
}

impl VirtualClock {
    pub fn new(wall_anchor: DateTime<Utc>) -> Self {
        Self {
            wall_anchor,
            monotonic_anchor: tokio::time::Instant::now(),
        }
    }
}

#[async_trait]
impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.monotonic_anchor.elapsed();
        self.wall_anchor
            + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero())
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
