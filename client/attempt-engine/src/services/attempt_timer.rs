use chrono::{DateTime, Utc};
use futures::stream::{self, Stream};
use std::sync::Arc;
use std::time::Duration;

use crate::metrics::TIMERS_ACTIVE;
use crate::models::timer::{TimeExpired, TimerEvent, TimerTick};
use crate::utils::clock::Clock;

/// Remaining whole seconds for a total-quiz countdown. Derived from the
/// server's `started_at`, not from a fresh full countdown, so resuming an
/// in-progress attempt lands at the right value.
pub fn remaining_seconds(
    limit_seconds: u32,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> u32 {
    let elapsed = (now - started_at).num_seconds().max(0);
    (limit_seconds as i64 - elapsed).max(0) as u32
}

/// Which rapid question the wall clock says should be active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RapidPosition {
    Active {
        index: usize,
        remaining_seconds: u32,
    },
    Exhausted,
}

/// Walk the per-question time limits against total elapsed time. This is
/// the whole resume story for rapid mode: backgrounding the app cannot
/// stop the clock because the position is recomputed from wall time.
pub fn rapid_position(limits: &[u32], elapsed_seconds: u64) -> RapidPosition {
    let mut window_end = 0u64;
    for (index, limit) in limits.iter().enumerate() {
        window_end += u64::from(*limit);
        if elapsed_seconds < window_end {
            return RapidPosition::Active {
                index,
                remaining_seconds: (window_end - elapsed_seconds) as u32,
            };
        }
    }
    RapidPosition::Exhausted
}

/// Countdown event stream for a timed attempt: one tick per interval,
/// monotonically non-increasing, clamped at 0, then a single
/// `TimeExpired` and the stream ends. An already-expired attempt emits
/// expiry straight away.
pub fn countdown_stream(
    clock: Arc<dyn Clock>,
    attempt_id: String,
    limit_seconds: u32,
    started_at: DateTime<Utc>,
    tick_interval: Duration,
) -> impl Stream<Item = TimerEvent> {
    let initial_remaining = remaining_seconds(limit_seconds, started_at, clock.now());
    let initial_elapsed = limit_seconds - initial_remaining;

    stream::unfold(
        (clock, attempt_id, initial_elapsed, limit_seconds, false),
        move |(clock, attempt_id, elapsed, total, expired_sent)| async move {
            if expired_sent {
                return None;
            }

            if elapsed >= total {
                let event = TimerEvent::TimeExpired(TimeExpired {
                    attempt_id: attempt_id.clone(),
                    timestamp: clock.now(),
                    message: "Time limit exceeded".to_string(),
                });
                tracing::info!("Timer expired: attempt={}", attempt_id);
                return Some((event, (clock, attempt_id, elapsed, total, true)));
            }

            let event = TimerEvent::TimerTick(TimerTick {
                attempt_id: attempt_id.clone(),
                remaining_seconds: total.saturating_sub(elapsed),
                elapsed_seconds: elapsed,
                total_seconds: total,
                timestamp: clock.now(),
            });

            clock.sleep(tick_interval).await;

            Some((event, (clock, attempt_id, elapsed + 1, total, false)))
        },
    )
}

/// RAII handle for the active-timers gauge; decrements even when the
/// owning task is aborted.
pub(crate) struct ActiveTimerGuard;

impl ActiveTimerGuard {
    pub fn new() -> Self {
        TIMERS_ACTIVE.inc();
        Self
    }
}

impl Drop for ActiveTimerGuard {
    fn drop(&mut self) {
        TIMERS_ACTIVE.dec();
    }
}
