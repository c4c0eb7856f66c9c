//! Request pacing with a randomized minimum gap.

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

/// Keeps consecutive requests at least a random `[min, max]` apart.
pub struct RateLimiter {
    state: Mutex<RateLimiterState>,
}

struct RateLimiterState {
    last_request: Option<Instant>,
    min_delay: Duration,
    max_delay: Duration,
}

impl RateLimiter {
    /// Create a limiter; bounds are swapped if given in the wrong order.
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        let (min_delay, max_delay) = if min_delay <= max_delay {
            (min_delay, max_delay)
        } else {
            (max_delay, min_delay)
        };
        Self {
            state: Mutex::new(RateLimiterState {
                last_request: None,
                min_delay,
                max_delay,
            }),
        }
    }

    /// Wait until the next request may be issued.
    ///
    /// The first request goes out immediately; each later one waits for
    /// whatever remains of a freshly drawn gap since the previous request.
    pub async fn acquire(&self) {
        let wait = {
            let mut state = self.state.lock().await;
            let gap = draw_gap(state.min_delay, state.max_delay);
            let now = Instant::now();
            let wait = match state.last_request {
                Some(last) => gap.saturating_sub(now.duration_since(last)),
                None => Duration::ZERO,
            };
            state.last_request = Some(now + wait);
            wait
        };

        if !wait.is_zero() {
            debug!("Waiting {:.1}s before next request", wait.as_secs_f64());
            tokio::time::sleep(wait).await;
        }
    }
}

fn draw_gap(min: Duration, max: Duration) -> Duration {
    if min == max {
        return min;
    }
    let secs = rand::thread_rng().gen_range(min.as_secs_f64()..=max.as_secs_f64());
    Duration::from_secs_f64(secs)
}
