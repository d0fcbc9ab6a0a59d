use std::time::{Duration, Instant};

/// Token-bucket pacing for outbound calls (HTTP and LLM). Replaces the
/// fixed inter-call sleeps scattered through earlier versions of this
/// pipeline: stages ask the bucket for a token and the bucket decides how
/// long to wait, so pacing stays out of the business logic.
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: f64, refill_per_sec: f64) -> Self {
        TokenBucket {
            capacity,
            tokens: capacity,
            refill_per_sec,
            last_refill: Instant::now(),
        }
    }

    /// Take one token, or report how long to wait until one is available.
    pub fn try_take(&mut self, now: Instant) -> Option<Duration> {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            return None;
        }
        let missing = 1.0 - self.tokens;
        Some(Duration::from_secs_f64(missing / self.refill_per_sec))
    }

    /// Block (async) until a token is available, then consume it.
    pub async fn acquire(&mut self) {
        loop {
            match self.try_take(Instant::now()) {
                None => return,
                Some(wait) => tokio::time::sleep(wait).await,
            }
        }
    }
}
