use std::sync::Arc;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

use crate::util::env::env_parse;

/// Jitter multiplies the sampled delay by a factor in this range.
pub const JITTER_RANGE: (f64, f64) = (0.7, 1.3);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingSettings {
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(3_000),
            max_delay: Duration::from_millis(7_000),
        }
    }
}

impl PacingSettings {
    pub fn from_env(min_key: &str, max_key: &str, default_min_ms: u64, default_max_ms: u64) -> Self {
        let min_ms: u64 = env_parse(min_key, default_min_ms);
        let max_ms: u64 = env_parse(max_key, default_max_ms).max(min_ms);
        Self {
            min_delay: Duration::from_millis(min_ms),
            max_delay: Duration::from_millis(max_ms),
        }
    }

    pub fn disabled() -> Self {
        Self {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

/// How long to hold the next request, given the time since the previous one.
///
/// Nothing once `min_delay` has already elapsed; otherwise the larger of the
/// remainder and a jittered sample from `[min_delay, max_delay]`.
pub fn pacing_delay<R: Rng + ?Sized>(
    elapsed: Duration,
    settings: &PacingSettings,
    rng: &mut R,
) -> Option<Duration> {
    if elapsed >= settings.min_delay {
        return None;
    }
    let remainder = settings.min_delay - elapsed;
    let min = settings.min_delay.as_secs_f64();
    let max = settings.max_delay.as_secs_f64().max(min);
    let base = if max > min { rng.gen_range(min..=max) } else { min };
    let jitter = rng.gen_range(JITTER_RANGE.0..=JITTER_RANGE.1);
    let sampled = Duration::from_secs_f64(base * jitter);
    Some(remainder.max(sampled))
}

/// Shared gate in front of every outbound request of one fetcher.
#[derive(Clone, Debug)]
pub struct PacingGate {
    settings: PacingSettings,
    last: Arc<Mutex<Option<Instant>>>,
}

impl PacingGate {
    pub fn new(settings: PacingSettings) -> Self {
        Self {
            settings,
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns once the next request may go out. The first call never waits.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let delay = pacing_delay(prev.elapsed(), &self.settings, &mut rand::thread_rng());
            if let Some(delay) = delay {
                debug!(delay_ms = delay.as_millis() as u64, "pacing: holding request");
                sleep(delay).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn settings(min_ms: u64, max_ms: u64) -> PacingSettings {
        PacingSettings {
            min_delay: Duration::from_millis(min_ms),
            max_delay: Duration::from_millis(max_ms),
        }
    }

    #[test]
    fn no_delay_once_minimum_elapsed() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = settings(3_000, 7_000);
        assert_eq!(pacing_delay(Duration::from_secs(3), &s, &mut rng), None);
        assert_eq!(pacing_delay(Duration::from_secs(10), &s, &mut rng), None);
    }

    #[test]
    fn delay_is_bounded_by_remainder_and_jittered_max() {
        let mut rng = StdRng::seed_from_u64(9);
        let s = settings(3_000, 7_000);
        for _ in 0..500 {
            let elapsed = Duration::from_millis(rng.gen_range(0..3_000));
            let delay = pacing_delay(elapsed, &s, &mut rng).expect("inside window");
            assert!(delay >= Duration::from_millis(3_000) - elapsed);
            assert!(delay <= Duration::from_secs_f64(7.0 * JITTER_RANGE.1 + 0.001));
        }
    }

    #[tokio::test]
    async fn gate_sleeps_between_requests_but_not_before_first() {
        let gate = PacingGate::new(settings(60, 80));

        let start = Instant::now();
        gate.wait().await;
        assert!(start.elapsed() < Duration::from_millis(40));

        let start = Instant::now();
        gate.wait().await;
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(42),
            "expected a paced wait, got {elapsed:?}"
        );
    }
}
