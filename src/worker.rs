//! Identity, acknowledgement and pacing shared by producers and consumers.

use crate::shutdown::Shutdown;
use rand::Rng;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Producer,
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => f.write_str("producer"),
            Role::Consumer => f.write_str("consumer"),
        }
    }
}

/// Identifies a worker within one run, e.g. `producer-3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId {
    pub role: Role,
    pub index: usize,
}

impl WorkerId {
    pub fn producer(index: usize) -> Self {
        Self {
            role: Role::Producer,
            index,
        }
    }

    pub fn consumer(index: usize) -> Self {
        Self {
            role: Role::Consumer,
            index,
        }
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.role, self.index)
    }
}

/// A worker's acknowledgement that it observed shutdown and exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped {
    pub worker: WorkerId,
    /// Items produced or consumed, depending on the role.
    pub processed: usize,
}

/// Sleeps a random duration in `[0, bound)`, returning early if shutdown is raised.
///
/// Returns `false` when the pause was cut short by shutdown.
pub(crate) async fn pause(bound: Duration, shutdown: &Shutdown) -> bool {
    let delay = random_delay(bound);
    if delay.is_zero() {
        tokio::task::yield_now().await;
        return !shutdown.is_raised();
    }

    tokio::select! {
        biased;
        _ = shutdown.wait() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

fn random_delay(bound: Duration) -> Duration {
    let bound_ms = u64::try_from(bound.as_millis()).unwrap_or(u64::MAX);
    if bound_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..bound_ms))
}

/// A produced item, uniformly drawn from `[1, 100]`.
pub(crate) fn random_item() -> u32 {
    rand::thread_rng().gen_range(1..=100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Instant, timeout};

    #[test]
    fn test_worker_id_display() {
        assert_eq!(WorkerId::producer(3).to_string(), "producer-3");
        assert_eq!(WorkerId::consumer(0).to_string(), "consumer-0");
    }

    #[test]
    fn test_random_item_range() {
        for _ in 0..1_000 {
            let item = random_item();
            assert!((1..=100).contains(&item));
        }
    }

    #[test]
    fn test_random_delay_bounds() {
        assert_eq!(random_delay(Duration::ZERO), Duration::ZERO);
        for _ in 0..1_000 {
            assert!(random_delay(Duration::from_millis(10)) < Duration::from_millis(10));
        }
    }

    #[tokio::test]
    async fn test_pause_cut_short_by_shutdown() {
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let started = Instant::now();
        let completed = timeout(Duration::from_millis(500), pause(Duration::from_secs(60), &shutdown))
            .await
            .expect("pause should observe shutdown");

        assert!(!completed);
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_zero_pause_completes() {
        let shutdown = Shutdown::new();
        assert!(pause(Duration::ZERO, &shutdown).await);
    }
}
