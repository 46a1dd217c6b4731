//! Orchestration of one run: allocate, spawn, arm the timer, wait, report.

use crate::config::{Config, Settings};
use crate::context::Context;
use crate::error::ConfigError;
use crate::event::{Event, Observer};
use crate::shutdown::Shutdown;
use crate::worker::{Role, Stopped, WorkerId};
use crate::{consumer, producer};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::info;

/// Final state of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// One entry per producer, ordered by index.
    pub producers: Vec<Stopped>,
    /// One entry per consumer, ordered by index.
    pub consumers: Vec<Stopped>,
    pub capacity: usize,
    /// Items written but never read.
    pub remaining: usize,
    pub free: usize,
    pub filled: usize,
    pub operations: u64,
}

impl Report {
    pub fn produced(&self) -> usize {
        self.producers.iter().map(|s| s.processed).sum()
    }

    pub fn consumed(&self) -> usize {
        self.consumers.iter().map(|s| s.processed).sum()
    }
}

/// Spawns the producers and consumers of one run and waits for all of them.
pub struct Coordinator {
    ctx: Arc<Context>,
}

impl Coordinator {
    /// Validates `config` and allocates the shared buffer. Nothing is spawned yet.
    pub fn new(config: &Config, observer: Arc<dyn Observer>) -> Result<Self, ConfigError> {
        let settings = config.validate()?;
        Ok(Self {
            ctx: Arc::new(Context::new(settings, observer)),
        })
    }

    /// A handle that raises the run's shutdown signal, for signal handlers and the like.
    pub fn shutdown(&self) -> Shutdown {
        self.ctx.shutdown.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.ctx.settings
    }

    /// Runs until the shutdown signal is raised, either by the run-duration timer or
    /// through a [`Shutdown`] handle, and every worker has stopped.
    ///
    /// # Panics
    ///
    /// Re-raises the panic of any worker. Workers only panic on a violated buffer
    /// invariant.
    pub async fn run(self) -> Report {
        let ctx = self.ctx;
        let settings = &ctx.settings;

        ctx.emit(Event::BufferInitialized {
            capacity: settings.capacity,
            producers: settings.producers,
            consumers: settings.consumers,
        });

        let mut workers = JoinSet::new();
        for index in 0..settings.producers {
            workers.spawn(producer::run(ctx.clone(), WorkerId::producer(index)));
        }
        for index in 0..settings.consumers {
            workers.spawn(consumer::run(ctx.clone(), WorkerId::consumer(index)));
        }

        let timer = tokio::spawn(deadline(ctx.shutdown.clone(), settings.run_duration));

        let mut producers = Vec::with_capacity(settings.producers);
        let mut consumers = Vec::with_capacity(settings.consumers);
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(stopped) => match stopped.worker.role {
                    Role::Producer => producers.push(stopped),
                    Role::Consumer => consumers.push(stopped),
                },
                Err(err) if err.is_panic() => {
                    ctx.shutdown.trigger();
                    std::panic::resume_unwind(err.into_panic());
                }
                Err(_) => {}
            }
        }

        // Workers only return after shutdown, so the timer has already finished.
        timer.abort();

        producers.sort_by_key(|s| s.worker);
        consumers.sort_by_key(|s| s.worker);

        let (remaining, operations) = ctx
            .buffer
            .with_lock(|ledger| (ledger.ring.len(), ledger.operations))
            .await;

        let report = Report {
            producers,
            consumers,
            capacity: settings.capacity,
            remaining,
            free: ctx.slots.free.available(),
            filled: ctx.slots.filled.available(),
            operations,
        };

        ctx.emit(Event::AllStopped {
            produced: report.produced(),
            consumed: report.consumed(),
            remaining,
        });
        report
    }
}

/// Raises `shutdown` once `duration` elapses, unless it was raised earlier.
async fn deadline(shutdown: Shutdown, duration: std::time::Duration) {
    tokio::select! {
        _ = shutdown.wait() => {}
        _ = tokio::time::sleep(duration) => {
            if shutdown.trigger() {
                info!(secs = duration.as_secs(), "run duration elapsed, shutting down");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cadence;
    use crate::event::Silent;
    use crate::event::testing::Recorder;
    use std::time::Duration;
    use tokio::time::{Instant, timeout};

    fn config(producers: i64, consumers: i64, capacity: i64, run_secs: i64) -> Config {
        Config {
            producers,
            consumers,
            capacity,
            run_duration_secs: run_secs,
            verbose: true,
            cadence: Cadence {
                produce_delay: Duration::from_millis(5),
                consume_delay: Duration::from_millis(5),
            },
        }
    }

    #[test]
    fn test_rejects_bad_config_before_spawning() {
        let observer: Arc<dyn Observer> = Arc::new(Silent);

        let err = Coordinator::new(&config(1, 1, 0, 1), observer.clone()).err();
        assert_eq!(err, Some(ConfigError::Capacity(0)));

        let err = Coordinator::new(&config(0, 1, 5, 1), observer.clone()).err();
        assert_eq!(err, Some(ConfigError::Producers(0)));

        let err = Coordinator::new(&config(1, -1, 5, 1), observer).err();
        assert_eq!(err, Some(ConfigError::Consumers(-1)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_external_shutdown_ends_run() {
        let recorder = Arc::new(Recorder::default());
        let coordinator = Coordinator::new(&config(2, 2, 3, 60), recorder.clone()).unwrap();
        let shutdown = coordinator.shutdown();

        let started = Instant::now();
        let run = tokio::spawn(coordinator.run());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(shutdown.trigger());

        let report = timeout(Duration::from_secs(2), run)
            .await
            .expect("run should end soon after shutdown")
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));

        assert_eq!(report.producers.len(), 2);
        assert_eq!(report.consumers.len(), 2);
        assert_eq!(report.free + report.filled, report.capacity);
        assert_eq!(report.filled, report.remaining);
        assert_eq!(report.produced() - report.consumed(), report.remaining);
        assert_eq!(report.operations as usize, report.produced() + report.consumed());

        let events = recorder.events();
        assert!(matches!(
            events.first(),
            Some(Event::BufferInitialized { capacity: 3, producers: 2, consumers: 2 })
        ));
        assert!(matches!(events.last(), Some(Event::AllStopped { .. })));
        assert_eq!(recorder.count(|e| matches!(e, Event::WorkerStarted { .. })), 4);
        assert_eq!(recorder.count(|e| matches!(e, Event::WorkerStopped { .. })), 4);
    }

    // Replays the item events of a real run in operation order and checks that every
    // slot alternates write, read, write, ... with each read returning the value the
    // previous write left there.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_real_workers_alternate_per_slot() {
        let recorder = Arc::new(Recorder::default());
        let mut cfg = config(3, 2, 3, 60);
        cfg.cadence = Cadence {
            produce_delay: Duration::from_millis(1),
            consume_delay: Duration::from_millis(2),
        };
        let coordinator = Coordinator::new(&cfg, recorder.clone()).unwrap();
        let shutdown = coordinator.shutdown();

        let run = tokio::spawn(coordinator.run());
        tokio::time::sleep(Duration::from_millis(300)).await;
        shutdown.trigger();
        let report = timeout(Duration::from_secs(2), run).await.unwrap().unwrap();

        let mut ops = recorder
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::ItemProduced {
                    op,
                    value,
                    slot,
                    before,
                    ..
                } => Some((op, true, slot, value, before[slot])),
                Event::ItemConsumed {
                    op,
                    value,
                    slot,
                    before,
                    ..
                } => Some((op, false, slot, value, before[slot])),
                _ => None,
            })
            .collect::<Vec<_>>();
        ops.sort_by_key(|&(op, ..)| op);

        // Every operation is reported exactly once, numbered without gaps
        let numbers = ops.iter().map(|&(op, ..)| op).collect::<Vec<_>>();
        assert_eq!(numbers, (1..=report.operations).collect::<Vec<_>>());

        let mut slots = vec![None; report.capacity];
        let (mut writes, mut reads) = (0, 0);
        for (op, is_write, slot, value, before) in ops {
            assert_eq!(before, slots[slot], "op {op}: snapshot disagrees with replay");
            if is_write {
                assert_eq!(slots[slot], None, "op {op}: overwrite of slot {slot}");
                slots[slot] = Some(value);
                writes += 1;
            } else {
                assert_eq!(slots[slot], Some(value), "op {op}: bad read of slot {slot}");
                slots[slot] = None;
                reads += 1;
            }
        }

        assert!(reads > 0, "nothing was consumed");
        assert_eq!(writes, report.produced());
        assert_eq!(reads, report.consumed());
        assert_eq!(slots.iter().filter(|s| s.is_some()).count(), report.remaining);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_deadline_raises_shutdown() {
        let coordinator = Coordinator::new(&config(1, 1, 2, 1), Arc::new(Silent)).unwrap();
        let shutdown = coordinator.shutdown();

        let report = timeout(Duration::from_secs(3), coordinator.run())
            .await
            .expect("run should end after its one second budget");

        assert!(shutdown.is_raised());
        assert_eq!(report.producers[0].worker, WorkerId::producer(0));
        assert_eq!(report.consumers[0].worker, WorkerId::consumer(0));
    }
}
