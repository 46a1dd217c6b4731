//! Tracing setup and the observer that renders run events as log lines.

use crate::event::{Event, Observer};
use std::fmt::Write as _;
use tracing::{debug, info, warn};

/// Initialize the tracing subscriber with timestamps.
///
/// `RUST_LOG` takes precedence; otherwise verbose runs log at `debug` and quiet
/// runs at `info`. Calling it twice is harmless: the second call is ignored.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default = if verbose { "sluice=debug" } else { "sluice=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .try_init();
}

/// Emits each [`Event`] through `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn observe(&self, event: &Event) {
        match event {
            Event::BufferInitialized {
                capacity,
                producers,
                consumers,
            } => info!(capacity, producers, consumers, "buffer initialized"),
            Event::WorkerStarted { worker } => {
                info!(worker = %worker, "worker started")
            }
            Event::ProduceAttempt {
                worker,
                value,
                free,
                capacity,
            } => debug!(worker = %worker, value, free, capacity, "producer waiting for a free slot"),
            Event::ItemProduced {
                op,
                worker,
                value,
                slot,
                before,
                after,
            } => debug!(
                op,
                worker = %worker,
                value,
                slot,
                before = %render(before),
                after = %render(after),
                "item produced"
            ),
            Event::ItemConsumed {
                op,
                worker,
                value,
                slot,
                before,
                after,
            } => debug!(
                op,
                worker = %worker,
                value,
                slot,
                before = %render(before),
                after = %render(after),
                "item consumed"
            ),
            Event::BufferFull {
                op,
                occupied,
                capacity,
            } => info!(op, occupied, capacity, "buffer full"),
            Event::BufferEmpty { op, capacity } => info!(op, capacity, "buffer empty"),
            Event::LastItemWarning { worker } => {
                warn!(worker = %worker, "last item in buffer")
            }
            Event::WorkerStopped { worker, processed } => {
                info!(worker = %worker, processed, "worker stopped")
            }
            Event::AllStopped {
                produced,
                consumed,
                remaining,
            } => info!(produced, consumed, remaining, "all workers stopped"),
        }
    }
}

/// Renders a buffer snapshot as `[12 _ 40]`, `_` marking an empty slot.
fn render(slots: &[Option<u32>]) -> String {
    let mut out = String::with_capacity(slots.len() * 4 + 2);
    out.push('[');
    for (i, slot) in slots.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        match slot {
            Some(value) => {
                let _ = write!(out, "{value}");
            }
            None => out.push('_'),
        }
    }
    out.push(']');
    out
}
