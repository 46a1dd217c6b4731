//! The producer worker: turns `free` units into `filled` ones by writing items.
//!
//! Each iteration checks the shutdown signal, draws an item, waits for a free
//! slot (racing shutdown), writes under the buffer lock, hands a `filled` unit to
//! the consumers, then pauses. Shutdown observed at any wait point ends the
//! worker before it touches the buffer, so no half-finished write is ever left
//! behind.

use crate::context::Context;
use crate::error::ShutdownInProgress;
use crate::event::Event;
use crate::worker::{Stopped, WorkerId, pause, random_item};
use std::sync::Arc;

pub(crate) async fn run(ctx: Arc<Context>, worker: WorkerId) -> Stopped {
    ctx.emit(Event::WorkerStarted { worker });
    let mut produced = 0;

    while !ctx.shutdown.is_raised() {
        let value = random_item();

        if ctx.verbose() {
            ctx.emit(Event::ProduceAttempt {
                worker,
                value,
                free: ctx.slots.free.available(),
                capacity: ctx.slots.free.capacity(),
            });
        }

        if let Err(ShutdownInProgress) = ctx.slots.free.acquire(&ctx.shutdown).await {
            break;
        }

        put(&ctx, worker, value).await;
        produced += 1;
        ctx.slots.filled.release();

        if !pause(ctx.settings.cadence.produce_delay, &ctx.shutdown).await {
            break;
        }
    }

    ctx.emit(Event::WorkerStopped {
        worker,
        processed: produced,
    });
    Stopped {
        worker,
        processed: produced,
    }
}

/// Writes `value` and reports it. The full check shares the critical section with
/// the write, so it cannot observe a stale buffer.
async fn put(ctx: &Context, worker: WorkerId, value: u32) {
    let verbose = ctx.verbose();

    ctx.buffer
        .with_lock(|ledger| {
            let op = ledger.next_op();
            let before = verbose.then(|| ledger.ring.snapshot());
            let slot = ledger.ring.write(value);

            if let Some(before) = before {
                ctx.emit(Event::ItemProduced {
                    op,
                    worker,
                    value,
                    slot,
                    before,
                    after: ledger.ring.snapshot(),
                });
            }

            if ledger.ring.is_full() {
                ctx.emit(Event::BufferFull {
                    op,
                    occupied: ledger.ring.len(),
                    capacity: ledger.ring.capacity(),
                });
            }
        })
        .await;
}
