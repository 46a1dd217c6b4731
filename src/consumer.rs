//! The consumer worker: turns `filled` units back into `free` ones by reading items.
//!
//! Mirror image of the producer. Before each wait it peeks at the `filled` count and
//! warns when only one item appears to be left; that peek is unguarded and may be
//! stale by the time the wait resolves, which is acceptable for a warning. The
//! authoritative empty check happens under the buffer lock together with the read.

use crate::context::Context;
use crate::error::ShutdownInProgress;
use crate::event::Event;
use crate::worker::{Stopped, WorkerId, pause};
use std::sync::Arc;

pub(crate) async fn run(ctx: Arc<Context>, worker: WorkerId) -> Stopped {
    ctx.emit(Event::WorkerStarted { worker });
    let mut consumed = 0;

    while !ctx.shutdown.is_raised() {
        if ctx.slots.filled.available() == 1 {
            ctx.emit(Event::LastItemWarning { worker });
        }

        if let Err(ShutdownInProgress) = ctx.slots.filled.acquire(&ctx.shutdown).await {
            break;
        }

        take(&ctx, worker).await;
        consumed += 1;
        ctx.slots.free.release();

        if !pause(ctx.settings.cadence.consume_delay, &ctx.shutdown).await {
            break;
        }
    }

    ctx.emit(Event::WorkerStopped {
        worker,
        processed: consumed,
    });
    Stopped {
        worker,
        processed: consumed,
    }
}

async fn take(ctx: &Context, worker: WorkerId) -> u32 {
    let verbose = ctx.verbose();

    ctx.buffer
        .with_lock(|ledger| {
            let op = ledger.next_op();
            let before = verbose.then(|| ledger.ring.snapshot());
            let (slot, value) = ledger.ring.read();

            if let Some(before) = before {
                ctx.emit(Event::ItemConsumed {
                    op,
                    worker,
                    value,
                    slot,
                    before,
                    after: ledger.ring.snapshot(),
                });
            }

            if ledger.ring.is_empty() {
                ctx.emit(Event::BufferEmpty {
                    op,
                    capacity: ledger.ring.capacity(),
                });
            }

            value
        })
        .await
}
