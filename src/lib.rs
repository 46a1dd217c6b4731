//! `sluice` runs producers and consumers against one fixed-capacity ring buffer.
//!
//! Producers never overwrite an unread slot and consumers never read an empty one.
//! Two counting semaphores (`free` and `filled`) enforce the capacity bound, a
//! `Fence` serializes every buffer access, and a one-shot `Shutdown` signal ends
//! the run: every wait a worker performs races that signal.
//!
//! ```rust,ignore
//! let coordinator = sluice::Coordinator::new(&sluice::Config::default(), Arc::new(TracingObserver))?;
//! let report = coordinator.run().await;
//! assert_eq!(report.free + report.filled, report.capacity);
//! ```

mod config;
mod consumer;
mod context;
mod coordinator;
mod error;
mod event;
mod fence;
mod producer;
mod ring_buffer;
mod semaphore;
mod shutdown;
pub mod trace;
mod worker;

pub use crate::config::{Cadence, Config, Settings};
pub use crate::coordinator::{Coordinator, Report};
pub use crate::error::{ConfigError, ShutdownInProgress};
pub use crate::event::{Event, Observer, Silent};
pub use crate::fence::{Fence, Guard};
pub use crate::ring_buffer::RingBuffer;
pub use crate::semaphore::{CountingSemaphore, SlotSemaphores};
pub use crate::shutdown::Shutdown;
pub use crate::trace::TracingObserver;
pub use crate::worker::{Role, Stopped, WorkerId};
