//! Bounded outbound command queue for rfidlink.
//!
//! Producers are application threads calling `send_command`; the single
//! consumer is the client's send loop. Two rules shape the API:
//!
//! - **Producers never block.** [`CommandQueue::try_enqueue`] hands the
//!   item back when the queue is full instead of waiting for room.
//! - **The consumer never parks indefinitely.** When the queue is empty,
//!   [`CommandQueue::dequeue_or_wait`] waits one [`DequeueTimer`] period
//!   and returns, so the send loop regularly gets a chance to observe a
//!   shutdown request.
//!
//! # Integration
//!
//! ```ignore
//! let mut timer = DequeueTimer::new(Duration::from_millis(100));
//! loop {
//!     tokio::select! {
//!         biased;
//!         _ = shutdown.changed() => break,
//!         next = queue.dequeue_or_wait(&mut timer) => {
//!             if let Some(command) = next { /* transmit */ }
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use crossbeam_queue::ArrayQueue;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::trace;

/// Capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 10;

/// Period used when none is configured.
pub const DEFAULT_DEQUEUE_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// A fixed-capacity FIFO shared between many producers and one consumer.
///
/// Backed by a lock-free [`ArrayQueue`]; no operation blocks.
#[derive(Debug)]
pub struct CommandQueue<T> {
    items: ArrayQueue<T>,
}

impl<T> CommandQueue<T> {
    /// Creates an empty queue. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: ArrayQueue::new(capacity.max(1)),
        }
    }

    /// Appends `item` if there is room.
    ///
    /// # Errors
    /// Returns the item unchanged when the queue already holds
    /// [`capacity`](Self::capacity) items.
    pub fn try_enqueue(&self, item: T) -> Result<(), T> {
        self.items.push(item)?;
        trace!(len = self.items.len(), "command enqueued");
        Ok(())
    }

    /// Removes the oldest item, if any.
    pub fn try_dequeue(&self) -> Option<T> {
        self.items.pop()
    }

    /// Removes the oldest item, or waits one timer period and returns
    /// `None` if the queue is empty.
    ///
    /// Cancel-safe: an item is only ever removed on the path that returns
    /// it without awaiting.
    pub async fn dequeue_or_wait(&self, timer: &mut DequeueTimer) -> Option<T> {
        if let Some(item) = self.try_dequeue() {
            return Some(item);
        }
        timer.wait().await;
        None
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }
}

impl<T> Default for CommandQueue<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// DequeueTimer
// ---------------------------------------------------------------------------

/// The recurring wait the send loop falls back to when the queue is empty.
///
/// Wraps a Tokio [`Interval`] with [`MissedTickBehavior::Delay`]: if the
/// loop was busy transmitting for longer than a period, the next wait is
/// a full period from now rather than a burst of immediate ticks.
#[derive(Debug)]
pub struct DequeueTimer {
    interval: Interval,
    period: Duration,
}

impl DequeueTimer {
    /// Creates a timer whose first wait lasts a full `period`.
    ///
    /// Zero periods are raised to one millisecond.
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval, period }
    }

    /// Waits until the next period boundary.
    pub async fn wait(&mut self) {
        self.interval.tick().await;
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for DequeueTimer {
    fn default() -> Self {
        Self::new(DEFAULT_DEQUEUE_INTERVAL)
    }
}
