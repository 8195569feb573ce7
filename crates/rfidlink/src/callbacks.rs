//! Callback slots the I/O loops deliver into.

use std::fmt;
use std::net::SocketAddr;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rfidlink_protocol::{DeviceAnnouncement, ErrorMessage, Message};
use tracing::error;

/// Handler for decoded replies and statuses.
pub type MessageHandler = Box<dyn Fn(Arc<dyn Message>) + Send>;
/// Handler for discovery broadcasts.
pub type DiscoveryHandler = Box<dyn Fn(DiscoveryEvent) + Send>;
/// Handler for error reports.
pub type ErrorHandler = Box<dyn Fn(ErrorReport) + Send>;

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// An error delivered to the error callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Device error code, or `0xFF` for errors raised on this side.
    pub code: u8,
    pub description: String,
}

impl ErrorReport {
    pub fn new(code: u8, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }
}

impl From<&ErrorMessage> for ErrorReport {
    fn from(err: &ErrorMessage) -> Self {
        Self::new(err.code, err.description.clone())
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}: {}", self.code, self.description)
    }
}

/// What a discovery datagram carried.
#[derive(Debug, Clone)]
pub enum DiscoveryPayload {
    /// A bare JSON announcement.
    Announcement(DeviceAnnouncement),
    /// A framed Status message decoded through the registry.
    Status(Arc<dyn Message>),
}

/// A discovery datagram and the address it came from.
#[derive(Debug, Clone)]
pub struct DiscoveryEvent {
    pub source: SocketAddr,
    pub payload: DiscoveryPayload,
}

impl DiscoveryEvent {
    /// The announcement, if the payload was plain JSON.
    pub fn announcement(&self) -> Option<&DeviceAnnouncement> {
        match &self.payload {
            DiscoveryPayload::Announcement(a) => Some(a),
            DiscoveryPayload::Status(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// CallbackRouter
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Slots {
    command: Option<MessageHandler>,
    status: Option<MessageHandler>,
    broadcast: Option<DiscoveryHandler>,
    error: Option<ErrorHandler>,
}

/// Four independently replaceable handler slots behind one mutex.
///
/// Handlers run on the I/O task that produced the event while the mutex is
/// held, so they must return quickly and must not register handlers
/// themselves. An empty slot drops the event. A handler that panics loses
/// that one event; the panic is logged and the loop keeps running.
#[derive(Default)]
pub struct CallbackRouter {
    slots: Mutex<Slots>,
}

impl CallbackRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slots stay consistent even if the mutex was poisoned.
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn on_command(&self, handler: impl Fn(Arc<dyn Message>) + Send + 'static) {
        self.lock().command = Some(Box::new(handler));
    }

    pub fn on_status(&self, handler: impl Fn(Arc<dyn Message>) + Send + 'static) {
        self.lock().status = Some(Box::new(handler));
    }

    pub fn on_broadcast(&self, handler: impl Fn(DiscoveryEvent) + Send + 'static) {
        self.lock().broadcast = Some(Box::new(handler));
    }

    pub fn on_error(&self, handler: impl Fn(ErrorReport) + Send + 'static) {
        self.lock().error = Some(Box::new(handler));
    }

    /// Removes every handler.
    pub fn clear(&self) {
        *self.lock() = Slots::default();
    }

    pub(crate) fn notify_command(&self, message: Arc<dyn Message>) {
        if let Some(handler) = &self.lock().command {
            invoke("command", handler, message);
        }
    }

    pub(crate) fn notify_status(&self, message: Arc<dyn Message>) {
        if let Some(handler) = &self.lock().status {
            invoke("status", handler, message);
        }
    }

    pub(crate) fn notify_broadcast(&self, event: DiscoveryEvent) {
        if let Some(handler) = &self.lock().broadcast {
            invoke("broadcast", handler, event);
        }
    }

    pub(crate) fn notify_error(&self, report: ErrorReport) {
        if let Some(handler) = &self.lock().error {
            invoke("error", handler, report);
        }
    }
}

/// Runs one handler, containing a panic to this event.
fn invoke<A>(slot: &'static str, handler: &(dyn Fn(A) + Send), arg: A) {
    if catch_unwind(AssertUnwindSafe(|| handler(arg))).is_err() {
        error!(slot, "callback panicked; event dropped");
    }
}

impl fmt::Debug for CallbackRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.lock();
        f.debug_struct("CallbackRouter")
            .field("command", &slots.command.is_some())
            .field("status", &slots.status.is_some())
            .field("broadcast", &slots.broadcast.is_some())
            .field("error", &slots.error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rfidlink_protocol::{GetVersionNumberReply, StatusHeartbeat};

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let c = Arc::new(AtomicUsize::new(0));
        (Arc::clone(&c), c)
    }

    #[test]
    fn test_empty_slots_drop_events() {
        let router = CallbackRouter::new();
        router.notify_command(Arc::new(GetVersionNumberReply::default()));
        router.notify_error(ErrorReport::new(0xFF, "x"));
    }

    #[test]
    fn test_each_slot_is_independent() {
        let router = CallbackRouter::new();
        let (commands, seen_commands) = counter();
        let (statuses, seen_statuses) = counter();
        router.on_command(move |_| {
            commands.fetch_add(1, Ordering::SeqCst);
        });
        router.on_status(move |_| {
            statuses.fetch_add(1, Ordering::SeqCst);
        });

        router.notify_command(Arc::new(GetVersionNumberReply::default()));
        router.notify_status(Arc::new(StatusHeartbeat::default()));
        router.notify_status(Arc::new(StatusHeartbeat::default()));

        assert_eq!(seen_commands.load(Ordering::SeqCst), 1);
        assert_eq!(seen_statuses.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reregistering_replaces_handler() {
        let router = CallbackRouter::new();
        let (first, seen_first) = counter();
        let (second, seen_second) = counter();
        router.on_error(move |_| {
            first.fetch_add(1, Ordering::SeqCst);
        });
        router.on_error(move |_| {
            second.fetch_add(1, Ordering::SeqCst);
        });

        router.notify_error(ErrorReport::new(0x01, "x"));
        assert_eq!(seen_first.load(Ordering::SeqCst), 0);
        assert_eq!(seen_second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_removes_all() {
        let router = CallbackRouter::new();
        let (calls, seen) = counter();
        router.on_error(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        router.clear();
        router.notify_error(ErrorReport::new(0x01, "x"));
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert!(format!("{router:?}").contains("error: false"));
    }

    #[test]
    fn test_panicking_handler_is_contained() {
        let router = CallbackRouter::new();
        let (calls, seen) = counter();
        router.on_command(move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("handler failure");
            }
        });

        router.notify_command(Arc::new(GetVersionNumberReply::default()));
        router.notify_command(Arc::new(GetVersionNumberReply::default()));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert!(!router.slots.is_poisoned());
    }

    #[test]
    fn test_panicking_error_handler_leaves_other_slots() {
        let router = CallbackRouter::new();
        let (statuses, seen) = counter();
        router.on_error(|_| panic!("handler failure"));
        router.on_status(move |_| {
            statuses.fetch_add(1, Ordering::SeqCst);
        });

        router.notify_error(ErrorReport::new(0x01, "x"));
        router.notify_status(Arc::new(StatusHeartbeat::default()));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_report_from_message() {
        let report = ErrorReport::from(&ErrorMessage::local("Unknown Command Code"));
        assert_eq!(report.code, 0xFF);
        assert_eq!(report.to_string(), "0xFF: Unknown Command Code");
    }
}
