//! The three I/O tasks a running client owns.
//!
//! Each loop `select!`s on the shutdown signal first, so a pending socket
//! read or timer wait is dropped as soon as the client stops. None of
//! them return an error: failures are logged, reported through the error
//! callback, and the loop carries on.

use std::net::SocketAddr;
use std::sync::Arc;

use rfidlink_protocol::{
    Codec, DeviceAnnouncement, ErrorMessage, JsonCodec, LOCAL_ERROR_CODE, Message, MessageType,
    RawFrame, error_message,
};
use rfidlink_queue::DequeueTimer;
use rfidlink_transport::{DatagramSocket, TransportError};
use tokio::sync::watch;
use tracing::{debug, error, trace, warn};

use crate::callbacks::{DiscoveryEvent, DiscoveryPayload, ErrorReport};
use crate::client::Shared;
use crate::config::DiscoveryFormat;

/// Reported when `verify_checksum` is on and a frame does not sum to zero.
pub const CHECKSUM_MISMATCH: &str = "Checksum mismatch";

/// Reported when a reply fills the whole receive buffer.
pub const OVERSIZED_DATAGRAM: &str = "Datagram exceeds receive buffer";

// ---------------------------------------------------------------------------
// Send
// ---------------------------------------------------------------------------

/// Drains the command queue onto the point-to-point socket.
pub(crate) async fn send_loop<S>(socket: S, shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>)
where
    S: DatagramSocket<Error = TransportError>,
{
    let mut timer = DequeueTimer::new(shared.config.dequeue_interval);
    debug!("send loop started");

    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            next = shared.queue.dequeue_or_wait(&mut timer) => next,
        };
        let Some(message) = next else {
            continue;
        };

        let frame = message.serialize(shared.config.device_address);
        let target = shared.endpoint();
        match socket.send_to(&frame, target).await {
            Ok(_) => {
                debug!(
                    %target,
                    name = message.name(),
                    cmd = format_args!("0x{:02X}", message.cmd_code()),
                    bytes = frame.len(),
                    "command sent"
                );
            }
            Err(e) => {
                error!(%target, name = message.name(), error = %e, "command send failed");
                shared
                    .callbacks
                    .notify_error(ErrorReport::new(LOCAL_ERROR_CODE, e.to_string()));
            }
        }
    }

    debug!("send loop stopped");
}

// ---------------------------------------------------------------------------
// Receive
// ---------------------------------------------------------------------------

/// Reads replies from the point-to-point socket and routes the ones that
/// come from the configured device.
pub(crate) async fn receive_loop<S>(
    socket: S,
    shared: Arc<Shared>,
    mut shutdown: watch::Receiver<bool>,
) where
    S: DatagramSocket<Error = TransportError>,
{
    let mut buf = vec![0u8; shared.config.recv_buffer_size];
    debug!("receive loop started");

    loop {
        let received = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            received = socket.recv_from(&mut buf) => received,
        };

        match received {
            Ok((len, source)) => {
                let expected = shared.endpoint();
                if source != expected {
                    trace!(%source, %expected, len, "datagram from unexpected source dropped");
                    continue;
                }
                if len == buf.len() {
                    warn!(len, "reply filled the receive buffer and may be truncated; dropped");
                    shared
                        .callbacks
                        .notify_error(ErrorReport::new(LOCAL_ERROR_CODE, OVERSIZED_DATAGRAM));
                    continue;
                }
                route_response(&shared, &buf[..len]);
            }
            Err(e) if e.is_peer_unreachable() => {
                warn!(error = %e, "device unreachable");
            }
            Err(e) => {
                error!(error = %e, "receive failed");
                shared
                    .callbacks
                    .notify_error(ErrorReport::new(LOCAL_ERROR_CODE, e.to_string()));
            }
        }
    }

    debug!("receive loop stopped");
}

/// Decodes one datagram from the device and hands it to the matching
/// callback.
pub(crate) fn route_response(shared: &Shared, data: &[u8]) {
    if shared.config.verify_checksum {
        if let Ok(raw) = RawFrame::parse(data) {
            if !raw.checksum_ok() {
                debug!(checksum = raw.checksum(), "frame with bad checksum dropped");
                shared
                    .callbacks
                    .notify_error(ErrorReport::new(LOCAL_ERROR_CODE, CHECKSUM_MISMATCH));
                return;
            }
        }
    }

    let message: Arc<dyn Message> = Arc::from(shared.registry.create_from_data(data));
    let message_type = message.message_type();
    trace!(
        name = message.name(),
        %message_type,
        cmd = format_args!("0x{:02X}", message.cmd_code()),
        "response decoded"
    );

    match message_type {
        MessageType::Return => shared.callbacks.notify_command(message),
        MessageType::Status => shared.callbacks.notify_status(message),
        MessageType::Error => {
            let (report, from_device) = match message.downcast_ref::<ErrorMessage>() {
                Some(err) => (ErrorReport::from(err), !err.is_local()),
                None => {
                    let code = message.cmd_code();
                    (ErrorReport::new(code, error_message(code)), true)
                }
            };
            debug!(code = report.code, description = %report.description, "error response");
            shared.callbacks.notify_error(report);
            if from_device && shared.config.forward_device_errors {
                shared.callbacks.notify_command(message);
            }
        }
        MessageType::Command | MessageType::Unknown => {
            debug!(
                name = message.name(),
                %message_type,
                "response type not routed; dropped"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Broadcast
// ---------------------------------------------------------------------------

/// Reads discovery broadcasts from any source.
pub(crate) async fn broadcast_loop<S>(
    socket: S,
    shared: Arc<Shared>,
    mut shutdown: watch::Receiver<bool>,
) where
    S: DatagramSocket<Error = TransportError>,
{
    let mut buf = vec![0u8; shared.config.recv_buffer_size];
    debug!(format = ?shared.config.discovery_format, "broadcast loop started");

    loop {
        let received = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            received = socket.recv_from(&mut buf) => received,
        };

        match received {
            Ok((len, source)) if len == buf.len() => {
                debug!(%source, len, "broadcast filled the receive buffer; dropped");
            }
            Ok((len, source)) => route_broadcast(&shared, source, &buf[..len]),
            Err(e) if e.is_peer_unreachable() => {
                trace!(error = %e, "ignoring unreachable report on discovery socket");
            }
            Err(e) => {
                error!(error = %e, "discovery receive failed");
                shared
                    .callbacks
                    .notify_error(ErrorReport::new(LOCAL_ERROR_CODE, e.to_string()));
            }
        }
    }

    debug!("broadcast loop stopped");
}

/// Decodes one discovery datagram according to the configured format and
/// delivers it to the broadcast callback.
pub(crate) fn route_broadcast(shared: &Shared, source: SocketAddr, data: &[u8]) {
    let payload = match shared.config.discovery_format {
        DiscoveryFormat::Json => match JsonCodec.decode::<DeviceAnnouncement>(data) {
            Ok(announcement) => DiscoveryPayload::Announcement(announcement),
            Err(e) => {
                debug!(%source, len = data.len(), error = %e, "discovery datagram is not an announcement");
                return;
            }
        },
        DiscoveryFormat::Framed => {
            let message = shared.registry.create_from_data(data);
            if message.message_type() != MessageType::Status {
                debug!(
                    %source,
                    name = message.name(),
                    message_type = %message.message_type(),
                    "discovery frame is not a status; dropped"
                );
                return;
            }
            DiscoveryPayload::Status(Arc::from(message))
        }
    };

    trace!(%source, "discovery event");
    shared
        .callbacks
        .notify_broadcast(DiscoveryEvent { source, payload });
}
