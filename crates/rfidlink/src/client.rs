//! `ReaderClient` builder and lifecycle.
//!
//! A client owns one point-to-point socket for commands and replies and,
//! when the discovery port can be bound, one broadcast socket. While
//! running, three tasks drive them (see [`crate::loops`]).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use rfidlink_protocol::{LOCAL_ERROR_CODE, Message, MessageType, ProtocolError, RawFrame};
use rfidlink_queue::CommandQueue;
use rfidlink_registry::MessageRegistry;
use rfidlink_transport::{TransportError, UdpChannel, parse_endpoint};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::callbacks::{CallbackRouter, DiscoveryEvent, ErrorReport};
use crate::config::ClientConfig;
use crate::loops::{broadcast_loop, receive_loop, send_loop};
use crate::RfidlinkError;

/// State shared between the client handle and its I/O tasks.
pub(crate) struct Shared {
    pub(crate) config: ClientConfig,
    pub(crate) registry: Arc<MessageRegistry>,
    pub(crate) queue: CommandQueue<Arc<dyn Message>>,
    pub(crate) callbacks: CallbackRouter,
    endpoint: RwLock<SocketAddr>,
}

impl Shared {
    pub(crate) fn new(
        config: ClientConfig,
        registry: Arc<MessageRegistry>,
        endpoint: SocketAddr,
    ) -> Self {
        Self {
            queue: CommandQueue::new(config.queue_capacity),
            config,
            registry,
            callbacks: CallbackRouter::new(),
            endpoint: RwLock::new(endpoint),
        }
    }

    /// The device the loops talk to.
    pub(crate) fn endpoint(&self) -> SocketAddr {
        *self.endpoint.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_endpoint(&self, endpoint: SocketAddr) {
        *self.endpoint.write().unwrap_or_else(PoisonError::into_inner) = endpoint;
    }
}

/// Handles of a started client. Dropping it drops the shutdown sender,
/// which ends every loop.
struct Running {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    local_addr: SocketAddr,
    discovery_addr: Option<SocketAddr>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for a [`ReaderClient`].
///
/// # Example
///
/// ```rust,no_run
/// use rfidlink::prelude::*;
///
/// # async fn run() -> Result<(), RfidlinkError> {
/// let client = ReaderClient::builder()
///     .server("192.168.1.100", 1969)
///     .build()?;
/// client.on_command(|reply| println!("{reply:?}"));
/// client.start().await?;
/// client.send(GetVersionNumber::default());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ReaderClientBuilder {
    config: ClientConfig,
    registry: Option<Arc<MessageRegistry>>,
}

impl ReaderClientBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the device address.
    pub fn server(mut self, ip: &str, port: u16) -> Self {
        self.config.server_ip = ip.to_string();
        self.config.server_port = port;
        self
    }

    /// Sets the local port devices broadcast to. 0 picks any free port.
    pub fn discovery_port(mut self, port: u16) -> Self {
        self.config.discovery_port = port;
        self
    }

    /// Decodes replies with `registry` instead of the built-in catalogue.
    pub fn registry(mut self, registry: Arc<MessageRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validates the configuration and creates a stopped client.
    ///
    /// # Errors
    /// [`RfidlinkError::Transport`] if the server address is not a valid
    /// IP address and port.
    pub fn build(self) -> Result<ReaderClient, RfidlinkError> {
        let config = self.config.validated();
        let endpoint = parse_endpoint(&config.server_ip, u32::from(config.server_port))?;
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(MessageRegistry::builtin()));

        debug!(%endpoint, kinds = registry.len(), "reader client built");
        Ok(ReaderClient {
            shared: Arc::new(Shared::new(config, registry, endpoint)),
            lifecycle: Mutex::new(None),
            running: AtomicBool::new(false),
        })
    }
}

// ---------------------------------------------------------------------------
// ReaderClient
// ---------------------------------------------------------------------------

/// Asynchronous UDP client for one reader.
///
/// Commands are queued by [`send_command`](Self::send_command) and written
/// by a background task; replies, statuses, errors and discovery
/// broadcasts arrive through the callbacks. The client must be started
/// from within a Tokio runtime.
pub struct ReaderClient {
    shared: Arc<Shared>,
    /// Serializes start, stop and restart.
    lifecycle: Mutex<Option<Running>>,
    running: AtomicBool,
}

impl ReaderClient {
    /// Creates a new builder.
    pub fn builder() -> ReaderClientBuilder {
        ReaderClientBuilder::new()
    }

    /// Opens the sockets and spawns the I/O tasks.
    ///
    /// Does nothing if the client is already running. If the discovery
    /// socket cannot be bound the client still starts, without discovery.
    ///
    /// # Errors
    /// Fails, and stays stopped, if the point-to-point socket cannot be
    /// bound. The failure is also reported through the error callback.
    pub async fn start(&self) -> Result<(), RfidlinkError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.is_some() {
            debug!("start ignored; client already running");
            return Ok(());
        }
        self.launch(&mut lifecycle).await
    }

    /// Signals the I/O tasks to stop and waits for them to finish.
    ///
    /// Idempotent. Commands still queued stay queued and are sent after
    /// the next start.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        self.shutdown(&mut lifecycle).await;
    }

    /// Stops the client if it is running, then starts it.
    ///
    /// # Errors
    /// See [`start`](Self::start).
    pub async fn restart(&self) -> Result<(), RfidlinkError> {
        let mut lifecycle = self.lifecycle.lock().await;
        self.shutdown(&mut lifecycle).await;
        self.launch(&mut lifecycle).await
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Points the client at another device.
    ///
    /// The address must parse as an IP address and the port must be in
    /// 1–65535. A running client is restarted so its sockets are rebound;
    /// a stopped one stays stopped.
    ///
    /// # Errors
    /// [`TransportError::InvalidAddress`] or [`TransportError::InvalidPort`]
    /// leave the current endpoint in place and do not restart anything.
    /// A failing restart is reported as in [`start`](Self::start).
    pub async fn set_server_endpoint(&self, ip: &str, port: u32) -> Result<(), RfidlinkError> {
        let endpoint = match parse_endpoint(ip, port) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                error!(
                    ip,
                    port,
                    current = %self.shared.endpoint(),
                    error = %e,
                    "endpoint rejected; keeping the current one"
                );
                return Err(e.into());
            }
        };

        let mut lifecycle = self.lifecycle.lock().await;
        self.shared.set_endpoint(endpoint);
        info!(%endpoint, "server endpoint changed");

        if lifecycle.is_some() {
            self.shutdown(&mut lifecycle).await;
            self.launch(&mut lifecycle).await?;
        }
        Ok(())
    }

    /// The device the client talks to.
    pub fn server_endpoint(&self) -> SocketAddr {
        self.shared.endpoint()
    }

    /// Queues a command for sending.
    ///
    /// Fire-and-forget: if the client is stopped or the queue is full the
    /// command is dropped with a warning.
    pub fn send_command(&self, message: Arc<dyn Message>) {
        if !self.is_running() {
            warn!(name = message.name(), "client is stopped; command dropped");
            return;
        }
        if let Err(rejected) = self.shared.queue.try_enqueue(message) {
            warn!(
                name = rejected.name(),
                capacity = self.shared.queue.capacity(),
                "command queue full; command dropped"
            );
        }
    }

    /// Queues a typed command. See [`send_command`](Self::send_command).
    pub fn send<M: Message>(&self, message: M) {
        self.send_command(Arc::new(message));
    }

    /// Queues a command given as a complete wire frame.
    ///
    /// The frame is decoded through the registry and encoded again on
    /// send, so its address byte is replaced by `device_address` and its
    /// checksum is recomputed. Once decoded, the command is queued as by
    /// [`send_command`](Self::send_command).
    ///
    /// # Errors
    /// [`ProtocolError`] if `frame` is shorter than a frame, is not a
    /// Command frame, names an unregistered command code, or carries
    /// parameters that do not decode.
    pub fn send_frame(&self, frame: &[u8]) -> Result<(), RfidlinkError> {
        let raw = RawFrame::parse(frame)?;
        if raw.message_type() != MessageType::Command {
            return Err(ProtocolError::InvalidMessage(format!(
                "header 0x{:02X} is not a command frame",
                raw.header()
            ))
            .into());
        }
        let mut message = self
            .shared
            .registry
            .create(raw.cmd_code(), MessageType::Command)
            .ok_or_else(|| {
                ProtocolError::InvalidMessage(format!(
                    "command 0x{:02X} is not registered",
                    raw.cmd_code()
                ))
            })?;
        message.deserialize_parameters(raw.params())?;
        self.send_command(Arc::from(message));
        Ok(())
    }

    /// Number of commands waiting to be sent.
    pub fn pending_commands(&self) -> usize {
        self.shared.queue.len()
    }

    /// Local address of the point-to-point socket.
    ///
    /// # Errors
    /// [`TransportError::Shutdown`] while the client is stopped.
    pub async fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.lifecycle
            .lock()
            .await
            .as_ref()
            .map(|running| running.local_addr)
            .ok_or(TransportError::Shutdown)
    }

    /// Local address of the discovery socket, or `None` if the client is
    /// stopped or running without discovery.
    pub async fn discovery_addr(&self) -> Option<SocketAddr> {
        self.lifecycle
            .lock()
            .await
            .as_ref()
            .and_then(|running| running.discovery_addr)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    pub fn registry(&self) -> &MessageRegistry {
        &self.shared.registry
    }

    pub fn callbacks(&self) -> &CallbackRouter {
        &self.shared.callbacks
    }

    /// Sets the handler for Return messages (and device errors, unless
    /// `forward_device_errors` is off).
    pub fn on_command(&self, handler: impl Fn(Arc<dyn Message>) + Send + 'static) {
        self.shared.callbacks.on_command(handler);
    }

    /// Sets the handler for Status messages.
    pub fn on_status(&self, handler: impl Fn(Arc<dyn Message>) + Send + 'static) {
        self.shared.callbacks.on_status(handler);
    }

    /// Sets the handler for discovery broadcasts.
    pub fn on_broadcast(&self, handler: impl Fn(DiscoveryEvent) + Send + 'static) {
        self.shared.callbacks.on_broadcast(handler);
    }

    /// Sets the handler for device and transport errors.
    pub fn on_error(&self, handler: impl Fn(ErrorReport) + Send + 'static) {
        self.shared.callbacks.on_error(handler);
    }

    // -----------------------------------------------------------------------
    // Lifecycle internals; callers hold the lifecycle lock.
    // -----------------------------------------------------------------------

    async fn launch(&self, lifecycle: &mut Option<Running>) -> Result<(), RfidlinkError> {
        let config = &self.shared.config;

        let channel = match UdpChannel::bind(config.bind_addr()).await {
            Ok(channel) => channel,
            Err(e) => {
                error!(error = %e, "cannot open point-to-point socket; client stays stopped");
                self.shared
                    .callbacks
                    .notify_error(ErrorReport::new(LOCAL_ERROR_CODE, e.to_string()));
                return Err(e.into());
            }
        };
        let local_addr = channel.local_addr()?;

        let discovery = match UdpChannel::bind_broadcast(config.discovery_addr()).await {
            Ok(discovery) => Some(discovery),
            Err(e) => {
                warn!(error = %e, "cannot open discovery socket; running without discovery");
                None
            }
        };
        let discovery_addr = discovery.as_ref().and_then(|d| d.local_addr().ok());

        let (shutdown, _) = watch::channel(false);
        let mut tasks = Vec::with_capacity(3);
        tasks.push(tokio::spawn(send_loop(
            channel.clone(),
            Arc::clone(&self.shared),
            shutdown.subscribe(),
        )));
        tasks.push(tokio::spawn(receive_loop(
            channel,
            Arc::clone(&self.shared),
            shutdown.subscribe(),
        )));
        if let Some(discovery) = discovery {
            tasks.push(tokio::spawn(broadcast_loop(
                discovery,
                Arc::clone(&self.shared),
                shutdown.subscribe(),
            )));
        }

        info!(
            %local_addr,
            discovery = ?discovery_addr,
            endpoint = %self.shared.endpoint(),
            "reader client started"
        );
        *lifecycle = Some(Running {
            shutdown,
            tasks,
            local_addr,
            discovery_addr,
        });
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    async fn shutdown(&self, lifecycle: &mut Option<Running>) {
        let Some(running) = lifecycle.take() else {
            return;
        };
        self.running.store(false, Ordering::Release);
        running.shutdown.send_replace(true);

        for task in running.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "I/O task ended abnormally");
            }
        }
        info!(local_addr = %running.local_addr, "reader client stopped");
    }
}

impl std::fmt::Debug for ReaderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderClient")
            .field("endpoint", &self.shared.endpoint())
            .field("running", &self.is_running())
            .field("pending", &self.shared.queue.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_rejects_bad_server_ip() {
        let err = ReaderClient::builder().server("reader-1", 1969).build().unwrap_err();
        assert!(matches!(
            err,
            RfidlinkError::Transport(TransportError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_build_rejects_port_zero() {
        let err = ReaderClient::builder().server("10.0.0.1", 0).build().unwrap_err();
        assert!(matches!(
            err,
            RfidlinkError::Transport(TransportError::InvalidPort(0))
        ));
    }

    #[test]
    fn test_build_applies_validation() {
        let client = ReaderClient::builder()
            .config(ClientConfig {
                queue_capacity: 0,
                ..ClientConfig::default()
            })
            .build()
            .unwrap();
        assert_eq!(client.config().queue_capacity, 1);
        assert!(!client.is_running());
        assert_eq!(client.server_endpoint().to_string(), "192.168.1.100:1969");
    }

    #[test]
    fn test_custom_registry_is_used() {
        let client = ReaderClient::builder()
            .registry(Arc::new(MessageRegistry::new()))
            .build()
            .unwrap();
        assert!(client.registry().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_endpoint_keeps_previous() {
        let client = ReaderClient::builder().server("10.0.0.1", 1969).build().unwrap();
        assert!(client.set_server_endpoint("not-an-ip", 1969).await.is_err());
        assert!(client.set_server_endpoint("10.0.0.2", 70_000).await.is_err());
        assert_eq!(client.server_endpoint().to_string(), "10.0.0.1:1969");
        assert!(!client.is_running());
    }

    #[tokio::test]
    async fn test_valid_endpoint_on_stopped_client_does_not_start_it() {
        let client = ReaderClient::builder().server("10.0.0.1", 1969).build().unwrap();
        client.set_server_endpoint(" 10.0.0.2 ", 2000).await.unwrap();
        assert_eq!(client.server_endpoint().to_string(), "10.0.0.2:2000");
        assert!(!client.is_running());
    }

    #[tokio::test]
    async fn test_stopped_client_reports_shutdown() {
        let client = ReaderClient::builder().build().unwrap();
        assert!(matches!(
            client.local_addr().await,
            Err(TransportError::Shutdown)
        ));
        assert_eq!(client.discovery_addr().await, None);
    }

    #[test]
    fn test_send_frame_rejects_short_frame() {
        let client = ReaderClient::builder().build().unwrap();
        let err = client.send_frame(&[0x40, 0x00, 0x03]).unwrap_err();
        assert!(matches!(
            err,
            RfidlinkError::Protocol(ProtocolError::FrameTooShort { len: 3, .. })
        ));
    }

    #[test]
    fn test_send_frame_rejects_non_command_header() {
        let client = ReaderClient::builder().build().unwrap();
        let frame = rfidlink_protocol::encode_frame(MessageType::Return, 0x00, 0x02, &[0x01]);
        let err = client.send_frame(&frame).unwrap_err();
        assert!(matches!(
            err,
            RfidlinkError::Protocol(ProtocolError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_send_frame_rejects_unregistered_code() {
        let client = ReaderClient::builder()
            .registry(Arc::new(MessageRegistry::new()))
            .build()
            .unwrap();
        let frame = rfidlink_protocol::encode_frame(MessageType::Command, 0x00, 0x02, &[0x01]);
        let err = client.send_frame(&frame).unwrap_err();
        assert!(err.to_string().contains("0x02 is not registered"));
    }

    #[test]
    fn test_send_frame_rejects_short_parameters() {
        let client = ReaderClient::builder().build().unwrap();
        // Get baud rate needs one interface byte.
        let frame = rfidlink_protocol::encode_frame(MessageType::Command, 0x00, 0x02, &[]);
        let err = client.send_frame(&frame).unwrap_err();
        assert!(matches!(
            err,
            RfidlinkError::Protocol(ProtocolError::Truncated { needed: 1, remaining: 0 })
        ));
    }
}
