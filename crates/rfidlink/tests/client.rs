//! End-to-end tests for `ReaderClient` against a fake device on loopback.
//!
//! The fake device is a plain Tokio UDP socket; the client is configured
//! to bind loopback only and to use an ephemeral discovery port so tests
//! can run in parallel.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use rfidlink::prelude::*;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::timeout;

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const WAIT: Duration = Duration::from_secs(2);

async fn fake_device() -> UdpSocket {
    UdpSocket::bind((LOCALHOST, 0)).await.unwrap()
}

fn config_for(device: SocketAddr) -> ClientConfig {
    ClientConfig {
        server_ip: device.ip().to_string(),
        server_port: device.port(),
        bind_ip: LOCALHOST,
        discovery_ip: LOCALHOST,
        discovery_port: 0,
        dequeue_interval: Duration::from_millis(5),
        ..ClientConfig::default()
    }
}

fn client_for(config: ClientConfig) -> ReaderClient {
    ReaderClient::builder().config(config).build().unwrap()
}

/// Routes every callback slot into channels the test can await.
struct Observed {
    commands: UnboundedReceiver<Arc<dyn Message>>,
    statuses: UnboundedReceiver<Arc<dyn Message>>,
    errors: UnboundedReceiver<ErrorReport>,
    broadcasts: UnboundedReceiver<DiscoveryEvent>,
}

fn observe(client: &ReaderClient) -> Observed {
    let (command_tx, commands) = mpsc::unbounded_channel();
    let (status_tx, statuses) = mpsc::unbounded_channel();
    let (error_tx, errors) = mpsc::unbounded_channel();
    let (broadcast_tx, broadcasts) = mpsc::unbounded_channel();
    client.on_command(move |m| {
        let _ = command_tx.send(m);
    });
    client.on_status(move |m| {
        let _ = status_tx.send(m);
    });
    client.on_error(move |e| {
        let _ = error_tx.send(e);
    });
    client.on_broadcast(move |e| {
        let _ = broadcast_tx.send(e);
    });
    Observed {
        commands,
        statuses,
        errors,
        broadcasts,
    }
}

async fn next<T>(rx: &mut UnboundedReceiver<T>) -> T {
    timeout(WAIT, rx.recv())
        .await
        .expect("callback should fire")
        .expect("channel open")
}

async fn recv_frame(device: &UdpSocket) -> (Vec<u8>, SocketAddr) {
    let mut buf = [0u8; 1500];
    let (len, from) = timeout(WAIT, device.recv_from(&mut buf))
        .await
        .expect("device should receive a frame")
        .unwrap();
    (buf[..len].to_vec(), from)
}

// =========================================================================
// Commands and replies
// =========================================================================

#[tokio::test]
async fn test_command_reaches_device_and_reply_is_routed() {
    let device = fake_device().await;
    let client = client_for(config_for(device.local_addr().unwrap()));
    let mut observed = observe(&client);
    client.start().await.unwrap();

    client.send(GetVersionNumber::default());
    let (frame, from) = recv_frame(&device).await;
    assert_eq!(frame, vec![0x40, 0x00, 0x03, 0x00, 0x05, 0xB8]);
    assert_eq!(from, client.local_addr().await.unwrap());

    let reply = GetVersionNumberReply {
        version_info: "V2.3.1".into(),
    };
    device.send_to(&reply.serialize(0x00), from).await.unwrap();

    let routed = next(&mut observed.commands).await;
    let version = routed.downcast_ref::<GetVersionNumberReply>().unwrap();
    assert_eq!(version.version_info, "V2.3.1");

    client.stop().await;
}

#[tokio::test]
async fn test_commands_are_sent_in_order_with_device_address() {
    let device = fake_device().await;
    let client = client_for(ClientConfig {
        device_address: 0x07,
        ..config_for(device.local_addr().unwrap())
    });
    client.start().await.unwrap();

    client.send(SetBaudRate {
        interface_type: 1,
        baud_rate_code: 2,
    });
    client.send(GetOutputPower { antenna_number: 3 });

    let (first, _) = recv_frame(&device).await;
    let (second, _) = recv_frame(&device).await;
    assert_eq!(first[3], 0x07);
    assert_eq!(first[4], 0x01);
    assert_eq!(second[4], 0x10);
    for frame in [&first, &second] {
        let sum = frame.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        assert_eq!(sum, 0);
    }

    client.stop().await;
}

#[tokio::test]
async fn test_raw_frame_is_queued_with_configured_address() {
    let device = fake_device().await;
    let client = client_for(config_for(device.local_addr().unwrap()));
    client.start().await.unwrap();

    let frame = encode_frame(MessageType::Command, 0x09, 0x10, &[0x02]);
    client.send_frame(&frame).unwrap();

    let (sent, _) = recv_frame(&device).await;
    assert_eq!(sent, encode_frame(MessageType::Command, 0x00, 0x10, &[0x02]));

    client.stop().await;
}

// =========================================================================
// Routing by type
// =========================================================================

#[tokio::test]
async fn test_status_and_error_routing() {
    let device = fake_device().await;
    let client = client_for(config_for(device.local_addr().unwrap()));
    let mut observed = observe(&client);
    client.start().await.unwrap();
    let client_addr = client.local_addr().await.unwrap();

    let heartbeat = StatusHeartbeat(Heartbeat {
        heartbeat: "alive".into(),
    });
    device
        .send_to(&heartbeat.serialize(0x00), client_addr)
        .await
        .unwrap();
    let status = next(&mut observed.statuses).await;
    let status = status.downcast_ref::<StatusHeartbeat>().unwrap();
    assert_eq!(status.heartbeat, "alive");

    device
        .send_to(&ErrorMessage::from_device(0x05).serialize(0x00), client_addr)
        .await
        .unwrap();
    let report = next(&mut observed.errors).await;
    assert_eq!(report.code, 0x05);
    assert_eq!(report.description, error_message(0x05));

    let forwarded = next(&mut observed.commands).await;
    let forwarded = forwarded.downcast_ref::<ErrorMessage>().unwrap();
    assert_eq!(forwarded.code, 0x05);

    client.stop().await;
}

#[tokio::test]
async fn test_unknown_reply_becomes_local_error() {
    let device = fake_device().await;
    let client = client_for(config_for(device.local_addr().unwrap()));
    let mut observed = observe(&client);
    client.start().await.unwrap();
    let client_addr = client.local_addr().await.unwrap();

    let unregistered = encode_frame(MessageType::Return, 0x00, 0xEE, &[]);
    device.send_to(&unregistered, client_addr).await.unwrap();

    let report = next(&mut observed.errors).await;
    assert_eq!(report.code, 0xFF);
    assert_eq!(report.description, "Unknown Command Code");
    assert!(observed.commands.try_recv().is_err());

    client.stop().await;
}

#[tokio::test]
async fn test_datagrams_from_other_sources_are_ignored() {
    let device = fake_device().await;
    let stranger = fake_device().await;
    let client = client_for(config_for(device.local_addr().unwrap()));
    let mut observed = observe(&client);
    client.start().await.unwrap();
    let client_addr = client.local_addr().await.unwrap();

    stranger
        .send_to(&GetOutputPowerReply { power_value: 1 }.serialize(0), client_addr)
        .await
        .unwrap();
    device
        .send_to(&GetOutputPowerReply { power_value: 2 }.serialize(0), client_addr)
        .await
        .unwrap();

    let routed = next(&mut observed.commands).await;
    assert_eq!(
        routed.downcast_ref::<GetOutputPowerReply>().unwrap().power_value,
        2
    );
    assert!(
        timeout(Duration::from_millis(200), observed.commands.recv())
            .await
            .is_err()
    );

    client.stop().await;
}

#[tokio::test]
async fn test_panicking_command_handler_keeps_receive_loop_alive() {
    let device = fake_device().await;
    let client = client_for(config_for(device.local_addr().unwrap()));
    let (tx, mut powers) = mpsc::unbounded_channel();
    let calls = std::sync::atomic::AtomicUsize::new(0);
    client.on_command(move |reply| {
        if calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
            panic!("first reply rejected by handler");
        }
        if let Some(power) = reply.downcast_ref::<GetOutputPowerReply>() {
            let _ = tx.send(power.power_value);
        }
    });
    client.start().await.unwrap();
    let client_addr = client.local_addr().await.unwrap();

    for power_value in [1, 2] {
        device
            .send_to(&GetOutputPowerReply { power_value }.serialize(0), client_addr)
            .await
            .unwrap();
    }

    assert_eq!(next(&mut powers).await, 2);
    assert!(client.is_running());

    client.stop().await;
}

#[tokio::test]
async fn test_reply_filling_receive_buffer_is_dropped() {
    let device = fake_device().await;
    let client = client_for(ClientConfig {
        recv_buffer_size: 16,
        ..config_for(device.local_addr().unwrap())
    });
    let mut observed = observe(&client);
    client.start().await.unwrap();
    let client_addr = client.local_addr().await.unwrap();

    let long = GetVersionNumberReply {
        version_info: "V2.3.1-build.20261019-rc7".into(),
    };
    device
        .send_to(&long.serialize(0x00), client_addr)
        .await
        .unwrap();

    let report = next(&mut observed.errors).await;
    assert_eq!(report.code, 0xFF);
    assert_eq!(report.description, rfidlink::OVERSIZED_DATAGRAM);

    // A reply that fits still gets through.
    device
        .send_to(&GetOutputPowerReply { power_value: 30 }.serialize(0), client_addr)
        .await
        .unwrap();
    let routed = next(&mut observed.commands).await;
    assert!(routed.downcast_ref::<GetOutputPowerReply>().is_some());

    client.stop().await;
}

// =========================================================================
// Discovery
// =========================================================================

#[tokio::test]
async fn test_json_broadcast_from_any_source() {
    let device = fake_device().await;
    let announcer = fake_device().await;
    let client = client_for(config_for(device.local_addr().unwrap()));
    let mut observed = observe(&client);
    client.start().await.unwrap();
    let discovery = client.discovery_addr().await.expect("discovery bound");

    let json = br#"{"IP":"127.0.0.1","Port":1969,"DeviceType":"UHF","ID":"R-01","ti":7}"#;
    announcer.send_to(json, discovery).await.unwrap();

    let event = next(&mut observed.broadcasts).await;
    assert_eq!(event.source, announcer.local_addr().unwrap());
    let announcement = event.announcement().unwrap();
    assert_eq!(announcement.device_id, "R-01");
    assert_eq!(announcement.internal_model, 7);

    client.stop().await;
}

#[tokio::test]
async fn test_framed_broadcast_delivers_status() {
    let device = fake_device().await;
    let client = client_for(ClientConfig {
        discovery_format: DiscoveryFormat::Framed,
        ..config_for(device.local_addr().unwrap())
    });
    let mut observed = observe(&client);
    client.start().await.unwrap();
    let discovery = client.discovery_addr().await.unwrap();

    let status = StatusUdpBroadcast(DeviceAnnouncement {
        device_id: "R-02".into(),
        ..DeviceAnnouncement::default()
    });
    device
        .send_to(&status.serialize(0x00), discovery)
        .await
        .unwrap();

    let event = next(&mut observed.broadcasts).await;
    let DiscoveryPayload::Status(message) = event.payload else {
        panic!("expected a framed status");
    };
    let status = message.downcast_ref::<StatusUdpBroadcast>().unwrap();
    assert_eq!(status.device_id, "R-02");

    client.stop().await;
}

#[tokio::test]
async fn test_taken_discovery_port_degrades_to_point_to_point() {
    let device = fake_device().await;
    let squatter = fake_device().await;
    let client = client_for(ClientConfig {
        discovery_port: squatter.local_addr().unwrap().port(),
        ..config_for(device.local_addr().unwrap())
    });
    client.start().await.unwrap();

    assert!(client.is_running());
    assert_eq!(client.discovery_addr().await, None);

    client.send(GetVersionNumber::default());
    let (frame, _) = recv_frame(&device).await;
    assert_eq!(frame[4], 0x05);

    client.stop().await;
}

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test]
async fn test_stop_is_idempotent_and_stopped_client_drops_commands() {
    let device = fake_device().await;
    let client = client_for(config_for(device.local_addr().unwrap()));

    client.send(GetVersionNumber::default());
    assert_eq!(client.pending_commands(), 0);

    client.start().await.unwrap();
    client.start().await.unwrap();
    assert!(client.is_running());

    client.stop().await;
    client.stop().await;
    assert!(!client.is_running());

    client.send(GetVersionNumber::default());
    assert_eq!(client.pending_commands(), 0);
}

#[tokio::test]
async fn test_full_queue_drops_extra_commands() {
    let device = fake_device().await;
    let client = client_for(ClientConfig {
        dequeue_interval: Duration::from_secs(5),
        ..config_for(device.local_addr().unwrap())
    });
    client.start().await.unwrap();
    // Let the send loop find the queue empty and start its long wait.
    tokio::time::sleep(Duration::from_millis(50)).await;

    for antenna in 0..12 {
        client.send(GetOutputPower {
            antenna_number: antenna,
        });
    }
    assert_eq!(client.pending_commands(), 10);

    client.stop().await;
}

#[tokio::test]
async fn test_set_server_endpoint_restarts_running_client() {
    let first = fake_device().await;
    let second = fake_device().await;
    let client = client_for(config_for(first.local_addr().unwrap()));
    client.start().await.unwrap();

    let port = u32::from(second.local_addr().unwrap().port());
    client.set_server_endpoint("127.0.0.1", port).await.unwrap();
    assert!(client.is_running());
    assert_eq!(client.server_endpoint(), second.local_addr().unwrap());

    client.send(GetVersionNumber::default());
    let (frame, _) = recv_frame(&second).await;
    assert_eq!(frame[4], 0x05);

    client.stop().await;
}

#[tokio::test]
async fn test_invalid_endpoint_leaves_running_client_untouched() {
    let device = fake_device().await;
    let client = client_for(config_for(device.local_addr().unwrap()));
    client.start().await.unwrap();
    let before = client.local_addr().await.unwrap();

    let err = client.set_server_endpoint("not-an-ip", 1969).await.unwrap_err();
    assert!(err.to_string().contains("not-an-ip"));

    assert!(client.is_running());
    assert_eq!(client.server_endpoint(), device.local_addr().unwrap());
    assert_eq!(client.local_addr().await.unwrap(), before);

    client.stop().await;
}

#[tokio::test]
async fn test_bind_failure_keeps_client_stopped() {
    let client = client_for(ClientConfig {
        // TEST-NET-3; never assigned to a local interface.
        bind_ip: IpAddr::V4(Ipv4Addr::new(203, 0, 113, 1)),
        ..config_for("127.0.0.1:1969".parse().unwrap())
    });
    let mut observed = observe(&client);

    assert!(client.start().await.is_err());
    assert!(!client.is_running());

    let report = next(&mut observed.errors).await;
    assert_eq!(report.code, 0xFF);
}
