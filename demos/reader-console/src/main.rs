//! Console client for a single reader.
//!
//! Usage: `reader-console [IP] [PORT]` (defaults to `192.168.1.100 1969`).
//! Logs every reply, status, error and discovery broadcast, asks the
//! reader for its firmware version, and runs until Ctrl-C.

use rfidlink::logging::init_tracing;
use rfidlink::prelude::*;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    init_tracing("info");

    let mut args = std::env::args().skip(1);
    let ip = args.next().unwrap_or_else(|| "192.168.1.100".to_string());
    let port = match args.next().map(|p| p.parse::<u16>()) {
        None => 1969,
        Some(Ok(port)) => port,
        Some(Err(e)) => {
            error!(error = %e, "port must be a number in 1-65535");
            std::process::exit(2);
        }
    };

    let client = match ReaderClient::builder().server(&ip, port).build() {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "cannot create client");
            std::process::exit(2);
        }
    };

    client.on_command(|reply| {
        if let Some(version) = reply.downcast_ref::<GetVersionNumberReply>() {
            info!(version = %version.version_info, "reader firmware");
        } else {
            info!(name = reply.name(), ?reply, "reply");
        }
    });
    client.on_status(|status| {
        if let Some(card) = status.downcast_ref::<StatusAutoCardReading>() {
            info!(epc = %card.epc, antenna = card.antenna, rssi = card.rssi, "tag read");
        } else {
            info!(name = status.name(), ?status, "status");
        }
    });
    client.on_broadcast(|event| match &event.payload {
        DiscoveryPayload::Announcement(device) => info!(
            source = %event.source,
            ip = %device.ip,
            port = device.port,
            id = %device.device_id,
            kind = %device.device_type,
            "device announced"
        ),
        DiscoveryPayload::Status(status) => {
            info!(source = %event.source, ?status, "device announced")
        }
    });
    client.on_error(|err| warn!(code = err.code, description = %err.description, "reader error"));

    if let Err(e) = client.start().await {
        error!(error = %e, "cannot start client");
        std::process::exit(1);
    }
    info!(
        endpoint = %client.server_endpoint(),
        commands = client.registry().commands().len(),
        "connected; press Ctrl-C to quit"
    );

    client.send(GetVersionNumber::default());

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for Ctrl-C");
    }
    client.stop().await;
}
