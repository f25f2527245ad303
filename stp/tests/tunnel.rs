use std::sync::Arc;

use tokio::io::duplex;

use stp::dataplane::LoopbackDataplane;
use stp::{Device, DeviceConfig, Mode, TunnelConfig, TunnelType};

fn base_config(mode: Mode) -> DeviceConfig {
    DeviceConfig {
        mode,
        psk: "correct horse battery staple".to_string(),
        endpoint: None,
        peers: vec![],
        keepalive_secs: 15,
        max_padding: 32,
        rekey_interval_secs: 3600,
        rekey_budget: 1_000_000,
        tunnel: TunnelConfig { kind: TunnelType::Loopback, mtu: 1420 },
    }
}

/// Two devices handshake over a duplex stream, then exchange a payload
/// addressed by explicit peer name in both directions.
#[tokio::test]
async fn end_to_end_data_exchange_over_duplex_stream() {
    let (client_stream, server_stream) = duplex(64 * 1024);

    let (client_dp, mut client_handle) = LoopbackDataplane::new();
    let (server_dp, mut server_handle) = LoopbackDataplane::new();

    let client_config = base_config(Mode::Client).validate().unwrap();
    let server_config = base_config(Mode::Server).validate().unwrap();

    let server_task =
        tokio::spawn(
            async move { Device::accept(server_stream, server_config, Arc::new(server_dp)).await.unwrap() },
        );
    let client = Device::connect(client_stream, client_config, Arc::new(client_dp)).await.unwrap();
    let server = server_task.await.unwrap();

    let client = Arc::new(client);
    let server = Arc::new(server);

    let client_runner = client.clone();
    tokio::spawn(async move {
        let _ = client_runner.run().await;
    });
    let server_runner = server.clone();
    tokio::spawn(async move {
        let _ = server_runner.run().await;
    });

    client_handle.outbound_tx.send((Some("server".to_string()), b"hello from client".to_vec())).await.unwrap();
    let (peer, payload) = server_handle.delivered_rx.recv().await.unwrap();
    assert_eq!(peer.as_deref(), Some("server"));
    assert_eq!(payload, b"hello from client");

    server_handle.outbound_tx.send((Some("client".to_string()), b"hello from server".to_vec())).await.unwrap();
    let (peer, payload) = client_handle.delivered_rx.recv().await.unwrap();
    assert_eq!(peer.as_deref(), Some("client"));
    assert_eq!(payload, b"hello from server");

    let snapshot = client.snapshot().await;
    assert_eq!(snapshot.send_counter, 2); // BIND + one DATA frame
}
