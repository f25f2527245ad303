use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::dataplane::Dataplane;
use crate::error::DataplaneError;

const CHANNEL_CAPACITY: usize = 256;
const MAX_DATAGRAM: usize = 2048;

/// A dataplane backed by a local UDP socket: datagrams arriving from known
/// local peer addresses become outbound tunnel traffic; delivered inbound
/// payloads are sent back to whichever local address that peer name maps to
/// (§4.6).
pub struct UdpBridgeDataplane {
    socket: Arc<UdpSocket>,
    peer_addrs: Arc<RwLock<HashMap<String, SocketAddr>>>,
    addr_peers: Arc<RwLock<HashMap<SocketAddr, String>>>,
    outbound_rx: Mutex<mpsc::Receiver<(Option<String>, Vec<u8>)>>,
    reader: JoinHandle<()>,
    closed: Arc<AtomicBool>,
}

impl UdpBridgeDataplane {
    pub async fn bind(
        local_addr: SocketAddr,
        peers: HashMap<String, SocketAddr>,
    ) -> Result<Self, DataplaneError> {
        let socket = Arc::new(UdpSocket::bind(local_addr).await?);
        Ok(Self::new(socket, peers))
    }

    pub fn new(socket: Arc<UdpSocket>, peers: HashMap<String, SocketAddr>) -> Self {
        let addr_peers: HashMap<SocketAddr, String> = peers.iter().map(|(name, addr)| (*addr, name.clone())).collect();
        let peer_addrs = Arc::new(RwLock::new(peers));
        let addr_peers = Arc::new(RwLock::new(addr_peers));
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let closed = Arc::new(AtomicBool::new(false));

        let reader = tokio::spawn(read_loop(socket.clone(), addr_peers.clone(), tx, closed.clone()));

        UdpBridgeDataplane { socket, peer_addrs, addr_peers, outbound_rx: Mutex::new(rx), reader, closed }
    }

    pub async fn register_peer(&self, name: String, addr: SocketAddr) {
        self.peer_addrs.write().await.insert(name.clone(), addr);
        self.addr_peers.write().await.insert(addr, name);
    }
}

async fn read_loop(
    socket: Arc<UdpSocket>,
    addr_peers: Arc<RwLock<HashMap<SocketAddr, String>>>,
    tx: mpsc::Sender<(Option<String>, Vec<u8>)>,
    closed: Arc<AtomicBool>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        if closed.load(Ordering::Acquire) {
            return;
        }
        let (n, src) = match socket.recv_from(&mut buf).await {
            Ok(v) => v,
            Err(_) => return,
        };
        let peer_name = addr_peers.read().await.get(&src).cloned();
        // Drop rather than block: a slow outbound consumer must not be able
        // to stall the socket's receive path.
        if tx.try_send((peer_name, buf[..n].to_vec())).is_err() {
            tracing::warn!(%src, "dropping inbound datagram, outbound channel full");
        }
    }
}

#[async_trait]
impl Dataplane for UdpBridgeDataplane {
    async fn next_outbound(&self) -> Option<(Option<String>, Vec<u8>)> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }
        self.outbound_rx.lock().await.recv().await
    }

    async fn deliver(&self, peer_name: Option<&str>, payload: &[u8]) -> Result<(), DataplaneError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DataplaneError::Closed);
        }
        let name = peer_name.ok_or(DataplaneError::UnknownPeer(None))?;
        let addr = *self
            .peer_addrs
            .read()
            .await
            .get(name)
            .ok_or_else(|| DataplaneError::UnknownPeer(Some(name.to_string())))?;
        self.socket.send_to(payload, addr).await?;
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.reader.abort();
    }
}
