use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::dataplane::Dataplane;
use crate::error::DataplaneError;

/// Maximum packet size read per call. Opening and configuring the actual TUN
/// device (assigning an address, setting the MTU, bringing the interface up)
/// is an OS syscall excluded from this core's scope (§1); this type only
/// implements the packet framing/queueing contract on top of an
/// already-open handle.
const MAX_PACKET: usize = 65535;

/// A dataplane over an already-open TUN file descriptor. `H` is typically
/// `tokio::fs::File` wrapping `/dev/net/tun`, but any
/// `AsyncRead + AsyncWrite` handle that yields whole IP packets per read
/// works.
pub struct TunDataplane<H> {
    handle: Mutex<H>,
    closed: AtomicBool,
}

impl<H> TunDataplane<H>
where
    H: AsyncRead + AsyncWrite + Send + Unpin,
{
    pub fn new(handle: H) -> Self {
        TunDataplane { handle: Mutex::new(handle), closed: AtomicBool::new(false) }
    }
}

#[async_trait]
impl<H> Dataplane for TunDataplane<H>
where
    H: AsyncRead + AsyncWrite + Send + Unpin,
{
    async fn next_outbound(&self) -> Option<(Option<String>, Vec<u8>)> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }
        let mut buf = vec![0u8; MAX_PACKET];
        let mut handle = self.handle.lock().await;
        match handle.read(&mut buf).await {
            Ok(0) | Err(_) => None,
            // TUN traffic has no peer name; routing is always by IP
            // destination (§4.5).
            Ok(n) => Some((None, buf[..n].to_vec())),
        }
    }

    async fn deliver(&self, _peer_name: Option<&str>, payload: &[u8]) -> Result<(), DataplaneError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DataplaneError::Closed);
        }
        let mut handle = self.handle.lock().await;
        handle.write_all(payload).await?;
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
