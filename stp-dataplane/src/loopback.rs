use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::dataplane::Dataplane;
use crate::error::DataplaneError;

const CHANNEL_CAPACITY: usize = 256;

/// An in-process dataplane for tests: a test harness pushes items as if they
/// came from a local application, and reads back whatever the device
/// delivers.
pub struct LoopbackDataplane {
    outbound_rx: Mutex<mpsc::Receiver<(Option<String>, Vec<u8>)>>,
    delivered_tx: mpsc::Sender<(Option<String>, Vec<u8>)>,
    closed: AtomicBool,
}

/// The test-side handle paired with a [`LoopbackDataplane`].
pub struct LoopbackHandle {
    pub outbound_tx: mpsc::Sender<(Option<String>, Vec<u8>)>,
    pub delivered_rx: mpsc::Receiver<(Option<String>, Vec<u8>)>,
}

impl LoopbackDataplane {
    pub fn new() -> (Self, LoopbackHandle) {
        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (delivered_tx, delivered_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let dataplane =
            LoopbackDataplane { outbound_rx: Mutex::new(outbound_rx), delivered_tx, closed: AtomicBool::new(false) };
        (dataplane, LoopbackHandle { outbound_tx, delivered_rx })
    }
}

#[async_trait]
impl Dataplane for LoopbackDataplane {
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
        self.delivered_tx
            .send((peer_name.map(str::to_owned), payload.to_vec()))
            .await
            .map_err(|_| DataplaneError::Closed)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
