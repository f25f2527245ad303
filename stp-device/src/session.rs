use std::sync::atomic::{AtomicU32, Ordering};

use tokio::sync::Mutex;

use stp_crypto::SessionSecrets;
use stp_record::{RecordError, RecvState, SendState};
use stp_wire::FrameFlag;

/// The live send/recv cipher state for the current epoch, plus the epoch
/// number itself. Send and receive are independent locks per §5's "never
/// contend" rule; only [`Session::swap`] (the rekey path) takes both.
pub struct Session {
    send: Mutex<SendState>,
    recv: Mutex<RecvState>,
    epoch: AtomicU32,
}

impl Session {
    pub fn new(secrets: SessionSecrets, max_padding: u8) -> Self {
        let epoch = secrets.epoch;
        let send = SendState::new(secrets.send_key, secrets.obfuscation_key, max_padding);
        let recv = RecvState::new(secrets.recv_key, secrets.obfuscation_key);
        Session { send: Mutex::new(send), recv: Mutex::new(recv), epoch: AtomicU32::new(epoch) }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch.load(Ordering::Acquire)
    }

    pub async fn seal(&self, flags: FrameFlag, payload: &[u8]) -> Result<Vec<u8>, RecordError> {
        self.send.lock().await.seal_frame(flags, payload)
    }

    pub async fn send_counter(&self) -> u64 {
        self.send.lock().await.counter()
    }

    pub async fn open(&self, record: &[u8]) -> Result<(FrameFlag, Vec<u8>, u64), RecordError> {
        self.recv.lock().await.open_frame(record)
    }

    /// (R2) Atomically install the next epoch's keys: the first frame under
    /// the new epoch starts both counters back at zero, since a freshly
    /// constructed [`SendState`]/[`RecvState`] always does.
    pub async fn swap(&self, secrets: SessionSecrets, max_padding: u8) {
        let mut send = self.send.lock().await;
        let mut recv = self.recv.lock().await;
        *send = SendState::new(secrets.send_key, secrets.obfuscation_key, max_padding);
        *recv = RecvState::new(secrets.recv_key, secrets.obfuscation_key);
        self.epoch.store(secrets.epoch, Ordering::Release);
    }
}
