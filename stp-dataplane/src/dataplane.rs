use async_trait::async_trait;

use crate::error::DataplaneError;

/// How plaintext packets enter and leave the local machine (§4.6). The core
/// treats every implementation only through this interface — no downcasting,
/// no enum of transport kinds.
///
/// Generalizes the connect/listen split this crate's ancestor used for
/// *how you reach a remote peer* into *how plaintext crosses the local
/// boundary*, since the thing being abstracted here is what sits on the
/// other side of the tunnel, not the tunnel itself.
#[async_trait]
pub trait Dataplane: Send + Sync {
    /// Pull the next locally-originated payload bound for the tunnel, along
    /// with an optional explicit destination peer name. Returns `None` once
    /// the dataplane is closed and drained.
    async fn next_outbound(&self) -> Option<(Option<String>, Vec<u8>)>;

    /// Hand a decrypted inbound payload to the local OS/application.
    async fn deliver(&self, peer_name: Option<&str>, payload: &[u8]) -> Result<(), DataplaneError>;

    /// Release resources. Further calls to `next_outbound`/`deliver` fail
    /// deterministically with [`DataplaneError::Closed`].
    async fn close(&self);
}
