//! The dataplane abstraction (§4.6): how plaintext packets enter and leave
//! the local machine, behind one `async_trait` interface with three
//! interchangeable implementations.

mod dataplane;
mod error;
mod loopback;
#[cfg(feature = "tun")]
mod tun;
mod udp_bridge;

pub use dataplane::Dataplane;
pub use error::DataplaneError;
pub use loopback::{LoopbackDataplane, LoopbackHandle};
#[cfg(feature = "tun")]
pub use tun::TunDataplane;
pub use udp_bridge::UdpBridgeDataplane;
