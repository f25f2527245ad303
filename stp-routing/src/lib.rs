//! Peer table and router (§4.5): static peer configuration plus live
//! statistics, and longest-prefix route matching over destination IP.

mod destination;
mod error;
mod peer;
mod router;
mod table;

pub use destination::parse_destination;
pub use error::RouteError;
pub use peer::{Peer, PeerSpec};
pub use router::{RouteEntry, Router};
pub use table::PeerSet;
