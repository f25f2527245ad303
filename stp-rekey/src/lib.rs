//! The in-band rekey protocol (§4.4): rotate session keys without tearing
//! down the tunnel, sealed under the epoch that is being retired.

mod context;
mod error;
mod protocol;
mod trigger;

pub use context::RekeyContext;
pub use error::RekeyError;
pub use protocol::{complete_rekey, incoming_request_wins, respond_to_rekey};
pub use trigger::RekeyTrigger;
