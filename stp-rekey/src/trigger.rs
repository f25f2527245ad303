/// Why a rekey was initiated (§4.4): the device orchestrator independently
/// watches a timer and a sent-message counter, and logs which one fired so
/// "rekeying on schedule" can be told apart from "rekeying under load."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RekeyTrigger {
    Time,
    Bytes,
}

impl std::fmt::Display for RekeyTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RekeyTrigger::Time => write!(f, "time"),
            RekeyTrigger::Bytes => write!(f, "bytes"),
        }
    }
}
