//! Capability gates: runtime predicates consulted before a gated handler runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A feature check evaluated on every call. Implementations must not cache
/// the answer; capabilities change over the life of a session.
pub trait CapabilityGate: Send + Sync {
    fn name(&self) -> &str;
    fn enabled(&self) -> bool;
}

/// Gate backed by a shared flag that the owner can flip at any time.
#[derive(Debug, Clone)]
pub struct FlagGate {
    name: &'static str,
    flag: Arc<AtomicBool>,
}

impl FlagGate {
    pub fn new(name: &'static str, flag: Arc<AtomicBool>) -> Self {
        Self { name, flag }
    }
}

impl CapabilityGate for FlagGate {
    fn name(&self) -> &str {
        self.name
    }

    fn enabled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_gate_tracks_flag_changes() {
        let flag = Arc::new(AtomicBool::new(false));
        let gate = FlagGate::new("channels", flag.clone());
        assert!(!gate.enabled());

        flag.store(true, Ordering::Release);
        assert!(gate.enabled());
        assert_eq!(gate.name(), "channels");
    }
}
