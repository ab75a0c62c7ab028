//! Runtime-mutable capability flags and the gates that read them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use renderbridge_common::Config;
use renderbridge_engine::{CapabilityGate, FlagGate};

pub const CHANNELS: &str = "channels";
pub const WORLD_EXPLORER: &str = "world_explorer";

#[derive(Debug, Clone)]
pub struct Capabilities {
    channels: Arc<AtomicBool>,
    world_explorer: Arc<AtomicBool>,
}

impl Capabilities {
    pub fn new(channels: bool, world_explorer: bool) -> Self {
        Self {
            channels: Arc::new(AtomicBool::new(channels)),
            world_explorer: Arc::new(AtomicBool::new(world_explorer)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.channels_enabled, config.world_explorer)
    }

    pub fn set_channels(&self, enabled: bool) {
        self.channels.store(enabled, Ordering::Release);
    }

    pub fn set_world_explorer(&self, enabled: bool) {
        self.world_explorer.store(enabled, Ordering::Release);
    }

    pub fn channels_enabled(&self) -> bool {
        self.channels.load(Ordering::Acquire)
    }

    pub fn world_explorer(&self) -> bool {
        self.world_explorer.load(Ordering::Acquire)
    }

    pub fn channels_gate(&self) -> Arc<dyn CapabilityGate> {
        Arc::new(FlagGate::new(CHANNELS, self.channels.clone()))
    }

    pub fn world_explorer_gate(&self) -> Arc<dyn CapabilityGate> {
        Arc::new(FlagGate::new(WORLD_EXPLORER, self.world_explorer.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gates_follow_later_flag_changes() {
        let caps = Capabilities::new(false, true);
        let channels = caps.channels_gate();
        let explorer = caps.world_explorer_gate();
        assert!(!channels.enabled());
        assert!(explorer.enabled());

        caps.set_channels(true);
        caps.set_world_explorer(false);

        assert!(channels.enabled());
        assert!(!explorer.enabled());
    }
}
