pub mod actions;
pub mod config;
pub mod error;
pub mod telemetry_events;
pub mod types;

pub use actions::StoreAction;
pub use config::{Config, Environment, ProtocolPolicy, UnknownMessagePolicy};
pub use error::BridgeError;
pub use telemetry_events::TelemetryEvent;
pub use types::*;
