use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::BridgeError;

/// Deployment flavour. Drives the defaults for protocol strictness and
/// unknown-message reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(BridgeError::Config(format!(
                "RENDERBRIDGE_ENV must be production or development, got {other:?}"
            ))),
        }
    }
}

/// What the router does with a message type it has no route for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownMessagePolicy {
    /// Drop silently (trace-level only).
    Ignore,
    /// Log at info and drop.
    Log,
    /// Report as telemetry and warn. Still never fatal.
    Escalate,
}

impl FromStr for UnknownMessagePolicy {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(UnknownMessagePolicy::Ignore),
            "log" => Ok(UnknownMessagePolicy::Log),
            "escalate" => Ok(UnknownMessagePolicy::Escalate),
            other => Err(BridgeError::Config(format!(
                "UNKNOWN_MESSAGE_POLICY must be ignore, log or escalate, got {other:?}"
            ))),
        }
    }
}

/// How loudly the pending-call registry reports settlements of ids it
/// does not know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolPolicy {
    /// Error log plus a `protocol_violation` telemetry event.
    Strict,
    /// Warn log only.
    Lenient,
}

impl FromStr for ProtocolPolicy {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ProtocolPolicy::Strict),
            "lenient" => Ok(ProtocolPolicy::Lenient),
            other => Err(BridgeError::Config(format!(
                "PROTOCOL_POLICY must be strict or lenient, got {other:?}"
            ))),
        }
    }
}

/// Bridge configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub debug: bool,

    // Initial capability flags. Both can change at runtime.
    pub channels_enabled: bool,
    pub world_explorer: bool,

    pub pending_call_timeout: Option<Duration>,
    pub unknown_message_policy: UnknownMessagePolicy,
    pub protocol_policy: ProtocolPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_environment(Environment::Development, false)
    }
}

impl Config {
    /// Defaults for an environment, before any overrides.
    pub fn for_environment(environment: Environment, debug: bool) -> Self {
        Self {
            environment,
            debug,
            channels_enabled: false,
            world_explorer: true,
            pending_call_timeout: None,
            unknown_message_policy: if debug {
                UnknownMessagePolicy::Log
            } else {
                UnknownMessagePolicy::Ignore
            },
            protocol_policy: match environment {
                Environment::Development => ProtocolPolicy::Strict,
                Environment::Production => ProtocolPolicy::Lenient,
            },
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, BridgeError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup. `from_env` delegates
    /// here; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BridgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("RENDERBRIDGE_ENV") {
            Some(v) => v.parse()?,
            None => Environment::Development,
        };
        let debug = optional_bool(&lookup, "RENDERBRIDGE_DEBUG")?.unwrap_or(false);

        let mut config = Self::for_environment(environment, debug);

        if let Some(v) = optional_bool(&lookup, "CHANNELS_ENABLED")? {
            config.channels_enabled = v;
        }
        if let Some(v) = optional_bool(&lookup, "WORLD_EXPLORER")? {
            config.world_explorer = v;
        }
        if let Some(raw) = lookup("PENDING_CALL_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                BridgeError::Config(format!(
                    "PENDING_CALL_TIMEOUT_SECS must be a number, got {raw:?}"
                ))
            })?;
            config.pending_call_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(v) = lookup("UNKNOWN_MESSAGE_POLICY") {
            config.unknown_message_policy = v.parse()?;
        }
        if let Some(v) = lookup("PROTOCOL_POLICY") {
            config.protocol_policy = v.parse()?;
        }

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Log the effective configuration.
    pub fn log_summary(&self) {
        info!(
            environment = ?self.environment,
            debug = self.debug,
            channels_enabled = self.channels_enabled,
            world_explorer = self.world_explorer,
            pending_call_timeout_secs = self.pending_call_timeout.map(|d| d.as_secs()),
            unknown_message_policy = ?self.unknown_message_policy,
            protocol_policy = ?self.protocol_policy,
            "Renderbridge configuration"
        );
    }
}

fn optional_bool<F>(lookup: &F, key: &str) -> Result<Option<bool>, BridgeError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" | "" => Ok(Some(false)),
        _ => Err(BridgeError::Config(format!(
            "{key} must be a boolean, got {raw:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, BridgeError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_to_strict_development() {
        let config = load(&[]).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.protocol_policy, ProtocolPolicy::Strict);
        assert_eq!(config.unknown_message_policy, UnknownMessagePolicy::Ignore);
        assert!(!config.channels_enabled);
        assert!(config.world_explorer);
        assert!(config.pending_call_timeout.is_none());
    }

    #[test]
    fn production_is_lenient() {
        let config = load(&[("RENDERBRIDGE_ENV", "production")]).unwrap();
        assert!(config.is_production());
        assert_eq!(config.protocol_policy, ProtocolPolicy::Lenient);
    }

    #[test]
    fn debug_logs_unknown_messages() {
        let config = load(&[("RENDERBRIDGE_DEBUG", "true")]).unwrap();
        assert_eq!(config.unknown_message_policy, UnknownMessagePolicy::Log);
    }

    #[test]
    fn explicit_overrides_win() {
        let config = load(&[
            ("RENDERBRIDGE_ENV", "prod"),
            ("CHANNELS_ENABLED", "1"),
            ("WORLD_EXPLORER", "off"),
            ("PENDING_CALL_TIMEOUT_SECS", "30"),
            ("UNKNOWN_MESSAGE_POLICY", "escalate"),
            ("PROTOCOL_POLICY", "strict"),
        ])
        .unwrap();
        assert!(config.channels_enabled);
        assert!(!config.world_explorer);
        assert_eq!(config.pending_call_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.unknown_message_policy, UnknownMessagePolicy::Escalate);
        assert_eq!(config.protocol_policy, ProtocolPolicy::Strict);
    }

    #[test]
    fn zero_timeout_disables_eviction() {
        let config = load(&[("PENDING_CALL_TIMEOUT_SECS", "0")]).unwrap();
        assert!(config.pending_call_timeout.is_none());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            load(&[("CHANNELS_ENABLED", "maybe")]),
            Err(BridgeError::Config(_))
        ));
        assert!(matches!(
            load(&[("RENDERBRIDGE_ENV", "staging")]),
            Err(BridgeError::Config(_))
        ));
        assert!(matches!(
            load(&[("PENDING_CALL_TIMEOUT_SECS", "soon")]),
            Err(BridgeError::Config(_))
        ));
    }
}
