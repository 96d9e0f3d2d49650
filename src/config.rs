use std::fmt::Display;
use std::str::FromStr;

use tracing::warn;

use crate::engine::ConflictPolicy;

pub const DEFAULT_CONFLICT_STATUS: u16 = 409;
/// Status older clients expect for double bookings.
pub const LEGACY_CONFLICT_STATUS: u16 = 403;

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prometheus exporter port; disabled when unset.
    pub metrics_port: Option<u16>,
    pub conflict_policy: ConflictPolicy,
    /// Status returned for a booking conflict: 409, or 403 for clients that
    /// expect the legacy behaviour.
    pub conflict_status: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metrics_port: None,
            conflict_policy: ConflictPolicy::default(),
            conflict_status: DEFAULT_CONFLICT_STATUS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Invalid values fall back to the default
    /// with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let conflict_status = match parse_or(&lookup, "STAYBOOK_CONFLICT_STATUS", defaults.conflict_status) {
            s @ (DEFAULT_CONFLICT_STATUS | LEGACY_CONFLICT_STATUS) => s,
            other => {
                warn!("STAYBOOK_CONFLICT_STATUS={other} not supported, using {DEFAULT_CONFLICT_STATUS}");
                DEFAULT_CONFLICT_STATUS
            }
        };
        Self {
            metrics_port: lookup("STAYBOOK_METRICS_PORT").and_then(|raw| match raw.trim().parse() {
                Ok(port) => Some(port),
                Err(e) => {
                    warn!("Invalid STAYBOOK_METRICS_PORT value: {e}");
                    None
                }
            }),
            conflict_policy: parse_or(&lookup, "STAYBOOK_CONFLICT_POLICY", defaults.conflict_policy),
            conflict_status,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value: {e}");
        default
    })
}
