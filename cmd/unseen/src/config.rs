//! Demo configuration, read from the environment.
//!
//! # Environment Variables
//!
//! - `IMPORTANT_LOG=<filter>` - tracing filter (default `info`; `trace`
//!   shows every wrap/observe event)
//! - `IMPORTANT_THREADS=<n>` - threads racing to reveal one error (default 8)
//! - `IMPORTANT_LEAK=1` - drop one important error without looking at it
//! - `IMPORTANT_STRICT=1` - exit non-zero if anything was left unseen

use std::str::FromStr;

pub const ENV_LOG: &str = "IMPORTANT_LOG";
pub const ENV_THREADS: &str = "IMPORTANT_THREADS";
pub const ENV_LEAK: &str = "IMPORTANT_LEAK";
pub const ENV_STRICT: &str = "IMPORTANT_STRICT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub threads: usize,
    pub leak: bool,
    pub strict: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            leak: false,
            strict: false,
        }
    }
}

impl DemoConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            threads: var(ENV_THREADS, defaults.threads).max(1),
            leak: flag(ENV_LEAK, defaults.leak),
            strict: flag(ENV_STRICT, defaults.strict),
        }
    }
}

/// Numeric or otherwise parseable `IMPORTANT_*` setting.
///
/// A value that fails to parse falls back to `default`, the same as an
/// unset variable; the demo never refuses to start over a typo.
pub fn var<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// On/off `IMPORTANT_*` switch.
///
/// `1`, `true`, `yes`, `on` in any case switch it on. Any other value that
/// is set switches it off, so `IMPORTANT_STRICT=0` disables strict mode
/// even if it were on by default. Unset keeps `default`.
pub fn flag(key: &str, default: bool) -> bool {
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
