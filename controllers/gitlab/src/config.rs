//! Controller settings read from the environment.

use crate::error::ControllerError;
use std::time::Duration;

/// Runtime settings for the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Namespace to watch; all namespaces when `None`
    pub watch_namespace: Option<String>,
    /// Requeue interval after a successful reconciliation
    pub poll_interval: Duration,
    /// Upper bound on a single reconciliation
    pub tick_timeout: Duration,
    /// Concurrent reconciliations per watched kind
    pub max_concurrent_reconciles: u16,
    /// Quiet period after the last event before reconciling
    pub debounce: Duration,
    /// First error backoff
    pub backoff_min: Duration,
    /// Error backoff cap
    pub backoff_max: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            poll_interval: Duration::from_secs(300),
            tick_timeout: Duration::from_secs(120),
            max_concurrent_reconciles: 3,
            debounce: Duration::from_secs(1),
            backoff_min: Duration::from_secs(5),
            backoff_max: Duration::from_secs(300),
        }
    }
}

impl Settings {
    /// Read settings from process environment variables
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup; unset variables keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let settings = Self {
            watch_namespace: lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty()),
            poll_interval: seconds(&lookup, "POLL_INTERVAL_SECS", defaults.poll_interval)?,
            tick_timeout: seconds(&lookup, "TICK_TIMEOUT_SECS", defaults.tick_timeout)?,
            max_concurrent_reconciles: match lookup("MAX_CONCURRENT_RECONCILES") {
                Some(raw) => parse(&raw, "MAX_CONCURRENT_RECONCILES")?,
                None => defaults.max_concurrent_reconciles,
            },
            debounce: seconds(&lookup, "DEBOUNCE_SECS", defaults.debounce)?,
            backoff_min: seconds(&lookup, "BACKOFF_MIN_SECS", defaults.backoff_min)?,
            backoff_max: seconds(&lookup, "BACKOFF_MAX_SECS", defaults.backoff_max)?,
        };

        if settings.max_concurrent_reconciles == 0 {
            return Err(ControllerError::InvalidConfig(
                "MAX_CONCURRENT_RECONCILES must be at least 1".to_string(),
            ));
        }
        if settings.tick_timeout.is_zero() {
            return Err(ControllerError::InvalidConfig(
                "TICK_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }
        if settings.backoff_min.is_zero() || settings.backoff_min > settings.backoff_max {
            return Err(ControllerError::InvalidConfig(format!(
                "backoff bounds must satisfy 0 < BACKOFF_MIN_SECS ({}) <= BACKOFF_MAX_SECS ({})",
                settings.backoff_min.as_secs(),
                settings.backoff_max.as_secs()
            )));
        }
        Ok(settings)
    }
}

fn parse<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T, ControllerError> {
    raw.trim()
        .parse()
        .map_err(|_| ControllerError::InvalidConfig(format!("{} is not a valid number: {:?}", key, raw)))
}

fn seconds<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, ControllerError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => Ok(Duration::from_secs(parse(&raw, key)?)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.poll_interval, Duration::from_secs(300));
        assert!(settings.watch_namespace.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("WATCH_NAMESPACE", "gitlab"),
            ("POLL_INTERVAL_SECS", "60"),
            ("MAX_CONCURRENT_RECONCILES", "8"),
            ("BACKOFF_MIN_SECS", "1"),
            ("BACKOFF_MAX_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(settings.watch_namespace.as_deref(), Some("gitlab"));
        assert_eq!(settings.poll_interval, Duration::from_secs(60));
        assert_eq!(settings.max_concurrent_reconciles, 8);
        assert_eq!(settings.backoff_max, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Settings::from_lookup(lookup(&[("POLL_INTERVAL_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidConfig(_)));

        let err = Settings::from_lookup(lookup(&[("MAX_CONCURRENT_RECONCILES", "0")])).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidConfig(_)));

        let err = Settings::from_lookup(lookup(&[
            ("BACKOFF_MIN_SECS", "60"),
            ("BACKOFF_MAX_SECS", "10"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ControllerError::InvalidConfig(_)));
    }

    #[test]
    fn test_blank_namespace_means_all() {
        let settings = Settings::from_lookup(lookup(&[("WATCH_NAMESPACE", " ")])).unwrap();
        assert!(settings.watch_namespace.is_none());
    }
}
