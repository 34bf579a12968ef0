use anyhow::Context;
use serde::Deserialize;

use crate::recurrence::{Horizon, SeriesMatch};

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Largest accepted dashboard window, roughly a century.
pub const MAX_UPCOMING_WINDOW_DAYS: i64 = 36_500;

/// Knobs for the recurring bill generator and the dashboard window.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RecurrenceConfig {
    pub horizon: Horizon,
    pub series_match: SeriesMatch,
    pub upcoming_window_days: i64,
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            horizon: Horizon::default(),
            series_match: SeriesMatch::default(),
            upcoming_window_days: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub recurrence: RecurrenceConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "billy".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "billy-users".into()),
            ttl_minutes: parse_or(&lookup, "JWT_TTL_MINUTES", 60)?,
            refresh_ttl_minutes: parse_or(&lookup, "JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
        };

        let defaults = RecurrenceConfig::default();
        let horizon_months: u32 =
            parse_or(&lookup, "RECURRING_HORIZON_MONTHS", defaults.horizon.months())?;
        anyhow::ensure!(
            horizon_months > 0,
            "RECURRING_HORIZON_MONTHS must be at least 1"
        );
        let series_match = match lookup("RECURRING_SERIES_MATCH") {
            Some(raw) => raw.parse::<SeriesMatch>()?,
            None => defaults.series_match,
        };
        let upcoming_window_days: i64 =
            parse_or(&lookup, "UPCOMING_WINDOW_DAYS", defaults.upcoming_window_days)?;
        anyhow::ensure!(
            (0..=MAX_UPCOMING_WINDOW_DAYS).contains(&upcoming_window_days),
            "UPCOMING_WINDOW_DAYS must be between 0 and {MAX_UPCOMING_WINDOW_DAYS}"
        );

        Ok(Self {
            database_url,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "APP_PORT", 8080)?,
            jwt,
            recurrence: RecurrenceConfig {
                horizon: Horizon::months_ahead(horizon_months),
                series_match,
                upcoming_window_days,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {}={:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_keys_are_set() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/billy"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.jwt.issuer, "billy");
        assert_eq!(cfg.jwt.audience, "billy-users");
        assert_eq!(cfg.jwt.ttl_minutes, 60);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.recurrence.horizon.months(), 12);
        assert_eq!(cfg.recurrence.series_match, SeriesMatch::Template);
        assert_eq!(cfg.recurrence.upcoming_window_days, 30);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "x")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn recurrence_settings_are_parsed() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/billy"),
            ("JWT_SECRET", "s3cret"),
            ("RECURRING_HORIZON_MONTHS", "3"),
            ("RECURRING_SERIES_MATCH", "fields"),
            ("UPCOMING_WINDOW_DAYS", "14"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.recurrence.horizon.months(), 3);
        assert_eq!(cfg.recurrence.series_match, SeriesMatch::Fields);
        assert_eq!(cfg.recurrence.upcoming_window_days, 14);
    }

    #[test]
    fn garbage_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/billy"),
            ("JWT_SECRET", "s3cret"),
            ("APP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }

    #[test]
    fn oversized_upcoming_window_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/billy"),
            ("JWT_SECRET", "s3cret"),
            ("UPCOMING_WINDOW_DAYS", "200000000000000"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("UPCOMING_WINDOW_DAYS"));

        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/billy"),
            ("JWT_SECRET", "s3cret"),
            ("UPCOMING_WINDOW_DAYS", "36500"),
        ]))
        .expect("upper bound is accepted");
        assert_eq!(cfg.recurrence.upcoming_window_days, MAX_UPCOMING_WINDOW_DAYS);
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/billy"),
            ("JWT_SECRET", "s3cret"),
            ("RECURRING_HORIZON_MONTHS", "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("RECURRING_HORIZON_MONTHS"));
    }
}
