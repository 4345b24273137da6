// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;

pub const SETTING_KEYS: [&str; 6] = [
    "provider_url",
    "provider_api_key",
    "provider_timeout_secs",
    "operation_timeout_secs",
    "commission_min_recharge",
    "service_locked",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineConfig {
    pub provider_url: String,
    pub provider_api_key: Option<String>,
    /// Kept shorter than `operation_timeout` so a slow provider fails the
    /// attempt before the caller's deadline does.
    pub provider_timeout: Duration,
    pub operation_timeout: Duration,
    /// Recharges below this amount carry no commission.
    pub commission_min_recharge: Decimal,
    pub service_locked: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider_url: "http://127.0.0.1:8085".to_string(),
            provider_api_key: None,
            provider_timeout: Duration::from_secs(10),
            operation_timeout: Duration::from_secs(30),
            commission_min_recharge: Decimal::from(10),
            service_locked: false,
        }
    }
}

impl EngineConfig {
    /// Defaults, then the settings table, then `TIERPAY_*` environment variables.
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut cfg = Self::default();
        for key in SETTING_KEYS {
            if let Some(v) = get_setting(conn, key)? {
                cfg.apply(key, &v)?;
            }
        }
        for (var, key) in [
            ("TIERPAY_PROVIDER_URL", "provider_url"),
            ("TIERPAY_PROVIDER_API_KEY", "provider_api_key"),
            ("TIERPAY_PROVIDER_TIMEOUT_SECS", "provider_timeout_secs"),
            ("TIERPAY_OPERATION_TIMEOUT_SECS", "operation_timeout_secs"),
        ] {
            if let Ok(v) = std::env::var(var) {
                cfg.apply(key, &v)
                    .with_context(|| format!("Invalid value in ${}", var))?;
            }
        }
        Ok(cfg)
    }

    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "provider_url" => self.provider_url = value.trim_end_matches('/').to_string(),
            "provider_api_key" => {
                self.provider_api_key = (!value.is_empty()).then(|| value.to_string())
            }
            "provider_timeout_secs" => self.provider_timeout = parse_secs(key, value)?,
            "operation_timeout_secs" => self.operation_timeout = parse_secs(key, value)?,
            "commission_min_recharge" => {
                self.commission_min_recharge = crate::utils::parse_decimal(value)?
            }
            "service_locked" => {
                self.service_locked = match value {
                    "1" | "true" | "yes" => true,
                    "0" | "false" | "no" => false,
                    other => return Err(anyhow!("Invalid boolean '{}' for {}", other, key)),
                }
            }
            other => return Err(anyhow!("Unknown setting '{}'", other)),
        }
        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    let secs: u64 = value
        .parse()
        .with_context(|| format!("Invalid seconds '{}' for {}", value, key))?;
    if secs == 0 {
        return Err(anyhow!("{} must be at least 1 second", key));
    }
    Ok(Duration::from_secs(secs))
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    // validate before persisting so a bad row can never break `load`
    EngineConfig::default().apply(key, value)?;
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value.trim()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_override_defaults() {
        let conn = crate::db::open_in_memory().unwrap();
        set_setting(&conn, "provider_timeout_secs", " 4 ").unwrap();
        set_setting(&conn, "commission_min_recharge", "25.50").unwrap();
        set_setting(&conn, "provider_url", "https://gw.example/").unwrap();

        let cfg = EngineConfig::load(&conn).unwrap();
        assert_eq!(cfg.provider_timeout, Duration::from_secs(4));
        assert_eq!(cfg.commission_min_recharge, Decimal::new(2550, 2));
        assert_eq!(cfg.provider_url, "https://gw.example");
        assert_eq!(cfg.operation_timeout, Duration::from_secs(30));
    }

    #[test]
    fn invalid_settings_are_rejected_before_storage() {
        let conn = crate::db::open_in_memory().unwrap();
        assert!(set_setting(&conn, "provider_timeout_secs", "0").is_err());
        assert!(set_setting(&conn, "service_locked", "maybe").is_err());
        assert!(set_setting(&conn, "base_currency", "USD").is_err());
        assert_eq!(get_setting(&conn, "service_locked").unwrap(), None);
    }
}
