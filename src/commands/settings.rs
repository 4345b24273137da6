// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, json_flags};
use crate::config::{SETTING_KEYS, get_setting, set_setting};
use crate::engine::Engine;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;

pub fn handle_config(engine: &mut Engine, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let key = arg(sub, "key")?;
            set_setting(engine.conn(), key, arg(sub, "value")?)?;
            println!("Set {}", key);
        }
        Some(("show", sub)) => {
            let (j, jl) = json_flags(sub);
            if maybe_print_json(j, jl, engine.config())? {
                return Ok(());
            }
            let mut rows = Vec::new();
            for key in SETTING_KEYS {
                let stored = get_setting(engine.conn(), key)?;
                // never echo the key itself
                let shown = match (key, stored) {
                    ("provider_api_key", Some(_)) => "********".to_string(),
                    (_, Some(v)) => v,
                    (_, None) => "(default)".to_string(),
                };
                rows.push(vec![key.to_string(), shown]);
            }
            println!("{}", pretty_table(&["Key", "Value"], rows));
        }
        _ => {}
    }
    Ok(())
}

/// The flag is persisted so every worker process picks it up on start.
pub fn handle_gate(engine: &mut Engine, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("lock", _)) => {
            set_setting(engine.conn(), "service_locked", "true")?;
            engine.gate.lock();
            tracing::warn!("service gate locked");
            println!("Money movement halted");
        }
        Some(("unlock", _)) => {
            set_setting(engine.conn(), "service_locked", "false")?;
            engine.gate.unlock();
            tracing::info!("service gate unlocked");
            println!("Money movement resumed");
        }
        Some(("status", _)) | None => {
            let state = if engine.gate.is_locked() { "locked" } else { "open" };
            println!("Service gate is {}", state);
        }
        _ => {}
    }
    Ok(())
}
