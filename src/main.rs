// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::sync::Arc;

use tierpay::config::EngineConfig;
use tierpay::gate::ServiceGate;
use tierpay::{Engine, cli, commands, db, logging};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();
    logging::init(matches.get_count("verbose"));

    let conn = db::open_or_init()?;
    let config = EngineConfig::load(&conn)?;
    let gate = Arc::new(ServiceGate::new(config.service_locked));
    let mut engine = Engine::new(conn, config, gate);

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("account", sub)) => commands::accounts::handle(&mut engine, sub)?,
        Some(("wallet", sub)) => commands::accounts::handle_wallet(&mut engine, sub)?,
        Some(("transfer", sub)) => commands::movements::handle_transfer(&mut engine, sub)?,
        Some(("request", sub)) => commands::movements::handle_request(&mut engine, sub)?,
        Some(("revert", sub)) => commands::movements::handle_revert(&mut engine, sub)?,
        Some(("settle", sub)) => commands::settlements::handle_settle(&mut engine, sub)?,
        Some(("reconcile", sub)) => commands::settlements::handle_reconcile(&mut engine, sub)?,
        Some(("history", sub)) => commands::settlements::handle_history(&mut engine, sub)?,
        Some(("commission", sub)) => commands::commission::handle(&mut engine, sub)?,
        Some(("ledger", sub)) => commands::ledger::handle(&mut engine, sub)?,
        Some(("config", sub)) => commands::settings::handle_config(&mut engine, sub)?,
        Some(("gate", sub)) => commands::settings::handle_gate(&mut engine, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
