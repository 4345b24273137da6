// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{amount_arg, arg, json_flags, print_movement};
use crate::engine::Engine;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use crate::{directory, ledger};
use anyhow::Result;
use serde_json::json;

pub fn handle(engine: &mut Engine, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("open", sub)) => {
            let id = arg(sub, "id")?;
            let parent = sub.get_one::<String>("parent").map(String::as_str);
            let acct = directory::open_account(engine.conn(), id, parent)?;
            match &acct.parent_id {
                Some(p) => println!("Opened {} account '{}' under '{}'", acct.tier, acct.id, p),
                None => println!("Opened {} account '{}'", acct.tier, acct.id),
            }
        }
        Some(("show", sub)) => {
            let id = arg(sub, "id")?;
            let limit = *sub.get_one::<usize>("limit").unwrap_or(&20);
            let acct = directory::get_account(engine.conn(), id)?;
            let balance = engine.balance(id)?;
            let entries = ledger::entries_for_account(engine.conn(), id, limit)?;

            let (j, jl) = json_flags(sub);
            let payload = json!({ "account": acct, "balance": balance, "entries": entries });
            if maybe_print_json(j, jl, &payload)? {
                return Ok(());
            }
            println!(
                "{} ({}) parent={} balance={}",
                acct.id,
                acct.tier,
                acct.parent_id.as_deref().unwrap_or("-"),
                fmt_money(&balance)
            );
            let rows = entries
                .iter()
                .map(|e| {
                    vec![
                        e.created_at.format("%Y-%m-%d %H:%M").to_string(),
                        e.reference_id.clone(),
                        e.reason.to_string(),
                        e.posting.credit_amount().map(|a| fmt_money(&a)).unwrap_or_default(),
                        e.posting.debit_amount().map(|a| fmt_money(&a)).unwrap_or_default(),
                        fmt_money(&e.after_balance),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["When", "Ref", "Reason", "Credit", "Debit", "Balance"], rows)
            );
        }
        _ => {}
    }
    Ok(())
}

/// `wallet load`: external deposits into an admin wallet.
pub fn handle_wallet(engine: &mut Engine, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("load", sub)) = m.subcommand() {
        let admin = arg(sub, "admin")?;
        let amount = amount_arg(sub, "amount")?;
        let deadline = engine.deadline();
        let rec = engine.load_wallet(&deadline, admin, amount, arg(sub, "remarks")?)?;
        print_movement(&rec);
    }
    Ok(())
}
