// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{amount_arg, arg, json_flags};
use crate::engine::Engine;
use crate::models::{Service, SettlementRecord};
use crate::settlement::{HttpProvider, SettlementRequest};
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;

fn rows(records: &[SettlementRecord]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|s| {
            vec![
                s.created_at.format("%Y-%m-%d %H:%M").to_string(),
                s.client_ref.clone(),
                s.service.to_string(),
                s.target.clone(),
                fmt_money(&s.amount),
                fmt_money(&s.charge),
                fmt_money(&s.commission.total),
                s.status.to_string(),
                s.provider_ref.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

const HEADERS: [&str; 9] = [
    "When", "Ref", "Service", "Target", "Amount", "Charge", "Commission", "Status", "Provider ref",
];

pub fn handle_settle(engine: &mut Engine, m: &clap::ArgMatches) -> Result<()> {
    let req = SettlementRequest {
        retailer_id: arg(m, "retailer")?.to_string(),
        service: arg(m, "service")?.parse::<Service>()?,
        target: arg(m, "target")?.to_string(),
        amount: amount_arg(m, "amount")?,
    };
    let provider = HttpProvider::from_config(engine.config())?;
    let deadline = engine.deadline();
    let rec = engine.settle(&provider, &deadline, &req)?;
    println!("{}", pretty_table(&HEADERS, rows(std::slice::from_ref(&rec))));
    if !rec.message.is_empty() {
        println!("{}", rec.message);
    }
    Ok(())
}

pub fn handle_reconcile(engine: &mut Engine, m: &clap::ArgMatches) -> Result<()> {
    let provider = HttpProvider::from_config(engine.config())?;
    match m.get_one::<String>("ref") {
        Some(client_ref) => {
            let rec = engine.reconcile_settlement(&provider, client_ref)?;
            println!("{} is {}", rec.client_ref, rec.status);
        }
        None => {
            let report = engine.reconcile_pending(&provider)?;
            println!(
                "Checked {} pending settlement(s): {} resolved, {} error(s)",
                report.checked, report.updated, report.errors
            );
        }
    }
    Ok(())
}

pub fn handle_history(engine: &mut Engine, m: &clap::ArgMatches) -> Result<()> {
    let retailer = arg(m, "retailer")?;
    let limit = *m.get_one::<usize>("limit").unwrap_or(&50);
    let provider = HttpProvider::from_config(engine.config())?;
    let history = engine.settlement_history(&provider, retailer, limit)?;

    let (j, jl) = json_flags(m);
    if maybe_print_json(j, jl, &history)? {
        return Ok(());
    }
    println!("{}", pretty_table(&HEADERS, rows(&history)));
    Ok(())
}
