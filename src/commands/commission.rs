// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{amount_arg, arg, json_flags};
use crate::commission;
use crate::engine::Engine;
use crate::models::{CommissionSplit, Service};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;
use serde_json::json;

pub fn handle(engine: &mut Engine, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let split = CommissionSplit {
                owner_id: arg(sub, "owner")?.to_string(),
                service: arg(sub, "service")?.parse::<Service>()?,
                total_pct: amount_arg(sub, "total")?,
                admin_pct: amount_arg(sub, "admin")?,
                master_distributor_pct: amount_arg(sub, "md")?,
                distributor_pct: amount_arg(sub, "dist")?,
                retailer_pct: amount_arg(sub, "retailer")?,
            };
            commission::upsert_split(engine.conn(), &split)?;
            println!("Saved {} split for '{}'", split.service, split.owner_id);
        }
        Some(("show", sub)) => {
            let retailer = arg(sub, "retailer")?;
            let service = arg(sub, "service")?.parse::<Service>()?;
            let split = commission::resolve(engine.conn(), retailer, service)?;
            let amounts = sub
                .get_one::<String>("amount")
                .map(|a| parse_decimal(a))
                .transpose()?
                .map(|a| commission::split(&split, a))
                .transpose()?;

            let (j, jl) = json_flags(sub);
            if maybe_print_json(j, jl, &json!({ "split": split, "amounts": amounts }))? {
                return Ok(());
            }
            println!("Split owned by '{}'", split.owner_id);
            let pct = |p| format!("{}%", p);
            let mut rows = vec![vec![
                "Percent".to_string(),
                pct(split.total_pct),
                pct(split.admin_pct),
                pct(split.master_distributor_pct),
                pct(split.distributor_pct),
                pct(split.retailer_pct),
            ]];
            if let Some(a) = amounts {
                rows.push(vec![
                    "Amount".to_string(),
                    fmt_money(&a.total),
                    fmt_money(&a.admin),
                    fmt_money(&a.master_distributor),
                    fmt_money(&a.distributor),
                    fmt_money(&a.retailer),
                ]);
            }
            println!(
                "{}",
                pretty_table(
                    &["", "Total", "Admin", "Master dist.", "Distributor", "Retailer"],
                    rows
                )
            );
        }
        _ => {}
    }
    Ok(())
}
