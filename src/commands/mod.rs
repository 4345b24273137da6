// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod commission;
pub mod ledger;
pub mod movements;
pub mod settings;
pub mod settlements;

use crate::models::MovementRecord;
use crate::utils::{fmt_money, parse_decimal, pretty_table};
use anyhow::{Context, Result};
use clap::ArgMatches;
use rust_decimal::Decimal;

pub(crate) fn arg<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a str> {
    m.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("Missing --{}", name))
}

pub(crate) fn amount_arg(m: &ArgMatches, name: &str) -> Result<Decimal> {
    parse_decimal(arg(m, name)?)
}

pub(crate) fn json_flags(m: &ArgMatches) -> (bool, bool) {
    (m.get_flag("json"), m.get_flag("jsonl"))
}

pub(crate) fn print_movement(rec: &MovementRecord) {
    let rows = vec![vec![
        rec.reference_id(),
        rec.kind.as_str().to_string(),
        rec.from_id.clone(),
        rec.to_id.clone(),
        fmt_money(&rec.amount),
        rec.status.to_string(),
        rec.created_at.format("%Y-%m-%d %H:%M").to_string(),
    ]];
    println!(
        "{}",
        pretty_table(
            &["Ref", "Kind", "From", "To", "Amount", "Status", "Created"],
            rows
        )
    );
}
