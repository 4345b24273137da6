// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, json_flags};
use crate::engine::Engine;
use crate::ledger;
use crate::models::LedgerReason;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;

pub fn handle(engine: &mut Engine, m: &clap::ArgMatches) -> Result<()> {
    let reference = arg(m, "reference")?;
    let reason = arg(m, "reason")?.trim().to_ascii_uppercase().parse::<LedgerReason>()?;
    let entries = ledger::find_by_reference(engine.conn(), reference, reason)?;

    let (j, jl) = json_flags(m);
    if maybe_print_json(j, jl, &entries)? {
        return Ok(());
    }
    let rows = entries
        .iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                e.account_id.clone(),
                e.posting.credit_amount().map(|a| fmt_money(&a)).unwrap_or_default(),
                e.posting.debit_amount().map(|a| fmt_money(&a)).unwrap_or_default(),
                fmt_money(&e.before_balance),
                fmt_money(&e.after_balance),
                e.remarks.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["#", "Account", "Credit", "Debit", "Before", "After", "Remarks"],
            rows
        )
    );
    Ok(())
}
