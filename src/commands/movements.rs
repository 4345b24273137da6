// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{amount_arg, arg, print_movement};
use crate::engine::Engine;
use anyhow::{Context, Result};

pub fn handle_transfer(engine: &mut Engine, m: &clap::ArgMatches) -> Result<()> {
    let from = arg(m, "from")?;
    let to = arg(m, "to")?;
    let amount = amount_arg(m, "amount")?;
    let deadline = engine.deadline();
    let rec = engine.transfer(&deadline, from, to, amount, arg(m, "remarks")?)?;
    print_movement(&rec);
    Ok(())
}

pub fn handle_request(engine: &mut Engine, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("create", sub)) => {
            let requester = arg(sub, "requester")?;
            let payer = arg(sub, "payer")?;
            let amount = amount_arg(sub, "amount")?;
            let rec = engine.create_request(requester, payer, amount, arg(sub, "remarks")?)?;
            println!("Created fund request #{}", rec.id);
            print_movement(&rec);
        }
        Some(("accept", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing --id")?;
            let deadline = engine.deadline();
            let rec = engine.accept_request(&deadline, id)?;
            print_movement(&rec);
        }
        Some(("reject", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing --id")?;
            let deadline = engine.deadline();
            let rec = engine.reject_request(&deadline, id)?;
            print_movement(&rec);
        }
        _ => {}
    }
    Ok(())
}

pub fn handle_revert(engine: &mut Engine, m: &clap::ArgMatches) -> Result<()> {
    let reverser = arg(m, "from")?;
    let on = arg(m, "on")?;
    let amount = amount_arg(m, "amount")?;
    let deadline = engine.deadline();
    let rec = engine.revert(&deadline, reverser, on, amount, arg(m, "remarks")?)?;
    print_movement(&rec);
    Ok(())
}
