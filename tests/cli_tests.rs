// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use std::sync::Arc;
use tierpay::commands::{accounts, movements, settings};
use tierpay::config::{EngineConfig, get_setting};
use tierpay::gate::ServiceGate;
use tierpay::models::MovementStatus;
use tierpay::{Engine, EngineError, cli, db};

fn engine() -> Engine {
    Engine::new(
        db::open_in_memory().unwrap(),
        EngineConfig::default(),
        Arc::new(ServiceGate::default()),
    )
}

fn run_account(engine: &mut Engine, args: &[&str]) {
    let matches = cli::build_cli().get_matches_from(args.iter().copied());
    let Some(("account", sub)) = matches.subcommand() else {
        panic!("no account subcommand");
    };
    accounts::handle(engine, sub).unwrap();
}

#[test]
fn account_open_and_transfer_through_handlers() {
    let mut engine = engine();
    run_account(&mut engine, &["tierpay", "account", "open", "--id", "AD1"]);
    run_account(
        &mut engine,
        &["tierpay", "account", "open", "--id", "MD1", "--parent", "AD1"],
    );

    let matches = cli::build_cli().get_matches_from([
        "tierpay", "wallet", "load", "--admin", "AD1", "--amount", "250.50",
    ]);
    if let Some(("wallet", sub)) = matches.subcommand() {
        accounts::handle_wallet(&mut engine, sub).unwrap();
    } else {
        panic!("no wallet subcommand");
    }

    let matches = cli::build_cli().get_matches_from([
        "tierpay", "transfer", "--from", "AD1", "--to", "MD1", "--amount", "50",
        "--remarks", "float",
    ]);
    if let Some(("transfer", sub)) = matches.subcommand() {
        movements::handle_transfer(&mut engine, sub).unwrap();
    } else {
        panic!("no transfer subcommand");
    }

    assert_eq!(engine.balance("AD1").unwrap(), "200.50".parse::<Decimal>().unwrap());
    assert_eq!(engine.balance("MD1").unwrap(), Decimal::from(50));
    run_account(&mut engine, &["tierpay", "account", "show", "--id", "MD1", "--json"]);
}

#[test]
fn request_accept_by_id() {
    let mut engine = engine();
    run_account(&mut engine, &["tierpay", "account", "open", "--id", "AD1"]);
    run_account(
        &mut engine,
        &["tierpay", "account", "open", "--id", "MD1", "--parent", "AD1"],
    );
    let deadline = engine.deadline();
    engine
        .load_wallet(&deadline, "AD1", Decimal::from(100), "")
        .unwrap();
    let id = engine
        .create_request("MD1", "AD1", Decimal::from(40), "")
        .unwrap()
        .id;

    let id_arg = id.to_string();
    let matches = cli::build_cli().get_matches_from([
        "tierpay", "request", "accept", "--id", id_arg.as_str(),
    ]);
    let Some(("request", sub)) = matches.subcommand() else {
        panic!("no request subcommand");
    };
    movements::handle_request(&mut engine, sub).unwrap();
    assert_eq!(engine.movement(id).unwrap().status, MovementStatus::Accepted);

    // a second accept surfaces the engine error
    let err = movements::handle_request(&mut engine, sub).unwrap_err();
    assert_eq!(
        err.downcast_ref::<EngineError>(),
        Some(&EngineError::AlreadyProcessed(id))
    );
}

#[test]
fn gate_lock_is_persisted() {
    let mut engine = engine();
    let matches = cli::build_cli().get_matches_from(["tierpay", "gate", "lock"]);
    let Some(("gate", sub)) = matches.subcommand() else {
        panic!("no gate subcommand");
    };
    settings::handle_gate(&mut engine, sub).unwrap();
    assert_eq!(
        get_setting(engine.conn(), "service_locked").unwrap().as_deref(),
        Some("true")
    );
    assert!(EngineConfig::load(engine.conn()).unwrap().service_locked);
    assert!(matches!(
        engine.create_request("MD1", "AD1", Decimal::ONE, ""),
        Err(EngineError::ServiceLocked)
    ));
}

#[test]
fn parser_rejects_bad_input() {
    assert!(cli::build_cli()
        .try_get_matches_from(["tierpay", "request", "accept", "--id", "abc"])
        .is_err());
    assert!(cli::build_cli()
        .try_get_matches_from(["tierpay", "transfer", "--from", "AD1"])
        .is_err());
    assert!(cli::build_cli()
        .try_get_matches_from(["tierpay", "history", "--retailer", "RT1", "--json", "--jsonl"])
        .is_err());
    let m = cli::build_cli()
        .try_get_matches_from(["tierpay", "-vv", "reconcile"])
        .unwrap();
    assert_eq!(m.get_count("verbose"), 2);
}
