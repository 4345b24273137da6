// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use std::sync::Arc;
use tierpay::config::EngineConfig;
use tierpay::gate::ServiceGate;
use tierpay::models::{LedgerReason, MovementKind, MovementStatus, Posting};
use tierpay::{Engine, EngineError, db, directory, ledger};

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn setup() -> Engine {
    let conn = db::open_in_memory().unwrap();
    directory::open_account(&conn, "AD1", None).unwrap();
    directory::open_account(&conn, "MD1", Some("AD1")).unwrap();
    directory::open_account(&conn, "DT1", Some("MD1")).unwrap();
    let mut engine = Engine::new(
        conn,
        EngineConfig::default(),
        Arc::new(ServiceGate::default()),
    );
    let deadline = engine.deadline();
    engine.load_wallet(&deadline, "AD1", d("1000"), "").unwrap();
    engine.transfer(&deadline, "AD1", "MD1", d("400"), "").unwrap();
    engine.transfer(&deadline, "MD1", "DT1", d("150"), "").unwrap();
    engine
}

#[test]
fn revert_pulls_funds_back_as_a_new_movement() {
    let mut engine = setup();
    let deadline = engine.deadline();
    let rec = engine
        .revert(&deadline, "MD1", "DT1", d("60"), "wrong distributor")
        .unwrap();

    assert_eq!(rec.kind, MovementKind::Revert);
    assert_eq!(rec.status, MovementStatus::Success);
    assert_eq!(rec.from_id, "DT1");
    assert_eq!(rec.to_id, "MD1");
    assert!(rec.reference_id().starts_with("RV"));
    assert_eq!(engine.balance("DT1").unwrap(), d("90"));
    assert_eq!(engine.balance("MD1").unwrap(), d("310"));

    let entries =
        ledger::find_by_reference(engine.conn(), &rec.reference_id(), LedgerReason::Revert)
            .unwrap();
    assert_eq!(entries.len(), 2);
    let on = entries.iter().find(|e| e.account_id == "DT1").unwrap();
    let back = entries.iter().find(|e| e.account_id == "MD1").unwrap();
    assert_eq!(on.posting, Posting::Debit(d("60")));
    assert_eq!(back.posting, Posting::Credit(d("60")));

    // the original transfer's entries are untouched
    let history = ledger::entries_for_account(engine.conn(), "DT1", 10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].reason, LedgerReason::FundTransfer);
    assert_eq!(history[1].after_balance, d("150"));
}

#[test]
fn revert_cannot_overdraw_target() {
    let mut engine = setup();
    let deadline = engine.deadline();
    assert!(matches!(
        engine.revert(&deadline, "MD1", "DT1", d("150.01"), ""),
        Err(EngineError::InsufficientBalance { ref account, .. }) if account == "DT1"
    ));
    assert_eq!(engine.balance("DT1").unwrap(), d("150"));
    assert_eq!(engine.balance("MD1").unwrap(), d("250"));
}

#[test]
fn revert_validates_inputs() {
    let mut engine = setup();
    let deadline = engine.deadline();
    assert_eq!(
        engine.revert(&deadline, "MD1", "MD1", d("1"), "").unwrap_err(),
        EngineError::SameAccount
    );
    assert!(matches!(
        engine.revert(&deadline, "MD1", "RT9", d("1"), ""),
        Err(EngineError::AccountNotFound(_))
    ));
    assert!(matches!(
        engine.revert(&deadline, "MD1", "DT1", d("-1"), ""),
        Err(EngineError::InvalidAmount(_))
    ));
}
