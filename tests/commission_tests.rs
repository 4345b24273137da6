// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use tierpay::commission::{PLATFORM_OWNER, resolve, split, upsert_split};
use tierpay::models::{CommissionSplit, Service};
use tierpay::{EngineError, db, directory};

fn setup() -> Connection {
    let conn = db::open_in_memory().unwrap();
    directory::open_account(&conn, "AD1", None).unwrap();
    directory::open_account(&conn, "MD1", Some("AD1")).unwrap();
    directory::open_account(&conn, "DT1", Some("MD1")).unwrap();
    directory::open_account(&conn, "RT1", Some("DT1")).unwrap();
    directory::open_account(&conn, "RT2", Some("DT1")).unwrap();
    conn
}

fn flat(owner: &str, service: Service, pct: &str) -> CommissionSplit {
    let p: Decimal = pct.parse().unwrap();
    CommissionSplit {
        owner_id: owner.into(),
        service,
        total_pct: p * Decimal::from(4),
        admin_pct: p,
        master_distributor_pct: p,
        distributor_pct: p,
        retailer_pct: p,
    }
}

#[test]
fn falls_back_to_platform_default() {
    let conn = setup();
    let s = resolve(&conn, "RT1", Service::ElectricityBill).unwrap();
    assert_eq!(s.owner_id, PLATFORM_OWNER);
    assert_eq!(s.total_pct, Decimal::ONE);
}

#[test]
fn nearest_owner_wins() {
    let conn = setup();
    upsert_split(&conn, &flat("MD1", Service::MobileRecharge, "0.3")).unwrap();
    assert_eq!(
        resolve(&conn, "RT1", Service::MobileRecharge).unwrap().owner_id,
        "MD1"
    );

    upsert_split(&conn, &flat("DT1", Service::MobileRecharge, "0.4")).unwrap();
    assert_eq!(
        resolve(&conn, "RT1", Service::MobileRecharge).unwrap().owner_id,
        "DT1"
    );

    upsert_split(&conn, &flat("RT1", Service::MobileRecharge, "0.5")).unwrap();
    assert_eq!(
        resolve(&conn, "RT1", Service::MobileRecharge).unwrap().owner_id,
        "RT1"
    );
    // sibling retailer still inherits the distributor's split
    assert_eq!(
        resolve(&conn, "RT2", Service::MobileRecharge).unwrap().owner_id,
        "DT1"
    );
    // other services are untouched
    assert_eq!(
        resolve(&conn, "RT1", Service::Payout).unwrap().owner_id,
        PLATFORM_OWNER
    );
}

#[test]
fn upsert_replaces_existing_split() {
    let conn = setup();
    upsert_split(&conn, &flat("DT1", Service::Payout, "0.1")).unwrap();
    upsert_split(&conn, &flat("DT1", Service::Payout, "0.2")).unwrap();
    let s = resolve(&conn, "RT1", Service::Payout).unwrap();
    assert_eq!(s.admin_pct, "0.2".parse::<Decimal>().unwrap());
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM commission_splits", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn upsert_rejects_bad_owners_and_percentages() {
    let conn = setup();
    assert!(matches!(
        upsert_split(&conn, &flat("AD1", Service::Payout, "0.1")),
        Err(EngineError::InvalidAccount(_))
    ));
    assert!(matches!(
        upsert_split(&conn, &flat("DT7", Service::Payout, "0.1")),
        Err(EngineError::AccountNotFound(_))
    ));
    assert!(matches!(
        upsert_split(&conn, &flat("DT1", Service::Payout, "-0.1")),
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(matches!(
        upsert_split(&conn, &flat("DT1", Service::Payout, "30")),
        Err(EngineError::InvalidAmount(_))
    ));
}

#[test]
fn broken_hierarchy_aborts_resolution() {
    let conn = setup();
    conn.execute_batch("PRAGMA foreign_keys = OFF; UPDATE accounts SET parent_id=NULL WHERE id='DT1';")
        .unwrap();
    assert!(matches!(
        resolve(&conn, "RT1", Service::MobileRecharge),
        Err(EngineError::InvalidAccount(_))
    ));
}

#[test]
fn one_unit_commission_on_150() {
    let conn = setup();
    let p: Decimal = "0.6667".parse().unwrap();
    let s = CommissionSplit {
        admin_pct: p,
        total_pct: p,
        master_distributor_pct: Decimal::ZERO,
        distributor_pct: Decimal::ZERO,
        retailer_pct: Decimal::ZERO,
        ..flat("RT1", Service::MobileRecharge, "0")
    };
    upsert_split(&conn, &s).unwrap();
    let amounts = split(
        &resolve(&conn, "RT1", Service::MobileRecharge).unwrap(),
        Decimal::from(150),
    )
    .unwrap();
    assert_eq!(amounts.admin, Decimal::ONE);
    assert_eq!(amounts.retailer, Decimal::ZERO);
}
