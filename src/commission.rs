// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Commission resolution: retailer, then distributor, then master
//! distributor, then the platform default. First match wins.

use crate::directory;
use crate::error::{EngineError, EngineResult};
use crate::models::{CommissionAmounts, CommissionSplit, Service};
use crate::utils::{decimal_col, enum_col, round_money};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

pub const PLATFORM_OWNER: &str = "PLATFORM";

pub fn platform_default(service: Service) -> CommissionSplit {
    // (total, admin, master distributor, distributor, retailer), hundredths of a percent
    let (t, a, m, d, r) = match service {
        Service::MobileRecharge => (300, 50, 50, 50, 150),
        Service::PostpaidRecharge => (200, 40, 40, 40, 80),
        Service::ElectricityBill => (100, 25, 25, 25, 25),
        Service::Payout => (100, 20, 20, 20, 40),
    };
    CommissionSplit {
        owner_id: PLATFORM_OWNER.to_string(),
        service,
        total_pct: Decimal::new(t, 2),
        admin_pct: Decimal::new(a, 2),
        master_distributor_pct: Decimal::new(m, 2),
        distributor_pct: Decimal::new(d, 2),
        retailer_pct: Decimal::new(r, 2),
    }
}

pub fn find_split(
    conn: &Connection,
    owner_id: &str,
    service: Service,
) -> EngineResult<Option<CommissionSplit>> {
    let split = conn
        .query_row(
            "SELECT owner_id, service, total_pct, admin_pct, master_distributor_pct, distributor_pct, retailer_pct
             FROM commission_splits WHERE owner_id=?1 AND service=?2",
            params![owner_id, service.as_str()],
            |r| {
                Ok(CommissionSplit {
                    owner_id: r.get(0)?,
                    service: enum_col(r, 1)?,
                    total_pct: decimal_col(r, 2)?,
                    admin_pct: decimal_col(r, 3)?,
                    master_distributor_pct: decimal_col(r, 4)?,
                    distributor_pct: decimal_col(r, 5)?,
                    retailer_pct: decimal_col(r, 6)?,
                })
            },
        )
        .optional()?;
    Ok(split)
}

pub fn resolve(conn: &Connection, retailer_id: &str, service: Service) -> EngineResult<CommissionSplit> {
    if let Some(split) = find_split(conn, retailer_id, service)? {
        return Ok(split);
    }
    let hierarchy = directory::resolve_hierarchy(conn, retailer_id)?;
    for owner in [&hierarchy.distributor_id, &hierarchy.master_distributor_id] {
        if let Some(split) = find_split(conn, owner, service)? {
            return Ok(split);
        }
    }
    tracing::debug!(retailer = %retailer_id, service = %service, "using platform default commission");
    Ok(platform_default(service))
}

/// Percentages to currency, each rounded half-up on its own. The tier
/// amounts may drift a cent from `total`; that drift is kept as is.
pub fn split(split: &CommissionSplit, amount: Decimal) -> EngineResult<CommissionAmounts> {
    let pct = |p: Decimal| {
        amount
            .checked_mul(p)
            .map(|v| round_money(v / Decimal::ONE_HUNDRED))
            .ok_or_else(|| {
                EngineError::InvalidAmount(format!("commission of {}% on {} overflows", p, amount))
            })
    };
    Ok(CommissionAmounts {
        admin: pct(split.admin_pct)?,
        master_distributor: pct(split.master_distributor_pct)?,
        distributor: pct(split.distributor_pct)?,
        retailer: pct(split.retailer_pct)?,
        total: pct(split.total_pct)?,
    })
}

pub fn upsert_split(conn: &Connection, split: &CommissionSplit) -> EngineResult<()> {
    if split.owner_id != PLATFORM_OWNER {
        let tier = directory::resolve_tier(conn, &split.owner_id)?;
        if tier == crate::models::Tier::Admin {
            return Err(EngineError::InvalidAccount(format!(
                "{} is an admin; splits are owned by retailers and distributors",
                split.owner_id
            )));
        }
    }
    let pcts = [
        split.total_pct,
        split.admin_pct,
        split.master_distributor_pct,
        split.distributor_pct,
        split.retailer_pct,
    ];
    if pcts.iter().any(|p| *p < Decimal::ZERO || *p > Decimal::ONE_HUNDRED) {
        return Err(EngineError::InvalidAmount(
            "commission percentages must be between 0 and 100".into(),
        ));
    }
    conn.execute(
        "INSERT INTO commission_splits(owner_id, service, total_pct, admin_pct, master_distributor_pct, distributor_pct, retailer_pct)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(owner_id, service) DO UPDATE SET
            total_pct=excluded.total_pct,
            admin_pct=excluded.admin_pct,
            master_distributor_pct=excluded.master_distributor_pct,
            distributor_pct=excluded.distributor_pct,
            retailer_pct=excluded.retailer_pct",
        params![
            split.owner_id,
            split.service.as_str(),
            split.total_pct.to_string(),
            split.admin_pct.to_string(),
            split.master_distributor_pct.to_string(),
            split.distributor_pct.to_string(),
            split.retailer_pct.to_string(),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_rounds_each_tier_independently() {
        let s = CommissionSplit {
            owner_id: "RT1".into(),
            service: Service::MobileRecharge,
            total_pct: Decimal::new(100, 2),
            admin_pct: Decimal::new(25, 2),
            master_distributor_pct: Decimal::new(25, 2),
            distributor_pct: Decimal::new(25, 2),
            retailer_pct: Decimal::new(25, 2),
        };
        // 0.25% of 10.10 = 0.02525 -> 0.03 each; total 1% = 0.101 -> 0.10
        let a = split(&s, Decimal::new(1010, 2)).unwrap();
        assert_eq!(a.admin, Decimal::new(3, 2));
        assert_eq!(a.retailer, Decimal::new(3, 2));
        assert_eq!(a.total, Decimal::new(10, 2));
        assert_ne!(
            a.admin + a.master_distributor + a.distributor + a.retailer,
            a.total
        );
    }

    #[test]
    fn oversized_amount_is_an_error() {
        let s = CommissionSplit {
            total_pct: Decimal::ONE_HUNDRED,
            ..platform_default(Service::Payout)
        };
        assert!(matches!(
            split(&s, Decimal::MAX),
            Err(EngineError::InvalidAmount(_))
        ));
    }

    #[test]
    fn defaults_cover_every_service() {
        for svc in Service::ALL {
            let d = platform_default(svc);
            assert_eq!(d.owner_id, PLATFORM_OWNER);
            assert!(d.total_pct > Decimal::ZERO);
        }
    }
}
