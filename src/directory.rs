// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Account directory: who an id is and who sits above it.

use crate::error::{EngineError, EngineResult};
use crate::models::{Account, Hierarchy, Tier};
use crate::utils::enum_col;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};

static ACCOUNT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(AD|MD|DT|RT)[0-9A-Z]{1,30}$").expect("static regex"));

/// Tier from the id alone. No storage lookup.
pub fn tier_of(id: &str) -> EngineResult<Tier> {
    let caps = ACCOUNT_ID
        .captures(id)
        .ok_or_else(|| EngineError::InvalidAccount(format!("'{}' is not a valid account id", id)))?;
    let prefix = &caps[1];
    Tier::ALL
        .into_iter()
        .find(|t| t.prefix() == prefix)
        .ok_or_else(|| EngineError::InvalidAccount(format!("unknown prefix in '{}'", id)))
}

pub fn find_account(conn: &Connection, id: &str) -> EngineResult<Option<Account>> {
    let acct = conn
        .query_row(
            "SELECT id, tier, parent_id FROM accounts WHERE id=?1",
            params![id],
            |r| {
                Ok(Account {
                    id: r.get(0)?,
                    tier: enum_col(r, 1)?,
                    parent_id: r.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(acct)
}

pub fn get_account(conn: &Connection, id: &str) -> EngineResult<Account> {
    find_account(conn, id)?.ok_or_else(|| EngineError::AccountNotFound(id.to_string()))
}

/// Tier of an existing account.
pub fn resolve_tier(conn: &Connection, id: &str) -> EngineResult<Tier> {
    let tier = tier_of(id)?;
    let acct = get_account(conn, id)?;
    if acct.tier != tier {
        return Err(EngineError::InvalidAccount(format!(
            "{} is stored as {} but its id says {}",
            id, acct.tier, tier
        )));
    }
    Ok(tier)
}

/// Walks exactly three parent hops up from a retailer. A missing or
/// mis-tiered hop fails the whole lookup.
pub fn resolve_hierarchy(conn: &Connection, retailer_id: &str) -> EngineResult<Hierarchy> {
    let retailer = get_account(conn, retailer_id)?;
    if retailer.tier != Tier::Retailer {
        return Err(EngineError::InvalidAccount(format!(
            "{} is a {}, not a retailer",
            retailer_id, retailer.tier
        )));
    }
    let distributor = parent_of(conn, &retailer, Tier::Distributor)?;
    let master = parent_of(conn, &distributor, Tier::MasterDistributor)?;
    let admin = parent_of(conn, &master, Tier::Admin)?;
    Ok(Hierarchy {
        distributor_id: distributor.id,
        master_distributor_id: master.id,
        admin_id: admin.id,
    })
}

fn parent_of(conn: &Connection, child: &Account, expected: Tier) -> EngineResult<Account> {
    let parent_id = child.parent_id.as_deref().ok_or_else(|| {
        EngineError::InvalidAccount(format!("{} has no {} above it", child.id, expected))
    })?;
    let parent = find_account(conn, parent_id)?.ok_or_else(|| {
        EngineError::InvalidAccount(format!(
            "parent {} of {} does not exist",
            parent_id, child.id
        ))
    })?;
    if parent.tier != expected {
        return Err(EngineError::InvalidAccount(format!(
            "parent {} of {} is a {}, expected {}",
            parent.id, child.id, parent.tier, expected
        )));
    }
    Ok(parent)
}

/// Registers an account with an empty wallet. Admins are roots; everyone
/// else hangs under an account exactly one tier up.
pub fn open_account(conn: &Connection, id: &str, parent_id: Option<&str>) -> EngineResult<Account> {
    let tier = tier_of(id)?;
    if find_account(conn, id)?.is_some() {
        return Err(EngineError::InvalidAccount(format!("{} already exists", id)));
    }
    match (tier.parent(), parent_id) {
        (None, None) => {}
        (None, Some(_)) => {
            return Err(EngineError::InvalidAccount(format!(
                "{} is an admin and cannot have a parent",
                id
            )));
        }
        (Some(expected), None) => {
            return Err(EngineError::InvalidAccount(format!(
                "{} needs a {} parent",
                id, expected
            )));
        }
        (Some(expected), Some(pid)) => {
            let parent = get_account(conn, pid)?;
            if parent.tier != expected {
                return Err(EngineError::InvalidAccount(format!(
                    "{} cannot sit under {} ({})",
                    id, pid, parent.tier
                )));
            }
        }
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO accounts(id, tier, parent_id) VALUES (?1, ?2, ?3)",
        params![id, tier.as_str(), parent_id],
    )?;
    tx.execute(
        "INSERT INTO wallets(account_id, balance) VALUES (?1, '0')",
        params![id],
    )?;
    tx.commit()?;
    tracing::info!(account = %id, tier = %tier, parent = ?parent_id, "account opened");
    Ok(Account {
        id: id.to_string(),
        tier,
        parent_id: parent_id.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_from_prefix() {
        assert_eq!(tier_of("AD1").unwrap(), Tier::Admin);
        assert_eq!(tier_of("MD77").unwrap(), Tier::MasterDistributor);
        assert_eq!(tier_of("DT0A").unwrap(), Tier::Distributor);
        assert_eq!(tier_of("RT123").unwrap(), Tier::Retailer);
        assert!(matches!(tier_of("XX1"), Err(EngineError::InvalidAccount(_))));
        assert!(matches!(tier_of("RT"), Err(EngineError::InvalidAccount(_))));
        assert!(matches!(tier_of("rt1"), Err(EngineError::InvalidAccount(_))));
    }

    #[test]
    fn hierarchy_walks_three_hops() {
        let conn = crate::db::open_in_memory().unwrap();
        open_account(&conn, "AD1", None).unwrap();
        open_account(&conn, "MD1", Some("AD1")).unwrap();
        open_account(&conn, "DT1", Some("MD1")).unwrap();
        open_account(&conn, "RT1", Some("DT1")).unwrap();

        let h = resolve_hierarchy(&conn, "RT1").unwrap();
        assert_eq!(h.distributor_id, "DT1");
        assert_eq!(h.master_distributor_id, "MD1");
        assert_eq!(h.admin_id, "AD1");
    }

    #[test]
    fn broken_hierarchy_is_a_hard_error() {
        let conn = crate::db::open_in_memory().unwrap();
        open_account(&conn, "AD1", None).unwrap();
        open_account(&conn, "MD1", Some("AD1")).unwrap();
        open_account(&conn, "DT1", Some("MD1")).unwrap();
        open_account(&conn, "RT1", Some("DT1")).unwrap();
        // simulate a dangling hop left behind by profile maintenance
        conn.execute_batch(
            "PRAGMA foreign_keys = OFF; UPDATE accounts SET parent_id='MD9' WHERE id='DT1';",
        )
        .unwrap();

        assert!(matches!(
            resolve_hierarchy(&conn, "RT1"),
            Err(EngineError::InvalidAccount(_))
        ));
        assert!(matches!(
            resolve_hierarchy(&conn, "RT5"),
            Err(EngineError::AccountNotFound(_))
        ));
    }

    #[test]
    fn open_account_enforces_parent_tier() {
        let conn = crate::db::open_in_memory().unwrap();
        open_account(&conn, "AD1", None).unwrap();
        assert!(open_account(&conn, "DT1", Some("AD1")).is_err());
        assert!(open_account(&conn, "MD1", None).is_err());
        assert!(open_account(&conn, "AD2", Some("AD1")).is_err());
        assert!(open_account(&conn, "AD1", None).is_err());
        assert!(matches!(
            open_account(&conn, "MD1", Some("AD9")),
            Err(EngineError::AccountNotFound(_))
        ));
    }
}
