// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{EngineError, EngineResult};
use crate::models::{LedgerEntry, LedgerReason, Posting};
use crate::utils::{decimal_col, enum_col, opt_decimal_col};
use rusqlite::{Connection, Transaction, params};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct NewLedgerEntry<'a> {
    pub account_id: &'a str,
    pub reference_id: &'a str,
    pub posting: Posting,
    pub before_balance: Decimal,
    pub after_balance: Decimal,
    pub reason: LedgerReason,
    pub remarks: &'a str,
}

/// Appends one entry. The balances are taken as given; only
/// `after = before + credit - debit` is checked.
pub fn append(tx: &Transaction<'_>, entry: &NewLedgerEntry<'_>) -> EngineResult<i64> {
    if entry.before_balance.checked_add(entry.posting.delta()) != Some(entry.after_balance) {
        return Err(EngineError::TransactionAborted(format!(
            "ledger arithmetic mismatch for {}: {} {:?} != {}",
            entry.account_id, entry.before_balance, entry.posting, entry.after_balance
        )));
    }
    tx.execute(
        "INSERT INTO ledger_entries(account_id, reference_id, credit_amount, debit_amount, before_balance, after_balance, reason, remarks)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.account_id,
            entry.reference_id,
            entry.posting.credit_amount().map(|d| d.to_string()),
            entry.posting.debit_amount().map(|d| d.to_string()),
            entry.before_balance.to_string(),
            entry.after_balance.to_string(),
            entry.reason.as_str(),
            entry.remarks,
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

const SELECT_ENTRY: &str = "SELECT id, account_id, reference_id, credit_amount, debit_amount, before_balance, after_balance, reason, remarks, created_at FROM ledger_entries";

fn entry_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let credit = opt_decimal_col(r, 3)?;
    let debit = opt_decimal_col(r, 4)?;
    let posting = match (credit, debit) {
        (Some(c), None) => Posting::Credit(c),
        (None, Some(d)) => Posting::Debit(d),
        _ => {
            return Err(rusqlite::Error::InvalidColumnType(
                3,
                "credit_amount".into(),
                rusqlite::types::Type::Null,
            ));
        }
    };
    Ok(LedgerEntry {
        id: r.get(0)?,
        account_id: r.get(1)?,
        reference_id: r.get(2)?,
        posting,
        before_balance: decimal_col(r, 5)?,
        after_balance: decimal_col(r, 6)?,
        reason: enum_col(r, 7)?,
        remarks: r.get(8)?,
        created_at: r.get(9)?,
    })
}

pub fn find_by_reference(
    conn: &Connection,
    reference_id: &str,
    reason: LedgerReason,
) -> EngineResult<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare_cached(&format!(
        "{} WHERE reference_id=?1 AND reason=?2 ORDER BY id",
        SELECT_ENTRY
    ))?;
    let rows = stmt
        .query_map(params![reference_id, reason.as_str()], entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn entries_for_account(
    conn: &Connection,
    account_id: &str,
    limit: usize,
) -> EngineResult<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare_cached(&format!(
        "{} WHERE account_id=?1 ORDER BY id DESC LIMIT ?2",
        SELECT_ENTRY
    ))?;
    let rows = stmt
        .query_map(params![account_id, limit as i64], entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::TransactionBehavior;

    #[test]
    fn append_rejects_inconsistent_balances() {
        let mut conn = crate::db::open_in_memory().unwrap();
        crate::directory::open_account(&conn, "AD1", None).unwrap();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .unwrap();
        let bad = NewLedgerEntry {
            account_id: "AD1",
            reference_id: "WL1",
            posting: Posting::Credit(Decimal::from(10)),
            before_balance: Decimal::ZERO,
            after_balance: Decimal::from(11),
            reason: LedgerReason::WalletLoad,
            remarks: "",
        };
        assert!(matches!(
            append(&tx, &bad),
            Err(EngineError::TransactionAborted(_))
        ));

        let good = NewLedgerEntry {
            after_balance: Decimal::from(10),
            ..bad
        };
        append(&tx, &good).unwrap();
        tx.commit().unwrap();

        let found = find_by_reference(&conn, "WL1", LedgerReason::WalletLoad).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].posting, Posting::Credit(Decimal::from(10)));
        assert!(
            find_by_reference(&conn, "WL1", LedgerReason::FundTransfer)
                .unwrap()
                .is_empty()
        );
    }
}
