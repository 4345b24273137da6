// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Wallet store. Writes only happen inside an immediate transaction, which
//! holds the database write lock from `BEGIN` to `COMMIT`/`ROLLBACK`.

use crate::error::{EngineError, EngineResult};
use crate::utils::decimal_col;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use rust_decimal::Decimal;

/// Balance read under the enclosing transaction's lock.
pub fn locked_balance(tx: &Transaction<'_>, account_id: &str) -> EngineResult<Decimal> {
    tracing::debug!(account = %account_id, "locking wallet");
    read_balance(tx, account_id)
}

/// Unconditional write; the caller has already checked non-negativity.
pub fn set_balance(tx: &Transaction<'_>, account_id: &str, balance: Decimal) -> EngineResult<()> {
    let n = tx.execute(
        "UPDATE wallets SET balance=?1, updated_at=datetime('now') WHERE account_id=?2",
        params![balance.to_string(), account_id],
    )?;
    if n == 0 {
        return Err(EngineError::AccountNotFound(account_id.to_string()));
    }
    Ok(())
}

/// Locks two wallets in lexicographic id order and returns their balances
/// in argument order.
pub fn lock_pair(tx: &Transaction<'_>, a: &str, b: &str) -> EngineResult<(Decimal, Decimal)> {
    if a <= b {
        let ba = locked_balance(tx, a)?;
        let bb = locked_balance(tx, b)?;
        Ok((ba, bb))
    } else {
        let bb = locked_balance(tx, b)?;
        let ba = locked_balance(tx, a)?;
        Ok((ba, bb))
    }
}

/// Unlocked read for display and pre-checks.
pub fn balance(conn: &Connection, account_id: &str) -> EngineResult<Decimal> {
    read_balance(conn, account_id)
}

fn read_balance(conn: &Connection, account_id: &str) -> EngineResult<Decimal> {
    conn.query_row(
        "SELECT balance FROM wallets WHERE account_id=?1",
        params![account_id],
        |r| decimal_col(r, 0),
    )
    .optional()?
    .ok_or_else(|| EngineError::AccountNotFound(account_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::TransactionBehavior;

    #[test]
    fn missing_wallet_is_account_not_found() {
        let mut conn = crate::db::open_in_memory().unwrap();
        crate::directory::open_account(&conn, "AD1", None).unwrap();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .unwrap();
        assert!(matches!(
            locked_balance(&tx, "AD2"),
            Err(EngineError::AccountNotFound(_))
        ));
        assert!(matches!(
            set_balance(&tx, "AD2", Decimal::ONE),
            Err(EngineError::AccountNotFound(_))
        ));
        set_balance(&tx, "AD1", Decimal::new(1250, 2)).unwrap();
        assert_eq!(locked_balance(&tx, "AD1").unwrap(), Decimal::new(1250, 2));
    }

    #[test]
    fn dropped_transaction_leaves_balance_untouched() {
        let mut conn = crate::db::open_in_memory().unwrap();
        crate::directory::open_account(&conn, "AD1", None).unwrap();
        {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .unwrap();
            set_balance(&tx, "AD1", Decimal::from(99)).unwrap();
        }
        assert_eq!(balance(&conn, "AD1").unwrap(), Decimal::ZERO);
    }
}
