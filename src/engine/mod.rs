// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Money-movement engine.
//!
//! Every wallet mutation runs inside one `BEGIN IMMEDIATE` transaction that
//! covers the balance reads, the arithmetic, the ledger append and the
//! movement record. Returning early drops the transaction, which rolls all
//! of it back.
//!
//! `MovementRecord::from_id`/`to_id` always follow the money: `from_id` is
//! the debited wallet and `to_id` the credited one.

mod request;
mod revert;
mod transfer;

use crate::config::EngineConfig;
use crate::db::DEFAULT_BUSY_TIMEOUT;
use crate::error::{EngineError, EngineResult};
use crate::gate::ServiceGate;
use crate::ledger::{self, NewLedgerEntry};
use crate::models::{LedgerReason, MovementKind, MovementRecord, MovementStatus, Posting};
use crate::utils::{decimal_col, enum_col};
use crate::wallet;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Point in time after which an operation gives up and rolls back.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    pub fn remaining(&self) -> EngineResult<Duration> {
        let left = self.at.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(EngineError::DeadlineExceeded);
        }
        Ok(left)
    }

    pub fn check(&self) -> EngineResult<()> {
        self.remaining().map(|_| ())
    }
}

/// One engine per worker; workers share the database file and the gate.
pub struct Engine {
    pub(crate) conn: Connection,
    pub(crate) config: EngineConfig,
    pub(crate) gate: Arc<ServiceGate>,
}

impl Engine {
    pub fn new(conn: Connection, config: EngineConfig, gate: Arc<ServiceGate>) -> Self {
        Self { conn, config, gate }
    }

    pub fn open(path: &Path, gate: Arc<ServiceGate>) -> anyhow::Result<Self> {
        let conn = crate::db::open_at(path)?;
        let config = EngineConfig::load(&conn)?;
        Ok(Self::new(conn, config, gate))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Deadline using the configured operation budget.
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.config.operation_timeout)
    }

    pub fn balance(&self, account_id: &str) -> EngineResult<Decimal> {
        wallet::balance(&self.conn, account_id)
    }

    pub fn movement(&self, id: i64) -> EngineResult<MovementRecord> {
        get_movement(&self.conn, id)
    }
}

/// Runs `f` inside one `BEGIN IMMEDIATE` transaction bounded by `deadline`.
/// The deadline is checked again right before commit.
pub(crate) fn write_within<T>(
    conn: &mut Connection,
    deadline: &Deadline,
    f: impl FnOnce(&Transaction<'_>) -> EngineResult<T>,
) -> EngineResult<T> {
    write_locked(conn, deadline.remaining()?, |tx| {
        let value = f(tx)?;
        deadline.check()?;
        Ok(value)
    })
}

/// Runs `f` inside one `BEGIN IMMEDIATE` transaction, waiting for the write
/// lock at most `budget`, and commits when `f` succeeds. The busy timeout
/// goes back to `DEFAULT_BUSY_TIMEOUT` afterwards, committed or not.
pub(crate) fn write_locked<T>(
    conn: &mut Connection,
    budget: Duration,
    f: impl FnOnce(&Transaction<'_>) -> EngineResult<T>,
) -> EngineResult<T> {
    conn.busy_timeout(budget)?;
    let out = run_immediate(conn, f);
    let restored = conn.busy_timeout(DEFAULT_BUSY_TIMEOUT);
    let value = out?;
    restored?;
    Ok(value)
}

fn run_immediate<T>(
    conn: &mut Connection,
    f: impl FnOnce(&Transaction<'_>) -> EngineResult<T>,
) -> EngineResult<T> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Applies one posting to a wallet whose balance was read under the lock
/// and logs it. Returns the new balance.
pub(crate) fn post(
    tx: &Transaction<'_>,
    account_id: &str,
    before: Decimal,
    posting: Posting,
    reference_id: &str,
    reason: LedgerReason,
    remarks: &str,
) -> EngineResult<Decimal> {
    let after = before.checked_add(posting.delta()).ok_or_else(|| {
        EngineError::InvalidAmount(format!(
            "{} {:?} overflows the balance of {}",
            before, posting, account_id
        ))
    })?;
    if after < Decimal::ZERO {
        return Err(EngineError::InsufficientBalance {
            account: account_id.to_string(),
            available: before,
            required: -posting.delta(),
        });
    }
    wallet::set_balance(tx, account_id, after)?;
    ledger::append(
        tx,
        &NewLedgerEntry {
            account_id,
            reference_id,
            posting,
            before_balance: before,
            after_balance: after,
            reason,
            remarks,
        },
    )?;
    Ok(after)
}

/// Debits `payer` and credits `payee` with a paired pair of ledger entries.
/// Both wallets are locked in the global id order first.
pub(crate) fn move_funds(
    tx: &Transaction<'_>,
    payer: &str,
    payee: &str,
    amount: Decimal,
    reference_id: &str,
    reason: LedgerReason,
    remarks: &str,
) -> EngineResult<()> {
    let (payer_before, payee_before) = wallet::lock_pair(tx, payer, payee)?;
    if payer_before < amount {
        return Err(EngineError::InsufficientBalance {
            account: payer.to_string(),
            available: payer_before,
            required: amount,
        });
    }
    post(
        tx,
        payer,
        payer_before,
        Posting::Debit(amount),
        reference_id,
        reason,
        remarks,
    )?;
    post(
        tx,
        payee,
        payee_before,
        Posting::Credit(amount),
        reference_id,
        reason,
        remarks,
    )?;
    Ok(())
}

pub(crate) fn insert_movement(
    conn: &Connection,
    kind: MovementKind,
    from_id: &str,
    to_id: &str,
    amount: Decimal,
    remarks: &str,
) -> EngineResult<i64> {
    conn.execute(
        "INSERT INTO movements(kind, from_id, to_id, amount, status, remarks) VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5)",
        params![kind.as_str(), from_id, to_id, amount.to_string(), remarks],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Compare-and-set on the status column. `false` means someone else
/// already moved the record out of `expected`.
pub(crate) fn set_movement_status(
    conn: &Connection,
    id: i64,
    expected: MovementStatus,
    next: MovementStatus,
) -> EngineResult<bool> {
    let n = conn.execute(
        "UPDATE movements SET status=?1, updated_at=datetime('now') WHERE id=?2 AND status=?3",
        params![next.as_str(), id, expected.as_str()],
    )?;
    Ok(n > 0)
}

pub(crate) fn find_movement(conn: &Connection, id: i64) -> EngineResult<Option<MovementRecord>> {
    let rec = conn
        .query_row(
            "SELECT id, kind, from_id, to_id, amount, status, remarks, created_at FROM movements WHERE id=?1",
            params![id],
            |r| {
                Ok(MovementRecord {
                    id: r.get(0)?,
                    kind: enum_col(r, 1)?,
                    from_id: r.get(2)?,
                    to_id: r.get(3)?,
                    amount: decimal_col(r, 4)?,
                    status: enum_col(r, 5)?,
                    remarks: r.get(6)?,
                    created_at: r.get(7)?,
                })
            },
        )
        .optional()?;
    Ok(rec)
}

pub(crate) fn get_movement(conn: &Connection, id: i64) -> EngineResult<MovementRecord> {
    find_movement(conn, id)?.ok_or(EngineError::MovementNotFound(id))
}
