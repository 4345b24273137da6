// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Tierpay", "tierpay"));

/// Lock waits longer than this surface as a deadline error unless an
/// operation sets its own budget.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var("TIERPAY_DB") {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("tierpay.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    open_at(&path)
}

/// Each worker owns its connection; they meet at the file's write lock.
pub fn open_at(path: &Path) -> Result<Connection> {
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |r| r.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id TEXT PRIMARY KEY,
        tier TEXT NOT NULL CHECK(tier IN ('ADMIN','MASTER_DISTRIBUTOR','DISTRIBUTOR','RETAILER')),
        parent_id TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(parent_id) REFERENCES accounts(id)
    );
    CREATE INDEX IF NOT EXISTS idx_accounts_parent ON accounts(parent_id);

    CREATE TABLE IF NOT EXISTS wallets(
        account_id TEXT PRIMARY KEY,
        balance TEXT NOT NULL DEFAULT '0',
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(account_id) REFERENCES accounts(id)
    );

    CREATE TABLE IF NOT EXISTS ledger_entries(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id TEXT NOT NULL,
        reference_id TEXT NOT NULL,
        credit_amount TEXT,
        debit_amount TEXT,
        before_balance TEXT NOT NULL,
        after_balance TEXT NOT NULL,
        reason TEXT NOT NULL,
        remarks TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        CHECK((credit_amount IS NULL) <> (debit_amount IS NULL)),
        FOREIGN KEY(account_id) REFERENCES accounts(id)
    );
    CREATE INDEX IF NOT EXISTS idx_ledger_reference ON ledger_entries(reference_id, reason);
    CREATE INDEX IF NOT EXISTS idx_ledger_account ON ledger_entries(account_id);

    CREATE TABLE IF NOT EXISTS movements(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL,
        from_id TEXT NOT NULL,
        to_id TEXT NOT NULL,
        amount TEXT NOT NULL,
        status TEXT NOT NULL CHECK(status IN ('PENDING','SUCCESS','FAILED','ACCEPTED','REJECTED')),
        remarks TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_movements_status ON movements(kind, status);

    CREATE TABLE IF NOT EXISTS commission_splits(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id TEXT NOT NULL,
        service TEXT NOT NULL,
        total_pct TEXT NOT NULL,
        admin_pct TEXT NOT NULL,
        master_distributor_pct TEXT NOT NULL,
        distributor_pct TEXT NOT NULL,
        retailer_pct TEXT NOT NULL,
        UNIQUE(owner_id, service)
    );

    CREATE TABLE IF NOT EXISTS settlements(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        client_ref TEXT NOT NULL UNIQUE,
        retailer_id TEXT NOT NULL,
        service TEXT NOT NULL,
        target TEXT NOT NULL,
        amount TEXT NOT NULL,
        charge TEXT NOT NULL DEFAULT '0',
        admin_commission TEXT NOT NULL DEFAULT '0',
        master_distributor_commission TEXT NOT NULL DEFAULT '0',
        distributor_commission TEXT NOT NULL DEFAULT '0',
        retailer_commission TEXT NOT NULL DEFAULT '0',
        total_commission TEXT NOT NULL DEFAULT '0',
        status TEXT NOT NULL CHECK(status IN ('INITIATED','SUCCESS','PENDING','FAILED')),
        provider_ref TEXT,
        message TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(retailer_id) REFERENCES accounts(id)
    );
    CREATE INDEX IF NOT EXISTS idx_settlements_status ON settlements(status);
    CREATE INDEX IF NOT EXISTS idx_settlements_retailer ON settlements(retailer_id);
    "#,
    )?;
    Ok(())
}
