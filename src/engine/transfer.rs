// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Deadline, Engine, get_movement, insert_movement, move_funds, post, set_movement_status, write_within};
use crate::directory;
use crate::error::{EngineError, EngineResult};
use crate::models::{LedgerReason, MovementKind, MovementRecord, MovementStatus, Posting, Tier, reference_for};
use crate::utils::validate_amount;
use crate::wallet;
use rust_decimal::Decimal;

/// Counterparty recorded for money entering the platform from a bank.
pub const EXTERNAL_SOURCE: &str = "EXTERNAL";

impl Engine {
    /// Direct wallet-to-wallet transfer. Resolves immediately: the record is
    /// created PENDING and flipped to SUCCESS in the same transaction.
    pub fn transfer(
        &mut self,
        deadline: &Deadline,
        from_id: &str,
        to_id: &str,
        amount: Decimal,
        remarks: &str,
    ) -> EngineResult<MovementRecord> {
        self.gate.check()?;
        let amount = validate_amount(amount)?;
        if from_id == to_id {
            return Err(EngineError::SameAccount);
        }
        directory::tier_of(from_id)?;
        directory::tier_of(to_id)?;

        let (id, reference) = write_within(&mut self.conn, deadline, |tx| {
            let id = insert_movement(tx, MovementKind::FundTransfer, from_id, to_id, amount, remarks)?;
            let reference = reference_for(MovementKind::FundTransfer, id);
            move_funds(
                tx,
                from_id,
                to_id,
                amount,
                &reference,
                LedgerReason::FundTransfer,
                remarks,
            )
            .inspect_err(|e| {
                tracing::warn!(from = %from_id, to = %to_id, %amount, error = %e, "fund transfer rejected")
            })?;
            set_movement_status(tx, id, MovementStatus::Pending, MovementStatus::Success)?;
            Ok((id, reference))
        })?;

        tracing::info!(reference = %reference, from = %from_id, to = %to_id, %amount, "fund transfer committed");
        get_movement(&self.conn, id)
    }

    /// Credits an admin wallet with money deposited from outside the platform.
    pub fn load_wallet(
        &mut self,
        deadline: &Deadline,
        admin_id: &str,
        amount: Decimal,
        remarks: &str,
    ) -> EngineResult<MovementRecord> {
        self.gate.check()?;
        let amount = validate_amount(amount)?;
        if directory::tier_of(admin_id)? != Tier::Admin {
            return Err(EngineError::InvalidAccount(format!(
                "only admin wallets can be loaded, got {}",
                admin_id
            )));
        }

        let (id, reference) = write_within(&mut self.conn, deadline, |tx| {
            let id = insert_movement(tx, MovementKind::WalletLoad, EXTERNAL_SOURCE, admin_id, amount, remarks)?;
            let reference = reference_for(MovementKind::WalletLoad, id);
            let before = wallet::locked_balance(tx, admin_id)?;
            post(
                tx,
                admin_id,
                before,
                Posting::Credit(amount),
                &reference,
                LedgerReason::WalletLoad,
                remarks,
            )
            .inspect_err(|e| tracing::warn!(admin = %admin_id, %amount, error = %e, "wallet load rejected"))?;
            set_movement_status(tx, id, MovementStatus::Pending, MovementStatus::Success)?;
            Ok((id, reference))
        })?;

        tracing::info!(reference = %reference, admin = %admin_id, %amount, "wallet loaded");
        get_movement(&self.conn, id)
    }
}
