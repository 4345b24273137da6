// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Deadline, Engine, get_movement, insert_movement, move_funds, set_movement_status, write_within};
use crate::directory;
use crate::error::{EngineError, EngineResult};
use crate::models::{LedgerReason, MovementKind, MovementRecord, MovementStatus, reference_for};
use crate::utils::validate_amount;
use rust_decimal::Decimal;

impl Engine {
    /// Pulls `amount` back from `on_id` into the reverser's wallet. History is
    /// never edited: the revert is a new movement with its own ledger pair,
    /// recorded as `on_id -> reverser_id`.
    pub fn revert(
        &mut self,
        deadline: &Deadline,
        reverser_id: &str,
        on_id: &str,
        amount: Decimal,
        remarks: &str,
    ) -> EngineResult<MovementRecord> {
        self.gate.check()?;
        let amount = validate_amount(amount)?;
        if reverser_id == on_id {
            return Err(EngineError::SameAccount);
        }
        directory::tier_of(reverser_id)?;
        directory::tier_of(on_id)?;

        let (id, reference) = write_within(&mut self.conn, deadline, |tx| {
            let id = insert_movement(tx, MovementKind::Revert, on_id, reverser_id, amount, remarks)?;
            let reference = reference_for(MovementKind::Revert, id);
            move_funds(
                tx,
                on_id,
                reverser_id,
                amount,
                &reference,
                LedgerReason::Revert,
                remarks,
            )
            .inspect_err(|e| {
                tracing::warn!(reverser = %reverser_id, on = %on_id, %amount, error = %e, "revert rejected")
            })?;
            set_movement_status(tx, id, MovementStatus::Pending, MovementStatus::Success)?;
            Ok((id, reference))
        })?;

        tracing::info!(reference = %reference, reverser = %reverser_id, on = %on_id, %amount, "revert committed");
        get_movement(&self.conn, id)
    }
}
