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
use rusqlite::Transaction;
use rust_decimal::Decimal;

impl Engine {
    /// Records a request for `payer` to fund `requester`. No wallet effect
    /// until it is accepted.
    pub fn create_request(
        &mut self,
        requester_id: &str,
        payer_id: &str,
        amount: Decimal,
        remarks: &str,
    ) -> EngineResult<MovementRecord> {
        self.gate.check()?;
        let amount = validate_amount(amount)?;
        if requester_id == payer_id {
            return Err(EngineError::SameAccount);
        }
        directory::resolve_tier(&self.conn, requester_id)?;
        directory::resolve_tier(&self.conn, payer_id)?;

        let id = insert_movement(
            &self.conn,
            MovementKind::FundRequest,
            payer_id,
            requester_id,
            amount,
            remarks,
        )?;
        tracing::info!(request = id, requester = %requester_id, payer = %payer_id, %amount, "fund request created");
        get_movement(&self.conn, id)
    }

    /// Moves the requested funds and marks the request ACCEPTED, atomically.
    /// The status is re-read under the write lock, so of two concurrent
    /// accepts exactly one wins and the other sees `AlreadyProcessed`.
    pub fn accept_request(
        &mut self,
        deadline: &Deadline,
        request_id: i64,
    ) -> EngineResult<MovementRecord> {
        self.gate.check()?;
        let req = write_within(&mut self.conn, deadline, |tx| {
            let req = pending_request(tx, request_id)?;

            // the hierarchy may have changed since the request was filed
            directory::resolve_tier(tx, &req.from_id)?;
            directory::resolve_tier(tx, &req.to_id)?;

            let reference = reference_for(MovementKind::FundRequest, request_id);
            move_funds(
                tx,
                &req.from_id,
                &req.to_id,
                req.amount,
                &reference,
                LedgerReason::FundRequest,
                &req.remarks,
            )
            .inspect_err(|e| {
                tracing::warn!(request = request_id, payer = %req.from_id, error = %e, "fund request accept rejected")
            })?;
            if !set_movement_status(tx, request_id, MovementStatus::Pending, MovementStatus::Accepted)? {
                return Err(EngineError::AlreadyProcessed(request_id));
            }
            Ok(req)
        })?;

        tracing::info!(request = request_id, payer = %req.from_id, requester = %req.to_id, amount = %req.amount, "fund request accepted");
        get_movement(&self.conn, request_id)
    }

    pub fn reject_request(
        &mut self,
        deadline: &Deadline,
        request_id: i64,
    ) -> EngineResult<MovementRecord> {
        self.gate.check()?;
        write_within(&mut self.conn, deadline, |tx| {
            pending_request(tx, request_id)?;
            if !set_movement_status(tx, request_id, MovementStatus::Pending, MovementStatus::Rejected)? {
                return Err(EngineError::AlreadyProcessed(request_id));
            }
            Ok(())
        })?;

        tracing::info!(request = request_id, "fund request rejected");
        get_movement(&self.conn, request_id)
    }
}

fn pending_request(tx: &Transaction<'_>, request_id: i64) -> EngineResult<MovementRecord> {
    let req = get_movement(tx, request_id)?;
    if req.kind != MovementKind::FundRequest {
        return Err(EngineError::MovementNotFound(request_id));
    }
    if req.status != MovementStatus::Pending {
        tracing::warn!(request = request_id, status = %req.status, "fund request already processed");
        return Err(EngineError::AlreadyProcessed(request_id));
    }
    Ok(req)
}
