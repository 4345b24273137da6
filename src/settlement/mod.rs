// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Provider-backed settlements (recharges, bill payments, payouts).
//!
//! An attempt is persisted INITIATED before the gateway is called, the call
//! happens with no lock held, and the outcome is booked in a second
//! transaction. Only SUCCESS and PENDING outcomes touch wallets.

pub mod provider;
mod reconcile;

pub use provider::{HttpProvider, Provider, ProviderStatus, SubmitRequest, SubmitResponse};
pub use reconcile::ReconcileReport;

use crate::commission;
use crate::directory;
use crate::engine::{Deadline, Engine, post, write_locked};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CommissionAmounts, Posting, Service, SettlementRecord, SettlementStatus, Tier,
};
use crate::utils::{decimal_col, enum_col, validate_amount};
use crate::wallet;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SettlementRequest {
    pub retailer_id: String,
    pub service: Service,
    /// Mobile number, consumer number or beneficiary account.
    pub target: String,
    pub amount: Decimal,
}

/// Money effects of one settlement, fixed before the provider is called.
#[derive(Debug, Clone)]
struct Plan {
    admin_id: String,
    commission: CommissionAmounts,
    charge: Decimal,
    admin_credit: Decimal,
}

impl Engine {
    pub fn settle(
        &mut self,
        provider: &dyn Provider,
        deadline: &Deadline,
        req: &SettlementRequest,
    ) -> EngineResult<SettlementRecord> {
        self.gate.check()?;
        let amount = validate_amount(req.amount)?;
        let target = req.target.trim();
        if target.is_empty() {
            return Err(EngineError::InvalidAccount("settlement target is empty".into()));
        }
        if directory::resolve_tier(&self.conn, &req.retailer_id)? != Tier::Retailer {
            return Err(EngineError::InvalidAccount(format!(
                "{} is not a retailer",
                req.retailer_id
            )));
        }
        let plan = self.plan(&req.retailer_id, req.service, amount)?;
        let required = amount.checked_add(plan.charge).ok_or_else(|| {
            EngineError::InvalidAmount(format!("{} plus charge {} overflows", amount, plan.charge))
        })?;

        // Pre-check only; the lock is not held across the provider call.
        let available = wallet::balance(&self.conn, &req.retailer_id)?;
        if available < required {
            tracing::warn!(retailer = %req.retailer_id, %available, %required, "settlement rejected before provider call");
            return Err(EngineError::InsufficientBalance {
                account: req.retailer_id.clone(),
                available,
                required,
            });
        }
        deadline.check()?;

        let client_ref = Uuid::new_v4().simple().to_string();
        let id = insert_initiated(&self.conn, &client_ref, req, target, amount, &plan)?;

        let submit = SubmitRequest {
            client_ref: client_ref.clone(),
            service: req.service,
            target: target.to_string(),
            amount,
        };
        let resp = match provider.submit(&submit) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(client_ref = %client_ref, error = %e, "provider call failed, nothing booked");
                transition(
                    &self.conn,
                    id,
                    SettlementStatus::Initiated,
                    SettlementStatus::Failed,
                    None,
                    &e.to_string(),
                )?;
                return Err(e);
            }
        };

        match resp.status {
            ProviderStatus::Failed => {
                tracing::warn!(client_ref = %client_ref, message = %resp.message, "provider reported failure");
                transition(
                    &self.conn,
                    id,
                    SettlementStatus::Initiated,
                    SettlementStatus::Failed,
                    Some(&resp.provider_ref).filter(|r| !r.is_empty()).map(String::as_str),
                    &resp.message,
                )?;
            }
            ProviderStatus::Success | ProviderStatus::Pending => {
                let status = if resp.status == ProviderStatus::Success {
                    SettlementStatus::Success
                } else {
                    SettlementStatus::Pending
                };
                if let Err(e) = self.book(id, &client_ref, req, required, &plan, status, &resp) {
                    self.record_unbooked(id, &client_ref, &resp, &e);
                    return Err(e);
                }
            }
        }
        get_settlement(&self.conn, &client_ref)
    }

    fn plan(&self, retailer_id: &str, service: Service, amount: Decimal) -> EngineResult<Plan> {
        let hierarchy = directory::resolve_hierarchy(&self.conn, retailer_id)?;
        let below_threshold =
            service.is_recharge() && amount < self.config.commission_min_recharge;
        let commission = if below_threshold {
            CommissionAmounts::default()
        } else {
            let split = commission::resolve(&self.conn, retailer_id, service)?;
            commission::split(&split, amount)?
        };
        let (charge, admin_credit) = if service.charges_retailer() {
            (commission.total, commission.total)
        } else {
            (Decimal::ZERO, commission.admin)
        };
        Ok(Plan {
            admin_id: hierarchy.admin_id,
            commission,
            charge,
            admin_credit,
        })
    }

    /// Books a provider-accepted settlement. Waits for the write lock up to
    /// the full configured operation budget, not what is left of the
    /// caller's deadline.
    #[allow(clippy::too_many_arguments)]
    fn book(
        &mut self,
        id: i64,
        client_ref: &str,
        req: &SettlementRequest,
        required: Decimal,
        plan: &Plan,
        status: SettlementStatus,
        resp: &SubmitResponse,
    ) -> EngineResult<()> {
        let reason = req.service.ledger_reason();
        let remarks = format!("{} {}", req.service, req.target.trim());

        write_locked(&mut self.conn, self.config.operation_timeout, |tx| {
            let (retailer_before, admin_before) =
                wallet::lock_pair(tx, &req.retailer_id, &plan.admin_id)?;
            if retailer_before < required {
                return Err(EngineError::InsufficientBalance {
                    account: req.retailer_id.clone(),
                    available: retailer_before,
                    required,
                });
            }
            post(
                tx,
                &req.retailer_id,
                retailer_before,
                Posting::Debit(required),
                client_ref,
                reason,
                &remarks,
            )?;
            if plan.admin_credit > Decimal::ZERO {
                post(
                    tx,
                    &plan.admin_id,
                    admin_before,
                    Posting::Credit(plan.admin_credit),
                    client_ref,
                    reason,
                    &remarks,
                )?;
            }
            if !transition(
                tx,
                id,
                SettlementStatus::Initiated,
                status,
                Some(resp.provider_ref.as_str()),
                &resp.message,
            )? {
                return Err(EngineError::TransactionAborted(format!(
                    "settlement {} left INITIATED concurrently",
                    client_ref
                )));
            }
            Ok(())
        })?;

        tracing::info!(
            client_ref = %client_ref,
            provider_ref = %resp.provider_ref,
            retailer = %req.retailer_id,
            service = %req.service,
            debited = %required,
            admin_credit = %plan.admin_credit,
            status = %status,
            "settlement booked"
        );
        Ok(())
    }

    /// The provider took the order but nothing was booked. Parks the record
    /// as FAILED with the provider reference so it can be found and settled
    /// by hand.
    fn record_unbooked(
        &self,
        id: i64,
        client_ref: &str,
        resp: &SubmitResponse,
        cause: &EngineError,
    ) {
        tracing::error!(
            client_ref = %client_ref,
            provider_ref = %resp.provider_ref,
            error = %cause,
            "provider accepted settlement but booking failed"
        );
        let message = format!(
            "booking failed after provider accepted ({}); needs manual review",
            cause
        );
        match transition(
            &self.conn,
            id,
            SettlementStatus::Initiated,
            SettlementStatus::Failed,
            Some(resp.provider_ref.as_str()),
            &message,
        ) {
            Ok(true) => {}
            Ok(false) => tracing::error!(
                client_ref = %client_ref,
                "unbooked settlement already left INITIATED"
            ),
            Err(e) => tracing::error!(
                client_ref = %client_ref,
                provider_ref = %resp.provider_ref,
                error = %e,
                "could not mark unbooked settlement failed"
            ),
        }
    }
}

fn insert_initiated(
    conn: &Connection,
    client_ref: &str,
    req: &SettlementRequest,
    target: &str,
    amount: Decimal,
    plan: &Plan,
) -> EngineResult<i64> {
    conn.execute(
        "INSERT INTO settlements(client_ref, retailer_id, service, target, amount, charge,
            admin_commission, master_distributor_commission, distributor_commission, retailer_commission,
            total_commission, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'INITIATED')",
        params![
            client_ref,
            req.retailer_id,
            req.service.as_str(),
            target,
            amount.to_string(),
            plan.charge.to_string(),
            plan.commission.admin.to_string(),
            plan.commission.master_distributor.to_string(),
            plan.commission.distributor.to_string(),
            plan.commission.retailer.to_string(),
            plan.commission.total.to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Compare-and-set status change. Returns `false` when the record was no
/// longer in `from`.
pub(crate) fn transition(
    conn: &Connection,
    id: i64,
    from: SettlementStatus,
    to: SettlementStatus,
    provider_ref: Option<&str>,
    message: &str,
) -> EngineResult<bool> {
    if !from.can_transition_to(to) {
        return Err(EngineError::TransactionAborted(format!(
            "illegal settlement transition {} -> {}",
            from, to
        )));
    }
    let n = conn.execute(
        "UPDATE settlements SET status=?1, provider_ref=COALESCE(?2, provider_ref), message=?3, updated_at=datetime('now')
         WHERE id=?4 AND status=?5",
        params![to.as_str(), provider_ref, message, id, from.as_str()],
    )?;
    Ok(n > 0)
}

const SELECT_SETTLEMENT: &str = "SELECT id, client_ref, retailer_id, service, target, amount, charge,
    admin_commission, master_distributor_commission, distributor_commission, retailer_commission,
    total_commission, status, provider_ref, message, created_at FROM settlements";

fn settlement_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<SettlementRecord> {
    Ok(SettlementRecord {
        id: r.get(0)?,
        client_ref: r.get(1)?,
        retailer_id: r.get(2)?,
        service: enum_col(r, 3)?,
        target: r.get(4)?,
        amount: decimal_col(r, 5)?,
        charge: decimal_col(r, 6)?,
        commission: CommissionAmounts {
            admin: decimal_col(r, 7)?,
            master_distributor: decimal_col(r, 8)?,
            distributor: decimal_col(r, 9)?,
            retailer: decimal_col(r, 10)?,
            total: decimal_col(r, 11)?,
        },
        status: enum_col(r, 12)?,
        provider_ref: r.get(13)?,
        message: r.get(14)?,
        created_at: r.get(15)?,
    })
}

pub fn find_by_ref(conn: &Connection, client_ref: &str) -> EngineResult<Option<SettlementRecord>> {
    let rec = conn
        .query_row(
            &format!("{} WHERE client_ref=?1", SELECT_SETTLEMENT),
            params![client_ref],
            settlement_from_row,
        )
        .optional()?;
    Ok(rec)
}

pub fn get_settlement(conn: &Connection, client_ref: &str) -> EngineResult<SettlementRecord> {
    find_by_ref(conn, client_ref)?
        .ok_or_else(|| EngineError::SettlementNotFound(client_ref.to_string()))
}

pub fn list_for_retailer(
    conn: &Connection,
    retailer_id: &str,
    limit: usize,
) -> EngineResult<Vec<SettlementRecord>> {
    let mut stmt = conn.prepare_cached(&format!(
        "{} WHERE retailer_id=?1 ORDER BY id DESC LIMIT ?2",
        SELECT_SETTLEMENT
    ))?;
    let rows = stmt
        .query_map(params![retailer_id, limit as i64], settlement_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn pending_refs(conn: &Connection, retailer_id: Option<&str>) -> EngineResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT client_ref FROM settlements
         WHERE status='PENDING' AND (?1 IS NULL OR retailer_id=?1)
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![retailer_id], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
