// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::provider::{Provider, ProviderStatus};
use super::{get_settlement, list_for_retailer, pending_refs, transition};
use crate::directory;
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::models::{SettlementRecord, SettlementStatus};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub checked: usize,
    pub updated: usize,
    pub errors: usize,
}

impl Engine {
    /// Re-polls one PENDING settlement and records a terminal answer. The
    /// wallet was debited when the settlement was booked, so only the status
    /// changes. Terminal records are returned without calling the provider.
    pub fn reconcile_settlement(
        &mut self,
        provider: &dyn Provider,
        client_ref: &str,
    ) -> EngineResult<SettlementRecord> {
        let rec = get_settlement(&self.conn, client_ref)?;
        if rec.status != SettlementStatus::Pending {
            return Ok(rec);
        }
        let provider_ref = rec.provider_ref.as_deref().ok_or_else(|| {
            EngineError::InvalidProviderResponse(format!(
                "pending settlement {} has no provider reference",
                client_ref
            ))
        })?;

        let next = match provider.poll_status(provider_ref)? {
            ProviderStatus::Pending => return Ok(rec),
            ProviderStatus::Success => SettlementStatus::Success,
            ProviderStatus::Failed => SettlementStatus::Failed,
        };
        let message = format!("reconciled to {}", next);
        if transition(&self.conn, rec.id, SettlementStatus::Pending, next, None, &message)? {
            tracing::info!(client_ref = %client_ref, provider_ref = %provider_ref, status = %next, "settlement reconciled");
        } else {
            tracing::debug!(client_ref = %client_ref, "settlement reconciled by another worker");
        }
        get_settlement(&self.conn, client_ref)
    }

    /// Sweeps every PENDING settlement. A failed poll is logged and counted;
    /// it does not stop the sweep.
    pub fn reconcile_pending(&mut self, provider: &dyn Provider) -> EngineResult<ReconcileReport> {
        self.reconcile_where(provider, None)
    }

    /// Reconciles the retailer's PENDING settlements, then lists the most
    /// recent ones.
    pub fn settlement_history(
        &mut self,
        provider: &dyn Provider,
        retailer_id: &str,
        limit: usize,
    ) -> EngineResult<Vec<SettlementRecord>> {
        directory::get_account(&self.conn, retailer_id)?;
        let report = self.reconcile_where(provider, Some(retailer_id))?;
        if report.errors > 0 {
            tracing::warn!(retailer = %retailer_id, errors = report.errors, "history served with unreconciled settlements");
        }
        list_for_retailer(&self.conn, retailer_id, limit)
    }

    fn reconcile_where(
        &mut self,
        provider: &dyn Provider,
        retailer_id: Option<&str>,
    ) -> EngineResult<ReconcileReport> {
        let mut report = ReconcileReport::default();
        for client_ref in pending_refs(&self.conn, retailer_id)? {
            report.checked += 1;
            match self.reconcile_settlement(provider, &client_ref) {
                Ok(rec) if rec.status.is_terminal() => report.updated += 1,
                Ok(_) => {}
                Err(e) => {
                    report.errors += 1;
                    tracing::warn!(client_ref = %client_ref, error = %e, "reconciliation poll failed");
                }
            }
        }
        Ok(report)
    }
}
