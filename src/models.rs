// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Unknown {kind} '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Position in the distribution hierarchy, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Admin,
    MasterDistributor,
    Distributor,
    Retailer,
}

impl Tier {
    pub const ALL: [Tier; 4] = [
        Tier::Admin,
        Tier::MasterDistributor,
        Tier::Distributor,
        Tier::Retailer,
    ];

    /// Account ids carry their tier as a two-letter prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            Tier::Admin => "AD",
            Tier::MasterDistributor => "MD",
            Tier::Distributor => "DT",
            Tier::Retailer => "RT",
        }
    }

    pub fn parent(self) -> Option<Tier> {
        match self {
            Tier::Admin => None,
            Tier::MasterDistributor => Some(Tier::Admin),
            Tier::Distributor => Some(Tier::MasterDistributor),
            Tier::Retailer => Some(Tier::Distributor),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Admin => "ADMIN",
            Tier::MasterDistributor => "MASTER_DISTRIBUTOR",
            Tier::Distributor => "DISTRIBUTOR",
            Tier::Retailer => "RETAILER",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("tier", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub tier: Tier,
    pub parent_id: Option<String>,
}

/// The three ancestors of a retailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hierarchy {
    pub distributor_id: String,
    pub master_distributor_id: String,
    pub admin_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerReason {
    FundTransfer,
    FundRequest,
    Revert,
    MobileRecharge,
    PostpaidRecharge,
    ElectricityBill,
    Payout,
    WalletLoad,
}

impl LedgerReason {
    pub const ALL: [LedgerReason; 8] = [
        LedgerReason::FundTransfer,
        LedgerReason::FundRequest,
        LedgerReason::Revert,
        LedgerReason::MobileRecharge,
        LedgerReason::PostpaidRecharge,
        LedgerReason::ElectricityBill,
        LedgerReason::Payout,
        LedgerReason::WalletLoad,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LedgerReason::FundTransfer => "FUND_TRANSFER",
            LedgerReason::FundRequest => "FUND_REQUEST",
            LedgerReason::Revert => "REVERT",
            LedgerReason::MobileRecharge => "MOBILE_RECHARGE",
            LedgerReason::PostpaidRecharge => "POSTPAID_RECHARGE",
            LedgerReason::ElectricityBill => "ELECTRICITY_BILL",
            LedgerReason::Payout => "PAYOUT",
            LedgerReason::WalletLoad => "WALLET_LOAD",
        }
    }
}

impl fmt::Display for LedgerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerReason {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LedgerReason::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("ledger reason", s))
    }
}

/// One side of a balance mutation. Holding the amount in the variant keeps
/// credit and debit mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Posting {
    Credit(Decimal),
    Debit(Decimal),
}

impl Posting {
    pub fn credit_amount(&self) -> Option<Decimal> {
        match self {
            Posting::Credit(a) => Some(*a),
            Posting::Debit(_) => None,
        }
    }

    pub fn debit_amount(&self) -> Option<Decimal> {
        match self {
            Posting::Debit(a) => Some(*a),
            Posting::Credit(_) => None,
        }
    }

    /// Signed effect on the balance.
    pub fn delta(&self) -> Decimal {
        match self {
            Posting::Credit(a) => *a,
            Posting::Debit(a) => -*a,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub account_id: String,
    pub reference_id: String,
    pub posting: Posting,
    pub before_balance: Decimal,
    pub after_balance: Decimal,
    pub reason: LedgerReason,
    pub remarks: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    FundTransfer,
    FundRequest,
    Revert,
    WalletLoad,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::FundTransfer => "FUND_TRANSFER",
            MovementKind::FundRequest => "FUND_REQUEST",
            MovementKind::Revert => "REVERT",
            MovementKind::WalletLoad => "WALLET_LOAD",
        }
    }

    pub fn ledger_reason(self) -> LedgerReason {
        match self {
            MovementKind::FundTransfer => LedgerReason::FundTransfer,
            MovementKind::FundRequest => LedgerReason::FundRequest,
            MovementKind::Revert => LedgerReason::Revert,
            MovementKind::WalletLoad => LedgerReason::WalletLoad,
        }
    }
}

impl FromStr for MovementKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FUND_TRANSFER" => Ok(MovementKind::FundTransfer),
            "FUND_REQUEST" => Ok(MovementKind::FundRequest),
            "REVERT" => Ok(MovementKind::Revert),
            "WALLET_LOAD" => Ok(MovementKind::WalletLoad),
            other => Err(ParseEnumError::new("movement kind", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementStatus {
    Pending,
    Success,
    Failed,
    Accepted,
    Rejected,
}

impl MovementStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementStatus::Pending => "PENDING",
            MovementStatus::Success => "SUCCESS",
            MovementStatus::Failed => "FAILED",
            MovementStatus::Accepted => "ACCEPTED",
            MovementStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, MovementStatus::Pending)
    }
}

impl fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(MovementStatus::Pending),
            "SUCCESS" => Ok(MovementStatus::Success),
            "FAILED" => Ok(MovementStatus::Failed),
            "ACCEPTED" => Ok(MovementStatus::Accepted),
            "REJECTED" => Ok(MovementStatus::Rejected),
            other => Err(ParseEnumError::new("movement status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementRecord {
    pub id: i64,
    pub kind: MovementKind,
    pub from_id: String,
    pub to_id: String,
    pub amount: Decimal,
    pub status: MovementStatus,
    pub remarks: String,
    pub created_at: NaiveDateTime,
}

impl MovementRecord {
    /// Ledger entries written for this movement carry this reference.
    pub fn reference_id(&self) -> String {
        reference_for(self.kind, self.id)
    }
}

pub fn reference_for(kind: MovementKind, id: i64) -> String {
    let tag = match kind {
        MovementKind::FundTransfer => "FT",
        MovementKind::FundRequest => "FR",
        MovementKind::Revert => "RV",
        MovementKind::WalletLoad => "WL",
    };
    format!("{}{}", tag, id)
}

/// Provider-backed services a retailer can settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Service {
    MobileRecharge,
    PostpaidRecharge,
    ElectricityBill,
    Payout,
}

impl Service {
    pub const ALL: [Service; 4] = [
        Service::MobileRecharge,
        Service::PostpaidRecharge,
        Service::ElectricityBill,
        Service::Payout,
    ];

    pub fn as_str(self) -> &'static str {
        self.ledger_reason().as_str()
    }

    pub fn ledger_reason(self) -> LedgerReason {
        match self {
            Service::MobileRecharge => LedgerReason::MobileRecharge,
            Service::PostpaidRecharge => LedgerReason::PostpaidRecharge,
            Service::ElectricityBill => LedgerReason::ElectricityBill,
            Service::Payout => LedgerReason::Payout,
        }
    }

    pub fn is_recharge(self) -> bool {
        matches!(self, Service::MobileRecharge | Service::PostpaidRecharge)
    }

    /// Payout charges are paid by the retailer on top of the amount.
    pub fn charges_retailer(self) -> bool {
        matches!(self, Service::Payout)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase().replace('-', "_");
        Service::ALL
            .into_iter()
            .find(|svc| svc.as_str() == upper)
            .ok_or_else(|| ParseEnumError::new("service", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSplit {
    pub owner_id: String,
    pub service: Service,
    pub total_pct: Decimal,
    pub admin_pct: Decimal,
    pub master_distributor_pct: Decimal,
    pub distributor_pct: Decimal,
    pub retailer_pct: Decimal,
}

/// A split converted to currency for one amount. The tier amounts are
/// rounded independently and need not add up to `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CommissionAmounts {
    pub admin: Decimal,
    pub master_distributor: Decimal,
    pub distributor: Decimal,
    pub retailer: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    Initiated,
    Success,
    Pending,
    Failed,
}

impl SettlementStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SettlementStatus::Initiated => "INITIATED",
            SettlementStatus::Success => "SUCCESS",
            SettlementStatus::Pending => "PENDING",
            SettlementStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SettlementStatus::Success | SettlementStatus::Failed)
    }

    /// Only INITIATED -> {SUCCESS, PENDING, FAILED} and PENDING -> {SUCCESS, FAILED}.
    pub fn can_transition_to(self, next: SettlementStatus) -> bool {
        match (self, next) {
            (SettlementStatus::Initiated, SettlementStatus::Initiated) => false,
            (SettlementStatus::Initiated, _) => true,
            (SettlementStatus::Pending, SettlementStatus::Success | SettlementStatus::Failed) => {
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettlementStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INITIATED" => Ok(SettlementStatus::Initiated),
            "SUCCESS" => Ok(SettlementStatus::Success),
            "PENDING" => Ok(SettlementStatus::Pending),
            "FAILED" => Ok(SettlementStatus::Failed),
            other => Err(ParseEnumError::new("settlement status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementRecord {
    pub id: i64,
    pub client_ref: String,
    pub retailer_id: String,
    pub service: Service,
    pub target: String,
    pub amount: Decimal,
    /// Taken from the retailer on top of `amount` (payouts only).
    pub charge: Decimal,
    pub commission: CommissionAmounts,
    pub status: SettlementStatus,
    pub provider_ref: Option<String>,
    pub message: String,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_round_trips_through_storage_name() {
        for tier in Tier::ALL {
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
        assert!("SUPER_ADMIN".parse::<Tier>().is_err());
    }

    #[test]
    fn service_parses_cli_spellings() {
        assert_eq!(
            "mobile-recharge".parse::<Service>().unwrap(),
            Service::MobileRecharge
        );
        assert_eq!(" payout ".parse::<Service>().unwrap(), Service::Payout);
        assert!("dmt".parse::<Service>().is_err());
    }

    #[test]
    fn settlement_transitions() {
        use SettlementStatus::*;
        assert!(Initiated.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Success));
        assert!(Pending.can_transition_to(Failed));
        assert!(!Success.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn posting_delta_sign() {
        let d = Decimal::new(1050, 2);
        assert_eq!(Posting::Credit(d).delta(), d);
        assert_eq!(Posting::Debit(d).delta(), -d);
        assert_eq!(Posting::Debit(d).credit_amount(), None);
    }
}
