//! The `LedgerAccount` is the pooled fund of one community: its running
//! balance, cumulative counters and the two configurable rates.
//!
//! Balances and counters are maintained incrementally by the transaction
//! recorder and are never computed on read.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine};

/// Share of each community-listing sale credited to the fund.
pub const DEFAULT_COMMISSION_RATE: f64 = 0.05;
/// Annual simple-interest rate offered to new investments.
pub const DEFAULT_FIXED_RETURN_RATE: f64 = 0.10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub community_id: i64,
    pub current_balance: MoneyCents,
    pub total_raised: MoneyCents,
    /// Loan principal currently outstanding.
    pub total_loans: MoneyCents,
    /// Investment capital currently held.
    pub total_investments: MoneyCents,
    pub commission_rate: f64,
    pub fixed_return_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerAccount {
    pub fn new(community_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            community_id,
            current_balance: MoneyCents::ZERO,
            total_raised: MoneyCents::ZERO,
            total_loans: MoneyCents::ZERO,
            total_investments: MoneyCents::ZERO,
            commission_rate: DEFAULT_COMMISSION_RATE,
            fixed_return_rate: DEFAULT_FIXED_RETURN_RATE,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validates a rate expressed as a fraction in `[0, 1]`.
pub(crate) fn validate_rate(rate: f64, label: &str) -> ResultEngine<f64> {
    if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must be between 0 and 1, got {rate}"
        )));
    }
    Ok(rate)
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "community_funds")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub community_id: i64,
    pub current_balance: i64,
    pub total_raised: i64,
    pub total_loans: i64,
    pub total_investments: i64,
    pub commission_rate: f64,
    pub fixed_return_rate: f64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fund_transactions::Entity")]
    Transactions,
}

impl Related<super::fund_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerAccount> for ActiveModel {
    fn from(value: &LedgerAccount) -> Self {
        Self {
            community_id: ActiveValue::Set(value.community_id),
            current_balance: ActiveValue::Set(value.current_balance.cents()),
            total_raised: ActiveValue::Set(value.total_raised.cents()),
            total_loans: ActiveValue::Set(value.total_loans.cents()),
            total_investments: ActiveValue::Set(value.total_investments.cents()),
            commission_rate: ActiveValue::Set(value.commission_rate),
            fixed_return_rate: ActiveValue::Set(value.fixed_return_rate),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl From<Model> for LedgerAccount {
    fn from(model: Model) -> Self {
        Self {
            community_id: model.community_id,
            current_balance: MoneyCents::new(model.current_balance),
            total_raised: MoneyCents::new(model.total_raised),
            total_loans: MoneyCents::new(model.total_loans),
            total_investments: MoneyCents::new(model.total_investments),
            commission_rate: model.commission_rate,
            fixed_return_rate: model.fixed_return_rate,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
