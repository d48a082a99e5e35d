//! Fixed-rate member investments into a community fund.
//!
//! The fund's `fixed_return_rate` is copied onto the investment as
//! `profit_rate` at creation, so later rate changes never touch existing
//! investments. Returns accrue as simple interest.

use chrono::{DateTime, Months, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, ResultEngine,
    util::{append_note, parse_uuid},
};

/// Average month length used to turn elapsed days into months.
pub const AVERAGE_MONTH_DAYS: f64 = 30.44;

/// Simple-interest value of `amount` invested at annual `rate` from `since`
/// until `at`.
///
/// `months_elapsed = whole days / 30.44`, clamped at zero, and
/// `value = amount × (1 + rate × months_elapsed / 12)`.
pub fn accrued_value(
    amount: MoneyCents,
    rate: f64,
    since: DateTime<Utc>,
    at: DateTime<Utc>,
) -> ResultEngine<MoneyCents> {
    let days = (at - since).num_days().max(0);
    let months_elapsed = days as f64 / AVERAGE_MONTH_DAYS;
    amount.scale(1.0 + rate * (months_elapsed / 12.0))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStatus {
    Active,
    /// Derived: active and at or past `maturity_date`.
    Matured,
    Withdrawn,
}

impl InvestmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Matured => "matured",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl TryFrom<&str> for InvestmentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "matured" => Ok(Self::Matured),
            "withdrawn" => Ok(Self::Withdrawn),
            other => Err(EngineError::InvalidId(format!(
                "invalid investment status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: Uuid,
    pub community_id: i64,
    pub investor_id: i64,
    pub amount: MoneyCents,
    /// Snapshot of the fund's fixed return rate at creation.
    pub profit_rate: f64,
    pub status: InvestmentStatus,
    pub investment_date: DateTime<Utc>,
    pub maturity_date: DateTime<Utc>,
    pub withdrawn_date: Option<DateTime<Utc>>,
    /// Zero until withdrawal, then the final payout.
    pub total_earned: MoneyCents,
    pub notes: Option<String>,
}

impl Investment {
    pub fn new(
        community_id: i64,
        investor_id: i64,
        amount: MoneyCents,
        profit_rate: f64,
        maturity_months: u32,
        investment_date: DateTime<Utc>,
        notes: Option<String>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "investment amount must be > 0".to_string(),
            ));
        }
        if maturity_months == 0 {
            return Err(EngineError::InvalidAmount(
                "maturity_months must be > 0".to_string(),
            ));
        }
        let maturity_date = investment_date
            .checked_add_months(Months::new(maturity_months))
            .ok_or_else(|| EngineError::InvalidAmount("maturity date out of range".to_string()))?;

        Ok(Self {
            id: Uuid::new_v4(),
            community_id,
            investor_id,
            amount,
            profit_rate,
            status: InvestmentStatus::Active,
            investment_date,
            maturity_date,
            withdrawn_date: None,
            total_earned: MoneyCents::ZERO,
            notes,
        })
    }

    #[must_use]
    pub fn is_matured(&self, now: DateTime<Utc>) -> bool {
        self.maturity_date <= now
    }

    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvestmentStatus {
        match self.status {
            InvestmentStatus::Active if self.is_matured(now) => InvestmentStatus::Matured,
            other => other,
        }
    }

    /// Live value for active investments, frozen payout once withdrawn.
    pub fn current_value(&self, now: DateTime<Utc>) -> ResultEngine<MoneyCents> {
        match self.status {
            InvestmentStatus::Withdrawn => Ok(self.total_earned),
            _ => accrued_value(self.amount, self.profit_rate, self.investment_date, now),
        }
    }

    /// Checks the withdrawal preconditions that depend only on the investment
    /// and returns the payout due at `now`.
    pub fn payout_at(&self, now: DateTime<Utc>) -> ResultEngine<MoneyCents> {
        if self.status != InvestmentStatus::Active {
            return Err(EngineError::InvestmentNotFound(self.id.to_string()));
        }
        if !self.is_matured(now) {
            return Err(EngineError::NotMatured(format!(
                "investment matures on {}",
                self.maturity_date.date_naive()
            )));
        }
        accrued_value(self.amount, self.profit_rate, self.investment_date, now)
    }

    /// Marks the investment withdrawn with the given payout.
    pub fn mark_withdrawn(&mut self, payout: MoneyCents, notes: Option<String>, now: DateTime<Utc>) {
        self.status = InvestmentStatus::Withdrawn;
        self.withdrawn_date = Some(now);
        self.total_earned = payout;
        self.notes = append_note(self.notes.take(), notes);
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "community_investments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub community_id: i64,
    pub investor_id: i64,
    pub amount: i64,
    pub profit_rate: f64,
    pub status: String,
    pub investment_date: DateTimeUtc,
    pub maturity_date: DateTimeUtc,
    pub withdrawn_date: Option<DateTimeUtc>,
    pub total_earned: i64,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Investment> for ActiveModel {
    fn from(inv: &Investment) -> Self {
        Self {
            id: ActiveValue::Set(inv.id.to_string()),
            community_id: ActiveValue::Set(inv.community_id),
            investor_id: ActiveValue::Set(inv.investor_id),
            amount: ActiveValue::Set(inv.amount.cents()),
            profit_rate: ActiveValue::Set(inv.profit_rate),
            status: ActiveValue::Set(inv.status.as_str().to_string()),
            investment_date: ActiveValue::Set(inv.investment_date),
            maturity_date: ActiveValue::Set(inv.maturity_date),
            withdrawn_date: ActiveValue::Set(inv.withdrawn_date),
            total_earned: ActiveValue::Set(inv.total_earned.cents()),
            notes: ActiveValue::Set(inv.notes.clone()),
        }
    }
}

impl TryFrom<Model> for Investment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "investment")?,
            community_id: model.community_id,
            investor_id: model.investor_id,
            amount: MoneyCents::new(model.amount),
            profit_rate: model.profit_rate,
            status: InvestmentStatus::try_from(model.status.as_str())?,
            investment_date: model.investment_date,
            maturity_date: model.maturity_date,
            withdrawn_date: model.withdrawn_date,
            total_earned: MoneyCents::new(model.total_earned),
            notes: model.notes,
        })
    }
}
