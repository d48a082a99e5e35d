//! Command structs for ledger operations.
//!
//! These types group parameters for write operations (donations, loans,
//! investments, commission), keeping call sites readable and avoiding long
//! argument lists. `occurred_at` is the request instant used for every
//! timestamp and date comparison inside the operation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::MoneyCents;

/// Donate to a community fund.
#[derive(Clone, Debug)]
pub struct DonateCmd {
    pub community_id: i64,
    pub user_id: i64,
    pub amount: MoneyCents,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl DonateCmd {
    #[must_use]
    pub fn new(
        community_id: i64,
        user_id: i64,
        amount: MoneyCents,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            community_id,
            user_id,
            amount,
            description: None,
            occurred_at,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Record a leader-approved fund expense.
#[derive(Clone, Debug)]
pub struct ExpenseCmd {
    pub community_id: i64,
    pub user_id: i64,
    pub amount: MoneyCents,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

impl ExpenseCmd {
    #[must_use]
    pub fn new(
        community_id: i64,
        user_id: i64,
        amount: MoneyCents,
        description: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            community_id,
            user_id,
            amount,
            description: description.into(),
            occurred_at,
        }
    }
}

/// Apply for a loan from the community fund.
#[derive(Clone, Debug)]
pub struct ApplyLoanCmd {
    pub community_id: i64,
    pub borrower_id: i64,
    pub amount: MoneyCents,
    pub purpose: String,
    pub due_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl ApplyLoanCmd {
    #[must_use]
    pub fn new(
        community_id: i64,
        borrower_id: i64,
        amount: MoneyCents,
        purpose: impl Into<String>,
        due_date: DateTime<Utc>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            community_id,
            borrower_id,
            amount,
            purpose: purpose.into(),
            due_date,
            notes: None,
            occurred_at,
        }
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Repay part or all of an active loan.
#[derive(Clone, Debug)]
pub struct ReturnLoanCmd {
    pub community_id: i64,
    pub loan_id: Uuid,
    pub borrower_id: i64,
    pub amount: MoneyCents,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl ReturnLoanCmd {
    #[must_use]
    pub fn new(
        community_id: i64,
        loan_id: Uuid,
        borrower_id: i64,
        amount: MoneyCents,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            community_id,
            loan_id,
            borrower_id,
            amount,
            notes: None,
            occurred_at,
        }
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Invest into the community fund at its current fixed return rate.
#[derive(Clone, Debug)]
pub struct CreateInvestmentCmd {
    pub community_id: i64,
    pub investor_id: i64,
    pub amount: MoneyCents,
    pub maturity_months: u32,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl CreateInvestmentCmd {
    #[must_use]
    pub fn new(
        community_id: i64,
        investor_id: i64,
        amount: MoneyCents,
        maturity_months: u32,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            community_id,
            investor_id,
            amount,
            maturity_months,
            notes: None,
            occurred_at,
        }
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Withdraw a matured investment with its accrued return.
#[derive(Clone, Debug)]
pub struct WithdrawInvestmentCmd {
    pub community_id: i64,
    pub investment_id: Uuid,
    pub investor_id: i64,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl WithdrawInvestmentCmd {
    #[must_use]
    pub fn new(
        community_id: i64,
        investment_id: Uuid,
        investor_id: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            community_id,
            investment_id,
            investor_id,
            notes: None,
            occurred_at,
        }
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Record the realised return of a community event.
#[derive(Clone, Debug)]
pub struct RecordEventReturnCmd {
    pub community_id: i64,
    pub event_id: i64,
    pub actual_return: MoneyCents,
    pub recorded_by: i64,
    pub occurred_at: DateTime<Utc>,
}

impl RecordEventReturnCmd {
    #[must_use]
    pub fn new(
        community_id: i64,
        event_id: i64,
        actual_return: MoneyCents,
        recorded_by: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            community_id,
            event_id,
            actual_return,
            recorded_by,
            occurred_at,
        }
    }
}

/// One line of a paid marketplace order.
#[derive(Clone, Debug)]
pub struct OrderLine {
    pub listing_id: i64,
    pub listing_name: String,
    /// Set when the listing belongs to a community.
    pub community_id: Option<i64>,
    pub line_total: MoneyCents,
}

/// A marketplace order at the moment its payment was marked paid.
#[derive(Clone, Debug)]
pub struct PaidOrder {
    pub order_id: i64,
    pub lines: Vec<OrderLine>,
    pub paid_at: DateTime<Utc>,
}

impl PaidOrder {
    #[must_use]
    pub fn new(order_id: i64, paid_at: DateTime<Utc>) -> Self {
        Self {
            order_id,
            lines: Vec::new(),
            paid_at,
        }
    }

    #[must_use]
    pub fn line(
        mut self,
        listing_id: i64,
        listing_name: impl Into<String>,
        community_id: Option<i64>,
        line_total: MoneyCents,
    ) -> Self {
        self.lines.push(OrderLine {
            listing_id,
            listing_name: listing_name.into(),
            community_id,
            line_total,
        });
        self
    }
}
