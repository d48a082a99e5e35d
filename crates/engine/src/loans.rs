//! Member loans disbursed from a community fund.
//!
//! A loan is created `active` with its funds already disbursed and becomes
//! `completed` the moment the returned amount reaches the principal.
//! `overdue` is never stored: it is derived from `due_date` on read.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, ResultEngine,
    util::{append_note, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Completed,
    /// Derived: active and past `due_date`.
    Overdue,
    /// Administrative terminal state.
    Defaulted,
}

impl LoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
            Self::Defaulted => "defaulted",
        }
    }
}

impl TryFrom<&str> for LoanStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "overdue" => Ok(Self::Overdue),
            "defaulted" => Ok(Self::Defaulted),
            other => Err(EngineError::InvalidId(format!("invalid loan status: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: Uuid,
    pub community_id: i64,
    pub borrower_id: i64,
    pub amount: MoneyCents,
    pub purpose: String,
    /// Stored status; never `Overdue`.
    pub status: LoanStatus,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub returned_amount: MoneyCents,
    pub notes: Option<String>,
}

impl Loan {
    pub fn new(
        community_id: i64,
        borrower_id: i64,
        amount: MoneyCents,
        purpose: String,
        loan_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
        notes: Option<String>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount("loan amount must be > 0".to_string()));
        }
        if purpose.trim().is_empty() {
            return Err(EngineError::InvalidAmount(
                "loan purpose must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            community_id,
            borrower_id,
            amount,
            purpose: purpose.trim().to_string(),
            status: LoanStatus::Active,
            loan_date,
            due_date,
            returned_date: None,
            returned_amount: MoneyCents::ZERO,
            notes,
        })
    }

    #[must_use]
    pub fn remaining(&self) -> MoneyCents {
        self.amount - self.returned_amount
    }

    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == LoanStatus::Active && self.due_date < now
    }

    /// Stored status, with `Overdue` substituted for active loans past due.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> LoanStatus {
        if self.is_overdue(now) {
            LoanStatus::Overdue
        } else {
            self.status
        }
    }

    /// Applies a repayment of `amount`, completing the loan once fully repaid.
    pub fn apply_repayment(
        &mut self,
        amount: MoneyCents,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "repayment amount must be > 0".to_string(),
            ));
        }
        if self.status != LoanStatus::Active {
            return Err(EngineError::LoanNotFound(self.id.to_string()));
        }
        let remaining = self.remaining();
        if amount > remaining {
            return Err(EngineError::OverRepayment(format!(
                "return amount cannot exceed remaining loan amount of {remaining}"
            )));
        }

        self.returned_amount += amount;
        if self.returned_amount == self.amount {
            self.status = LoanStatus::Completed;
            self.returned_date = Some(now);
        }
        self.notes = append_note(self.notes.take(), notes);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "community_loans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub community_id: i64,
    pub borrower_id: i64,
    pub amount: i64,
    pub purpose: String,
    pub status: String,
    pub loan_date: DateTimeUtc,
    pub due_date: DateTimeUtc,
    pub returned_date: Option<DateTimeUtc>,
    pub returned_amount: i64,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Loan> for ActiveModel {
    fn from(loan: &Loan) -> Self {
        Self {
            id: ActiveValue::Set(loan.id.to_string()),
            community_id: ActiveValue::Set(loan.community_id),
            borrower_id: ActiveValue::Set(loan.borrower_id),
            amount: ActiveValue::Set(loan.amount.cents()),
            purpose: ActiveValue::Set(loan.purpose.clone()),
            status: ActiveValue::Set(loan.status.as_str().to_string()),
            loan_date: ActiveValue::Set(loan.loan_date),
            due_date: ActiveValue::Set(loan.due_date),
            returned_date: ActiveValue::Set(loan.returned_date),
            returned_amount: ActiveValue::Set(loan.returned_amount.cents()),
            notes: ActiveValue::Set(loan.notes.clone()),
        }
    }
}

impl TryFrom<Model> for Loan {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "loan")?,
            community_id: model.community_id,
            borrower_id: model.borrower_id,
            amount: MoneyCents::new(model.amount),
            purpose: model.purpose,
            status: LoanStatus::try_from(model.status.as_str())?,
            loan_date: model.loan_date,
            due_date: model.due_date,
            returned_date: model.returned_date,
            returned_amount: MoneyCents::new(model.returned_amount),
            notes: model.notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn loan(amount: i64) -> Loan {
        let now = Utc::now();
        Loan::new(
            1,
            2,
            MoneyCents::new(amount),
            "seeds".to_string(),
            now,
            now + Duration::days(30),
            None,
        )
        .unwrap()
    }

    #[test]
    fn partial_then_full_repayment_completes() {
        let mut loan = loan(60_000);
        let now = Utc::now();

        loan.apply_repayment(MoneyCents::new(20_000), None, now).unwrap();
        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.remaining().cents(), 40_000);
        assert!(loan.returned_date.is_none());

        loan.apply_repayment(MoneyCents::new(40_000), Some("paid".to_string()), now)
            .unwrap();
        assert_eq!(loan.status, LoanStatus::Completed);
        assert_eq!(loan.returned_amount, loan.amount);
        assert_eq!(loan.returned_date, Some(now));
        assert_eq!(loan.notes.as_deref(), Some("paid"));
    }

    #[test]
    fn over_repayment_is_rejected_without_changes() {
        let mut loan = loan(10_000);
        let err = loan
            .apply_repayment(MoneyCents::new(10_001), None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, EngineError::OverRepayment(_)));
        assert_eq!(loan.returned_amount, MoneyCents::ZERO);
    }

    #[test]
    fn completed_loan_rejects_further_repayment() {
        let mut loan = loan(10_000);
        loan.apply_repayment(MoneyCents::new(10_000), None, Utc::now())
            .unwrap();
        let err = loan
            .apply_repayment(MoneyCents::new(1), None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, EngineError::LoanNotFound(_)));
    }

    #[test]
    fn notes_are_appended() {
        let mut loan = loan(10_000);
        loan.notes = Some("first".to_string());
        loan.apply_repayment(MoneyCents::new(1), Some("second".to_string()), Utc::now())
            .unwrap();
        assert_eq!(loan.notes.as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn overdue_is_derived_from_due_date() {
        let mut loan = loan(10_000);
        let after_due = loan.due_date + Duration::days(1);
        assert_eq!(loan.effective_status(loan.loan_date), LoanStatus::Active);
        assert_eq!(loan.effective_status(after_due), LoanStatus::Overdue);
        assert_eq!(loan.status, LoanStatus::Active);

        loan.apply_repayment(MoneyCents::new(10_000), None, after_due)
            .unwrap();
        assert_eq!(loan.effective_status(after_due), LoanStatus::Completed);
    }
}
