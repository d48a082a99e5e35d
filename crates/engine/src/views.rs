//! Read models returned to callers: ledger entities with the actor's display
//! name and the states derived at request time.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    Investment, InvestmentStatus, Loan, LoanStatus, MoneyCents, ResultEngine, Transaction,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionView {
    pub transaction: Transaction,
    /// `None` for system-generated entries.
    pub user_name: Option<String>,
}

impl TransactionView {
    #[must_use]
    pub fn new(transaction: Transaction, user_name: Option<String>) -> Self {
        Self {
            transaction,
            user_name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoanView {
    pub loan: Loan,
    pub borrower_name: String,
    pub status: LoanStatus,
    pub is_overdue: bool,
}

impl LoanView {
    #[must_use]
    pub fn new(loan: Loan, borrower_name: String, now: DateTime<Utc>) -> Self {
        Self {
            status: loan.effective_status(now),
            is_overdue: loan.is_overdue(now),
            loan,
            borrower_name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InvestmentView {
    pub investment: Investment,
    pub investor_name: String,
    pub status: InvestmentStatus,
    pub current_value: MoneyCents,
}

impl InvestmentView {
    pub fn new(
        investment: Investment,
        investor_name: String,
        now: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        Ok(Self {
            status: investment.effective_status(now),
            current_value: investment.current_value(now)?,
            investment,
            investor_name,
        })
    }
}
