use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod fund {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Fund {
        pub community_id: i64,
        pub current_balance_minor: i64,
        pub total_raised_minor: i64,
        /// Loan principal currently outstanding.
        pub total_loans_minor: i64,
        /// Investment capital currently held.
        pub total_investments_minor: i64,
        pub commission_rate: f64,
        pub fixed_return_rate: f64,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Donation {
        /// Must be > 0.
        pub amount_minor: i64,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        /// Must be > 0.
        pub amount_minor: i64,
        pub description: String,
    }

    /// Fraction in `[0, 1]`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RateUpdate {
        pub rate: f64,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        FundRaise,
        LoanGiven,
        LoanReturned,
        InvestmentReceived,
        InvestmentReturned,
        CommissionEarned,
        Expense,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionList {
        /// Defaults to 50, capped at 200.
        pub limit: Option<u64>,
        pub offset: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub community_id: i64,
        pub kind: TransactionKind,
        /// Always > 0; the kind defines the direction.
        pub amount_minor: i64,
        pub description: Option<String>,
        pub reference_id: Option<String>,
        pub reference_type: Option<String>,
        pub user_id: Option<i64>,
        /// `None` for system entries such as commission.
        pub user_name: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }
}

pub mod loan {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LoanStatus {
        Active,
        Completed,
        Overdue,
        Defaulted,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanNew {
        pub amount_minor: i64,
        pub purpose: String,
        pub due_date: DateTime<Utc>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanReturn {
        pub amount_minor: i64,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanList {
        pub status: Option<LoanStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanView {
        pub id: Uuid,
        pub community_id: i64,
        pub borrower_id: i64,
        pub borrower_name: String,
        pub amount_minor: i64,
        pub returned_amount_minor: i64,
        pub purpose: String,
        /// `overdue` for active loans past `due_date`.
        pub status: LoanStatus,
        pub is_overdue: bool,
        pub loan_date: DateTime<Utc>,
        pub due_date: DateTime<Utc>,
        pub returned_date: Option<DateTime<Utc>>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanListResponse {
        pub loans: Vec<LoanView>,
    }
}

pub mod investment {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum InvestmentStatus {
        Active,
        Matured,
        Withdrawn,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvestmentNew {
        pub amount_minor: i64,
        /// Must be > 0.
        pub maturity_months: u32,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvestmentWithdraw {
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvestmentList {
        pub status: Option<InvestmentStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvestmentView {
        pub id: Uuid,
        pub community_id: i64,
        pub investor_id: i64,
        pub investor_name: String,
        pub amount_minor: i64,
        /// Annual rate fixed at creation.
        pub profit_rate: f64,
        /// `matured` for active investments at or past `maturity_date`.
        pub status: InvestmentStatus,
        pub investment_date: DateTime<Utc>,
        pub maturity_date: DateTime<Utc>,
        pub withdrawn_date: Option<DateTime<Utc>>,
        /// Accrued value now, or the payout once withdrawn.
        pub current_value_minor: i64,
        pub total_earned_minor: i64,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvestmentListResponse {
        pub investments: Vec<InvestmentView>,
    }
}

pub mod commission {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrderLine {
        pub listing_id: i64,
        pub listing_name: String,
        /// Set when the listing belongs to a community.
        pub community_id: Option<i64>,
        pub line_total_minor: i64,
    }

    /// Sent by the marketplace once an order payment is marked paid.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrderPaid {
        pub lines: Vec<OrderLine>,
        /// Optional: if absent, server uses now().
        pub paid_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CommissionCharged {
        /// Entries recorded by this call; empty when the order was already
        /// charged.
        pub transactions: Vec<super::transaction::TransactionView>,
    }
}

pub mod event {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EventReturn {
        /// Must be >= 0. Zero records the outcome without crediting the fund.
        pub actual_return_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EventReturnRecorded {
        pub event_id: i64,
        pub actual_return_minor: i64,
        pub transaction: Option<super::transaction::TransactionView>,
    }
}
