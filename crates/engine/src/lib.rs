//! Community fund ledger.
//!
//! Each community owns one [`LedgerAccount`]. Every change to its balance goes
//! through a single recorder that appends an immutable [`Transaction`] and
//! applies the balance effect in the same database transaction. Loans,
//! investments and marketplace commission are built on top of it.

pub use commands::{
    ApplyLoanCmd, CreateInvestmentCmd, DonateCmd, ExpenseCmd, OrderLine, PaidOrder,
    RecordEventReturnCmd, ReturnLoanCmd, WithdrawInvestmentCmd,
};
pub use error::EngineError;
pub use fund_transactions::{BalanceEffect, ReferenceType, Transaction, TransactionKind};
pub use investments::{AVERAGE_MONTH_DAYS, Investment, InvestmentStatus, accrued_value};
pub use ledger_accounts::{DEFAULT_COMMISSION_RATE, DEFAULT_FIXED_RETURN_RATE, LedgerAccount};
pub use loans::{Loan, LoanStatus};
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, MAX_PAGE_SIZE, MemberRole, commission_key};
pub use views::{InvestmentView, LoanView, TransactionView};

mod commands;
mod community_events;
mod community_members;
mod error;
mod fund_transactions;
mod investments;
mod ledger_accounts;
mod loans;
mod money;
mod ops;
mod users;
mod util;
mod views;

type ResultEngine<T> = Result<T, EngineError>;
