//! The module contains the errors the ledger engine can return.
//!
//! Every variant is a request failure with no partial side effects: the
//! surrounding database transaction is rolled back before the error reaches
//! the caller.
//!
//! - [`NotAMember`] and [`NotAuthorized`] gate participation and fund
//!   settings.
//! - [`InsufficientFunds`] is returned whenever a debit would take the fund
//!   below zero.
//! - [`Conflict`] is retryable: resubmit the request. SQLite lock contention
//!   between concurrent writers is reported as a conflict too.
//!
//!  [`NotAMember`]: EngineError::NotAMember
//!  [`NotAuthorized`]: EngineError::NotAuthorized
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`Conflict`]: EngineError::Conflict
use sea_orm::{
    DbErr, RuntimeErr,
    sqlx::{self, sqlite::SqliteError},
};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Not a member: {0}")]
    NotAMember(String),
    #[error("Not authorized: {0}")]
    NotAuthorized(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Duplicate active loan: {0}")]
    DuplicateActiveLoan(String),
    #[error("\"{0}\" loan not found!")]
    LoanNotFound(String),
    #[error("\"{0}\" investment not found!")]
    InvestmentNotFound(String),
    #[error("Over repayment: {0}")]
    OverRepayment(String),
    #[error("Not matured: {0}")]
    NotMatured(String),
    #[error("\"{0}\" not found!")]
    EntityNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(DbErr),
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        if is_lock_contention(&err) {
            return Self::Conflict("the fund is busy, retry the request".to_string());
        }
        Self::Database(err)
    }
}

/// `SQLITE_BUSY` or `SQLITE_LOCKED`, including their extended codes.
fn is_lock_contention(err: &DbErr) -> bool {
    let (DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
    | DbErr::Conn(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))) = err
    else {
        return false;
    };
    db_err.try_downcast_ref::<SqliteError>().is_some()
        && db_err
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| matches!(code & 0xff, 5 | 6))
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotAMember(a), Self::NotAMember(b)) => a == b,
            (Self::NotAuthorized(a), Self::NotAuthorized(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::DuplicateActiveLoan(a), Self::DuplicateActiveLoan(b)) => a == b,
            (Self::LoanNotFound(a), Self::LoanNotFound(b)) => a == b,
            (Self::InvestmentNotFound(a), Self::InvestmentNotFound(b)) => a == b,
            (Self::OverRepayment(a), Self::OverRepayment(b)) => a == b,
            (Self::NotMatured(a), Self::NotMatured(b)) => a == b,
            (Self::EntityNotFound(a), Self::EntityNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_database_errors_stay_database_errors() {
        let err = EngineError::from(DbErr::Custom("boom".to_string()));
        assert_eq!(err, EngineError::Database(DbErr::Custom("boom".to_string())));
    }
}
