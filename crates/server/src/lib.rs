use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, router, run_with_listener};

mod commission;
mod funds;
mod investments;
mod loans;
mod server;
mod user;

pub mod types {
    pub mod fund {
        pub use api_types::fund::{Donation, ExpenseNew, Fund, RateUpdate};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            TransactionKind, TransactionList, TransactionListResponse, TransactionView,
        };
    }

    pub mod loan {
        pub use api_types::loan::{LoanList, LoanListResponse, LoanNew, LoanReturn, LoanView};
    }

    pub mod investment {
        pub use api_types::investment::{
            InvestmentList, InvestmentListResponse, InvestmentNew, InvestmentView,
            InvestmentWithdraw,
        };
    }

    pub mod commission {
        pub use api_types::commission::{CommissionCharged, OrderLine, OrderPaid};
        pub use api_types::event::{EventReturn, EventReturnRecorded};
    }
}

pub enum ServerError {
    Engine(EngineError),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotAMember(_) | EngineError::NotAuthorized(_) => StatusCode::FORBIDDEN,
        EngineError::LoanNotFound(_)
        | EngineError::InvestmentNotFound(_)
        | EngineError::EntityNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::DuplicateActiveLoan(_) | EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::InsufficientFunds(_)
        | EngineError::OverRepayment(_)
        | EngineError::NotMatured(_)
        | EngineError::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Database(_) | EngineError::InvalidId(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::InvalidId(msg) => {
            tracing::error!("corrupted stored value: {msg}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let ServerError::Engine(err) = self;
        let (status, error) = (status_for_engine_error(&err), message_for_engine_error(err));

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::DbErr;

    use super::*;

    fn status_of(err: EngineError) -> StatusCode {
        ServerError::from(err).into_response().status()
    }

    #[test]
    fn membership_errors_map_to_403() {
        assert_eq!(
            status_of(EngineError::NotAMember("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(EngineError::NotAuthorized("x".to_string())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn missing_entities_map_to_404() {
        assert_eq!(
            status_of(EngineError::LoanNotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(EngineError::InvestmentNotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(EngineError::EntityNotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        assert_eq!(
            status_of(EngineError::DuplicateActiveLoan("x".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(EngineError::Conflict("x".to_string())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn engine_validation_maps_to_422() {
        for err in [
            EngineError::InsufficientFunds("x".to_string()),
            EngineError::OverRepayment("x".to_string()),
            EngineError::NotMatured("x".to_string()),
            EngineError::InvalidAmount("x".to_string()),
        ] {
            assert_eq!(status_of(err), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn database_errors_are_hidden() {
        let res = ServerError::from(EngineError::Database(DbErr::Custom("boom".to_string())))
            .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            message_for_engine_error(EngineError::Database(DbErr::Custom("boom".to_string()))),
            "internal server error"
        );
    }
}
