//! Loan API endpoints

use api_types::loan::{LoanList, LoanListResponse, LoanNew, LoanReturn, LoanStatus, LoanView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{ApplyLoanCmd, MoneyCents, ReturnLoanCmd};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_status(status: engine::LoanStatus) -> LoanStatus {
    match status {
        engine::LoanStatus::Active => LoanStatus::Active,
        engine::LoanStatus::Completed => LoanStatus::Completed,
        engine::LoanStatus::Overdue => LoanStatus::Overdue,
        engine::LoanStatus::Defaulted => LoanStatus::Defaulted,
    }
}

fn parse_status(status: LoanStatus) -> engine::LoanStatus {
    match status {
        LoanStatus::Active => engine::LoanStatus::Active,
        LoanStatus::Completed => engine::LoanStatus::Completed,
        LoanStatus::Overdue => engine::LoanStatus::Overdue,
        LoanStatus::Defaulted => engine::LoanStatus::Defaulted,
    }
}

fn map_loan(view: engine::LoanView) -> LoanView {
    let loan = view.loan;
    LoanView {
        id: loan.id,
        community_id: loan.community_id,
        borrower_id: loan.borrower_id,
        borrower_name: view.borrower_name,
        amount_minor: loan.amount.cents(),
        returned_amount_minor: loan.returned_amount.cents(),
        purpose: loan.purpose,
        status: map_status(view.status),
        is_overdue: view.is_overdue,
        loan_date: loan.loan_date,
        due_date: loan.due_date,
        returned_date: loan.returned_date,
        notes: loan.notes,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(community_id): Path<i64>,
    Query(query): Query<LoanList>,
) -> Result<Json<LoanListResponse>, ServerError> {
    let loans = state
        .engine
        .list_loans(
            community_id,
            user.id,
            query.status.map(parse_status),
            Utc::now(),
        )
        .await?
        .into_iter()
        .map(map_loan)
        .collect();
    Ok(Json(LoanListResponse { loans }))
}

pub async fn apply(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(community_id): Path<i64>,
    Json(payload): Json<LoanNew>,
) -> Result<(StatusCode, Json<LoanView>), ServerError> {
    let mut cmd = ApplyLoanCmd::new(
        community_id,
        user.id,
        MoneyCents::new(payload.amount_minor),
        payload.purpose,
        payload.due_date,
        Utc::now(),
    );
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }
    let view = state.engine.apply_for_loan(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_loan(view))))
}

pub async fn return_loan(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((community_id, loan_id)): Path<(i64, Uuid)>,
    Json(payload): Json<LoanReturn>,
) -> Result<Json<LoanView>, ServerError> {
    let mut cmd = ReturnLoanCmd::new(
        community_id,
        loan_id,
        user.id,
        MoneyCents::new(payload.amount_minor),
        Utc::now(),
    );
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }
    let view = state.engine.return_loan(cmd).await?;
    Ok(Json(map_loan(view)))
}
