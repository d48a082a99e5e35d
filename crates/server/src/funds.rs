//! Community fund API endpoints

use api_types::{
    fund::{Donation, ExpenseNew, Fund, RateUpdate},
    transaction::{
        TransactionKind as ApiKind, TransactionList, TransactionListResponse, TransactionView,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{DonateCmd, ExpenseCmd, LedgerAccount, MoneyCents};

use crate::{ServerError, server::ServerState, user};

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::FundRaise => ApiKind::FundRaise,
        engine::TransactionKind::LoanGiven => ApiKind::LoanGiven,
        engine::TransactionKind::LoanReturned => ApiKind::LoanReturned,
        engine::TransactionKind::InvestmentReceived => ApiKind::InvestmentReceived,
        engine::TransactionKind::InvestmentReturned => ApiKind::InvestmentReturned,
        engine::TransactionKind::CommissionEarned => ApiKind::CommissionEarned,
        engine::TransactionKind::Expense => ApiKind::Expense,
    }
}

pub(crate) fn map_fund(account: &LedgerAccount) -> Fund {
    Fund {
        community_id: account.community_id,
        current_balance_minor: account.current_balance.cents(),
        total_raised_minor: account.total_raised.cents(),
        total_loans_minor: account.total_loans.cents(),
        total_investments_minor: account.total_investments.cents(),
        commission_rate: account.commission_rate,
        fixed_return_rate: account.fixed_return_rate,
        updated_at: account.updated_at,
    }
}

pub(crate) fn map_transaction(view: engine::TransactionView) -> TransactionView {
    let tx = view.transaction;
    TransactionView {
        id: tx.id,
        community_id: tx.community_id,
        kind: map_kind(tx.kind),
        amount_minor: tx.amount.cents(),
        description: tx.description,
        reference_id: tx.reference_id,
        reference_type: tx.reference_type.map(|r| r.as_str().to_string()),
        user_id: tx.user_id,
        user_name: view.user_name,
        created_at: tx.created_at,
    }
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(community_id): Path<i64>,
) -> Result<Json<Fund>, ServerError> {
    let account = state
        .engine
        .get_fund(community_id, user.id, Utc::now())
        .await?;
    Ok(Json(map_fund(&account)))
}

pub async fn list_transactions(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(community_id): Path<i64>,
    Query(query): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let transactions = state
        .engine
        .list_transactions(community_id, user.id, query.limit, query.offset)
        .await?
        .into_iter()
        .map(map_transaction)
        .collect();
    Ok(Json(TransactionListResponse { transactions }))
}

pub async fn donate(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(community_id): Path<i64>,
    Json(payload): Json<Donation>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let mut cmd = DonateCmd::new(
        community_id,
        user.id,
        MoneyCents::new(payload.amount_minor),
        Utc::now(),
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    let view = state.engine.donate(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_transaction(view))))
}

pub async fn expense_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(community_id): Path<i64>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let view = state
        .engine
        .record_expense(ExpenseCmd::new(
            community_id,
            user.id,
            MoneyCents::new(payload.amount_minor),
            payload.description,
            Utc::now(),
        ))
        .await?;
    Ok((StatusCode::CREATED, Json(map_transaction(view))))
}

pub async fn set_return_rate(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(community_id): Path<i64>,
    Json(payload): Json<RateUpdate>,
) -> Result<Json<Fund>, ServerError> {
    let account = state
        .engine
        .set_fixed_return_rate(community_id, user.id, payload.rate, Utc::now())
        .await?;
    Ok(Json(map_fund(&account)))
}

pub async fn set_commission_rate(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(community_id): Path<i64>,
    Json(payload): Json<RateUpdate>,
) -> Result<Json<Fund>, ServerError> {
    let account = state
        .engine
        .set_commission_rate(community_id, user.id, payload.rate, Utc::now())
        .await?;
    Ok(Json(map_fund(&account)))
}

pub async fn recompute(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(community_id): Path<i64>,
) -> Result<Json<Fund>, ServerError> {
    let account = state
        .engine
        .recompute_fund(community_id, user.id, Utc::now())
        .await?;
    Ok(Json(map_fund(&account)))
}
