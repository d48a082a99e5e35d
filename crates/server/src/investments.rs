//! Investment API endpoints

use api_types::investment::{
    InvestmentList, InvestmentListResponse, InvestmentNew, InvestmentStatus, InvestmentView,
    InvestmentWithdraw,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{CreateInvestmentCmd, MoneyCents, WithdrawInvestmentCmd};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_status(status: engine::InvestmentStatus) -> InvestmentStatus {
    match status {
        engine::InvestmentStatus::Active => InvestmentStatus::Active,
        engine::InvestmentStatus::Matured => InvestmentStatus::Matured,
        engine::InvestmentStatus::Withdrawn => InvestmentStatus::Withdrawn,
    }
}

fn parse_status(status: InvestmentStatus) -> engine::InvestmentStatus {
    match status {
        InvestmentStatus::Active => engine::InvestmentStatus::Active,
        InvestmentStatus::Matured => engine::InvestmentStatus::Matured,
        InvestmentStatus::Withdrawn => engine::InvestmentStatus::Withdrawn,
    }
}

fn map_investment(view: engine::InvestmentView) -> InvestmentView {
    let inv = view.investment;
    InvestmentView {
        id: inv.id,
        community_id: inv.community_id,
        investor_id: inv.investor_id,
        investor_name: view.investor_name,
        amount_minor: inv.amount.cents(),
        profit_rate: inv.profit_rate,
        status: map_status(view.status),
        investment_date: inv.investment_date,
        maturity_date: inv.maturity_date,
        withdrawn_date: inv.withdrawn_date,
        current_value_minor: view.current_value.cents(),
        total_earned_minor: inv.total_earned.cents(),
        notes: inv.notes,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(community_id): Path<i64>,
    Query(query): Query<InvestmentList>,
) -> Result<Json<InvestmentListResponse>, ServerError> {
    let investments = state
        .engine
        .list_investments(
            community_id,
            user.id,
            query.status.map(parse_status),
            Utc::now(),
        )
        .await?
        .into_iter()
        .map(map_investment)
        .collect();
    Ok(Json(InvestmentListResponse { investments }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(community_id): Path<i64>,
    Json(payload): Json<InvestmentNew>,
) -> Result<(StatusCode, Json<InvestmentView>), ServerError> {
    let mut cmd = CreateInvestmentCmd::new(
        community_id,
        user.id,
        MoneyCents::new(payload.amount_minor),
        payload.maturity_months,
        Utc::now(),
    );
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }
    let view = state.engine.create_investment(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_investment(view))))
}

pub async fn withdraw(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((community_id, investment_id)): Path<(i64, Uuid)>,
    Json(payload): Json<InvestmentWithdraw>,
) -> Result<Json<InvestmentView>, ServerError> {
    let mut cmd = WithdrawInvestmentCmd::new(community_id, investment_id, user.id, Utc::now());
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }
    let view = state.engine.withdraw_investment(cmd).await?;
    Ok(Json(map_investment(view)))
}
