//! Marketplace commission and community event return endpoints

use api_types::{
    commission::{CommissionCharged, OrderPaid},
    event::{EventReturn, EventReturnRecorded},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use engine::{MoneyCents, PaidOrder, RecordEventReturnCmd, TransactionView};

use crate::{ServerError, funds::map_transaction, server::ServerState, user};

/// Called by the marketplace payment flow once an order payment is marked
/// paid. Repeated calls for the same order record nothing new.
pub async fn charge_order(
    State(state): State<ServerState>,
    Path(order_id): Path<i64>,
    Json(payload): Json<OrderPaid>,
) -> Result<Json<CommissionCharged>, ServerError> {
    let order = payload.lines.into_iter().fold(
        PaidOrder::new(order_id, payload.paid_at.unwrap_or_else(Utc::now)),
        |order, line| {
            order.line(
                line.listing_id,
                line.listing_name,
                line.community_id,
                MoneyCents::new(line.line_total_minor),
            )
        },
    );

    let transactions = state
        .engine
        .charge_commission_on_order(&order)
        .await?
        .into_iter()
        .map(|tx| map_transaction(TransactionView::new(tx, None)))
        .collect();
    Ok(Json(CommissionCharged { transactions }))
}

pub async fn record_event_return(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((community_id, event_id)): Path<(i64, i64)>,
    Json(payload): Json<EventReturn>,
) -> Result<Json<EventReturnRecorded>, ServerError> {
    let recorded = state
        .engine
        .record_event_return(RecordEventReturnCmd::new(
            community_id,
            event_id,
            MoneyCents::new(payload.actual_return_minor),
            user.id,
            Utc::now(),
        ))
        .await?;
    Ok(Json(EventReturnRecorded {
        event_id,
        actual_return_minor: payload.actual_return_minor,
        transaction: recorded.map(map_transaction),
    }))
}
