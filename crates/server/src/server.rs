use axum::{
    Router,
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{commission, funds, investments, loans, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
    /// Bearer token of the marketplace payment flow. Commission charging is
    /// refused when unset.
    pub marketplace_token: Option<String>,
}

/// Resolves the Basic-auth credentials to a platform user and stores it as a
/// request extension.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("failed to look up user: {err}");
            StatusCode::UNAUTHORIZED
        })?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Admits only the marketplace payment flow, identified by its bearer token.
/// Platform users, even with valid Basic credentials, are refused.
async fn marketplace_auth(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    let authorized = match (header.to_str(), state.marketplace_token.as_deref()) {
        (Ok(value), Some(expected)) => value.strip_prefix("Bearer ") == Some(expected),
        _ => false,
    };
    if !authorized {
        tracing::warn!("refused commission request without the marketplace token");
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let marketplace = Router::new()
        .route(
            "/orders/{order_id}/commission",
            post(commission::charge_order),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            marketplace_auth,
        ));

    Router::new()
        .route("/communities/{community_id}/fund", get(funds::get))
        .route(
            "/communities/{community_id}/fund/transactions",
            get(funds::list_transactions),
        )
        .route(
            "/communities/{community_id}/fund/donations",
            post(funds::donate),
        )
        .route(
            "/communities/{community_id}/fund/expenses",
            post(funds::expense_new),
        )
        .route(
            "/communities/{community_id}/fund/return-rate",
            patch(funds::set_return_rate),
        )
        .route(
            "/communities/{community_id}/fund/commission-rate",
            patch(funds::set_commission_rate),
        )
        .route(
            "/communities/{community_id}/fund/recompute",
            post(funds::recompute),
        )
        .route(
            "/communities/{community_id}/loans",
            get(loans::list).post(loans::apply),
        )
        .route(
            "/communities/{community_id}/loans/{loan_id}/return",
            post(loans::return_loan),
        )
        .route(
            "/communities/{community_id}/investments",
            get(investments::list).post(investments::create),
        )
        .route(
            "/communities/{community_id}/investments/{investment_id}/withdraw",
            post(investments::withdraw),
        )
        .route(
            "/communities/{community_id}/events/{event_id}/return",
            post(commission::record_event_return),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .merge(marketplace)
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    marketplace_token: Option<String>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    if marketplace_token.is_none() {
        tracing::warn!("no marketplace token configured, commission charging is disabled");
    }
    let state = ServerState {
        engine: Arc::new(engine),
        db,
        marketplace_token,
    };

    axum::serve(listener, router(state)).await
}
