use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::Value;

use crate::{
    dto::payments::{CreatePackagePaymentRequest, PaymentReturnQuery, WebhookAck},
    error::AppResult,
    middleware::auth::AuthUser,
    models::PaymentCheckout,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payos/create", post(create_package_payment))
        .route("/payos/return", get(payment_return))
        .route("/payos/webhook", post(payment_webhook))
}

#[utoipa::path(
    post,
    path = "/api/payments/payos/create",
    request_body = CreatePackagePaymentRequest,
    responses(
        (status = 200, description = "Create a shop package payment link", body = ApiResponse<PaymentCheckout>),
        (status = 400, description = "Shop not approved or package already active"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Gateway failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn create_package_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePackagePaymentRequest>,
) -> AppResult<Json<ApiResponse<PaymentCheckout>>> {
    let resp = payment_service::create_package_payment(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/payments/payos/return",
    params(
        ("orderCode" = Option<i64>, Query, description = "Gateway order code"),
        ("status" = Option<String>, Query, description = "Gateway status, informational only"),
        ("cancel" = Option<bool>, Query, description = "Set when the buyer cancelled")
    ),
    responses((status = 302, description = "Redirect to the frontend result page")),
    tag = "Payments"
)]
pub async fn payment_return(
    State(state): State<AppState>,
    Query(query): Query<PaymentReturnQuery>,
) -> impl IntoResponse {
    let url = payment_service::handle_return(&state, query).await;
    (StatusCode::FOUND, [(header::LOCATION, url)])
}

#[utoipa::path(
    post,
    path = "/api/payments/payos/webhook",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Webhook processed or acknowledged as duplicate", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Invalid webhook signature")
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let resp = payment_service::handle_webhook(&state, body).await?;
    Ok(Json(resp))
}
