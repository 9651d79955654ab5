use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::{
        orders::{CreateOrderRequest, OrderList, UpdateOrderStatusRequest},
        payments::{PaymentReturnQuery, WebhookAck},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, PaymentCheckout},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{order_service, payment_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/customer/{customer_id}", get(list_customer_orders))
        .route("/payment/return", get(payment_return))
        .route("/payment/webhook", post(payment_webhook))
        .route("/{id}", get(get_order))
        .route("/{id}/status", patch(update_order_status))
        .route("/{id}/cancel", patch(cancel_order))
        .route("/{id}/payment", post(create_payment))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Create an order from the cart or a combo", body = ApiResponse<Order>),
        (status = 400, description = "Invalid order"),
        (status = 404, description = "Cart or combo not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let resp = order_service::create_order(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "List all orders (admin only)", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/customer/{customer_id}",
    params(
        ("customer_id" = Uuid, Path, description = "Customer account ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Orders of one customer (self or admin)", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_customer_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Path(customer_id): Path<Uuid>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_customer_orders(&state, &user, customer_id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Get order with items", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Move the order to a new status (admin only)", body = ApiResponse<Order>),
        (status = 400, description = "Transition not allowed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Cancel the order (owner or admin)", body = ApiResponse<Order>),
        (status = 400, description = "Order can no longer be cancelled"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::cancel_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/payment",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Create a gateway payment link", body = ApiResponse<PaymentCheckout>),
        (status = 400, description = "Order is not payable"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Gateway failure, payment marked failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PaymentCheckout>>> {
    let resp = payment_service::create_order_payment(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/payment/return",
    params(
        ("orderCode" = Option<i64>, Query, description = "Gateway order code"),
        ("status" = Option<String>, Query, description = "Gateway status, informational only"),
        ("cancel" = Option<bool>, Query, description = "Set when the buyer cancelled")
    ),
    responses((status = 302, description = "Redirect to the frontend result page")),
    tag = "Orders"
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
    path = "/api/orders/payment/webhook",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Webhook processed or acknowledged as duplicate", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Invalid webhook signature")
    ),
    tag = "Orders"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let resp = payment_service::handle_webhook(&state, body).await?;
    Ok(Json(resp))
}
