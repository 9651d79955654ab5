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
        payments::{PaymentReturnQuery, WebhookAck},
        services::{
            BookingList, BookingPaymentRequest, CreateBookingRequest, CreateReviewRequest,
            UpdateBookingStatusRequest,
        },
    },
    error::AppResult,
    middleware::auth::{AuthUser, MaybeAuthUser},
    models::{Booking, PaymentCheckout, ServiceReview},
    response::ApiResponse,
    routes::params::BookingQuery,
    services::{booking_service, payment_service, review_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/customer/{email}", get(list_customer_bookings))
        .route("/payment", post(create_deposit_payment))
        .route("/payment/return", get(payment_return))
        .route("/payment/webhook", post(payment_webhook))
        .route("/{id}", get(get_booking))
        .route("/{id}/status", patch(update_booking_status))
        .route("/{id}/review", post(create_review))
}

#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Book a service; the 10% deposit is computed", body = ApiResponse<Booking>),
        (status = 400, description = "Service unavailable or service type not offered"),
        (status = 403, description = "A shop cannot book its own service"),
        (status = 404, description = "Service not found")
    ),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Booking>>)> {
    let resp = booking_service::create_booking(&state, caller, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by booking status"),
        ("payment_status" = Option<String>, Query, description = "Filter by deposit status"),
        ("search" = Option<String>, Query, description = "Match customer name, email or phone")
    ),
    responses(
        (status = 200, description = "All bookings for admins, own bookings for shops", body = ApiResponse<BookingList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = booking_service::list_bookings(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings/customer/{email}",
    params(
        ("email" = String, Path, description = "Customer email"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by booking status"),
        ("payment_status" = Option<String>, Query, description = "Filter by deposit status")
    ),
    responses(
        (status = 200, description = "Bookings made with an email address", body = ApiResponse<BookingList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn list_customer_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Path(email): Path<String>,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = booking_service::list_by_customer_email(&state, &user, &email, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Get booking", body = ApiResponse<Booking>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::get_booking(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/status",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = UpdateBookingStatusRequest,
    responses(
        (status = 200, description = "Move the booking to a new status", body = ApiResponse<Booking>),
        (status = 400, description = "Transition not allowed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn update_booking_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookingStatusRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/review",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review a completed booking", body = ApiResponse<ServiceReview>),
        (status = 400, description = "Booking not completed or already reviewed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ServiceReview>>)> {
    let resp = review_service::create_review(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/bookings/payment",
    request_body = BookingPaymentRequest,
    responses(
        (status = 200, description = "Create a deposit payment link", body = ApiResponse<PaymentCheckout>),
        (status = 400, description = "Deposit already paid or booking closed"),
        (status = 404, description = "Booking not found"),
        (status = 500, description = "Gateway failure")
    ),
    tag = "Bookings"
)]
pub async fn create_deposit_payment(
    State(state): State<AppState>,
    Json(payload): Json<BookingPaymentRequest>,
) -> AppResult<Json<ApiResponse<PaymentCheckout>>> {
    let resp = payment_service::create_booking_payment(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings/payment/return",
    params(
        ("orderCode" = Option<i64>, Query, description = "Gateway order code"),
        ("status" = Option<String>, Query, description = "Gateway status, informational only"),
        ("cancel" = Option<bool>, Query, description = "Set when the buyer cancelled")
    ),
    responses((status = 302, description = "Redirect to the frontend result page")),
    tag = "Bookings"
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
    path = "/api/bookings/payment/webhook",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Webhook processed or acknowledged as duplicate", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Invalid webhook signature")
    ),
    tag = "Bookings"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let resp = payment_service::handle_webhook(&state, body).await?;
    Ok(Json(resp))
}
