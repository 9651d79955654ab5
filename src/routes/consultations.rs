use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::consultations::{
        ConsultationList, CreateConsultationRequest, RecordCallRequest,
        RescheduleConsultationRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::ConsultationRequest,
    response::ApiResponse,
    routes::params::ConsultationQuery,
    services::consultation_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/requests", get(list_requests).post(create_request))
        .route("/requests/{id}", get(get_request))
        .route("/requests/{id}/reschedule", put(reschedule))
        .route("/requests/{id}/call-result", put(record_call))
}

#[utoipa::path(
    post,
    path = "/api/consultations/requests",
    request_body = CreateConsultationRequest,
    responses(
        (status = 201, description = "Ask for a call back now or at a chosen time", body = ApiResponse<ConsultationRequest>),
        (status = 400, description = "Invalid contact details or missing preferred time")
    ),
    tag = "Consultations"
)]
pub async fn create_request(
    State(state): State<AppState>,
    Json(payload): Json<CreateConsultationRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ConsultationRequest>>)> {
    let resp = consultation_service::create_request(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/consultations/requests",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Comma separated statuses, e.g. scheduled,pending_reschedule")
    ),
    responses(
        (status = 200, description = "Consultation queue, latest preferred time first", body = ApiResponse<ConsultationList>),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Consultations"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ConsultationQuery>,
) -> AppResult<Json<ApiResponse<ConsultationList>>> {
    let resp = consultation_service::list_requests(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/consultations/requests/{id}",
    params(("id" = Uuid, Path, description = "Consultation request ID")),
    responses(
        (status = 200, description = "Request with its call history", body = ApiResponse<ConsultationRequest>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Consultations"
)]
pub async fn get_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ConsultationRequest>>> {
    let resp = consultation_service::get_request(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/consultations/requests/{id}/reschedule",
    params(("id" = Uuid, Path, description = "Consultation request ID")),
    request_body = RescheduleConsultationRequest,
    responses(
        (status = 200, description = "Move the consultation to a new time", body = ApiResponse<ConsultationRequest>),
        (status = 400, description = "Request already closed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Consultations"
)]
pub async fn reschedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RescheduleConsultationRequest>,
) -> AppResult<Json<ApiResponse<ConsultationRequest>>> {
    let resp = consultation_service::reschedule(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/consultations/requests/{id}/call-result",
    params(("id" = Uuid, Path, description = "Consultation request ID")),
    request_body = RecordCallRequest,
    responses(
        (status = 200, description = "Log a call and update the request status", body = ApiResponse<ConsultationRequest>),
        (status = 400, description = "Request already closed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Consultations"
)]
pub async fn record_call(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordCallRequest>,
) -> AppResult<Json<ApiResponse<ConsultationRequest>>> {
    let resp = consultation_service::record_call(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
