use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::catalog::{ComboList, CreateComboRequest, UpdateComboRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Combo,
    response::ApiResponse,
    routes::params::ComboQuery,
    services::combo_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_combos).post(create_combo))
        .route("/{id}", get(get_combo).put(update_combo).delete(delete_combo))
}

#[utoipa::path(
    get,
    path = "/api/combos",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("combo_type" = Option<String>, Query, description = "Filter by combo type"),
        ("area" = Option<String>, Query, description = "Filter by area")
    ),
    responses((status = 200, description = "List combos with their products", body = ApiResponse<ComboList>)),
    tag = "Combos"
)]
pub async fn list_combos(
    State(state): State<AppState>,
    Query(query): Query<ComboQuery>,
) -> AppResult<Json<ApiResponse<ComboList>>> {
    let resp = combo_service::list_combos(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/combos/{id}",
    params(("id" = Uuid, Path, description = "Combo ID")),
    responses(
        (status = 200, description = "Get combo", body = ApiResponse<Combo>),
        (status = 404, description = "Not Found")
    ),
    tag = "Combos"
)]
pub async fn get_combo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Combo>>> {
    let resp = combo_service::get_combo(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/combos",
    request_body = CreateComboRequest,
    responses(
        (status = 201, description = "Create combo (admin only)", body = ApiResponse<Combo>),
        (status = 400, description = "Invalid combo"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Combos"
)]
pub async fn create_combo(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateComboRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Combo>>)> {
    let resp = combo_service::create_combo(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/combos/{id}",
    params(("id" = Uuid, Path, description = "Combo ID")),
    request_body = UpdateComboRequest,
    responses(
        (status = 200, description = "Update combo (admin only)", body = ApiResponse<Combo>),
        (status = 400, description = "Invalid combo"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Combos"
)]
pub async fn update_combo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateComboRequest>,
) -> AppResult<Json<ApiResponse<Combo>>> {
    let resp = combo_service::update_combo(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/combos/{id}",
    params(("id" = Uuid, Path, description = "Combo ID")),
    responses(
        (status = 200, description = "Delete combo (admin only)", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Combos"
)]
pub async fn delete_combo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = combo_service::delete_combo(&state, &user, id).await?;
    Ok(Json(resp))
}
