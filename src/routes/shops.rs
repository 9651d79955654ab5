use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::shops::{
        RegisterShopRequest, RejectShopRequest, SetShopActiveRequest, ShopList, ShopRegistration,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Shop,
    response::ApiResponse,
    routes::params::Pagination,
    services::shop_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_shop))
        .route("/pending", get(list_pending))
        .route("/me", get(my_shop))
        .route("/{id}", get(get_shop))
        .route("/{id}/approve", patch(approve_shop))
        .route("/{id}/reject", patch(reject_shop))
        .route("/{id}/active", patch(set_active))
}

#[utoipa::path(
    post,
    path = "/api/shops/register",
    request_body = RegisterShopRequest,
    responses(
        (status = 201, description = "Create the shop account and a shop awaiting review", body = ApiResponse<ShopRegistration>),
        (status = 400, description = "Username or email already taken")
    ),
    tag = "Shops"
)]
pub async fn register_shop(
    State(state): State<AppState>,
    Json(payload): Json<RegisterShopRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ShopRegistration>>)> {
    let resp = shop_service::register_shop(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/shops/pending",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Shops awaiting review (admin only)", body = ApiResponse<ShopList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Shops"
)]
pub async fn list_pending(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ShopList>>> {
    let resp = shop_service::list_pending(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/shops/me",
    responses(
        (status = 200, description = "Shop linked to the caller", body = ApiResponse<Shop>),
        (status = 404, description = "No shop for this account")
    ),
    security(("bearer_auth" = [])),
    tag = "Shops"
)]
pub async fn my_shop(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Shop>>> {
    let resp = shop_service::my_shop(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/shops/{id}",
    params(("id" = Uuid, Path, description = "Shop ID")),
    responses(
        (status = 200, description = "Get shop", body = ApiResponse<Shop>),
        (status = 404, description = "Not Found")
    ),
    tag = "Shops"
)]
pub async fn get_shop(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Shop>>> {
    let resp = shop_service::get_shop(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/shops/{id}/approve",
    params(("id" = Uuid, Path, description = "Shop ID")),
    responses(
        (status = 200, description = "Approve and activate a shop (admin only)", body = ApiResponse<Shop>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Shops"
)]
pub async fn approve_shop(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Shop>>> {
    let resp = shop_service::approve_shop(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/shops/{id}/reject",
    params(("id" = Uuid, Path, description = "Shop ID")),
    request_body(content = Option<RejectShopRequest>, description = "Optional rejection reason"),
    responses(
        (status = 200, description = "Reject shop (admin only)", body = ApiResponse<Shop>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Shops"
)]
pub async fn reject_shop(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<RejectShopRequest>>,
) -> AppResult<Json<ApiResponse<Shop>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let resp = shop_service::reject_shop(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/shops/{id}/active",
    params(("id" = Uuid, Path, description = "Shop ID")),
    request_body = SetShopActiveRequest,
    responses(
        (status = 200, description = "Suspend or reactivate a shop (admin only)", body = ApiResponse<Shop>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Shops"
)]
pub async fn set_active(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetShopActiveRequest>,
) -> AppResult<Json<ApiResponse<Shop>>> {
    let resp = shop_service::set_active(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
