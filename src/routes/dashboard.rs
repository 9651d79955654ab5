use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::dashboard::{DashboardQuery, Overview, RevenueStats, ShopStats, UserStats},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::dashboard_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(overview))
        .route("/users", get(users))
        .route("/shops", get(shops))
        .route("/revenue", get(revenue))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/overview",
    params(
        ("month" = Option<u32>, Query, description = "Month 1-12, default current"),
        ("year" = Option<i32>, Query, description = "Year, default current")
    ),
    responses(
        (status = 200, description = "Headline counts and revenue (admin only)", body = ApiResponse<Overview>),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn overview(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<ApiResponse<Overview>>> {
    let resp = dashboard_service::overview(&state.pool, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/users",
    params(
        ("month" = Option<u32>, Query, description = "Month 1-12, default current"),
        ("year" = Option<i32>, Query, description = "Year, default current"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "User statistics (admin only)", body = ApiResponse<UserStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<ApiResponse<UserStats>>> {
    let resp = dashboard_service::users(&state.pool, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/shops",
    params(
        ("month" = Option<u32>, Query, description = "Month 1-12, default current"),
        ("year" = Option<i32>, Query, description = "Year, default current"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Shop statistics (admin only)", body = ApiResponse<ShopStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn shops(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<ApiResponse<ShopStats>>> {
    let resp = dashboard_service::shops(&state.pool, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/revenue",
    params(
        ("month" = Option<u32>, Query, description = "Month 1-12, default current"),
        ("year" = Option<i32>, Query, description = "Year, default current"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Revenue statistics (admin only)", body = ApiResponse<RevenueStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn revenue(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<ApiResponse<RevenueStats>>> {
    let resp = dashboard_service::revenue_stats(&state.pool, &user, query).await?;
    Ok(Json(resp))
}
