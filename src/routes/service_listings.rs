use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::services::{CreateServiceRequest, ReviewList, ServiceList, UpdateServiceRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Service,
    response::ApiResponse,
    routes::params::{Pagination, ServiceQuery},
    services::{review_service, service_listing_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services).post(create_service))
        .route("/shop/{shop_id}", get(list_shop_services))
        .route(
            "/{id}",
            get(get_service).put(update_service).delete(delete_service),
        )
        .route("/{id}/reviews", get(list_service_reviews))
}

#[utoipa::path(
    get,
    path = "/api/services",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search on name and description"),
        ("shop_id" = Option<Uuid>, Query, description = "Filter by shop"),
        ("category" = Option<String>, Query, description = "Comma separated product type ids"),
        ("min_price" = Option<i64>, Query, description = "Minimum price"),
        ("max_price" = Option<i64>, Query, description = "Maximum price"),
        ("service_type" = Option<String>, Query, description = "onsite, offsite or both"),
        ("availability" = Option<String>, Query, description = "available or unavailable")
    ),
    responses(
        (status = 200, description = "List services", body = ApiResponse<ServiceList>),
        (status = 400, description = "Invalid filter")
    ),
    tag = "Services"
)]
pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ServiceQuery>,
) -> AppResult<Json<ApiResponse<ServiceList>>> {
    let resp = service_listing_service::list_services(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/services/shop/{shop_id}",
    params(
        ("shop_id" = Uuid, Path, description = "Shop ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses((status = 200, description = "Services offered by a shop", body = ApiResponse<ServiceList>)),
    tag = "Services"
)]
pub async fn list_shop_services(
    State(state): State<AppState>,
    Path(shop_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ServiceList>>> {
    let resp = service_listing_service::list_by_shop(&state, shop_id, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Get service", body = ApiResponse<Service>),
        (status = 404, description = "Not Found")
    ),
    tag = "Services"
)]
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Service>>> {
    let resp = service_listing_service::get_service(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Create a service for the caller's shop", body = ApiResponse<Service>),
        (status = 400, description = "Invalid service"),
        (status = 403, description = "Shop is not approved and active")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn create_service(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateServiceRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Service>>)> {
    let resp = service_listing_service::create_service(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Update a service of the caller's shop", body = ApiResponse<Service>),
        (status = 400, description = "Invalid service"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn update_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServiceRequest>,
) -> AppResult<Json<ApiResponse<Service>>> {
    let resp = service_listing_service::update_service(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Delete a service of the caller's shop", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn delete_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = service_listing_service::delete_service(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/services/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Service ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses((status = 200, description = "Reviews of a service", body = ApiResponse<ReviewList>)),
    tag = "Services"
)]
pub async fn list_service_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let resp = review_service::list_by_service(&state, id, pagination).await?;
    Ok(Json(resp))
}
