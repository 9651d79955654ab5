use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::catalog::{CreateProductTypeRequest, ProductTypeList, UpdateProductTypeRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::ProductType,
    response::ApiResponse,
    routes::params::Pagination,
    services::product_type_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_product_types).post(create_product_type))
        .route(
            "/{id}",
            get(get_product_type)
                .put(update_product_type)
                .delete(delete_product_type),
        )
}

#[utoipa::path(
    get,
    path = "/api/product-types",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses((status = 200, description = "List product types", body = ApiResponse<ProductTypeList>)),
    tag = "Product Types"
)]
pub async fn list_product_types(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ProductTypeList>>> {
    let resp = product_type_service::list_product_types(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/product-types/{id}",
    params(("id" = Uuid, Path, description = "Product type ID")),
    responses(
        (status = 200, description = "Get product type", body = ApiResponse<ProductType>),
        (status = 404, description = "Not Found")
    ),
    tag = "Product Types"
)]
pub async fn get_product_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductType>>> {
    let resp = product_type_service::get_product_type(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/product-types",
    request_body = CreateProductTypeRequest,
    responses(
        (status = 201, description = "Create product type (admin only)", body = ApiResponse<ProductType>),
        (status = 400, description = "Name already exists"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Product Types"
)]
pub async fn create_product_type(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductTypeRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProductType>>)> {
    let resp = product_type_service::create_product_type(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/product-types/{id}",
    params(("id" = Uuid, Path, description = "Product type ID")),
    request_body = UpdateProductTypeRequest,
    responses(
        (status = 200, description = "Update product type (admin only)", body = ApiResponse<ProductType>),
        (status = 400, description = "Name already exists"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Product Types"
)]
pub async fn update_product_type(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductTypeRequest>,
) -> AppResult<Json<ApiResponse<ProductType>>> {
    let resp = product_type_service::update_product_type(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/product-types/{id}",
    params(("id" = Uuid, Path, description = "Product type ID")),
    responses(
        (status = 200, description = "Delete product type (admin only)", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Product Types"
)]
pub async fn delete_product_type(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_type_service::delete_product_type(&state, &user, id).await?;
    Ok(Json(resp))
}
