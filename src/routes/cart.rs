use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, put},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, SelectCartItemRequest, UpdateCartItemRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Cart,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/{product_id}", put(update_quantity).delete(remove_item))
        .route("/select/{product_id}", patch(toggle_selected))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current cart with totals", body = ApiResponse<Cart>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::get_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add product to cart", body = ApiResponse<Cart>),
        (status = 400, description = "Insufficient stock"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::add_to_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Set line quantity", body = ApiResponse<Cart>),
        (status = 400, description = "Insufficient stock"),
        (status = 404, description = "Cart or line not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::update_quantity(&state, &user, product_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Remove line from cart", body = ApiResponse<Cart>),
        (status = 404, description = "Cart or line not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::remove_item(&state, &user, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Empty the cart", body = ApiResponse<Cart>),
        (status = 404, description = "Cart not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::clear_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/cart/select/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    request_body(content = Option<SelectCartItemRequest>, description = "Omit to flip the flag"),
    responses(
        (status = 200, description = "Set or flip the selected flag", body = ApiResponse<Cart>),
        (status = 404, description = "Cart or line not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn toggle_selected(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    payload: Option<Json<SelectCartItemRequest>>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let resp = cart_service::toggle_selected(&state, &user, product_id, payload).await?;
    Ok(Json(resp))
}
