use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};

use crate::{
    dto::auth::{
        ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse,
        RegisterRequest, ResetPasswordRequest, UpdateProfileRequest, VerifyCodeRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Account,
    response::ApiResponse,
    services::{auth_service, user_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/verify-code", post(verify_code))
        .route("/reset-password", post(reset_password))
        .route("/change-password", post(change_password))
        .route("/verify-email/{token}", get(verify_email))
        .route("/update-profile", put(update_profile))
        .route("/me", get(me))
}

#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register a customer account", body = ApiResponse<Account>),
        (status = 400, description = "Username or email already taken")
    ),
    tag = "Users"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Account>>)> {
    let resp = auth_service::register_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login with username or email", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials or unverified email")
    ),
    tag = "Users"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset code sent by email", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Account not found")
    ),
    tag = "Users"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::forgot_password(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/verify-code",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Reset code is valid", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid or expired code")
    ),
    tag = "Users"
)]
pub async fn verify_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCodeRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::verify_code(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid or expired code")
    ),
    tag = "Users"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::reset_password(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Old password does not match"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::change_password(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/verify-email/{token}",
    params(("token" = String, Path, description = "Email verification token")),
    responses(
        (status = 200, description = "Email verified", body = ApiResponse<Account>),
        (status = 400, description = "Invalid verification token"),
        (status = 409, description = "Email already verified")
    ),
    tag = "Users"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<ApiResponse<Account>>> {
    let resp = user_service::verify_email(&state, &token).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/users/update-profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<Account>),
        (status = 400, description = "Username already taken"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<Account>>> {
    let resp = user_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current account", body = ApiResponse<Account>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Account>>> {
    let resp = user_service::me(&state, &user).await?;
    Ok(Json(resp))
}
