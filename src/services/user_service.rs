use chrono::{Duration, Utc};
use rand::Rng;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};

use crate::{
    audit,
    dto::auth::{
        ChangePasswordRequest, ForgotPasswordRequest, ResetPasswordRequest,
        UpdateProfileRequest, VerifyCodeRequest,
    },
    entity::{
        Accounts,
        accounts::{ActiveModel as AccountActive, Column as AccountCol, Model as AccountModel},
    },
    error::{AppError, AppResult, is_unique_violation},
    mailer::{OutgoingMail, send_detached},
    middleware::auth::AuthUser,
    models::Account,
    response::ApiResponse,
    services::{
        auth_service::{account_from_entity, hash_password, validate_password, verify_password},
        now,
    },
    state::AppState,
};

const RESET_CODE_TTL_MINUTES: i64 = 2;

async fn find_by_email(state: &AppState, email: &str) -> AppResult<AccountModel> {
    Accounts::find()
        .filter(AccountCol::Email.eq(email.trim().to_lowercase()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))
}

fn generate_reset_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// A reset code is valid when it matches and has not expired.
fn check_reset_code(account: &AccountModel, code: &str) -> AppResult<()> {
    let matches = account.verification_code.as_deref() == Some(code.trim());
    let fresh = account
        .verification_code_expires
        .is_some_and(|expires| expires.with_timezone(&Utc) > Utc::now());
    if !matches {
        return Err(AppError::BadRequest("Invalid verification code".into()));
    }
    if !fresh {
        return Err(AppError::BadRequest("Verification code has expired".into()));
    }
    Ok(())
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Account>> {
    let account = Accounts::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))?;
    Ok(ApiResponse::success("Ok", account_from_entity(account), None))
}

pub async fn forgot_password(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let account = find_by_email(state, &payload.email).await?;
    let code = generate_reset_code();
    let email = account.email.clone();

    let mut active: AccountActive = account.into();
    active.verification_code = Set(Some(code.clone()));
    active.verification_code_expires =
        Set(Some(now() + Duration::minutes(RESET_CODE_TTL_MINUTES)));
    active.updated_at = Set(now());
    active.update(&state.orm).await?;

    send_detached(
        state.mailer.clone(),
        OutgoingMail::password_reset_code(&email, &code),
    );
    Ok(ApiResponse::message("Verification code sent to your email"))
}

pub async fn verify_code(
    state: &AppState,
    payload: VerifyCodeRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let account = find_by_email(state, &payload.email).await?;
    check_reset_code(&account, &payload.code)?;
    Ok(ApiResponse::message("Verification code is valid"))
}

pub async fn reset_password(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let account = find_by_email(state, &payload.email).await?;
    check_reset_code(&account, &payload.code)?;
    validate_password(&payload.new_password)?;

    let account_id = account.id;
    let mut active: AccountActive = account.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.verification_code = Set(None);
    active.verification_code_expires = Set(None);
    active.updated_at = Set(now());
    active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(account_id),
        "password_reset",
        "accounts",
        serde_json::json!({ "user_id": account_id }),
    )
    .await;
    Ok(ApiResponse::message("Password has been reset"))
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let account = Accounts::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))?;

    if !verify_password(&payload.old_password, &account.password_hash)? {
        return Err(AppError::BadRequest("Old password is incorrect".into()));
    }
    validate_password(&payload.new_password)?;

    let mut active: AccountActive = account.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.updated_at = Set(now());
    active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "password_change",
        "accounts",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;
    Ok(ApiResponse::message("Password changed"))
}

pub async fn verify_email(state: &AppState, token: &str) -> AppResult<ApiResponse<Account>> {
    let account = Accounts::find()
        .filter(AccountCol::EmailVerificationToken.eq(token))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid verification token".into()))?;

    if account.is_email_verified {
        return Err(AppError::Conflict("Email is already verified".into()));
    }

    let mut active: AccountActive = account.into();
    active.is_email_verified = Set(true);
    active.email_verification_token = Set(None);
    active.updated_at = Set(now());
    let updated = active.update(&state.orm).await?;

    tracing::info!(user_id = %updated.id, "email_verified");
    Ok(ApiResponse::success(
        "Email verified",
        account_from_entity(updated),
        None,
    ))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Account>> {
    let account = Accounts::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))?;

    let mut active: AccountActive = account.into();

    if let Some(username) = payload.username.map(|u| u.trim().to_string()) {
        if username.is_empty() {
            return Err(AppError::BadRequest("username is required".into()));
        }
        let taken = Accounts::find()
            .filter(
                Condition::all()
                    .add(AccountCol::Username.eq(username.as_str()))
                    .add(AccountCol::Id.ne(user.user_id)),
            )
            .one(&state.orm)
            .await?;
        if taken.is_some() {
            return Err(AppError::BadRequest("Username is already taken".into()));
        }
        active.username = Set(username);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone).filter(|p| !p.trim().is_empty()));
    }
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(address) = payload.address {
        active.address = Set(Some(address));
    }
    active.updated_at = Set(now());

    let updated = active.update(&state.orm).await.map_err(|err| {
        if is_unique_violation(&err) {
            AppError::BadRequest("Username or phone is already taken".into())
        } else {
            err.into()
        }
    })?;

    Ok(ApiResponse::success(
        "Profile updated",
        account_from_entity(updated),
        None,
    ))
}
