use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    config::AppConfig,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    entity::{
        Accounts,
        accounts::{ActiveModel as AccountActive, Column as AccountCol, Model as AccountModel},
    },
    error::{AppError, AppResult},
    mailer::{OutgoingMail, send_detached},
    models::Account,
    response::{ApiResponse, Meta},
    services::require,
    state::AppState,
    status::Role,
};

const MIN_PASSWORD_LEN: usize = 6;

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn issue_token(config: &AppConfig, account_id: Uuid, role: Role) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.jwt_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: account_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn account_from_entity(model: AccountModel) -> Account {
    Account {
        id: model.id,
        username: model.username,
        email: model.email,
        phone: model.phone,
        first_name: model.first_name,
        last_name: model.last_name,
        address: model.address,
        role: model.role,
        is_email_verified: model.is_email_verified,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

/// Fields shared by customer and shop sign-up.
pub(crate) struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
}

/// Validates and inserts an unverified account on `conn`, returning it with its
/// email verification token.
pub(crate) async fn insert_account<C: ConnectionTrait>(
    conn: &C,
    new: NewAccount<'_>,
) -> AppResult<AccountModel> {
    require(new.username, "username")?;
    require(new.email, "email")?;
    require(new.first_name, "first_name")?;
    require(new.last_name, "last_name")?;
    if !new.email.contains('@') {
        return Err(AppError::BadRequest("email is invalid".into()));
    }
    validate_password(new.password)?;

    let username = new.username.trim().to_string();
    let email = new.email.trim().to_lowercase();

    let taken = Accounts::find()
        .filter(
            Condition::any()
                .add(AccountCol::Username.eq(username.as_str()))
                .add(AccountCol::Email.eq(email.as_str())),
        )
        .one(conn)
        .await?;
    if let Some(existing) = taken {
        let field = if existing.username == username {
            "Username"
        } else {
            "Email"
        };
        return Err(AppError::BadRequest(format!("{field} is already taken")));
    }

    let password_hash = hash_password(new.password)?;
    let account = AccountActive {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(password_hash),
        phone: Set(new.phone.filter(|p| !p.trim().is_empty())),
        first_name: Set(new.first_name.trim().to_string()),
        last_name: Set(new.last_name.trim().to_string()),
        address: Set(new.address),
        role: Set(new.role),
        is_email_verified: Set(false),
        verification_code: Set(None),
        verification_code_expires: Set(None),
        email_verification_token: Set(Some(Uuid::new_v4().simple().to_string())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await
    .map_err(|err| {
        if crate::error::is_unique_violation(&err) {
            AppError::BadRequest("Username, email or phone is already taken".into())
        } else {
            err.into()
        }
    })?;

    Ok(account)
}

pub(crate) fn send_verification_mail(state: &AppState, account: &AccountModel) {
    if let Some(token) = account.email_verification_token.as_deref() {
        send_detached(
            state.mailer.clone(),
            OutgoingMail::email_verification(&account.email, &state.config.frontend_url, token),
        );
    }
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<Account>> {
    let account = insert_account(
        &state.orm,
        NewAccount {
            username: &payload.username,
            email: &payload.email,
            password: &payload.password,
            first_name: &payload.first_name,
            last_name: &payload.last_name,
            phone: payload.phone,
            address: payload.address,
            role: Role::Customer,
        },
    )
    .await?;

    send_verification_mail(state, &account);
    audit::record(
        &state.pool,
        Some(account.id),
        "user_register",
        "accounts",
        serde_json::json!({ "user_id": account.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Account created, check your email to verify it",
        account_from_entity(account),
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest {
        identifier,
        password,
    } = payload;
    let identifier = identifier.trim();

    let account = Accounts::find()
        .filter(
            Condition::any()
                .add(AccountCol::Username.eq(identifier))
                .add(AccountCol::Email.eq(identifier.to_lowercase())),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".into()))?;

    if !verify_password(&password, &account.password_hash)? {
        return Err(AppError::Unauthorized(
            "Invalid username or password".into(),
        ));
    }
    if !account.is_email_verified {
        return Err(AppError::Unauthorized(
            "Please verify your email before logging in".into(),
        ));
    }

    let token = issue_token(&state.config, account.id, account.role)?;

    audit::record(
        &state.pool,
        Some(account.id),
        "user_login",
        "accounts",
        serde_json::json!({ "user_id": account.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            account: account_from_entity(account),
        },
        Some(Meta::empty()),
    ))
}
