use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::shops::{
        RegisterShopRequest, RejectShopRequest, SetShopActiveRequest, ShopList, ShopRegistration,
    },
    entity::{
        Shops,
        shops::{ActiveModel as ShopActive, Column as ShopCol, Model as ShopModel},
    },
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::{AuthUser, ensure_admin},
    models::Shop,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{
        auth_service::{NewAccount, account_from_entity, insert_account, send_verification_mail},
        now, require,
    },
    state::AppState,
    status::{ApprovalStatus, Role, ShopStanding},
};

pub fn shop_from_entity(model: ShopModel) -> Shop {
    let standing = model.standing();
    Shop {
        id: model.id,
        account_id: model.account_id,
        shop_name: model.shop_name,
        shop_address: model.shop_address,
        shop_description: model.shop_description,
        shop_logo_url: model.shop_logo_url,
        business_license_number: model.business_license_number,
        tax_id: model.tax_id,
        contact_email: model.contact_email,
        contact_phone: model.contact_phone,
        bank_account_number: model.bank_account_number,
        bank_name: model.bank_name,
        approval_status: model.approval_status,
        rejection_reason: model.rejection_reason,
        is_active: model.is_active,
        has_active_package: model.has_active_package,
        standing,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub async fn find_shop<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<ShopModel> {
    Shops::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))
}

/// Shop owned by the account, if any.
pub async fn shop_of_account<C: ConnectionTrait>(
    conn: &C,
    account_id: Uuid,
) -> AppResult<Option<ShopModel>> {
    Ok(Shops::find()
        .filter(ShopCol::AccountId.eq(account_id))
        .one(conn)
        .await?)
}

/// The caller's shop, which must be allowed to list products.
pub async fn product_listing_shop(state: &AppState, user: &AuthUser) -> AppResult<ShopModel> {
    let shop = shop_of_account(&state.orm, user.user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("No shop is linked to this account".into()))?;
    match shop.standing() {
        ShopStanding::Operational => Ok(shop),
        ShopStanding::AwaitingPackage => Err(AppError::Forbidden(
            "An active shop package is required to add products".into(),
        )),
        _ => Err(AppError::Forbidden(
            "Shop must be approved and active to add products".into(),
        )),
    }
}

/// The caller's shop, which must be allowed to offer services.
pub async fn service_offering_shop(state: &AppState, user: &AuthUser) -> AppResult<ShopModel> {
    let shop = shop_of_account(&state.orm, user.user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("No shop is linked to this account".into()))?;
    if !shop.standing().can_offer_services() {
        return Err(AppError::Forbidden(
            "Shop must be approved and active to manage services".into(),
        ));
    }
    Ok(shop)
}

pub async fn register_shop(
    state: &AppState,
    payload: RegisterShopRequest,
) -> AppResult<ApiResponse<ShopRegistration>> {
    require(&payload.shop_name, "shop_name")?;
    require(&payload.shop_address, "shop_address")?;

    let txn = state.orm.begin().await?;

    let account = insert_account(
        &txn,
        NewAccount {
            username: &payload.username,
            email: &payload.email,
            password: &payload.password,
            first_name: &payload.first_name,
            last_name: &payload.last_name,
            phone: payload.phone.clone(),
            address: Some(payload.shop_address.clone()),
            role: Role::Shop,
        },
    )
    .await?;

    let shop = ShopActive {
        id: Set(Uuid::new_v4()),
        account_id: Set(account.id),
        shop_name: Set(payload.shop_name.trim().to_string()),
        shop_address: Set(payload.shop_address.trim().to_string()),
        shop_description: Set(payload.shop_description),
        shop_logo_url: Set(payload.shop_logo_url),
        business_license_number: Set(payload.business_license_number),
        tax_id: Set(payload.tax_id),
        contact_email: Set(payload.contact_email.map(|e| e.to_lowercase())),
        contact_phone: Set(payload.contact_phone),
        bank_account_number: Set(payload.bank_account_number),
        bank_name: Set(payload.bank_name),
        approval_status: Set(ApprovalStatus::Pending),
        rejection_reason: Set(None),
        is_active: Set(false),
        has_active_package: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::BadRequest("Business license number or tax id is already registered".into())
        } else {
            err.into()
        }
    })?;

    txn.commit().await?;

    send_verification_mail(state, &account);
    audit::record(
        &state.pool,
        Some(account.id),
        "shop_register",
        "shops",
        serde_json::json!({ "shop_id": shop.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Shop registered, awaiting approval",
        ShopRegistration {
            account: account_from_entity(account),
            shop: shop_from_entity(shop),
        },
        None,
    ))
}

pub async fn list_pending(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ShopList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Shops::find()
        .filter(ShopCol::ApprovalStatus.eq(ApprovalStatus::Pending))
        .order_by_asc(ShopCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(shop_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        ShopList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_shop(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Shop>> {
    let shop = find_shop(&state.orm, id).await?;
    Ok(ApiResponse::success("Ok", shop_from_entity(shop), None))
}

pub async fn my_shop(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Shop>> {
    let shop = shop_of_account(&state.orm, user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;
    Ok(ApiResponse::success("Ok", shop_from_entity(shop), None))
}

pub async fn approve_shop(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Shop>> {
    ensure_admin(user)?;
    let shop = find_shop(&state.orm, id).await?;
    let previous = shop.approval_status;

    let mut active: ShopActive = shop.into();
    active.approval_status = Set(ApprovalStatus::Approved);
    active.rejection_reason = Set(None);
    active.is_active = Set(true);
    active.updated_at = Set(now());
    let updated = active.update(&state.orm).await?;

    tracing::info!(shop_id = %id, from = ?previous, "shop_approved");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "shop_approve",
        "shops",
        serde_json::json!({ "shop_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Shop approved",
        shop_from_entity(updated),
        None,
    ))
}

pub async fn reject_shop(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RejectShopRequest,
) -> AppResult<ApiResponse<Shop>> {
    ensure_admin(user)?;
    let shop = find_shop(&state.orm, id).await?;

    let mut active: ShopActive = shop.into();
    active.approval_status = Set(ApprovalStatus::Rejected);
    active.rejection_reason = Set(payload.reason.filter(|r| !r.trim().is_empty()));
    active.is_active = Set(false);
    active.updated_at = Set(now());
    let updated = active.update(&state.orm).await?;

    tracing::info!(shop_id = %id, "shop_rejected");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "shop_reject",
        "shops",
        serde_json::json!({ "shop_id": id, "reason": updated.rejection_reason }),
    )
    .await;

    Ok(ApiResponse::success(
        "Shop rejected",
        shop_from_entity(updated),
        None,
    ))
}

pub async fn set_active(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SetShopActiveRequest,
) -> AppResult<ApiResponse<Shop>> {
    ensure_admin(user)?;
    let shop = find_shop(&state.orm, id).await?;
    if payload.is_active && shop.approval_status != ApprovalStatus::Approved {
        return Err(AppError::BadRequest(
            "Only approved shops can be activated".into(),
        ));
    }

    let mut active: ShopActive = shop.into();
    active.is_active = Set(payload.is_active);
    active.updated_at = Set(now());
    let updated = active.update(&state.orm).await?;

    tracing::info!(shop_id = %id, is_active = payload.is_active, "shop_activity_changed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "shop_set_active",
        "shops",
        serde_json::json!({ "shop_id": id, "is_active": payload.is_active }),
    )
    .await;

    Ok(ApiResponse::success(
        "Shop updated",
        shop_from_entity(updated),
        None,
    ))
}
