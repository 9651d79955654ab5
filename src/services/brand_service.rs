use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::catalog::{BrandList, CreateBrandRequest, UpdateBrandRequest},
    entity::{
        Brands,
        brands::{ActiveModel as BrandActive, Column as BrandCol, Model as BrandModel},
    },
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::{AuthUser, ensure_admin},
    models::Brand,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{now, require},
    state::AppState,
};

pub fn brand_from_entity(model: BrandModel) -> Brand {
    Brand {
        id: model.id,
        name: model.name,
        description: model.description,
        image: model.image,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn duplicate_name(err: sea_orm::DbErr) -> AppError {
    if is_unique_violation(&err) {
        AppError::BadRequest("Brand name already exists".into())
    } else {
        err.into()
    }
}

async fn ensure_name_free(state: &AppState, name: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut condition = Condition::all().add(BrandCol::Name.eq(name));
    if let Some(id) = except {
        condition = condition.add(BrandCol::Id.ne(id));
    }
    if Brands::find().filter(condition).one(&state.orm).await?.is_some() {
        return Err(AppError::BadRequest("Brand name already exists".into()));
    }
    Ok(())
}

pub async fn list_brands(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<BrandList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Brands::find().order_by_asc(BrandCol::Name);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(brand_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        BrandList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_brand(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Brand>> {
    let brand = Brands::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Brand"))?;
    Ok(ApiResponse::success("Ok", brand_from_entity(brand), None))
}

pub async fn create_brand(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBrandRequest,
) -> AppResult<ApiResponse<Brand>> {
    ensure_admin(user)?;
    require(&payload.name, "name")?;
    let name = payload.name.trim().to_string();
    ensure_name_free(state, &name, None).await?;

    let brand = BrandActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        image: Set(payload.image),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(duplicate_name)?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "brand_create",
        "brands",
        serde_json::json!({ "brand_id": brand.id }),
    )
    .await;
    Ok(ApiResponse::success("Brand created", brand_from_entity(brand), None))
}

pub async fn update_brand(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBrandRequest,
) -> AppResult<ApiResponse<Brand>> {
    ensure_admin(user)?;
    let brand = Brands::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Brand"))?;

    let mut active: BrandActive = brand.into();
    if let Some(name) = payload.name {
        require(&name, "name")?;
        let name = name.trim().to_string();
        ensure_name_free(state, &name, Some(id)).await?;
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(image) = payload.image {
        active.image = Set(image);
    }
    active.updated_at = Set(now());
    let updated = active.update(&state.orm).await.map_err(duplicate_name)?;

    Ok(ApiResponse::success("Brand updated", brand_from_entity(updated), None))
}

pub async fn delete_brand(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let brand = Brands::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Brand"))?;
    brand.delete(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "brand_delete",
        "brands",
        serde_json::json!({ "brand_id": id }),
    )
    .await;
    Ok(ApiResponse::message("Brand deleted"))
}
