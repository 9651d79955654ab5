use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::catalog::{CreateProductTypeRequest, ProductTypeList, UpdateProductTypeRequest},
    entity::{
        ProductTypes,
        product_types::{ActiveModel as TypeActive, Column as TypeCol, Model as TypeModel},
    },
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::{AuthUser, ensure_admin},
    models::ProductType,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{now, require},
    state::AppState,
};

pub fn product_type_from_entity(model: TypeModel) -> ProductType {
    ProductType {
        id: model.id,
        name: model.name,
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn duplicate_name(err: sea_orm::DbErr) -> AppError {
    if is_unique_violation(&err) {
        AppError::BadRequest("Product type name already exists".into())
    } else {
        err.into()
    }
}

async fn ensure_name_free(state: &AppState, name: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut condition = Condition::all().add(TypeCol::Name.eq(name));
    if let Some(id) = except {
        condition = condition.add(TypeCol::Id.ne(id));
    }
    if ProductTypes::find().filter(condition).one(&state.orm).await?.is_some() {
        return Err(AppError::BadRequest("Product type name already exists".into()));
    }
    Ok(())
}

pub async fn list_product_types(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductTypeList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = ProductTypes::find().order_by_asc(TypeCol::Name);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_type_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        ProductTypeList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_product_type(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductType>> {
    let product_type = ProductTypes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product type"))?;
    Ok(ApiResponse::success("Ok", product_type_from_entity(product_type), None))
}

pub async fn create_product_type(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductTypeRequest,
) -> AppResult<ApiResponse<ProductType>> {
    ensure_admin(user)?;
    require(&payload.name, "name")?;
    let name = payload.name.trim().to_string();
    ensure_name_free(state, &name, None).await?;

    let product_type = TypeActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(duplicate_name)?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_type_create",
        "product_types",
        serde_json::json!({ "product_type_id": product_type.id }),
    )
    .await;
    Ok(ApiResponse::success("Product type created", product_type_from_entity(product_type), None))
}

pub async fn update_product_type(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductTypeRequest,
) -> AppResult<ApiResponse<ProductType>> {
    ensure_admin(user)?;
    let product_type = ProductTypes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product type"))?;

    let mut active: TypeActive = product_type.into();
    if let Some(name) = payload.name {
        require(&name, "name")?;
        let name = name.trim().to_string();
        ensure_name_free(state, &name, Some(id)).await?;
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    active.updated_at = Set(now());
    let updated = active.update(&state.orm).await.map_err(duplicate_name)?;

    Ok(ApiResponse::success("Product type updated", product_type_from_entity(updated), None))
}

pub async fn delete_product_type(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let product_type = ProductTypes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product type"))?;
    product_type.delete(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_type_delete",
        "product_types",
        serde_json::json!({ "product_type_id": id }),
    )
    .await;
    Ok(ApiResponse::message("Product type deleted"))
}
