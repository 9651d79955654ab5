use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::catalog::{ComboList, CreateComboRequest, UpdateComboRequest},
    entity::{
        ComboProducts, Combos, Products,
        combo_products::{ActiveModel as ComboProductActive, Column as ComboProductCol},
        combos::{ActiveModel as ComboActive, Column as ComboCol, Model as ComboModel},
        products::{Column as ProdCol, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Combo, ComboProduct, string_list},
    response::{ApiResponse, Meta},
    routes::params::ComboQuery,
    services::{now, require},
    state::AppState,
    status::ComboType,
};

fn combo_from_entity(model: ComboModel, products: Vec<ComboProduct>) -> Combo {
    Combo {
        id: model.id,
        name: model.name,
        area: model.area,
        description: model.description,
        price: model.price,
        combo_type: model.combo_type,
        created_by: model.created_by,
        products,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn combo_product(model: &ProductModel) -> ComboProduct {
    ComboProduct {
        id: model.id,
        name: model.name.clone(),
        price: model.price,
        images: string_list(&model.images),
    }
}

/// Constituent products of a combo in their stored order.
pub async fn combo_products<C: ConnectionTrait>(
    conn: &C,
    combo_id: Uuid,
) -> AppResult<Vec<ProductModel>> {
    let links = ComboProducts::find()
        .filter(ComboProductCol::ComboId.eq(combo_id))
        .order_by_asc(ComboProductCol::Position)
        .all(conn)
        .await?;
    let ids: Vec<Uuid> = links.iter().map(|l| l.product_id).collect();
    let mut by_id: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
}

async fn resolve_products<C: ConnectionTrait>(conn: &C, ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
    let mut unique: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    if unique.is_empty() {
        return Err(AppError::BadRequest(
            "A combo needs at least one product".into(),
        ));
    }
    let found: Vec<Uuid> = Products::find()
        .filter(ProdCol::Id.is_in(unique.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    if let Some(missing) = unique.iter().find(|id| !found.contains(id)) {
        return Err(AppError::BadRequest(format!("Product not found: {missing}")));
    }
    Ok(unique)
}

async fn link_products<C: ConnectionTrait>(
    conn: &C,
    combo_id: Uuid,
    products: &[Uuid],
) -> AppResult<()> {
    ComboProducts::delete_many()
        .filter(ComboProductCol::ComboId.eq(combo_id))
        .exec(conn)
        .await?;
    for (position, product_id) in products.iter().enumerate() {
        ComboProductActive {
            combo_id: Set(combo_id),
            product_id: Set(*product_id),
            position: Set(position as i32),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn load_combo<C: ConnectionTrait>(conn: &C, model: ComboModel) -> AppResult<Combo> {
    let products = combo_products(conn, model.id)
        .await?
        .iter()
        .map(combo_product)
        .collect();
    Ok(combo_from_entity(model, products))
}

pub async fn list_combos(
    state: &AppState,
    query: ComboQuery,
) -> AppResult<ApiResponse<ComboList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(combo_type) = query.combo_type {
        condition = condition.add(ComboCol::ComboType.eq(combo_type));
    }
    if let Some(area) = query.area.as_deref().filter(|a| !a.trim().is_empty()) {
        condition = condition.add(ComboCol::Area.eq(area.trim()));
    }

    let finder = Combos::find()
        .filter(condition)
        .order_by_desc(ComboCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(models.len());
    for model in models {
        items.push(load_combo(&state.orm, model).await?);
    }

    Ok(ApiResponse::success(
        "Ok",
        ComboList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_combo(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Combo>> {
    let model = Combos::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Combo"))?;
    Ok(ApiResponse::success("Ok", load_combo(&state.orm, model).await?, None))
}

pub async fn create_combo(
    state: &AppState,
    user: &AuthUser,
    payload: CreateComboRequest,
) -> AppResult<ApiResponse<Combo>> {
    ensure_admin(user)?;
    require(&payload.name, "name")?;
    require(&payload.area, "area")?;
    if payload.price < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }

    let txn = state.orm.begin().await?;
    let products = resolve_products(&txn, &payload.products).await?;

    let combo = ComboActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        area: Set(payload.area.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price),
        combo_type: Set(payload.combo_type.unwrap_or(ComboType::Basic)),
        created_by: Set(Some(user.user_id)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;
    link_products(&txn, combo.id, &products).await?;
    let combo = load_combo(&txn, combo).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "combo_create",
        "combos",
        serde_json::json!({ "combo_id": combo.id }),
    )
    .await;
    Ok(ApiResponse::success("Combo created", combo, None))
}

pub async fn update_combo(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateComboRequest,
) -> AppResult<ApiResponse<Combo>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let combo = Combos::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Combo"))?;

    if let Some(products) = payload.products.as_deref() {
        let products = resolve_products(&txn, products).await?;
        link_products(&txn, id, &products).await?;
    }

    let mut active: ComboActive = combo.into();
    if let Some(name) = payload.name {
        require(&name, "name")?;
        active.name = Set(name.trim().to_string());
    }
    if let Some(area) = payload.area {
        require(&area, "area")?;
        active.area = Set(area.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("price must not be negative".into()));
        }
        active.price = Set(price);
    }
    if let Some(combo_type) = payload.combo_type {
        active.combo_type = Set(combo_type);
    }
    active.updated_at = Set(now());
    let updated = active.update(&txn).await?;
    let combo = load_combo(&txn, updated).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Combo updated", combo, None))
}

pub async fn delete_combo(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Combos::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Combo"));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "combo_delete",
        "combos",
        serde_json::json!({ "combo_id": id }),
    )
    .await;
    Ok(ApiResponse::message("Combo deleted"))
}
