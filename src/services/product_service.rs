use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{
        CreateProductRequest, MANAGER_EDITABLE_FIELDS, ProductList, UpdateProductRequest,
    },
    entity::{
        Brands, Combos, ProductCategories, ProductTypes, Products, combo_products, combos,
        product_categories::{ActiveModel as CategoryActive, Column as CategoryCol},
        product_types,
        products::{ActiveModel as ProductActive, Column as ProdCol, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_any_role},
    models::{Product, string_list},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductQuery, ProductSortBy, SortOrder, parse_id_list},
    services::{now, require, shop_service::product_listing_shop},
    state::AppState,
    status::{AvailabilityType, Role},
};

pub fn product_from_entity(model: ProductModel, categories: Vec<Uuid>) -> Product {
    Product {
        id: model.id,
        name: model.name,
        brand_id: model.brand_id,
        shop_id: model.shop_id,
        categories,
        origin: model.origin,
        description: model.description,
        price: model.price,
        stock: model.stock,
        images: string_list(&model.images),
        model: model.model,
        camera_type: model.camera_type,
        sensor_type: model.sensor_type,
        megapixels: model.megapixels,
        lens_mount: model.lens_mount,
        video_resolution: model.video_resolution,
        connectivity: string_list(&model.connectivity),
        features: string_list(&model.features),
        weight: model.weight,
        dimensions: model.dimensions,
        usage_instructions: model.usage_instructions,
        certifications: string_list(&model.certifications),
        warnings: model.warnings,
        rating: model.rating,
        availability_type: model.availability_type,
        pre_order_delivery_time: model.pre_order_delivery_time,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

/// Category ids per product, in one query.
async fn load_categories<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<Uuid>>> {
    let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    if product_ids.is_empty() {
        return Ok(map);
    }
    let rows = ProductCategories::find()
        .filter(CategoryCol::ProductId.is_in(product_ids.iter().copied()))
        .all(conn)
        .await?;
    for row in rows {
        map.entry(row.product_id).or_default().push(row.product_type_id);
    }
    Ok(map)
}

async fn with_categories<C: ConnectionTrait>(
    conn: &C,
    models: Vec<ProductModel>,
) -> AppResult<Vec<Product>> {
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut categories = load_categories(conn, &ids).await?;
    Ok(models
        .into_iter()
        .map(|m| {
            let cats = categories.remove(&m.id).unwrap_or_default();
            product_from_entity(m, cats)
        })
        .collect())
}

async fn ensure_categories_exist<C: ConnectionTrait>(conn: &C, ids: &[Uuid]) -> AppResult<()> {
    if ids.is_empty() {
        return Err(AppError::BadRequest(
            "At least one product type is required".into(),
        ));
    }
    let found: Vec<Uuid> = ProductTypes::find()
        .filter(product_types::Column::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
        return Err(AppError::BadRequest(format!(
            "Product type not found: {missing}"
        )));
    }
    Ok(())
}

async fn ensure_brand_exists<C: ConnectionTrait>(conn: &C, brand_id: Option<Uuid>) -> AppResult<()> {
    if let Some(id) = brand_id {
        if Brands::find_by_id(id).one(conn).await?.is_none() {
            return Err(AppError::BadRequest(format!("Brand not found: {id}")));
        }
    }
    Ok(())
}

async fn replace_categories<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    categories: &[Uuid],
) -> AppResult<()> {
    ProductCategories::delete_many()
        .filter(CategoryCol::ProductId.eq(product_id))
        .exec(conn)
        .await?;
    let mut seen = Vec::with_capacity(categories.len());
    for category in categories {
        if seen.contains(category) {
            continue;
        }
        seen.push(*category);
        CategoryActive {
            product_id: Set(product_id),
            product_type_id: Set(*category),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

fn validate_amounts(price: Option<i64>, stock: Option<i32>) -> AppResult<()> {
    if price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }
    Ok(())
}

fn keyword_condition(q: &str) -> Condition {
    let pattern = format!("%{}%", q.trim().to_lowercase());
    Condition::any()
        .add(Expr::expr(Func::lower(Expr::col(ProdCol::Name))).like(pattern.clone()))
        .add(Expr::expr(Func::lower(Expr::col(ProdCol::Model))).like(pattern))
}

fn apply_filters(query: &ProductQuery) -> AppResult<Select<Products>> {
    let mut condition = Condition::all();

    if let Some(q) = query.q.as_deref().filter(|q| !q.trim().is_empty()) {
        condition = condition.add(keyword_condition(q));
    }
    let brands = parse_id_list(query.brand.as_deref(), "brand")?;
    if !brands.is_empty() {
        condition = condition.add(ProdCol::BrandId.is_in(brands));
    }
    let categories = parse_id_list(query.category.as_deref(), "category")?;
    if !categories.is_empty() {
        condition = condition.add(
            ProdCol::Id.in_subquery(
                Query::select()
                    .column(CategoryCol::ProductId)
                    .from(ProductCategories)
                    .and_where(Expr::col(CategoryCol::ProductTypeId).is_in(categories))
                    .to_owned(),
            ),
        );
    }
    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        if min > max {
            return Err(AppError::BadRequest(
                "min_price must not exceed max_price".into(),
            ));
        }
    }
    if let (Some(min), Some(max)) = (query.min_stock, query.max_stock) {
        if min > max {
            return Err(AppError::BadRequest(
                "min_stock must not exceed max_stock".into(),
            ));
        }
    }
    validate_amounts(query.min_price, query.min_stock)?;
    if let Some(min) = query.min_price {
        condition = condition.add(ProdCol::Price.gte(min));
    }
    if let Some(max) = query.max_price {
        condition = condition.add(ProdCol::Price.lte(max));
    }
    if let Some(min) = query.min_stock {
        condition = condition.add(ProdCol::Stock.gte(min));
    }
    if let Some(max) = query.max_stock {
        condition = condition.add(ProdCol::Stock.lte(max));
    }
    if let Some(availability) = query.availability_type {
        condition = condition.add(ProdCol::AvailabilityType.eq(availability));
    }
    if let Some(camera_type) = query.camera_type.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(ProdCol::CameraType.eq(camera_type));
    }
    if let Some(sensor_type) = query.sensor_type.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(ProdCol::SensorType.eq(sensor_type));
    }
    if let Some(lens_mount) = query.lens_mount.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(ProdCol::LensMount.eq(lens_mount));
    }

    let finder = Products::find().filter(condition);
    let column = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => ProdCol::CreatedAt,
        ProductSortBy::Price => ProdCol::Price,
        ProductSortBy::Name => ProdCol::Name,
        ProductSortBy::Rating => ProdCol::Rating,
    };
    Ok(match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(column),
        SortOrder::Desc => finder.order_by_desc(column),
    })
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let finder = apply_filters(&query)?;

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_categories(&state.orm, models).await?;

    Ok(ApiResponse::success(
        "Ok",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_by_shop(
    state: &AppState,
    shop_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Products::find()
        .filter(ProdCol::ShopId.eq(shop_id))
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_categories(&state.orm, models).await?;

    Ok(ApiResponse::success(
        "Ok",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let model = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    let categories = load_categories(&state.orm, &[id])
        .await?
        .remove(&id)
        .unwrap_or_default();
    Ok(ApiResponse::success(
        "Ok",
        product_from_entity(model, categories),
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let shop_id = match user.role {
        Role::Admin => None,
        Role::Shop => Some(product_listing_shop(state, user).await?.id),
        _ => return Err(AppError::Forbidden("Not allowed to create products".into())),
    };

    require(&payload.name, "name")?;
    require(&payload.model, "model")?;
    validate_amounts(Some(payload.price), Some(payload.stock))?;

    let txn = state.orm.begin().await?;
    ensure_brand_exists(&txn, payload.brand_id).await?;
    ensure_categories_exist(&txn, &payload.categories).await?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        brand_id: Set(payload.brand_id),
        shop_id: Set(shop_id),
        origin: Set(payload.origin),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        images: Set(Value::from(payload.images)),
        model: Set(payload.model.trim().to_string()),
        camera_type: Set(payload.camera_type),
        sensor_type: Set(payload.sensor_type),
        megapixels: Set(payload.megapixels),
        lens_mount: Set(payload.lens_mount),
        video_resolution: Set(payload.video_resolution),
        connectivity: Set(Value::from(payload.connectivity)),
        features: Set(Value::from(payload.features)),
        weight: Set(payload.weight),
        dimensions: Set(payload.dimensions),
        usage_instructions: Set(payload.usage_instructions),
        certifications: Set(Value::from(payload.certifications)),
        warnings: Set(payload.warnings),
        rating: Set(0.0),
        availability_type: Set(payload
            .availability_type
            .unwrap_or(AvailabilityType::InStock)),
        pre_order_delivery_time: Set(payload.pre_order_delivery_time),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;
    replace_categories(&txn, product.id, &payload.categories).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id, "shop_id": shop_id }),
    )
    .await;

    let categories = payload.categories;
    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product, categories),
        None,
    ))
}

/// Keys a manager sent outside price and description.
pub fn disallowed_manager_fields(body: &Value) -> Vec<String> {
    body.as_object()
        .map(|fields| {
            fields
                .keys()
                .filter(|key| !MANAGER_EDITABLE_FIELDS.contains(&key.as_str()))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Admins may edit every field, managers only price and description.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    body: Value,
) -> AppResult<ApiResponse<Product>> {
    if !body.is_object() {
        return Err(AppError::BadRequest("Request body must be an object".into()));
    }
    ensure_any_role(user, &[Role::Admin, Role::Manager])?;
    if user.role == Role::Manager {
        let disallowed = disallowed_manager_fields(&body);
        if !disallowed.is_empty() {
            return Err(AppError::Forbidden(format!(
                "Managers may not update: {}",
                disallowed.join(", ")
            )));
        }
    }

    let payload: UpdateProductRequest = serde_json::from_value(body)
        .map_err(|err| AppError::BadRequest(format!("Invalid product payload: {err}")))?;
    if user.role == Role::Manager && payload.price.is_none() && payload.description.is_none() {
        return Err(AppError::BadRequest(
            "Provide a price or a description to update".into(),
        ));
    }
    validate_amounts(payload.price, payload.stock)?;

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    if let Some(brand_id) = payload.brand_id {
        ensure_brand_exists(&txn, Some(brand_id)).await?;
    }
    if let Some(categories) = payload.categories.as_deref() {
        ensure_categories_exist(&txn, categories).await?;
        replace_categories(&txn, id, categories).await?;
    }

    let mut active: ProductActive = product.into();
    if let Some(name) = payload.name {
        require(&name, "name")?;
        active.name = Set(name.trim().to_string());
    }
    if let Some(brand_id) = payload.brand_id {
        active.brand_id = Set(Some(brand_id));
    }
    if let Some(origin) = payload.origin {
        active.origin = Set(Some(origin));
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(images) = payload.images {
        active.images = Set(Value::from(images));
    }
    if let Some(model) = payload.model {
        require(&model, "model")?;
        active.model = Set(model.trim().to_string());
    }
    if let Some(camera_type) = payload.camera_type {
        active.camera_type = Set(Some(camera_type));
    }
    if let Some(sensor_type) = payload.sensor_type {
        active.sensor_type = Set(Some(sensor_type));
    }
    if let Some(megapixels) = payload.megapixels {
        active.megapixels = Set(Some(megapixels));
    }
    if let Some(lens_mount) = payload.lens_mount {
        active.lens_mount = Set(Some(lens_mount));
    }
    if let Some(video_resolution) = payload.video_resolution {
        active.video_resolution = Set(Some(video_resolution));
    }
    if let Some(connectivity) = payload.connectivity {
        active.connectivity = Set(Value::from(connectivity));
    }
    if let Some(features) = payload.features {
        active.features = Set(Value::from(features));
    }
    if let Some(weight) = payload.weight {
        active.weight = Set(Some(weight));
    }
    if let Some(dimensions) = payload.dimensions {
        active.dimensions = Set(Some(dimensions));
    }
    if let Some(usage_instructions) = payload.usage_instructions {
        active.usage_instructions = Set(Some(usage_instructions));
    }
    if let Some(certifications) = payload.certifications {
        active.certifications = Set(Value::from(certifications));
    }
    if let Some(warnings) = payload.warnings {
        active.warnings = Set(Some(warnings));
    }
    if let Some(availability_type) = payload.availability_type {
        active.availability_type = Set(availability_type);
    }
    if let Some(pre_order_delivery_time) = payload.pre_order_delivery_time {
        active.pre_order_delivery_time = Set(Some(pre_order_delivery_time));
    }
    active.updated_at = Set(now());
    let updated = active.update(&txn).await?;

    let categories = load_categories(&txn, &[id])
        .await?
        .remove(&id)
        .unwrap_or_default();
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": id, "role": user.role }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product updated",
        product_from_entity(updated, categories),
        None,
    ))
}

/// Names of combos that contain the product.
pub async fn combos_containing<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> AppResult<Vec<String>> {
    Ok(Combos::find()
        .join(JoinType::InnerJoin, combos::Relation::ComboProducts.def())
        .filter(combo_products::Column::ProductId.eq(product_id))
        .order_by_asc(combos::Column::Name)
        .all(conn)
        .await?
        .into_iter()
        .map(|combo| combo.name)
        .collect())
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if user.role != Role::Admin {
        return Err(AppError::Forbidden("Not allowed to delete products".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let blocking = combos_containing(&txn, id).await?;
    if !blocking.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Product is part of combos: {}. Remove it from those combos first",
            blocking.join(", ")
        )));
    }

    Products::delete_by_id(product.id).exec(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;
    Ok(ApiResponse::message("Product deleted"))
}
