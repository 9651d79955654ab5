use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    audit,
    dto::services::{CreateServiceRequest, ServiceList, UpdateServiceRequest},
    entity::{
        Bookings, ProductTypes, ServiceCategories, Services, bookings, product_types,
        service_categories::{ActiveModel as ServiceCategoryActive, Column as ServiceCategoryCol},
        services::{ActiveModel as ServiceActive, Column as ServiceCol, Model as ServiceModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Service, string_list},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ServiceQuery, parse_id_list},
    services::{now, require, shop_service::service_offering_shop},
    state::AppState,
    status::{ServiceAvailability, ServiceType},
};

const DEFAULT_MAX_BOOKINGS: i32 = 10;
const DEFAULT_HOURS: &str = "09:00-18:00";
const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Weekly schedule with every day present; missing days get the default hours.
fn working_hours(input: Option<Value>) -> AppResult<Value> {
    let mut hours = serde_json::Map::new();
    let given = match input {
        None | Some(Value::Null) => serde_json::Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(AppError::BadRequest(
                "working_hours must be an object keyed by weekday".into(),
            ));
        }
    };
    for day in WEEKDAYS {
        let value = match given.get(day) {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => DEFAULT_HOURS.to_string(),
            Some(_) => {
                return Err(AppError::BadRequest(format!(
                    "working_hours.{day} must be a string"
                )));
            }
        };
        hours.insert(day.to_string(), Value::String(value));
    }
    Ok(Value::Object(hours))
}

fn validate_numbers(price: Option<i64>, duration: Option<i32>, max_bookings: Option<i32>) -> AppResult<()> {
    if price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if duration.is_some_and(|d| d < 1) {
        return Err(AppError::BadRequest("duration must be at least 1 minute".into()));
    }
    if max_bookings.is_some_and(|m| m < 1) {
        return Err(AppError::BadRequest("max_bookings must be at least 1".into()));
    }
    Ok(())
}

pub fn service_from_entity(model: ServiceModel, categories: Vec<Uuid>) -> Service {
    Service {
        id: model.id,
        shop_id: model.shop_id,
        name: model.name,
        description: model.description,
        price: model.price,
        duration: model.duration,
        images: string_list(&model.images),
        categories,
        service_type: model.service_type,
        availability: model.availability,
        max_bookings: model.max_bookings,
        working_hours: model.working_hours,
        requirements: string_list(&model.requirements),
        includes: string_list(&model.includes),
        excludes: string_list(&model.excludes),
        notes: model.notes,
        rating: model.rating,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

async fn with_categories<C: ConnectionTrait>(
    conn: &C,
    models: Vec<ServiceModel>,
) -> AppResult<Vec<Service>> {
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    if !ids.is_empty() {
        for row in ServiceCategories::find()
            .filter(ServiceCategoryCol::ServiceId.is_in(ids))
            .all(conn)
            .await?
        {
            map.entry(row.service_id).or_default().push(row.product_type_id);
        }
    }
    Ok(models
        .into_iter()
        .map(|m| {
            let cats = map.remove(&m.id).unwrap_or_default();
            service_from_entity(m, cats)
        })
        .collect())
}

async fn one_with_categories<C: ConnectionTrait>(conn: &C, model: ServiceModel) -> AppResult<Service> {
    with_categories(conn, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Service"))
}

async fn replace_categories<C: ConnectionTrait>(
    conn: &C,
    service_id: Uuid,
    categories: &[Uuid],
) -> AppResult<()> {
    let mut unique: Vec<Uuid> = Vec::with_capacity(categories.len());
    for id in categories {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    if !unique.is_empty() {
        let found: Vec<Uuid> = ProductTypes::find()
            .filter(product_types::Column::Id.is_in(unique.iter().copied()))
            .all(conn)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        if let Some(missing) = unique.iter().find(|id| !found.contains(id)) {
            return Err(AppError::BadRequest(format!(
                "Product type not found: {missing}"
            )));
        }
    }

    ServiceCategories::delete_many()
        .filter(ServiceCategoryCol::ServiceId.eq(service_id))
        .exec(conn)
        .await?;
    for category in unique {
        ServiceCategoryActive {
            service_id: Set(service_id),
            product_type_id: Set(category),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

pub async fn find_service<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<ServiceModel> {
    Services::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Service"))
}

fn apply_filters(query: &ServiceQuery) -> AppResult<Select<Services>> {
    let mut condition = Condition::all();

    if let Some(q) = query.q.as_deref().filter(|q| !q.trim().is_empty()) {
        let pattern = format!("%{}%", q.trim().to_lowercase());
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(ServiceCol::Name))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col(ServiceCol::Description))).like(pattern)),
        );
    }
    if let Some(shop_id) = query.shop_id {
        condition = condition.add(ServiceCol::ShopId.eq(shop_id));
    }
    let categories = parse_id_list(query.category.as_deref(), "category")?;
    if !categories.is_empty() {
        condition = condition.add(
            ServiceCol::Id.in_subquery(
                Query::select()
                    .column(ServiceCategoryCol::ServiceId)
                    .from(ServiceCategories)
                    .and_where(Expr::col(ServiceCategoryCol::ProductTypeId).is_in(categories))
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
    if let Some(min) = query.min_price {
        condition = condition.add(ServiceCol::Price.gte(min));
    }
    if let Some(max) = query.max_price {
        condition = condition.add(ServiceCol::Price.lte(max));
    }
    if let Some(service_type) = query.service_type {
        condition = condition.add(ServiceCol::ServiceType.eq(service_type));
    }
    if let Some(availability) = query.availability {
        condition = condition.add(ServiceCol::Availability.eq(availability));
    }

    Ok(Services::find()
        .filter(condition)
        .order_by_desc(ServiceCol::CreatedAt))
}

pub async fn list_services(
    state: &AppState,
    query: ServiceQuery,
) -> AppResult<ApiResponse<ServiceList>> {
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
        ServiceList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_by_shop(
    state: &AppState,
    shop_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ServiceList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Services::find()
        .filter(ServiceCol::ShopId.eq(shop_id))
        .order_by_desc(ServiceCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_categories(&state.orm, models).await?;

    Ok(ApiResponse::success(
        "Ok",
        ServiceList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_service(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Service>> {
    let model = find_service(&state.orm, id).await?;
    Ok(ApiResponse::success(
        "Ok",
        one_with_categories(&state.orm, model).await?,
        None,
    ))
}

pub async fn create_service(
    state: &AppState,
    user: &AuthUser,
    payload: CreateServiceRequest,
) -> AppResult<ApiResponse<Service>> {
    let shop = service_offering_shop(state, user).await?;
    require(&payload.name, "name")?;
    validate_numbers(Some(payload.price), payload.duration, payload.max_bookings)?;
    let hours = working_hours(payload.working_hours)?;

    let txn = state.orm.begin().await?;
    let service = ServiceActive {
        id: Set(Uuid::new_v4()),
        shop_id: Set(shop.id),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price),
        duration: Set(payload.duration),
        images: Set(json!(payload.images)),
        service_type: Set(payload.service_type.unwrap_or(ServiceType::Both)),
        availability: Set(payload.availability.unwrap_or(ServiceAvailability::Available)),
        max_bookings: Set(payload.max_bookings.unwrap_or(DEFAULT_MAX_BOOKINGS)),
        working_hours: Set(hours),
        requirements: Set(json!(payload.requirements)),
        includes: Set(json!(payload.includes)),
        excludes: Set(json!(payload.excludes)),
        notes: Set(payload.notes),
        rating: Set(0.0),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;
    replace_categories(&txn, service.id, &payload.categories).await?;
    let service = one_with_categories(&txn, service).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "service_create",
        "services",
        json!({ "service_id": service.id, "shop_id": shop.id }),
    )
    .await;

    Ok(ApiResponse::success("Service created", service, None))
}

pub async fn update_service(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateServiceRequest,
) -> AppResult<ApiResponse<Service>> {
    let shop = service_offering_shop(state, user).await?;
    validate_numbers(payload.price, payload.duration, payload.max_bookings)?;

    let txn = state.orm.begin().await?;
    let service = find_service(&txn, id).await?;
    if service.shop_id != shop.id {
        return Err(AppError::Forbidden(
            "Only the owning shop may modify this service".into(),
        ));
    }

    if let Some(categories) = payload.categories.as_deref() {
        replace_categories(&txn, id, categories).await?;
    }

    let mut active: ServiceActive = service.into();
    if let Some(name) = payload.name {
        require(&name, "name")?;
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(duration) = payload.duration {
        active.duration = Set(Some(duration));
    }
    if let Some(images) = payload.images {
        active.images = Set(json!(images));
    }
    if let Some(service_type) = payload.service_type {
        active.service_type = Set(service_type);
    }
    if let Some(availability) = payload.availability {
        active.availability = Set(availability);
    }
    if let Some(max_bookings) = payload.max_bookings {
        active.max_bookings = Set(max_bookings);
    }
    if payload.working_hours.is_some() {
        active.working_hours = Set(working_hours(payload.working_hours)?);
    }
    if let Some(requirements) = payload.requirements {
        active.requirements = Set(json!(requirements));
    }
    if let Some(includes) = payload.includes {
        active.includes = Set(json!(includes));
    }
    if let Some(excludes) = payload.excludes {
        active.excludes = Set(json!(excludes));
    }
    if let Some(notes) = payload.notes {
        active.notes = Set(Some(notes));
    }
    active.updated_at = Set(now());
    let updated = active.update(&txn).await?;
    let service = one_with_categories(&txn, updated).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Service updated", service, None))
}

pub async fn delete_service(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Value>> {
    let shop = service_offering_shop(state, user).await?;
    let txn = state.orm.begin().await?;
    let service = find_service(&txn, id).await?;
    if service.shop_id != shop.id {
        return Err(AppError::Forbidden(
            "Only the owning shop may delete this service".into(),
        ));
    }

    // Bookings keep their service reference for history and reviews.
    let booked = Bookings::find()
        .filter(bookings::Column::ServiceId.eq(id))
        .count(&txn)
        .await?;
    if booked > 0 {
        return Err(AppError::BadRequest(format!(
            "Service has {booked} booking(s); set its availability to unavailable instead"
        )));
    }

    Services::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "service_delete",
        "services",
        json!({ "service_id": id }),
    )
    .await;
    Ok(ApiResponse::message("Service deleted"))
}
