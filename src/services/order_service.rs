use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CreateOrderRequest, CustomerInfoInput, OrderList, UpdateOrderStatusRequest},
    entity::{
        Combos, OrderItems, Orders, Products,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
        products::Column as ProdCol,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_self_or_admin},
    models::{CustomerInfo, Order, OrderItem, OrderPayment},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{cart_service, combo_service, insert_with_code, now},
    state::AppState,
    status::{OrderStatus, PaymentMethod, PaymentStatus},
};

/// A line about to be written into a new order.
struct DraftLine {
    product_id: Uuid,
    name: String,
    quantity: i32,
    price: i64,
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        product_id: model.product_id,
        name: model.name,
        quantity: model.quantity,
        price: model.price,
    }
}

pub fn order_from_entity(model: OrderModel, items: Vec<OrderItem>) -> Order {
    Order {
        id: model.id,
        order_code: model.order_code,
        customer_id: model.customer_id,
        combo_id: model.combo_id,
        items,
        total_amount: model.total_amount,
        status: model.status,
        customer_info: CustomerInfo {
            username: model.customer_username,
            email: model.customer_email,
            phone: model.customer_phone,
            address: model.customer_address,
        },
        pickup_time: model.pickup_time.with_timezone(&Utc),
        note: model.note,
        payment: OrderPayment {
            method: model.payment_method,
            status: model.payment_status,
            transaction_id: model.transaction_id,
            payment_time: model.payment_time.map(|t| t.with_timezone(&Utc)),
            details: model.payment_details,
        },
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

async fn with_items<C: ConnectionTrait>(conn: &C, model: OrderModel) -> AppResult<Order> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(model.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();
    Ok(order_from_entity(model, items))
}

async fn with_items_many<C: ConnectionTrait>(
    conn: &C,
    models: Vec<OrderModel>,
) -> AppResult<Vec<Order>> {
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(ids))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
    {
        grouped
            .entry(item.order_id)
            .or_default()
            .push(order_item_from_entity(item));
    }
    Ok(models
        .into_iter()
        .map(|m| {
            let items = grouped.remove(&m.id).unwrap_or_default();
            order_from_entity(m, items)
        })
        .collect())
}

pub async fn find_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))
}

pub async fn lock_order(txn: &DatabaseTransaction, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))
}

fn customer_info(user: &AuthUser, input: CustomerInfoInput) -> CustomerInfo {
    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    CustomerInfo {
        username: non_blank(input.username).unwrap_or_else(|| user.username.clone()),
        email: non_blank(input.email)
            .map(|e| e.trim().to_lowercase())
            .unwrap_or_else(|| user.email.clone()),
        phone: non_blank(input.phone),
        address: non_blank(input.address),
    }
}

/// Lines for a combo purchase: one of each constituent at its current price.
async fn combo_lines(txn: &DatabaseTransaction, combo_id: Uuid) -> AppResult<(Vec<DraftLine>, i64)> {
    let combo = Combos::find_by_id(combo_id)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::not_found("Combo"))?;
    let lines = combo_service::combo_products(txn, combo.id)
        .await?
        .into_iter()
        .map(|p| DraftLine {
            product_id: p.id,
            name: p.name,
            quantity: 1,
            price: p.price,
        })
        .collect();
    Ok((lines, combo.price))
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let mut emptied_cart = None;
    let (lines, total_amount) = match payload.combo_id {
        Some(combo_id) => combo_lines(&txn, combo_id).await?,
        None => {
            let cart = cart_service::lock_cart(&txn, user.user_id)
                .await?
                .ok_or_else(|| AppError::not_found("Cart"))?;
            let items = cart_service::cart_items(&txn, cart.id).await?;
            if items.is_empty() {
                return Err(AppError::not_found("Cart"));
            }

            let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
            let names: HashMap<Uuid, String> = Products::find()
                .filter(ProdCol::Id.is_in(ids))
                .all(&txn)
                .await?
                .into_iter()
                .map(|p| (p.id, p.name))
                .collect();

            let mut lines = Vec::with_capacity(items.len());
            for item in &items {
                let name = names.get(&item.product_id).ok_or_else(|| {
                    AppError::BadRequest(format!("Product not found: {}", item.product_id))
                })?;
                lines.push(DraftLine {
                    product_id: item.product_id,
                    name: name.clone(),
                    quantity: item.quantity,
                    price: item.price,
                });
            }
            let total = cart.total_price;
            emptied_cart = Some(cart);
            (lines, total)
        }
    };

    let info = customer_info(user, payload.customer_info);
    let order_id = Uuid::new_v4();
    let pickup_time = payload.pickup_time.fixed_offset();
    let order = insert_with_code(&txn, |code| OrderActive {
        id: Set(order_id),
        order_code: Set(code),
        customer_id: Set(user.user_id),
        combo_id: Set(payload.combo_id),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending),
        customer_username: Set(info.username.clone()),
        customer_email: Set(info.email.clone()),
        customer_phone: Set(info.phone.clone()),
        customer_address: Set(info.address.clone()),
        pickup_time: Set(pickup_time),
        note: Set(payload.note.clone()),
        payment_method: Set(payload.payment_method.unwrap_or(PaymentMethod::Cod)),
        payment_status: Set(PaymentStatus::Pending),
        transaction_id: Set(None),
        payment_time: Set(None),
        payment_details: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    })
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            name: Set(line.name),
            quantity: Set(line.quantity),
            price: Set(line.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    if let Some(cart) = emptied_cart {
        cart_service::reset_cart(&txn, cart).await?;
    }

    txn.commit().await?;

    tracing::info!(order_id = %order.id, order_code = order.order_code, "order_created");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        order_from_entity(order, items),
        None,
    ))
}

async fn list_where(
    state: &AppState,
    condition: Condition,
    query: &OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = condition;
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_items_many(&state.orm, models).await?;

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    list_where(state, Condition::all(), &query).await
}

pub async fn list_customer_orders(
    state: &AppState,
    user: &AuthUser,
    customer_id: Uuid,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_self_or_admin(user, customer_id)?;
    list_where(
        state,
        Condition::all().add(OrderCol::CustomerId.eq(customer_id)),
        &query,
    )
    .await
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = find_order(&state.orm, id).await?;
    ensure_self_or_admin(user, order.customer_id)?;
    Ok(ApiResponse::success("Ok", with_items(&state.orm, order).await?, None))
}

async fn apply_transition(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    target: OrderStatus,
    owner_allowed: bool,
) -> AppResult<Order> {
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, id).await?;
    if owner_allowed {
        ensure_self_or_admin(user, order.customer_id)?;
    } else {
        ensure_admin(user)?;
    }

    let from = order.status;
    let next = from.transition(target)?;

    let mut active: OrderActive = order.into();
    active.status = Set(next);
    active.updated_at = Set(now());
    let updated = active.update(&txn).await?;
    let order = with_items(&txn, updated).await?;
    txn.commit().await?;

    tracing::info!(order_id = %id, from = %from, to = %next, "order_status_changed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status",
        "orders",
        serde_json::json!({ "order_id": id, "from": from.as_str(), "to": next.as_str() }),
    )
    .await;
    Ok(order)
}

pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let order = apply_transition(state, user, id, payload.status, false).await?;
    Ok(ApiResponse::success("Order status updated", order, None))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = apply_transition(state, user, id, OrderStatus::Cancelled, true).await?;
    Ok(ApiResponse::success("Order cancelled", order, None))
}
