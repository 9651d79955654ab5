use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{LockType, OnConflict};
use uuid::Uuid;

use crate::{
    audit,
    billing::{CartTotals, Line},
    dto::cart::{AddToCartRequest, SelectCartItemRequest, UpdateCartItemRequest},
    entity::{
        CartItems, Carts, Products,
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Model as CartItemModel},
        carts::{ActiveModel as CartActive, Column as CartCol, Model as CartModel},
        products::Model as ProductModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem},
    response::ApiResponse,
    services::now,
    state::AppState,
};

fn cart_item_from_entity(model: CartItemModel) -> CartItem {
    CartItem {
        product_id: model.product_id,
        name: model.name,
        quantity: model.quantity,
        price: model.price,
        selected: model.selected,
    }
}

fn empty_cart(customer_id: Uuid) -> Cart {
    Cart {
        id: None,
        customer_id,
        items: Vec::new(),
        total_price: 0,
        total_items: 0,
    }
}

pub async fn cart_items<C: ConnectionTrait>(conn: &C, cart_id: Uuid) -> AppResult<Vec<CartItemModel>> {
    Ok(CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .order_by_asc(CartItemCol::CreatedAt)
        .all(conn)
        .await?)
}

/// The customer's cart row, locked for the rest of the transaction.
pub async fn lock_cart(txn: &DatabaseTransaction, customer_id: Uuid) -> AppResult<Option<CartModel>> {
    Ok(Carts::find()
        .filter(CartCol::CustomerId.eq(customer_id))
        .lock(LockType::Update)
        .one(txn)
        .await?)
}

async fn lock_or_create_cart(txn: &DatabaseTransaction, customer_id: Uuid) -> AppResult<CartModel> {
    let insert = CartActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer_id),
        total_price: Set(0),
        total_items: Set(0),
        created_at: NotSet,
        updated_at: NotSet,
    };
    Carts::insert(insert)
        .on_conflict(OnConflict::column(CartCol::CustomerId).do_nothing().to_owned())
        .exec_without_returning(txn)
        .await?;
    lock_cart(txn, customer_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart vanished after upsert")))
}

async fn existing_cart(txn: &DatabaseTransaction, customer_id: Uuid) -> AppResult<CartModel> {
    lock_cart(txn, customer_id)
        .await?
        .ok_or_else(|| AppError::not_found("Cart"))
}

async fn find_product<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))
}

async fn find_line<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
    product_id: Uuid,
) -> AppResult<Option<CartItemModel>> {
    Ok(CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .filter(CartItemCol::ProductId.eq(product_id))
        .one(conn)
        .await?)
}

fn check_quantity(product: &ProductModel, quantity: i32) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::BadRequest("quantity must be at least 1".into()));
    }
    if quantity > product.stock {
        return Err(insufficient_stock(product));
    }
    Ok(())
}

fn insufficient_stock(product: &ProductModel) -> AppError {
    AppError::BadRequest(format!(
        "Insufficient stock for {}: only {} left",
        product.name, product.stock
    ))
}

/// Recomputes the cached totals from the current lines and returns the cart.
pub async fn refresh_totals<C: ConnectionTrait>(conn: &C, cart: CartModel) -> AppResult<Cart> {
    let items = cart_items(conn, cart.id).await?;
    let totals = CartTotals::compute(items.iter().map(|item| Line {
        price: item.price,
        quantity: item.quantity,
    }));

    let mut active: CartActive = cart.into();
    active.total_price = Set(totals.total_price);
    active.total_items = Set(totals.total_items);
    active.updated_at = Set(now());
    let cart = active.update(conn).await?;

    Ok(Cart {
        id: Some(cart.id),
        customer_id: cart.customer_id,
        items: items.into_iter().map(cart_item_from_entity).collect(),
        total_price: cart.total_price,
        total_items: cart.total_items,
    })
}

/// Drops every line while keeping the cart row.
pub async fn reset_cart<C: ConnectionTrait>(conn: &C, cart: CartModel) -> AppResult<Cart> {
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(conn)
        .await?;
    refresh_totals(conn, cart).await
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = Carts::find()
        .filter(CartCol::CustomerId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    let Some(cart) = cart else {
        return Ok(ApiResponse::success("Ok", empty_cart(user.user_id), None));
    };

    let items = cart_items(&state.orm, cart.id).await?;
    Ok(ApiResponse::success(
        "Ok",
        Cart {
            id: Some(cart.id),
            customer_id: cart.customer_id,
            items: items.into_iter().map(cart_item_from_entity).collect(),
            total_price: cart.total_price,
            total_items: cart.total_items,
        },
        None,
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest("quantity must be at least 1".into()));
    }

    let txn = state.orm.begin().await?;
    let product = find_product(&txn, payload.product_id).await?;
    let cart = lock_or_create_cart(&txn, user.user_id).await?;

    match find_line(&txn, cart.id, product.id).await? {
        Some(line) => {
            let quantity = line
                .quantity
                .checked_add(payload.quantity)
                .ok_or_else(|| insufficient_stock(&product))?;
            check_quantity(&product, quantity)?;
            let mut active: CartItemActive = line.into();
            active.quantity = Set(quantity);
            active.price = Set(product.price);
            active.name = Set(product.name.clone());
            active.update(&txn).await?;
        }
        None => {
            check_quantity(&product, payload.quantity)?;
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                name: Set(product.name.clone()),
                quantity: Set(payload.quantity),
                price: Set(product.price),
                selected: Set(true),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }
    }

    let cart = refresh_totals(&txn, cart).await?;
    txn.commit().await?;

    tracing::debug!(user_id = %user.user_id, product_id = %product.id, "cart_item_added");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": product.id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::success("Added to cart", cart, None))
}

pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<Cart>> {
    let txn = state.orm.begin().await?;
    let cart = existing_cart(&txn, user.user_id).await?;
    let line = find_line(&txn, cart.id, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product is not in the cart".into()))?;
    let product = find_product(&txn, product_id).await?;
    check_quantity(&product, payload.quantity)?;

    let mut active: CartItemActive = line.into();
    active.quantity = Set(payload.quantity);
    active.update(&txn).await?;

    let cart = refresh_totals(&txn, cart).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Cart updated", cart, None))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    let txn = state.orm.begin().await?;
    let cart = existing_cart(&txn, user.user_id).await?;
    let result = CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Product is not in the cart".into()));
    }

    let cart = refresh_totals(&txn, cart).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success("Removed from cart", cart, None))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let txn = state.orm.begin().await?;
    let cart = existing_cart(&txn, user.user_id).await?;
    let cart = reset_cart(&txn, cart).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Cart cleared", cart, None))
}

pub async fn toggle_selected(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: SelectCartItemRequest,
) -> AppResult<ApiResponse<Cart>> {
    let txn = state.orm.begin().await?;
    let cart = existing_cart(&txn, user.user_id).await?;
    let line = find_line(&txn, cart.id, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product is not in the cart".into()))?;

    let selected = payload.selected.unwrap_or(!line.selected);
    let mut active: CartItemActive = line.into();
    active.selected = Set(selected);
    active.update(&txn).await?;

    let cart = refresh_totals(&txn, cart).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Cart updated", cart, None))
}
