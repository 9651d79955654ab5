mod common;

use chrono::{Duration, Utc};
use lensmart_api::{
    dto::{
        cart::AddToCartRequest,
        catalog::CreateComboRequest,
        orders::{CreateOrderRequest, CustomerInfoInput, UpdateOrderStatusRequest},
    },
    error::AppError,
    services::{cart_service, combo_service, order_service, product_service},
    status::{OrderStatus, PaymentStatus, Role},
};
use uuid::Uuid;

fn order_request(combo_id: Option<Uuid>) -> CreateOrderRequest {
    CreateOrderRequest {
        combo_id,
        pickup_time: Utc::now() + Duration::days(2),
        note: Some("Call before pickup".into()),
        customer_info: CustomerInfoInput::default(),
        payment_method: None,
    }
}

#[tokio::test]
async fn ordering_from_cart_snapshots_lines_and_empties_cart() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;

    let admin = common::create_account(state, "admin", Role::Admin).await?;
    let customer = common::create_account(state, "buyer", Role::Customer).await?;

    let camera = product_service::create_product(
        state,
        &admin,
        common::product_request(state, "Alpha 7 IV", 12_000_000, 5).await?,
    )
    .await?
    .data
    .expect("product");
    let lens = product_service::create_product(
        state,
        &admin,
        common::product_request(state, "FE 50mm", 450_000, 10).await?,
    )
    .await?
    .data
    .expect("product");

    for (product_id, quantity) in [(camera.id, 1), (lens.id, 2), (lens.id, 1)] {
        cart_service::add_to_cart(state, &customer, AddToCartRequest { product_id, quantity })
            .await?;
    }
    let cart = cart_service::get_cart(state, &customer).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total_items, 4);
    assert_eq!(cart.total_price, 13_350_000);

    let order = order_service::create_order(state, &customer, order_request(None))
        .await?
        .data
        .expect("order");
    assert_eq!(order.customer_id, customer.user_id);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment.status, PaymentStatus::Pending);
    assert_eq!(order.total_amount, 13_350_000);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.customer_info.email, customer.email);

    let cart = cart_service::get_cart(state, &customer).await?.data.expect("cart");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_price, 0);
    assert_eq!(cart.total_items, 0);

    let err = order_service::create_order(state, &customer, order_request(None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn cart_rejects_quantities_beyond_stock() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;

    let admin = common::create_account(state, "admin", Role::Admin).await?;
    let customer = common::create_account(state, "buyer", Role::Customer).await?;
    let product = product_service::create_product(
        state,
        &admin,
        common::product_request(state, "X100VI", 40_000_000, 1).await?,
    )
    .await?
    .data
    .expect("product");

    let err = cart_service::add_to_cart(
        state,
        &customer,
        AddToCartRequest { product_id: product.id, quantity: 2 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = cart_service::add_to_cart(
        state,
        &customer,
        AddToCartRequest { product_id: product.id, quantity: 0 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    cart_service::add_to_cart(
        state,
        &customer,
        AddToCartRequest { product_id: product.id, quantity: 1 },
    )
    .await?;
    let err = cart_service::add_to_cart(
        state,
        &customer,
        AddToCartRequest { product_id: product.id, quantity: i32::MAX },
    )
    .await
    .unwrap_err();
    match err {
        AppError::BadRequest(msg) => assert!(msg.contains("Insufficient stock"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }

    let cart = cart_service::get_cart(state, &customer).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 1);
    assert_eq!(cart.total_items, 1);
    assert_eq!(cart.total_price, 40_000_000);
    Ok(())
}

#[tokio::test]
async fn products_must_name_an_existing_product_type() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;

    let admin = common::create_account(state, "admin", Role::Admin).await?;

    let mut uncategorised = common::product_request(state, "Q3", 150_000_000, 1).await?;
    uncategorised.categories.clear();
    let err = product_service::create_product(state, &admin, uncategorised)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let mut unknown = common::product_request(state, "Q3", 150_000_000, 1).await?;
    unknown.categories = vec![Uuid::new_v4()];
    assert!(product_service::create_product(state, &admin, unknown).await.is_err());

    let category = common::camera_type(state).await?;
    let product = product_service::create_product(
        state,
        &admin,
        common::product_request(state, "Q3", 150_000_000, 1).await?,
    )
    .await?
    .data
    .expect("product");
    assert_eq!(product.categories, vec![category]);
    Ok(())
}

#[tokio::test]
async fn order_status_follows_the_lifecycle() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;

    let admin = common::create_account(state, "admin", Role::Admin).await?;
    let customer = common::create_account(state, "buyer", Role::Customer).await?;
    let product = product_service::create_product(
        state,
        &admin,
        common::product_request(state, "Z6 III", 60_000_000, 3).await?,
    )
    .await?
    .data
    .expect("product");
    cart_service::add_to_cart(
        state,
        &customer,
        AddToCartRequest { product_id: product.id, quantity: 1 },
    )
    .await?;
    let order = order_service::create_order(state, &customer, order_request(None))
        .await?
        .data
        .expect("order");

    let skip = order_service::update_status(
        state,
        &admin,
        order.id,
        UpdateOrderStatusRequest { status: OrderStatus::Completed },
    )
    .await
    .unwrap_err();
    assert!(matches!(skip, AppError::BadRequest(_)));

    let by_customer = order_service::update_status(
        state,
        &customer,
        order.id,
        UpdateOrderStatusRequest { status: OrderStatus::Processing },
    )
    .await
    .unwrap_err();
    assert!(matches!(by_customer, AppError::Forbidden(_)));

    let processing = order_service::update_status(
        state,
        &admin,
        order.id,
        UpdateOrderStatusRequest { status: OrderStatus::Processing },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(processing.status, OrderStatus::Processing);

    let cancelled = order_service::cancel_order(state, &customer, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let again = order_service::cancel_order(state, &customer, order.id)
        .await
        .unwrap_err();
    assert!(matches!(again, AppError::BadRequest(_)));
    Ok(())
}

#[tokio::test]
async fn combo_membership_blocks_product_deletion() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;

    let admin = common::create_account(state, "admin", Role::Admin).await?;
    let customer = common::create_account(state, "buyer", Role::Customer).await?;
    let body = product_service::create_product(
        state,
        &admin,
        common::product_request(state, "EOS R8", 30_000_000, 4).await?,
    )
    .await?
    .data
    .expect("product");
    let lens = product_service::create_product(
        state,
        &admin,
        common::product_request(state, "RF 24-50", 5_000_000, 4).await?,
    )
    .await?
    .data
    .expect("product");

    let combo = combo_service::create_combo(
        state,
        &admin,
        CreateComboRequest {
            name: "Travel kit".into(),
            area: "Ho Chi Minh City".into(),
            description: None,
            price: 33_000_000,
            combo_type: None,
            products: vec![body.id, lens.id],
        },
    )
    .await?
    .data
    .expect("combo");

    let err = product_service::delete_product(state, &admin, body.id)
        .await
        .unwrap_err();
    match err {
        AppError::BadRequest(message) => assert!(message.contains("Travel kit"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }

    let order = order_service::create_order(state, &customer, order_request(Some(combo.id)))
        .await?
        .data
        .expect("order");
    assert_eq!(order.combo_id, Some(combo.id));
    assert_eq!(order.total_amount, 33_000_000);
    assert_eq!(order.items.len(), 2);

    combo_service::delete_combo(state, &admin, combo.id).await?;
    product_service::delete_product(state, &admin, body.id).await?;
    Ok(())
}

#[tokio::test]
async fn only_admins_build_combos() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;

    let customer = common::create_account(state, "buyer", Role::Customer).await?;
    let err = combo_service::create_combo(
        state,
        &customer,
        CreateComboRequest {
            name: "Kit".into(),
            area: "Hanoi".into(),
            description: None,
            price: 1,
            combo_type: None,
            products: vec![Uuid::new_v4()],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    Ok(())
}
