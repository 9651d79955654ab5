mod common;

use chrono::{Duration, Utc};
use lensmart_api::{
    dto::{
        cart::AddToCartRequest,
        orders::{CreateOrderRequest, CustomerInfoInput, UpdateOrderStatusRequest},
        payments::{CreatePackagePaymentRequest, PaymentReturnQuery, ReconcileOutcome},
        services::{BookingPaymentRequest, CreateBookingRequest},
    },
    entity::{Accounts, accounts::Column as AccountCol},
    error::AppError,
    gateway::RemotePaymentState,
    middleware::auth::{AuthUser, MaybeAuthUser},
    services::{
        booking_service, cart_service, order_service, payment_service, product_service,
        service_listing_service, shop_service,
    },
    state::AppState,
    status::{
        ApprovalStatus, BookingPaymentStatus, BookingStatus, OrderStatus, PaymentStatus, Role,
        ServiceType, ShopStanding,
    },
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

#[tokio::test]
async fn package_payment_unlocks_product_listing() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;
    let admin = common::create_account(state, "admin", Role::Admin).await?;

    let registration = shop_service::register_shop(state, common::shop_request("focus"))
        .await?
        .data
        .expect("registration");
    assert_eq!(registration.account.role, Role::Shop);
    assert_eq!(registration.shop.approval_status, ApprovalStatus::Pending);
    assert!(!registration.shop.is_active);
    let owner = AuthUser {
        user_id: registration.account.id,
        role: Role::Shop,
        email: registration.account.email.clone(),
        username: registration.account.username.clone(),
    };

    let premature = payment_service::create_package_payment(
        state,
        &owner,
        CreatePackagePaymentRequest { shop_id: None, amount: None, description: None },
    )
    .await
    .unwrap_err();
    assert!(matches!(premature, AppError::BadRequest(_)));

    let shop = shop_service::approve_shop(state, &admin, registration.shop.id)
        .await?
        .data
        .expect("shop");
    assert_eq!(shop.approval_status, ApprovalStatus::Approved);
    assert!(shop.is_active);
    assert_eq!(shop.standing, ShopStanding::AwaitingPackage);

    let blocked = product_service::create_product(
        state,
        &owner,
        common::product_request(state, "GR IIIx", 25_000_000, 2).await?,
    )
    .await
    .unwrap_err();
    assert!(matches!(blocked, AppError::Forbidden(_)));

    let checkout = payment_service::create_package_payment(
        state,
        &owner,
        CreatePackagePaymentRequest { shop_id: None, amount: None, description: None },
    )
    .await?
    .data
    .expect("checkout");
    assert_eq!(checkout.amount, state.config.shop_package_price);
    assert_eq!(checkout.target_id, shop.id);
    assert!(checkout.checkout_url.ends_with(&checkout.correlation_id.to_string()));
    {
        let requests = harness.gateway.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].return_url.ends_with("/api/payments/payos/return"));
    }

    let body = common::signed_webhook(checkout.correlation_id, checkout.amount, "00");
    let ack = payment_service::handle_webhook(state, body.clone())
        .await?
        .data
        .expect("ack");
    assert_eq!(ack.outcome, ReconcileOutcome::Applied);

    let shop = shop_service::get_shop(state, shop.id).await?.data.expect("shop");
    assert!(shop.has_active_package);
    assert_eq!(shop.standing, ShopStanding::Operational);

    let replay = payment_service::handle_webhook(state, body).await?.data.expect("ack");
    assert_eq!(replay.outcome, ReconcileOutcome::Duplicate);

    let product = product_service::create_product(
        state,
        &owner,
        common::product_request(state, "GR IIIx", 25_000_000, 2).await?,
    )
    .await?
    .data
    .expect("product");
    assert_eq!(product.shop_id, Some(shop.id));

    let again = payment_service::create_package_payment(
        state,
        &owner,
        CreatePackagePaymentRequest { shop_id: None, amount: None, description: None },
    )
    .await
    .unwrap_err();
    assert!(matches!(again, AppError::BadRequest(_)));
    Ok(())
}

#[tokio::test]
async fn webhook_with_bad_signature_changes_nothing() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;
    let admin = common::create_account(state, "admin", Role::Admin).await?;
    let (shop_id, owner) = common::approved_shop(state, &admin, "aperture").await?;

    let checkout = payment_service::create_package_payment(
        state,
        &owner,
        CreatePackagePaymentRequest { shop_id: None, amount: Some(1), description: None },
    )
    .await?
    .data
    .expect("checkout");
    // Shops cannot choose their own price.
    assert_eq!(checkout.amount, state.config.shop_package_price);
    assert_eq!(harness.gateway.requests.lock().unwrap()[0].amount, 1_000_000);

    let mut forged = common::signed_webhook(checkout.correlation_id, checkout.amount, "00");
    forged["signature"] = serde_json::json!("00".repeat(32));
    let err = payment_service::handle_webhook(state, forged).await.unwrap_err();
    match err {
        AppError::BadRequest(message) => assert_eq!(message, "Invalid webhook signature"),
        other => panic!("unexpected error: {other:?}"),
    }

    let underpaid = common::signed_webhook(checkout.correlation_id, 1_000, "00");
    let err = payment_service::handle_webhook(state, underpaid).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let shop = shop_service::get_shop(state, shop_id).await?.data.expect("shop");
    assert!(!shop.has_active_package);

    let priced = payment_service::create_package_payment(
        state,
        &admin,
        CreatePackagePaymentRequest { shop_id: Some(shop_id), amount: Some(300_000), description: None },
    )
    .await?
    .data
    .expect("checkout");
    assert_eq!(priced.amount, 300_000);
    let err = payment_service::create_package_payment(
        state,
        &admin,
        CreatePackagePaymentRequest { shop_id: Some(shop_id), amount: Some(0), description: None },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // A correctly signed notification for a code nobody issued is acknowledged.
    let stray = common::signed_webhook(123, 10_000, "00");
    let ack = payment_service::handle_webhook(state, stray).await?.data.expect("ack");
    assert_eq!(ack.outcome, ReconcileOutcome::Ignored);
    Ok(())
}

#[tokio::test]
async fn booking_deposit_payment_confirms_booking() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;
    let admin = common::create_account(state, "admin", Role::Admin).await?;
    let (shop_id, owner) = common::approved_shop(state, &admin, "shutter").await?;

    let service = service_listing_service::create_service(
        state,
        &owner,
        common::service_request("Sensor cleaning", 500_000),
    )
    .await?
    .data
    .expect("service");
    assert_eq!(service.shop_id, shop_id);

    let booking_request = |service_type| CreateBookingRequest {
        service_id: service.id,
        customer_name: "Minh Tran".into(),
        customer_phone: "0911111111".into(),
        customer_email: "Minh@Example.com".into(),
        service_type,
        address: "5 Hai Ba Trung".into(),
        booking_date: Utc::now().date_naive() + Duration::days(3),
        booking_time: "09:30".into(),
        notes: None,
    };

    let err = booking_service::create_booking(
        state,
        MaybeAuthUser(None),
        booking_request(ServiceType::Both),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let own = booking_service::create_booking(
        state,
        MaybeAuthUser(Some(owner.clone())),
        booking_request(ServiceType::Onsite),
    )
    .await
    .unwrap_err();
    assert!(matches!(own, AppError::Forbidden(_)));

    let booking = booking_service::create_booking(
        state,
        MaybeAuthUser(None),
        booking_request(ServiceType::Onsite),
    )
    .await?
    .data
    .expect("booking");
    assert_eq!(booking.total_amount, 500_000);
    assert_eq!(booking.deposit_amount, 50_000);
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.customer_email, "minh@example.com");

    let checkout = payment_service::create_booking_payment(
        state,
        BookingPaymentRequest { booking_id: booking.id },
    )
    .await?
    .data
    .expect("checkout");
    assert_eq!(checkout.amount, 50_000);

    let body = common::signed_webhook(checkout.correlation_id, checkout.amount, "00");
    payment_service::handle_webhook(state, body).await?;

    let booking = booking_service::get_booking(state, &admin, booking.id)
        .await?
        .data
        .expect("booking");
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.payment_status, BookingPaymentStatus::Paid);

    let paid_twice = payment_service::create_booking_payment(
        state,
        BookingPaymentRequest { booking_id: booking.id },
    )
    .await
    .unwrap_err();
    assert!(matches!(paid_twice, AppError::BadRequest(_)));
    Ok(())
}

async fn pending_order(state: &AppState, admin: &AuthUser, customer: &AuthUser) -> anyhow::Result<Uuid> {
    let product = product_service::create_product(
        state,
        admin,
        common::product_request(state, "X-T5", 42_000_000, 3).await?,
    )
    .await?
    .data
    .expect("product");
    cart_service::add_to_cart(
        state,
        customer,
        AddToCartRequest { product_id: product.id, quantity: 1 },
    )
    .await?;
    let order = order_service::create_order(
        state,
        customer,
        CreateOrderRequest {
            combo_id: None,
            pickup_time: Utc::now() + Duration::days(1),
            note: None,
            customer_info: CustomerInfoInput::default(),
            payment_method: None,
        },
    )
    .await?
    .data
    .expect("order");
    Ok(order.id)
}

#[tokio::test]
async fn return_redirect_settles_order_from_gateway_status() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;
    let admin = common::create_account(state, "admin", Role::Admin).await?;
    let customer = common::create_account(state, "buyer", Role::Customer).await?;
    let order_id = pending_order(state, &admin, &customer).await?;

    let stranger = common::create_account(state, "stranger", Role::Customer).await?;
    let err = payment_service::create_order_payment(state, &stranger, order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let checkout = payment_service::create_order_payment(state, &customer, order_id)
        .await?
        .data
        .expect("checkout");
    assert_eq!(checkout.amount, 42_000_000);

    // Query flags from the browser are not trusted while the gateway says pending.
    let redirect = payment_service::handle_return(
        state,
        PaymentReturnQuery {
            order_code: Some(checkout.correlation_id),
            code: Some("00".into()),
            status: Some("PAID".into()),
            cancel: Some(false),
        },
    )
    .await;
    assert!(redirect.contains("success=false"), "{redirect}");

    *harness.gateway.remote_state.lock().unwrap() = Some(RemotePaymentState::Paid);
    let redirect = payment_service::handle_return(
        state,
        PaymentReturnQuery {
            order_code: Some(checkout.correlation_id),
            code: None,
            status: None,
            cancel: None,
        },
    )
    .await;
    assert_eq!(
        redirect,
        format!("http://frontend.test/order-payment-success?success=true&orderId={order_id}")
    );

    let order = order_service::get_order(state, &customer, order_id)
        .await?
        .data
        .expect("order");
    assert_eq!(order.payment.status, PaymentStatus::Completed);
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.payment.transaction_id.as_deref(), Some("STUB-REF"));

    let missing = payment_service::handle_return(
        state,
        PaymentReturnQuery { order_code: None, code: None, status: None, cancel: None },
    )
    .await;
    assert!(missing.ends_with("success=false&error=MissingOrderCode"));
    Ok(())
}

#[tokio::test]
async fn gateway_rejection_marks_order_payment_failed() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;
    let admin = common::create_account(state, "admin", Role::Admin).await?;
    let customer = common::create_account(state, "buyer", Role::Customer).await?;
    let order_id = pending_order(state, &admin, &customer).await?;

    *harness.gateway.fail_create.lock().unwrap() = true;
    let err = payment_service::create_order_payment(state, &customer, order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Gateway(_)));

    let order = order_service::get_order(state, &customer, order_id)
        .await?
        .data
        .expect("order");
    assert_eq!(order.payment.status, PaymentStatus::Failed);
    assert_eq!(order.status, OrderStatus::Pending);
    Ok(())
}

#[tokio::test]
async fn repeated_order_webhook_advances_the_order_once() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;
    let admin = common::create_account(state, "admin", Role::Admin).await?;
    let customer = common::create_account(state, "buyer", Role::Customer).await?;
    let order_id = pending_order(state, &admin, &customer).await?;

    let checkout = payment_service::create_order_payment(state, &customer, order_id)
        .await?
        .data
        .expect("checkout");
    let body = common::signed_webhook(checkout.correlation_id, checkout.amount, "00");

    let first = payment_service::handle_webhook(state, body.clone()).await?.data.expect("ack");
    assert_eq!(first.outcome, ReconcileOutcome::Applied);
    let paid = order_service::get_order(state, &customer, order_id)
        .await?
        .data
        .expect("order");
    assert_eq!(paid.status, OrderStatus::Processing);
    assert_eq!(paid.payment.status, PaymentStatus::Completed);

    let second = payment_service::handle_webhook(state, body).await?.data.expect("ack");
    assert_eq!(second.outcome, ReconcileOutcome::Duplicate);
    let replayed = order_service::get_order(state, &customer, order_id)
        .await?
        .data
        .expect("order");
    assert_eq!(replayed.status, OrderStatus::Processing);
    assert_eq!(replayed.payment.status, PaymentStatus::Completed);
    assert_eq!(replayed.payment.transaction_id, paid.payment.transaction_id);
    assert_eq!(replayed.payment.payment_time, paid.payment.payment_time);
    Ok(())
}

#[tokio::test]
async fn late_failure_notice_leaves_an_advanced_order_alone() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;
    let admin = common::create_account(state, "admin", Role::Admin).await?;
    let customer = common::create_account(state, "buyer", Role::Customer).await?;
    let order_id = pending_order(state, &admin, &customer).await?;

    let checkout = payment_service::create_order_payment(state, &customer, order_id)
        .await?
        .data
        .expect("checkout");
    let paid = common::signed_webhook(checkout.correlation_id, checkout.amount, "00");
    payment_service::handle_webhook(state, paid).await?;
    order_service::update_status(
        state,
        &admin,
        order_id,
        UpdateOrderStatusRequest { status: OrderStatus::Accepted },
    )
    .await?;

    let failed = common::signed_webhook(checkout.correlation_id, checkout.amount, "01");
    payment_service::handle_webhook(state, failed).await?;

    let order = order_service::get_order(state, &customer, order_id)
        .await?
        .data
        .expect("order");
    assert_eq!(order.status, OrderStatus::Accepted);
    assert_eq!(order.payment.status, PaymentStatus::Completed);
    Ok(())
}

#[tokio::test]
async fn shop_registration_is_all_or_nothing() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;

    let mut first = common::shop_request("lumen");
    first.business_license_number = Some("BL-0001".into());
    shop_service::register_shop(state, first).await?;

    let mut second = common::shop_request("prism");
    second.business_license_number = Some("BL-0001".into());
    let err = shop_service::register_shop(state, second).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // The account half of the failed registration must not survive.
    let leftover = Accounts::find()
        .filter(AccountCol::Username.eq("prism"))
        .count(&state.orm)
        .await?;
    assert_eq!(leftover, 0);

    let retry = shop_service::register_shop(state, common::shop_request("prism"))
        .await?
        .data
        .expect("registration");
    assert_eq!(retry.account.username, "prism");
    Ok(())
}
