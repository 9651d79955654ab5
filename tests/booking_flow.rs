mod common;

use chrono::{Duration, NaiveDate, Utc};
use lensmart_api::{
    dto::services::{
        BookingPaymentRequest, CreateBookingRequest, CreateReviewRequest, UpdateBookingStatusRequest,
        UpdateServiceRequest,
    },
    error::AppError,
    middleware::auth::MaybeAuthUser,
    services::{booking_service, payment_service, review_service, service_listing_service},
    status::{BookingStatus, Role, ServiceAvailability, ServiceType},
};
use uuid::Uuid;

fn booking_request(service_id: Uuid, email: &str, booking_date: NaiveDate) -> CreateBookingRequest {
    CreateBookingRequest {
        service_id,
        customer_name: "Thu Ha".into(),
        customer_phone: "0922222222".into(),
        customer_email: email.to_string(),
        service_type: ServiceType::Onsite,
        address: "30 Nguyen Hue".into(),
        booking_date,
        booking_time: "14:00".into(),
        notes: None,
    }
}

#[tokio::test]
async fn booked_service_cannot_be_deleted() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;
    let admin = common::create_account(state, "admin", Role::Admin).await?;
    let (_, owner) = common::approved_shop(state, &admin, "viewfinder").await?;

    let idle = service_listing_service::create_service(
        state,
        &owner,
        common::service_request("Lens calibration", 300_000),
    )
    .await?
    .data
    .expect("service");
    service_listing_service::delete_service(state, &owner, idle.id).await?;
    let gone = service_listing_service::get_service(state, idle.id).await.unwrap_err();
    assert!(matches!(gone, AppError::NotFound(_)));

    let service = service_listing_service::create_service(
        state,
        &owner,
        common::service_request("Shutter repair", 800_000),
    )
    .await?
    .data
    .expect("service");
    let tomorrow = Utc::now().date_naive() + Duration::days(1);
    booking_service::create_booking(
        state,
        MaybeAuthUser(None),
        booking_request(service.id, "guest@example.com", tomorrow),
    )
    .await?;

    let err = service_listing_service::delete_service(state, &owner, service.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    let kept = service_listing_service::get_service(state, service.id)
        .await?
        .data
        .expect("service");
    assert_eq!(kept.id, service.id);

    // Withdrawing it is still possible.
    let withdrawn = service_listing_service::update_service(
        state,
        &owner,
        service.id,
        UpdateServiceRequest {
            availability: Some(ServiceAvailability::Unavailable),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("service");
    assert_eq!(withdrawn.availability, ServiceAvailability::Unavailable);
    Ok(())
}

#[tokio::test]
async fn deposit_is_fixed_when_the_booking_is_made() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;
    let admin = common::create_account(state, "admin", Role::Admin).await?;
    let (_, owner) = common::approved_shop(state, &admin, "bokeh").await?;

    let service = service_listing_service::create_service(
        state,
        &owner,
        common::service_request("Sensor cleaning", 500_000),
    )
    .await?
    .data
    .expect("service");
    let tomorrow = Utc::now().date_naive() + Duration::days(1);
    let booking = booking_service::create_booking(
        state,
        MaybeAuthUser(None),
        booking_request(service.id, "guest@example.com", tomorrow),
    )
    .await?
    .data
    .expect("booking");
    assert_eq!(booking.deposit_amount, 50_000);

    service_listing_service::update_service(
        state,
        &owner,
        service.id,
        UpdateServiceRequest { price: Some(900_000), ..Default::default() },
    )
    .await?;

    let stored = booking_service::get_booking(state, &admin, booking.id)
        .await?
        .data
        .expect("booking");
    assert_eq!(stored.total_amount, 500_000);
    assert_eq!(stored.deposit_amount, 50_000);

    let checkout = payment_service::create_booking_payment(
        state,
        BookingPaymentRequest { booking_id: booking.id },
    )
    .await?
    .data
    .expect("checkout");
    assert_eq!(checkout.amount, 50_000);

    let later = booking_service::create_booking(
        state,
        MaybeAuthUser(None),
        booking_request(service.id, "other@example.com", tomorrow),
    )
    .await?
    .data
    .expect("booking");
    assert_eq!(later.deposit_amount, 90_000);
    Ok(())
}

#[tokio::test]
async fn guest_booking_is_reviewable_by_the_matching_account() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;
    let admin = common::create_account(state, "admin", Role::Admin).await?;
    let (_, owner) = common::approved_shop(state, &admin, "tripod").await?;
    let customer = common::create_account(state, "linh", Role::Customer).await?;
    let stranger = common::create_account(state, "khoa", Role::Customer).await?;

    let service = service_listing_service::create_service(
        state,
        &owner,
        common::service_request("Firmware update", 200_000),
    )
    .await?
    .data
    .expect("service");

    // Booked while signed out, under the address the account later uses.
    let today = Utc::now().date_naive();
    let booking = booking_service::create_booking(
        state,
        MaybeAuthUser(None),
        booking_request(service.id, "LINH@example.com", today),
    )
    .await?
    .data
    .expect("booking");
    for status in [BookingStatus::Confirmed, BookingStatus::Completed] {
        booking_service::update_status(state, &owner, booking.id, UpdateBookingStatusRequest { status })
            .await?;
    }

    let err = review_service::create_review(
        state,
        &stranger,
        booking.id,
        CreateReviewRequest { rating: 1, comment: None },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let review = review_service::create_review(
        state,
        &customer,
        booking.id,
        CreateReviewRequest { rating: 4, comment: Some("Quick and careful".into()) },
    )
    .await?
    .data
    .expect("review");
    assert_eq!(review.customer_id, customer.user_id);
    assert_eq!(review.service_id, service.id);

    let rated = service_listing_service::get_service(state, service.id)
        .await?
        .data
        .expect("service");
    assert_eq!(rated.rating, 4.0);
    Ok(())
}
