mod common;

use chrono::NaiveDate;
use lensmart_api::{
    billing::{CartTotals, Line, MAX_CODE, deposit_for, generate_code},
    error::AppError,
    gateway::{canonical_data_string, sign_with_key, verify_webhook_with_key},
    routes::params::Pagination,
    services::{
        consultation_service::{parse_status_filter, validate_contact},
        dashboard_service::Window,
        product_service::disallowed_manager_fields,
    },
    status::{
        ApprovalStatus, BookingStatus, CallResult, ConsultationStatus, ConsultationType,
        OrderStatus, ServiceType, ShopStanding, TransitionError,
    },
};
use serde_json::json;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn order_status_moves_one_step_at_a_time() {
    assert_eq!(
        OrderStatus::Pending.transition(OrderStatus::Processing),
        Ok(OrderStatus::Processing)
    );
    assert_eq!(
        OrderStatus::Accepted.transition(OrderStatus::Deliverying),
        Ok(OrderStatus::Deliverying)
    );
    assert!(OrderStatus::Pending.transition(OrderStatus::Accepted).is_err());
    assert!(OrderStatus::Processing.transition(OrderStatus::Completed).is_err());
    assert!(OrderStatus::Deliverying.transition(OrderStatus::Pending).is_err());
}

#[test]
fn any_open_order_can_be_cancelled_but_terminal_ones_cannot_move() {
    for open in [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Accepted,
        OrderStatus::Deliverying,
    ] {
        assert!(open.can_transition_to(OrderStatus::Cancelled), "{open}");
    }
    assert!(OrderStatus::Completed.is_terminal());
    assert!(OrderStatus::Cancelled.is_terminal());

    let err = OrderStatus::Cancelled
        .transition(OrderStatus::Processing)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot change order status from cancelled to processing"
    );
}

#[test]
fn revenue_excludes_pending_and_cancelled_orders() {
    let states = OrderStatus::revenue_states();
    assert!(!states.contains(&OrderStatus::Pending));
    assert!(!states.contains(&OrderStatus::Cancelled));
    assert!(states.contains(&OrderStatus::Completed));
}

#[test]
fn booking_cannot_complete_before_its_date() {
    let booking_date = day(2025, 6, 10);

    let early = BookingStatus::Confirmed.transition(BookingStatus::Completed, day(2025, 6, 9), booking_date);
    assert_eq!(early, Err(TransitionError::BeforeBookingDate { booking_date }));

    let same_day =
        BookingStatus::Confirmed.transition(BookingStatus::Completed, booking_date, booking_date);
    assert_eq!(same_day, Ok(BookingStatus::Completed));
}

#[test]
fn booking_must_be_confirmed_before_completion() {
    let today = day(2025, 6, 10);
    assert!(
        BookingStatus::Pending
            .transition(BookingStatus::Completed, today, today)
            .is_err()
    );
    assert_eq!(
        BookingStatus::Pending.transition(BookingStatus::Confirmed, today, day(2030, 1, 1)),
        Ok(BookingStatus::Confirmed)
    );
    assert!(
        BookingStatus::Cancelled
            .transition(BookingStatus::Confirmed, today, today)
            .is_err()
    );
}

#[test]
fn transition_errors_surface_as_bad_request() {
    let err: AppError = OrderStatus::Completed
        .transition(OrderStatus::Cancelled)
        .unwrap_err()
        .into();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[test]
fn cart_totals_sum_price_times_quantity() {
    let totals = CartTotals::compute([
        Line { price: 12_000_000, quantity: 1 },
        Line { price: 450_000, quantity: 3 },
    ]);
    assert_eq!(totals.total_price, 13_350_000);
    assert_eq!(totals.total_items, 4);

    assert_eq!(CartTotals::compute(Vec::new()), CartTotals::default());
}

#[test]
fn deposit_is_ten_percent_rounded() {
    assert_eq!(deposit_for(500_000), 50_000);
    assert_eq!(deposit_for(0), 0);
    assert_eq!(deposit_for(15), 2);
    assert_eq!(deposit_for(14), 1);
}

#[test]
fn generated_codes_fit_the_gateway_range() {
    for _ in 0..200 {
        let code = generate_code();
        assert!(code > 0);
        assert!(code <= MAX_CODE);
        assert!(code % 100_000_000 >= 10_000_000);
    }
}

#[test]
fn canonical_string_sorts_keys_and_blanks_nulls() {
    let data = json!({ "b": 2, "a": "x", "c": null, "d": "undefined" });
    let canonical = canonical_data_string(data.as_object().expect("object"));
    assert_eq!(canonical, "a=x&b=2&c=&d=");
}

#[test]
fn signature_is_hex_hmac_sha256() {
    let signature = sign_with_key("key", "The quick brown fox jumps over the lazy dog");
    assert_eq!(
        signature,
        "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
    );
}

#[test]
fn verified_webhook_reports_success_and_amount() {
    let body = common::signed_webhook(1234567890123, 50_000, "00");
    let verified = verify_webhook_with_key(common::CHECKSUM_KEY, &body).expect("valid signature");
    assert_eq!(verified.correlation_id, 1234567890123);
    assert_eq!(verified.amount, 50_000);
    assert!(verified.success);
    assert_eq!(verified.reference.as_deref(), Some("REF1234567890123"));

    let failed = common::signed_webhook(1234567890123, 50_000, "01");
    let verified = verify_webhook_with_key(common::CHECKSUM_KEY, &failed).expect("valid signature");
    assert!(!verified.success);
}

#[test]
fn tampered_webhook_is_rejected() {
    let mut body = common::signed_webhook(42, 50_000, "00");
    body["data"]["amount"] = json!(1);
    assert!(verify_webhook_with_key(common::CHECKSUM_KEY, &body).is_none());

    let body = common::signed_webhook(42, 50_000, "00");
    assert!(verify_webhook_with_key("another-key", &body).is_none());

    let mut body = common::signed_webhook(42, 50_000, "00");
    body.as_object_mut().expect("object").remove("signature");
    assert!(verify_webhook_with_key(common::CHECKSUM_KEY, &body).is_none());
}

#[test]
fn malformed_signature_is_rejected() {
    let mut body = common::signed_webhook(42, 50_000, "00");
    body["signature"] = json!("not-a-hex-digest");
    assert!(verify_webhook_with_key(common::CHECKSUM_KEY, &body).is_none());

    let mut body = common::signed_webhook(42, 50_000, "00");
    body["signature"] = json!("");
    assert!(verify_webhook_with_key(common::CHECKSUM_KEY, &body).is_none());

    // A valid digest prefix must not pass.
    let mut body = common::signed_webhook(42, 50_000, "00");
    let truncated = body["signature"].as_str().expect("signature")[..32].to_string();
    body["signature"] = json!(truncated);
    assert!(verify_webhook_with_key(common::CHECKSUM_KEY, &body).is_none());

    let mut body = common::signed_webhook(42, 50_000, "00");
    let upper = body["signature"].as_str().expect("signature").to_uppercase();
    body["signature"] = json!(upper);
    assert!(verify_webhook_with_key(common::CHECKSUM_KEY, &body).is_some());
}

#[test]
fn shop_standing_gates_products_and_services() {
    let operational = ShopStanding::derive(ApprovalStatus::Approved, true, true);
    assert_eq!(operational, ShopStanding::Operational);
    assert!(operational.can_list_products());
    assert!(operational.can_offer_services());

    let awaiting = ShopStanding::derive(ApprovalStatus::Approved, true, false);
    assert_eq!(awaiting, ShopStanding::AwaitingPackage);
    assert!(!awaiting.can_list_products());
    assert!(awaiting.can_offer_services());

    let suspended = ShopStanding::derive(ApprovalStatus::Approved, false, true);
    assert_eq!(suspended, ShopStanding::Suspended);
    assert!(!suspended.can_offer_services());

    assert_eq!(
        ShopStanding::derive(ApprovalStatus::Pending, true, true),
        ShopStanding::PendingReview
    );
    assert_eq!(
        ShopStanding::derive(ApprovalStatus::Rejected, true, true),
        ShopStanding::Rejected
    );
}

#[test]
fn service_type_accepts_concrete_locations() {
    assert!(ServiceType::Both.accepts(ServiceType::Onsite));
    assert!(ServiceType::Both.accepts(ServiceType::Offsite));
    assert!(!ServiceType::Both.accepts(ServiceType::Both));
    assert!(ServiceType::Onsite.accepts(ServiceType::Onsite));
    assert!(!ServiceType::Onsite.accepts(ServiceType::Offsite));
}

#[test]
fn managers_may_only_touch_price_and_description() {
    assert!(disallowed_manager_fields(&json!({ "price": 10, "description": "x" })).is_empty());

    let mut extra = disallowed_manager_fields(&json!({ "price": 10, "stock": 3, "name": "y" }));
    extra.sort();
    assert_eq!(extra, vec!["name".to_string(), "stock".to_string()]);
}

#[test]
fn dashboard_window_covers_one_month() {
    let window = Window::resolve(Some(12), Some(2024)).expect("valid window");
    assert_eq!(window.start.date_naive(), day(2024, 12, 1));
    assert_eq!(window.end.date_naive(), day(2025, 1, 1));

    assert!(matches!(
        Window::resolve(Some(13), Some(2024)),
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        Window::resolve(Some(0), None),
        Err(AppError::BadRequest(_))
    ));
}

#[test]
fn pagination_clamps_and_never_overflows() {
    assert_eq!(Pagination::default().normalize(), (1, 20, 0));
    assert_eq!(
        Pagination { page: Some(3), per_page: Some(500) }.normalize(),
        (3, 100, 200)
    );
    assert_eq!(
        Pagination { page: Some(-4), per_page: Some(0) }.normalize(),
        (1, 1, 0)
    );

    let (page, per_page, offset) = Pagination {
        page: Some(i64::MAX),
        per_page: Some(20),
    }
    .normalize();
    assert_eq!(page, i64::MAX);
    assert_eq!(per_page, 20);
    assert_eq!(offset, i64::MAX);
}

#[test]
fn consultation_contact_details_are_checked() {
    assert!(validate_contact("Nguyen Van A", "0987654321", None).is_ok());
    assert!(validate_contact("An", "09876543210", Some("an@example.vn")).is_ok());

    assert!(validate_contact("A", "0987654321", None).is_err());
    assert!(validate_contact(&"x".repeat(101), "0987654321", None).is_err());
    assert!(validate_contact("Nguyen Van A", "098765432", None).is_err());
    assert!(validate_contact("Nguyen Van A", "098765432100", None).is_err());
    assert!(validate_contact("Nguyen Van A", "09876-4321", None).is_err());
    for email in ["plain", "a@b", "@example.com", "a b@example.com", "a@@example.com"] {
        assert!(
            validate_contact("Nguyen Van A", "0987654321", Some(email)).is_err(),
            "{email}"
        );
    }
}

#[test]
fn call_results_drive_consultation_status() {
    assert_eq!(
        ConsultationStatus::initial(ConsultationType::CallNow),
        ConsultationStatus::Pending
    );
    assert_eq!(
        ConsultationStatus::initial(ConsultationType::Schedule),
        ConsultationStatus::Scheduled
    );

    let scheduled = ConsultationStatus::Scheduled;
    assert_eq!(scheduled.after_call(CallResult::Success), ConsultationStatus::Completed);
    assert_eq!(
        scheduled.after_call(CallResult::Rescheduled),
        ConsultationStatus::PendingReschedule
    );
    assert_eq!(scheduled.after_call(CallResult::Rejected), ConsultationStatus::Cancelled);
    assert_eq!(scheduled.after_call(CallResult::NoAnswer), scheduled);
    assert!(ConsultationStatus::Completed.is_closed());
    assert!(!ConsultationStatus::PendingReschedule.is_closed());
}

#[test]
fn consultation_status_filter_splits_on_commas() {
    assert!(parse_status_filter(None).expect("no filter").is_empty());
    assert_eq!(
        parse_status_filter(Some("scheduled, pending_reschedule,")).expect("filter"),
        vec![ConsultationStatus::Scheduled, ConsultationStatus::PendingReschedule]
    );
    assert!(matches!(
        parse_status_filter(Some("scheduled,archived")),
        Err(AppError::BadRequest(_))
    ));
}
