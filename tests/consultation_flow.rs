mod common;

use chrono::{Duration, Utc};
use lensmart_api::{
    dto::consultations::{
        CreateConsultationRequest, RecordCallRequest, RescheduleConsultationRequest,
    },
    error::AppError,
    routes::params::ConsultationQuery,
    services::consultation_service,
    status::{CallResult, ConsultationStatus, ConsultationType, Role},
};

fn callback(name: &str, kind: ConsultationType) -> CreateConsultationRequest {
    CreateConsultationRequest {
        customer_name: name.to_string(),
        phone_number: "0987654321".into(),
        email: Some(" Buyer@Example.com ".into()),
        consultation_type: kind,
        preferred_time: None,
        notes: Some("Interested in a security camera kit".into()),
    }
}

#[tokio::test]
async fn callback_requests_enter_the_queue() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;
    let staff = common::create_account(state, "desk", Role::Staff).await?;
    let customer = common::create_account(state, "buyer", Role::Customer).await?;

    let now_request = consultation_service::create_request(
        state,
        callback("Nguyen Van A", ConsultationType::CallNow),
    )
    .await?
    .data
    .expect("request");
    assert_eq!(now_request.status, ConsultationStatus::Pending);
    assert_eq!(now_request.email.as_deref(), Some("buyer@example.com"));
    assert!(now_request.call_history.is_empty());

    let missing_time = consultation_service::create_request(
        state,
        callback("Tran Thi B", ConsultationType::Schedule),
    )
    .await
    .unwrap_err();
    assert!(matches!(missing_time, AppError::BadRequest(_)));

    let slot = Utc::now() + Duration::days(2);
    let mut scheduled = callback("Tran Thi B", ConsultationType::Schedule);
    scheduled.preferred_time = Some(slot);
    let scheduled = consultation_service::create_request(state, scheduled)
        .await?
        .data
        .expect("request");
    assert_eq!(scheduled.status, ConsultationStatus::Scheduled);
    assert_eq!(scheduled.preferred_time.timestamp(), slot.timestamp());

    let mut bad_phone = callback("Le Van C", ConsultationType::CallNow);
    bad_phone.phone_number = "12345".into();
    assert!(consultation_service::create_request(state, bad_phone).await.is_err());

    let denied = consultation_service::list_requests(state, &customer, ConsultationQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(denied, AppError::Forbidden(_)));

    let all = consultation_service::list_requests(state, &staff, ConsultationQuery::default())
        .await?;
    let items = all.data.expect("list").items;
    assert_eq!(items.len(), 2);
    // Latest preferred time first.
    assert_eq!(items[0].id, scheduled.id);
    assert_eq!(items[1].id, now_request.id);

    let filtered = consultation_service::list_requests(
        state,
        &staff,
        ConsultationQuery {
            status: Some("scheduled,pending_reschedule".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("list")
    .items;
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, scheduled.id);
    Ok(())
}

#[tokio::test]
async fn call_outcomes_are_logged_and_move_the_request() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;
    let state = &harness.state;
    let manager = common::create_account(state, "manager", Role::Manager).await?;
    let shop = common::create_account(state, "lens-shop", Role::Shop).await?;

    let request = consultation_service::create_request(
        state,
        callback("Pham Thi D", ConsultationType::CallNow),
    )
    .await?
    .data
    .expect("request");

    let outsider = consultation_service::record_call(
        state,
        &shop,
        request.id,
        RecordCallRequest { result: CallResult::Success, notes: None },
    )
    .await
    .unwrap_err();
    assert!(matches!(outsider, AppError::Forbidden(_)));

    let missed = consultation_service::record_call(
        state,
        &manager,
        request.id,
        RecordCallRequest { result: CallResult::NoAnswer, notes: None },
    )
    .await?
    .data
    .expect("request");
    assert_eq!(missed.status, ConsultationStatus::Pending);
    assert_eq!(missed.call_history.len(), 1);

    let asked = consultation_service::record_call(
        state,
        &manager,
        request.id,
        RecordCallRequest {
            result: CallResult::Rescheduled,
            notes: Some("Customer asked for tomorrow".into()),
        },
    )
    .await?
    .data
    .expect("request");
    assert_eq!(asked.status, ConsultationStatus::PendingReschedule);

    let slot = Utc::now() + Duration::days(1);
    let moved = consultation_service::reschedule(
        state,
        &manager,
        request.id,
        RescheduleConsultationRequest { preferred_time: slot, notes: None },
    )
    .await?
    .data
    .expect("request");
    assert_eq!(moved.status, ConsultationStatus::Scheduled);
    assert_eq!(moved.preferred_time.timestamp(), slot.timestamp());
    assert_eq!(moved.call_history.len(), 3);
    let last = moved.call_history.last().expect("call");
    assert_eq!(last.result, CallResult::Rescheduled);
    assert_eq!(last.caller_id, Some(manager.user_id));
    assert_eq!(last.caller_name, "manager");

    let done = consultation_service::record_call(
        state,
        &manager,
        request.id,
        RecordCallRequest { result: CallResult::Success, notes: Some("Quoted two kits".into()) },
    )
    .await?
    .data
    .expect("request");
    assert_eq!(done.status, ConsultationStatus::Completed);

    let closed = consultation_service::record_call(
        state,
        &manager,
        request.id,
        RecordCallRequest { result: CallResult::Rescheduled, notes: None },
    )
    .await
    .unwrap_err();
    assert!(matches!(closed, AppError::BadRequest(_)));

    let stored = consultation_service::get_request(state, &manager, request.id)
        .await?
        .data
        .expect("request");
    assert_eq!(stored.status, ConsultationStatus::Completed);
    assert_eq!(stored.call_history.len(), 4);
    Ok(())
}
