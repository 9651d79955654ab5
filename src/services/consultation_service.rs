use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::consultations::{
        ConsultationList, CreateConsultationRequest, RecordCallRequest,
        RescheduleConsultationRequest,
    },
    entity::{
        ConsultationCalls, ConsultationRequests,
        consultation_calls::{
            ActiveModel as CallActive, Column as CallCol, Model as CallModel,
        },
        consultation_requests::{
            ActiveModel as RequestActive, Column as RequestCol, Model as RequestModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_any_role},
    models::{ConsultationCall, ConsultationRequest},
    response::{ApiResponse, Meta},
    routes::params::ConsultationQuery,
    services::now,
    state::AppState,
    status::{CallResult, ConsultationStatus, ConsultationType, Role},
};

/// Roles that work the consultation queue.
const CALL_DESK: [Role; 3] = [Role::Admin, Role::Manager, Role::Staff];

/// Checks the contact details of a callback request: a 2 to 100 character
/// name, a 10 or 11 digit phone number and, when given, a plausible email.
pub fn validate_contact(name: &str, phone: &str, email: Option<&str>) -> AppResult<()> {
    let name_len = name.trim().chars().count();
    if !(2..=100).contains(&name_len) {
        return Err(AppError::BadRequest(
            "customer_name must be between 2 and 100 characters".into(),
        ));
    }
    if !(10..=11).contains(&phone.len()) || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest(
            "phone_number must be 10 or 11 digits".into(),
        ));
    }
    if let Some(email) = email {
        if !plausible_email(email) {
            return Err(AppError::BadRequest("email is not valid".into()));
        }
    }
    Ok(())
}

fn plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

/// Parses `status=a,b`; unknown names are rejected rather than ignored.
pub fn parse_status_filter(raw: Option<&str>) -> AppResult<Vec<ConsultationStatus>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            ConsultationStatus::parse(s)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown consultation status: {s}")))
        })
        .collect()
}

fn call_from_entity(model: CallModel) -> ConsultationCall {
    ConsultationCall {
        id: model.id,
        call_time: model.call_time.with_timezone(&Utc),
        result: model.result,
        notes: model.notes,
        caller_id: model.caller_id,
        caller_name: model.caller_name,
    }
}

fn request_from_entity(model: RequestModel, calls: Vec<CallModel>) -> ConsultationRequest {
    ConsultationRequest {
        id: model.id,
        customer_name: model.customer_name,
        phone_number: model.phone_number,
        email: model.email,
        consultation_type: model.consultation_type,
        preferred_time: model.preferred_time.with_timezone(&Utc),
        status: model.status,
        notes: model.notes,
        call_history: calls.into_iter().map(call_from_entity).collect(),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

async fn with_calls<C: ConnectionTrait>(
    conn: &C,
    models: Vec<RequestModel>,
) -> AppResult<Vec<ConsultationRequest>> {
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut map: HashMap<Uuid, Vec<CallModel>> = HashMap::new();
    if !ids.is_empty() {
        for call in ConsultationCalls::find()
            .filter(CallCol::RequestId.is_in(ids))
            .order_by_asc(CallCol::CallTime)
            .all(conn)
            .await?
        {
            map.entry(call.request_id).or_default().push(call);
        }
    }
    Ok(models
        .into_iter()
        .map(|m| {
            let calls = map.remove(&m.id).unwrap_or_default();
            request_from_entity(m, calls)
        })
        .collect())
}

async fn one_with_calls<C: ConnectionTrait>(
    conn: &C,
    model: RequestModel,
) -> AppResult<ConsultationRequest> {
    with_calls(conn, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Consultation request"))
}

async fn find_request<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<RequestModel> {
    ConsultationRequests::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Consultation request"))
}

async fn log_call<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
    caller: &AuthUser,
    result: CallResult,
    notes: Option<String>,
) -> AppResult<()> {
    CallActive {
        id: Set(Uuid::new_v4()),
        request_id: Set(request_id),
        call_time: Set(now()),
        result: Set(result),
        notes: Set(notes),
        caller_id: Set(Some(caller.user_id)),
        caller_name: Set(caller.username.clone()),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(())
}

pub async fn create_request(
    state: &AppState,
    payload: CreateConsultationRequest,
) -> AppResult<ApiResponse<ConsultationRequest>> {
    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let phone = payload.phone_number.trim().to_string();
    validate_contact(&payload.customer_name, &phone, email.as_deref())?;

    let preferred_time = match payload.consultation_type {
        ConsultationType::CallNow => now(),
        ConsultationType::Schedule => payload
            .preferred_time
            .ok_or_else(|| {
                AppError::BadRequest("preferred_time is required for scheduled consultations".into())
            })?
            .fixed_offset(),
    };

    let request = RequestActive {
        id: Set(Uuid::new_v4()),
        customer_name: Set(payload.customer_name.trim().to_string()),
        phone_number: Set(phone),
        email: Set(email),
        consultation_type: Set(payload.consultation_type),
        preferred_time: Set(preferred_time),
        status: Set(ConsultationStatus::initial(payload.consultation_type)),
        notes: Set(payload.notes),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(
        request_id = %request.id,
        kind = ?request.consultation_type,
        "consultation_requested"
    );

    Ok(ApiResponse::success(
        "Consultation request created",
        request_from_entity(request, Vec::new()),
        None,
    ))
}

/// Staff queue, latest preferred time first.
pub async fn list_requests(
    state: &AppState,
    user: &AuthUser,
    query: ConsultationQuery,
) -> AppResult<ApiResponse<ConsultationList>> {
    ensure_any_role(user, &CALL_DESK)?;
    let statuses = parse_status_filter(query.status.as_deref())?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = ConsultationRequests::find().order_by_desc(RequestCol::PreferredTime);
    if !statuses.is_empty() {
        finder = finder.filter(RequestCol::Status.is_in(statuses));
    }
    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_calls(&state.orm, models).await?;

    Ok(ApiResponse::success(
        "Ok",
        ConsultationList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_request(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ConsultationRequest>> {
    ensure_any_role(user, &CALL_DESK)?;
    let model = find_request(&state.orm, id).await?;
    Ok(ApiResponse::success(
        "Ok",
        one_with_calls(&state.orm, model).await?,
        None,
    ))
}

/// Moves the request to a new slot and logs the call that arranged it.
pub async fn reschedule(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RescheduleConsultationRequest,
) -> AppResult<ApiResponse<ConsultationRequest>> {
    ensure_any_role(user, &CALL_DESK)?;

    let txn = state.orm.begin().await?;
    let request = find_request(&txn, id).await?;
    if request.status.is_closed() {
        return Err(AppError::BadRequest(format!(
            "Consultation request is already {}",
            request.status
        )));
    }

    log_call(&txn, id, user, CallResult::Rescheduled, payload.notes).await?;
    let mut active: RequestActive = request.into();
    active.preferred_time = Set(payload.preferred_time.fixed_offset());
    active.status = Set(ConsultationStatus::Scheduled);
    active.updated_at = Set(now());
    let updated = active.update(&txn).await?;
    let request = one_with_calls(&txn, updated).await?;
    txn.commit().await?;

    tracing::info!(request_id = %id, preferred_time = %request.preferred_time, "consultation_rescheduled");
    Ok(ApiResponse::success("Consultation rescheduled", request, None))
}

/// Logs a call outcome and moves the request accordingly.
pub async fn record_call(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RecordCallRequest,
) -> AppResult<ApiResponse<ConsultationRequest>> {
    ensure_any_role(user, &CALL_DESK)?;

    let txn = state.orm.begin().await?;
    let request = find_request(&txn, id).await?;
    if request.status.is_closed() {
        return Err(AppError::BadRequest(format!(
            "Consultation request is already {}",
            request.status
        )));
    }

    let from = request.status;
    let next = from.after_call(payload.result);
    log_call(&txn, id, user, payload.result, payload.notes).await?;
    let mut active: RequestActive = request.into();
    active.status = Set(next);
    active.updated_at = Set(now());
    let updated = active.update(&txn).await?;
    let request = one_with_calls(&txn, updated).await?;
    txn.commit().await?;

    tracing::info!(request_id = %id, result = ?payload.result, from = %from, to = %next, "consultation_call_logged");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "consultation_call",
        "consultation_requests",
        serde_json::json!({ "request_id": id, "from": from.as_str(), "to": next.as_str() }),
    )
    .await;

    Ok(ApiResponse::success("Call result recorded", request, None))
}
