use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit,
    billing::deposit_for,
    dto::services::{BookingList, CreateBookingRequest, UpdateBookingStatusRequest},
    entity::{
        Bookings,
        bookings::{ActiveModel as BookingActive, Column as BookingCol, Model as BookingModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, MaybeAuthUser},
    models::Booking,
    response::{ApiResponse, Meta},
    routes::params::BookingQuery,
    services::{
        now, require,
        service_listing_service::find_service,
        shop_service::{find_shop, shop_of_account},
    },
    state::AppState,
    status::{BookingPaymentStatus, BookingStatus, Role, ServiceAvailability},
};

pub fn booking_from_entity(model: BookingModel) -> Booking {
    Booking {
        id: model.id,
        service_id: model.service_id,
        shop_id: model.shop_id,
        user_id: model.user_id,
        customer_name: model.customer_name,
        customer_phone: model.customer_phone,
        customer_email: model.customer_email,
        service_type: model.service_type,
        address: model.address,
        booking_date: model.booking_date,
        booking_time: model.booking_time,
        notes: model.notes,
        status: model.status,
        payment_status: model.payment_status,
        total_amount: model.total_amount,
        deposit_amount: model.deposit_amount,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub async fn find_booking<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<BookingModel> {
    Bookings::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Booking"))
}

/// How the caller relates to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Admin,
    OwningShop,
    Customer,
    None,
}

/// The caller made the booking, either signed in or under their account email.
pub(crate) fn booked_by(booking: &BookingModel, user: &AuthUser) -> bool {
    booking.user_id == Some(user.user_id) || booking.customer_email.eq_ignore_ascii_case(&user.email)
}

async fn access_to<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    booking: &BookingModel,
) -> AppResult<Access> {
    if user.is_admin() {
        return Ok(Access::Admin);
    }
    if user.role == Role::Shop {
        if let Some(shop) = shop_of_account(conn, user.user_id).await? {
            if shop.id == booking.shop_id {
                return Ok(Access::OwningShop);
            }
        }
    }
    Ok(if booked_by(booking, user) {
        Access::Customer
    } else {
        Access::None
    })
}

fn search_condition(search: &str) -> Condition {
    let pattern = format!("%{}%", search.trim().to_lowercase());
    Condition::any()
        .add(Expr::expr(Func::lower(Expr::col(BookingCol::CustomerName))).like(pattern.clone()))
        .add(Expr::expr(Func::lower(Expr::col(BookingCol::CustomerEmail))).like(pattern.clone()))
        .add(Expr::expr(Func::lower(Expr::col(BookingCol::CustomerPhone))).like(pattern))
}

async fn list_where(
    state: &AppState,
    condition: Condition,
    query: &BookingQuery,
) -> AppResult<ApiResponse<BookingList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = condition;
    if let Some(status) = query.status {
        condition = condition.add(BookingCol::Status.eq(status));
    }
    if let Some(payment_status) = query.payment_status {
        condition = condition.add(BookingCol::PaymentStatus.eq(payment_status));
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        condition = condition.add(search_condition(search));
    }

    let finder = Bookings::find()
        .filter(condition)
        .order_by_desc(BookingCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(booking_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        BookingList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_booking(
    state: &AppState,
    caller: MaybeAuthUser,
    payload: CreateBookingRequest,
) -> AppResult<ApiResponse<Booking>> {
    require(&payload.customer_name, "customer_name")?;
    require(&payload.customer_phone, "customer_phone")?;
    require(&payload.customer_email, "customer_email")?;
    require(&payload.address, "address")?;
    require(&payload.booking_time, "booking_time")?;

    let service = find_service(&state.orm, payload.service_id).await?;
    let shop = find_shop(&state.orm, service.shop_id).await?;

    if let Some(user) = caller.0.as_ref() {
        if user.role == Role::Shop && shop.account_id == user.user_id {
            return Err(AppError::Forbidden(
                "A shop cannot book its own service".into(),
            ));
        }
    }
    if service.availability != ServiceAvailability::Available {
        return Err(AppError::BadRequest("Service is not available".into()));
    }
    if !service.service_type.accepts(payload.service_type) {
        return Err(AppError::BadRequest(format!(
            "Service does not support {} bookings",
            payload.service_type.as_str()
        )));
    }

    let booking = BookingActive {
        id: Set(Uuid::new_v4()),
        service_id: Set(service.id),
        shop_id: Set(shop.id),
        user_id: Set(caller.0.as_ref().map(|u| u.user_id)),
        customer_name: Set(payload.customer_name.trim().to_string()),
        customer_phone: Set(payload.customer_phone.trim().to_string()),
        customer_email: Set(payload.customer_email.trim().to_lowercase()),
        service_type: Set(payload.service_type),
        address: Set(payload.address.trim().to_string()),
        booking_date: Set(payload.booking_date),
        booking_time: Set(payload.booking_time.trim().to_string()),
        notes: Set(payload.notes),
        status: Set(BookingStatus::Pending),
        payment_status: Set(BookingPaymentStatus::Pending),
        total_amount: Set(service.price),
        deposit_amount: Set(deposit_for(service.price)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(
        booking_id = %booking.id,
        service_id = %service.id,
        deposit = booking.deposit_amount,
        "booking_created"
    );

    Ok(ApiResponse::success(
        "Booking created, pay the 10% deposit to confirm it",
        booking_from_entity(booking),
        None,
    ))
}

pub async fn list_bookings(
    state: &AppState,
    user: &AuthUser,
    query: BookingQuery,
) -> AppResult<ApiResponse<BookingList>> {
    let condition = match user.role {
        Role::Admin => Condition::all(),
        Role::Shop => {
            let shop = shop_of_account(&state.orm, user.user_id)
                .await?
                .ok_or_else(|| AppError::Forbidden("No shop is linked to this account".into()))?;
            Condition::all().add(BookingCol::ShopId.eq(shop.id))
        }
        _ => return Err(AppError::forbidden()),
    };
    list_where(state, condition, &query).await
}

pub async fn list_by_customer_email(
    state: &AppState,
    user: &AuthUser,
    email: &str,
    query: BookingQuery,
) -> AppResult<ApiResponse<BookingList>> {
    let email = email.trim().to_lowercase();
    if !user.is_admin() && !user.email.eq_ignore_ascii_case(&email) {
        return Err(AppError::forbidden());
    }
    list_where(
        state,
        Condition::all().add(BookingCol::CustomerEmail.eq(email)),
        &query,
    )
    .await
}

pub async fn get_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    let booking = find_booking(&state.orm, id).await?;
    if access_to(&state.orm, user, &booking).await? == Access::None {
        return Err(AppError::forbidden());
    }
    Ok(ApiResponse::success("Ok", booking_from_entity(booking), None))
}

pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBookingStatusRequest,
) -> AppResult<ApiResponse<Booking>> {
    let txn = state.orm.begin().await?;
    let booking = Bookings::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Booking"))?;

    match access_to(&txn, user, &booking).await? {
        Access::Admin | Access::OwningShop => {}
        Access::Customer if payload.status == BookingStatus::Cancelled => {}
        Access::Customer => {
            return Err(AppError::Forbidden(
                "Customers may only cancel their bookings".into(),
            ));
        }
        Access::None => return Err(AppError::forbidden()),
    }

    let from = booking.status;
    let today = Utc::now().date_naive();
    let next = from.transition(payload.status, today, booking.booking_date)?;

    let mut active: BookingActive = booking.into();
    active.status = Set(next);
    active.updated_at = Set(now());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(booking_id = %id, from = %from, to = %next, "booking_status_changed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "booking_status",
        "bookings",
        serde_json::json!({ "booking_id": id, "from": from.as_str(), "to": next.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Booking status updated",
        booking_from_entity(updated),
        None,
    ))
}
