//! Gateway payment links and their reconciliation.
//!
//! Every link is stored in `payment_links` under the numeric code sent to the
//! gateway. Webhooks and return redirects resolve their target through that
//! code only, and each processed notification is recorded in `payment_events`
//! so a repeated delivery is acknowledged without side effects.

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        payments::{CreatePackagePaymentRequest, PaymentReturnQuery, ReconcileOutcome, WebhookAck},
        services::BookingPaymentRequest,
    },
    entity::{
        Bookings, Orders, PaymentEvents, PaymentLinks, Shops,
        bookings::Column as BookingCol,
        orders::Column as OrderCol,
        payment_events::{ActiveModel as PaymentEventActive, Column as PaymentEventCol},
        payment_links::{
            ActiveModel as PaymentLinkActive, Column as PaymentLinkCol, Model as PaymentLinkModel,
        },
        shops::Column as ShopCol,
    },
    error::{AppError, AppResult},
    gateway::{CreatePaymentLink, RemotePaymentState},
    middleware::auth::{AuthUser, ensure_self_or_admin},
    models::PaymentCheckout,
    response::ApiResponse,
    services::{
        booking_service::find_booking,
        insert_with_code, now,
        order_service::find_order,
        service_listing_service::find_service,
        shop_service::{find_shop, shop_of_account},
    },
    state::AppState,
    status::{
        ApprovalStatus, BookingPaymentStatus, BookingStatus, OrderStatus, PaymentLinkStatus,
        PaymentMethod, PaymentPurpose, PaymentStatus, Role,
    },
};

/// What to ask the gateway for.
struct LinkRequest {
    purpose: PaymentPurpose,
    target_id: Uuid,
    amount: i64,
    /// The correlation id is appended to this.
    description_prefix: &'static str,
    item_name: String,
    buyer_name: Option<String>,
    buyer_email: Option<String>,
    buyer_phone: Option<String>,
    created_by: Option<Uuid>,
}

/// A gateway verdict on one payment link.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub correlation_id: i64,
    pub paid: bool,
    /// Amount the gateway reports, checked against the link when present.
    pub amount: Option<i64>,
    pub reference: Option<String>,
    pub payload: Value,
}

fn return_path(purpose: PaymentPurpose) -> &'static str {
    match purpose {
        PaymentPurpose::Order => "/api/orders/payment/return",
        PaymentPurpose::Booking => "/api/bookings/payment/return",
        PaymentPurpose::ShopPackage => "/api/payments/payos/return",
    }
}

fn checkout_from_link(link: &PaymentLinkModel) -> PaymentCheckout {
    PaymentCheckout {
        correlation_id: link.correlation_id,
        purpose: link.purpose,
        target_id: link.target_id,
        amount: link.amount,
        status: link.status,
        checkout_url: link.checkout_url.clone().unwrap_or_default(),
    }
}

async fn set_link_status<C: ConnectionTrait>(
    conn: &C,
    link_id: Uuid,
    status: PaymentLinkStatus,
) -> AppResult<()> {
    PaymentLinks::update_many()
        .col_expr(PaymentLinkCol::Status, Expr::value(status))
        .col_expr(PaymentLinkCol::UpdatedAt, Expr::value(now()))
        .filter(PaymentLinkCol::Id.eq(link_id))
        .filter(PaymentLinkCol::Status.eq(PaymentLinkStatus::Pending))
        .exec(conn)
        .await?;
    Ok(())
}

/// Records the link, then asks the gateway for a checkout URL. A rejected
/// request leaves the link marked failed.
async fn open_link(state: &AppState, req: LinkRequest) -> AppResult<PaymentCheckout> {
    if req.amount <= 0 {
        return Err(AppError::BadRequest("Payment amount must be positive".into()));
    }

    let txn = state.orm.begin().await?;
    let link = insert_with_code(&txn, |code| PaymentLinkActive {
        id: Set(Uuid::new_v4()),
        correlation_id: Set(code),
        purpose: Set(req.purpose),
        target_id: Set(req.target_id),
        amount: Set(req.amount),
        description: Set(format!("{} {code}", req.description_prefix)),
        status: Set(PaymentLinkStatus::Pending),
        checkout_url: Set(None),
        gateway_link_id: Set(None),
        created_by: Set(req.created_by),
        created_at: NotSet,
        updated_at: NotSet,
    })
    .await?;
    txn.commit().await?;

    let return_url = format!("{}{}", state.config.public_api_url, return_path(req.purpose));
    let request = CreatePaymentLink {
        correlation_id: link.correlation_id,
        amount: link.amount,
        description: link.description.clone(),
        item_name: req.item_name,
        buyer_name: req.buyer_name,
        buyer_email: req.buyer_email,
        buyer_phone: req.buyer_phone,
        return_url: return_url.clone(),
        cancel_url: return_url,
        expired_at: Utc::now().timestamp() + state.config.payment_link_ttl_secs,
    };

    let remote = match state.gateway.create_payment_link(&request).await {
        Ok(remote) => remote,
        Err(err) => {
            tracing::error!(
                correlation_id = link.correlation_id,
                error = %err,
                "payment link creation failed"
            );
            set_link_status(&state.orm, link.id, PaymentLinkStatus::Failed).await?;
            return Err(err.into());
        }
    };

    let mut active: PaymentLinkActive = link.into();
    active.checkout_url = Set(Some(remote.checkout_url));
    active.gateway_link_id = Set(Some(remote.payment_link_id).filter(|id| !id.is_empty()));
    active.updated_at = Set(now());
    let link = active.update(&state.orm).await?;

    tracing::info!(
        correlation_id = link.correlation_id,
        purpose = ?link.purpose,
        target_id = %link.target_id,
        "payment_link_opened"
    );
    Ok(checkout_from_link(&link))
}

pub async fn create_order_payment(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<PaymentCheckout>> {
    let order = find_order(&state.orm, order_id).await?;
    ensure_self_or_admin(user, order.customer_id)?;
    if order.status != OrderStatus::Pending {
        return Err(AppError::BadRequest(format!(
            "Cannot pay for an order that is {}",
            order.status
        )));
    }
    if order.payment_status == PaymentStatus::Completed {
        return Err(AppError::BadRequest("Order is already paid".into()));
    }

    let result = open_link(
        state,
        LinkRequest {
            purpose: PaymentPurpose::Order,
            target_id: order.id,
            amount: order.total_amount,
            description_prefix: "Order",
            item_name: format!("Order {}", order.order_code),
            buyer_name: Some(order.customer_username.clone()),
            buyer_email: Some(order.customer_email.clone()),
            buyer_phone: order.customer_phone.clone(),
            created_by: Some(user.user_id),
        },
    )
    .await;

    match result {
        Ok(checkout) => {
            Orders::update_many()
                .col_expr(OrderCol::PaymentMethod, Expr::value(PaymentMethod::Payos))
                .col_expr(OrderCol::UpdatedAt, Expr::value(now()))
                .filter(OrderCol::Id.eq(order.id))
                .exec(&state.orm)
                .await?;
            Ok(ApiResponse::success("Payment link created", checkout, None))
        }
        Err(err @ AppError::Gateway(_)) => {
            Orders::update_many()
                .col_expr(OrderCol::PaymentStatus, Expr::value(PaymentStatus::Failed))
                .col_expr(OrderCol::UpdatedAt, Expr::value(now()))
                .filter(OrderCol::Id.eq(order.id))
                .filter(OrderCol::PaymentStatus.ne(PaymentStatus::Completed))
                .exec(&state.orm)
                .await?;
            Err(err)
        }
        Err(err) => Err(err),
    }
}

pub async fn create_booking_payment(
    state: &AppState,
    payload: BookingPaymentRequest,
) -> AppResult<ApiResponse<PaymentCheckout>> {
    let booking = find_booking(&state.orm, payload.booking_id).await?;
    if booking.payment_status == BookingPaymentStatus::Paid {
        return Err(AppError::BadRequest("Booking deposit is already paid".into()));
    }
    if booking.status.is_terminal() {
        return Err(AppError::BadRequest(format!(
            "Cannot pay for a booking that is {}",
            booking.status
        )));
    }
    let service = find_service(&state.orm, booking.service_id).await?;

    let checkout = open_link(
        state,
        LinkRequest {
            purpose: PaymentPurpose::Booking,
            target_id: booking.id,
            amount: booking.deposit_amount,
            description_prefix: "Deposit",
            item_name: format!("Deposit - {}", service.name),
            buyer_name: Some(booking.customer_name.clone()),
            buyer_email: Some(booking.customer_email.clone()),
            buyer_phone: Some(booking.customer_phone.clone()),
            created_by: booking.user_id,
        },
    )
    .await?;

    Ok(ApiResponse::success(
        "Deposit payment link created",
        checkout,
        None,
    ))
}

pub async fn create_package_payment(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePackagePaymentRequest,
) -> AppResult<ApiResponse<PaymentCheckout>> {
    let shop = match (user.role, payload.shop_id) {
        (Role::Admin, Some(shop_id)) => find_shop(&state.orm, shop_id).await?,
        (Role::Shop, requested) => {
            let shop = shop_of_account(&state.orm, user.user_id)
                .await?
                .ok_or_else(|| AppError::not_found("Shop"))?;
            if requested.is_some_and(|id| id != shop.id) {
                return Err(AppError::forbidden());
            }
            shop
        }
        (Role::Admin, None) => {
            return Err(AppError::BadRequest("shop_id is required".into()));
        }
        _ => return Err(AppError::forbidden()),
    };

    if shop.approval_status != ApprovalStatus::Approved {
        return Err(AppError::BadRequest(
            "Shop must be approved before purchasing a package".into(),
        ));
    }
    if shop.has_active_package {
        return Err(AppError::BadRequest("Shop already has an active package".into()));
    }

    // Only admins may price a package; shops always pay the configured price.
    let amount = match (user.role, payload.amount) {
        (Role::Admin, Some(amount)) if amount > 0 => amount,
        (Role::Admin, Some(_)) => {
            return Err(AppError::BadRequest("amount must be positive".into()));
        }
        (_, requested) => {
            if requested.is_some() {
                tracing::debug!(shop_id = %shop.id, "ignoring client supplied package amount");
            }
            state.config.shop_package_price
        }
    };

    let checkout = open_link(
        state,
        LinkRequest {
            purpose: PaymentPurpose::ShopPackage,
            target_id: shop.id,
            amount,
            description_prefix: "Package",
            item_name: payload
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| "Shop package".to_string()),
            buyer_name: Some(user.username.clone()),
            buyer_email: Some(user.email.clone()),
            buyer_phone: shop.contact_phone.clone(),
            created_by: Some(user.user_id),
        },
    )
    .await?;

    Ok(ApiResponse::success(
        "Package payment link created",
        checkout,
        None,
    ))
}

/// Claims the (correlation id, outcome) pair. False when it was already processed.
async fn claim_event(txn: &DatabaseTransaction, settlement: &Settlement) -> AppResult<bool> {
    let outcome = if settlement.paid { "paid" } else { "failed" };
    let inserted = PaymentEvents::insert(PaymentEventActive {
        id: Set(Uuid::new_v4()),
        correlation_id: Set(settlement.correlation_id),
        outcome: Set(outcome.to_string()),
        transaction_ref: Set(settlement.reference.clone()),
        payload: Set(settlement.payload.clone()),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::columns([PaymentEventCol::CorrelationId, PaymentEventCol::Outcome])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(txn)
    .await?;
    Ok(inserted > 0)
}

async fn apply_paid(
    txn: &DatabaseTransaction,
    link: &PaymentLinkModel,
    settlement: &Settlement,
) -> AppResult<()> {
    let stamp = now();
    match link.purpose {
        PaymentPurpose::Order => {
            Orders::update_many()
                .col_expr(OrderCol::PaymentStatus, Expr::value(PaymentStatus::Completed))
                .col_expr(OrderCol::PaymentMethod, Expr::value(PaymentMethod::Payos))
                .col_expr(OrderCol::TransactionId, Expr::value(settlement.reference.clone()))
                .col_expr(OrderCol::PaymentTime, Expr::value(Some(stamp)))
                .col_expr(OrderCol::PaymentDetails, Expr::value(settlement.payload.clone()))
                .col_expr(OrderCol::UpdatedAt, Expr::value(stamp))
                .filter(OrderCol::Id.eq(link.target_id))
                .filter(OrderCol::PaymentStatus.ne(PaymentStatus::Completed))
                .exec(txn)
                .await?;
            // Only a pending order moves; anything further along is left alone.
            Orders::update_many()
                .col_expr(OrderCol::Status, Expr::value(OrderStatus::Processing))
                .col_expr(OrderCol::UpdatedAt, Expr::value(stamp))
                .filter(OrderCol::Id.eq(link.target_id))
                .filter(OrderCol::Status.eq(OrderStatus::Pending))
                .exec(txn)
                .await?;
        }
        PaymentPurpose::Booking => {
            Bookings::update_many()
                .col_expr(BookingCol::PaymentStatus, Expr::value(BookingPaymentStatus::Paid))
                .col_expr(BookingCol::UpdatedAt, Expr::value(stamp))
                .filter(BookingCol::Id.eq(link.target_id))
                .filter(BookingCol::PaymentStatus.ne(BookingPaymentStatus::Paid))
                .exec(txn)
                .await?;
            let confirmed = Bookings::update_many()
                .col_expr(BookingCol::Status, Expr::value(BookingStatus::Confirmed))
                .col_expr(BookingCol::UpdatedAt, Expr::value(stamp))
                .filter(BookingCol::Id.eq(link.target_id))
                .filter(BookingCol::Status.eq(BookingStatus::Pending))
                .exec(txn)
                .await?;
            if confirmed.rows_affected > 0 {
                tracing::info!(booking_id = %link.target_id, "booking_confirmed");
            }
        }
        PaymentPurpose::ShopPackage => {
            let activated = Shops::update_many()
                .col_expr(ShopCol::HasActivePackage, Expr::value(true))
                .col_expr(ShopCol::UpdatedAt, Expr::value(stamp))
                .filter(ShopCol::Id.eq(link.target_id))
                .filter(ShopCol::HasActivePackage.eq(false))
                .exec(txn)
                .await?;
            if activated.rows_affected > 0 {
                tracing::info!(shop_id = %link.target_id, "shop_package_activated");
            }
        }
    }
    PaymentLinks::update_many()
        .col_expr(PaymentLinkCol::Status, Expr::value(PaymentLinkStatus::Paid))
        .col_expr(PaymentLinkCol::UpdatedAt, Expr::value(stamp))
        .filter(PaymentLinkCol::Id.eq(link.id))
        .filter(PaymentLinkCol::Status.ne(PaymentLinkStatus::Paid))
        .exec(txn)
        .await?;
    Ok(())
}

async fn apply_failed(txn: &DatabaseTransaction, link: &PaymentLinkModel) -> AppResult<()> {
    let stamp = now();
    match link.purpose {
        PaymentPurpose::Order => {
            Orders::update_many()
                .col_expr(OrderCol::PaymentStatus, Expr::value(PaymentStatus::Failed))
                .col_expr(OrderCol::UpdatedAt, Expr::value(stamp))
                .filter(OrderCol::Id.eq(link.target_id))
                .filter(OrderCol::PaymentStatus.eq(PaymentStatus::Pending))
                .exec(txn)
                .await?;
        }
        PaymentPurpose::Booking => {
            Bookings::update_many()
                .col_expr(BookingCol::PaymentStatus, Expr::value(BookingPaymentStatus::Failed))
                .col_expr(BookingCol::UpdatedAt, Expr::value(stamp))
                .filter(BookingCol::Id.eq(link.target_id))
                .filter(BookingCol::PaymentStatus.eq(BookingPaymentStatus::Pending))
                .exec(txn)
                .await?;
        }
        PaymentPurpose::ShopPackage => {}
    }
    set_link_status(txn, link.id, PaymentLinkStatus::Failed).await
}

/// Applies a gateway verdict exactly once per (correlation id, outcome).
pub async fn reconcile(state: &AppState, settlement: Settlement) -> AppResult<ReconcileOutcome> {
    let txn = state.orm.begin().await?;
    let Some(link) = PaymentLinks::find()
        .filter(PaymentLinkCol::CorrelationId.eq(settlement.correlation_id))
        .one(&txn)
        .await?
    else {
        tracing::warn!(
            correlation_id = settlement.correlation_id,
            "notification for unknown payment link"
        );
        return Ok(ReconcileOutcome::Ignored);
    };

    if settlement.paid && settlement.amount.is_some_and(|a| a != link.amount) {
        tracing::warn!(
            correlation_id = link.correlation_id,
            expected = link.amount,
            reported = ?settlement.amount,
            "paid amount does not match payment link"
        );
        return Err(AppError::BadRequest("Paid amount does not match".into()));
    }

    if !claim_event(&txn, &settlement).await? {
        txn.commit().await?;
        tracing::info!(correlation_id = link.correlation_id, "duplicate payment notification");
        return Ok(ReconcileOutcome::Duplicate);
    }

    if settlement.paid {
        apply_paid(&txn, &link, &settlement).await?;
    } else {
        apply_failed(&txn, &link).await?;
    }
    txn.commit().await?;

    tracing::info!(
        correlation_id = link.correlation_id,
        purpose = ?link.purpose,
        target_id = %link.target_id,
        paid = settlement.paid,
        "payment_reconciled"
    );
    audit::record(
        &state.pool,
        None,
        if settlement.paid { "payment_paid" } else { "payment_failed" },
        "payment_links",
        serde_json::json!({
            "correlation_id": link.correlation_id,
            "target_id": link.target_id,
            "reference": settlement.reference,
        }),
    )
    .await;

    Ok(ReconcileOutcome::Applied)
}

/// Verifies the gateway signature before anything in the body is trusted.
pub async fn handle_webhook(state: &AppState, body: Value) -> AppResult<ApiResponse<WebhookAck>> {
    let Some(verified) = state.gateway.verify_webhook(&body) else {
        tracing::warn!("rejected webhook with invalid signature");
        return Err(AppError::BadRequest("Invalid webhook signature".into()));
    };

    let outcome = reconcile(
        state,
        Settlement {
            correlation_id: verified.correlation_id,
            paid: verified.success,
            amount: Some(verified.amount),
            reference: verified.reference,
            payload: verified.payload,
        },
    )
    .await?;

    Ok(ApiResponse::success(
        "Webhook processed",
        WebhookAck { outcome },
        None,
    ))
}

/// Asks the gateway for the authoritative status of the link and reconciles it.
async fn settle_from_gateway(state: &AppState, correlation_id: i64) -> AppResult<PaymentLinkModel> {
    let link = PaymentLinks::find()
        .filter(PaymentLinkCol::CorrelationId.eq(correlation_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Payment"))?;

    if link.status == PaymentLinkStatus::Pending {
        let report = state.gateway.get_payment_status(correlation_id).await?;
        let paid = match report.state {
            RemotePaymentState::Paid => Some(true),
            RemotePaymentState::Failed => Some(false),
            RemotePaymentState::Pending => None,
        };
        if let Some(paid) = paid {
            reconcile(
                state,
                Settlement {
                    correlation_id,
                    paid,
                    amount: None,
                    reference: report.reference,
                    payload: report.payload,
                },
            )
            .await?;
        }
    }

    PaymentLinks::find_by_id(link.id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Payment"))
}

fn result_page(purpose: Option<PaymentPurpose>) -> &'static str {
    match purpose {
        Some(PaymentPurpose::Order) => "/order-payment-success",
        Some(PaymentPurpose::Booking) => "/booking-payment-success",
        Some(PaymentPurpose::ShopPackage) | None => "/payment-success",
    }
}

/// Frontend URL the browser is sent to after the gateway checkout page.
/// Query parameters are only used to find the link; success comes from the gateway.
pub async fn handle_return(state: &AppState, query: PaymentReturnQuery) -> String {
    let frontend = &state.config.frontend_url;
    let Some(correlation_id) = query.order_code else {
        return format!("{frontend}{}?success=false&error=MissingOrderCode", result_page(None));
    };

    match settle_from_gateway(state, correlation_id).await {
        Ok(link) => {
            let success = link.status == PaymentLinkStatus::Paid;
            let target = match link.purpose {
                PaymentPurpose::Order => "orderId",
                PaymentPurpose::Booking => "bookingId",
                PaymentPurpose::ShopPackage => "shopId",
            };
            format!(
                "{frontend}{}?success={success}&{target}={}",
                result_page(Some(link.purpose)),
                link.target_id
            )
        }
        Err(err) => {
            tracing::warn!(correlation_id, error = %err, "payment return could not be settled");
            format!("{frontend}{}?success=false&orderCode={correlation_id}", result_page(None))
        }
    }
}
