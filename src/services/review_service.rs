use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::services::{CreateReviewRequest, ReviewList, UpdateReviewRequest},
    entity::{
        ServiceReviews, Services,
        service_reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Model as ReviewModel},
        services::Column as ServiceCol,
    },
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::AuthUser,
    models::ServiceReview,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{
        booking_service::{booked_by, find_booking},
        now,
    },
    state::AppState,
    status::BookingStatus,
};

fn review_from_entity(model: ReviewModel) -> ServiceReview {
    ServiceReview {
        id: model.id,
        booking_id: model.booking_id,
        customer_id: model.customer_id,
        service_id: model.service_id,
        shop_id: model.shop_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn check_rating(rating: i32) -> AppResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::BadRequest("rating must be between 1 and 5".into()));
    }
    Ok(())
}

async fn find_review<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<ReviewModel> {
    ServiceReviews::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Review"))
}

/// Stores the mean review rating on the service.
async fn refresh_service_rating<C: ConnectionTrait>(conn: &C, service_id: Uuid) -> AppResult<()> {
    let average: f64 = ServiceReviews::find()
        .select_only()
        .column_as(Expr::cust("COALESCE(AVG(rating), 0)::float8"), "average")
        .filter(ReviewCol::ServiceId.eq(service_id))
        .into_tuple()
        .one(conn)
        .await?
        .unwrap_or(0.0);

    Services::update_many()
        .col_expr(ServiceCol::Rating, Expr::value(average))
        .filter(ServiceCol::Id.eq(service_id))
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    booking_id: Uuid,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<ServiceReview>> {
    check_rating(payload.rating)?;

    let txn = state.orm.begin().await?;
    let booking = find_booking(&txn, booking_id).await?;
    if !booked_by(&booking, user) {
        return Err(AppError::Forbidden(
            "Only the customer who booked can review this service".into(),
        ));
    }
    if booking.status != BookingStatus::Completed {
        return Err(AppError::BadRequest(
            "Only completed bookings can be reviewed".into(),
        ));
    }

    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking.id),
        customer_id: Set(user.user_id),
        service_id: Set(booking.service_id),
        shop_id: Set(booking.shop_id),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::BadRequest("This booking has already been reviewed".into())
        } else {
            err.into()
        }
    })?;
    refresh_service_rating(&txn, review.service_id).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "review_create",
        "service_reviews",
        serde_json::json!({ "review_id": review.id, "booking_id": booking_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review created",
        review_from_entity(review),
        None,
    ))
}

pub async fn list_by_service(
    state: &AppState,
    service_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = ServiceReviews::find()
        .filter(ReviewCol::ServiceId.eq(service_id))
        .order_by_desc(ReviewCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        ReviewList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_review(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ServiceReview>> {
    let review = find_review(&state.orm, id).await?;
    Ok(ApiResponse::success("Ok", review_from_entity(review), None))
}

pub async fn update_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateReviewRequest,
) -> AppResult<ApiResponse<ServiceReview>> {
    let txn = state.orm.begin().await?;
    let review = find_review(&txn, id).await?;
    if review.customer_id != user.user_id {
        return Err(AppError::Forbidden(
            "Only the author may edit this review".into(),
        ));
    }

    let mut active: ReviewActive = review.into();
    if let Some(rating) = payload.rating {
        check_rating(rating)?;
        active.rating = Set(rating);
    }
    if let Some(comment) = payload.comment {
        active.comment = Set(Some(comment));
    }
    active.updated_at = Set(now());
    let updated = active.update(&txn).await?;
    refresh_service_rating(&txn, updated.service_id).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Review updated",
        review_from_entity(updated),
        None,
    ))
}

pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    let review = find_review(&txn, id).await?;
    if review.customer_id != user.user_id && !user.is_admin() {
        return Err(AppError::forbidden());
    }

    ServiceReviews::delete_by_id(id).exec(&txn).await?;
    refresh_service_rating(&txn, review.service_id).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "review_delete",
        "service_reviews",
        serde_json::json!({ "review_id": id }),
    )
    .await;
    Ok(ApiResponse::message("Review deleted"))
}
