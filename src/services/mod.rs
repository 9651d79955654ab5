pub mod auth_service;
pub mod booking_service;
pub mod brand_service;
pub mod cart_service;
pub mod combo_service;
pub mod consultation_service;
pub mod dashboard_service;
pub mod order_service;
pub mod payment_service;
pub mod product_service;
pub mod product_type_service;
pub mod review_service;
pub mod service_listing_service;
pub mod shop_service;
pub mod user_service;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseTransaction, EntityTrait, IntoActiveModel,
    TransactionTrait,
};

use crate::{
    billing::generate_code,
    error::{AppError, AppResult, is_unique_violation},
};

const CODE_ATTEMPTS: usize = 5;

pub(crate) fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

/// Rejects blank required text fields.
pub(crate) fn require(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

/// Inserts a row keyed by a freshly generated numeric code, drawing a new code
/// when the unique index rejects one. Each attempt runs in its own savepoint so
/// a collision does not poison the outer transaction.
pub(crate) async fn insert_with_code<A, F>(
    txn: &DatabaseTransaction,
    build: F,
) -> AppResult<<A::Entity as EntityTrait>::Model>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    F: Fn(i64) -> A,
{
    for attempt in 1..=CODE_ATTEMPTS {
        let savepoint = txn.begin().await?;
        match build(generate_code()).insert(&savepoint).await {
            Ok(model) => {
                savepoint.commit().await?;
                return Ok(model);
            }
            Err(err) if is_unique_violation(&err) => {
                savepoint.rollback().await?;
                tracing::warn!(attempt, "generated code collided, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(AppError::Internal(anyhow::anyhow!(
        "could not allocate a unique code after {CODE_ATTEMPTS} attempts"
    )))
}
