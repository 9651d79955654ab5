use sea_orm::entity::prelude::*;

use crate::status::{PaymentLinkStatus, PaymentPurpose};

/// One gateway payment request. `correlation_id` is the order code sent to the
/// gateway and the only key callbacks are resolved by.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub correlation_id: i64,
    pub purpose: PaymentPurpose,
    pub target_id: Uuid,
    pub amount: i64,
    pub description: String,
    pub status: PaymentLinkStatus,
    pub checkout_url: Option<String>,
    pub gateway_link_id: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
