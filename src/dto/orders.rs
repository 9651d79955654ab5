use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::Order,
    status::{OrderStatus, PaymentMethod},
};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CustomerInfoInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Orders are built from the caller's cart unless `combo_id` is given.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub combo_id: Option<Uuid>,
    pub pickup_time: DateTime<Utc>,
    pub note: Option<String>,
    #[serde(default)]
    pub customer_info: CustomerInfoInput,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}
