use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Shop subscription purchase. Shops always pay the configured package price;
/// `amount` is honoured only when an admin opens the link.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePackagePaymentRequest {
    pub shop_id: Option<Uuid>,
    pub amount: Option<i64>,
    pub description: Option<String>,
}

/// Query string the gateway appends to return and cancel URLs.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReturnQuery {
    pub order_code: Option<i64>,
    pub code: Option<String>,
    pub status: Option<String>,
    pub cancel: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Applied,
    Duplicate,
    Pending,
    /// The correlation id matches no payment link, e.g. a gateway test ping.
    Ignored,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub outcome: ReconcileOutcome,
}
