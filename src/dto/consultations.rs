use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::ConsultationRequest,
    status::{CallResult, ConsultationType},
};

/// Public callback request. `preferred_time` is required for scheduled
/// consultations and ignored for call-now ones.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateConsultationRequest {
    pub customer_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub consultation_type: ConsultationType,
    pub preferred_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RescheduleConsultationRequest {
    pub preferred_time: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordCallRequest {
    pub result: CallResult,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ConsultationList {
    #[schema(value_type = Vec<ConsultationRequest>)]
    pub items: Vec<ConsultationRequest>,
}
