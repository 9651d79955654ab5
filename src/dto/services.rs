use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{Booking, Service, ServiceReview},
    status::{BookingStatus, ServiceAvailability, ServiceType},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateServiceRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub duration: Option<i32>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub categories: Vec<Uuid>,
    pub service_type: Option<ServiceType>,
    pub availability: Option<ServiceAvailability>,
    pub max_bookings: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub working_hours: Option<Value>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub duration: Option<i32>,
    pub images: Option<Vec<String>>,
    pub categories: Option<Vec<Uuid>>,
    pub service_type: Option<ServiceType>,
    pub availability: Option<ServiceAvailability>,
    pub max_bookings: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub working_hours: Option<Value>,
    pub requirements: Option<Vec<String>>,
    pub includes: Option<Vec<String>>,
    pub excludes: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ServiceList {
    #[schema(value_type = Vec<Service>)]
    pub items: Vec<Service>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    pub service_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub service_type: ServiceType,
    pub address: String,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookingPaymentRequest {
    pub booking_id: Uuid,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct BookingList {
    #[schema(value_type = Vec<Booking>)]
    pub items: Vec<Booking>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ReviewList {
    #[schema(value_type = Vec<ServiceReview>)]
    pub items: Vec<ServiceReview>,
}
