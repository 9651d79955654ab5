use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::status::{
    ApprovalStatus, AvailabilityType, BookingPaymentStatus, BookingStatus, CallResult, ComboType,
    ConsultationStatus, ConsultationType, OrderStatus, PaymentLinkStatus, PaymentMethod,
    PaymentPurpose, PaymentStatus, Role, ServiceAvailability, ServiceType, ShopStanding,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub role: Role,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Shop {
    pub id: Uuid,
    pub account_id: Uuid,
    pub shop_name: String,
    pub shop_address: String,
    pub shop_description: Option<String>,
    pub shop_logo_url: Option<String>,
    pub business_license_number: Option<String>,
    pub tax_id: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_name: Option<String>,
    pub approval_status: ApprovalStatus,
    pub rejection_reason: Option<String>,
    pub is_active: bool,
    pub has_active_package: bool,
    pub standing: ShopStanding,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductType {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub brand_id: Option<Uuid>,
    pub shop_id: Option<Uuid>,
    pub categories: Vec<Uuid>,
    pub origin: Option<String>,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub images: Vec<String>,
    pub model: String,
    pub camera_type: Option<String>,
    pub sensor_type: Option<String>,
    pub megapixels: Option<f64>,
    pub lens_mount: Option<String>,
    pub video_resolution: Option<String>,
    pub connectivity: Vec<String>,
    pub features: Vec<String>,
    pub weight: Option<f64>,
    pub dimensions: Option<String>,
    pub usage_instructions: Option<String>,
    pub certifications: Vec<String>,
    pub warnings: Option<String>,
    pub rating: f64,
    pub availability_type: AvailabilityType,
    pub pre_order_delivery_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComboProduct {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Combo {
    pub id: Uuid,
    pub name: String,
    pub area: String,
    pub description: Option<String>,
    pub price: i64,
    pub combo_type: ComboType,
    pub created_by: Option<Uuid>,
    pub products: Vec<ComboProduct>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price: i64,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Option<Uuid>,
    pub customer_id: Uuid,
    pub items: Vec<CartItem>,
    pub total_price: i64,
    pub total_items: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerInfo {
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderPayment {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_time: Option<DateTime<Utc>>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_code: i64,
    pub customer_id: Uuid,
    pub combo_id: Option<Uuid>,
    pub items: Vec<OrderItem>,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub customer_info: CustomerInfo,
    pub pickup_time: DateTime<Utc>,
    pub note: Option<String>,
    pub payment: OrderPayment,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Service {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub duration: Option<i32>,
    pub images: Vec<String>,
    pub categories: Vec<Uuid>,
    pub service_type: ServiceType,
    pub availability: ServiceAvailability,
    pub max_bookings: i32,
    #[schema(value_type = Object)]
    pub working_hours: Value,
    pub requirements: Vec<String>,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub notes: Option<String>,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub service_id: Uuid,
    pub shop_id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub service_type: ServiceType,
    pub address: String,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub payment_status: BookingPaymentStatus,
    pub total_amount: i64,
    pub deposit_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceReview {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub shop_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentCheckout {
    pub correlation_id: i64,
    pub purpose: PaymentPurpose,
    pub target_id: Uuid,
    pub amount: i64,
    pub status: PaymentLinkStatus,
    pub checkout_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsultationCall {
    pub id: Uuid,
    pub call_time: DateTime<Utc>,
    pub result: CallResult,
    pub notes: Option<String>,
    pub caller_id: Option<Uuid>,
    pub caller_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsultationRequest {
    pub id: Uuid,
    pub customer_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub consultation_type: ConsultationType,
    pub preferred_time: DateTime<Utc>,
    pub status: ConsultationStatus,
    pub notes: Option<String>,
    /// Oldest call first.
    pub call_history: Vec<ConsultationCall>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reads a JSON array column as a list of strings, skipping anything else.
pub fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
