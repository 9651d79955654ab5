use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{models::Product, status::AvailabilityType};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub brand_id: Option<Uuid>,
    #[serde(default)]
    pub categories: Vec<Uuid>,
    pub origin: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
    pub model: String,
    pub camera_type: Option<String>,
    pub sensor_type: Option<String>,
    pub megapixels: Option<f64>,
    pub lens_mount: Option<String>,
    pub video_resolution: Option<String>,
    #[serde(default)]
    pub connectivity: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub weight: Option<f64>,
    pub dimensions: Option<String>,
    pub usage_instructions: Option<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    pub warnings: Option<String>,
    pub availability_type: Option<AvailabilityType>,
    pub pre_order_delivery_time: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub brand_id: Option<Uuid>,
    pub categories: Option<Vec<Uuid>>,
    pub origin: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub images: Option<Vec<String>>,
    pub model: Option<String>,
    pub camera_type: Option<String>,
    pub sensor_type: Option<String>,
    pub megapixels: Option<f64>,
    pub lens_mount: Option<String>,
    pub video_resolution: Option<String>,
    pub connectivity: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub weight: Option<f64>,
    pub dimensions: Option<String>,
    pub usage_instructions: Option<String>,
    pub certifications: Option<Vec<String>>,
    pub warnings: Option<String>,
    pub availability_type: Option<AvailabilityType>,
    pub pre_order_delivery_time: Option<String>,
}

/// Fields a manager may change on a product.
pub const MANAGER_EDITABLE_FIELDS: [&str; 2] = ["price", "description"];

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
