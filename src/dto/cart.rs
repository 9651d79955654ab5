use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

/// Omitting `selected` flips the current value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SelectCartItemRequest {
    pub selected: Option<bool>,
}
