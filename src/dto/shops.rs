use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Account, Shop};

/// Creates the shop's login account and the shop in one step.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterShopRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
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
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShopRegistration {
    pub account: Account,
    pub shop: Shop,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RejectShopRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetShopActiveRequest {
    pub is_active: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ShopList {
    #[schema(value_type = Vec<Shop>)]
    pub items: Vec<Shop>,
}
