use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{Brand, Combo, ProductType},
    status::ComboType,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBrandRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBrandRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct BrandList {
    #[schema(value_type = Vec<Brand>)]
    pub items: Vec<Brand>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductTypeRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductTypeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductTypeList {
    #[schema(value_type = Vec<ProductType>)]
    pub items: Vec<ProductType>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateComboRequest {
    pub name: String,
    pub area: String,
    pub description: Option<String>,
    pub price: i64,
    pub combo_type: Option<ComboType>,
    pub products: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateComboRequest {
    pub name: Option<String>,
    pub area: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub combo_type: Option<ComboType>,
    pub products: Option<Vec<Uuid>>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ComboList {
    #[schema(value_type = Vec<Combo>)]
    pub items: Vec<Combo>,
}
