use sea_orm::entity::prelude::*;

use crate::status::AvailabilityType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub brand_id: Option<Uuid>,
    pub shop_id: Option<Uuid>,
    pub origin: Option<String>,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub images: Json,
    pub model: String,
    pub camera_type: Option<String>,
    pub sensor_type: Option<String>,
    pub megapixels: Option<f64>,
    pub lens_mount: Option<String>,
    pub video_resolution: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub connectivity: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub features: Json,
    pub weight: Option<f64>,
    pub dimensions: Option<String>,
    pub usage_instructions: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub certifications: Json,
    pub warnings: Option<String>,
    pub rating: f64,
    pub availability_type: AvailabilityType,
    pub pre_order_delivery_time: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::brands::Entity",
        from = "Column::BrandId",
        to = "super::brands::Column::Id"
    )]
    Brands,
    #[sea_orm(
        belongs_to = "super::shops::Entity",
        from = "Column::ShopId",
        to = "super::shops::Column::Id"
    )]
    Shops,
}

impl Related<super::brands::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brands.def()
    }
}

impl Related<super::product_types::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_categories::Relation::ProductTypes.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_categories::Relation::Products.def().rev())
    }
}

impl Related<super::combos::Entity> for Entity {
    fn to() -> RelationDef {
        super::combo_products::Relation::Combos.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::combo_products::Relation::Products.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
