use sea_orm::entity::prelude::*;

use crate::status::{ServiceAvailability, ServiceType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub duration: Option<i32>,
    #[sea_orm(column_type = "JsonBinary")]
    pub images: Json,
    pub service_type: ServiceType,
    pub availability: ServiceAvailability,
    pub max_bookings: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub working_hours: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub requirements: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub includes: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub excludes: Json,
    pub notes: Option<String>,
    pub rating: f64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shops::Entity",
        from = "Column::ShopId",
        to = "super::shops::Column::Id"
    )]
    Shops,
}

impl Related<super::shops::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shops.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
