use sea_orm::entity::prelude::*;

use crate::status::ComboType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "combos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub area: String,
    pub description: Option<String>,
    pub price: i64,
    pub combo_type: ComboType,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::combo_products::Entity")]
    ComboProducts,
}

impl Related<super::combo_products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ComboProducts.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        super::combo_products::Relation::Products.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::combo_products::Relation::Combos.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
