use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "combo_products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub combo_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: Uuid,
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::combos::Entity",
        from = "Column::ComboId",
        to = "super::combos::Column::Id"
    )]
    Combos,
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id"
    )]
    Products,
}

impl Related<super::combos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Combos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
