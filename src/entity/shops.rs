use sea_orm::entity::prelude::*;

use crate::status::{ApprovalStatus, ShopStanding};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shops")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
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
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn standing(&self) -> ShopStanding {
        ShopStanding::derive(self.approval_status, self.is_active, self.has_active_package)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
    #[sea_orm(has_many = "super::services::Entity")]
    Services,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::services::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Services.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
