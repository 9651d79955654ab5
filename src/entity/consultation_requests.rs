use sea_orm::entity::prelude::*;

use crate::status::{ConsultationStatus, ConsultationType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "consultation_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub consultation_type: ConsultationType,
    pub preferred_time: DateTimeWithTimeZone,
    pub status: ConsultationStatus,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::consultation_calls::Entity")]
    ConsultationCalls,
}

impl Related<super::consultation_calls::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsultationCalls.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
