use sea_orm::entity::prelude::*;

use crate::status::CallResult;

/// One logged call against a consultation request.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "consultation_calls")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_id: Uuid,
    pub call_time: DateTimeWithTimeZone,
    pub result: CallResult,
    pub notes: Option<String>,
    pub caller_id: Option<Uuid>,
    pub caller_name: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::consultation_requests::Entity",
        from = "Column::RequestId",
        to = "super::consultation_requests::Column::Id"
    )]
    ConsultationRequests,
}

impl Related<super::consultation_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsultationRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
