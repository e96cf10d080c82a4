use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use super::incident::IncidentStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incident_status_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub incident_id: i32,
    pub previous_status: Option<IncidentStatus>,  // None only for the creation entry
    pub new_status: IncidentStatus,
    pub changed_by_id: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::incident::Entity",
        from = "Column::IncidentId",
        to = "super::incident::Column::Id",
        on_delete = "Cascade"
    )]
    Incident,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ChangedById",
        to = "super::user::Column::Id"
    )]
    ChangedBy,
}

impl Related<super::incident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incident.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChangedBy.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        if insert && self.created_at.is_not_set() {
            self.created_at = Set(Utc::now());
        }
        Ok(self)
    }
}

impl ActiveModel {
    pub fn entry(
        incident_id: i32,
        previous_status: Option<IncidentStatus>,
        new_status: IncidentStatus,
        changed_by_id: i32,
        comment: String,
    ) -> Self {
        Self {
            incident_id: Set(incident_id),
            previous_status: Set(previous_status),
            new_status: Set(new_status),
            changed_by_id: Set(changed_by_id),
            comment: Set(Some(comment)),
            ..Default::default()
        }
    }
}
