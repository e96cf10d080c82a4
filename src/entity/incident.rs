use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incidents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub reference: String,  // INC-2026-0001
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_name = "type")]
    pub incident_type: IncidentType,
    pub priority: IncidentPriority,
    pub status: IncidentStatus,
    pub author_id: i32,
    pub location: Option<String>,
    pub equipment: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    #[sea_orm(column_type = "Text", nullable)]
    pub resolution_report: Option<String>,
    pub satisfaction_note: Option<i32>,  // 1..=10
    #[sea_orm(column_type = "Text", nullable)]
    pub closure_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentType {
    #[sea_orm(string_value = "NETWORK")]
    Network,

    #[sea_orm(string_value = "SOFTWARE")]
    Software,

    #[sea_orm(string_value = "HARDWARE")]
    Hardware,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentPriority {
    #[sea_orm(string_value = "LOW")]
    Low,

    #[sea_orm(string_value = "MEDIUM")]
    Medium,

    #[sea_orm(string_value = "HIGH")]
    High,

    #[sea_orm(string_value = "CRITICAL")]
    Critical,
}

/// Incident lifecycle status.
///
/// There is a single "awaiting validation" value. Older data carried a separate
/// `RESOLVED` value that nothing ever transitioned into; it is folded into
/// `PendingValidation` by the normalization migration and accepted as an alias
/// on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    #[sea_orm(string_value = "OPEN")]
    Open,

    #[sea_orm(string_value = "ASSIGNED")]
    Assigned,

    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,

    #[sea_orm(string_value = "PENDING_VALIDATION")]
    #[serde(alias = "RESOLVED")]
    PendingValidation,

    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "OPEN",
            IncidentStatus::Assigned => "ASSIGNED",
            IncidentStatus::InProgress => "IN_PROGRESS",
            IncidentStatus::PendingValidation => "PENDING_VALIDATION",
            IncidentStatus::Closed => "CLOSED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, IncidentStatus::Closed)
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,

    #[sea_orm(has_many = "super::incident_assignment::Entity")]
    Assignments,

    #[sea_orm(has_many = "super::incident_status_history::Entity")]
    StatusHistory,

    #[sea_orm(has_many = "super::incident_image::Entity")]
    Images,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::incident_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl Related<super::incident_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl Related<super::incident_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        // created_at may be supplied by the caller: the reference year is derived from it.
        let now = Utc::now();
        if insert {
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }
            if let ActiveValue::Set(created_at) = &self.created_at {
                self.updated_at = Set(*created_at);
            }
        } else {
            self.updated_at = Set(now);
        }
        Ok(self)
    }
}
