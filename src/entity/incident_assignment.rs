use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only: rows are deactivated on reassignment, never removed except
/// together with their incident.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incident_assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub incident_id: i32,
    pub technician_id: i32,
    pub assigned_by_id: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub instructions: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub taken_charge_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    #[sea_orm(column_type = "Text", nullable)]
    pub intervention_report: Option<String>,
    pub is_active: bool,
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
        from = "Column::TechnicianId",
        to = "super::user::Column::Id"
    )]
    Technician,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AssignedById",
        to = "super::user::Column::Id"
    )]
    AssignedBy,
}

impl Related<super::incident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incident.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
