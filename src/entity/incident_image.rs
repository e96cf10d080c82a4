use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use crate::model::incident::ImageDescriptor;

/// Metadata of a picture kept by the external file store.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incident_images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub incident_id: i32,
    pub file_name: String,
    pub storage_path: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
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
}

impl Related<super::incident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incident.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn from_descriptor(incident_id: i32, descriptor: &ImageDescriptor, now: DateTime<Utc>) -> Self {
        Self {
            incident_id: Set(incident_id),
            file_name: Set(descriptor.file_name.clone()),
            storage_path: Set(descriptor.storage_path.clone()),
            mime_type: Set(descriptor.mime_type.clone()),
            size_bytes: Set(descriptor.size_bytes),
            created_at: Set(now),
            ..Default::default()
        }
    }
}
