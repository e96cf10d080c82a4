use sea_orm::Schema;
use sea_orm_migration::prelude::*;
use crate::entity::incident_assignment::{Column, Entity};

const ACTIVE_INDEX: &str = "idx_incident_assignments_incident_active";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());
        manager
            .create_table(
                schema
                    .create_table_from_entity(Entity)
                    .if_not_exists()
                    .to_owned()
            )
            .await?;

        // every transition looks up the active assignment of one incident
        manager
            .create_index(
                Index::create()
                    .name(ACTIVE_INDEX)
                    .table(Entity)
                    .col(Column::IncidentId)
                    .col(Column::IsActive)
                    .if_not_exists()
                    .to_owned()
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Entity).to_owned())
            .await
    }
}
