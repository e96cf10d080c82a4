use sea_orm::{ConnectionTrait, DbBackend};
use sea_orm_migration::prelude::*;
use crate::entity::{incident, incident_status_history, user};

/// Older deployments stored French role names and a separate RESOLVED status.
const ROLE_RENAMES: &[(&str, &str)] = &[
    ("UTILISATEUR", "AGENT"),
    ("MAINTENANCIER", "TECHNICIAN"),
    ("TECHNICIEN", "TECHNICIAN"),
    ("CHEF_SERVICE", "SUPERVISOR"),
    ("SUPERVISEUR", "SUPERVISOR"),
];

const STATUS_RENAMES: &[(&str, &str)] = &[("RESOLVED", "PENDING_VALIDATION")];

#[derive(DeriveMigrationName)]
pub struct Migration;

async fn rename_values<T, C>(
    manager: &SchemaManager<'_>,
    table: T,
    column: C,
    renames: &[(&str, &str)],
) -> Result<(), DbErr>
where
    T: IntoTableRef + Clone + 'static,
    C: IntoIden + Clone + 'static,
{
    let backend: DbBackend = manager.get_database_backend();
    let db = manager.get_connection();

    for (legacy, canonical) in renames {
        let statement = Query::update()
            .table(table.clone())
            .value(column.clone(), *canonical)
            .and_where(Expr::col(column.clone()).eq(*legacy))
            .to_owned();
        db.execute(backend.build(&statement)).await?;
    }

    Ok(())
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        rename_values(manager, user::Entity, user::Column::Role, ROLE_RENAMES).await?;
        rename_values(manager, incident::Entity, incident::Column::Status, STATUS_RENAMES).await?;
        rename_values(
            manager,
            incident_status_history::Entity,
            incident_status_history::Column::NewStatus,
            STATUS_RENAMES,
        )
        .await?;
        rename_values(
            manager,
            incident_status_history::Entity,
            incident_status_history::Column::PreviousStatus,
            STATUS_RENAMES,
        )
        .await
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // the legacy spellings are not restored
        Ok(())
    }
}
