pub use sea_orm_migration::prelude::*;

mod m20260105_000001_create_user_table;
mod m20260105_000002_create_incident_table;
mod m20260105_000003_create_incident_assignment_table;
mod m20260105_000004_create_incident_status_history_table;
mod m20260105_000005_create_incident_image_table;
mod m20260105_000006_normalize_legacy_values;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260105_000001_create_user_table::Migration),
            Box::new(m20260105_000002_create_incident_table::Migration),
            Box::new(m20260105_000003_create_incident_assignment_table::Migration),
            Box::new(m20260105_000004_create_incident_status_history_table::Migration),
            Box::new(m20260105_000005_create_incident_image_table::Migration),
            Box::new(m20260105_000006_normalize_legacy_values::Migration),
        ]
    }
}
