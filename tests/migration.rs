use helpdesk::entity::incident::{Entity as IncidentEntity, IncidentStatus};
use helpdesk::entity::user::{Entity as UserEntity, Role};
use helpdesk::migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbBackend, EntityTrait, Statement};

const STAMP: &str = "2024-05-01T08:00:00+00:00";

#[tokio::test]
async fn legacy_role_and_status_names_are_rewritten() {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();

    // schema only, as an older deployment would have it
    Migrator::up(&db, Some(5)).await.unwrap();

    for sql in [
        format!(
            "INSERT INTO users (id, name, email, role, is_active, created_at, updated_at) \
             VALUES (1, 'Chloe', 'chloe@helpdesk.test', 'CHEF_SERVICE', 1, '{STAMP}', '{STAMP}')"
        ),
        format!(
            "INSERT INTO users (id, name, email, role, is_active, created_at, updated_at) \
             VALUES (2, 'Marc', 'marc@helpdesk.test', 'MAINTENANCIER', 1, '{STAMP}', '{STAMP}')"
        ),
        format!(
            "INSERT INTO incidents (id, reference, title, description, type, priority, status, author_id, created_at, updated_at) \
             VALUES (1, 'INC-2024-0001', 'Old ticket', 'Fixed last spring', 'NETWORK', 'LOW', 'RESOLVED', 1, '{STAMP}', '{STAMP}')"
        ),
    ] {
        db.execute(Statement::from_string(DbBackend::Sqlite, sql)).await.unwrap();
    }

    Migrator::up(&db, None).await.unwrap();

    let chloe = UserEntity::find_by_id(1).one(&db).await.unwrap().unwrap();
    assert_eq!(chloe.role, Role::Supervisor);
    let marc = UserEntity::find_by_id(2).one(&db).await.unwrap().unwrap();
    assert_eq!(marc.role, Role::Technician);

    let incident = IncidentEntity::find_by_id(1).one(&db).await.unwrap().unwrap();
    assert_eq!(incident.status, IncidentStatus::PendingValidation);
}
