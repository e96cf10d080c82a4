//! Applies lifecycle plans to the store.
//!
//! Every operation loads the incident and its active assignment inside one
//! transaction, asks [`lifecycle::plan`] for the transition row, then writes the
//! row's side effects, the new status and the history entry before committing.
//! A refused request rolls back without having written anything.

use std::collections::HashMap;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend,
    DbErr, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use tracing::{error, info, instrument, warn};
use crate::entity::incident::{self, Entity as IncidentEntity, IncidentStatus};
use crate::entity::incident_assignment::{self, Entity as AssignmentEntity};
use crate::entity::incident_image::{self, Entity as ImageEntity};
use crate::entity::incident_status_history::{self, Entity as HistoryEntity};
use crate::entity::user::Entity as UserEntity;
use crate::lifecycle::{self, capability, reference, Actor, IncidentFacts, ListScope, Operation, SideEffect};
use crate::model::common::{page_params, PaginationResponse};
use crate::model::global_error::{AppError, ErrorCode, ErrorKind};
use crate::model::incident::{
    AssignRequest, CreateIncidentRequest, IncidentDetailResponse, IncidentQuery, IncidentResponse,
    MyIncidentsQuery, RejectRequest, ResolveRequest, UpdateIncidentRequest, ValidateRequest,
};
use super::directory;

pub const MAX_REFERENCE_ATTEMPTS: u32 = 5;

/// An incident together with its active assignment, if any.
#[derive(Debug, Clone)]
pub struct IncidentView {
    pub incident: incident::Model,
    pub active_assignment: Option<incident_assignment::Model>,
}

impl From<IncidentView> for IncidentResponse {
    fn from(view: IncidentView) -> Self {
        IncidentResponse::new(view.incident, view.active_assignment)
    }
}

/// A request against an existing incident, carrying its payload.
#[derive(Debug, Clone)]
pub enum Command {
    Update(UpdateIncidentRequest),
    Delete,
    Assign(AssignRequest),
    TakeCharge,
    Resolve(ResolveRequest),
    Validate(ValidateRequest),
    Reject(RejectRequest),
}

impl Command {
    pub fn operation(&self) -> Operation {
        match self {
            Command::Update(_) => Operation::Update,
            Command::Delete => Operation::Delete,
            Command::Assign(_) => Operation::Assign,
            Command::TakeCharge => Operation::TakeCharge,
            Command::Resolve(_) => Operation::Resolve,
            Command::Validate(_) => Operation::Validate,
            Command::Reject(_) => Operation::Reject,
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        match self {
            Command::Update(request) => request.validate(),
            Command::Resolve(request) => request.validate(),
            Command::Validate(request) => request.validate(),
            Command::Reject(request) => request.validate(),
            Command::Delete | Command::Assign(_) | Command::TakeCharge => Ok(()),
        }
    }

    fn history_comment(&self, previous: IncidentStatus) -> String {
        match self {
            Command::Assign(request) if previous == IncidentStatus::Open => {
                format!("Assigned to technician #{}", request.technician_id)
            }
            Command::Assign(request) => format!("Reassigned to technician #{}", request.technician_id),
            Command::TakeCharge => "Taken in charge".to_string(),
            Command::Resolve(_) => "Resolved, awaiting validation".to_string(),
            Command::Validate(request) => format!("Closed by the author with a note of {}/10", request.note),
            Command::Reject(request) => format!("Resolution rejected: {}", request.reason.trim()),
            Command::Update(_) => "Incident updated".to_string(),
            Command::Delete => "Incident deleted".to_string(),
        }
    }
}

fn facts_of(incident: &incident::Model, active: Option<&incident_assignment::Model>) -> IncidentFacts {
    IncidentFacts {
        status: incident.status,
        author_id: incident.author_id,
        active_technician_id: active.map(|assignment| assignment.technician_id),
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn log_refusal(operation: Operation, err: &AppError) {
    match err.kind() {
        ErrorKind::Internal => error!(%operation, error = %err, "incident operation failed"),
        kind => warn!(%operation, ?kind, error = %err, "incident operation refused"),
    }
}

/// Picks the reference a new incident is stored under. Runs inside the
/// creation transaction; a reference that turns out to be taken makes the
/// insert fail with a unique violation and the creation is retried.
#[async_trait]
pub trait ReferenceAllocator: Send + Sync {
    async fn allocate(&self, txn: &DatabaseTransaction, year: i32) -> Result<String, DbErr>;
}

/// The sequence following the highest reference of the year.
pub struct NextInYear;

#[async_trait]
impl ReferenceAllocator for NextInYear {
    async fn allocate(&self, txn: &DatabaseTransaction, year: i32) -> Result<String, DbErr> {
        allocate_reference(txn, year).await
    }
}

pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    request: CreateIncidentRequest,
) -> Result<IncidentView, AppError> {
    create_at(db, actor, request, Utc::now()).await
}

/// Creates an incident stamped with `created_at`; the reference year is taken
/// from that instant.
pub async fn create_at(
    db: &DatabaseConnection,
    actor: &Actor,
    request: CreateIncidentRequest,
    created_at: DateTime<Utc>,
) -> Result<IncidentView, AppError> {
    create_with(db, actor, request, created_at, &NextInYear).await
}

#[instrument(skip(db, request, references), fields(actor_id = actor.id))]
pub async fn create_with(
    db: &DatabaseConnection,
    actor: &Actor,
    request: CreateIncidentRequest,
    created_at: DateTime<Utc>,
    references: &dyn ReferenceAllocator,
) -> Result<IncidentView, AppError> {
    if let Err(err) = request.validate() {
        log_refusal(Operation::Create, &err);
        return Err(err);
    }

    for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
        let txn = db.begin().await?;

        match insert_incident(&txn, actor, &request, created_at, references).await {
            Ok(incident) => {
                txn.commit().await?;
                info!(incident_id = incident.id, reference = %incident.reference, "incident created");
                return Ok(IncidentView { incident, active_assignment: None });
            }
            Err(err) if is_unique_violation(&err) => {
                txn.rollback().await.ok();
                warn!(attempt, "reference already taken, retrying");
            }
            Err(err) => {
                txn.rollback().await.ok();
                let err = AppError::from(err);
                log_refusal(Operation::Create, &err);
                return Err(err);
            }
        }
    }

    error!(attempts = MAX_REFERENCE_ATTEMPTS, "could not allocate an incident reference");
    Err(AppError::internal_error(ErrorCode::ReferenceAllocationFailed))
}

async fn insert_incident(
    txn: &DatabaseTransaction,
    actor: &Actor,
    request: &CreateIncidentRequest,
    created_at: DateTime<Utc>,
    references: &dyn ReferenceAllocator,
) -> Result<incident::Model, DbErr> {
    let transition = lifecycle::transition_for(Operation::Create);
    let status = transition.resulting_status(IncidentStatus::Open);

    let reference = references.allocate(txn, created_at.year()).await?;

    let new_incident = incident::ActiveModel {
        reference: Set(reference),
        title: Set(request.title.trim().to_string()),
        description: Set(request.description.clone()),
        incident_type: Set(request.incident_type),
        priority: Set(request.priority),
        status: Set(status),
        author_id: Set(actor.id),
        location: Set(request.location.clone()),
        equipment: Set(request.equipment.clone()),
        created_at: Set(created_at),
        ..Default::default()
    };
    let incident = new_incident.insert(txn).await?;

    for image in &request.images {
        incident_image::ActiveModel::from_descriptor(incident.id, image, created_at)
            .insert(txn)
            .await?;
    }

    if transition.has_effect(SideEffect::AppendHistory) {
        let mut entry = incident_status_history::ActiveModel::entry(
            incident.id,
            None,
            status,
            actor.id,
            "Incident created".to_string(),
        );
        entry.created_at = Set(created_at);
        entry.insert(txn).await?;
    }

    Ok(incident)
}

async fn allocate_reference<C: ConnectionTrait>(db: &C, year: i32) -> Result<String, DbErr> {
    let existing: Vec<String> = IncidentEntity::find()
        .select_only()
        .column(incident::Column::Reference)
        .filter(incident::Column::Reference.starts_with(reference::year_prefix(year)))
        .into_tuple()
        .all(db)
        .await?;

    let sequence = reference::next_sequence(existing.iter().map(String::as_str), year);
    Ok(reference::format_reference(year, sequence))
}

pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    incident_id: i32,
    request: UpdateIncidentRequest,
) -> Result<IncidentView, AppError> {
    expect_view(execute(db, actor, incident_id, Command::Update(request)).await?)
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, incident_id: i32) -> Result<(), AppError> {
    execute(db, actor, incident_id, Command::Delete).await?;
    Ok(())
}

pub async fn assign(
    db: &DatabaseConnection,
    actor: &Actor,
    incident_id: i32,
    request: AssignRequest,
) -> Result<IncidentView, AppError> {
    expect_view(execute(db, actor, incident_id, Command::Assign(request)).await?)
}

pub async fn take_charge(db: &DatabaseConnection, actor: &Actor, incident_id: i32) -> Result<IncidentView, AppError> {
    expect_view(execute(db, actor, incident_id, Command::TakeCharge).await?)
}

pub async fn resolve(
    db: &DatabaseConnection,
    actor: &Actor,
    incident_id: i32,
    request: ResolveRequest,
) -> Result<IncidentView, AppError> {
    expect_view(execute(db, actor, incident_id, Command::Resolve(request)).await?)
}

pub async fn validate(
    db: &DatabaseConnection,
    actor: &Actor,
    incident_id: i32,
    request: ValidateRequest,
) -> Result<IncidentView, AppError> {
    expect_view(execute(db, actor, incident_id, Command::Validate(request)).await?)
}

pub async fn reject(
    db: &DatabaseConnection,
    actor: &Actor,
    incident_id: i32,
    request: RejectRequest,
) -> Result<IncidentView, AppError> {
    expect_view(execute(db, actor, incident_id, Command::Reject(request)).await?)
}

fn expect_view(outcome: Option<IncidentView>) -> Result<IncidentView, AppError> {
    outcome.ok_or_else(|| AppError::with_detail(ErrorCode::InternalError, "incident was removed"))
}

/// Runs `command` in its own transaction. Returns `None` when the incident was
/// removed.
#[instrument(skip(db, command), fields(actor_id = actor.id, operation = %command.operation()))]
pub async fn execute(
    db: &DatabaseConnection,
    actor: &Actor,
    incident_id: i32,
    command: Command,
) -> Result<Option<IncidentView>, AppError> {
    let operation = command.operation();
    let txn = db.begin().await?;

    match execute_in(&txn, actor, incident_id, &command).await {
        Ok(outcome) => {
            txn.commit().await?;
            match &outcome {
                Some(view) => info!(status = %view.incident.status, "incident transition applied"),
                None => info!("incident deleted"),
            }
            Ok(outcome)
        }
        Err(err) => {
            txn.rollback().await.ok();
            log_refusal(operation, &err);
            Err(err)
        }
    }
}

async fn execute_in(
    txn: &DatabaseTransaction,
    actor: &Actor,
    incident_id: i32,
    command: &Command,
) -> Result<Option<IncidentView>, AppError> {
    let incident = lock_incident(txn, incident_id).await?;
    let mut active = find_active_assignment(txn, incident_id).await?;

    // Decide first; nothing below runs for a refused request.
    let transition = lifecycle::plan(command.operation(), actor, &facts_of(&incident, active.as_ref()))?;
    command.validate()?;
    if let Command::Assign(request) = command {
        directory::require_active_technician(txn, request.technician_id).await?;
    }

    let now = Utc::now();
    let previous = incident.status;
    let next = transition.resulting_status(previous);
    let mut changes: incident::ActiveModel = incident.clone().into();

    for effect in transition.effects {
        match (effect, command) {
            (SideEffect::ApplyFieldChanges, Command::Update(request)) => {
                apply_field_changes(&mut changes, request);
            }
            (SideEffect::CascadeDelete, Command::Delete) => {
                cascade_delete(txn, incident).await?;
                return Ok(None);
            }
            (SideEffect::DeactivateAssignments, _) => {
                AssignmentEntity::update_many()
                    .col_expr(incident_assignment::Column::IsActive, Expr::value(false))
                    .filter(incident_assignment::Column::IncidentId.eq(incident_id))
                    .filter(incident_assignment::Column::IsActive.eq(true))
                    .exec(txn)
                    .await?;
                active = None;
            }
            (SideEffect::CreateAssignment, Command::Assign(request)) => {
                let assignment = incident_assignment::ActiveModel {
                    incident_id: Set(incident_id),
                    technician_id: Set(request.technician_id),
                    assigned_by_id: Set(actor.id),
                    instructions: Set(request.instructions.clone()),
                    assigned_at: Set(now),
                    is_active: Set(true),
                    ..Default::default()
                };
                active = Some(assignment.insert(txn).await?);
            }
            (SideEffect::MarkTakenCharge, _) => {
                let assignment = touch_assignment(txn, active.take(), |assignment| {
                    assignment.taken_charge_at = Set(Some(now));
                })
                .await?;
                active = Some(assignment);
            }
            (SideEffect::MarkAssignmentResolved, Command::Resolve(request)) => {
                let assignment = touch_assignment(txn, active.take(), |assignment| {
                    assignment.resolved_at = Set(Some(now));
                    assignment.intervention_report = Set(Some(request.report.clone()));
                })
                .await?;
                active = Some(assignment);
            }
            (SideEffect::RecordResolution, Command::Resolve(request)) => {
                changes.resolved_at = Set(Some(now));
                changes.resolution_report = Set(Some(request.report.clone()));
            }
            (SideEffect::ClearResolution, _) => {
                changes.resolved_at = Set(None);
            }
            (SideEffect::RecordClosure, Command::Validate(request)) => {
                changes.closed_at = Set(Some(now));
                changes.satisfaction_note = Set(Some(request.note));
                changes.closure_comment = Set(request.comment.clone());
            }
            // written once the status change is in place
            (SideEffect::AppendHistory, _) => {}
            (effect, command) => {
                return Err(AppError::with_detail(
                    ErrorCode::InternalError,
                    format!("{:?} does not apply to {}", effect, command.operation()),
                ));
            }
        }
    }

    if transition.changes_status() {
        changes.status = Set(next);
    }
    let updated = changes.update(txn).await?;

    if transition.has_effect(SideEffect::AppendHistory) {
        incident_status_history::ActiveModel::entry(
            incident_id,
            Some(previous),
            next,
            actor.id,
            command.history_comment(previous),
        )
        .insert(txn)
        .await?;
    }

    Ok(Some(IncidentView { incident: updated, active_assignment: active }))
}

/// Loads the incident, holding a row lock where the backend supports one so
/// that concurrent transitions on the same incident serialize.
async fn lock_incident(txn: &DatabaseTransaction, incident_id: i32) -> Result<incident::Model, AppError> {
    let mut query = IncidentEntity::find_by_id(incident_id);
    if txn.get_database_backend() != DbBackend::Sqlite {
        query = query.lock_exclusive();
    }

    query
        .one(txn)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::IncidentNotFound))
}

async fn find_active_assignment<C: ConnectionTrait>(
    db: &C,
    incident_id: i32,
) -> Result<Option<incident_assignment::Model>, DbErr> {
    AssignmentEntity::find()
        .filter(incident_assignment::Column::IncidentId.eq(incident_id))
        .filter(incident_assignment::Column::IsActive.eq(true))
        .order_by_desc(incident_assignment::Column::Id)
        .one(db)
        .await
}

async fn touch_assignment(
    txn: &DatabaseTransaction,
    active: Option<incident_assignment::Model>,
    change: impl FnOnce(&mut incident_assignment::ActiveModel),
) -> Result<incident_assignment::Model, AppError> {
    let assignment = active.ok_or_else(|| {
        AppError::with_detail(ErrorCode::InvalidIncidentState, "the incident has no active assignment")
    })?;

    let mut assignment: incident_assignment::ActiveModel = assignment.into();
    change(&mut assignment);
    Ok(assignment.update(txn).await?)
}

fn apply_field_changes(changes: &mut incident::ActiveModel, request: &UpdateIncidentRequest) {
    if let Some(title) = &request.title {
        changes.title = Set(title.trim().to_string());
    }
    if let Some(description) = &request.description {
        changes.description = Set(description.clone());
    }
    if let Some(incident_type) = request.incident_type {
        changes.incident_type = Set(incident_type);
    }
    if let Some(priority) = request.priority {
        changes.priority = Set(priority);
    }
    if let Some(location) = &request.location {
        changes.location = Set(blank_as_none(location));
    }
    if let Some(equipment) = &request.equipment {
        changes.equipment = Set(blank_as_none(equipment));
    }
}

/// An empty value clears an optional column.
fn blank_as_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

async fn cascade_delete(txn: &DatabaseTransaction, incident: incident::Model) -> Result<(), DbErr> {
    HistoryEntity::delete_many()
        .filter(incident_status_history::Column::IncidentId.eq(incident.id))
        .exec(txn)
        .await?;
    ImageEntity::delete_many()
        .filter(incident_image::Column::IncidentId.eq(incident.id))
        .exec(txn)
        .await?;
    AssignmentEntity::delete_many()
        .filter(incident_assignment::Column::IncidentId.eq(incident.id))
        .exec(txn)
        .await?;
    incident.delete(txn).await?;
    Ok(())
}

#[instrument(skip(db), fields(actor_id = actor.id))]
pub async fn get_detail(
    db: &DatabaseConnection,
    actor: &Actor,
    incident_id: i32,
) -> Result<IncidentDetailResponse, AppError> {
    let incident = IncidentEntity::find_by_id(incident_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::IncidentNotFound))?;

    let assignments = incident
        .find_related(AssignmentEntity)
        .order_by_asc(incident_assignment::Column::AssignedAt)
        .order_by_asc(incident_assignment::Column::Id)
        .all(db)
        .await?;
    let active = assignments.iter().rev().find(|assignment| assignment.is_active).cloned();

    if !capability::can_view(actor, &facts_of(&incident, active.as_ref())) {
        return Err(AppError::forbidden(ErrorCode::NotEnoughPermission));
    }

    let author = incident.find_related(UserEntity).one(db).await?;
    let history = incident
        .find_related(HistoryEntity)
        .order_by_asc(incident_status_history::Column::CreatedAt)
        .order_by_asc(incident_status_history::Column::Id)
        .all(db)
        .await?;
    let images = incident
        .find_related(ImageEntity)
        .order_by_asc(incident_image::Column::Id)
        .all(db)
        .await?;

    Ok(IncidentDetailResponse {
        incident: IncidentResponse::new(incident, active),
        author: author.map(Into::into),
        assignments: assignments.into_iter().map(Into::into).collect(),
        history: history.into_iter().map(Into::into).collect(),
        images: images.into_iter().map(Into::into).collect(),
    })
}

/// Incidents visible to `actor`, newest first.
#[instrument(skip(db, query), fields(actor_id = actor.id))]
pub async fn list(
    db: &DatabaseConnection,
    actor: &Actor,
    query: IncidentQuery,
) -> Result<PaginationResponse<IncidentView>, AppError> {
    let mut condition = scope_condition(capability::list_scope(actor));

    if let Some(status) = query.status {
        condition = condition.add(incident::Column::Status.eq(status));
    }
    if let Some(incident_type) = query.incident_type {
        condition = condition.add(incident::Column::IncidentType.eq(incident_type));
    }
    if let Some(priority) = query.priority {
        condition = condition.add(incident::Column::Priority.eq(priority));
    }
    if let Some(date_from) = query.date_from {
        condition = condition.add(incident::Column::CreatedAt.gte(date_from));
    }
    if let Some(date_to) = query.date_to {
        condition = condition.add(incident::Column::CreatedAt.lte(date_to));
    }

    paginate(db, condition, query.page, query.size).await
}

/// The caller's own incidents, whatever their role.
#[instrument(skip(db, query), fields(actor_id = actor.id))]
pub async fn list_mine(
    db: &DatabaseConnection,
    actor: &Actor,
    query: MyIncidentsQuery,
) -> Result<PaginationResponse<IncidentView>, AppError> {
    let mut condition = scope_condition(ListScope::AuthoredBy(actor.id));
    if let Some(status) = query.status {
        condition = condition.add(incident::Column::Status.eq(status));
    }

    paginate(db, condition, query.page, query.size).await
}

fn scope_condition(scope: ListScope) -> Condition {
    match scope {
        ListScope::All => Condition::all(),
        ListScope::AuthoredBy(user_id) => Condition::all().add(incident::Column::AuthorId.eq(user_id)),
        ListScope::AuthoredOrAssignedTo(user_id) => {
            let assigned = Query::select()
                .column(incident_assignment::Column::IncidentId)
                .from(AssignmentEntity)
                .and_where(incident_assignment::Column::TechnicianId.eq(user_id))
                .and_where(incident_assignment::Column::IsActive.eq(true))
                .to_owned();

            Condition::all().add(
                Condition::any()
                    .add(incident::Column::AuthorId.eq(user_id))
                    .add(incident::Column::Id.in_subquery(assigned)),
            )
        }
    }
}

async fn paginate(
    db: &DatabaseConnection,
    condition: Condition,
    page: Option<u64>,
    size: Option<u64>,
) -> Result<PaginationResponse<IncidentView>, AppError> {
    let (page, size) = page_params(page, size);

    let paginator = IncidentEntity::find()
        .filter(condition)
        .order_by_desc(incident::Column::CreatedAt)
        .order_by_desc(incident::Column::Id)
        .paginate(db, size);

    let total_elements = paginator.num_items().await?;
    let incidents = paginator.fetch_page(page - 1).await?;

    let ids: Vec<i32> = incidents.iter().map(|incident| incident.id).collect();
    let mut active_by_incident: HashMap<i32, incident_assignment::Model> = HashMap::new();
    if !ids.is_empty() {
        active_by_incident = AssignmentEntity::find()
            .filter(incident_assignment::Column::IncidentId.is_in(ids))
            .filter(incident_assignment::Column::IsActive.eq(true))
            .all(db)
            .await?
            .into_iter()
            .map(|assignment| (assignment.incident_id, assignment))
            .collect();
    }

    let views = incidents
        .into_iter()
        .map(|incident| {
            let active_assignment = active_by_incident.remove(&incident.id);
            IncidentView { incident, active_assignment }
        })
        .collect();

    Ok(PaginationResponse::new(views, page, size, total_elements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::incident::{IncidentPriority, IncidentType};
    use crate::entity::user::{self, Role};
    use crate::migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    async fn migrated_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn row(reference: &str, author_id: i32) -> incident::ActiveModel {
        incident::ActiveModel {
            reference: Set(reference.to_string()),
            title: Set("Printer jam".to_string()),
            description: Set("Paper stuck in tray 2".to_string()),
            incident_type: Set(IncidentType::Hardware),
            priority: Set(IncidentPriority::Low),
            status: Set(IncidentStatus::Open),
            author_id: Set(author_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn duplicate_reference_is_a_unique_violation() {
        let db = migrated_db().await;
        let author = user::ActiveModel {
            name: Set("Alice".to_string()),
            email: Set("alice@helpdesk.test".to_string()),
            role: Set(Role::Agent),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        row("INC-2026-0001", author.id).insert(&db).await.unwrap();
        let err = row("INC-2026-0001", author.id).insert(&db).await.unwrap_err();
        assert!(is_unique_violation(&err), "{err:?}");

        row("INC-2026-0002", author.id).insert(&db).await.unwrap();
        assert!(!is_unique_violation(&DbErr::RecordNotInserted));
    }
}
