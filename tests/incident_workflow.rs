mod common;

use chrono::{TimeZone, Utc};
use common::{actor, incident_request, seed_staff, seed_user, setup_db};
use helpdesk::entity::incident::{Entity as IncidentEntity, IncidentStatus};
use helpdesk::entity::incident_assignment::{self, Entity as AssignmentEntity};
use helpdesk::entity::incident_status_history::{self, Entity as HistoryEntity};
use helpdesk::entity::incident_image::{self, Entity as ImageEntity};
use helpdesk::entity::user::Role;
use helpdesk::model::global_error::{ErrorCode, ErrorKind};
use helpdesk::model::incident::{
    AssignRequest, ImageDescriptor, IncidentQuery, MyIncidentsQuery, RejectRequest, ResolveRequest,
    UpdateIncidentRequest, ValidateRequest,
};
use helpdesk::service::incident::{NextInYear, ReferenceAllocator};
use helpdesk::service::{directory, incident};
use sea_orm::{ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use std::sync::atomic::{AtomicU32, Ordering};
use async_trait::async_trait;

fn assign_to(technician_id: i32) -> AssignRequest {
    AssignRequest { technician_id, instructions: Some("Check the switch first".to_string()) }
}

fn report() -> ResolveRequest {
    ResolveRequest { report: "Replaced the faulty switch".to_string() }
}

async fn history_count(db: &DatabaseConnection, incident_id: i32) -> u64 {
    HistoryEntity::find()
        .filter(incident_status_history::Column::IncidentId.eq(incident_id))
        .count(db)
        .await
        .unwrap()
}

async fn assignments(db: &DatabaseConnection, incident_id: i32) -> Vec<incident_assignment::Model> {
    AssignmentEntity::find()
        .filter(incident_assignment::Column::IncidentId.eq(incident_id))
        .all(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn incident_goes_from_report_to_closure() {
    let db = setup_db().await;
    let staff = seed_staff(&db).await;
    let author = actor(&staff.agent);
    let technician = actor(&staff.technician);

    let created = incident::create(&db, &author, incident_request("Network outage")).await.unwrap();
    let id = created.incident.id;
    assert_eq!(created.incident.status, IncidentStatus::Open);
    assert!(created.incident.reference.starts_with("INC-"));
    assert!(created.incident.reference.ends_with("-0001"));

    let assigned = incident::assign(&db, &actor(&staff.supervisor), id, assign_to(staff.technician.id)).await.unwrap();
    assert_eq!(assigned.incident.status, IncidentStatus::Assigned);
    let assignment = assigned.active_assignment.expect("active assignment");
    assert_eq!(assignment.technician_id, staff.technician.id);
    assert_eq!(assignment.assigned_by_id, staff.supervisor.id);

    let started = incident::take_charge(&db, &technician, id).await.unwrap();
    assert_eq!(started.incident.status, IncidentStatus::InProgress);
    assert!(started.active_assignment.unwrap().taken_charge_at.is_some());

    let resolved = incident::resolve(&db, &technician, id, report()).await.unwrap();
    assert_eq!(resolved.incident.status, IncidentStatus::PendingValidation);
    assert!(resolved.incident.resolved_at.is_some());
    assert_eq!(resolved.incident.resolution_report.as_deref(), Some("Replaced the faulty switch"));
    let assignment = resolved.active_assignment.unwrap();
    assert!(assignment.resolved_at.is_some());
    assert_eq!(assignment.intervention_report.as_deref(), Some("Replaced the faulty switch"));

    let closed = incident::validate(
        &db,
        &author,
        id,
        ValidateRequest { note: 8, comment: Some("Quick fix, thanks".to_string()) },
    )
    .await
    .unwrap();
    assert_eq!(closed.incident.status, IncidentStatus::Closed);
    assert!(closed.incident.closed_at.is_some());
    assert_eq!(closed.incident.satisfaction_note, Some(8));
    assert_eq!(closed.incident.closure_comment.as_deref(), Some("Quick fix, thanks"));

    let detail = incident::get_detail(&db, &author, id).await.unwrap();
    let steps: Vec<_> = detail.history.iter().map(|h| (h.previous_status, h.new_status)).collect();
    assert_eq!(
        steps,
        [
            (None, IncidentStatus::Open),
            (Some(IncidentStatus::Open), IncidentStatus::Assigned),
            (Some(IncidentStatus::Assigned), IncidentStatus::InProgress),
            (Some(IncidentStatus::InProgress), IncidentStatus::PendingValidation),
            (Some(IncidentStatus::PendingValidation), IncidentStatus::Closed),
        ]
    );
    assert!(detail.history[4].comment.as_deref().unwrap().contains("8/10"));
    assert_eq!(detail.author.unwrap().id, staff.agent.id);
}

#[tokio::test]
async fn rejected_resolution_goes_back_to_in_progress() {
    let db = setup_db().await;
    let staff = seed_staff(&db).await;
    let author = actor(&staff.agent);
    let technician = actor(&staff.technician);

    let id = incident::create(&db, &author, incident_request("VPN drops")).await.unwrap().incident.id;
    incident::assign(&db, &actor(&staff.supervisor), id, assign_to(staff.technician.id)).await.unwrap();
    incident::take_charge(&db, &technician, id).await.unwrap();
    incident::resolve(&db, &technician, id, report()).await.unwrap();

    let rejected = incident::reject(&db, &author, id, RejectRequest { reason: "still broken".to_string() })
        .await
        .unwrap();
    assert_eq!(rejected.incident.status, IncidentStatus::InProgress);
    assert!(rejected.incident.resolved_at.is_none());
    assert_eq!(rejected.active_assignment.unwrap().technician_id, staff.technician.id);

    let detail = incident::get_detail(&db, &author, id).await.unwrap();
    let last = detail.history.last().unwrap();
    assert_eq!(last.previous_status, Some(IncidentStatus::PendingValidation));
    assert_eq!(last.new_status, IncidentStatus::InProgress);
    assert!(last.comment.as_deref().unwrap().contains("still broken"));

    // the technician may take charge again without a reassignment
    let resumed = incident::take_charge(&db, &technician, id).await.unwrap();
    assert_eq!(resumed.incident.status, IncidentStatus::InProgress);
    assert_eq!(resumed.active_assignment.unwrap().technician_id, staff.technician.id);
    let detail = incident::get_detail(&db, &author, id).await.unwrap();
    let last = detail.history.last().unwrap();
    assert_eq!(last.previous_status, Some(IncidentStatus::InProgress));
    assert_eq!(last.new_status, IncidentStatus::InProgress);

    let other = actor(&staff.other_technician);
    let err = incident::take_charge(&db, &other, id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // the same technician resolves again from IN_PROGRESS
    let again = incident::resolve(&db, &technician, id, report()).await.unwrap();
    assert_eq!(again.incident.status, IncidentStatus::PendingValidation);
}

#[tokio::test]
async fn reassignment_keeps_exactly_one_active_assignment() {
    let db = setup_db().await;
    let staff = seed_staff(&db).await;
    let supervisor = actor(&staff.supervisor);
    let first = actor(&staff.technician);
    let second = actor(&staff.other_technician);

    let id = incident::create(&db, &actor(&staff.agent), incident_request("Printer offline")).await.unwrap().incident.id;
    incident::assign(&db, &supervisor, id, assign_to(staff.technician.id)).await.unwrap();
    incident::take_charge(&db, &first, id).await.unwrap();

    let reassigned = incident::assign(&db, &supervisor, id, assign_to(staff.other_technician.id)).await.unwrap();
    assert_eq!(reassigned.incident.status, IncidentStatus::Assigned);

    let records = assignments(&db, id).await;
    assert_eq!(records.len(), 2);
    let active: Vec<_> = records.iter().filter(|a| a.is_active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].technician_id, staff.other_technician.id);

    let err = incident::resolve(&db, &first, id, report()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let started = incident::take_charge(&db, &second, id).await.unwrap();
    assert_eq!(started.incident.status, IncidentStatus::InProgress);
}

#[tokio::test]
async fn admins_may_assign_but_agents_may_not() {
    let db = setup_db().await;
    let staff = seed_staff(&db).await;
    let id = incident::create(&db, &actor(&staff.agent), incident_request("Mail down")).await.unwrap().incident.id;

    let err = incident::assign(&db, &actor(&staff.agent), id, assign_to(staff.technician.id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = incident::assign(&db, &actor(&staff.technician), id, assign_to(staff.technician.id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let assigned = incident::assign(&db, &actor(&staff.admin), id, assign_to(staff.technician.id)).await.unwrap();
    assert_eq!(assigned.incident.status, IncidentStatus::Assigned);
}

#[tokio::test]
async fn assignment_target_must_be_an_active_technician() {
    let db = setup_db().await;
    let staff = seed_staff(&db).await;
    let retired = seed_user(&db, "Rita", Role::Technician, false).await;
    let supervisor = actor(&staff.supervisor);
    let id = incident::create(&db, &actor(&staff.agent), incident_request("Screen flicker")).await.unwrap().incident.id;

    let err = incident::assign(&db, &supervisor, id, assign_to(9999)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = incident::assign(&db, &supervisor, id, assign_to(staff.other_agent.id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert_eq!(err.code(), ErrorCode::InvalidTechnician);

    let err = incident::assign(&db, &supervisor, id, assign_to(retired.id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    assert!(assignments(&db, id).await.is_empty());
    assert_eq!(history_count(&db, id).await, 1);
}

#[tokio::test]
async fn refused_transitions_write_nothing() {
    let db = setup_db().await;
    let staff = seed_staff(&db).await;
    let author = actor(&staff.agent);
    let technician = actor(&staff.technician);
    let id = incident::create(&db, &author, incident_request("Keyboard dead")).await.unwrap().incident.id;

    // resolve on an OPEN incident: the technician passes authorization, the status does not
    let err = incident::resolve(&db, &technician, id, report()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    let err = incident::take_charge(&db, &technician, id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let err = incident::validate(&db, &author, id, ValidateRequest { note: 7, comment: None }).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    incident::assign(&db, &actor(&staff.supervisor), id, assign_to(staff.technician.id)).await.unwrap();
    incident::resolve(&db, &technician, id, report()).await.unwrap();
    let before = history_count(&db, id).await;

    // only the author validates
    let err = incident::validate(&db, &actor(&staff.supervisor), id, ValidateRequest { note: 7, comment: None })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = incident::validate(&db, &author, id, ValidateRequest { note: 11, comment: None }).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    let err = incident::reject(&db, &author, id, RejectRequest { reason: "   ".to_string() }).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    let detail = incident::get_detail(&db, &author, id).await.unwrap();
    assert_eq!(detail.incident.status, IncidentStatus::PendingValidation);
    assert!(detail.incident.closed_at.is_none());
    assert_eq!(history_count(&db, id).await, before);
}

#[tokio::test]
async fn closed_incidents_refuse_every_transition() {
    let db = setup_db().await;
    let staff = seed_staff(&db).await;
    let author = actor(&staff.agent);
    let supervisor = actor(&staff.supervisor);
    let technician = actor(&staff.technician);

    let id = incident::create(&db, &author, incident_request("Projector")).await.unwrap().incident.id;
    incident::assign(&db, &supervisor, id, assign_to(staff.technician.id)).await.unwrap();
    incident::resolve(&db, &technician, id, report()).await.unwrap();
    incident::validate(&db, &author, id, ValidateRequest { note: 10, comment: None }).await.unwrap();

    let refusals = [
        incident::assign(&db, &supervisor, id, assign_to(staff.technician.id)).await.unwrap_err(),
        incident::take_charge(&db, &technician, id).await.unwrap_err(),
        incident::resolve(&db, &technician, id, report()).await.unwrap_err(),
        incident::validate(&db, &author, id, ValidateRequest { note: 5, comment: None }).await.unwrap_err(),
        incident::reject(&db, &author, id, RejectRequest { reason: "late".to_string() }).await.unwrap_err(),
        incident::delete(&db, &author, id).await.unwrap_err(),
    ];
    for err in refusals {
        assert_eq!(err.kind(), ErrorKind::InvalidState, "{err:?}");
    }
    assert_eq!(history_count(&db, id).await, 4);
}

#[tokio::test]
async fn only_open_incidents_can_be_edited_or_deleted() {
    let db = setup_db().await;
    let staff = seed_staff(&db).await;
    let author = actor(&staff.agent);

    let mut request = incident_request("Broken chair");
    request.images.push(ImageDescriptor {
        file_name: "chair.jpg".to_string(),
        storage_path: "incidents/chair.jpg".to_string(),
        mime_type: Some("image/jpeg".to_string()),
        size_bytes: Some(52_000),
    });
    let open = incident::create(&db, &author, request).await.unwrap().incident.id;

    let update = UpdateIncidentRequest { title: Some("Broken office chair".to_string()), ..Default::default() };
    let err = incident::update(&db, &actor(&staff.other_agent), open, update.clone()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let updated = incident::update(&db, &author, open, update.clone()).await.unwrap();
    assert_eq!(updated.incident.title, "Broken office chair");
    assert_eq!(updated.incident.location.as_deref(), Some("Building B"));

    let moved = UpdateIncidentRequest {
        location: Some(String::new()),
        equipment: Some("Chair #12".to_string()),
        ..Default::default()
    };
    let moved = incident::update(&db, &author, open, moved).await.unwrap();
    assert_eq!(moved.incident.location, None);
    assert_eq!(moved.incident.equipment.as_deref(), Some("Chair #12"));
    assert_eq!(moved.incident.title, "Broken office chair");

    let err = incident::delete(&db, &actor(&staff.other_agent), open).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    incident::delete(&db, &author, open).await.unwrap();
    assert_eq!(history_count(&db, open).await, 0);
    let images = ImageEntity::find()
        .filter(incident_image::Column::IncidentId.eq(open))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(images, 0);
    let err = incident::get_detail(&db, &author, open).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let assigned = incident::create(&db, &author, incident_request("Wobbly desk")).await.unwrap().incident.id;
    incident::assign(&db, &actor(&staff.supervisor), assigned, assign_to(staff.technician.id)).await.unwrap();

    let err = incident::update(&db, &author, assigned, update).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    let err = incident::delete(&db, &author, assigned).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(assignments(&db, assigned).await.len(), 1);

    // admins may delete incidents they did not write
    let other = incident::create(&db, &actor(&staff.other_agent), incident_request("Dead plant")).await.unwrap().incident.id;
    incident::delete(&db, &actor(&staff.admin), other).await.unwrap();
}

#[tokio::test]
async fn references_count_per_creation_year() {
    let db = setup_db().await;
    let staff = seed_staff(&db).await;
    let author = actor(&staff.agent);
    let new_year_eve = Utc.with_ymd_and_hms(2025, 12, 31, 23, 0, 0).unwrap();
    let new_year = Utc.with_ymd_and_hms(2026, 1, 1, 0, 30, 0).unwrap();

    let first = incident::create_at(&db, &author, incident_request("A"), new_year_eve).await.unwrap();
    let second = incident::create_at(&db, &author, incident_request("B"), new_year_eve).await.unwrap();
    let third = incident::create_at(&db, &author, incident_request("C"), new_year).await.unwrap();
    let fourth = incident::create_at(&db, &author, incident_request("D"), new_year).await.unwrap();

    assert_eq!(first.incident.reference, "INC-2025-0001");
    assert_eq!(second.incident.reference, "INC-2025-0002");
    assert_eq!(third.incident.reference, "INC-2026-0001");
    assert_eq!(fourth.incident.reference, "INC-2026-0002");
    assert_eq!(third.incident.created_at, new_year);
}

/// Hands out an already used reference for the first `stale_attempts` calls,
/// the way a concurrent creation that committed first would.
struct StaleReferences {
    taken: String,
    stale_attempts: u32,
    calls: AtomicU32,
}

impl StaleReferences {
    fn new(taken: &str, stale_attempts: u32) -> Self {
        Self { taken: taken.to_string(), stale_attempts, calls: AtomicU32::new(0) }
    }
}

#[async_trait]
impl ReferenceAllocator for StaleReferences {
    async fn allocate(&self, txn: &DatabaseTransaction, year: i32) -> Result<String, DbErr> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.stale_attempts {
            Ok(self.taken.clone())
        } else {
            NextInYear.allocate(txn, year).await
        }
    }
}

#[tokio::test]
async fn reference_collision_is_retried() {
    let db = setup_db().await;
    let staff = seed_staff(&db).await;
    let author = actor(&staff.agent);
    let at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

    let first = incident::create_at(&db, &author, incident_request("A"), at).await.unwrap();
    assert_eq!(first.incident.reference, "INC-2026-0001");

    let references = StaleReferences::new("INC-2026-0001", 2);
    let second = incident::create_with(&db, &author, incident_request("B"), at, &references).await.unwrap();
    assert_eq!(second.incident.reference, "INC-2026-0002");
    assert_eq!(references.calls.load(Ordering::SeqCst), 3);

    // the failed attempts left nothing behind
    assert_eq!(IncidentEntity::find().count(&db).await.unwrap(), 2);
    assert_eq!(history_count(&db, second.incident.id).await, 1);
    assert_eq!(HistoryEntity::find().count(&db).await.unwrap(), 2);
}

#[tokio::test]
async fn reference_allocation_gives_up_after_repeated_collisions() {
    let db = setup_db().await;
    let staff = seed_staff(&db).await;
    let author = actor(&staff.agent);
    let at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    incident::create_at(&db, &author, incident_request("A"), at).await.unwrap();

    let references = StaleReferences::new("INC-2026-0001", u32::MAX);
    let err = incident::create_with(&db, &author, incident_request("B"), at, &references).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.code(), ErrorCode::ReferenceAllocationFailed);
    assert_eq!(references.calls.load(Ordering::SeqCst), incident::MAX_REFERENCE_ATTEMPTS);

    assert_eq!(IncidentEntity::find().count(&db).await.unwrap(), 1);
    assert_eq!(HistoryEntity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn invalid_creation_is_rejected_before_any_write() {
    let db = setup_db().await;
    let staff = seed_staff(&db).await;

    let mut request = incident_request("");
    request.description = String::new();
    let err = incident::create(&db, &actor(&staff.agent), request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    let created = incident::create(&db, &actor(&staff.agent), incident_request("Fine")).await.unwrap();
    assert!(created.incident.reference.ends_with("-0001"));
}

#[tokio::test]
async fn listing_is_scoped_by_role() {
    let db = setup_db().await;
    let staff = seed_staff(&db).await;
    let supervisor = actor(&staff.supervisor);

    let mine = incident::create(&db, &actor(&staff.agent), incident_request("Mine")).await.unwrap().incident.id;
    let theirs = incident::create(&db, &actor(&staff.other_agent), incident_request("Theirs")).await.unwrap().incident.id;
    incident::assign(&db, &supervisor, theirs, assign_to(staff.technician.id)).await.unwrap();

    let ids = |page: helpdesk::model::common::PaginationResponse<incident::IncidentView>| {
        page.content.into_iter().map(|view| view.incident.id).collect::<Vec<_>>()
    };

    let agent_view = incident::list(&db, &actor(&staff.agent), IncidentQuery::default()).await.unwrap();
    assert_eq!(ids(agent_view), [mine]);

    let technician_view = incident::list(&db, &actor(&staff.technician), IncidentQuery::default()).await.unwrap();
    assert_eq!(ids(technician_view), [theirs]);

    let other_technician_view =
        incident::list(&db, &actor(&staff.other_technician), IncidentQuery::default()).await.unwrap();
    assert_eq!(other_technician_view.total_elements, 0);

    let everything = incident::list(&db, &supervisor, IncidentQuery::default()).await.unwrap();
    assert_eq!(everything.total_elements, 2);
    assert_eq!(ids(everything), [theirs, mine]);

    let assigned_only = IncidentQuery { status: Some(IncidentStatus::Assigned), ..Default::default() };
    let filtered = incident::list(&db, &supervisor, assigned_only).await.unwrap();
    assert_eq!(filtered.content.len(), 1);
    assert_eq!(filtered.content[0].active_assignment.as_ref().unwrap().technician_id, staff.technician.id);

    let own = incident::list_mine(&db, &supervisor, MyIncidentsQuery::default()).await.unwrap();
    assert_eq!(own.total_elements, 0);

    // detail follows the same visibility
    let err = incident::get_detail(&db, &actor(&staff.agent), theirs).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    incident::get_detail(&db, &actor(&staff.technician), theirs).await.unwrap();
}

#[tokio::test]
async fn callers_are_resolved_from_the_directory() {
    let db = setup_db().await;
    let staff = seed_staff(&db).await;
    let disabled = seed_user(&db, "Dora", Role::Supervisor, false).await;

    let resolved = directory::resolve_actor(&db, staff.technician.id).await.unwrap();
    assert_eq!(resolved.role, Role::Technician);

    let err = directory::resolve_actor(&db, disabled.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = directory::resolve_actor(&db, 4242).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}
