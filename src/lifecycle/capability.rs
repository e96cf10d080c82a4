use crate::entity::user::Role;
use super::IncidentFacts;

/// The authenticated caller, as resolved from the identity directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i32, role: Role) -> Self {
        Self { id, role }
    }
}

/// ADMIN carries SUPERVISOR authority for assignment.
pub fn can_assign(role: Role) -> bool {
    matches!(role, Role::Supervisor | Role::Admin)
}

pub fn can_administer_users(role: Role) -> bool {
    role == Role::Admin
}

pub fn can_list_technicians(role: Role) -> bool {
    can_assign(role)
}

pub fn is_author(actor: &Actor, facts: &IncidentFacts) -> bool {
    actor.id == facts.author_id
}

pub fn can_delete(actor: &Actor, facts: &IncidentFacts) -> bool {
    is_author(actor, facts) || actor.role == Role::Admin
}

/// A technician acting on an incident must hold its active assignment.
///
/// With no active assignment at all there is nobody to compare against, so a
/// technician passes here and the request fails on the state precondition.
pub fn may_act_as_technician(actor: &Actor, facts: &IncidentFacts) -> bool {
    actor.role == Role::Technician
        && facts
            .active_technician_id
            .is_none_or(|technician_id| technician_id == actor.id)
}

pub fn can_view(actor: &Actor, facts: &IncidentFacts) -> bool {
    can_assign(actor.role)
        || is_author(actor, facts)
        || facts.active_technician_id == Some(actor.id)
}

/// Which incidents a caller sees when listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    AuthoredOrAssignedTo(i32),
    AuthoredBy(i32),
}

pub fn list_scope(actor: &Actor) -> ListScope {
    match actor.role {
        Role::Supervisor | Role::Admin => ListScope::All,
        Role::Technician => ListScope::AuthoredOrAssignedTo(actor.id),
        Role::Agent => ListScope::AuthoredBy(actor.id),
    }
}
