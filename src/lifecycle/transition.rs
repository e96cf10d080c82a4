use std::fmt;
use thiserror::Error;
use crate::entity::incident::IncidentStatus::{self, *};
use crate::entity::user::Role;
use super::capability::{self, Actor};

/// Every action the lifecycle knows about. The discriminant is the row index
/// in [`TRANSITIONS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create = 0,
    Update = 1,
    Delete = 2,
    Assign = 3,
    TakeCharge = 4,
    Resolve = 5,
    Validate = 6,
    Reject = 7,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::Create,
        Operation::Update,
        Operation::Delete,
        Operation::Assign,
        Operation::TakeCharge,
        Operation::Resolve,
        Operation::Validate,
        Operation::Reject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Assign => "assign",
            Operation::TakeCharge => "take charge of",
            Operation::Resolve => "resolve",
            Operation::Validate => "validate",
            Operation::Reject => "reject",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may trigger a transition, expressed over (role, relationship).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    Author,
    AuthorOrAdmin,
    SupervisorOrAdmin,
    ActiveTechnician,
}

impl Requirement {
    pub fn permits(&self, actor: &Actor, facts: &IncidentFacts) -> bool {
        match self {
            Requirement::Authenticated => true,
            Requirement::Author => capability::is_author(actor, facts),
            Requirement::AuthorOrAdmin => capability::can_delete(actor, facts),
            Requirement::SupervisorOrAdmin => capability::can_assign(actor.role),
            Requirement::ActiveTechnician => capability::may_act_as_technician(actor, facts),
        }
    }
}

/// Records a transition writes besides the status change itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    AllocateReference,
    DeactivateAssignments,
    CreateAssignment,
    MarkTakenCharge,
    MarkAssignmentResolved,
    RecordResolution,
    ClearResolution,
    RecordClosure,
    ApplyFieldChanges,
    CascadeDelete,
    AppendHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Status(IncidentStatus),
    Unchanged,
    Removed,
}

#[derive(Debug)]
pub struct Transition {
    pub operation: Operation,
    pub requires: Requirement,
    pub from: &'static [IncidentStatus],
    pub to: Target,
    pub needs_active_assignment: bool,
    pub effects: &'static [SideEffect],
}

impl Transition {
    pub fn resulting_status(&self, current: IncidentStatus) -> IncidentStatus {
        match self.to {
            Target::Status(status) => status,
            Target::Unchanged | Target::Removed => current,
        }
    }

    pub fn changes_status(&self) -> bool {
        matches!(self.to, Target::Status(_))
    }

    pub fn has_effect(&self, effect: SideEffect) -> bool {
        self.effects.contains(&effect)
    }
}

pub const TRANSITIONS: &[Transition] = &[
    Transition {
        operation: Operation::Create,
        requires: Requirement::Authenticated,
        from: &[],
        to: Target::Status(Open),
        needs_active_assignment: false,
        effects: &[SideEffect::AllocateReference, SideEffect::AppendHistory],
    },
    Transition {
        operation: Operation::Update,
        requires: Requirement::Author,
        from: &[Open],
        to: Target::Unchanged,
        needs_active_assignment: false,
        effects: &[SideEffect::ApplyFieldChanges],
    },
    Transition {
        operation: Operation::Delete,
        requires: Requirement::AuthorOrAdmin,
        from: &[Open],
        to: Target::Removed,
        needs_active_assignment: false,
        effects: &[SideEffect::CascadeDelete],
    },
    Transition {
        operation: Operation::Assign,
        requires: Requirement::SupervisorOrAdmin,
        from: &[Open, Assigned, InProgress],
        to: Target::Status(Assigned),
        needs_active_assignment: false,
        effects: &[
            SideEffect::DeactivateAssignments,
            SideEffect::CreateAssignment,
            SideEffect::AppendHistory,
        ],
    },
    Transition {
        operation: Operation::TakeCharge,
        requires: Requirement::ActiveTechnician,
        from: &[Assigned, InProgress],
        to: Target::Status(InProgress),
        needs_active_assignment: true,
        effects: &[SideEffect::MarkTakenCharge, SideEffect::AppendHistory],
    },
    Transition {
        operation: Operation::Resolve,
        requires: Requirement::ActiveTechnician,
        from: &[Assigned, InProgress],
        to: Target::Status(PendingValidation),
        needs_active_assignment: true,
        effects: &[
            SideEffect::MarkAssignmentResolved,
            SideEffect::RecordResolution,
            SideEffect::AppendHistory,
        ],
    },
    Transition {
        operation: Operation::Validate,
        requires: Requirement::Author,
        from: &[PendingValidation],
        to: Target::Status(Closed),
        needs_active_assignment: false,
        effects: &[SideEffect::RecordClosure, SideEffect::AppendHistory],
    },
    Transition {
        operation: Operation::Reject,
        requires: Requirement::Author,
        from: &[PendingValidation],
        to: Target::Status(InProgress),
        needs_active_assignment: false,
        effects: &[SideEffect::ClearResolution, SideEffect::AppendHistory],
    },
];

pub fn transition_for(operation: Operation) -> &'static Transition {
    &TRANSITIONS[operation as usize]
}

/// What the engine needs to know about an existing incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncidentFacts {
    pub status: IncidentStatus,
    pub author_id: i32,
    pub active_technician_id: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("a {role} caller may not {operation} this incident")]
    Forbidden { operation: Operation, role: Role },

    #[error("cannot {operation} an incident in status {status}")]
    InvalidState { operation: Operation, status: IncidentStatus },
}

/// Decides whether `actor` may apply `operation` to an incident described by
/// `facts`. Authorization is evaluated before the status precondition.
pub fn plan(
    operation: Operation,
    actor: &Actor,
    facts: &IncidentFacts,
) -> Result<&'static Transition, LifecycleError> {
    let transition = transition_for(operation);

    if !transition.requires.permits(actor, facts) {
        return Err(LifecycleError::Forbidden { operation, role: actor.role });
    }

    let assignment_ok = !transition.needs_active_assignment || facts.active_technician_id.is_some();
    if facts.status.is_terminal() || !transition.from.contains(&facts.status) || !assignment_ok {
        return Err(LifecycleError::InvalidState { operation, status: facts.status });
    }

    Ok(transition)
}
