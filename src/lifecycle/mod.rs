//! Incident lifecycle engine.
//!
//! Pure decision logic: given the caller, the incident's current facts and the
//! requested operation, it yields the transition row to apply or the reason the
//! request is refused. Persisting the outcome is the job of
//! [`crate::service::incident`].

pub mod capability;
pub mod reference;
pub mod transition;

pub use capability::{Actor, ListScope};
pub use transition::{
    plan, transition_for, IncidentFacts, LifecycleError, Operation, Requirement, SideEffect, Target,
    Transition, TRANSITIONS,
};

use crate::model::global_error::{AppError, ErrorCode};

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Forbidden { .. } => {
                AppError::with_detail(ErrorCode::NotEnoughPermission, err.to_string())
            }
            LifecycleError::InvalidState { .. } => {
                AppError::with_detail(ErrorCode::InvalidIncidentState, err.to_string())
            }
        }
    }
}
