//! Identity directory lookups used by the lifecycle: who is calling, and is a
//! given user a valid assignment target.

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use tracing::warn;
use crate::entity::user::{self, Entity as UserEntity, Role};
use crate::lifecycle::Actor;
use crate::model::global_error::{AppError, ErrorCode};

pub async fn find_by_id<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<user::Model>, DbErr> {
    UserEntity::find_by_id(user_id).one(db).await
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<user::Model>, DbErr> {
    UserEntity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
}

/// Turns the authenticated user id into an [`Actor`], re-reading role and
/// active flag so that a stale token never carries old privileges.
pub async fn resolve_actor<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Actor, AppError> {
    let user = find_by_id(db, user_id)
        .await?
        .ok_or_else(|| {
            warn!(user_id, "token subject is not in the directory");
            AppError::unauthorized(ErrorCode::AuthenticationFailed)
        })?;

    if !user.is_active {
        return Err(AppError::forbidden(ErrorCode::AccountDisabled));
    }

    Ok(Actor::new(user.id, user.role))
}

pub async fn require_active_technician<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<user::Model, AppError> {
    let user = find_by_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::TechnicianNotFound))?;

    if user.role != Role::Technician || !user.is_active {
        return Err(AppError::with_detail(
            ErrorCode::InvalidTechnician,
            format!("user {} is {} and {}", user.id, user.role, if user.is_active { "active" } else { "inactive" }),
        ));
    }

    Ok(user)
}
