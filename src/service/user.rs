use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument};
use crate::entity::incident::{self, Entity as IncidentEntity};
use crate::entity::incident_assignment::{self, Entity as AssignmentEntity};
use crate::entity::user::{self, Entity as UserEntity, Role};
use crate::lifecycle::capability;
use crate::lifecycle::Actor;
use crate::model::common::{page_params, PaginationResponse};
use crate::model::global_error::{AppError, ErrorCode};
use crate::model::user::{CreateUserRequest, UpdateUserRequest, UserQuery};
use super::directory;

fn require_admin(actor: &Actor) -> Result<(), AppError> {
    if capability::can_administer_users(actor.role) {
        Ok(())
    } else {
        Err(AppError::forbidden(ErrorCode::NotEnoughPermission))
    }
}

pub async fn list(
    db: &DatabaseConnection,
    actor: &Actor,
    query: UserQuery,
) -> Result<PaginationResponse<user::Model>, AppError> {
    require_admin(actor)?;

    let (page, size) = page_params(query.page, query.size);
    let mut condition = Condition::all();

    if let Some(role) = query.role {
        condition = condition.add(user::Column::Role.eq(role));
    }
    if let Some(search) = query.search.filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        condition = condition.add(
            Condition::any()
                .add(user::Column::Name.like(&pattern))
                .add(user::Column::Email.like(&pattern))
                .add(user::Column::EmployeeNumber.like(&pattern)),
        );
    }

    let paginator = UserEntity::find()
        .filter(condition)
        .order_by_asc(user::Column::Name)
        .paginate(db, size);

    let total_elements = paginator.num_items().await?;
    let users = paginator.fetch_page(page - 1).await?;

    Ok(PaginationResponse::new(users, page, size, total_elements))
}

/// Active technicians, the candidates for assignment.
pub async fn list_technicians(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<user::Model>, AppError> {
    if !capability::can_list_technicians(actor.role) {
        return Err(AppError::forbidden(ErrorCode::NotEnoughPermission));
    }

    let technicians = UserEntity::find()
        .filter(user::Column::Role.eq(Role::Technician))
        .filter(user::Column::IsActive.eq(true))
        .order_by_asc(user::Column::Name)
        .all(db)
        .await?;

    Ok(technicians)
}

#[instrument(skip(db, request), fields(actor_id = actor.id))]
pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    request: CreateUserRequest,
) -> Result<user::Model, AppError> {
    require_admin(actor)?;
    request.validate()?;

    let txn = db.begin().await?;

    if directory::find_by_email(&txn, &request.email).await?.is_some() {
        txn.rollback().await.ok();
        return Err(AppError::bad_request(ErrorCode::DuplicateEmail));
    }
    if let Some(number) = &request.employee_number {
        if employee_number_taken(&txn, number, None).await? {
            txn.rollback().await.ok();
            return Err(AppError::bad_request(ErrorCode::DuplicateEmployeeNumber));
        }
    }

    let new_user = user::ActiveModel {
        name: Set(request.name),
        email: Set(request.email),
        role: Set(request.role),
        service: Set(request.service),
        phone: Set(request.phone),
        employee_number: Set(request.employee_number),
        is_active: Set(true),
        ..Default::default()
    };

    let user = new_user.insert(&txn).await?;
    txn.commit().await?;

    info!(user_id = user.id, role = %user.role, "user created");
    Ok(user)
}

/// Admins may read anyone; everybody may read themselves.
pub async fn get(db: &DatabaseConnection, actor: &Actor, user_id: i32) -> Result<user::Model, AppError> {
    if actor.id != user_id {
        require_admin(actor)?;
    }

    directory::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::UserNotFound))
}

#[instrument(skip(db, request), fields(actor_id = actor.id))]
pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    user_id: i32,
    request: UpdateUserRequest,
) -> Result<user::Model, AppError> {
    require_admin(actor)?;
    request.validate()?;

    let txn = db.begin().await?;

    let user = directory::find_by_id(&txn, user_id)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::UserNotFound))?;

    if let Some(email) = &request.email {
        if directory::find_by_email(&txn, email).await?.is_some_and(|other| other.id != user_id) {
            txn.rollback().await.ok();
            return Err(AppError::bad_request(ErrorCode::DuplicateEmail));
        }
    }
    if let Some(number) = &request.employee_number {
        if employee_number_taken(&txn, number, Some(user_id)).await? {
            txn.rollback().await.ok();
            return Err(AppError::bad_request(ErrorCode::DuplicateEmployeeNumber));
        }
    }

    let mut user_model: user::ActiveModel = user.into();

    if let Some(name) = request.name {
        user_model.name = Set(name);
    }
    if let Some(email) = request.email {
        user_model.email = Set(email);
    }
    if let Some(role) = request.role {
        user_model.role = Set(role);
    }
    if let Some(service) = request.service {
        user_model.service = Set(Some(service));
    }
    if let Some(phone) = request.phone {
        user_model.phone = Set(Some(phone));
    }
    if let Some(number) = request.employee_number {
        user_model.employee_number = Set(Some(number));
    }
    if let Some(is_active) = request.is_active {
        user_model.is_active = Set(is_active);
    }

    let updated = user_model.update(&txn).await?;
    txn.commit().await?;

    info!(user_id, "user updated");
    Ok(updated)
}

#[instrument(skip(db), fields(actor_id = actor.id))]
pub async fn delete(db: &DatabaseConnection, actor: &Actor, user_id: i32) -> Result<(), AppError> {
    require_admin(actor)?;

    if actor.id == user_id {
        return Err(AppError::new(ErrorCode::CannotDeleteSelf));
    }

    let txn = db.begin().await?;

    let user = directory::find_by_id(&txn, user_id)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::UserNotFound))?;

    let authored = IncidentEntity::find()
        .filter(incident::Column::AuthorId.eq(user.id))
        .count(&txn)
        .await?;
    let involved = AssignmentEntity::find()
        .filter(
            Condition::any()
                .add(incident_assignment::Column::TechnicianId.eq(user.id))
                .add(incident_assignment::Column::AssignedById.eq(user.id)),
        )
        .count(&txn)
        .await?;
    if authored + involved > 0 {
        txn.rollback().await.ok();
        return Err(AppError::new(ErrorCode::UserHasIncidents));
    }

    UserEntity::delete_by_id(user.id).exec(&txn).await?;
    txn.commit().await?;

    info!(user_id, "user deleted");
    Ok(())
}

async fn employee_number_taken<C: sea_orm::ConnectionTrait>(
    db: &C,
    number: &str,
    except: Option<i32>,
) -> Result<bool, AppError> {
    let mut query = UserEntity::find().filter(user::Column::EmployeeNumber.eq(number));
    if let Some(user_id) = except {
        query = query.filter(user::Column::Id.ne(user_id));
    }
    Ok(query.one(db).await?.is_some())
}
