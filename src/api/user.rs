use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;
use crate::model::common::PaginationResponse;
use crate::model::global_error::{AppError, ErrorCode, ErrorResponse};
use crate::model::user::{CreateUserRequest, UpdateUserRequest, UserQuery, UserResponse, UserSummary};
use crate::service::{directory, user as users};
use super::current_actor;

#[utoipa::path(
    get,
    path = "/api/me",
    summary = "The authenticated caller",
    responses(
        (status = 200, description = "Caller profile", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    ),
    tag = "users",
)]
#[get("/me")]
pub async fn get_me(
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let user = directory::find_by_id(db.get_ref(), *auth_user)
        .await?
        .ok_or_else(|| AppError::unauthorized(ErrorCode::AuthenticationFailed))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/users",
    summary = "List users (admin)",
    params(UserQuery),
    responses(
        (status = 200, description = "Users by name", body = PaginationResponse<UserResponse>),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    ),
    tag = "users",
)]
#[get("/users")]
pub async fn list_users(
    query: web::Query<UserQuery>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let page = users::list(db.get_ref(), &actor, query.into_inner()).await?;

    Ok(HttpResponse::Ok().json(page.map(UserResponse::from)))
}

#[utoipa::path(
    get,
    path = "/api/users/technicians",
    summary = "Active technicians available for assignment",
    responses(
        (status = 200, description = "Technicians by name", body = Vec<UserSummary>),
        (status = 403, description = "Caller is neither supervisor nor admin", body = ErrorResponse),
    ),
    tag = "users",
)]
#[get("/users/technicians")]
pub async fn list_technicians(
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let technicians = users::list_technicians(db.get_ref(), &actor).await?;

    let response: Vec<UserSummary> = technicians.into_iter().map(UserSummary::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/api/users",
    summary = "Create a user (admin)",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input or duplicate email", body = ErrorResponse),
    ),
    tag = "users",
)]
#[post("/users")]
pub async fn create_user(
    body: web::Json<CreateUserRequest>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let user = users::create(db.get_ref(), &actor, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    summary = "Read a user (admin, or the user themself)",
    params(("id", description = "User id", example = 1)),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "Unknown user", body = ErrorResponse),
    ),
    tag = "users",
)]
#[get("/users/{id}")]
pub async fn get_user(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let user = users::get(db.get_ref(), &actor, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    summary = "Update a user (admin)",
    params(("id", description = "User id", example = 1)),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "Unknown user", body = ErrorResponse),
    ),
    tag = "users",
)]
#[put("/users/{id}")]
pub async fn update_user(
    path: web::Path<i32>,
    body: web::Json<UpdateUserRequest>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let user = users::update(db.get_ref(), &actor, path.into_inner(), body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    summary = "Delete a user without incidents (admin)",
    params(("id", description = "User id", example = 1)),
    responses(
        (status = 204, description = "User deleted"),
        (status = 409, description = "User is the caller or authored incidents", body = ErrorResponse),
    ),
    tag = "users",
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    users::delete(db.get_ref(), &actor, path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
