use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;
use crate::model::common::PaginationResponse;
use crate::model::global_error::{AppError, ErrorResponse};
use crate::model::incident::{
    AssignRequest, CreateIncidentRequest, IncidentDetailResponse, IncidentQuery, IncidentResponse,
    MyIncidentsQuery, RejectRequest, ResolveRequest, UpdateIncidentRequest, ValidateRequest,
};
use crate::service::incident as incidents;
use super::current_actor;

#[utoipa::path(
    post,
    path = "/api/incidents",
    summary = "Report an incident",
    request_body = CreateIncidentRequest,
    responses(
        (status = 201, description = "Incident created in OPEN", body = IncidentResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
    ),
    tag = "incidents",
)]
#[post("/incidents")]
pub async fn create_incident(
    body: web::Json<CreateIncidentRequest>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let view = incidents::create(db.get_ref(), &actor, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(IncidentResponse::from(view)))
}

#[utoipa::path(
    get,
    path = "/api/incidents",
    summary = "List visible incidents",
    params(IncidentQuery),
    responses(
        (status = 200, description = "Newest first", body = PaginationResponse<IncidentResponse>),
    ),
    tag = "incidents",
)]
#[get("/incidents")]
pub async fn list_incidents(
    query: web::Query<IncidentQuery>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let page = incidents::list(db.get_ref(), &actor, query.into_inner()).await?;

    Ok(HttpResponse::Ok().json(page.map(IncidentResponse::from)))
}

#[utoipa::path(
    get,
    path = "/api/incidents/mine",
    summary = "List the caller's own incidents",
    params(MyIncidentsQuery),
    responses(
        (status = 200, description = "Newest first", body = PaginationResponse<IncidentResponse>),
    ),
    tag = "incidents",
)]
#[get("/incidents/mine")]
pub async fn list_my_incidents(
    query: web::Query<MyIncidentsQuery>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let page = incidents::list_mine(db.get_ref(), &actor, query.into_inner()).await?;

    Ok(HttpResponse::Ok().json(page.map(IncidentResponse::from)))
}

#[utoipa::path(
    get,
    path = "/api/incidents/{id}",
    summary = "Incident detail with assignments, history and images",
    params(("id", description = "Incident id", example = 1)),
    responses(
        (status = 200, description = "Incident detail", body = IncidentDetailResponse),
        (status = 403, description = "Not visible to the caller", body = ErrorResponse),
        (status = 404, description = "Unknown incident", body = ErrorResponse),
    ),
    tag = "incidents",
)]
#[get("/incidents/{id}")]
pub async fn get_incident(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let detail = incidents::get_detail(db.get_ref(), &actor, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(detail))
}

#[utoipa::path(
    put,
    path = "/api/incidents/{id}",
    summary = "Edit an OPEN incident (author only)",
    params(("id", description = "Incident id", example = 1)),
    request_body = UpdateIncidentRequest,
    responses(
        (status = 200, description = "Incident updated", body = IncidentResponse),
        (status = 403, description = "Caller is not the author", body = ErrorResponse),
        (status = 409, description = "Incident is no longer OPEN", body = ErrorResponse),
    ),
    tag = "incidents",
)]
#[put("/incidents/{id}")]
pub async fn update_incident(
    path: web::Path<i32>,
    body: web::Json<UpdateIncidentRequest>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let view = incidents::update(db.get_ref(), &actor, path.into_inner(), body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(IncidentResponse::from(view)))
}

#[utoipa::path(
    delete,
    path = "/api/incidents/{id}",
    summary = "Delete an OPEN incident (author or admin)",
    params(("id", description = "Incident id", example = 1)),
    responses(
        (status = 204, description = "Incident and its records removed"),
        (status = 403, description = "Caller may not delete it", body = ErrorResponse),
        (status = 409, description = "Incident is no longer OPEN", body = ErrorResponse),
    ),
    tag = "incidents",
)]
#[delete("/incidents/{id}")]
pub async fn delete_incident(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    incidents::delete(db.get_ref(), &actor, path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/incidents/{id}/assign",
    summary = "Assign or reassign to a technician",
    params(("id", description = "Incident id", example = 1)),
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Incident ASSIGNED", body = IncidentResponse),
        (status = 400, description = "Target is not an active technician", body = ErrorResponse),
        (status = 403, description = "Caller is neither supervisor nor admin", body = ErrorResponse),
        (status = 409, description = "Incident cannot be assigned in its status", body = ErrorResponse),
    ),
    tag = "lifecycle",
)]
#[post("/incidents/{id}/assign")]
pub async fn assign_incident(
    path: web::Path<i32>,
    body: web::Json<AssignRequest>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let view = incidents::assign(db.get_ref(), &actor, path.into_inner(), body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(IncidentResponse::from(view)))
}

#[utoipa::path(
    post,
    path = "/api/incidents/{id}/take-charge",
    summary = "Start work on an assigned incident",
    params(("id", description = "Incident id", example = 1)),
    responses(
        (status = 200, description = "Incident IN_PROGRESS", body = IncidentResponse),
        (status = 403, description = "Caller does not hold the active assignment", body = ErrorResponse),
        (status = 409, description = "Incident is neither ASSIGNED nor IN_PROGRESS", body = ErrorResponse),
    ),
    tag = "lifecycle",
)]
#[post("/incidents/{id}/take-charge")]
pub async fn take_charge(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let view = incidents::take_charge(db.get_ref(), &actor, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(IncidentResponse::from(view)))
}

#[utoipa::path(
    post,
    path = "/api/incidents/{id}/resolve",
    summary = "Submit the intervention report",
    params(("id", description = "Incident id", example = 1)),
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "Incident PENDING_VALIDATION", body = IncidentResponse),
        (status = 403, description = "Caller does not hold the active assignment", body = ErrorResponse),
        (status = 409, description = "Incident cannot be resolved in its status", body = ErrorResponse),
    ),
    tag = "lifecycle",
)]
#[post("/incidents/{id}/resolve")]
pub async fn resolve_incident(
    path: web::Path<i32>,
    body: web::Json<ResolveRequest>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let view = incidents::resolve(db.get_ref(), &actor, path.into_inner(), body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(IncidentResponse::from(view)))
}

#[utoipa::path(
    post,
    path = "/api/incidents/{id}/validate",
    summary = "Accept the resolution and close",
    params(("id", description = "Incident id", example = 1)),
    request_body = ValidateRequest,
    responses(
        (status = 200, description = "Incident CLOSED", body = IncidentResponse),
        (status = 400, description = "Note outside 1..=10", body = ErrorResponse),
        (status = 403, description = "Caller is not the author", body = ErrorResponse),
        (status = 409, description = "Incident is not awaiting validation", body = ErrorResponse),
    ),
    tag = "lifecycle",
)]
#[post("/incidents/{id}/validate")]
pub async fn validate_incident(
    path: web::Path<i32>,
    body: web::Json<ValidateRequest>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let view = incidents::validate(db.get_ref(), &actor, path.into_inner(), body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(IncidentResponse::from(view)))
}

#[utoipa::path(
    post,
    path = "/api/incidents/{id}/reject",
    summary = "Reject the resolution",
    params(("id", description = "Incident id", example = 1)),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Incident back IN_PROGRESS", body = IncidentResponse),
        (status = 403, description = "Caller is not the author", body = ErrorResponse),
        (status = 409, description = "Incident is not awaiting validation", body = ErrorResponse),
    ),
    tag = "lifecycle",
)]
#[post("/incidents/{id}/reject")]
pub async fn reject_incident(
    path: web::Path<i32>,
    body: web::Json<RejectRequest>,
    db: web::Data<DatabaseConnection>,
    auth_user: web::ReqData<i32>,
) -> Result<HttpResponse, AppError> {
    let actor = current_actor(db.get_ref(), &auth_user).await?;
    let view = incidents::reject(db.get_ref(), &actor, path.into_inner(), body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(IncidentResponse::from(view)))
}
