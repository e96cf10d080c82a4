mod health_check;
mod incident;
mod user;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{web, HttpRequest};
use sea_orm::DatabaseConnection;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use crate::auth::AuthMiddleware;
use crate::lifecycle::Actor;
use crate::model::global_error::{AppError, ErrorCode};
use crate::service::directory;

#[derive(OpenApi)]
#[openapi(
    info(title = "Helpdesk incident API"),
    paths(
        health_check::health_check,
        incident::create_incident,
        incident::list_incidents,
        incident::list_my_incidents,
        incident::get_incident,
        incident::update_incident,
        incident::delete_incident,
        incident::assign_incident,
        incident::take_charge,
        incident::resolve_incident,
        incident::validate_incident,
        incident::reject_incident,
        user::get_me,
        user::list_users,
        user::list_technicians,
        user::create_user,
        user::get_user,
        user::update_user,
        user::delete_user,
    ),
    tags(
        (name = "incidents", description = "Reporting and reading incidents"),
        (name = "lifecycle", description = "Status transitions"),
        (name = "users", description = "Identity directory"),
    )
)]
pub struct ApiDoc;

/// Role and active flag come from the directory on every request, never from
/// the token.
pub(crate) async fn current_actor(
    db: &DatabaseConnection,
    auth_user: &web::ReqData<i32>,
) -> Result<Actor, AppError> {
    directory::resolve_actor(db, **auth_user).await
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::with_detail(ErrorCode::ValidationError, err.to_string()).into()
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::with_detail(ErrorCode::ValidationError, err.to_string()).into()
}

fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::with_detail(ErrorCode::ValidationError, err.to_string()).into()
}

/// Routes, extractor configuration and the OpenAPI document. Expects
/// `web::Data<DatabaseConnection>` and `web::Data<JwtUtils>` on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(health_check::health_check)
        .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .service(
            web::scope("/api")
                .wrap(AuthMiddleware)
                .service(user::get_me)
                // literal segments before `{id}`
                .service(incident::list_my_incidents)
                .service(incident::list_incidents)
                .service(incident::create_incident)
                .service(incident::get_incident)
                .service(incident::update_incident)
                .service(incident::delete_incident)
                .service(incident::assign_incident)
                .service(incident::take_charge)
                .service(incident::resolve_incident)
                .service(incident::validate_incident)
                .service(incident::reject_incident)
                .service(user::list_technicians)
                .service(user::list_users)
                .service(user::create_user)
                .service(user::get_user)
                .service(user::update_user)
                .service(user::delete_user),
        );
}
