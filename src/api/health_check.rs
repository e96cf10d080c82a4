use actix_web::{get, HttpResponse, Responder};

#[utoipa::path(
    get,
    path = "/health-check",
    responses(
        (status = 200, description = "Service is up", body = String)
    ),
    tag = "health check",
)]
#[get("/health-check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("OK")
}
