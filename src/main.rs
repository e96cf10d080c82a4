use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use dotenv::dotenv;
use helpdesk::auth::JwtUtils;
use helpdesk::configuration::Settings;
use helpdesk::db::init_db;
use helpdesk::migration::{Migrator, MigratorTrait};
use helpdesk::telemetry::{get_subscriber, init_subscriber};
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("helpdesk".into(), "info,sqlx=warn".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    dotenv().ok();
    let settings = Settings::from_env()?;
    info!("settings loaded");

    let db = init_db(&settings).await?;
    info!("running database migrations");
    Migrator::up(&db, None).await?;
    info!("migrations complete");

    let db_data = Data::new(db);
    let jwt_data = Data::new(JwtUtils::new(&settings.jwt_secret));
    let allowed_origin = settings.cors_allowed_origin.clone();

    info!(host = %settings.host, port = settings.port, "starting HTTP server");
    HttpServer::new(move || {
        let cors = match &allowed_origin {
            Some(origin) => Cors::default().allowed_origin(origin).supports_credentials(),
            None => Cors::default().allow_any_origin(),
        }
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(db_data.clone())
            .app_data(jwt_data.clone())
            .configure(helpdesk::api::configure)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await?;

    Ok(())
}
