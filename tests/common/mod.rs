#![allow(dead_code)]

use chrono::{Duration, Utc};
use helpdesk::auth::Claims;
use helpdesk::entity::incident::{IncidentPriority, IncidentType};
use helpdesk::entity::user::{self, Role};
use helpdesk::lifecycle::Actor;
use helpdesk::migration::{Migrator, MigratorTrait};
use helpdesk::model::incident::CreateIncidentRequest;
use jsonwebtoken::{encode, EncodingKey, Header};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

pub const JWT_SECRET: &str = "integration-test-secret";

/// Builds the production route table over `$db` and initializes it as a test service.
#[allow(unused_macros)]
macro_rules! test_app {
    ($db:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data(actix_web::web::Data::new(helpdesk::auth::JwtUtils::new(common::JWT_SECRET)))
                .configure(helpdesk::api::configure),
        )
        .await
    };
}

/// One connection: every new connection to `sqlite::memory:` is a fresh database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await.expect("in-memory sqlite");
    Migrator::up(&db, None).await.expect("migrations");
    db
}

pub async fn seed_user(db: &DatabaseConnection, name: &str, role: Role, is_active: bool) -> user::Model {
    user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(format!("{}@helpdesk.test", name.to_lowercase())),
        role: Set(role),
        is_active: Set(is_active),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed user")
}

pub struct Staff {
    pub agent: user::Model,
    pub other_agent: user::Model,
    pub supervisor: user::Model,
    pub technician: user::Model,
    pub other_technician: user::Model,
    pub admin: user::Model,
}

pub async fn seed_staff(db: &DatabaseConnection) -> Staff {
    Staff {
        agent: seed_user(db, "Alice", Role::Agent, true).await,
        other_agent: seed_user(db, "Bruno", Role::Agent, true).await,
        supervisor: seed_user(db, "Sofia", Role::Supervisor, true).await,
        technician: seed_user(db, "Theo", Role::Technician, true).await,
        other_technician: seed_user(db, "Tania", Role::Technician, true).await,
        admin: seed_user(db, "Adam", Role::Admin, true).await,
    }
}

pub fn actor(user: &user::Model) -> Actor {
    Actor::new(user.id, user.role)
}

pub fn incident_request(title: &str) -> CreateIncidentRequest {
    CreateIncidentRequest {
        title: title.to_string(),
        description: "Nothing works on the second floor".to_string(),
        incident_type: IncidentType::Network,
        priority: IncidentPriority::High,
        location: Some("Building B".to_string()),
        equipment: None,
        images: Vec::new(),
    }
}

fn sign(user_id: i32, expires_in: Duration, secret: &str) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + expires_in).timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).expect("token")
}

pub fn token_for(user_id: i32) -> String {
    sign(user_id, Duration::hours(1), JWT_SECRET)
}

pub fn expired_token_for(user_id: i32) -> String {
    sign(user_id, Duration::hours(-2), JWT_SECRET)
}

pub fn forged_token_for(user_id: i32) -> String {
    sign(user_id, Duration::hours(1), "some-other-secret")
}

pub fn bearer(user_id: i32) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(user_id)))
}

pub fn json_or_null(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).unwrap_or(serde_json::Value::Null)
}

/// Sends a `TestRequest` and returns `(status, json body)`. Errors raised by
/// middleware come back as `Err` from the service and are rendered here the
/// way the server would render them.
#[allow(unused_macros)]
macro_rules! send {
    ($app:expr, $request:expr) => {{
        match actix_web::test::try_call_service(&$app, $request.to_request()).await {
            Ok(response) => {
                let status = response.status();
                let body = actix_web::test::read_body(response).await;
                (status, common::json_or_null(&body))
            }
            Err(err) => {
                let response = err.error_response();
                let status = response.status();
                let body = actix_web::body::to_bytes(response.into_body()).await.unwrap_or_default();
                (status, common::json_or_null(&body))
            }
        }
    }};
}
