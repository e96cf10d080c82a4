use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub role: Role,
    pub service: Option<String>,
    pub phone: Option<String>,
    #[sea_orm(unique)]
    pub employee_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Canonical role names. The legacy French spellings found in older data are
/// accepted on input and rewritten by the normalization migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[sea_orm(string_value = "AGENT")]
    #[serde(alias = "UTILISATEUR")]
    Agent,

    #[sea_orm(string_value = "TECHNICIAN")]
    #[serde(alias = "MAINTENANCIER", alias = "TECHNICIEN")]
    Technician,

    #[sea_orm(string_value = "SUPERVISOR")]
    #[serde(alias = "CHEF_SERVICE", alias = "SUPERVISEUR")]
    Supervisor,

    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Agent => "AGENT",
            Role::Technician => "TECHNICIAN",
            Role::Supervisor => "SUPERVISOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::incident::Entity")]
    AuthoredIncidents,
}

impl Related<super::incident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthoredIncidents.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        let now = Utc::now();
        if insert {
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }
            if let ActiveValue::Set(created_at) = &self.created_at {
                self.updated_at = Set(*created_at);
            }
        } else {
            self.updated_at = Set(now);
        }
        Ok(self)
    }
}
