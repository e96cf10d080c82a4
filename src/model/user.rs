use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use crate::entity::user::{Model as UserModel, Role};
use crate::model::global_error::{validation_result, AppError, ValidationFieldError};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<UserModel> for UserSummary {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub service: Option<String>,
    pub phone: Option<String>,
    pub employee_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserModel> for UserResponse {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            service: model.service,
            phone: model.phone,
            employee_number: model.employee_number,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub service: Option<String>,
    pub phone: Option<String>,
    pub employee_number: Option<String>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        check_name(Some(&self.name), &mut errors);
        check_email(Some(&self.email), &mut errors);
        check_contact(self.service.as_deref(), self.phone.as_deref(), self.employee_number.as_deref(), &mut errors);
        validation_result(errors)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub service: Option<String>,
    pub phone: Option<String>,
    pub employee_number: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        check_name(self.name.as_deref(), &mut errors);
        check_email(self.email.as_deref(), &mut errors);
        check_contact(self.service.as_deref(), self.phone.as_deref(), self.employee_number.as_deref(), &mut errors);
        validation_result(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub role: Option<Role>,
    /// Matches name, email or employee number
    pub search: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

fn check_name(name: Option<&str>, errors: &mut Vec<ValidationFieldError>) {
    match name {
        Some(name) if name.trim().is_empty() => {
            errors.push(ValidationFieldError::new("name", "Name is required."));
        }
        Some(name) if name.chars().count() > 255 => {
            errors.push(ValidationFieldError::new("name", "Name must be at most 255 characters."));
        }
        _ => {}
    }
}

fn check_email(email: Option<&str>, errors: &mut Vec<ValidationFieldError>) {
    match email {
        Some(email) if email.trim().is_empty() => {
            errors.push(ValidationFieldError::new("email", "Email is required."));
        }
        Some(email) if !email.contains('@') => {
            errors.push(ValidationFieldError::new("email", "Email format is invalid."));
        }
        _ => {}
    }
}

fn check_contact(
    service: Option<&str>,
    phone: Option<&str>,
    employee_number: Option<&str>,
    errors: &mut Vec<ValidationFieldError>,
) {
    if service.is_some_and(|s| s.chars().count() > 255) {
        errors.push(ValidationFieldError::new("service", "Service must be at most 255 characters."));
    }
    if phone.is_some_and(|p| p.chars().count() > 20) {
        errors.push(ValidationFieldError::new("phone", "Phone must be at most 20 characters."));
    }
    if employee_number.is_some_and(|n| n.chars().count() > 50) {
        errors.push(ValidationFieldError::new("employeeNumber", "Employee number must be at most 50 characters."));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_role_spellings_are_accepted() {
        let body = serde_json::json!({ "name": "Pierre", "email": "pierre@example.com", "role": "MAINTENANCIER" });
        let request: CreateUserRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.role, Role::Technician);

        let role: Role = serde_json::from_value(serde_json::json!("CHEF_SERVICE")).unwrap();
        assert_eq!(role, Role::Supervisor);
        assert_eq!(serde_json::to_value(role).unwrap(), "SUPERVISOR");
    }

    #[test]
    fn email_must_look_like_an_address() {
        let request = CreateUserRequest {
            name: "Marie".to_string(),
            email: "marie.example.com".to_string(),
            role: Role::Supervisor,
            service: None,
            phone: None,
            employee_number: None,
        };
        assert!(request.validate().is_err());
    }
}
