use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use crate::entity::incident::{IncidentPriority, IncidentStatus, IncidentType, Model as IncidentModel};
use crate::entity::incident_assignment::Model as AssignmentModel;
use crate::entity::incident_image::Model as ImageModel;
use crate::entity::incident_status_history::Model as HistoryModel;
use crate::model::global_error::{validation_result, AppError, ValidationFieldError};
use crate::model::user::UserSummary;

const MAX_SHORT_TEXT: usize = 255;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    pub file_name: String,
    pub storage_path: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentRequest {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub priority: IncidentPriority,
    pub location: Option<String>,
    pub equipment: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageDescriptor>,
}

impl CreateIncidentRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();

        check_title(&self.title, &mut errors);
        if self.description.trim().is_empty() {
            errors.push(ValidationFieldError::new("description", "Description is required."));
        }
        check_short_text("location", self.location.as_deref(), &mut errors);
        check_short_text("equipment", self.equipment.as_deref(), &mut errors);

        for (index, image) in self.images.iter().enumerate() {
            if image.file_name.trim().is_empty() || image.storage_path.trim().is_empty() {
                errors.push(ValidationFieldError {
                    field: format!("images[{}]", index),
                    message: "File name and storage path are required.".to_string(),
                });
            }
            if image.size_bytes.is_some_and(|size| size < 0) {
                errors.push(ValidationFieldError {
                    field: format!("images[{}].sizeBytes", index),
                    message: "Size cannot be negative.".to_string(),
                });
            }
        }

        validation_result(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIncidentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub incident_type: Option<IncidentType>,
    pub priority: Option<IncidentPriority>,
    /// An empty string clears the location.
    pub location: Option<String>,
    /// An empty string clears the equipment.
    pub equipment: Option<String>,
}

impl UpdateIncidentRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();

        if let Some(title) = &self.title {
            check_title(title, &mut errors);
        }
        if self.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            errors.push(ValidationFieldError::new("description", "Description cannot be empty."));
        }
        check_short_text("location", self.location.as_deref(), &mut errors);
        check_short_text("equipment", self.equipment.as_deref(), &mut errors);

        let is_empty = self.title.is_none()
            && self.description.is_none()
            && self.incident_type.is_none()
            && self.priority.is_none()
            && self.location.is_none()
            && self.equipment.is_none();
        if is_empty {
            errors.push(ValidationFieldError::new("body", "At least one field must be provided."));
        }

        validation_result(errors)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub technician_id: i32,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub report: String,
}

impl ResolveRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        if self.report.trim().is_empty() {
            errors.push(ValidationFieldError::new("report", "An intervention report is required."));
        }
        validation_result(errors)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub note: i32,
    pub comment: Option<String>,
}

impl ValidateRequest {
    pub const NOTE_RANGE: std::ops::RangeInclusive<i32> = 1..=10;

    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        if !Self::NOTE_RANGE.contains(&self.note) {
            errors.push(ValidationFieldError::new("note", "The note must be between 1 and 10."));
        }
        validation_result(errors)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub reason: String,
}

impl RejectRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        if self.reason.trim().is_empty() {
            errors.push(ValidationFieldError::new("reason", "A rejection reason is required."));
        }
        validation_result(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct IncidentQuery {
    pub status: Option<IncidentStatus>,
    #[serde(rename = "type")]
    pub incident_type: Option<IncidentType>,
    pub priority: Option<IncidentPriority>,
    /// Inclusive lower bound on creation time (RFC 3339)
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time (RFC 3339)
    pub date_to: Option<DateTime<Utc>>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MyIncidentsQuery {
    pub status: Option<IncidentStatus>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub id: i32,
    pub incident_id: i32,
    pub technician_id: i32,
    pub assigned_by_id: i32,
    pub instructions: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub taken_charge_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub intervention_report: Option<String>,
    pub is_active: bool,
}

impl From<AssignmentModel> for AssignmentResponse {
    fn from(model: AssignmentModel) -> Self {
        Self {
            id: model.id,
            incident_id: model.incident_id,
            technician_id: model.technician_id,
            assigned_by_id: model.assigned_by_id,
            instructions: model.instructions,
            assigned_at: model.assigned_at,
            taken_charge_at: model.taken_charge_at,
            resolved_at: model.resolved_at,
            intervention_report: model.intervention_report,
            is_active: model.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncidentResponse {
    pub id: i32,
    pub reference: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub priority: IncidentPriority,
    pub status: IncidentStatus,
    pub author_id: i32,
    pub location: Option<String>,
    pub equipment: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub resolution_report: Option<String>,
    pub satisfaction_note: Option<i32>,
    pub closure_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active_assignment: Option<AssignmentResponse>,
}

impl IncidentResponse {
    pub fn new(model: IncidentModel, active_assignment: Option<AssignmentModel>) -> Self {
        Self {
            id: model.id,
            reference: model.reference,
            title: model.title,
            description: model.description,
            incident_type: model.incident_type,
            priority: model.priority,
            status: model.status,
            author_id: model.author_id,
            location: model.location,
            equipment: model.equipment,
            resolved_at: model.resolved_at,
            closed_at: model.closed_at,
            resolution_report: model.resolution_report,
            satisfaction_note: model.satisfaction_note,
            closure_comment: model.closure_comment,
            created_at: model.created_at,
            updated_at: model.updated_at,
            active_assignment: active_assignment.map(AssignmentResponse::from),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    pub id: i32,
    pub previous_status: Option<IncidentStatus>,
    pub new_status: IncidentStatus,
    pub changed_by_id: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<HistoryModel> for HistoryEntryResponse {
    fn from(model: HistoryModel) -> Self {
        Self {
            id: model.id,
            previous_status: model.previous_status,
            new_status: model.new_status,
            changed_by_id: model.changed_by_id,
            comment: model.comment,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub id: i32,
    pub file_name: String,
    pub storage_path: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<ImageModel> for ImageResponse {
    fn from(model: ImageModel) -> Self {
        Self {
            id: model.id,
            file_name: model.file_name,
            storage_path: model.storage_path,
            mime_type: model.mime_type,
            size_bytes: model.size_bytes,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncidentDetailResponse {
    #[serde(flatten)]
    pub incident: IncidentResponse,
    pub author: Option<UserSummary>,
    pub assignments: Vec<AssignmentResponse>,
    pub history: Vec<HistoryEntryResponse>,
    pub images: Vec<ImageResponse>,
}

fn check_title(title: &str, errors: &mut Vec<ValidationFieldError>) {
    if title.trim().is_empty() {
        errors.push(ValidationFieldError::new("title", "Title is required."));
    } else if title.chars().count() > MAX_SHORT_TEXT {
        errors.push(ValidationFieldError::new("title", "Title must be at most 255 characters."));
    }
}

fn check_short_text(field: &str, value: Option<&str>, errors: &mut Vec<ValidationFieldError>) {
    if value.is_some_and(|v| v.chars().count() > MAX_SHORT_TEXT) {
        errors.push(ValidationFieldError::new(field, "Must be at most 255 characters."));
    }
}
