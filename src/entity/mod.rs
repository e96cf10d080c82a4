pub mod incident;
pub mod incident_assignment;
pub mod incident_image;
pub mod incident_status_history;
pub mod user;
