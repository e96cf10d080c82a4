pub mod directory;
pub mod incident;
pub mod user;
