pub mod common;
pub mod global_error;
pub mod incident;
pub mod user;

pub use common::PaginationResponse;
pub use global_error::{AppError, ErrorCode, ErrorKind};
