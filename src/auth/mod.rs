pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, JwtUtils, TokenVerifyResult};
pub use middleware::AuthMiddleware;
