pub mod auth;

pub use auth::{admin_guard, jwt_auth_middleware, AuthContext};
