use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::auth::{generate_jwt, Claims};
use crate::config;
use crate::database::models::User;
use crate::database::DatabaseManager;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login - verify a user row and issue the JWT consumed by the
/// protected routes. Stands in for an external identity provider.
pub async fn login(Json(payload): Json<LoginRequest>) -> Result<Json<Value>, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation_error("Email and password are required", None));
    }

    let pool = DatabaseManager::pool().await?;
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.trim())
        .fetch_optional(&pool)
        .await?;

    // Same response whether the email or the password was wrong
    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;
    if password_digest(&payload.password) != user.password_sha256 {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let claims = Claims::new(user.id, user.email.clone(), user.role);
    let token = generate_jwt(claims)?;
    let expires_in = config::config().security.jwt_expiry_hours * 3600;

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "user": user,
            "expires_in": expires_in
        }
    })))
}

fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex() {
        let d = password_digest("hunter2");
        assert_eq!(d.len(), 64);
        assert_eq!(d, password_digest("hunter2"));
        assert_ne!(d, password_digest("hunter3"));
    }
}
