use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::password;
use crate::state::AppState;
use crate::types::UserRow;

pub fn routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin")]
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub username: String,
    pub email: String,
    pub role: String,
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid username or password".to_string())
}

/// Verifies a username/password pair against the stored accounts.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let username = req.username.trim().to_string();
    if username.is_empty() || req.password.is_empty() {
        return Err(invalid_credentials());
    }

    let user = sqlx::query_as::<_, UserRow>(
        "SELECT username, email, password_hash, role FROM users WHERE username = ?",
    )
    .bind(&username)
    .fetch_optional(&state.db)
    .await?;

    // Unknown users go through argon2 too
    let hash = user.as_ref().map(|u| u.password_hash.clone());
    let plain = req.password;
    let verified =
        tokio::task::spawn_blocking(move || password::verify_account_password(&plain, hash.as_deref())).await?;

    match user {
        Some(user) if verified => {
            Ok(Json(LoginResponse { username: user.username, email: user.email, role: user.role }))
        }
        _ => {
            tracing::info!(%username, "login rejected");
            Err(invalid_credentials())
        }
    }
}
