//! Authentication endpoints.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth;
use crate::models::{LoginInput, LoginResponse, RegisterInput, User};

/// `POST /api/auth/register` — create an account.
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(input): Json<RegisterInput>,
) -> Result<Json<User>, ApiError> {
    let conn = ctx.db()?;
    let user = auth::register(&conn, &ctx.auth, &input)?;
    Ok(Json(user))
}

/// `POST /api/auth/login` — exchange credentials for a bearer token.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(input): Json<LoginInput>,
) -> Result<Json<LoginResponse>, ApiError> {
    let conn = ctx.db()?;
    let resp = auth::login(&conn, &ctx.auth, &input)?;
    Ok(Json(resp))
}
