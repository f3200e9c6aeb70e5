use axum::{extract::State, Extension, Json};
use browzai_types::{RequestContext, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub instructions: Option<String>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            instructions: user.instructions,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateInstructionsRequest {
    /// Blank or missing clears the instructions
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Current user, including custom instructions
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Signed-in user", body = ProfileResponse),
        (status = 401, description = "No authenticated session")
    ),
    tag = "profile"
)]
pub async fn get_profile(Extension(ctx): Extension<RequestContext>) -> ApiResult<Json<ProfileResponse>> {
    let user = ctx.require_user()?;
    Ok(Json(user.clone().into()))
}

/// Replace the custom instructions sent with every prompt
#[utoipa::path(
    put,
    path = "/api/me/instructions",
    request_body = UpdateInstructionsRequest,
    responses(
        (status = 200, description = "Instructions updated", body = ProfileResponse),
        (status = 401, description = "No authenticated session")
    ),
    tag = "profile"
)]
pub async fn update_instructions(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<UpdateInstructionsRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = ctx.require_user()?;

    let instructions = req
        .instructions
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty());

    let updated = state.identity.update_instructions(user, instructions).await?;
    tracing::info!(user_id = %updated.id, has_instructions = updated.instructions.is_some(), "Instructions updated");

    Ok(Json(updated.into()))
}
