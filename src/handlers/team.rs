use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::auth::Session;
use crate::middleware::{ApiResponse, ApiResult};
use crate::team::{NewMember, TeamView};
use crate::types::Role;

/// Body of POST /api/admin/team. Not `Debug`: it carries a password.
#[derive(Deserialize)]
pub struct AddMemberBody {
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Editor
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
    pub role: Role,
}

/// GET /api/admin/team
pub async fn team_get(State(state): State<AppState>, Extension(session): Extension<Session>) -> ApiResult<TeamView> {
    let team = state.shell(session)?.open_team().await?;
    Ok(ApiResponse::success(team.view()))
}

/// POST /api/admin/team - grant access to an existing user or create the account
pub async fn team_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(body): Json<AddMemberBody>,
) -> ApiResult<Value> {
    let mut team = state.shell(session)?.open_team().await?;
    let member = NewMember { email: body.email, password: body.password, role: body.role };
    let id = team.add_member(member).await?;
    Ok(ApiResponse::created(json!({ "id": id, "team": team.view() })))
}

/// PATCH /api/admin/team/:id
pub async fn member_patch(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(body): Json<RoleBody>,
) -> ApiResult<TeamView> {
    let mut team = state.shell(session)?.open_team().await?;
    team.change_role(&id, body.role).await?;
    Ok(ApiResponse::success(team.view()))
}

/// DELETE /api/admin/team/:id - removes the account as well
pub async fn member_delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<TeamView> {
    let mut team = state.shell(session)?.open_team().await?;
    team.request_removal(&id)?;
    team.confirm_removal().await?;
    Ok(ApiResponse::success(team.view()))
}
