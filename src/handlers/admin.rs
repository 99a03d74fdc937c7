use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::AppState;
use crate::auth::Session;
use crate::database::record::{is_system_field, Record};
use crate::editor::{upload_image_file, UploadFile};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::section::{SaveKind, SectionView};
use crate::settings::RecruitmentFlag;

#[derive(Debug, Default, Deserialize)]
pub struct SectionParams {
    pub filter: Option<String>,
}

/// GET /api/admin/tabs - tab bar for the signed-in role
pub async fn tabs_get(State(state): State<AppState>, Extension(session): Extension<Session>) -> ApiResult<Value> {
    let shell = state.shell(session)?;
    Ok(ApiResponse::success(json!({
        "role": shell.role(),
        "tabs": shell.visible_tabs(),
        "recruitment": shell.recruitment(),
    })))
}

/// GET /api/admin/sections/:collection - a load failure still renders, with a notice
pub async fn section_get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(collection): Path<String>,
    Query(params): Query<SectionParams>,
) -> ApiResult<SectionView> {
    let shell = state.shell(session)?;
    let mut section = shell.section_for(&collection)?;
    if let Err(e) = section.load().await {
        warn!("Section {} rendered without data: {}", collection, e);
    }
    if let Some(filter) = params.filter.as_deref() {
        section.set_filter(filter)?;
    }
    Ok(ApiResponse::success(section.view()))
}

/// POST /api/admin/sections/:collection - save a draft; `id` present means update
pub async fn section_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<SectionView> {
    let Value::Object(fields) = body else {
        return Err(ApiError::bad_request("Expected a JSON object"));
    };

    let shell = state.shell(session)?;
    let mut section = shell.section_for(&collection)?;
    section.load().await?;

    // Same insert-vs-update rule as the section itself
    match Record::from_map(fields.clone()).id() {
        Some(id) => section.edit(&id)?,
        None => section.add()?,
    }

    let editor = section
        .editor_mut()
        .ok_or_else(|| ApiError::internal_server_error("Editor did not open"))?;
    for (key, value) in fields {
        if is_system_field(&key) {
            continue;
        }
        editor.set_value(&key, value)?;
    }

    let kind = section.save().await?;
    debug!("Saved draft in {} ({:?})", collection, kind);
    let view = section.view();
    Ok(match kind {
        SaveKind::Inserted => ApiResponse::created(view),
        SaveKind::Updated => ApiResponse::success(view),
    })
}

/// DELETE /api/admin/sections/:collection/:id
pub async fn section_delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<SectionView> {
    let shell = state.shell(session)?;
    let mut section = shell.section_for(&collection)?;
    section.load().await?;
    section.request_delete(&id)?;
    section.confirm_delete().await?;
    Ok(ApiResponse::success(section.view()))
}

/// POST /api/admin/uploads/:filename - raw image bytes in the body
pub async fn upload_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(filename): Path<String>,
    body: Bytes,
) -> ApiResult<Value> {
    debug!("{} uploading {} ({} bytes)", session.user_id, filename, body.len());
    let file = UploadFile::new(filename, body.to_vec());
    let url = upload_image_file(state.blobs.as_ref(), &state.upload, &file).await?;
    Ok(ApiResponse::created(json!({ "url": url })))
}

/// PUT /api/admin/settings/recruitment
pub async fn recruitment_put(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(flag): Json<RecruitmentFlag>,
) -> ApiResult<RecruitmentFlag> {
    let shell = state.shell(session)?;
    Ok(ApiResponse::success(shell.set_recruitment(flag).await?))
}
