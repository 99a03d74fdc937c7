use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::warn;

use super::AppState;
use crate::database::record::Record;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::schema;
use crate::section::ALL_FILTER;
use crate::settings::RecruitmentFlag;
use crate::store;

#[derive(Debug, Default, Deserialize)]
pub struct ContentParams {
    pub category: Option<String>,
}

/// GET /api/content/:collection - published rows in display order
pub async fn content_get(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<ContentParams>,
) -> ApiResult<Vec<Record>> {
    let spec = schema::collection(&collection)
        .ok_or_else(|| ApiError::not_found(format!("Unknown collection '{}'", collection)))?;

    let mut query = store::Query::new().order_by(spec.order_by);
    if let Some(category) = params.category.filter(|c| !c.is_empty() && c != ALL_FILTER) {
        let key = spec
            .filter_by
            .ok_or_else(|| ApiError::bad_request(format!("'{}' has no category filter", collection)))?;
        query = query.eq(key, category);
    }

    let records = state.store.select(spec.table, &query).await?;
    Ok(ApiResponse::success(records))
}

/// GET /api/settings/recruitment - falls back to the last known value when the backend is down
pub async fn recruitment_get(State(state): State<AppState>) -> ApiResult<RecruitmentFlag> {
    let flag = match state.settings.refresh().await {
        Ok(flag) => flag,
        Err(e) => {
            warn!("Reading recruitment flag failed: {}", e);
            state.settings.get()
        }
    };
    Ok(ApiResponse::success(flag))
}
