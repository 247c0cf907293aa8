//! Hook management handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info, instrument};
use webhooked_core::{Hook, HookFilter, HookId, NewHook};

use crate::{
    error::{ApiError, ErrorResponse},
    validation::{HookFilterQuery, ValidatedJson, ValidatedQuery},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/hooks",
    tag = "hooks",
    request_body = NewHook,
    security(("api_key" = [])),
    responses(
        (status = 201, description = "Hook created", body = Hook),
        (status = 400, description = "Body failed validation", body = ErrorResponse),
        (status = 401, description = "Missing or wrong API key", body = ErrorResponse),
        (status = 500, description = "Storage failure, including a duplicate name", body = ErrorResponse)
    )
)]
/// Creates a hook. Guarded by the API key middleware.
///
/// # Errors
///
/// Returns 400 on schema violations and 500 when storage fails, including
/// a duplicate name.
#[instrument(name = "create_hook", skip(state, hook), fields(name = %hook.name))]
pub async fn create_hook(
    State(state): State<AppState>,
    ValidatedJson(hook): ValidatedJson<NewHook>,
) -> Result<Response, ApiError> {
    let created = state.storage.hooks.create(hook).await?;

    info!(hook_id = %created.id, "Hook created");
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/hooks",
    tag = "hooks",
    params(HookFilterQuery),
    responses(
        (status = 200, description = "Matching hooks, newest first", body = [Hook]),
        (status = 400, description = "Invalid filter parameters", body = ErrorResponse)
    )
)]
/// Lists hooks, newest first.
///
/// # Errors
///
/// Returns 400 on invalid filter parameters.
#[instrument(name = "list_hooks", skip(state))]
pub async fn list_hooks(
    State(state): State<AppState>,
    ValidatedQuery(filter): ValidatedQuery<HookFilter>,
) -> Result<Json<Vec<Hook>>, ApiError> {
    let hooks = state.storage.hooks.find_by_filter(&filter).await?;

    debug!(count = hooks.len(), "Hooks listed");
    Ok(Json(hooks))
}

#[utoipa::path(
    get,
    path = "/api/hooks/{id}",
    tag = "hooks",
    params(("id" = String, Path, description = "Hook id")),
    responses(
        (status = 200, description = "The hook", body = Hook),
        (status = 404, description = "No hook with this id", body = ErrorResponse)
    )
)]
/// Fetches one hook.
///
/// # Errors
///
/// Returns 404 when the hook does not exist.
#[instrument(name = "get_hook", skip(state))]
pub async fn get_hook(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Hook>, ApiError> {
    let hook_id = HookId::from(id);

    state.storage.hooks.find_by_id(&hook_id).await?.map(Json).ok_or_else(ApiError::hook_not_found)
}
