//! Captured webhook listing.

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{debug, instrument};
use webhooked_core::{HookId, PaginatedWebhooks, WebhookFilter};

use crate::{
    error::{ApiError, ErrorResponse},
    validation::{ValidatedQuery, WebhookFilterQuery},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/hooks/{hook_id}/webhooks",
    tag = "webhooks",
    params(("hook_id" = String, Path, description = "Hook id"), WebhookFilterQuery),
    responses(
        (status = 200, description = "One page of webhooks, newest first", body = PaginatedWebhooks),
        (status = 400, description = "Invalid filter parameters", body = ErrorResponse),
        (status = 404, description = "No hook with this id", body = ErrorResponse)
    )
)]
/// Lists one page of a hook's webhooks with the total match count.
///
/// # Errors
///
/// Returns 404 when the hook does not exist and 400 on invalid filter
/// parameters.
#[instrument(name = "list_webhooks", skip(state))]
pub async fn list_webhooks(
    State(state): State<AppState>,
    Path(hook_id): Path<String>,
    ValidatedQuery(filter): ValidatedQuery<WebhookFilter>,
) -> Result<Json<PaginatedWebhooks>, ApiError> {
    let hook_id = HookId::from(hook_id);

    if state.storage.hooks.find_by_id(&hook_id).await?.is_none() {
        return Err(ApiError::parent_hook_missing(&hook_id));
    }

    let page = state.storage.webhooks.find_by_filter(&hook_id, &filter).await?;

    debug!(returned = page.data.len(), total = page.total, "Webhooks listed");
    Ok(Json(page))
}
