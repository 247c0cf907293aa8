//! OpenAPI document for the HTTP API, served with Swagger UI at `/docs`.

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use webhooked_core::{
    CorrelationLocation, Hook, HookId, NewHook, PaginatedWebhooks, Webhook, WebhookId,
    WebhookSavedResponse,
};

use crate::{
    error::{ErrorResponse, ValidationDetails, ValidationIssue},
    handlers::{
        health::{
            self, ComponentHealth, ComponentStatus, LivenessResponse, ReadinessResponse,
            ReadinessStatus,
        },
        hooks, receive, webhooks,
    },
    middleware::auth::API_KEY_HEADER,
};

/// Path of the Swagger UI.
pub const DOCS_PATH: &str = "/docs";

/// Path of the raw OpenAPI JSON document.
pub const OPENAPI_JSON_PATH: &str = "/api/openapi.json";

/// OpenAPI document covering every route.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Webhooked",
        description = "Register hooks, capture the webhooks sent to them and query them back"
    ),
    paths(
        health::liveness,
        health::readiness,
        hooks::create_hook,
        hooks::list_hooks,
        hooks::get_hook,
        webhooks::list_webhooks,
        receive::receive_webhook
    ),
    components(schemas(
        HookId,
        WebhookId,
        CorrelationLocation,
        Hook,
        NewHook,
        Webhook,
        WebhookSavedResponse,
        PaginatedWebhooks,
        ErrorResponse,
        ValidationDetails,
        ValidationIssue,
        LivenessResponse,
        ReadinessResponse,
        ReadinessStatus,
        ComponentHealth,
        ComponentStatus
    )),
    modifiers(&ApiKeyScheme),
    tags(
        (name = "healthcheck", description = "Service healthcheck endpoints"),
        (name = "hooks", description = "Hook management endpoints"),
        (name = "webhooks", description = "Webhook capture and listing endpoints")
    )
)]
pub struct ApiDoc;

/// Registers the `api_key` scheme referenced by hook creation.
struct ApiKeyScheme;

impl Modify for ApiKeyScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();

        let mut paths: Vec<&String> = doc["paths"].as_object().unwrap().keys().collect();
        paths.sort();
        assert_eq!(paths, [
            "/api/healthcheck/liveness",
            "/api/healthcheck/readiness",
            "/api/hooks",
            "/api/hooks/{hook_id}/webhooks",
            "/api/hooks/{hook_id}/webhooks/receive",
            "/api/hooks/{id}",
        ]);
    }

    #[test]
    fn receive_documents_every_method() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let receive = &doc["paths"]["/api/hooks/{hook_id}/webhooks/receive"];

        for method in ["get", "post", "put", "patch", "delete", "head"] {
            assert!(receive[method].is_object(), "{method}");
        }
    }

    #[test]
    fn hook_creation_requires_the_api_key() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();

        assert_eq!(doc["components"]["securitySchemes"]["api_key"], serde_json::json!({
            "type": "apiKey",
            "in": "header",
            "name": "x-api-key",
        }));
        assert_eq!(
            doc["paths"]["/api/hooks"]["post"]["security"],
            serde_json::json!([{"api_key": []}])
        );
        assert!(doc["paths"]["/api/hooks"]["get"].get("security").is_none());
    }
}
