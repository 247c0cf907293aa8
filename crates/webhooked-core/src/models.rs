//! Core domain models and strongly-typed identifiers.
//!
//! Defines hooks, captured webhooks, listing filters and the newtype ID
//! wrappers that keep hook and webhook identifiers from being mixed up.
//! Includes the sqlx encode/decode glue for the TEXT-backed columns.

use std::{borrow::Cow, collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use utoipa::{
    openapi::{RefOr, Schema},
    PartialSchema, ToSchema,
};
use uuid::Uuid;

type PgDb = sqlx::Postgres;
type PgValueRef<'r> = sqlx::postgres::PgValueRef<'r>;
type PgTypeInfo = sqlx::postgres::PgTypeInfo;
type PgArgumentBuffer = sqlx::postgres::PgArgumentBuffer;
type EncodeResult =
    Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>;
type BoxDynError = sqlx::error::BoxDynError;

/// Strongly-typed hook identifier.
///
/// Hook ids are opaque strings of the form `hook-<uuid>`. Ids supplied by
/// clients in URLs are taken as-is; only `HookId::new` mints them.
///
/// # Example
///
/// ```
/// use webhooked_core::models::HookId;
/// let id = HookId::new();
/// assert!(id.as_str().starts_with("hook-"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(example = "hook-3f1c2a9e-8d4b-4e0a-9c51-2b7f6d0e4a18")]
pub struct HookId(pub String);

impl HookId {
    /// Prefix shared by every generated hook id.
    pub const PREFIX: &'static str = "hook-";

    /// Creates a new random hook ID.
    pub fn new() -> Self {
        Self(format!("{}{}", Self::PREFIX, Uuid::new_v4()))
    }

    /// Borrows the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for HookId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for HookId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl sqlx::Type<PgDb> for HookId {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for HookId {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        Ok(Self(<String as sqlx::Decode<PgDb>>::decode(value)?))
    }
}

impl sqlx::Encode<'_, PgDb> for HookId {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <String as sqlx::Encode<PgDb>>::encode_by_ref(&self.0, buf)
    }
}

/// Strongly-typed webhook identifier (`wh-<uuid>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(example = "wh-9b0e7c4d-1a2f-4c3b-8e5d-6f7a8b9c0d1e")]
pub struct WebhookId(pub String);

impl WebhookId {
    /// Prefix shared by every generated webhook id.
    pub const PREFIX: &'static str = "wh-";

    /// Creates a new random webhook ID.
    pub fn new() -> Self {
        Self(format!("{}{}", Self::PREFIX, Uuid::new_v4()))
    }

    /// Borrows the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WebhookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WebhookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for WebhookId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl sqlx::Type<PgDb> for WebhookId {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for WebhookId {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        Ok(Self(<String as sqlx::Decode<PgDb>>::decode(value)?))
    }
}

impl sqlx::Encode<'_, PgDb> for WebhookId {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <String as sqlx::Encode<PgDb>>::encode_by_ref(&self.0, buf)
    }
}

/// Where the correlation value of an inbound request is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationLocation {
    /// A request header, looked up case-insensitively.
    Header,
    /// A JSONPath expression evaluated against the JSON body.
    Payload,
}

impl CorrelationLocation {
    /// Storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Payload => "payload",
        }
    }
}

impl fmt::Display for CorrelationLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "header" => Ok(Self::Header),
            "payload" => Ok(Self::Payload),
            _ => Err(format!("invalid correlation location: {s}")),
        }
    }
}

impl sqlx::Type<PgDb> for CorrelationLocation {
    fn type_info() -> PgTypeInfo {
        <&str as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for CorrelationLocation {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <&str as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(s.parse::<Self>()?)
    }
}

impl sqlx::Encode<'_, PgDb> for CorrelationLocation {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <&str as sqlx::Encode<PgDb>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// A named hook configuration.
///
/// Hooks are immutable once created. When serialized, the derived
/// `hook_url` is emitted alongside the stored columns.
#[derive(Debug, Clone, PartialEq, Deserialize, sqlx::FromRow)]
pub struct Hook {
    /// Unique identifier (`hook-<uuid>`).
    pub id: HookId,

    /// Unique human-chosen name.
    pub name: String,

    /// Free text description.
    pub description: String,

    /// Where the correlation value is read from, if configured.
    pub correlation_identifier_location: Option<CorrelationLocation>,

    /// Header name or JSONPath expression. Present iff the location is.
    pub correlation_identifier_field: Option<String>,

    /// When the hook was created.
    pub created_at: DateTime<Utc>,
}

impl Hook {
    /// Relative URL that captures webhooks for this hook.
    pub fn hook_url(&self) -> String {
        receive_path(&self.id)
    }

    /// Configured correlation location and field, if both are set.
    pub fn correlation(&self) -> Option<(CorrelationLocation, &str)> {
        match (&self.correlation_identifier_location, &self.correlation_identifier_field) {
            (Some(location), Some(field)) => Some((*location, field.as_str())),
            _ => None,
        }
    }
}

/// Wire form of a [`Hook`]: the stored columns plus `hook_url`.
#[derive(Serialize, ToSchema)]
struct HookBody<'a> {
    #[schema(value_type = HookId)]
    id: &'a HookId,
    #[schema(value_type = String, min_length = 5, max_length = 30)]
    name: &'a str,
    #[schema(value_type = String)]
    description: &'a str,
    correlation_identifier_location: Option<CorrelationLocation>,
    #[schema(value_type = Option<String>)]
    correlation_identifier_field: Option<&'a str>,
    created_at: DateTime<Utc>,
    /// Relative URL that captures webhooks for this hook.
    #[schema(example = "/api/hooks/hook-3f1c2a9e-8d4b-4e0a-9c51-2b7f6d0e4a18/webhooks/receive")]
    hook_url: String,
}

impl<'a> From<&'a Hook> for HookBody<'a> {
    fn from(hook: &'a Hook) -> Self {
        Self {
            id: &hook.id,
            name: &hook.name,
            description: &hook.description,
            correlation_identifier_location: hook.correlation_identifier_location,
            correlation_identifier_field: hook.correlation_identifier_field.as_deref(),
            created_at: hook.created_at,
            hook_url: hook.hook_url(),
        }
    }
}

impl Serialize for Hook {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        HookBody::from(self).serialize(serializer)
    }
}

impl PartialSchema for Hook {
    fn schema() -> RefOr<Schema> {
        HookBody::schema()
    }
}

impl ToSchema for Hook {
    fn name() -> Cow<'static, str> {
        Cow::Borrowed("Hook")
    }

    fn schemas(schemas: &mut Vec<(String, RefOr<Schema>)>) {
        HookBody::schemas(schemas);
    }
}

/// Path of the receive endpoint for a hook.
pub fn receive_path(hook_id: &HookId) -> String {
    format!("/api/hooks/{hook_id}/webhooks/receive")
}

/// Validated input for creating a hook.
#[derive(Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct NewHook {
    /// Unique hook name.
    #[schema(min_length = 5, max_length = 30, example = "orders-hook")]
    pub name: String,
    /// Free text description.
    pub description: String,
    /// Correlation location, if any.
    pub correlation_identifier_location: Option<CorrelationLocation>,
    /// Correlation field, if any. Required with a location, rejected
    /// without one.
    #[schema(example = "X-Order-Id")]
    pub correlation_identifier_field: Option<String>,
}

/// A captured inbound HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Webhook {
    /// Unique identifier (`wh-<uuid>`).
    pub id: WebhookId,
    /// Owning hook.
    pub hook_id: HookId,
    /// HTTP method of the inbound request.
    pub method: String,
    /// Query parameters. Repeated keys hold an array of strings.
    #[schema(value_type = Object)]
    pub query: Map<String, Value>,
    /// JSON body, `{}` when none was sent.
    #[schema(value_type = Object)]
    pub payload: Map<String, Value>,
    /// Lower-cased header names to their values.
    pub headers: BTreeMap<String, String>,
    /// Extracted correlation value.
    pub correlation_value: Option<String>,
    /// When the webhook was stored.
    pub created_at: DateTime<Utc>,
}

/// Normalized inbound request ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWebhook {
    /// Owning hook; must exist.
    pub hook_id: HookId,
    /// HTTP method.
    pub method: String,
    /// Query parameters.
    pub query: Map<String, Value>,
    /// JSON body.
    pub payload: Map<String, Value>,
    /// Captured headers.
    pub headers: BTreeMap<String, String>,
    /// Extracted correlation value.
    pub correlation_value: Option<String>,
}

/// Acknowledgement returned to the sender of a webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct WebhookSavedResponse {
    /// Id of the stored webhook.
    pub id: WebhookId,
    /// Hook it was captured under.
    pub hook_id: HookId,
    /// Extracted correlation value.
    pub correlation_value: Option<String>,
    /// When it was stored.
    pub created_at: DateTime<Utc>,
}

impl From<&Webhook> for WebhookSavedResponse {
    fn from(webhook: &Webhook) -> Self {
        Self {
            id: webhook.id.clone(),
            hook_id: webhook.hook_id.clone(),
            correlation_value: webhook.correlation_value.clone(),
            created_at: webhook.created_at,
        }
    }
}

/// Filter and page parameters for listing hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFilter {
    /// Case-insensitive substring of the hook id.
    pub id: Option<String>,
    /// Case-insensitive substring of the hook name.
    pub name: Option<String>,
    /// Page size, within `1..=MAX_LIMIT`.
    pub limit: u32,
    /// Rows to skip.
    pub offset: u64,
}

impl HookFilter {
    /// Page size used when none is requested.
    pub const DEFAULT_LIMIT: u32 = 50;
    /// Largest accepted page size.
    pub const MAX_LIMIT: u32 = 1000;

    /// Creates a filter with the limit clamped into range.
    pub fn new(limit: u32, offset: u64) -> Self {
        Self { id: None, name: None, limit: limit.clamp(1, Self::MAX_LIMIT), offset }
    }

    /// Restricts to ids containing `id`.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Restricts to names containing `name`.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Limit after clamping, for stores that receive hand-built filters.
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, Self::MAX_LIMIT)
    }
}

impl Default for HookFilter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, 0)
    }
}

/// Filter and page parameters for listing the webhooks of one hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookFilter {
    /// Case-insensitive prefix of the correlation value.
    pub search: Option<String>,
    /// Exact HTTP method.
    pub method: Option<String>,
    /// Page size, within `1..=MAX_LIMIT`.
    pub limit: u32,
    /// Rows to skip.
    pub offset: u64,
}

impl WebhookFilter {
    /// Page size used when none is requested.
    pub const DEFAULT_LIMIT: u32 = 10;
    /// Largest accepted page size.
    pub const MAX_LIMIT: u32 = 100;

    /// Creates a filter with the limit clamped into range.
    pub fn new(limit: u32, offset: u64) -> Self {
        Self { search: None, method: None, limit: limit.clamp(1, Self::MAX_LIMIT), offset }
    }

    /// Restricts to correlation values starting with `search`.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Restricts to one HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Limit after clamping, for stores that receive hand-built filters.
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, Self::MAX_LIMIT)
    }
}

impl Default for WebhookFilter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, 0)
    }
}

/// One page of webhooks plus the unpaginated match count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaginatedWebhooks {
    /// Webhooks on this page, newest first.
    pub data: Vec<Webhook>,
    /// Page size that was applied.
    pub limit: u32,
    /// Offset that was applied.
    pub offset: u64,
    /// Rows matching the filter, ignoring limit and offset.
    pub total: u64,
}
