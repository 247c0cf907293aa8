//! Typed request extractors that validate before a handler runs.
//!
//! [`ValidatedJson`] and [`ValidatedQuery`] deserialize the raw body or query
//! string into the loosely typed input of a [`Validate`] implementation,
//! which then checks ranges and cross-field rules. Every violation is
//! collected, so clients get the full list in one 400 response instead of
//! fixing fields one at a time.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Number, Value};
use utoipa::IntoParams;
use webhooked_core::{CorrelationLocation, HookFilter, NewHook, WebhookFilter};

use crate::error::{ApiError, ValidationIssue};

/// Builds a typed value from its deserialized request input.
pub trait Validate: Sized {
    /// Request shape as sent by the client, before range and cross-field
    /// checks.
    type Input: DeserializeOwned;

    /// Checks `input` and converts it, or returns every violation found.
    ///
    /// # Errors
    ///
    /// Returns the list of issues when `input` does not match the schema.
    fn validate(input: Self::Input) -> Result<Self, Vec<ValidationIssue>>;
}

/// JSON body extractor that runs [`Validate`].
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

/// Query string extractor that runs [`Validate`].
///
/// Query values arrive as strings; numeric fields are coerced.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let method = req.method().to_string();
        let url = req.uri().to_string();
        let reject =
            |issues| ApiError::SchemaValidation { issues, method: method.clone(), url: url.clone() };

        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            reject(vec![ValidationIssue::new("", format!("Unreadable body: {e}"))])
        })?;

        let object = match serde_json::from_slice::<Value>(&bytes) {
            Ok(object @ Value::Object(_)) => object,
            Ok(_) => return Err(reject(vec![ValidationIssue::new("", "Expected object")])),
            Err(e) => {
                return Err(reject(vec![ValidationIssue::new("", format!("Invalid JSON: {e}"))]))
            },
        };

        read_input::<T>(object).map(Self).map_err(reject)
    }
}

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: Validate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let reject = |issues| ApiError::SchemaValidation {
            issues,
            method: parts.method.to_string(),
            url: parts.uri.to_string(),
        };

        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| reject(vec![ValidationIssue::new("", e.body_text())]))?;

        let object: Map<String, Value> =
            pairs.into_iter().map(|(key, value)| (key, Value::String(value))).collect();

        read_input::<T>(Value::Object(object)).map(Self).map_err(reject)
    }
}

fn read_input<T: Validate>(object: Value) -> Result<T, Vec<ValidationIssue>> {
    let input = serde_json::from_value::<T::Input>(object)
        .map_err(|e| vec![ValidationIssue::new("", e.to_string())])?;
    T::validate(input)
}

/// One field of a request input.
///
/// Deserialization never fails on a type mismatch: a value of the wrong
/// JSON type lands in [`Field::Invalid`] so the issue can name the field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Field<T> {
    /// Key not present.
    #[serde(skip_deserializing)]
    Missing,
    /// Value of the expected type.
    Valid(T),
    /// Any other JSON value, `null` included.
    Invalid(Value),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Missing
    }
}

impl<T> Field<T> {
    fn required(self, path: &str, expected: &str, issues: &mut Issues) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Missing => {
                issues.push(path, "Required");
                None
            },
            Self::Invalid(other) => {
                issues.push(path, format!("Expected {expected}, received {}", type_name(&other)));
                None
            },
        }
    }

    /// Like [`Field::required`], but absent and `null` both mean `None`.
    fn optional(self, path: &str, expected: &str, issues: &mut Issues) -> Option<T> {
        match self {
            Self::Missing | Self::Invalid(Value::Null) => None,
            field => field.required(path, expected, issues),
        }
    }
}

/// Page bound as sent: a JSON number, or text from a query string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    /// JSON number.
    Number(Number),
    /// Text to be parsed.
    Text(String),
}

/// Issues collected while validating one input.
#[derive(Debug, Default)]
struct Issues(Vec<ValidationIssue>);

impl Issues {
    fn push(&mut self, path: &str, message: impl Into<String>) {
        self.0.push(ValidationIssue::new(path, message));
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// String length bounds, counted in characters.
    fn check_length(&mut self, path: &str, value: &str, min: usize, max: Option<usize>) {
        let len = value.chars().count();
        if len < min {
            self.push(path, format!("String must contain at least {min} character(s)"));
        }
        if let Some(max) = max {
            if len > max {
                self.push(path, format!("String must contain at most {max} character(s)"));
            }
        }
    }

    /// Integer within `min..=max`, or `default` when absent.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn integer(
        &mut self,
        path: &str,
        field: Field<Numeric>,
        (min, max): (u64, Option<u64>),
        default: u64,
    ) -> u64 {
        let parsed = match field {
            Field::Missing | Field::Invalid(Value::Null) => return default,
            Field::Valid(Numeric::Number(n)) => n.as_f64(),
            Field::Valid(Numeric::Text(s)) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        let Some(number) = parsed.filter(|n| n.is_finite()) else {
            self.push(path, "Expected number, received nan");
            return default;
        };
        if number.fract() != 0.0 {
            self.push(path, "Expected integer, received float");
            return default;
        }
        if number < min as f64 {
            self.push(path, format!("Number must be greater than or equal to {min}"));
            return default;
        }
        if let Some(max) = max {
            if number > max as f64 {
                self.push(path, format!("Number must be less than or equal to {max}"));
                return default;
            }
        }

        number as u64
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Vec<ValidationIssue>> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(self.0)
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Body of `POST /api/hooks`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewHookInput {
    /// Hook name.
    pub name: Field<String>,
    /// Free text description.
    pub description: Field<String>,
    /// `header` or `payload`.
    pub correlation_identifier_location: Field<CorrelationLocation>,
    /// Header name or JSONPath expression.
    pub correlation_identifier_field: Field<String>,
}

impl Validate for NewHook {
    type Input = NewHookInput;

    fn validate(input: NewHookInput) -> Result<Self, Vec<ValidationIssue>> {
        const LOCATION: &str = "correlation_identifier_location";
        const FIELD: &str = "correlation_identifier_field";

        let mut issues = Issues::default();

        let name = input.name.required("name", "string", &mut issues);
        if let Some(name) = &name {
            issues.check_length("name", name, 5, Some(30));
        }
        let description = input.description.required("description", "string", &mut issues);

        let location = match input.correlation_identifier_location {
            Field::Invalid(Value::String(s)) => {
                issues.push(
                    LOCATION,
                    format!("Invalid enum value. Expected 'header' | 'payload', received '{s}'"),
                );
                None
            },
            field => field.optional(LOCATION, "'header' | 'payload'", &mut issues),
        };
        let field = input
            .correlation_identifier_field
            .optional(FIELD, "string", &mut issues)
            .filter(|field| !field.is_empty());

        if issues.is_empty() {
            match (location, &field) {
                (Some(_), None) => issues.push(
                    FIELD,
                    "Correlation identifier field is required when location is provided.",
                ),
                (None, Some(_)) => issues.push(
                    FIELD,
                    "Correlation identifier field cannot be provided if location is not provided.",
                ),
                _ => {},
            }
        }

        issues.finish(|| Self {
            name: name.unwrap_or_default(),
            description: description.unwrap_or_default(),
            correlation_identifier_location: location,
            correlation_identifier_field: field,
        })
    }
}

/// Query of `GET /api/hooks`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct HookFilterQuery {
    /// Case-insensitive substring of the hook id.
    #[param(value_type = Option<String>)]
    pub id: Field<String>,
    /// Case-insensitive substring of the hook name.
    #[param(value_type = Option<String>, min_length = 1)]
    pub name: Field<String>,
    /// Page size, 1 to 1000. Defaults to 50.
    #[param(value_type = Option<u32>, minimum = 1, maximum = 1000)]
    pub limit: Field<Numeric>,
    /// Rows to skip. Defaults to 0.
    #[param(value_type = Option<u64>, minimum = 0)]
    pub offset: Field<Numeric>,
}

impl Validate for HookFilter {
    type Input = HookFilterQuery;

    fn validate(input: HookFilterQuery) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Issues::default();

        let limit = issues.integer(
            "limit",
            input.limit,
            (1, Some(u64::from(Self::MAX_LIMIT))),
            u64::from(Self::DEFAULT_LIMIT),
        );
        let offset = issues.integer("offset", input.offset, (0, None), 0);
        let id = input.id.optional("id", "string", &mut issues);
        let name = input.name.optional("name", "string", &mut issues);
        if let Some(name) = &name {
            issues.check_length("name", name, 1, None);
        }

        issues.finish(|| Self {
            id,
            name,
            limit: u32::try_from(limit).unwrap_or(Self::DEFAULT_LIMIT),
            offset,
        })
    }
}

/// Query of `GET /api/hooks/{id}/webhooks`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct WebhookFilterQuery {
    /// Case-insensitive prefix of the correlation value.
    #[param(value_type = Option<String>, min_length = 1)]
    pub search: Field<String>,
    /// Exact HTTP method. Empty means any.
    #[param(value_type = Option<String>)]
    pub method: Field<String>,
    /// Page size, 1 to 100. Defaults to 10.
    #[param(value_type = Option<u32>, minimum = 1, maximum = 100)]
    pub limit: Field<Numeric>,
    /// Rows to skip. Defaults to 0.
    #[param(value_type = Option<u64>, minimum = 0)]
    pub offset: Field<Numeric>,
}

impl Validate for WebhookFilter {
    type Input = WebhookFilterQuery;

    fn validate(input: WebhookFilterQuery) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Issues::default();

        let limit = issues.integer(
            "limit",
            input.limit,
            (1, Some(u64::from(Self::MAX_LIMIT))),
            u64::from(Self::DEFAULT_LIMIT),
        );
        let offset = issues.integer("offset", input.offset, (0, None), 0);
        let search = input.search.optional("search", "string", &mut issues);
        if let Some(search) = &search {
            issues.check_length("search", search, 1, None);
        }
        let method =
            input.method.optional("method", "string", &mut issues).filter(|m| !m.is_empty());

        issues.finish(|| Self {
            search,
            method,
            limit: u32::try_from(limit).unwrap_or(Self::DEFAULT_LIMIT),
            offset,
        })
    }
}
