//! Request and hook builders for tests.

use http::Method;
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Builder for hook creation bodies.
#[derive(Debug, Clone)]
pub struct HookBuilder {
    name: String,
    description: String,
    location: Option<String>,
    field: Option<String>,
}

impl HookBuilder {
    /// Creates a hook body with a unique name and no correlation.
    pub fn new() -> Self {
        Self {
            name: format!("hook-{}", &Uuid::new_v4().simple().to_string()[..8]),
            description: "Test hook".to_string(),
            location: None,
            field: None,
        }
    }

    /// Sets the hook name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Correlates on a request header.
    #[must_use]
    pub fn header_correlation(mut self, header: impl Into<String>) -> Self {
        self.location = Some("header".to_string());
        self.field = Some(header.into());
        self
    }

    /// Correlates on a JSONPath into the payload.
    #[must_use]
    pub fn payload_correlation(mut self, path: impl Into<String>) -> Self {
        self.location = Some("payload".to_string());
        self.field = Some(path.into());
        self
    }

    /// Sets the raw correlation pair, including invalid combinations.
    #[must_use]
    pub fn correlation(mut self, location: Option<&str>, field: Option<&str>) -> Self {
        self.location = location.map(str::to_string);
        self.field = field.map(str::to_string);
        self
    }

    /// Builds the JSON body.
    pub fn build(self) -> Value {
        let mut body = Map::new();
        body.insert("name".to_string(), json!(self.name));
        body.insert("description".to_string(), json!(self.description));
        if let Some(location) = self.location {
            body.insert("correlation_identifier_location".to_string(), json!(location));
        }
        if let Some(field) = self.field {
            body.insert("correlation_identifier_field".to_string(), json!(field));
        }
        Value::Object(body)
    }
}

impl Default for HookBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for requests sent through `TestEnv`.
#[derive(Debug, Clone)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Path and query
    pub uri: String,
    /// Headers in send order; repeats are kept
    pub headers: Vec<(String, String)>,
    /// Raw body
    pub body: Vec<u8>,
}

impl TestRequest {
    /// Creates a request without headers or body.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self { method, uri: uri.into(), headers: Vec::new(), body: Vec::new() }
    }

    /// Request for `TestEnv::receive`, which supplies the path.
    pub fn webhook(method: Method) -> Self {
        Self::new(method, "")
    }

    /// Appends a query parameter string such as `a=1&b=2`.
    #[must_use]
    pub fn query(mut self, query: &str) -> Self {
        let separator = if self.uri.contains('?') { '&' } else { '?' };
        self.uri = format!("{}{separator}{query}", self.uri);
        self
    }

    /// Adds a header; calling twice with the same name sends both values.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds the `x-api-key` header.
    #[must_use]
    pub fn api_key(self, key: &str) -> Self {
        self.header("x-api-key", key)
    }

    /// Sets a JSON body and content type.
    #[must_use]
    pub fn json(self, value: &Value) -> Self {
        self.header("content-type", "application/json").body(value.to_string())
    }

    /// Sets a raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}
