// Raw request values, as extracted by the transport layer

use crate::params::SourceKind;
use crate::value::{Attachment, Value};
use std::collections::HashMap;

/// Named lookup of raw values per source.
///
/// Implemented by the integrating layer over whatever request type it has.
/// Attachments must stay alive for the duration of a validator call.
pub trait RawValueProvider {
    /// Single value for `key` in a `Route`, `Query`, `Form`, `Json` or
    /// `Header` source. `File` lookups go through [`RawValueProvider::files`].
    fn lookup(&self, source: SourceKind, key: &str) -> Option<&Value>;

    /// Attachments uploaded under form field `name`
    fn files(&self, name: &str) -> Option<&[Attachment]>;
}

/// Owned raw request inputs.
///
/// Header names are matched case-insensitively. A JSON body that is not an
/// object yields no values.
#[derive(Debug, Clone, Default)]
pub struct RequestInputs {
    route: HashMap<String, Value>,
    query: HashMap<String, Value>,
    form: HashMap<String, Value>,
    headers: HashMap<String, Value>,
    json: Option<Value>,
    files: HashMap<String, Vec<Attachment>>,
}

impl RequestInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path parameter
    pub fn with_route(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.route.insert(key.into(), Value::Str(value.into()));
        self
    }

    /// Add a query string parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), Value::Str(value.into()));
        self
    }

    /// Add a form field
    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(key.into(), Value::Str(value.into()));
        self
    }

    /// Add a header
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), Value::Str(value.into()));
        self
    }

    /// Set the parsed JSON body
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.json = Some(Value::from_json(body));
        self
    }

    /// Parse and set the JSON body from raw bytes
    pub fn with_json_bytes(self, body: &[u8]) -> Result<Self, serde_json::Error> {
        let parsed: serde_json::Value = serde_json::from_slice(body)?;
        Ok(self.with_json(parsed))
    }

    /// Add an uploaded attachment under a form field
    pub fn with_file(mut self, name: impl Into<String>, file: Attachment) -> Self {
        self.files.entry(name.into()).or_default().push(file);
        self
    }

    /// Replace all path parameters
    pub fn route_params(mut self, params: HashMap<String, String>) -> Self {
        self.route = into_text_map(params);
        self
    }

    /// Replace all query parameters
    pub fn query_params(mut self, params: HashMap<String, String>) -> Self {
        self.query = into_text_map(params);
        self
    }

    /// Replace all form fields
    pub fn form_fields(mut self, fields: HashMap<String, String>) -> Self {
        self.form = into_text_map(fields);
        self
    }

    /// Replace all headers
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), Value::Str(v)))
            .collect();
        self
    }
}

fn into_text_map(map: HashMap<String, String>) -> HashMap<String, Value> {
    map.into_iter().map(|(k, v)| (k, Value::Str(v))).collect()
}

impl RawValueProvider for RequestInputs {
    fn lookup(&self, source: SourceKind, key: &str) -> Option<&Value> {
        match source {
            SourceKind::Route => self.route.get(key),
            SourceKind::Query => self.query.get(key),
            SourceKind::Form => self.form.get(key),
            SourceKind::Header => self.headers.get(&key.to_ascii_lowercase()),
            SourceKind::Json => match &self.json {
                Some(Value::Dict(body)) => body.get(key),
                _ => None,
            },
            SourceKind::File => None,
        }
    }

    fn files(&self, name: &str) -> Option<&[Attachment]> {
        self.files.get(name).map(Vec::as_slice)
    }
}
