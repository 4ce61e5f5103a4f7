// Per-request parameter validation

use crate::config::ValidatorConfig;
use crate::errors::{ErrorResponse, ValidationError};
use crate::params::{ParamSet, ParameterSpec, SourceKind};
use crate::source::RawValueProvider;
use crate::types::{ScalarKind, TypeDescriptor, type_check};
use crate::value::{Attachment, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Turns a failure message into a response body and status code.
pub type ErrorFormatter = Arc<dyn Fn(&str) -> (serde_json::Value, u16) + Send + Sync>;

/// Validated arguments, in declaration order.
///
/// Optional parameters that were not supplied are kept as absent entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedParams {
    values: Vec<(String, Option<Value>)>,
}

impl ValidatedParams {
    fn insert(&mut self, name: &str, value: Option<Value>) {
        self.values.push((name.to_string(), value));
    }

    /// Value of a present parameter
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Whether the parameter was declared (present or absent)
    pub fn contains(&self, name: &str) -> bool {
        self.values.iter().any(|(n, _)| n == name)
    }

    /// Whether the parameter resolved to a value
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_list(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_list)
    }

    pub fn get_dict(&self, name: &str) -> Option<&BTreeMap<String, Value>> {
        self.get(name).and_then(Value::as_dict)
    }

    pub fn files(&self, name: &str) -> Option<&[Attachment]> {
        self.get(name).and_then(Value::as_files)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    /// Consume into owned entries
    pub fn into_entries(self) -> Vec<(String, Option<Value>)> {
        self.values
    }

    /// Render as a JSON object; absent parameters become `null`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(n, v)| {
                    let json = v.as_ref().map(Value::to_json).unwrap_or_default();
                    (n.clone(), json)
                })
                .collect(),
        )
    }
}

/// Result of validating one request
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Success(ValidatedParams),
    Failure(ErrorResponse),
}

impl ValidationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationOutcome::Success(_))
    }

    pub fn into_result(self) -> Result<ValidatedParams, ErrorResponse> {
        match self {
            ValidationOutcome::Success(params) => Ok(params),
            ValidationOutcome::Failure(response) => Err(response),
        }
    }
}

/// Validates request inputs against a [`ParamSet`].
///
/// Fields are processed in declaration order and the first failing field is
/// the only error reported. The validator holds no per-request state and
/// can be shared between threads.
#[derive(Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
    formatter: Option<ErrorFormatter>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .field("custom_formatter", &self.formatter.is_some())
            .finish()
    }
}

impl Validator {
    /// Validator with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::default()
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Run the pipeline and return the first field error, if any.
    pub fn check<P>(&self, params: &ParamSet, inputs: &P) -> Result<ValidatedParams, ValidationError>
    where
        P: RawValueProvider + ?Sized,
    {
        let mut validated = ValidatedParams::default();
        for (name, spec) in params.iter() {
            let value = validate_field(name, spec, inputs)?;
            validated.insert(name, value);
        }
        Ok(validated)
    }

    /// Run the pipeline and render failures through the error formatter.
    pub fn validate<P>(&self, params: &ParamSet, inputs: &P) -> ValidationOutcome
    where
        P: RawValueProvider + ?Sized,
    {
        match self.check(params, inputs) {
            Ok(validated) => ValidationOutcome::Success(validated),
            Err(error) => {
                if self.config.log_failures {
                    debug!(
                        source = %error.source_kind(),
                        field = error.field(),
                        constraint = error.constraint(),
                        "Request parameter validation failed"
                    );
                }
                ValidationOutcome::Failure(self.format_error(&error))
            }
        }
    }

    /// Invoke `handler` with the validated arguments, or return the
    /// formatted failure without calling it.
    pub fn handle<P, F, R>(&self, params: &ParamSet, inputs: &P, handler: F) -> Result<R, ErrorResponse>
    where
        P: RawValueProvider + ?Sized,
        F: FnOnce(ValidatedParams) -> R,
    {
        self.validate(params, inputs).into_result().map(handler)
    }

    /// Render a validation error with the configured formatter
    pub fn format_error(&self, error: &ValidationError) -> ErrorResponse {
        let message = error.message();
        let (body, status) = match &self.formatter {
            Some(formatter) => formatter(&message),
            None => self.default_error(&message),
        };
        ErrorResponse::new(message, status, body)
    }

    fn default_error(&self, message: &str) -> (serde_json::Value, u16) {
        let mut body = serde_json::Map::new();
        body.insert(
            self.config.error_key.clone(),
            serde_json::Value::String(message.to_string()),
        );
        (serde_json::Value::Object(body), self.config.failure_status)
    }
}

/// Builder for [`Validator`]
#[derive(Default)]
pub struct ValidatorBuilder {
    config: ValidatorConfig,
    formatter: Option<ErrorFormatter>,
}

impl ValidatorBuilder {
    /// Use the given configuration
    pub fn config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default `{"error": message}` / 400 rendering
    pub fn error_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&str) -> (serde_json::Value, u16) + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn build(self) -> Validator {
        Validator {
            config: self.config,
            formatter: self.formatter,
        }
    }
}

fn validate_field<P>(
    name: &str,
    spec: &ParameterSpec,
    inputs: &P,
) -> Result<Option<Value>, ValidationError>
where
    P: RawValueProvider + ?Sized,
{
    let source_kind = spec.source_kind();
    let wire_name = spec.lookup_name(name);

    let raw = match source_kind {
        SourceKind::File => resolve_files(inputs.files(name)),
        _ => inputs
            .lookup(source_kind, wire_name)
            .filter(|v| !matches!(v, Value::Null))
            .cloned(),
    };

    let value = match (raw, spec.default_value()) {
        (Some(raw), _) => {
            let value = coerce(raw, spec.annotation(), source_kind, wire_name)?;
            if source_kind != SourceKind::File && !type_check(&value, spec.annotation()) {
                return Err(ValidationError::TypeMismatch {
                    source_kind,
                    name: wire_name.to_string(),
                    expected: spec.annotation().to_string(),
                    found: value.kind_name(),
                });
            }
            value
        }
        // Defaults were checked against the annotation when the spec was built.
        (None, Some(default)) => default.clone(),
        (None, None) if spec.is_optional() => {
            trace!(param = name, "Optional parameter absent");
            return Ok(None);
        }
        (None, None) => {
            return Err(ValidationError::Missing {
                source_kind,
                name: wire_name.to_string(),
            });
        }
    };

    for rule in spec.rules() {
        if !rule.is_valid(&value) {
            return Err(ValidationError::RuleViolation {
                source_kind,
                name: wire_name.to_string(),
                rule: rule.name().to_string(),
                message: rule.violation_message(),
            });
        }
    }

    debug!(param = name, source = %source_kind, "Parameter accepted");
    Ok(Some(value))
}

/// An empty upload, or a single attachment without a filename, is absent.
fn resolve_files(files: Option<&[Attachment]>) -> Option<Value> {
    match files {
        None | Some([]) => None,
        Some([only]) if only.filename.is_empty() => None,
        Some(files) => Some(Value::Files(files.to_vec())),
    }
}

/// Convert raw text from a text-bearing source to the annotation's first
/// scalar choice. Other values pass through unchanged.
fn coerce(
    value: Value,
    annotation: &TypeDescriptor,
    source_kind: SourceKind,
    name: &str,
) -> Result<Value, ValidationError> {
    if !source_kind.is_text_bearing() {
        return Ok(value);
    }
    let Value::Str(text) = value else {
        return Ok(value);
    };
    let target = match annotation.first_choice() {
        TypeDescriptor::Scalar(kind) if *kind != ScalarKind::Str => *kind,
        _ => return Ok(Value::Str(text)),
    };

    match parse_scalar(&text, target) {
        Some(converted) => {
            trace!(param = name, target = target.as_str(), "Coerced text parameter");
            Ok(converted)
        }
        None => Err(ValidationError::Conversion {
            source_kind,
            name: name.to_string(),
            target,
            raw: text,
        }),
    }
}

fn parse_scalar(text: &str, kind: ScalarKind) -> Option<Value> {
    match kind {
        ScalarKind::Int => text.parse::<i64>().ok().map(Value::Int),
        ScalarKind::Float => text
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float),
        ScalarKind::Bool => {
            if text.eq_ignore_ascii_case("true") {
                Some(Value::Bool(true))
            } else if text.eq_ignore_ascii_case("false") {
                Some(Value::Bool(false))
            } else {
                None
            }
        }
        ScalarKind::Str => Some(Value::Str(text.to_string())),
    }
}
