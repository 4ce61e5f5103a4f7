// Validation errors

use crate::params::SourceKind;
use crate::types::ScalarKind;
use thiserror::Error;

/// Result type for parameter registration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while building parameter specifications.
///
/// These are programmer mistakes: registration should abort, they are never
/// turned into a request-time response.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// Annotation is not acceptable for the parameter's source
    #[error("\"annotation\" is invalid for {}: {annotation} ({reason})", source_label(.source_kind))]
    InvalidAnnotation {
        source_kind: Option<SourceKind>,
        annotation: String,
        reason: String,
    },

    /// Default value does not satisfy the annotation
    #[error("\"default\" {default} is not matched with \"annotation\" {annotation}")]
    InvalidDefault { default: String, annotation: String },

    /// Rule cannot apply to the annotation's origin type
    #[error("Rule \"{rule}\" is invalid for {origin}. This rule's annotation must be in {allowed}")]
    InvalidRuleAnnotation {
        rule: String,
        origin: String,
        allowed: String,
    },

    /// Rule was constructed with an unusable parameter
    #[error("Rule \"{rule}\" has an invalid parameter: {reason}")]
    InvalidRuleParameter { rule: String, reason: String },

    /// Header wire name is empty
    #[error("\"header_name\" must be a non-empty string")]
    InvalidHeaderName,

    /// Wire name given for a source that is always looked up by argument name
    #[error("{0} parameters do not support an explicit wire name")]
    UnsupportedWireName(SourceKind),

    /// Union declared without members
    #[error("union annotation must have at least one member")]
    EmptyUnion,

    /// Same argument name registered twice
    #[error("parameter '{0}' is declared more than once")]
    DuplicateParameter(String),

    /// Argument name is empty
    #[error("parameter name must not be empty")]
    InvalidParameterName,
}

impl ConfigError {
    /// Create an invalid rule parameter error
    pub fn rule_parameter(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRuleParameter {
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}

fn source_label(source_kind: &Option<SourceKind>) -> &'static str {
    source_kind.map(|s| s.as_str()).unwrap_or("parameter")
}

/// Request-time validation failure for a single field.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// Required parameter absent and no default
    #[error("Required {source_kind} parameter, '{name}' not given.")]
    Missing { source_kind: SourceKind, name: String },

    /// Text could not be converted to the declared scalar
    #[error("In {source_kind}, '{name}' cannot convert {raw:?} to {}", .target.as_str())]
    Conversion {
        source_kind: SourceKind,
        name: String,
        target: ScalarKind,
        raw: String,
    },

    /// Value does not match the declared annotation
    #[error("In {source_kind}, '{name}' does not match declared type {expected} (got {found})")]
    TypeMismatch {
        source_kind: SourceKind,
        name: String,
        expected: String,
        found: &'static str,
    },

    /// A rule rejected the value
    #[error("In {source_kind}, '{name}' {message}")]
    RuleViolation {
        source_kind: SourceKind,
        name: String,
        rule: String,
        message: String,
    },
}

impl ValidationError {
    /// Field (wire) name that failed validation
    pub fn field(&self) -> &str {
        match self {
            Self::Missing { name, .. }
            | Self::Conversion { name, .. }
            | Self::TypeMismatch { name, .. }
            | Self::RuleViolation { name, .. } => name,
        }
    }

    /// Source the field was read from
    pub fn source_kind(&self) -> SourceKind {
        match self {
            Self::Missing { source_kind, .. }
            | Self::Conversion { source_kind, .. }
            | Self::TypeMismatch { source_kind, .. }
            | Self::RuleViolation { source_kind, .. } => *source_kind,
        }
    }

    /// Validation constraint that failed
    pub fn constraint(&self) -> &str {
        match self {
            Self::Missing { .. } => "required",
            Self::Conversion { .. } => "conversion",
            Self::TypeMismatch { .. } => "type",
            Self::RuleViolation { rule, .. } => rule,
        }
    }

    /// Message handed to the error formatter
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Rendered failure, ready for the transport layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    /// Message of the failing field
    pub message: String,

    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: serde_json::Value,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(message: impl Into<String>, status: u16, body: serde_json::Value) -> Self {
        Self {
            message: message.into(),
            status,
            body,
        }
    }

    /// Serialize the body for the wire
    pub fn to_bytes(&self) -> Vec<u8> {
        self.body.to_string().into_bytes()
    }
}
