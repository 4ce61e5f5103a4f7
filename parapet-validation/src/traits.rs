// Validation rule traits

use crate::types::OriginType;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Which origin types a rule can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTypes {
    /// Compatible with every annotation, including `Wildcard`
    Any,
    /// Compatible only with the listed origins
    Only(&'static [OriginType]),
}

impl RuleTypes {
    /// Whether a rule with these types may be attached to `origin`.
    pub fn accepts(&self, origin: OriginType) -> bool {
        match self {
            RuleTypes::Any => true,
            RuleTypes::Only(origins) => origins.contains(&origin),
        }
    }
}

impl fmt::Display for RuleTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleTypes::Any => f.write_str("{any}"),
            RuleTypes::Only(origins) => {
                let names: Vec<&str> = origins.iter().map(OriginType::as_str).collect();
                write!(f, "{{{}}}", names.join(", "))
            }
        }
    }
}

/// Trait for validation rules attached to a parameter.
///
/// Rules are stateless after construction apart from their own parameters
/// and are shared across requests, so they must be `Send + Sync`.
pub trait ValidationRule: Send + Sync + fmt::Debug {
    /// Rule name, reported as the failing constraint
    fn name(&self) -> &'static str;

    /// Origin types this rule applies to
    fn applicable_types(&self) -> RuleTypes;

    /// Check a present, already type-checked value
    fn is_valid(&self, value: &Value) -> bool;

    /// Message reported when `is_valid` returns false
    fn violation_message(&self) -> String;
}

/// Shared handle to a rule.
pub type RuleRef = Arc<dyn ValidationRule>;
