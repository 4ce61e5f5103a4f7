// Declarative parameter specifications

use crate::errors::{ConfigError, ConfigResult};
use crate::traits::{RuleRef, ValidationRule};
use crate::types::{TypeDescriptor, type_check};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Request channel that supplies a parameter's raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Route,
    Query,
    Form,
    Json,
    Header,
    File,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Route => "Route",
            SourceKind::Query => "Query",
            SourceKind::Form => "Form",
            SourceKind::Json => "Json",
            SourceKind::Header => "Header",
            SourceKind::File => "File",
        }
    }

    /// Sources whose raw values arrive as text and may be coerced.
    pub fn is_text_bearing(&self) -> bool {
        matches!(
            self,
            SourceKind::Route | SourceKind::Query | SourceKind::Form | SourceKind::Header
        )
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one request parameter.
///
/// Built once at registration time through [`ParameterSpecBuilder`], which
/// checks the annotation, the default and every rule. A built spec is
/// `Send + Sync` and can be shared across requests.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    source_kind: SourceKind,
    annotation: TypeDescriptor,
    default: Option<Value>,
    rules: Vec<RuleRef>,
    optional: bool,
    wire_name: Option<String>,
}

impl ParameterSpec {
    /// Path parameter
    pub fn route(annotation: impl Into<TypeDescriptor>) -> ParameterSpecBuilder {
        ParameterSpecBuilder::new(SourceKind::Route, annotation.into())
    }

    /// Query string parameter
    pub fn query(annotation: impl Into<TypeDescriptor>) -> ParameterSpecBuilder {
        ParameterSpecBuilder::new(SourceKind::Query, annotation.into())
    }

    /// Form body field
    pub fn form(annotation: impl Into<TypeDescriptor>) -> ParameterSpecBuilder {
        ParameterSpecBuilder::new(SourceKind::Form, annotation.into())
    }

    /// Top-level key of the JSON body
    pub fn json(annotation: impl Into<TypeDescriptor>) -> ParameterSpecBuilder {
        ParameterSpecBuilder::new(SourceKind::Json, annotation.into())
    }

    /// Header, looked up by argument name unless a wire name is set
    pub fn header(annotation: impl Into<TypeDescriptor>) -> ParameterSpecBuilder {
        ParameterSpecBuilder::new(SourceKind::Header, annotation.into())
    }

    /// Uploaded files; the annotation is always `FileType`
    pub fn file() -> ParameterSpecBuilder {
        ParameterSpecBuilder::new(SourceKind::File, TypeDescriptor::FileType)
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    pub fn annotation(&self) -> &TypeDescriptor {
        &self.annotation
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn rules(&self) -> &[RuleRef] {
        &self.rules
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn wire_name(&self) -> Option<&str> {
        self.wire_name.as_deref()
    }

    /// Name used to look the raw value up for argument `arg_name`.
    pub fn lookup_name<'a>(&'a self, arg_name: &'a str) -> &'a str {
        match (self.source_kind, self.wire_name.as_deref()) {
            (SourceKind::Header, Some(wire)) => wire,
            _ => arg_name,
        }
    }
}

/// Builder for [`ParameterSpec`]
#[derive(Debug, Clone)]
pub struct ParameterSpecBuilder {
    source_kind: SourceKind,
    annotation: TypeDescriptor,
    default: Option<Value>,
    rules: Vec<RuleRef>,
    optional: bool,
    wire_name: Option<String>,
}

impl ParameterSpecBuilder {
    fn new(source_kind: SourceKind, annotation: TypeDescriptor) -> Self {
        Self {
            source_kind,
            annotation,
            default: None,
            rules: Vec::new(),
            optional: false,
            wire_name: None,
        }
    }

    /// Value used when the request does not supply one
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Append a rule; rules run in the order they are added
    pub fn rule<R: ValidationRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Append an already shared rule
    pub fn shared_rule(mut self, rule: RuleRef) -> Self {
        self.rules.push(rule);
        self
    }

    /// Allow the parameter to be absent
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Explicit header name on the wire
    pub fn wire_name(mut self, name: impl Into<String>) -> Self {
        self.wire_name = Some(name.into());
        self
    }

    /// Validate the configuration and freeze it.
    pub fn build(self) -> ConfigResult<ParameterSpec> {
        if self.source_kind != SourceKind::File {
            self.check_annotation()?;
        }
        self.check_default()?;
        self.check_rules()?;
        self.check_wire_name()?;

        debug!(
            source = %self.source_kind,
            annotation = %self.annotation,
            rules = self.rules.len(),
            optional = self.optional,
            "Parameter spec built"
        );

        Ok(ParameterSpec {
            source_kind: self.source_kind,
            annotation: self.annotation,
            default: self.default,
            rules: self.rules,
            optional: self.optional,
            wire_name: self.wire_name,
        })
    }

    fn invalid_annotation(&self, reason: &str) -> ConfigError {
        ConfigError::InvalidAnnotation {
            source_kind: Some(self.source_kind),
            annotation: self.annotation.to_string(),
            reason: reason.to_string(),
        }
    }

    fn check_annotation(&self) -> ConfigResult<()> {
        self.annotation.ensure_well_formed()?;

        if self.annotation.contains_file() {
            return Err(self.invalid_annotation("file type is only allowed for File parameters"));
        }
        if self.source_kind != SourceKind::Json && !self.annotation.is_flat() {
            return Err(self.invalid_annotation(
                "must be one of (int, float, str, bool, All) or a union of them",
            ));
        }
        Ok(())
    }

    fn check_default(&self) -> ConfigResult<()> {
        let Some(default) = &self.default else {
            return Ok(());
        };
        if self.source_kind == SourceKind::File || !type_check(default, &self.annotation) {
            return Err(ConfigError::InvalidDefault {
                default: default.to_string(),
                annotation: self.annotation.to_string(),
            });
        }
        Ok(())
    }

    fn check_rules(&self) -> ConfigResult<()> {
        for origin in self.annotation.origins() {
            for rule in &self.rules {
                let types = rule.applicable_types();
                if !types.accepts(origin) {
                    return Err(ConfigError::InvalidRuleAnnotation {
                        rule: rule.name().to_string(),
                        origin: origin.to_string(),
                        allowed: types.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_wire_name(&self) -> ConfigResult<()> {
        match (&self.wire_name, self.source_kind) {
            (None, _) => Ok(()),
            (Some(name), SourceKind::Header) if name.trim().is_empty() => {
                Err(ConfigError::InvalidHeaderName)
            }
            (Some(_), SourceKind::Header) => Ok(()),
            (Some(_), kind) => Err(ConfigError::UnsupportedWireName(kind)),
        }
    }
}

/// Ordered `(argument_name, ParameterSpec)` declarations for one handler.
#[derive(Debug, Clone, Default)]
pub struct ParamSet {
    params: Vec<(String, ParameterSpec)>,
}

impl ParamSet {
    /// Start declaring parameters
    pub fn builder() -> ParamSetBuilder {
        ParamSetBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterSpec)> {
        self.params.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }
}

/// Builder for [`ParamSet`]
///
/// Spec errors are collected and the first one (in declaration order) is
/// returned from [`ParamSetBuilder::build`].
#[derive(Debug, Default)]
pub struct ParamSetBuilder {
    params: Vec<(String, ConfigResult<ParameterSpec>)>,
}

impl ParamSetBuilder {
    /// Declare a parameter from a spec builder
    pub fn param(mut self, name: impl Into<String>, spec: ParameterSpecBuilder) -> Self {
        self.params.push((name.into(), spec.build()));
        self
    }

    /// Declare a parameter from an already built spec
    pub fn spec(mut self, name: impl Into<String>, spec: ParameterSpec) -> Self {
        self.params.push((name.into(), Ok(spec)));
        self
    }

    pub fn build(self) -> ConfigResult<ParamSet> {
        let mut seen = HashSet::new();
        let mut params = Vec::with_capacity(self.params.len());

        for (name, spec) in self.params {
            if name.is_empty() {
                return Err(ConfigError::InvalidParameterName);
            }
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateParameter(name));
            }
            params.push((name, spec?));
        }

        debug!(params = params.len(), "Parameter set registered");
        Ok(ParamSet { params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::*;

    #[test]
    fn test_spec_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParameterSpec>();
        assert_send_sync::<ParamSet>();
    }

    #[test]
    fn test_scalar_annotations_allowed_everywhere() {
        for ann in [
            TypeDescriptor::INT,
            TypeDescriptor::STR,
            TypeDescriptor::FLOAT,
            TypeDescriptor::BOOL,
            TypeDescriptor::Wildcard,
        ] {
            assert!(ParameterSpec::route(ann.clone()).build().is_ok());
            assert!(ParameterSpec::query(ann.clone()).build().is_ok());
            assert!(ParameterSpec::form(ann.clone()).build().is_ok());
            assert!(ParameterSpec::header(ann.clone()).build().is_ok());
            assert!(ParameterSpec::json(ann).build().is_ok());
        }
    }

    #[test]
    fn test_containers_only_in_json() {
        let containers = [
            TypeDescriptor::any_list(),
            TypeDescriptor::any_dict(),
            TypeDescriptor::Union(vec![TypeDescriptor::INT, TypeDescriptor::any_list()]),
        ];
        for ann in containers {
            assert!(ParameterSpec::json(ann.clone()).build().is_ok());
            let err = ParameterSpec::query(ann.clone()).build().unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidAnnotation {
                    source_kind: Some(SourceKind::Query),
                    ..
                }
            ));
            assert!(ParameterSpec::header(ann).build().is_err());
        }
    }

    #[test]
    fn test_file_annotation_rejected_outside_file() {
        assert!(ParameterSpec::json(TypeDescriptor::FileType).build().is_err());
        assert!(ParameterSpec::route(TypeDescriptor::FileType).build().is_err());
        assert_eq!(
            ParameterSpec::file().build().unwrap().annotation(),
            &TypeDescriptor::FileType
        );
    }

    #[test]
    fn test_empty_union_rejected() {
        assert_eq!(
            ParameterSpec::json(TypeDescriptor::Union(vec![])).build().unwrap_err(),
            ConfigError::EmptyUnion
        );
    }

    #[test]
    fn test_default_must_match_annotation() {
        let types = [
            TypeDescriptor::INT,
            TypeDescriptor::STR,
            TypeDescriptor::FLOAT,
            TypeDescriptor::BOOL,
        ];
        let defaults = [Value::Int(1), Value::from("1"), Value::Float(1.13), Value::Bool(true)];

        for (i, ann) in types.iter().enumerate() {
            for (j, default) in defaults.iter().enumerate() {
                let result = ParameterSpec::header(ann.clone())
                    .default(default.clone())
                    .build();
                if i == j {
                    assert!(result.is_ok());
                } else {
                    assert!(matches!(result, Err(ConfigError::InvalidDefault { .. })));
                }
            }
        }

        for default in defaults {
            assert!(ParameterSpec::header(TypeDescriptor::Wildcard)
                .default(default)
                .build()
                .is_ok());
        }
    }

    #[test]
    fn test_default_checked_against_union_and_containers() {
        let ann = TypeDescriptor::union_of(vec![TypeDescriptor::INT, TypeDescriptor::STR]).unwrap();
        assert!(ParameterSpec::query(ann.clone()).default("x").build().is_ok());
        assert!(ParameterSpec::query(ann).default(1.5).build().is_err());

        let ints = TypeDescriptor::list_of(TypeDescriptor::INT).unwrap();
        assert!(ParameterSpec::json(ints.clone()).default(vec![1, 2]).build().is_ok());
        assert!(ParameterSpec::json(ints).default(vec!["a"]).build().is_err());
    }

    #[test]
    fn test_file_spec_rejects_default() {
        assert!(ParameterSpec::file().default("x").build().is_err());
    }

    #[test]
    fn test_rule_compatibility() {
        assert!(matches!(
            ParameterSpec::query(TypeDescriptor::STR).rule(Min::new(5)).build(),
            Err(ConfigError::InvalidRuleAnnotation { .. })
        ));
        assert!(ParameterSpec::query(TypeDescriptor::INT).rule(Min::new(5)).build().is_ok());
        assert!(ParameterSpec::query(TypeDescriptor::FLOAT).rule(Min::new(5)).build().is_ok());

        assert!(ParameterSpec::json(TypeDescriptor::list_of(TypeDescriptor::INT).unwrap())
            .rule(MinLength(1))
            .build()
            .is_ok());
        assert!(ParameterSpec::json(TypeDescriptor::Wildcard)
            .rule(MinLength(1))
            .build()
            .is_err());
        assert!(ParameterSpec::json(TypeDescriptor::Wildcard)
            .rule(In::new([1, 2]).unwrap())
            .build()
            .is_ok());
    }

    #[test]
    fn test_rule_compatibility_checks_every_union_member() {
        let ann = TypeDescriptor::Union(vec![TypeDescriptor::INT, TypeDescriptor::STR]);
        let err = ParameterSpec::query(ann).rule(Max::new(3)).build().unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidRuleAnnotation {
                rule: "Max".to_string(),
                origin: "str".to_string(),
                allowed: "{int, float}".to_string(),
            }
        );
    }

    #[test]
    fn test_file_rules() {
        assert!(ParameterSpec::file()
            .rule(FileExtension::new(["png"]).unwrap())
            .rule(MaxFileCount(2))
            .build()
            .is_ok());
        assert!(ParameterSpec::file().rule(MinLength(1)).build().is_err());
        assert!(ParameterSpec::json(TypeDescriptor::STR)
            .rule(MaxFileCount(1))
            .build()
            .is_err());
    }

    #[test]
    fn test_wire_name() {
        let spec = ParameterSpec::header(TypeDescriptor::STR)
            .wire_name("X-Request-Id")
            .build()
            .unwrap();
        assert_eq!(spec.lookup_name("request_id"), "X-Request-Id");

        let spec = ParameterSpec::header(TypeDescriptor::STR).build().unwrap();
        assert_eq!(spec.lookup_name("token"), "token");

        assert_eq!(
            ParameterSpec::header(TypeDescriptor::STR).wire_name(" ").build().unwrap_err(),
            ConfigError::InvalidHeaderName
        );
        assert_eq!(
            ParameterSpec::query(TypeDescriptor::STR).wire_name("q").build().unwrap_err(),
            ConfigError::UnsupportedWireName(SourceKind::Query)
        );
    }

    #[test]
    fn test_param_set_order_and_duplicates() {
        let params = ParamSet::builder()
            .param("id", ParameterSpec::route(TypeDescriptor::INT))
            .param("name", ParameterSpec::json(TypeDescriptor::STR))
            .build()
            .unwrap();
        let names: Vec<&str> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert!(params.get("name").is_some());

        let err = ParamSet::builder()
            .param("id", ParameterSpec::route(TypeDescriptor::INT))
            .param("id", ParameterSpec::query(TypeDescriptor::INT))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateParameter("id".to_string()));

        assert_eq!(
            ParamSet::builder()
                .param("", ParameterSpec::route(TypeDescriptor::INT))
                .build()
                .unwrap_err(),
            ConfigError::InvalidParameterName
        );
    }

    #[test]
    fn test_param_set_reports_first_spec_error() {
        let err = ParamSet::builder()
            .param("age", ParameterSpec::query(TypeDescriptor::STR).rule(Min::new(1)))
            .param("tags", ParameterSpec::query(TypeDescriptor::any_list()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRuleAnnotation { .. }));
    }
}
