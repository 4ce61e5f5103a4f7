// Parapet - declarative request parameter validation for Rust
//
// Handlers declare where each argument comes from, its type, a default and
// the rules it must satisfy; Parapet turns raw request inputs into typed
// arguments or a ready-to-send error response.

// Re-export optional crates
#[cfg(feature = "validation")]
pub use parapet_validation;

#[cfg(feature = "validation")]
pub use parapet_validation::{
    ConfigError, ErrorResponse, ParamSet, ParameterSpec, RawValueProvider, RequestInputs,
    TypeDescriptor, ValidatedParams, ValidationError, ValidationOutcome, Validator,
    ValidatorConfig, Value,
};

// Prelude for common imports
#[cfg(feature = "validation")]
pub mod prelude {
    pub use parapet_validation::{
        Attachment,
        ConfigError,
        // Built-in rules
        Datetime,
        Email,
        ErrorResponse,
        FileExtension,
        In,
        IsoDatetime,
        Max,
        MaxFileCount,
        MaxLength,
        Min,
        MinFileCount,
        MinLength,
        Number,
        ParamSet,
        ParameterSpec,
        PhoneNumber,
        RawValueProvider,
        Regex,
        RequestInputs,
        RuleTypes,
        SourceKind,
        Strip,
        TypeDescriptor,
        ValidatedParams,
        ValidationError,
        ValidationOutcome,
        ValidationRule,
        Validator,
        ValidatorConfig,
        Value,
    };
}
