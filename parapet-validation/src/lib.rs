//! Request parameter validation for Parapet
//!
//! Handlers declare, per argument, where a value comes from (route, query,
//! form, JSON body, header or file upload), its type, an optional default
//! and a list of rules. The validator resolves raw request values, coerces
//! text to the declared scalar, checks the type, runs the rules in order and
//! either hands the typed arguments to the handler or renders the first
//! failure as an error response.
//!
//! # Examples
//!
//! ## Declaring Parameters
//!
//! ```
//! use parapet_validation::{MinLength, ParamSet, ParameterSpec, TypeDescriptor};
//!
//! let params = ParamSet::builder()
//!     .param("id", ParameterSpec::route(TypeDescriptor::INT))
//!     .param(
//!         "username",
//!         ParameterSpec::json(TypeDescriptor::STR).rule(MinLength(5)),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(params.len(), 2);
//! ```
//!
//! Mistakes in a declaration are reported when the set is built:
//!
//! ```
//! use parapet_validation::{ConfigError, Min, ParamSet, ParameterSpec, TypeDescriptor};
//!
//! let result = ParamSet::builder()
//!     .param("name", ParameterSpec::query(TypeDescriptor::STR).rule(Min::new(1)))
//!     .build();
//!
//! assert!(matches!(result, Err(ConfigError::InvalidRuleAnnotation { .. })));
//! ```
//!
//! ## Validating a Request
//!
//! ```
//! use parapet_validation::{ParamSet, ParameterSpec, RequestInputs, TypeDescriptor, Validator};
//!
//! let params = ParamSet::builder()
//!     .param("page", ParameterSpec::query(TypeDescriptor::INT).default(1))
//!     .build()
//!     .unwrap();
//!
//! let validator = Validator::new();
//!
//! let inputs = RequestInputs::new().with_query("page", "3");
//! let page = validator
//!     .handle(&params, &inputs, |args| args.get_i64("page"))
//!     .unwrap();
//! assert_eq!(page, Some(3));
//!
//! let inputs = RequestInputs::new().with_query("page", "three");
//! let response = validator.handle(&params, &inputs, |_| ()).unwrap_err();
//! assert_eq!(response.status, 400);
//! ```

mod config;
mod errors;
mod params;
mod source;
mod traits;
mod types;
mod validator;
mod validators;
mod value;

pub use config::*;
pub use errors::*;
pub use params::*;
pub use source::*;
pub use traits::*;
pub use types::*;
pub use validator::*;
pub use validators::*;
pub use value::*;
