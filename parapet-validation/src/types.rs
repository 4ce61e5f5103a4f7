// Structural type descriptors

use crate::errors::ConfigError;
use crate::value::Value;
use std::fmt;

/// Scalar kinds a descriptor can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Str,
    Float,
    Bool,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Int => "int",
            ScalarKind::Str => "str",
            ScalarKind::Float => "float",
            ScalarKind::Bool => "bool",
        }
    }
}

/// Origin type of an annotation, used to match rules against annotations.
///
/// Containers unwrap to their container kind (`List(_)` is `List`).
/// `Any` is the origin of a `Wildcard` annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OriginType {
    Int,
    Float,
    Str,
    Bool,
    List,
    Dict,
    File,
    Any,
}

impl OriginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginType::Int => "int",
            OriginType::Float => "float",
            OriginType::Str => "str",
            OriginType::Bool => "bool",
            OriginType::List => "list",
            OriginType::Dict => "dict",
            OriginType::File => "file",
            OriginType::Any => "any",
        }
    }
}

impl fmt::Display for OriginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes the acceptable shape of a parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Scalar(ScalarKind),
    List(Box<TypeDescriptor>),
    Dict(Box<TypeDescriptor>),
    FileType,
    Wildcard,
    Union(Vec<TypeDescriptor>),
}

impl TypeDescriptor {
    pub const INT: TypeDescriptor = TypeDescriptor::Scalar(ScalarKind::Int);
    pub const STR: TypeDescriptor = TypeDescriptor::Scalar(ScalarKind::Str);
    pub const FLOAT: TypeDescriptor = TypeDescriptor::Scalar(ScalarKind::Float);
    pub const BOOL: TypeDescriptor = TypeDescriptor::Scalar(ScalarKind::Bool);

    /// `List(Wildcard)`
    pub fn any_list() -> Self {
        TypeDescriptor::List(Box::new(TypeDescriptor::Wildcard))
    }

    /// `Dict(Wildcard)`
    pub fn any_dict() -> Self {
        TypeDescriptor::Dict(Box::new(TypeDescriptor::Wildcard))
    }

    /// List whose elements must satisfy `item`.
    pub fn list_of(item: TypeDescriptor) -> Result<Self, ConfigError> {
        item.check_nested(false)?;
        Ok(TypeDescriptor::List(Box::new(item)))
    }

    /// Dict whose values must satisfy `item`. Keys are unconstrained.
    pub fn dict_of(item: TypeDescriptor) -> Result<Self, ConfigError> {
        item.check_nested(false)?;
        Ok(TypeDescriptor::Dict(Box::new(item)))
    }

    /// Union of `members`, tried in order.
    pub fn union_of(members: Vec<TypeDescriptor>) -> Result<Self, ConfigError> {
        let union = TypeDescriptor::Union(members);
        union.ensure_well_formed()?;
        Ok(union)
    }

    /// Check nested descriptors: unions must be non-empty and `FileType`
    /// may only appear at the top level.
    pub fn ensure_well_formed(&self) -> Result<(), ConfigError> {
        self.check_nested(true)
    }

    fn check_nested(&self, top_level: bool) -> Result<(), ConfigError> {
        match self {
            TypeDescriptor::Scalar(_) | TypeDescriptor::Wildcard => Ok(()),
            TypeDescriptor::FileType if top_level => Ok(()),
            TypeDescriptor::FileType => Err(ConfigError::InvalidAnnotation {
                source_kind: None,
                annotation: self.to_string(),
                reason: "file type cannot be nested inside another type".to_string(),
            }),
            TypeDescriptor::List(item) | TypeDescriptor::Dict(item) => item.check_nested(false),
            TypeDescriptor::Union(members) => {
                if members.is_empty() {
                    return Err(ConfigError::EmptyUnion);
                }
                members.iter().try_for_each(|m| m.check_nested(false))
            }
        }
    }

    /// Origin types implied by this descriptor (unions contribute every member).
    pub fn origins(&self) -> Vec<OriginType> {
        let mut out = Vec::new();
        self.collect_origins(&mut out);
        out
    }

    fn collect_origins(&self, out: &mut Vec<OriginType>) {
        let origin = match self {
            TypeDescriptor::Scalar(ScalarKind::Int) => OriginType::Int,
            TypeDescriptor::Scalar(ScalarKind::Float) => OriginType::Float,
            TypeDescriptor::Scalar(ScalarKind::Str) => OriginType::Str,
            TypeDescriptor::Scalar(ScalarKind::Bool) => OriginType::Bool,
            TypeDescriptor::List(_) => OriginType::List,
            TypeDescriptor::Dict(_) => OriginType::Dict,
            TypeDescriptor::FileType => OriginType::File,
            TypeDescriptor::Wildcard => OriginType::Any,
            TypeDescriptor::Union(members) => {
                members.iter().for_each(|m| m.collect_origins(out));
                return;
            }
        };
        if !out.contains(&origin) {
            out.push(origin);
        }
    }

    /// The descriptor that text coercion targets: the first member of a
    /// union, recursively.
    pub fn first_choice(&self) -> &TypeDescriptor {
        match self {
            TypeDescriptor::Union(members) => {
                members.first().map(TypeDescriptor::first_choice).unwrap_or(self)
            }
            other => other,
        }
    }

    /// True for scalars, `Wildcard`, and unions made only of those.
    pub fn is_flat(&self) -> bool {
        match self {
            TypeDescriptor::Scalar(_) | TypeDescriptor::Wildcard => true,
            TypeDescriptor::Union(members) => members.iter().all(TypeDescriptor::is_flat),
            _ => false,
        }
    }

    /// True if `FileType` appears anywhere in the descriptor.
    pub fn contains_file(&self) -> bool {
        match self {
            TypeDescriptor::FileType => true,
            TypeDescriptor::List(item) | TypeDescriptor::Dict(item) => item.contains_file(),
            TypeDescriptor::Union(members) => members.iter().any(TypeDescriptor::contains_file),
            _ => false,
        }
    }
}

impl From<ScalarKind> for TypeDescriptor {
    fn from(kind: ScalarKind) -> Self {
        TypeDescriptor::Scalar(kind)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Scalar(kind) => f.write_str(kind.as_str()),
            TypeDescriptor::List(item) => write!(f, "List({})", item),
            TypeDescriptor::Dict(item) => write!(f, "Dict({})", item),
            TypeDescriptor::FileType => f.write_str("File"),
            TypeDescriptor::Wildcard => f.write_str("All"),
            TypeDescriptor::Union(members) => {
                f.write_str("(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Structural membership test of `value` against `descriptor`.
///
/// Booleans never satisfy `Int`, and integers never satisfy `Float`.
/// Dict keys are not checked, only values.
pub fn type_check(value: &Value, descriptor: &TypeDescriptor) -> bool {
    match descriptor {
        TypeDescriptor::Wildcard => true,
        TypeDescriptor::Scalar(kind) => matches!(
            (kind, value),
            (ScalarKind::Int, Value::Int(_))
                | (ScalarKind::Str, Value::Str(_))
                | (ScalarKind::Float, Value::Float(_))
                | (ScalarKind::Bool, Value::Bool(_))
        ),
        TypeDescriptor::List(item) => match value {
            Value::List(items) => items.iter().all(|v| type_check(v, item)),
            _ => false,
        },
        TypeDescriptor::Dict(item) => match value {
            Value::Dict(map) => map.values().all(|v| type_check(v, item)),
            _ => false,
        },
        TypeDescriptor::Union(members) => members.iter().any(|m| type_check(value, m)),
        // The validator never type-checks file parameters; rules cover them.
        TypeDescriptor::FileType => matches!(value, Value::Files(_)),
    }
}
