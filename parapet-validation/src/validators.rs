// Built-in validation rules

use crate::errors::{ConfigError, ConfigResult};
use crate::traits::{RuleTypes, ValidationRule};
use crate::types::OriginType;
use crate::value::{Numeric, Value};
use chrono::format::{Item, ParseErrorKind, ParseResult, Parsed, StrftimeItems};
use chrono::{NaiveDate, NaiveTime};
use std::cmp::Ordering;
use once_cell::sync::Lazy;

const SIZED: &[OriginType] = &[OriginType::Str, OriginType::List, OriginType::Dict];
const NUMERIC: &[OriginType] = &[OriginType::Int, OriginType::Float];
const TEXT: &[OriginType] = &[OriginType::Str];
const FILE: &[OriginType] = &[OriginType::File];

// Common regex patterns
static EMAIL_REGEX: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").unwrap()
});

static PHONE_REGEX: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"^(?:\+[0-9]{1,3}[- ]?)?[0-9]{2,4}[- ]?[0-9]{3,4}[- ]?[0-9]{4}$").unwrap()
});

static ISO_DATETIME_REGEX: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{2}):(\d{2})(?::(\d{2})(?:\.\d{1,6})?)?(Z|[+-](\d{2})(?::?(\d{2}))?)?)?$",
    )
    .unwrap()
});

// Length rules

/// Minimum length of a string, list or dict
#[derive(Debug, Clone, Copy)]
pub struct MinLength(pub usize);

impl ValidationRule for MinLength {
    fn name(&self) -> &'static str {
        "MinLength"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Only(SIZED)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.len().is_some_and(|len| len >= self.0)
    }

    fn violation_message(&self) -> String {
        format!("length must be at least {}", self.0)
    }
}

/// Maximum length of a string, list or dict
#[derive(Debug, Clone, Copy)]
pub struct MaxLength(pub usize);

impl ValidationRule for MaxLength {
    fn name(&self) -> &'static str {
        "MaxLength"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Only(SIZED)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.len().is_some_and(|len| len <= self.0)
    }

    fn violation_message(&self) -> String {
        format!("length must be at most {}", self.0)
    }
}

// Number rules

/// Inclusive lower bound for ints and floats
#[derive(Debug, Clone, Copy)]
pub struct Min(pub Numeric);

impl Min {
    pub fn new(bound: impl Into<Numeric>) -> Self {
        Self(bound.into())
    }
}

impl ValidationRule for Min {
    fn name(&self) -> &'static str {
        "Min"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Only(NUMERIC)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.as_number().is_some_and(|n| n >= self.0)
    }

    fn violation_message(&self) -> String {
        format!("must be at least {}", self.0)
    }
}

/// Inclusive upper bound for ints and floats
#[derive(Debug, Clone, Copy)]
pub struct Max(pub Numeric);

impl Max {
    pub fn new(bound: impl Into<Numeric>) -> Self {
        Self(bound.into())
    }
}

impl ValidationRule for Max {
    fn name(&self) -> &'static str {
        "Max"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Only(NUMERIC)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.as_number().is_some_and(|n| n <= self.0)
    }

    fn violation_message(&self) -> String {
        format!("must be at most {}", self.0)
    }
}

/// Membership in a fixed set of choices
#[derive(Debug, Clone)]
pub struct In {
    choices: Vec<Value>,
}

impl In {
    pub fn new<I, V>(choices: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let choices: Vec<Value> = choices.into_iter().map(Into::into).collect();
        if choices.is_empty() {
            return Err(ConfigError::rule_parameter("In", "choices must not be empty"));
        }
        Ok(Self { choices })
    }

    pub fn choices(&self) -> &[Value] {
        &self.choices
    }
}

impl ValidationRule for In {
    fn name(&self) -> &'static str {
        "In"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Any
    }

    /// Ints and floats compare by numeric value, so `1` matches `1.0`.
    fn is_valid(&self, value: &Value) -> bool {
        match value.as_number() {
            Some(n) => self.choices.iter().any(|choice| {
                choice
                    .as_number()
                    .is_some_and(|c| c.partial_cmp(&n) == Some(Ordering::Equal))
            }),
            None => self.choices.contains(value),
        }
    }

    fn violation_message(&self) -> String {
        let choices: Vec<String> = self.choices.iter().map(ToString::to_string).collect();
        format!("must be one of [{}]", choices.join(", "))
    }
}

// String rules

/// Non-empty string of decimal digits
#[derive(Debug, Clone, Copy)]
pub struct Number;

impl ValidationRule for Number {
    fn name(&self) -> &'static str {
        "Number"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Only(TEXT)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value
            .as_str()
            .is_some_and(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
    }

    fn violation_message(&self) -> String {
        "must contain only digits".to_string()
    }
}

/// String without leading or trailing whitespace
#[derive(Debug, Clone, Copy)]
pub struct Strip;

impl ValidationRule for Strip {
    fn name(&self) -> &'static str {
        "Strip"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Only(TEXT)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| s == s.trim())
    }

    fn violation_message(&self) -> String {
        "must not have leading or trailing whitespace".to_string()
    }
}

/// ISO 8601 date or datetime
///
/// Accepts `YYYY-MM-DD`, optionally followed by `T` or a single space and
/// `HH:MM[:SS[.ffffff]]`, optionally followed by `Z` or a `+`/`-` offset
/// written as `HH:MM`, `HHMM` or `HH`.
#[derive(Debug, Clone, Copy)]
pub struct IsoDatetime;

impl IsoDatetime {
    fn parse(s: &str) -> Option<()> {
        let caps = ISO_DATETIME_REGEX.captures(s)?;
        let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

        let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
        NaiveDate::from_ymd_opt(year, num(2)?, num(3)?)?;

        if caps.get(4).is_some() {
            NaiveTime::from_hms_opt(num(4)?, num(5)?, num(6).unwrap_or(0))?;
        }
        if let Some(hours) = num(8) {
            if hours > 23 || num(9).is_some_and(|minutes| minutes > 59) {
                return None;
            }
        }
        Some(())
    }
}

impl ValidationRule for IsoDatetime {
    fn name(&self) -> &'static str {
        "IsoDatetime"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Only(TEXT)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.as_str().and_then(Self::parse).is_some()
    }

    fn violation_message(&self) -> String {
        "must be an ISO 8601 datetime".to_string()
    }
}

/// Datetime matching an explicit chrono format string
#[derive(Debug, Clone)]
pub struct Datetime {
    format: String,
}

impl Datetime {
    pub fn new(format: impl Into<String>) -> ConfigResult<Self> {
        let format = format.into();
        if format.is_empty() {
            return Err(ConfigError::rule_parameter("Datetime", "format must not be empty"));
        }
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::rule_parameter(
                "Datetime",
                format!("invalid format string {:?}", format),
            ));
        }
        Ok(Self { format })
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// The whole input must match the format. Formats that leave the date
    /// or time incomplete (`%Y-%m`, `%H`) are accepted as long as the fields
    /// they do set are consistent.
    fn parses(&self, s: &str) -> bool {
        let mut parsed = Parsed::new();
        if chrono::format::parse(&mut parsed, s, StrftimeItems::new(&self.format)).is_err() {
            return false;
        }
        consistent(parsed.to_naive_date()) && consistent(parsed.to_naive_time())
    }
}

fn consistent<T>(result: ParseResult<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => e.kind() == ParseErrorKind::NotEnough,
    }
}

impl ValidationRule for Datetime {
    fn name(&self) -> &'static str {
        "Datetime"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Only(TEXT)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| self.parses(s))
    }

    fn violation_message(&self) -> String {
        format!("must match datetime format {:?}", self.format)
    }
}

/// Email address (full match)
#[derive(Debug, Clone, Copy)]
pub struct Email;

impl ValidationRule for Email {
    fn name(&self) -> &'static str {
        "Email"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Only(TEXT)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| EMAIL_REGEX.is_match(s))
    }

    fn violation_message(&self) -> String {
        "must be a valid email".to_string()
    }
}

/// Phone number (full match)
#[derive(Debug, Clone, Copy)]
pub struct PhoneNumber;

impl ValidationRule for PhoneNumber {
    fn name(&self) -> &'static str {
        "PhoneNumber"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Only(TEXT)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| PHONE_REGEX.is_match(s))
    }

    fn violation_message(&self) -> String {
        "must be a valid phone number".to_string()
    }
}

/// Custom regex, matched anywhere in the string
#[derive(Debug, Clone)]
pub struct Regex(regex::Regex);

impl Regex {
    pub fn new(pattern: &str) -> ConfigResult<Self> {
        regex::Regex::new(pattern)
            .map(Self)
            .map_err(|e| ConfigError::rule_parameter("Regex", e.to_string()))
    }

    pub fn pattern(&self) -> &str {
        self.0.as_str()
    }
}

impl ValidationRule for Regex {
    fn name(&self) -> &'static str {
        "Regex"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Only(TEXT)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| self.0.is_match(s))
    }

    fn violation_message(&self) -> String {
        format!("does not match required pattern {:?}", self.0.as_str())
    }
}

// File rules

/// Every attachment's filename ends with one of the allowed extensions.
///
/// Comparison is case-insensitive; a leading dot is optional.
#[derive(Debug, Clone)]
pub struct FileExtension {
    suffixes: Vec<String>,
}

impl FileExtension {
    pub fn new<I, S>(extensions: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffixes: Vec<String> = extensions
            .into_iter()
            .map(|ext| format!(".{}", ext.as_ref().trim_start_matches('.').to_lowercase()))
            .collect();
        if suffixes.is_empty() {
            return Err(ConfigError::rule_parameter(
                "FileExtension",
                "extensions must not be empty",
            ));
        }
        if suffixes.iter().any(|s| s == ".") {
            return Err(ConfigError::rule_parameter(
                "FileExtension",
                "extensions must not be blank",
            ));
        }
        Ok(Self { suffixes })
    }
}

impl ValidationRule for FileExtension {
    fn name(&self) -> &'static str {
        "FileExtension"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Only(FILE)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.as_files().is_some_and(|files| {
            files.iter().all(|file| {
                let name = file.filename.to_lowercase();
                self.suffixes.iter().any(|suffix| name.ends_with(suffix))
            })
        })
    }

    fn violation_message(&self) -> String {
        let exts: Vec<&str> = self.suffixes.iter().map(|s| &s[1..]).collect();
        format!("file extension must be one of [{}]", exts.join(", "))
    }
}

/// At most `n` attachments
#[derive(Debug, Clone, Copy)]
pub struct MaxFileCount(pub usize);

impl ValidationRule for MaxFileCount {
    fn name(&self) -> &'static str {
        "MaxFileCount"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Only(FILE)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.as_files().is_some_and(|files| files.len() <= self.0)
    }

    fn violation_message(&self) -> String {
        format!("must have at most {} files", self.0)
    }
}

/// At least `n` attachments
#[derive(Debug, Clone, Copy)]
pub struct MinFileCount(pub usize);

impl ValidationRule for MinFileCount {
    fn name(&self) -> &'static str {
        "MinFileCount"
    }

    fn applicable_types(&self) -> RuleTypes {
        RuleTypes::Only(FILE)
    }

    fn is_valid(&self, value: &Value) -> bool {
        value.as_files().is_some_and(|files| files.len() >= self.0)
    }

    fn violation_message(&self) -> String {
        format!("must have at least {} files", self.0)
    }
}
