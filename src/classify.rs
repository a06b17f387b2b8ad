//! Column type inference.
//!
//! A column is classified by folding its non-empty, trimmed values into a
//! [`TypeCandidate`]: four flags that start optimistic and are knocked out
//! by the first value failing the matching format test. Whatever survives
//! is resolved by precedence, `PhoneNumber > Integer > Decimal > Date`, with
//! [`TypeLabel::String`] as the fallback.

use std::{fmt, str::FromStr, sync::OnceLock};

use anyhow::anyhow;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::MatchError;

pub const DEFAULT_DATE_FORMATS: &[&str] = &["MM/dd/yyyy", "dd/MM/yyyy", "yyyy-MM-dd"];

/// Inferred type of a column, ordered by classification precedence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TypeLabel {
    PhoneNumber,
    Integer,
    Decimal,
    Date,
    String,
}

impl TypeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeLabel::PhoneNumber => "PhoneNumber",
            TypeLabel::Integer => "Integer",
            TypeLabel::Decimal => "Decimal",
            TypeLabel::Date => "Date",
            TypeLabel::String => "String",
        }
    }

    pub fn variants() -> &'static [TypeLabel] {
        &[
            TypeLabel::PhoneNumber,
            TypeLabel::Integer,
            TypeLabel::Decimal,
            TypeLabel::Date,
            TypeLabel::String,
        ]
    }
}

impl fmt::Display for TypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeLabel {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "phonenumber" | "phone_number" | "phone" => Ok(TypeLabel::PhoneNumber),
            "integer" | "int" => Ok(TypeLabel::Integer),
            "decimal" | "double" => Ok(TypeLabel::Decimal),
            "date" => Ok(TypeLabel::Date),
            "string" => Ok(TypeLabel::String),
            _ => Err(anyhow!(
                "Unknown type '{value}'. Supported types: {}",
                TypeLabel::variants()
                    .iter()
                    .map(TypeLabel::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?[0-9]+$").expect("valid integer pattern"))
}

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?[0-9]*\.?[0-9]+$").expect("valid decimal pattern"))
}

pub fn is_integer(value: &str) -> bool {
    integer_pattern().is_match(value)
}

pub fn is_decimal(value: &str) -> bool {
    decimal_pattern().is_match(value)
}

pub fn is_phone_number(value: &str) -> bool {
    value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Ordered list of calendar formats a value may match to count as a date.
///
/// Patterns use the `yyyy`/`MM`/`dd` notation and are translated to `chrono`
/// format strings once, up front. Patterns that already contain `%` are
/// treated as `chrono` formats and kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormats {
    patterns: Vec<String>,
    chrono_formats: Vec<String>,
}

impl DateFormats {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, MatchError> {
        if patterns.is_empty() {
            return Err(MatchError::InvalidConfig(
                "At least one date format is required".to_string(),
            ));
        }
        let mut chrono_formats = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            chrono_formats.push(translate_pattern(pattern.as_ref())?);
        }
        Ok(Self {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            chrono_formats,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn chrono_formats(&self) -> &[String] {
        &self.chrono_formats
    }

    /// Strict parse: the whole value must be consumed and the calendar date
    /// must exist (no roll-over of day 32 or February 30). Whitespace is
    /// never accepted, since chrono skips it before numeric fields.
    pub fn matches(&self, value: &str) -> bool {
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return false;
        }
        self.chrono_formats
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(value, fmt).is_ok())
    }
}

impl Default for DateFormats {
    fn default() -> Self {
        DateFormats::new(DEFAULT_DATE_FORMATS).expect("default date formats are valid")
    }
}

fn translate_pattern(pattern: &str) -> Result<String, MatchError> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(MatchError::InvalidConfig(
            "Date format cannot be empty".to_string(),
        ));
    }
    if pattern.contains('%') {
        return Ok(pattern.to_string());
    }

    let chars = pattern.chars().collect::<Vec<_>>();
    let mut translated = String::with_capacity(pattern.len() * 2);
    let mut idx = 0usize;
    while idx < chars.len() {
        let ch = chars[idx];
        let run = chars[idx..].iter().take_while(|c| **c == ch).count();
        if ch.is_ascii_alphabetic() {
            let token = match (ch, run) {
                ('y', 4) => "%Y",
                ('y', 2) => "%y",
                ('M', 1 | 2) => "%m",
                ('d', 1 | 2) => "%d",
                ('H', 1 | 2) => "%H",
                ('m', 1 | 2) => "%M",
                ('s', 1 | 2) => "%S",
                _ => {
                    return Err(MatchError::InvalidConfig(format!(
                        "Unsupported token '{}' in date format '{pattern}'",
                        ch.to_string().repeat(run)
                    )));
                }
            };
            translated.push_str(token);
        } else {
            for _ in 0..run {
                translated.push(ch);
            }
        }
        idx += run;
    }
    Ok(translated)
}

/// Four-flag accumulator folded over a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeCandidate {
    possible_integer: bool,
    possible_decimal: bool,
    possible_date: bool,
    possible_phone: bool,
    non_empty: usize,
}

impl Default for TypeCandidate {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCandidate {
    pub fn new() -> Self {
        Self {
            possible_integer: true,
            possible_decimal: true,
            possible_date: true,
            possible_phone: true,
            non_empty: 0,
        }
    }

    pub fn update(&mut self, value: &str, date_formats: &DateFormats) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return;
        }
        self.non_empty += 1;
        if self.settled() {
            return;
        }

        if self.possible_integer && !is_integer(trimmed) {
            self.possible_integer = false;
        }
        if self.possible_decimal && !is_decimal(trimmed) {
            self.possible_decimal = false;
        }
        if self.possible_date && !date_formats.matches(trimmed) {
            self.possible_date = false;
        }
        if self.possible_phone && !is_phone_number(trimmed) {
            self.possible_phone = false;
        }
    }

    /// No further value can change the outcome.
    pub fn settled(&self) -> bool {
        !(self.possible_integer || self.possible_decimal || self.possible_date || self.possible_phone)
    }

    pub fn non_empty(&self) -> usize {
        self.non_empty
    }

    pub fn decide(&self) -> TypeLabel {
        if self.non_empty == 0 {
            return TypeLabel::String;
        }
        if self.possible_phone {
            TypeLabel::PhoneNumber
        } else if self.possible_integer {
            TypeLabel::Integer
        } else if self.possible_decimal {
            TypeLabel::Decimal
        } else if self.possible_date {
            TypeLabel::Date
        } else {
            TypeLabel::String
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeClassifier {
    date_formats: DateFormats,
}

impl TypeClassifier {
    pub fn new(date_formats: DateFormats) -> Self {
        Self { date_formats }
    }

    pub fn date_formats(&self) -> &DateFormats {
        &self.date_formats
    }

    pub fn observe(&self, candidate: &mut TypeCandidate, value: &str) {
        candidate.update(value, &self.date_formats);
    }

    /// Classifies a whole column, stopping early once every flag is gone.
    pub fn classify<I, S>(&self, values: I) -> TypeLabel
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut candidate = TypeCandidate::new();
        for value in values {
            self.observe(&mut candidate, value.as_ref());
            if candidate.settled() {
                break;
            }
        }
        candidate.decide()
    }
}

/// Classifies with the default date formats.
pub fn classify<I, S>(values: I) -> TypeLabel
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    TypeClassifier::default().classify(values)
}
