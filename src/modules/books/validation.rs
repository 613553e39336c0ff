//! Request-shape validation for book payloads.
//!
//! Runs before the service is called. Every failing field is reported, not
//! just the first.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use super::models::{CreateBook, UpdateBook};

/// A single failing field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All field failures of one payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages joined for the envelope's `error` string
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Required,
    Optional,
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Length { min: usize, max: usize },
    Isbn10,
}

struct FieldRule {
    name: &'static str,
    label: &'static str,
    format: Format,
}

const RULES: [FieldRule; 3] = [
    FieldRule {
        name: "title",
        label: "Title",
        format: Format::Length { min: 2, max: 100 },
    },
    FieldRule {
        name: "author",
        label: "Author",
        format: Format::Length { min: 2, max: 30 },
    },
    FieldRule {
        name: "isbn",
        label: "ISBN",
        format: Format::Isbn10,
    },
];

impl FieldRule {
    fn check(&self, value: Option<&Value>, presence: Presence) -> Result<Option<String>, String> {
        let required = || format!("{} is required", self.label);

        let value = match (value, presence) {
            (None, Presence::Optional) => return Ok(None),
            (None, Presence::Required) | (Some(Value::Null), Presence::Required) => {
                return Err(required())
            }
            (Some(value), _) => value,
        };

        let Some(text) = value.as_str() else {
            return Err(format!("{} must be a string", self.label));
        };
        if text.is_empty() {
            return Err(required());
        }

        match self.format {
            Format::Length { min, max } => {
                let len = text.chars().count();
                if len < min || len > max {
                    return Err(format!(
                        "{} must be between {} and {} characters",
                        self.label, min, max
                    ));
                }
            }
            Format::Isbn10 => {
                if !is_isbn10(text) {
                    return Err("Invalid ISBN format".to_string());
                }
            }
        }

        Ok(Some(text.to_string()))
    }
}

/// Validate a create payload; all three fields are required.
pub fn validate_create(body: &Value) -> Result<CreateBook, ValidationErrors> {
    let [title, author, isbn] = validate(body, Presence::Required)?;
    match (title, author, isbn) {
        (Some(title), Some(author), Some(isbn)) => Ok(CreateBook {
            title,
            author,
            isbn,
        }),
        // Required rules already reported any missing field.
        _ => Err(ValidationErrors::default()),
    }
}

/// Validate an update payload; every field is optional.
pub fn validate_update(body: &Value) -> Result<UpdateBook, ValidationErrors> {
    let [title, author, isbn] = validate(body, Presence::Optional)?;
    Ok(UpdateBook {
        title,
        author,
        isbn,
    })
}

fn validate(body: &Value, presence: Presence) -> Result<[Option<String>; 3], ValidationErrors> {
    let empty = Map::new();
    let mut errors = ValidationErrors::default();

    let object = match body {
        Value::Object(object) => object,
        _ => {
            errors.push("$body", "Request body must be a JSON object");
            &empty
        }
    };

    for key in object.keys() {
        if !RULES.iter().any(|rule| rule.name == key.as_str()) {
            errors.push(key.as_str(), format!("property {key} should not exist"));
        }
    }

    let mut values: [Option<String>; 3] = Default::default();
    if body.is_object() {
        for (slot, rule) in values.iter_mut().zip(RULES.iter()) {
            match rule.check(object.get(rule.name), presence) {
                Ok(value) => *slot = value,
                Err(message) => errors.push(rule.name, message),
            }
        }
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(errors)
    }
}

/// ISBN-10 check: hyphens and whitespace are ignored; nine digits followed
/// by a digit or `X`, weighted sum (weights 1 to 10) divisible by 11.
pub fn is_isbn10(raw: &str) -> bool {
    let chars: Vec<char> = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if chars.len() != 10 {
        return false;
    }

    let mut sum = 0u32;
    for (idx, c) in chars.iter().enumerate() {
        let value = match (idx, c.to_digit(10)) {
            (_, Some(digit)) => digit,
            (9, None) if *c == 'X' => 10,
            _ => return false,
        };
        sum += (idx as u32 + 1) * value;
    }

    sum % 11 == 0
}
