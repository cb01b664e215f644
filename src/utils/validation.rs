use std::collections::BTreeMap;

use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors};

/// Field name to human readable messages, as shown next to form inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Keeps only the errors of fields named in `fields`.
    pub fn retain_fields(&mut self, fields: &[&str]) {
        self.0.retain(|name, _| fields.contains(&name.as_str()));
    }

    /// First message overall, used where a single error string is returned.
    pub fn first_message(&self) -> Option<&str> {
        self.0
            .values()
            .flat_map(|messages| messages.iter())
            .next()
            .map(String::as_str)
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut map = BTreeMap::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
                .collect();
            map.insert(field.to_string(), messages);
        }
        FieldErrors(map)
    }
}

pub fn validate<T: Validate>(val: &T) -> Result<(), validator::ValidationErrors> {
    val.validate()
}

/// Runs derive validation and returns per-field messages instead of an error.
pub fn field_errors<T: Validate>(val: &T) -> FieldErrors {
    match validate(val) {
        Ok(()) => FieldErrors::default(),
        Err(errors) => FieldErrors::from(&errors),
    }
}

pub fn validate_numeric(value: &str) -> Result<(), ValidationError> {
    if value.trim().parse::<i64>().is_ok() {
        Ok(())
    } else {
        let mut err = ValidationError::new("numeric");
        err.message = Some("must be a valid number".into());
        Err(err)
    }
}

/// Trims a submitted value and drops it when nothing is left.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Strips markup tags and encodes quotes in free-text form input.
///
/// A `<` only opens a tag when followed by a letter, `/` or `!`, so plain
/// comparisons such as `a < b` survive.
pub fn sanitize_string(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut inside_tag = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        let opens_tag = c == '<'
            && chars
                .peek()
                .is_some_and(|next| next.is_ascii_alphabetic() || matches!(next, '/' | '!'));
        match c {
            '>' if inside_tag => inside_tag = false,
            _ if inside_tag => {}
            '<' if opens_tag => inside_tag = true,
            '"' => result.push_str("&#34;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }

    result.trim().to_string()
}
