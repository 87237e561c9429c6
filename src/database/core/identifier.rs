//! Identifier sanitization
//!
//! Table and column names cannot be bound as parameters, so they are embedded
//! in statement text. Only ASCII letters, digits and underscore are accepted,
//! and accepted names are always double-quoted when embedded.

use crate::error::{ConsoleError, ConsoleResult};

/// Check that `name` is a non-empty identifier made of `[A-Za-z0-9_]`
///
/// `field` names the input in the resulting validation error.
pub fn sanitize_identifier<'a>(field: &str, name: &'a str) -> ConsoleResult<&'a str> {
    if name.is_empty() {
        return Err(ConsoleError::validation(field, "must not be empty"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(ConsoleError::validation(
            field,
            format!(
                "'{}' contains '{}'; only letters, digits and underscore are allowed",
                name, bad
            ),
        ));
    }
    Ok(name)
}

/// Quote a sanitized identifier for embedding in statement text
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name)
}
