use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static IDENTIFIER_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9._-]*$"));

/// A project or session name that could not be used as a single path component
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} identifier '{value}': use letters, digits, '.', '_' or '-', not starting with '.' or '-'")]
pub struct IdentifierError {
    pub kind: &'static str,
    pub value: String,
}

/// Accept identifiers that stay inside their parent directory
pub fn validate_identifier(kind: &'static str, value: &str) -> Result<(), IdentifierError> {
    let valid = match IDENTIFIER_PATTERN.as_ref() {
        Ok(pattern) => pattern.is_match(value),
        Err(_) => false,
    };

    if valid {
        Ok(())
    } else {
        Err(IdentifierError {
            kind,
            value: value.to_string(),
        })
    }
}
