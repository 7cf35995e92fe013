//! Field-level rules: identifiers, version tags and enum membership.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::error::{ErrorKind, ValidationError};

/// Maximum length of any resource name.
pub const MAX_NAME_LENGTH: usize = 20;

fn name_regex() -> &'static Regex {
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    NAME_REGEX.get_or_init(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid regex"))
}

fn version_regex() -> &'static Regex {
    static VERSION_REGEX: OnceLock<Regex> = OnceLock::new();
    VERSION_REGEX.get_or_init(|| Regex::new(r"^v\d+\.\d+\.\d+$").expect("valid regex"))
}

/// Check a resource name. Only the first failing rule is reported.
pub fn validate_name(value: &str, path: &str) -> Option<ValidationError> {
    if value.is_empty() {
        return Some(ValidationError::missing(path));
    }

    if !name_regex().is_match(value) {
        return Some(ValidationError::new(ErrorKind::InvalidFieldName, path));
    }

    if value.len() > MAX_NAME_LENGTH {
        return Some(
            ValidationError::new(ErrorKind::InvalidLengthField, path)
                .with_detail(format!("maximum length allowed: {}", MAX_NAME_LENGTH)),
        );
    }

    None
}

/// Check a `vX.Y.Z` version tag.
pub fn validate_version(value: &str, path: &str) -> Option<ValidationError> {
    if value.is_empty() {
        return Some(ValidationError::missing(path));
    }

    if !version_regex().is_match(value) {
        return Some(ValidationError::new(ErrorKind::InvalidVersionTag, path));
    }

    None
}

/// Check a required, non-empty free-text field.
pub fn validate_required(value: &str, path: &str) -> Option<ValidationError> {
    value
        .is_empty()
        .then(|| ValidationError::missing(path))
}

/// Check membership in a fixed value set. `parse` is the set's parser.
pub fn validate_enum<T>(
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
    kind: ErrorKind,
    path: &str,
) -> Option<ValidationError> {
    match parse(value) {
        Some(_) => None,
        None => Some(
            ValidationError::new(kind, path).with_detail(format!("got {:?}", value)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::types::WorkflowType;

    #[test]
    fn test_name_missing() {
        let err = validate_name("", "krt.workflows[0].name").unwrap();
        assert_eq!(err.kind, ErrorKind::MissingRequiredField);
        assert_eq!(err.path, "krt.workflows[0].name");
    }

    #[test]
    fn test_name_invalid_format() {
        for name in ["Invalid string!", "-leading", "trailing-", "UPPER", "dots.not.allowed"] {
            let err = validate_name(name, "x").unwrap();
            assert_eq!(err.kind, ErrorKind::InvalidFieldName, "{name}");
        }
    }

    #[test]
    fn test_name_too_long() {
        let name = "this-is-a-very-long-name-for-a-valid-resource";
        assert!(name.len() > MAX_NAME_LENGTH);
        let err = validate_name(name, "x").unwrap();
        assert_eq!(err.kind, ErrorKind::InvalidLengthField);
    }

    #[test]
    fn test_name_valid() {
        assert!(validate_name("a", "x").is_none());
        assert!(validate_name("test-trigger-1", "x").is_none());
        assert!(validate_name(&"a".repeat(MAX_NAME_LENGTH), "x").is_none());
    }

    #[test]
    fn test_version() {
        assert!(validate_version("v1.0.0", "krt.version").is_none());
        assert!(validate_version("v10.20.300", "krt.version").is_none());
        assert_eq!(
            validate_version("", "krt.version").unwrap().kind,
            ErrorKind::MissingRequiredField
        );
        for tag in ["1.0.0", "v1.0", "v1.0.0-rc1", "version-name"] {
            assert_eq!(
                validate_version(tag, "krt.version").unwrap().kind,
                ErrorKind::InvalidVersionTag,
                "{tag}"
            );
        }
    }

    #[test]
    fn test_enum_membership() {
        assert!(validate_enum("data", WorkflowType::parse, ErrorKind::InvalidWorkflowType, "t")
            .is_none());
        let err = validate_enum("batch", WorkflowType::parse, ErrorKind::InvalidWorkflowType, "t")
            .unwrap();
        assert_eq!(err.kind, ErrorKind::InvalidWorkflowType);
        assert_eq!(err.path, "t");
    }
}
