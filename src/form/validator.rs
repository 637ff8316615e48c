//! Validation rules
//!
//! A rule maps the current text of a field to an optional error message.
//! Rules are pure: they hold no state and never see anything but the value.

/// Maps a field value to `Some(message)` when the value is invalid
///
/// An empty message (`Some(String::new())`) still counts as an error; it is a
/// deliberate "invalid, nothing to say" result and is never coerced to valid.
pub trait Validator {
    fn validate(&self, value: &str) -> Option<String>;
}

impl<F> Validator for F
where
    F: Fn(&str) -> Option<String>,
{
    fn validate(&self, value: &str) -> Option<String> {
        self(value)
    }
}

/// Fails when the value is empty after trimming whitespace
#[derive(Debug, Clone)]
pub struct Required {
    message: String,
}

impl Validator for Required {
    fn validate(&self, value: &str) -> Option<String> {
        value.trim().is_empty().then(|| self.message.clone())
    }
}

/// Fails when the value has fewer than `min` characters
#[derive(Debug, Clone)]
pub struct MinLength {
    min: usize,
    message: String,
}

impl Validator for MinLength {
    fn validate(&self, value: &str) -> Option<String> {
        (value.chars().count() < self.min).then(|| self.message.clone())
    }
}

/// Fails when the value has more than `max` characters
#[derive(Debug, Clone)]
pub struct MaxLength {
    max: usize,
    message: String,
}

impl Validator for MaxLength {
    fn validate(&self, value: &str) -> Option<String> {
        (value.chars().count() > self.max).then(|| self.message.clone())
    }
}

/// Fails when the value does not contain `needle`
#[derive(Debug, Clone)]
pub struct Contains {
    needle: String,
    message: String,
}

impl Validator for Contains {
    fn validate(&self, value: &str) -> Option<String> {
        (!value.contains(self.needle.as_str())).then(|| self.message.clone())
    }
}

/// Runs rules in order and reports the first failure
pub struct All {
    rules: Vec<Box<dyn Validator>>,
}

impl All {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Validator for All {
    fn validate(&self, value: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.validate(value))
    }
}

pub fn required(message: impl Into<String>) -> Required {
    Required {
        message: message.into(),
    }
}

pub fn min_length(min: usize, message: impl Into<String>) -> MinLength {
    MinLength {
        min,
        message: message.into(),
    }
}

pub fn max_length(max: usize, message: impl Into<String>) -> MaxLength {
    MaxLength {
        max,
        message: message.into(),
    }
}

pub fn contains(needle: impl Into<String>, message: impl Into<String>) -> Contains {
    Contains {
        needle: needle.into(),
        message: message.into(),
    }
}

/// Combine rules; the first failing rule's message wins
pub fn all(rules: Vec<Box<dyn Validator>>) -> All {
    All { rules }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        let rule = required("Please enter your email");
        assert_eq!(
            rule.validate("   "),
            Some("Please enter your email".to_string())
        );
        assert_eq!(rule.validate(""), Some("Please enter your email".to_string()));
        assert_eq!(rule.validate(" a "), None);
    }

    #[test]
    fn test_min_length_counts_chars() {
        let rule = min_length(3, "too short");
        assert_eq!(rule.validate("äö"), Some("too short".to_string()));
        assert_eq!(rule.validate("äöü"), None);
    }

    #[test]
    fn test_max_length() {
        let rule = max_length(2, "too long");
        assert_eq!(rule.validate("ab"), None);
        assert_eq!(rule.validate("abc"), Some("too long".to_string()));
    }

    #[test]
    fn test_contains() {
        let rule = contains("@", "not an email");
        assert_eq!(rule.validate("user.example.com"), Some("not an email".to_string()));
        assert_eq!(rule.validate("user@example.com"), None);
    }

    #[test]
    fn test_all_reports_first_failure() {
        let rule = all(vec![
            Box::new(required("required")),
            Box::new(contains("@", "missing @")),
        ]);
        assert_eq!(rule.len(), 2);
        assert_eq!(rule.validate(""), Some("required".to_string()));
        assert_eq!(rule.validate("abc"), Some("missing @".to_string()));
        assert_eq!(rule.validate("a@b"), None);
    }

    #[test]
    fn test_empty_all_accepts_everything() {
        let rule = all(Vec::new());
        assert!(rule.is_empty());
        assert_eq!(rule.validate(""), None);
    }

    #[test]
    fn test_closure_rule_may_return_blank_error() {
        let rule = |value: &str| (value == "bad").then(String::new);
        assert_eq!(rule.validate("bad"), Some(String::new()));
        assert_eq!(rule.validate("good"), None);
    }
}
