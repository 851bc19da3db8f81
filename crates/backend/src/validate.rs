use quill_database::{
    common::comment::MAX_COMMENT_DEPTH,
    error::{BackendError, BackendResult},
};
use regex::Regex;
use std::sync::LazyLock;

pub fn validate_email(email: &str) -> BackendResult<()> {
    #[expect(clippy::expect_used)]
    static EMAIL_REGEX: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("compile regex"));
    if !EMAIL_REGEX.is_match(email) {
        return Err(BackendError::invalid("Email is not valid"));
    }
    Ok(())
}

pub fn validate_full_name(name: &str) -> BackendResult<()> {
    let len = name.trim().chars().count();
    if !(3..=60).contains(&len) {
        return Err(BackendError::invalid("Invalid name"));
    }
    Ok(())
}

pub fn validate_not_empty(text: &str) -> BackendResult<()> {
    if text.trim().len() < 2 {
        return Err(BackendError::invalid("Empty text submitted"));
    }
    Ok(())
}

pub fn validate_comment_max_depth(depth: i32) -> BackendResult<()> {
    if depth > MAX_COMMENT_DEPTH {
        return Err(BackendError::invalid("Max comment depth reached"));
    }
    Ok(())
}

pub fn validate_new_password(password: &str, confirm_password: &str) -> BackendResult<()> {
    if password.len() < 8 {
        return Err(BackendError::invalid(
            "Passwords must have at least 8 characters",
        ));
    }

    if password != confirm_password {
        return Err(BackendError::invalid("Passwords dont match"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last@sub.example.org").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("spaces in@x.com").is_err());
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("longenough", "longenough").is_ok());
        assert!(validate_new_password("short", "short").is_err());
        assert!(validate_new_password("longenough", "different").is_err());
    }

    #[test]
    fn test_validate_comment_max_depth() {
        assert!(validate_comment_max_depth(0).is_ok());
        assert!(validate_comment_max_depth(MAX_COMMENT_DEPTH).is_ok());
        assert!(validate_comment_max_depth(MAX_COMMENT_DEPTH + 1).is_err());
    }
}
