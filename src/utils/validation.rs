use crate::error::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::ValidationError;

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.@+-]+$").unwrap()
});

static SLUG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap()
});

/// 文本去除首尾空白后不能为空
pub fn validate_not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::from("This field is required"));
        return Err(error);
    }
    Ok(())
}

/// 身份提供方签发的用户名：只要求非空且不超过 150 个字符
pub fn validate_subject(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".to_string()));
    }

    if username.chars().count() > 150 {
        return Err(AppError::Validation("Username must be at most 150 characters".to_string()));
    }

    Ok(())
}

/// 验证本地创建的用户名格式
pub fn validate_username(username: &str) -> Result<()> {
    validate_subject(username)?;

    // 用户名只能包含字母、数字以及 @ . + - _
    if !USERNAME_REGEX.is_match(username) {
        return Err(AppError::Validation(
            "Username may contain only letters, digits and @/./+/-/_".to_string(),
        ));
    }

    Ok(())
}

/// 验证分组 slug 格式
pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || !SLUG_REGEX.is_match(slug) {
        return Err(AppError::Validation(format!("Invalid slug: {:?}", slug)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("hello").is_ok());
        assert!(validate_not_blank("  hello  ").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \n\t ").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("Shakespeare").is_ok());
        assert!(validate_username("leo.tolstoy@ru").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("with space").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_validate_subject_accepts_provider_names() {
        assert!(validate_subject("Jane Doe").is_ok());
        assert!(validate_subject("  ").is_err());
        assert!(validate_subject(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("test_group").is_ok());
        assert!(validate_slug("cats-and-dogs").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("no/slash").is_err());
    }
}
