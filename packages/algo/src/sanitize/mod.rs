//! Input Sanitization
//!
//! Boundary checks applied before any algorithm or state change runs.
//!
//! Functions:
//! - Required-field validation (ids, target word, point values, session length)
//! - Coercion of optional text fields

use thiserror::Error;

/// Malformed input to a core operation. Always raised before any state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
}

/// 校验必填文本字段，返回去除首尾空白后的值
pub fn require_text<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(trimmed)
}

/// Target word for a spelling check; whitespace-only targets are rejected.
pub fn validate_target(target: &str) -> Result<(), ValidationError> {
    require_text("target word", target).map(|_| ())
}

pub fn validate_base_points(base_points: u32) -> Result<(), ValidationError> {
    if base_points == 0 {
        return Err(ValidationError::NotPositive("base points"));
    }
    Ok(())
}

pub fn validate_max_words(max_words: usize) -> Result<(), ValidationError> {
    if max_words == 0 {
        return Err(ValidationError::NotPositive("max words"));
    }
    Ok(())
}

/// 可选文本字段：缺失时返回空字符串
pub fn coerce_optional_text(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}
