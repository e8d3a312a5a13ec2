//! 业务规则验证
//!
//! 校验待发布消息的用户名和正文。所有规则独立执行，
//! 违反的每一条都会被报告，而不是只返回第一条。

use serde_json::Value;

use crate::errors::{DomainError, DomainResult};

/// 用户名去除首尾空白后的最大字符数
pub const MAX_USERNAME_CHARS: usize = 50;

/// 消息正文去除首尾空白后的最大字符数
pub const MAX_MESSAGE_CHARS: usize = 500;

/// 消息发布规则
pub struct MessageRules;

impl MessageRules {
    /// 校验一组（用户名，正文）候选值，返回全部错误信息；空列表表示通过。
    ///
    /// `None` 表示字段缺失，`Some(Value::Null)` 表示显式的 `null`，两者都视为未提供。
    pub fn validate(username: Option<&Value>, message: Option<&Value>) -> Vec<String> {
        let mut errors = Vec::new();
        Self::check_username(username, &mut errors);
        Self::check_message(message, &mut errors);
        errors
    }

    /// 与 [`MessageRules::validate`] 相同，但把错误列表包装成 [`DomainError`]。
    pub fn ensure_valid(username: Option<&Value>, message: Option<&Value>) -> DomainResult<()> {
        let errors = Self::validate(username, message);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::validation_failed(errors))
        }
    }

    fn check_username(value: Option<&Value>, errors: &mut Vec<String>) {
        let raw = match value {
            None | Some(Value::Null) => {
                errors.push("Username is required".to_string());
                return;
            }
            Some(Value::String(raw)) => raw,
            Some(_) => {
                errors.push("Username must be a string".to_string());
                return;
            }
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            errors.push("Username cannot be empty".to_string());
            return;
        }
        if trimmed.chars().count() > MAX_USERNAME_CHARS {
            errors.push(format!(
                "Username must be {} characters or less",
                MAX_USERNAME_CHARS
            ));
        }
        if !trimmed.chars().all(is_allowed_username_char) {
            errors.push("Username contains invalid characters".to_string());
        }
    }

    fn check_message(value: Option<&Value>, errors: &mut Vec<String>) {
        let raw = match value {
            None | Some(Value::Null) => {
                errors.push("Message is required".to_string());
                return;
            }
            Some(Value::String(raw)) => raw,
            Some(_) => {
                errors.push("Message must be a string".to_string());
                return;
            }
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            errors.push("Message cannot be empty".to_string());
            return;
        }
        if trimmed.chars().count() > MAX_MESSAGE_CHARS {
            errors.push(format!(
                "Message must be {} characters or less",
                MAX_MESSAGE_CHARS
            ));
        }
    }
}

/// 用户名允许的字符：ASCII 字母数字、平假名、片假名、常用汉字、空白、`-`、`_`、`.`
fn is_allowed_username_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || ch.is_whitespace()
        || matches!(ch, '-' | '_' | '.')
        || matches!(ch, '\u{3040}'..='\u{309F}') // 平假名
        || matches!(ch, '\u{30A0}'..='\u{30FF}') // 片假名
        || matches!(ch, '\u{4E00}'..='\u{9FAF}') // CJK 统一表意文字
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate_strs(username: &str, message: &str) -> Vec<String> {
        MessageRules::validate(Some(&json!(username)), Some(&json!(message)))
    }

    #[test]
    fn test_valid_input_has_no_errors() {
        assert!(validate_strs("alice", "hello").is_empty());
        assert!(validate_strs("田中 太郎", "こんにちは").is_empty());
        assert!(validate_strs("カタカナ-user_1.0", "ok").is_empty());
    }

    #[test]
    fn test_empty_username() {
        let errors = validate_strs("", "hello");
        assert_eq!(errors, vec!["Username cannot be empty".to_string()]);

        let errors = validate_strs("   ", "hello");
        assert_eq!(errors, vec!["Username cannot be empty".to_string()]);
    }

    #[test]
    fn test_missing_fields_report_both() {
        let errors = MessageRules::validate(None, None);
        assert!(errors.contains(&"Username is required".to_string()));
        assert!(errors.contains(&"Message is required".to_string()));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_null_fields_are_treated_as_missing() {
        let errors = MessageRules::validate(Some(&Value::Null), Some(&Value::Null));
        assert_eq!(
            errors,
            vec![
                "Username is required".to_string(),
                "Message is required".to_string()
            ]
        );
    }

    #[test]
    fn test_non_string_fields() {
        let errors = MessageRules::validate(Some(&json!(42)), Some(&json!(["hi"])));
        assert_eq!(
            errors,
            vec![
                "Username must be a string".to_string(),
                "Message must be a string".to_string()
            ]
        );
    }

    #[test]
    fn test_username_length_boundary() {
        let exact = "a".repeat(MAX_USERNAME_CHARS);
        assert!(validate_strs(&exact, "hello").is_empty());

        let over = "a".repeat(MAX_USERNAME_CHARS + 1);
        assert_eq!(
            validate_strs(&over, "hello"),
            vec!["Username must be 50 characters or less".to_string()]
        );
    }

    #[test]
    fn test_username_length_uses_trimmed_value() {
        let padded = format!("  {}  ", "a".repeat(MAX_USERNAME_CHARS));
        assert!(validate_strs(&padded, "hello").is_empty());
    }

    #[test]
    fn test_username_length_counts_characters_not_bytes() {
        let kanji = "漢".repeat(MAX_USERNAME_CHARS);
        assert!(validate_strs(&kanji, "hello").is_empty());
    }

    #[test]
    fn test_message_length_boundary() {
        let exact = "b".repeat(MAX_MESSAGE_CHARS);
        assert!(validate_strs("alice", &exact).is_empty());

        let over = "b".repeat(MAX_MESSAGE_CHARS + 1);
        assert_eq!(
            validate_strs("alice", &over),
            vec!["Message must be 500 characters or less".to_string()]
        );
    }

    #[test]
    fn test_whitespace_only_message() {
        assert_eq!(
            validate_strs("alice", " \n\t "),
            vec!["Message cannot be empty".to_string()]
        );
    }

    #[test]
    fn test_invalid_username_characters() {
        for name in ["<b>", "alice!", "bob@home", "émile", "a/b"] {
            assert_eq!(
                validate_strs(name, "hello"),
                vec!["Username contains invalid characters".to_string()],
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_all_rules_reported_together() {
        let long_and_bad = format!("{}!", "a".repeat(MAX_USERNAME_CHARS));
        let errors = validate_strs(&long_and_bad, "");
        assert_eq!(
            errors,
            vec![
                "Username must be 50 characters or less".to_string(),
                "Username contains invalid characters".to_string(),
                "Message cannot be empty".to_string(),
            ]
        );
    }

    #[test]
    fn test_ensure_valid_wraps_errors() {
        let result = MessageRules::ensure_valid(Some(&json!("")), Some(&json!("hi")));
        match result {
            Err(DomainError::ValidationFailed { details }) => {
                assert_eq!(details, vec!["Username cannot be empty".to_string()]);
            }
            other => panic!("Expected ValidationFailed, got {:?}", other),
        }
    }
}
