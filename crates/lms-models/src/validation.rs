//! Field rules shared by the request forms.
//!
//! Used from `#[validate(...)]` attributes:
//!
//! ```ignore
//! #[validate(length(min = 6, max = 40), regex(path = *PERSON_NAME, message = "..."))]
//! pub name: String,
//! #[validate(custom(function = "validate_password"))]
//! pub password: String,
//! ```

use std::borrow::Cow;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationError;

/// Two or three capitalised words separated by single spaces.
pub static PERSON_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:[А-ЯЁ][а-яё]+|[A-Z][a-z]+)(?:\s|$)){2,3}$")
        .unwrap_or_else(|e| panic!("invalid person name pattern: {e}"))
});

pub const PERSON_NAME_MESSAGE: &str = "name must be 2 or 3 words long, each word must start with a capital letter, name must not contain digits";

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, 'А'..='я' | 'Ё' | 'ё')
}

/// 8-20 characters, letters and digits only, at least one of each.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if !(8..=20).contains(&len) {
        return Err(error("password", "password must be 8-20 characters long"));
    }

    if !password.chars().all(|c| is_letter(c) || c.is_ascii_digit()) {
        return Err(error("password", "password must consist only of letters and digits"));
    }

    if !password.chars().any(is_letter) || !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(error("password", "password must contain at least one digit and letter"));
    }

    Ok(())
}

pub fn validate_lowercase(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(char::is_uppercase) {
        return Err(error("lowercase", "value must be lowercase"));
    }
    Ok(())
}

/// Lowercase, no spaces.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    validate_lowercase(username)?;
    if username.contains(' ') {
        return Err(error("username", "username must not contain spaces"));
    }
    Ok(())
}

pub fn validate_lowercase_list(values: &[String]) -> Result<(), ValidationError> {
    if values.iter().any(|v| validate_lowercase(v).is_err()) {
        return Err(error("lowercase", "each value must be lowercase"));
    }
    validate_unique(values)
}

pub fn validate_unique<T: Eq + Hash>(values: &[T]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(values.len());
    if values.iter().all(|v| seen.insert(v)) {
        Ok(())
    } else {
        Err(error("unique", "values must be unique"))
    }
}

/// `"default teacher"` → `"New Default Teacher"`.
pub fn default_name(role_title: &str) -> String {
    let words: Vec<String> = role_title
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    format!("New {}", words.join(" "))
}
