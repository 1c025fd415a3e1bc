//! Stateless field predicates composed by [`super::repo_types::UserRecord::validate`].
//!
//! Each predicate takes the candidate value and returns the violation for that
//! field, if any.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::repo_types::Gender;
use crate::errors::FieldError;

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 50;
pub const AGE_MAX: i64 = 120;
pub const ABOUT_MAX: usize = 500;
pub const PASSWORD_MIN: usize = 8;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn check_name(field: &'static str, value: &str) -> Option<FieldError> {
    lazy_static! {
        static ref NAME_RE: Regex = Regex::new(r"^[A-Za-z ]+$").unwrap();
    }
    if value.is_empty() {
        return Some(FieldError::new(field, "is required"));
    }
    let len = value.chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&len) {
        return Some(FieldError::new(
            field,
            format!("must be between {NAME_MIN} and {NAME_MAX} characters"),
        ));
    }
    if !NAME_RE.is_match(value) {
        return Some(FieldError::new(field, "can only contain letters"));
    }
    None
}

pub fn check_email(value: &str) -> Option<FieldError> {
    if value.is_empty() {
        return Some(FieldError::new("emailId", "is required"));
    }
    if !is_valid_email(value) {
        return Some(FieldError::new("emailId", "invalid email address"));
    }
    None
}

pub fn check_age(value: Option<i64>) -> Option<FieldError> {
    match value {
        Some(age) if age < 0 => Some(FieldError::new("age", "must be at least 0")),
        Some(age) if age > AGE_MAX => {
            Some(FieldError::new("age", format!("must be at most {AGE_MAX}")))
        }
        _ => None,
    }
}

pub fn check_skills(value: &[String]) -> Option<FieldError> {
    if value.iter().any(|s| s.trim().is_empty()) {
        return Some(FieldError::new("skills", "entries must not be empty"));
    }
    None
}

pub fn check_about(value: &str) -> Option<FieldError> {
    if value.chars().count() > ABOUT_MAX {
        return Some(FieldError::new(
            "about",
            format!("must be at most {ABOUT_MAX} characters"),
        ));
    }
    None
}

/// Length constraint on a plaintext password before it is hashed.
pub fn check_password(plain: &str) -> Option<FieldError> {
    if plain.is_empty() {
        return Some(FieldError::new("password", "is required"));
    }
    if plain.chars().count() < PASSWORD_MIN {
        return Some(FieldError::new(
            "password",
            format!("must be at least {PASSWORD_MIN} characters"),
        ));
    }
    None
}

/// At least 8 characters with an uppercase letter, a lowercase letter, a digit and a symbol.
pub fn is_strong_password(plain: &str) -> bool {
    plain.chars().count() >= PASSWORD_MIN
        && plain.chars().any(|c| c.is_uppercase())
        && plain.chars().any(|c| c.is_lowercase())
        && plain.chars().any(|c| c.is_ascii_digit())
        && plain.chars().any(|c| !c.is_alphanumeric())
}

/// Reads an `age` value from client JSON; `null` clears it.
pub fn parse_age(value: &Value) -> Result<Option<i32>, FieldError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            let age = n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() <= i32::MAX as f64)
                        .map(|f| f as i64)
                })
                .ok_or_else(|| FieldError::new("age", "must be an integer"))?;
            if let Some(err) = check_age(Some(age)) {
                return Err(err);
            }
            Ok(Some(age as i32))
        }
        _ => Err(FieldError::new("age", "must be an integer")),
    }
}

pub fn parse_gender(value: &str) -> Result<Gender, FieldError> {
    Gender::parse(value).ok_or_else(|| {
        FieldError::new("gender", "must be one of male, female, non-binary, other")
    })
}

/// Reads a `gender` value from client JSON.
pub fn parse_gender_value(value: &Value) -> Result<Gender, FieldError> {
    value
        .as_str()
        .ok_or_else(|| FieldError::new("gender", "must be a string"))
        .and_then(parse_gender)
}

pub fn parse_name(field: &'static str, value: &Value) -> Result<String, FieldError> {
    value
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| FieldError::new(field, "must be a string"))
}

/// Reads an optional text field; absent and `null` both read as empty.
pub fn parse_text(field: &'static str, value: Option<&Value>) -> Result<String, FieldError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(FieldError::new(field, "must be a string")),
    }
}

pub fn parse_skills(value: Option<&Value>) -> Result<Vec<String>, FieldError> {
    let invalid = || FieldError::new("skills", "must be a list of strings");
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(|s| s.trim().to_string()).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_syntax() {
        assert!(is_valid_email("ann@x.com"));
        assert!(!is_valid_email("ann@x"));
        assert!(!is_valid_email("ann x@x.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(check_email("").is_some());
    }

    #[test]
    fn names_are_letters_within_bounds() {
        assert!(check_name("firstName", "Ann").is_none());
        assert!(check_name("firstName", "Mary Ann").is_none());
        assert!(check_name("firstName", "A").is_some());
        assert!(check_name("firstName", &"a".repeat(51)).is_some());
        assert!(check_name("firstName", "R2D2").is_some());
        assert_eq!(check_name("lastName", "").unwrap().message, "is required");
    }

    #[test]
    fn age_bounds() {
        assert!(check_age(None).is_none());
        assert!(check_age(Some(0)).is_none());
        assert!(check_age(Some(120)).is_none());
        assert!(check_age(Some(121)).is_some());
        assert!(check_age(Some(-1)).is_some());
    }

    #[test]
    fn skills_and_about() {
        assert!(check_skills(&["rust".into(), "go".into()]).is_none());
        assert!(check_skills(&["rust".into(), "  ".into()]).is_some());
        assert!(check_about(&"x".repeat(500)).is_none());
        assert!(check_about(&"x".repeat(501)).is_some());
    }

    #[test]
    fn password_strength_policy() {
        assert!(is_strong_password("Str0ng!pw"));
        assert!(!is_strong_password("abc"));
        assert!(!is_strong_password("alllower1!"));
        assert!(!is_strong_password("ALLUPPER1!"));
        assert!(!is_strong_password("NoDigits!!"));
        assert!(!is_strong_password("NoSymb0ls"));
        assert!(!is_strong_password("S0!a"));
    }

    #[test]
    fn age_parsing() {
        use serde_json::json;
        assert_eq!(parse_age(&json!(31)), Ok(Some(31)));
        assert_eq!(parse_age(&json!(null)), Ok(None));
        assert_eq!(parse_age(&json!(31.0)), Ok(Some(31)));
        assert!(parse_age(&json!(31.5)).is_err());
        assert!(parse_age(&json!(1e300)).is_err());
        assert!(parse_age(&json!("31")).is_err());
        assert!(parse_age(&json!(5_000_000_000i64)).is_err());
    }

    #[test]
    fn gender_parsing() {
        assert_eq!(parse_gender("non-binary"), Ok(Gender::NonBinary));
        assert_eq!(parse_gender("robot").unwrap_err().field, "gender");
    }

    #[test]
    fn json_type_coercions() {
        use serde_json::json;
        assert_eq!(parse_text("about", None), Ok(String::new()));
        assert_eq!(parse_text("about", Some(&json!(null))), Ok(String::new()));
        assert_eq!(parse_text("about", Some(&json!("hi"))), Ok("hi".to_string()));
        assert_eq!(parse_text("firstName", Some(&json!(5))).unwrap_err().field, "firstName");

        assert_eq!(
            parse_skills(Some(&json!([" rust ", "go"]))),
            Ok(vec!["rust".to_string(), "go".to_string()])
        );
        assert!(parse_skills(Some(&json!("rust"))).is_err());
        assert!(parse_skills(Some(&json!(["rust", 3]))).is_err());

        assert_eq!(parse_gender_value(&json!("male")), Ok(Gender::Male));
        assert!(parse_gender_value(&json!(1)).is_err());
    }

    #[test]
    fn password_length_constraint() {
        assert!(check_password("12345678").is_none());
        assert!(check_password("1234567").is_some());
        assert!(check_password("").is_some());
    }
}
