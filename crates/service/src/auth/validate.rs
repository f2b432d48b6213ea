use super::domain::{LoginInput, RegisterInput};
use super::errors::{AuthError, FieldError};

pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 50;
const EMAIL_MAX: usize = 254;

/// Trim whitespace and lowercase. Storage and lookups use this form so
/// `User@Example.com` and `user@example.com` are the same account.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn email_shape_ok(email: &str) -> bool {
    if email.is_empty() || email.len() > EMAIL_MAX {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if !email_shape_ok(&normalize_email(email)) {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
}

fn check_password(password: &str, errors: &mut Vec<FieldError>) {
    let chars = password.chars().count();
    if chars < PASSWORD_MIN || chars > PASSWORD_MAX {
        errors.push(FieldError::new(
            "password",
            format!("must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters"),
        ));
    }
}

/// Check a registration payload, collecting every failed field.
pub fn register_input(input: &RegisterInput) -> Result<(), AuthError> {
    let mut errors = Vec::new();
    check_email(&input.email, &mut errors);
    check_password(&input.password, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(errors))
    }
}

/// Check a login payload with the same rules as registration, so a payload
/// that could never have registered is rejected before any lookup.
pub fn login_input(input: &LoginInput) -> Result<(), AuthError> {
    let mut errors = Vec::new();
    check_email(&input.email, &mut errors);
    check_password(&input.password, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, password: &str) -> Result<(), AuthError> {
        register_input(&RegisterInput { email: email.into(), password: password.into() })
    }

    #[test]
    fn accepts_reasonable_input() {
        assert!(register("user@example.com", "secret1").is_ok());
        assert!(register("  User@Example.COM  ", "123456").is_ok());
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  User@Example.COM  "), "user@example.com");
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["", "plain", "@example.com", "user@", "user@host", "user@.com", "user@host."] {
            let err = register(email, "secret1").unwrap_err();
            match err {
                AuthError::Validation(fields) => {
                    assert_eq!(fields.len(), 1, "email {email:?}");
                    assert_eq!(fields[0].field, "email");
                }
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn password_bounds_count_characters() {
        assert!(register("user@example.com", "12345").is_err());
        assert!(register("user@example.com", &"x".repeat(51)).is_err());
        assert!(register("user@example.com", &"x".repeat(50)).is_ok());
        // six characters even though more than six bytes
        assert!(register("user@example.com", "sēcrēt").is_ok());
    }

    #[test]
    fn collects_all_failed_fields() {
        let err = register("nope", "123").unwrap_err();
        match err {
            AuthError::Validation(fields) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field).collect();
                assert_eq!(names, vec!["email", "password"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn login_rules_match_registration() {
        let ok = login_input(&LoginInput {
            email: "user@example.com".into(),
            password: "secret1".into(),
        });
        assert!(ok.is_ok());
        let err = login_input(&LoginInput { email: "user@example.com".into(), password: "123".into() });
        assert!(matches!(err, Err(AuthError::Validation(_))));
    }
}
