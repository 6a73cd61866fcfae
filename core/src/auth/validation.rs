// voyage/src/auth/validation.rs

//! Local field validation, run before anything is sent to the provider.

use crate::error::FieldErrors;

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn is_valid_email(email: &str) -> bool {
  let email = email.trim();
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && domain.contains('.')
    && !domain.starts_with('.')
    && !domain.ends_with('.')
    && !email.chars().any(char::is_whitespace)
}

/// Digits with optional leading `+` and spaces or dashes between groups.
pub fn is_valid_phone(phone: &str) -> bool {
  let phone = phone.trim();
  let digits = phone.chars().filter(char::is_ascii_digit).count();
  let body = phone.strip_prefix('+').unwrap_or(phone);
  (7..=15).contains(&digits) && body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
}

pub fn check_email(errors: &mut FieldErrors, email: &str) {
  if email.trim().is_empty() {
    errors.add("email", "Email is required.");
  } else if !is_valid_email(email) {
    errors.add("email", "Enter a valid email address.");
  }
}

pub fn check_password(errors: &mut FieldErrors, field: &str, password: &str) {
  if password.is_empty() {
    errors.add(field, "Password is required.");
  } else if password.chars().count() < MIN_PASSWORD_LEN {
    errors.add(field, format!("Password must be at least {} characters.", MIN_PASSWORD_LEN));
  }
}

pub fn validate_sign_up(name: &str, email: &str, password: &str, phone: &str) -> FieldErrors {
  let mut errors = FieldErrors::new();
  if name.trim().is_empty() {
    errors.add("name", "Name is required.");
  }
  check_email(&mut errors, email);
  check_password(&mut errors, "password", password);
  if !phone.trim().is_empty() && !is_valid_phone(phone) {
    errors.add("phone", "Enter a valid phone number.");
  }
  errors
}

pub fn validate_sign_in(email: &str, password: &str) -> FieldErrors {
  let mut errors = FieldErrors::new();
  check_email(&mut errors, email);
  if password.is_empty() {
    errors.add("password", "Password is required.");
  }
  errors
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn emails() {
    assert!(is_valid_email("ana@example.com"));
    assert!(is_valid_email(" ana@mail.example.org "));
    for bad in ["", "ana", "ana@", "@example.com", "ana@example", "a b@example.com", "a@b@c.com", "a@.com"] {
      assert!(!is_valid_email(bad), "{bad}");
    }
  }

  #[test]
  fn phones() {
    assert!(is_valid_phone("+351 912-345-678"));
    assert!(is_valid_phone("5550100"));
    assert!(!is_valid_phone("555"));
    assert!(!is_valid_phone("555-CALL-NOW"));
  }

  #[test]
  fn sign_up_collects_every_field() {
    let errors = validate_sign_up("", "nope", "123", "12");
    assert_eq!(errors.len(), 4);
    assert_eq!(errors.get("password"), Some("Password must be at least 6 characters."));
    assert!(validate_sign_up("Ana", "ana@example.com", "secret", "").is_empty());
  }

  #[test]
  fn sign_in_only_requires_a_password() {
    assert!(validate_sign_in("ana@example.com", "x").is_empty());
    assert_eq!(validate_sign_in("ana@example.com", "").get("password"), Some("Password is required."));
  }
}
