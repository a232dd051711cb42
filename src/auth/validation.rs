use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::{FieldError, LoginRequest, SignupRequest};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Collects every failing field; an empty vec means the request is acceptable.
pub fn validate_signup(req: &SignupRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if req.username.chars().count() < MIN_USERNAME_LEN {
        errors.push(FieldError::field(
            "username",
            "Username must be at least 3 characters",
        ));
    }
    if !is_valid_email(&req.email) {
        errors.push(FieldError::field("email", "Invalid email"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::field(
            "password",
            "Password must be at least 6 characters",
        ));
    }
    errors
}

pub fn validate_login(req: &LoginRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !is_valid_email(&req.email) {
        errors.push(FieldError::field("email", "Invalid email"));
    }
    if req.password.is_empty() {
        errors.push(FieldError::field("password", "Password cannot be blank"));
    }
    errors
}
