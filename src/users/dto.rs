use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::response::FieldErrors;

const MIN_PASSWORD_LEN: usize = 6;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.]{3,50}$").unwrap();
}

/// Request bodies that can be cleaned up and checked before reaching the service.
pub trait Validate {
    /// Trims and canonicalizes fields in place.
    fn normalize(&mut self) {}
    fn validate(&self) -> Result<(), FieldErrors>;
}

/// Body of `POST /users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `PUT`/`PATCH /users/{id}`. An absent or empty password keeps the
/// current one.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn normalize_identity(name: &mut String, username: &mut String, email: &mut String) {
    *name = name.trim().to_string();
    *username = username.trim().to_string();
    *email = email.trim().to_lowercase();
}

fn check_identity(name: &str, username: &str, email: &str, errors: &mut FieldErrors) {
    if name.is_empty() {
        errors.insert("name".into(), "is required".into());
    }
    if !USERNAME_RE.is_match(username) {
        errors.insert(
            "username".into(),
            "must be 3-50 letters, digits, '_' or '.'".into(),
        );
    }
    if !is_valid_email(email) {
        errors.insert("email".into(), "must be a valid email address".into());
    }
}

fn check_password(password: &str, errors: &mut FieldErrors) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(
            "password".into(),
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }
}

fn finish(errors: FieldErrors) -> Result<(), FieldErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl Validate for CreateUserRequest {
    fn normalize(&mut self) {
        normalize_identity(&mut self.name, &mut self.username, &mut self.email);
    }

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_identity(&self.name, &self.username, &self.email, &mut errors);
        check_password(&self.password, &mut errors);
        finish(errors)
    }
}

impl Validate for UpdateUserRequest {
    fn normalize(&mut self) {
        normalize_identity(&mut self.name, &mut self.username, &mut self.email);
    }

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_identity(&self.name, &self.username, &self.email, &mut errors);
        if let Some(password) = self.new_password() {
            check_password(password, &mut errors);
        }
        finish(errors)
    }
}
