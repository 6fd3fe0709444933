//! Form validation for the sign-in, sign-up, password recovery and profile
//! forms.
//!
//! Every field is checked (no early abort) and the first failing rule of each
//! field is reported, so a form can show all of its errors at once.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::{ProfileUpdate, SignUpRequest};

/// Minimum password length accepted by the forms
pub const MIN_PASSWORD_LENGTH: usize = 6;

const MSG_NAME_REQUIRED: &str = "Name is required";
const MSG_EMAIL_REQUIRED: &str = "Email is required";
const MSG_EMAIL_INVALID: &str = "Enter a valid email";
const MSG_PASSWORD_SHORT: &str = "At least 6 characters";
const MSG_FIELD_REQUIRED: &str = "Required field";
const MSG_CONFIRMATION_MISMATCH: &str = "Passwords do not match";

/// Field name → message for every field that failed
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{}", summarize(.errors))]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error unless the field already has one
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// `field: message` pairs joined with `; `
fn summarize(errors: &BTreeMap<&'static str, String>) -> String {
    errors
        .iter()
        .map(|(field, msg)| format!("{}: {}", field, msg))
        .collect::<Vec<_>>()
        .join("; ")
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Loose structural email check: `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

fn check_name(errors: &mut ValidationErrors, name: &str) {
    if name.trim().is_empty() {
        errors.add("name", MSG_NAME_REQUIRED);
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.trim().is_empty() {
        errors.add("email", MSG_EMAIL_REQUIRED);
    } else if !is_valid_email(email.trim()) {
        errors.add("email", MSG_EMAIL_INVALID);
    }
}

fn check_password_length(errors: &mut ValidationErrors, field: &'static str, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(field, MSG_PASSWORD_SHORT);
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl Validate for SignInForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        check_password_length(&mut errors, "password", &self.password);
        errors.into_result()
    }
}

impl Validate for SignUpRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, &self.name);
        check_email(&mut errors, &self.email);
        check_password_length(&mut errors, "password", &self.password);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForgotPasswordForm {
    pub email: String,
}

impl Validate for ForgotPasswordForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        errors.into_result()
    }
}

/// Raw input of the profile editor
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub old_password: String,
    pub password: String,
    pub password_confirmation: String,
}

impl ProfileForm {
    /// Prefill from the signed-in identity, password fields empty
    pub fn from_identity(identity: &crate::models::Identity) -> Self {
        Self {
            name: identity.name.clone(),
            email: identity.email.clone(),
            ..Self::default()
        }
    }

    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate::from_form(
            self.name.trim(),
            self.email.trim(),
            &self.old_password,
            &self.password,
            &self.password_confirmation,
        )
    }
}

impl Validate for ProfileForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, &self.name);
        check_email(&mut errors, &self.email);

        if !self.old_password.is_empty() {
            if self.password.is_empty() {
                errors.add("password", MSG_FIELD_REQUIRED);
            }
            if self.password_confirmation.is_empty() {
                errors.add("password_confirmation", MSG_FIELD_REQUIRED);
            }
        }
        if self.password_confirmation != self.password {
            errors.add("password_confirmation", MSG_CONFIRMATION_MISMATCH);
        }
        errors.into_result()
    }
}
