use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Field-level validation messages accumulated while processing a form, in
/// insertion order. Re-rendered next to the offending input.
#[derive(Debug, Default)]
pub struct FormErrors {
    entries: Vec<(&'static str, String)>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.entries.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
    }
}

/// POST /signup form body. Fields default to empty so missing inputs are
/// reported as validation errors rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignupForm {
    pub fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
    }

    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        if self.first_name.trim().is_empty() {
            errors.add("first_name", "This field is required");
        }
        if self.last_name.trim().is_empty() {
            errors.add("last_name", "This field is required");
        }
        if self.email.is_empty() {
            errors.add("email", "This field is required");
        } else if !is_valid_email(&self.email) {
            errors.add("email", "Enter a valid email address");
        }
        if self.password.is_empty() {
            errors.add("password", "This field is required");
        } else if self.password.len() < 8 {
            errors.add("password", "Password must be at least 8 characters");
        }
        errors
    }
}

/// POST /login form body.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
    }

    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        if self.email.is_empty() {
            errors.add("email", "This field is required");
        } else if !is_valid_email(&self.email) {
            errors.add("email", "Enter a valid email address");
        }
        if self.password.is_empty() {
            errors.add("password", "This field is required");
        }
        errors
    }
}
