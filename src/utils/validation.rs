use crate::utils::error::AppError;

/// Field-level input rules.
///
/// Built once from configuration and handed to handlers through the
/// application state, so tests can construct their own instance.
#[derive(Debug, Clone)]
pub struct Validator {
    min_password_len: usize,
}

/// Accumulates violations for one value.
#[derive(Debug, Default)]
pub struct Report {
    messages: Vec<String>,
}

/// Implemented by every inbound payload that carries user input.
pub trait Validate {
    fn validate(&self, rules: &Validator, report: &mut Report);
}

impl Validator {
    pub fn new(min_password_len: usize) -> Self {
        Self { min_password_len }
    }

    pub fn min_password_len(&self) -> usize {
        self.min_password_len
    }

    pub fn check<T: Validate>(&self, value: &T) -> Result<(), AppError> {
        let mut report = Report::default();
        value.validate(self, &mut report);
        report.into_result()
    }

    pub fn required(&self, report: &mut Report, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            report.push(format!("{} is required", field));
            return false;
        }
        true
    }

    pub fn email(&self, report: &mut Report, field: &str, value: &str) {
        if !is_valid_email(value) {
            report.push(format!("{} must be a valid email address", field));
        }
    }

    pub fn password(&self, report: &mut Report, field: &str, value: &str) {
        if value.chars().count() < self.min_password_len {
            report.push(format!(
                "{} must be at least {} characters in length",
                field, self.min_password_len
            ));
        }
    }

    pub fn equal(
        &self,
        report: &mut Report,
        field: &str,
        other_field: &str,
        value: &str,
        other: &str,
    ) {
        if value != other {
            report.push(format!("{} must be equal to {}", field, other_field));
        }
    }

    pub fn between(&self, report: &mut Report, field: &str, value: u64, min: u64, max: u64) {
        if value < min || value > max {
            report.push(format!("{} must be between {} and {}", field, min, max));
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(6)
    }
}

impl Report {
    pub fn push(&mut self, message: String) {
        self.messages.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "validation failed: {}",
                self.messages.join(", ")
            )))
        }
    }
}

fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
