//! Client-side checks run before any create/update request leaves the form.

use std::fmt;

use thiserror::Error;

/// Shortest accepted title, counted in characters after trimming.
pub const MIN_TITLE_LEN: usize = 3;

/// Form inputs that can carry their own error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Title,
}

impl FormField {
    /// Maps the `field` attribute of a service error body. Unknown names are
    /// reported as general errors by the caller.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "title" => Some(FormField::Title),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Title => "title",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: FormField },
    #[error("{field} must be at least {min} characters")]
    TooShort { field: FormField, min: usize },
}

impl ValidationError {
    pub fn field(&self) -> FormField {
        match self {
            ValidationError::MissingField { field } | ValidationError::TooShort { field, .. } => *field,
        }
    }
}

/// Messages currently shown by one form: one slot per field plus a general one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    title: Option<String>,
    general: Option<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.general.is_none()
    }

    pub fn field(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Title => self.title.as_deref(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.field(FormField::Title)
    }

    pub fn general(&self) -> Option<&str> {
        self.general.as_deref()
    }

    pub fn set_field(&mut self, field: FormField, message: impl Into<String>) {
        match field {
            FormField::Title => self.title = Some(message.into()),
        }
    }

    pub fn set_general(&mut self, message: impl Into<String>) {
        self.general = Some(message.into());
    }

    /// Drops the message of one field, leaving the general message alone.
    pub fn clear_field(&mut self, field: FormField) {
        match field {
            FormField::Title => self.title = None,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl From<ValidationError> for FormErrors {
    fn from(err: ValidationError) -> Self {
        let mut errors = FormErrors::new();
        errors.set_field(err.field(), err.to_string());
        errors
    }
}

pub fn check_title(title: &str) -> Result<(), ValidationError> {
    let len = title.trim().chars().count();
    if len == 0 {
        Err(ValidationError::MissingField { field: FormField::Title })
    } else if len < MIN_TITLE_LEN {
        Err(ValidationError::TooShort {
            field: FormField::Title,
            min: MIN_TITLE_LEN,
        })
    } else {
        Ok(())
    }
}

/// Runs every form check and collects a fresh error set. Empty means valid.
pub fn validate(title: &str) -> FormErrors {
    match check_title(title) {
        Ok(()) => FormErrors::new(),
        Err(err) => err.into(),
    }
}
