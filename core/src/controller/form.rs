//! State machine shared by the create and edit forms.
//!
//! ```text
//! Idle ──input──▶ Editing ──valid submit──▶ Submitting ──ok──▶ Idle
//!                   ▲  │ invalid submit          │
//!                   │  ▼                         │ error
//!                 Editing ◀──────────────────────┘
//! ```

use std::mem;

use tracing::debug;

use crate::client::ApiError;
use crate::validation::{validate, FormErrors, FormField};

/// What the user has typed plus the messages currently shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub description: String,
    pub errors: FormErrors,
}

impl Draft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            errors: FormErrors::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormState {
    /// Empty fields, nothing shown.
    #[default]
    Idle,
    Editing(Draft),
    /// A request is outstanding; inputs are disabled.
    Submitting(Draft),
}

/// Why a submit did not produce a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// Validation failed; the errors are on the form.
    Invalid,
    /// A request from this form is already in flight.
    Busy,
}

/// End result of one submit round.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T> {
    Done(T),
    Rejected(Rejected),
    /// The service or the network refused; the errors are on the form.
    Failed,
    /// An answer arrived while no submit was outstanding; nothing changed.
    Ignored,
}

impl<T> SubmitOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, SubmitOutcome::Done(_))
    }
}

impl FormState {
    pub fn draft(&self) -> Option<&Draft> {
        match self {
            FormState::Idle => None,
            FormState::Editing(draft) | FormState::Submitting(draft) => Some(draft),
        }
    }

    pub fn title(&self) -> &str {
        self.draft().map(|d| d.title.as_str()).unwrap_or("")
    }

    pub fn description(&self) -> &str {
        self.draft().map(|d| d.description.as_str()).unwrap_or("")
    }

    pub fn errors(&self) -> Option<&FormErrors> {
        self.draft().map(|d| &d.errors)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, FormState::Submitting(_))
    }

    /// Returns the draft to edit, or `None` while inputs are disabled.
    fn editable(&mut self) -> Option<&mut Draft> {
        if let FormState::Idle = self {
            *self = FormState::Editing(Draft::default());
        }
        match self {
            FormState::Editing(draft) => Some(draft),
            _ => None,
        }
    }

    /// Replaces the title. The title error goes away with the edit; a general
    /// error stays until the next submit.
    pub fn set_title(&mut self, title: impl Into<String>) -> bool {
        match self.editable() {
            Some(draft) => {
                draft.title = title.into();
                draft.errors.clear_field(FormField::Title);
                true
            }
            None => false,
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> bool {
        match self.editable() {
            Some(draft) => {
                draft.description = description.into();
                true
            }
            None => false,
        }
    }

    /// Validates and, when valid, moves to `Submitting`. Returns the trimmed
    /// title and the description to send.
    pub fn begin_submit(&mut self) -> Result<(String, String), Rejected> {
        let mut draft = match mem::take(self) {
            FormState::Submitting(draft) => {
                *self = FormState::Submitting(draft);
                return Err(Rejected::Busy);
            }
            FormState::Idle => Draft::default(),
            FormState::Editing(draft) => draft,
        };

        draft.errors = validate(&draft.title);
        if !draft.errors.is_empty() {
            debug!(errors = ?draft.errors, "form rejected before submit");
            *self = FormState::Editing(draft);
            return Err(Rejected::Invalid);
        }

        let values = (draft.title.trim().to_string(), draft.description.clone());
        *self = FormState::Submitting(draft);
        Ok(values)
    }

    /// Applies the answer to the outstanding request. Success empties the
    /// form; failure puts the message back on the draft. A result that
    /// arrives while nothing is outstanding is ignored and reported as `false`.
    pub fn finish_submit(&mut self, result: Result<(), &ApiError>) -> bool {
        let draft = match mem::take(self) {
            FormState::Submitting(draft) => draft,
            other => {
                *self = other;
                return false;
            }
        };

        match result {
            Ok(()) => *self = FormState::Idle,
            Err(err) => {
                let mut draft = draft;
                draft.errors = FormErrors::from(err);
                *self = FormState::Editing(draft);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_moves_idle_to_editing() {
        let mut form = FormState::default();
        assert!(form.set_title("Buy"));
        assert_eq!(form, FormState::Editing(Draft::new("Buy", "")));
    }

    #[test]
    fn test_submit_from_idle_reports_missing_title() {
        let mut form = FormState::default();

        assert_eq!(form.begin_submit(), Err(Rejected::Invalid));

        assert_eq!(form.errors().and_then(|e| e.title()), Some("title is required"));
        assert!(!form.is_submitting());
    }

    #[test]
    fn test_editing_title_clears_only_title_error() {
        let mut form = FormState::Editing(Draft::new("ab", ""));
        form.begin_submit().unwrap_err();
        if let FormState::Editing(draft) = &mut form {
            draft.errors.set_general("service unavailable");
        }

        form.set_title("abc");

        let errors = form.errors().unwrap();
        assert_eq!(errors.title(), None);
        assert_eq!(errors.general(), Some("service unavailable"));
    }

    #[test]
    fn test_inputs_disabled_while_submitting() {
        let mut form = FormState::Editing(Draft::new("  Buy milk ", "2L"));

        assert_eq!(
            form.begin_submit(),
            Ok(("Buy milk".to_string(), "2L".to_string()))
        );
        assert!(form.is_submitting());
        assert!(!form.set_title("changed"));
        assert!(!form.set_description("changed"));
        assert_eq!(form.begin_submit(), Err(Rejected::Busy));
        assert_eq!(form.title(), "  Buy milk ");
    }

    #[test]
    fn test_failure_returns_to_editing_with_message() {
        let mut form = FormState::Editing(Draft::new("Buy milk", ""));
        form.begin_submit().unwrap();

        let err = ApiError::General("server exploded".to_string());
        assert!(form.finish_submit(Err(&err)));

        assert!(matches!(form, FormState::Editing(_)));
        assert_eq!(form.errors().unwrap().general(), Some("server exploded"));
        assert_eq!(form.title(), "Buy milk");
    }

    #[test]
    fn test_success_returns_to_idle() {
        let mut form = FormState::Editing(Draft::new("Buy milk", "2L"));
        form.begin_submit().unwrap();

        assert!(form.finish_submit(Ok(())));

        assert_eq!(form, FormState::Idle);
        assert_eq!(form.title(), "");
        assert_eq!(form.description(), "");
    }

    #[test]
    fn test_stray_result_is_ignored() {
        let mut form = FormState::Editing(Draft::new("Buy milk", ""));
        assert!(!form.finish_submit(Ok(())));
        assert_eq!(form.title(), "Buy milk");
    }
}
