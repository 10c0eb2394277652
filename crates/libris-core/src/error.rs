//! # Error Types
//!
//! Domain-specific error types for libris-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  libris-core errors (this file)                                        │
//! │  ├── CoreError        - Loan rule violations, missing records          │
//! │  ├── ValidationError  - A single field failed a rule                   │
//! │  └── FormErrors       - Every failed field of one form submission      │
//! │                                                                         │
//! │  libris-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  libris-client errors                                                  │
//! │  └── ClientError      - What the front-end sees (code + message)       │
//! │                                                                         │
//! │  Flow: ValidationError → FormErrors → CoreError → ClientError → UI     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (title, id, etc.)
//! 3. `ValidationError` displays the exact text shown next to a form field

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business rule errors.
///
/// These errors represent loan rule violations or references to records
/// that do not exist. The demo backend maps them onto HTTP statuses.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Book cannot be found.
    #[error("Book not found with ID: {0}")]
    BookNotFound(i64),

    /// Member cannot be found.
    #[error("Member not found with ID: {0}")]
    MemberNotFound(i64),

    /// Transaction cannot be found.
    #[error("Transaction not found with ID: {0}")]
    TransactionNotFound(i64),

    /// Every copy of the book is already on loan.
    ///
    /// ## When This Occurs
    /// - Issuing a book whose `available_copies` is 0
    /// - Two librarians issuing the last copy at the same time
    #[error("No copies available")]
    NoCopiesAvailable(i64),

    /// Member is deactivated and cannot borrow.
    #[error("Member '{name}' is not active")]
    MemberInactive { name: String },

    /// Member already holds the maximum number of books for their type.
    ///
    /// ## User Workflow
    /// ```text
    /// Issue "Dune" to Alice (STUDENT, 5 open loans)
    ///      │
    ///      ▼
    /// max_books(STUDENT) = 5
    ///      │
    ///      ▼
    /// LoanLimitReached { name: "Alice", max: 5, member_type: "student" }
    /// ```
    #[error("Member '{name}' has reached the maximum number of borrowed books ({max} for {member_type})")]
    LoanLimitReached {
        name: String,
        member_type: String,
        max: u32,
    },

    /// Transaction was already closed by an earlier return.
    #[error("This book has already been returned")]
    AlreadyReturned(i64),

    /// Book still has copies out on loan.
    #[error("Cannot delete book with active loans")]
    BookHasActiveLoans(i64),

    /// Member still holds unreturned books.
    #[error("Cannot delete member with {count} active loan(s)")]
    MemberHasActiveLoans { id: i64, count: i64 },

    /// A form failed one or more field rules.
    #[error("{0}")]
    InvalidForm(FormErrors),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Single-field validation errors.
///
/// The `Display` text is the message rendered next to the offending field,
/// so wording matters here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is outside its accepted range.
    #[error("Invalid {field}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Fewer copies than the minimum stock for a title.
    #[error("Must have at least {min} copy")]
    TooFewCopies { min: i64 },

    /// Count that may not drop below zero.
    #[error("Cannot be negative")]
    Negative,

    /// Available copies larger than total copies.
    #[error("Cannot exceed total copies")]
    ExceedsTotal,

    /// Value does not match the expected shape (e.g. email address).
    #[error("Invalid {field}")]
    InvalidFormat { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A selector was submitted with nothing chosen.
    #[error("Please select a {field}")]
    NotSelected { field: String },
}

impl ValidationError {
    /// Creates a Required error for a display label ("Title", "Email").
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Form Errors
// =============================================================================

/// Per-field messages collected from one form submission.
///
/// Keys are the form's field names (`title`, `availableCopies`, ...) and
/// values are the rendered messages. Ordered so output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, String>);

impl FormErrors {
    /// Creates an empty error set.
    pub fn new() -> Self {
        FormErrors::default()
    }

    /// Records the first failure for `field`; later ones are ignored.
    pub fn add(&mut self, field: &str, error: ValidationError) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| error.to_string());
    }

    /// Message for a field, if it failed.
    pub fn message(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing failed, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl From<FormErrors> for CoreError {
    fn from(errors: FormErrors) -> Self {
        CoreError::InvalidForm(errors)
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::LoanLimitReached {
            name: "Alice".to_string(),
            member_type: "student".to_string(),
            max: 5,
        };
        assert_eq!(
            err.to_string(),
            "Member 'Alice' has reached the maximum number of borrowed books (5 for student)"
        );
        assert_eq!(
            CoreError::AlreadyReturned(3).to_string(),
            "This book has already been returned"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("Title").to_string(), "Title is required");
        let err = ValidationError::OutOfRange {
            field: "year".to_string(),
            min: 1000,
            max: 2100,
        };
        assert_eq!(err.to_string(), "Invalid year");
        assert_eq!(
            ValidationError::TooFewCopies { min: 1 }.to_string(),
            "Must have at least 1 copy"
        );
        assert_eq!(
            ValidationError::NotSelected {
                field: "book".to_string()
            }
            .to_string(),
            "Please select a book"
        );
    }

    #[test]
    fn test_form_errors_keep_first_failure() {
        let mut errors = FormErrors::new();
        errors.add("availableCopies", ValidationError::Negative);
        errors.add("availableCopies", ValidationError::ExceedsTotal);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.message("availableCopies"), Some("Cannot be negative"));
        assert!(errors.clone().into_result().is_err());
        assert!(FormErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_form_errors_serialize_as_map() {
        let mut errors = FormErrors::new();
        errors.add("title", ValidationError::required("Title"));
        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(json, r#"{"title":"Title is required"}"#);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("Name").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
