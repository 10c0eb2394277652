//! # Validation Module
//!
//! Form validation for Libris. Every rule runs before a request is built, so
//! a rejected form never reaches the network.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (client side)                                    │
//! │  ├── Required fields, ranges, email shape                              │
//! │  └── Per-field messages (FormErrors)                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: REST server                                                  │
//! │  ├── Existence checks (404)                                            │
//! │  └── Stock and loan rules (400)                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database                                                     │
//! │  ├── CHECK (available_copies BETWEEN 0 AND total_copies)               │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use libris_core::validation::validate_member_form;
//! use libris_core::MemberForm;
//!
//! let form = MemberForm {
//!     name: "Alice".into(),
//!     email: "alice@example".into(),
//!     phone: "555-0100".into(),
//!     ..Default::default()
//! };
//! let errors = validate_member_form(&form).unwrap_err();
//! assert_eq!(errors.message("email"), Some("Invalid email address"));
//! ```

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{FormErrors, ValidationError};
use crate::types::{BookForm, BookId, IssueBookRequest, MemberForm, MemberId};
use crate::{MAX_PUBLICATION_YEAR, MIN_PUBLICATION_YEAR};

/// Result type for single-value validators.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// `local@domain.tld`, no whitespace, exactly the shape the UI accepts.
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

// =============================================================================
// Field Validators
// =============================================================================

/// Rejects empty or whitespace-only text.
///
/// ## Example
/// ```rust
/// use libris_core::validation::validate_required;
///
/// assert!(validate_required("Title", "Dune").is_ok());
/// assert!(validate_required("Title", "   ").is_err());
/// ```
pub fn validate_required(label: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(label));
    }
    Ok(())
}

/// Publication year must fall within [1000, 2100].
pub fn validate_year(year: i32) -> ValidationResult<()> {
    if !(MIN_PUBLICATION_YEAR..=MAX_PUBLICATION_YEAR).contains(&year) {
        return Err(ValidationError::OutOfRange {
            field: "year".to_string(),
            min: MIN_PUBLICATION_YEAR as i64,
            max: MAX_PUBLICATION_YEAR as i64,
        });
    }
    Ok(())
}

/// Checks both copy counts together.
///
/// ## Rules
/// ```text
/// total_copies     < 1            → "Must have at least 1 copy"
/// available_copies < 0            → "Cannot be negative"
/// available_copies > total_copies → "Cannot exceed total copies"
/// ```
///
/// Returns `(total_error, available_error)` so both fields can be flagged
/// from one submission.
pub fn validate_copies(
    total_copies: i32,
    available_copies: i32,
) -> (Option<ValidationError>, Option<ValidationError>) {
    let total = (total_copies < 1).then_some(ValidationError::TooFewCopies { min: 1 });

    let available = if available_copies < 0 {
        Some(ValidationError::Negative)
    } else if available_copies > total_copies {
        Some(ValidationError::ExceedsTotal)
    } else {
        None
    };

    (total, available)
}

/// Email must be present and shaped like `local@domain.tld`.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    validate_required("Email", email)?;

    if !email_regex().is_match(email.trim()) {
        return Err(ValidationError::InvalidFormat {
            field: "email address".to_string(),
        });
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (shows the full collection)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Form Validators
// =============================================================================

/// Validates the book create/edit form.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Books: Save                                                            │
/// │                                                                         │
/// │  validate_book_form(&form) ← THIS FUNCTION                             │
/// │       │                                                                 │
/// │       ├── Err(FormErrors) → messages under each field, no request      │
/// │       │                                                                 │
/// │       └── Ok → POST /books or PUT /books/{id}                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_book_form(form: &BookForm) -> Result<(), FormErrors> {
    let mut errors = FormErrors::new();

    if let Err(e) = validate_required("Title", &form.title) {
        errors.add("title", e);
    }
    if let Err(e) = validate_required("Author", &form.author) {
        errors.add("author", e);
    }
    if let Err(e) = validate_required("ISBN", &form.isbn) {
        errors.add("isbn", e);
    }
    if let Err(e) = validate_year(form.year) {
        errors.add("year", e);
    }

    let (total, available) = validate_copies(form.total_copies, form.available_copies);
    if let Some(e) = total {
        errors.add("totalCopies", e);
    }
    if let Some(e) = available {
        errors.add("availableCopies", e);
    }

    errors.into_result()
}

/// Validates the member create/edit form.
pub fn validate_member_form(form: &MemberForm) -> Result<(), FormErrors> {
    let mut errors = FormErrors::new();

    if let Err(e) = validate_required("Name", &form.name) {
        errors.add("name", e);
    }
    if let Err(e) = validate_email(&form.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_required("Phone", &form.phone) {
        errors.add("phone", e);
    }

    errors.into_result()
}

/// Validates the issue form's two selectors and builds the request.
pub fn validate_issue_selection(
    book_id: Option<BookId>,
    member_id: Option<MemberId>,
) -> Result<IssueBookRequest, FormErrors> {
    let mut errors = FormErrors::new();

    if book_id.is_none() {
        errors.add(
            "book",
            ValidationError::NotSelected {
                field: "book".to_string(),
            },
        );
    }
    if member_id.is_none() {
        errors.add(
            "member",
            ValidationError::NotSelected {
                field: "member".to_string(),
            },
        );
    }

    match (book_id, member_id) {
        (Some(book_id), Some(member_id)) => Ok(IssueBookRequest { book_id, member_id }),
        _ => Err(errors),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
