//! # libris-core: Pure Domain Logic for Libris
//!
//! This crate is the **heart** of Libris. It contains the library domain
//! (books, members, loans) as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Libris Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Front-end (apps/console)                     │   │
//! │  │    Books ──► Members ──► Issue ──► Return ──► Dashboard         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              libris-client (API, cache, workflows)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ libris-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   loans   │  │  search   │  │ validation│  │   │
//! │  │   │   Book    │  │  due date │  │  filter   │  │ book form │  │   │
//! │  │   │  Member   │  │   fines   │  │   pages   │  │ member    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain and wire types (Book, Member, Transaction, etc.)
//! - [`validation`] - Book/member form rules with per-field messages
//! - [`loans`] - Due dates, overdue status, fines and loan limits
//! - [`search`] - Client-side filtering and fixed-size pagination
//! - [`money`] - Integer-cents Money type (fines)
//! - [`dates`] - Lenient wire date parsing
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use libris_core::validation::validate_book_form;
//! use libris_core::BookForm;
//!
//! let mut form = BookForm::blank(2024);
//! form.title = "Dune".into();
//! form.author = "Frank Herbert".into();
//! form.isbn = "9780441013593".into();
//! form.year = 900;
//!
//! let errors = validate_book_form(&form).unwrap_err();
//! assert_eq!(errors.message("year"), Some("Invalid year"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dates;
pub mod error;
pub mod loans;
pub mod money;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, FormErrors, ValidationError};
pub use loans::LoanPolicy;
pub use money::Money;
pub use search::Page;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Rows shown per page in book and member tables.
pub const PAGE_SIZE: usize = 8;

/// Days between issue date and due date.
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Fine charged per full day a book is kept past its due date.
pub const FINE_PER_DAY_CENTS: i64 = 50;

/// Earliest publication year accepted by the book form.
pub const MIN_PUBLICATION_YEAR: i32 = 1000;

/// Latest publication year accepted by the book form.
pub const MAX_PUBLICATION_YEAR: i32 = 2100;
