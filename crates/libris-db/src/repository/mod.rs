//! # Repository Module
//!
//! Database repository implementations for Libris.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DemoApi (libris-client)                                               │
//! │       │                                                                 │
//! │       │  db.transactions().issue(request, &policy, now)                │
//! │       ▼                                                                 │
//! │  TransactionRepository                                                 │
//! │  ├── list_active / list_overdue                                        │
//! │  ├── issue        one SQL transaction: rules + copy count + insert     │
//! │  └── return_book  one SQL transaction: fine + status + copy count      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BookRepository`](book::BookRepository) - Catalogue CRUD and search
//! - [`MemberRepository`](member::MemberRepository) - Member CRUD
//! - [`TransactionRepository`](transaction::TransactionRepository) - Issue, return, overdue
//! - [`ReportRepository`](report::ReportRepository) - Dashboard counters
//! - [`UserRepository`](user::UserRepository) - Staff accounts

pub mod book;
pub mod member;
pub mod report;
pub mod transaction;
pub mod user;

/// Escapes `%`, `_` and `\` so user input is matched literally by
/// `LIKE ... ESCAPE '\'`.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
