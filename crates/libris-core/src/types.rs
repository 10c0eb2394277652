//! # Domain Types
//!
//! Core domain types used throughout Libris. These are also the REST wire
//! types: JSON field names are camelCase and enum values SCREAMING_CASE.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Book       │   │     Member      │   │   Transaction   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  title, author  │   │  name, email    │   │  book_id (FK)   │       │
//! │  │  isbn, genre    │   │  member_type    │   │  member_id (FK) │       │
//! │  │  total_copies   │   │  active         │   │  due_date       │       │
//! │  │  available      │◄──┼─────────────────┼──►│  status, fine   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   MemberType    │   │TransactionStatus│   │      Role       │       │
//! │  │  STUDENT        │   │  ISSUED         │   │  ADMIN          │       │
//! │  │  FACULTY        │   │  RETURNED       │   │  LIBRARIAN      │       │
//! │  │  STAFF          │   │  OVERDUE        │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - `0 <= available_copies <= total_copies`
//! - `status == Returned` iff `return_date` is set
//! - `status == Overdue` iff unreturned past `due_date`

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;

/// Server-assigned identifiers.
pub type BookId = i64;
pub type MemberId = i64;
pub type TransactionId = i64;

// =============================================================================
// Book
// =============================================================================

/// A title in the catalogue and its copy counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    #[serde(default)]
    pub publisher: String,
    pub year: i32,
    #[serde(default)]
    pub genre: String,
    pub total_copies: i32,
    pub available_copies: i32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::dates::flexible_option"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::dates::flexible_option"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Book {
    /// Whether at least one copy can be issued.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Copies currently on loan.
    #[inline]
    pub fn issued_copies(&self) -> i32 {
        self.total_copies - self.available_copies
    }

    /// Label used in the issue form's book selector.
    pub fn option_label(&self) -> String {
        format!(
            "{} by {} ({} available)",
            self.title, self.author, self.available_copies
        )
    }
}

/// Payload for creating or updating a book (`BookFormData` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub year: i32,
    pub genre: String,
    pub total_copies: i32,
    pub available_copies: i32,
}

impl BookForm {
    /// An empty form for a new title: one copy, published `current_year`.
    pub fn blank(current_year: i32) -> Self {
        BookForm {
            title: String::new(),
            author: String::new(),
            isbn: String::new(),
            publisher: String::new(),
            year: current_year,
            genre: String::new(),
            total_copies: 1,
            available_copies: 1,
        }
    }
}

impl Default for BookForm {
    fn default() -> Self {
        BookForm::blank(Utc::now().year())
    }
}

/// Pre-fills the edit form from an existing record.
impl From<&Book> for BookForm {
    fn from(book: &Book) -> Self {
        BookForm {
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            publisher: book.publisher.clone(),
            year: book.year,
            genre: book.genre.clone(),
            total_copies: book.total_copies,
            available_copies: book.available_copies,
        }
    }
}

// =============================================================================
// Member Type
// =============================================================================

/// Membership category. Drives the loan limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberType {
    #[default]
    Student,
    Faculty,
    Staff,
}

impl MemberType {
    pub const ALL: [MemberType; 3] = [MemberType::Student, MemberType::Faculty, MemberType::Staff];

    /// Wire value (`STUDENT`).
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberType::Student => "STUDENT",
            MemberType::Faculty => "FACULTY",
            MemberType::Staff => "STAFF",
        }
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STUDENT" => Ok(MemberType::Student),
            "FACULTY" => Ok(MemberType::Faculty),
            "STAFF" => Ok(MemberType::Staff),
            _ => Err(ValidationError::NotAllowed {
                field: "memberType".to_string(),
                allowed: MemberType::ALL.iter().map(|t| t.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Member
// =============================================================================

/// A registered library member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub member_type: MemberType,
    #[serde(with = "crate::dates::flexible")]
    pub membership_date: DateTime<Utc>,
    pub active: bool,
}

impl Member {
    /// Label used in the issue form's member selector.
    pub fn option_label(&self) -> String {
        format!("{} ({})", self.name, self.member_type)
    }
}

/// Payload for creating or updating a member (`MemberFormData` on the wire).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub member_type: MemberType,
}

impl From<&Member> for MemberForm {
    fn from(member: &Member) -> Self {
        MemberForm {
            name: member.name.clone(),
            email: member.email.clone(),
            phone: member.phone.clone(),
            member_type: member.member_type,
        }
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Lifecycle state of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// On loan, not yet due.
    Issued,
    /// Closed by a return.
    Returned,
    /// On loan past its due date.
    Overdue,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Issued => write!(f, "ISSUED"),
            TransactionStatus::Returned => write!(f, "RETURNED"),
            TransactionStatus::Overdue => write!(f, "OVERDUE"),
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// One issue-then-return cycle of a single copy.
///
/// `book_title` and `member_name` are denormalised by the server so tables
/// can render without extra lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub book_id: BookId,
    pub member_id: MemberId,
    #[serde(default)]
    pub book_title: String,
    #[serde(default)]
    pub member_name: String,
    #[serde(with = "crate::dates::flexible")]
    pub issue_date: DateTime<Utc>,
    #[serde(with = "crate::dates::flexible")]
    pub due_date: DateTime<Utc>,
    #[serde(default, with = "crate::dates::flexible_option")]
    pub return_date: Option<DateTime<Utc>>,
    pub status: TransactionStatus,
    #[serde(default, with = "crate::money::dollars")]
    pub fine: Money,
}

impl Transaction {
    /// Not yet returned (Issued or Overdue).
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status != TransactionStatus::Returned
    }
}

// =============================================================================
// Requests & Auth
// =============================================================================

/// Body of `POST /transactions/issue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueBookRequest {
    pub book_id: BookId,
    pub member_id: MemberId,
}

/// Staff role returned by login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    #[default]
    Librarian,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Librarian => write!(f, "LIBRARIAN"),
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "LIBRARIAN" => Ok(Role::Librarian),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["ADMIN".to_string(), "LIBRARIAN".to_string()],
            }),
        }
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// `{ "message": "..." }` body used for acknowledgements and errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// =============================================================================
// Reports
// =============================================================================

/// Counters shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_books: i64,
    /// Active members only.
    pub total_members: i64,
    /// Unreturned transactions (issued + overdue).
    pub active_issues: i64,
    pub overdue_books: i64,
    pub total_copies: i64,
    pub available_copies: i64,
}

impl DashboardStats {
    /// Copies currently on loan.
    pub fn issued_copies(&self) -> i64 {
        self.total_copies - self.available_copies
    }

    /// Share of copies on loan, rounded to a whole percent.
    pub fn utilization_percent(&self) -> i64 {
        if self.total_copies <= 0 {
            return 0;
        }
        (self.issued_copies() * 100 + self.total_copies / 2) / self.total_copies
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
