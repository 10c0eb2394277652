//! # Library API
//!
//! One trait for every backend call, with two implementations:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         LibraryApi                                      │
//! │                                                                         │
//! │   ┌──────────────────────────┐      ┌──────────────────────────┐       │
//! │   │  HttpApi (http.rs)       │      │  DemoApi (demo.rs)       │       │
//! │   │  reqwest → /api/v1/...   │      │  libris-db on SQLite     │       │
//! │   │  Bearer token from ctx   │      │  same statuses/messages  │       │
//! │   └──────────────────────────┘      └──────────────────────────┘       │
//! │                                                                         │
//! │  Library (library.rs) holds an Arc<dyn LibraryApi> and never knows     │
//! │  which one it is talking to.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;

use crate::error::ClientResult;
use libris_core::{
    Book, BookForm, BookId, DashboardStats, IssueBookRequest, LoginRequest, LoginResponse, Member,
    MemberForm, MemberId, MessageResponse, RegisterRequest, Transaction, TransactionId,
};

#[cfg(feature = "demo")]
pub mod demo;
pub mod http;

#[cfg(feature = "demo")]
pub use demo::DemoApi;
pub use http::HttpApi;

/// Every REST endpoint the client uses.
///
/// | Method | Path                            |
/// |--------|---------------------------------|
/// | POST   | `/auth/login`, `/auth/register` |
/// | GET    | `/books`, `/books/{id}`, `/books/search?query=` |
/// | POST/PUT/DELETE | `/books`, `/books/{id}` |
/// | GET/POST/PUT/DELETE | `/members[/{id}]`   |
/// | POST   | `/transactions/issue`, `/transactions/return/{id}` |
/// | GET    | `/transactions/active`, `/transactions/overdue` |
/// | GET    | `/reports/dashboard`            |
#[async_trait]
pub trait LibraryApi: Send + Sync {
    // Auth
    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse>;
    async fn register(&self, request: &RegisterRequest) -> ClientResult<MessageResponse>;

    // Books
    async fn list_books(&self) -> ClientResult<Vec<Book>>;
    async fn get_book(&self, id: BookId) -> ClientResult<Book>;
    async fn search_books(&self, query: &str) -> ClientResult<Vec<Book>>;
    async fn create_book(&self, form: &BookForm) -> ClientResult<Book>;
    async fn update_book(&self, id: BookId, form: &BookForm) -> ClientResult<Book>;
    async fn delete_book(&self, id: BookId) -> ClientResult<()>;

    // Members
    async fn list_members(&self) -> ClientResult<Vec<Member>>;
    async fn get_member(&self, id: MemberId) -> ClientResult<Member>;
    async fn create_member(&self, form: &MemberForm) -> ClientResult<Member>;
    async fn update_member(&self, id: MemberId, form: &MemberForm) -> ClientResult<Member>;
    async fn delete_member(&self, id: MemberId) -> ClientResult<()>;

    // Transactions
    async fn issue_book(&self, request: &IssueBookRequest) -> ClientResult<Transaction>;
    async fn return_book(&self, id: TransactionId) -> ClientResult<Transaction>;
    async fn active_transactions(&self) -> ClientResult<Vec<Transaction>>;
    async fn overdue_transactions(&self) -> ClientResult<Vec<Transaction>>;

    // Reports
    async fn dashboard(&self) -> ClientResult<DashboardStats>;
}
