//! # Demo Backend
//!
//! [`LibraryApi`] served in-process from a SQLite database, for running the
//! client without a REST server.
//!
//! It answers with the same statuses and messages the server uses:
//!
//! | Situation                    | Status | Message                                |
//! |------------------------------|--------|----------------------------------------|
//! | bad credentials              | 401    | `Invalid username or password`         |
//! | no session                   | 401    | (client logs out)                      |
//! | unknown book / member        | 404    | `Book not found` / `Member not found`  |
//! | issue with unknown ids       | 404    | `Book or member not found`             |
//! | unknown transaction          | 404    | `Transaction not found`                |
//! | no copies left               | 400    | `No copies available`                  |
//! | returning twice              | 400    | `This book has already been returned`  |
//! | deleting with open loans     | 400    | `Cannot delete ... active loan(s)`     |
//! | form rule broken             | 400    | per-field messages                     |
//! | duplicate email / username   | 409    | `email '...' already exists`           |
//!
//! Any non-empty session token is accepted.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::LibraryApi;
use crate::config::DemoSettings;
use crate::error::{ClientError, ClientResult};
use crate::session::AppContext;
use libris_core::validation::{validate_book_form, validate_member_form, validate_required};
use libris_core::{
    Book, BookForm, BookId, DashboardStats, IssueBookRequest, LoanPolicy, LoginRequest,
    LoginResponse, Member, MemberForm, MemberId, MessageResponse, RegisterRequest, Transaction,
    TransactionId,
};
use libris_db::sample::{self, BOOKS};
use libris_db::{Database, DbConfig};

/// In-process backend over [`Database`].
#[derive(Clone)]
pub struct DemoApi {
    db: Database,
    ctx: Arc<AppContext>,
    policy: LoanPolicy,
}

impl DemoApi {
    /// Wraps an open database.
    pub fn new(db: Database, ctx: Arc<AppContext>) -> Self {
        DemoApi {
            db,
            ctx,
            policy: LoanPolicy::default(),
        }
    }

    /// Opens (or creates) the demo database and prepares it.
    ///
    /// ## Startup
    /// 1. Connect and migrate (`:memory:` when no path is configured)
    /// 2. Create the `admin` / `librarian` accounts if missing
    /// 3. Seed the sample catalogue into an empty database, if enabled
    pub async fn open(settings: &DemoSettings, ctx: Arc<AppContext>) -> ClientResult<Self> {
        let config = match &settings.database_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                DbConfig::new(path)
            }
            None => DbConfig::in_memory(),
        };
        let db = Database::new(config).await?;
        db.users().ensure_default_users().await?;

        if settings.seed_sample_data && db.books().count().await? == 0 {
            let summary = sample::seed(&db, BOOKS.len(), Utc::now()).await?;
            info!(books = summary.books, loans = summary.loans, "Demo database seeded");
        }

        Ok(DemoApi::new(db, ctx))
    }

    /// Every endpoint except login/register needs a session.
    async fn require_session(&self) -> ClientResult<()> {
        match self.ctx.token().await {
            Some(token) if !token.trim().is_empty() => Ok(()),
            _ => Err(ClientError::Unauthorized),
        }
    }

    /// Moves past-due loans to OVERDUE before anything reads them.
    async fn refresh_overdue(&self) -> ClientResult<()> {
        let changed = self.db.transactions().refresh_overdue(Utc::now()).await?;
        if changed > 0 {
            debug!(changed, "Marked loans overdue");
        }
        Ok(())
    }
}

#[async_trait]
impl LibraryApi for DemoApi {
    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse> {
        match self
            .db
            .users()
            .verify(&request.username, &request.password)
            .await?
        {
            Some(user) => Ok(LoginResponse {
                token: format!("demo-{}", Uuid::new_v4()),
                username: user.username,
                role: user.role,
            }),
            None => Err(ClientError::http(401, "Invalid username or password")),
        }
    }

    async fn register(&self, request: &RegisterRequest) -> ClientResult<MessageResponse> {
        validate_required("Username", &request.username)
            .and_then(|_| validate_required("Password", &request.password))
            .map_err(|e| ClientError::bad_request(e.to_string()))?;

        self.db
            .users()
            .create(request.username.trim(), &request.password, request.role)
            .await?;

        Ok(MessageResponse {
            message: "User registered successfully".to_string(),
        })
    }

    async fn list_books(&self) -> ClientResult<Vec<Book>> {
        self.require_session().await?;
        Ok(self.db.books().list().await?)
    }

    async fn get_book(&self, id: BookId) -> ClientResult<Book> {
        self.require_session().await?;
        self.db
            .books()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ClientError::not_found("Book not found"))
    }

    async fn search_books(&self, query: &str) -> ClientResult<Vec<Book>> {
        self.require_session().await?;
        Ok(self.db.books().search(query).await?)
    }

    async fn create_book(&self, form: &BookForm) -> ClientResult<Book> {
        self.require_session().await?;
        validate_book_form(form).map_err(|e| ClientError::bad_request(e.to_string()))?;
        Ok(self.db.books().insert(form, Utc::now()).await?)
    }

    async fn update_book(&self, id: BookId, form: &BookForm) -> ClientResult<Book> {
        self.require_session().await?;
        validate_book_form(form).map_err(|e| ClientError::bad_request(e.to_string()))?;
        Ok(self.db.books().update(id, form, Utc::now()).await?)
    }

    async fn delete_book(&self, id: BookId) -> ClientResult<()> {
        self.require_session().await?;
        Ok(self.db.books().delete(id).await?)
    }

    async fn list_members(&self) -> ClientResult<Vec<Member>> {
        self.require_session().await?;
        Ok(self.db.members().list().await?)
    }

    async fn get_member(&self, id: MemberId) -> ClientResult<Member> {
        self.require_session().await?;
        self.db
            .members()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ClientError::not_found("Member not found"))
    }

    async fn create_member(&self, form: &MemberForm) -> ClientResult<Member> {
        self.require_session().await?;
        validate_member_form(form).map_err(|e| ClientError::bad_request(e.to_string()))?;
        Ok(self.db.members().insert(form, Utc::now()).await?)
    }

    async fn update_member(&self, id: MemberId, form: &MemberForm) -> ClientResult<Member> {
        self.require_session().await?;
        validate_member_form(form).map_err(|e| ClientError::bad_request(e.to_string()))?;
        Ok(self.db.members().update(id, form).await?)
    }

    async fn delete_member(&self, id: MemberId) -> ClientResult<()> {
        self.require_session().await?;
        Ok(self.db.members().delete(id).await?)
    }

    async fn issue_book(&self, request: &IssueBookRequest) -> ClientResult<Transaction> {
        self.require_session().await?;
        Ok(self
            .db
            .transactions()
            .issue(*request, &self.policy, Utc::now())
            .await?)
    }

    async fn return_book(&self, id: TransactionId) -> ClientResult<Transaction> {
        self.require_session().await?;
        Ok(self
            .db
            .transactions()
            .return_book(id, &self.policy, Utc::now())
            .await?)
    }

    async fn active_transactions(&self) -> ClientResult<Vec<Transaction>> {
        self.require_session().await?;
        self.refresh_overdue().await?;
        Ok(self.db.transactions().list_active().await?)
    }

    async fn overdue_transactions(&self) -> ClientResult<Vec<Transaction>> {
        self.require_session().await?;
        self.refresh_overdue().await?;
        Ok(self.db.transactions().list_overdue().await?)
    }

    async fn dashboard(&self) -> ClientResult<DashboardStats> {
        self.require_session().await?;
        self.refresh_overdue().await?;
        Ok(self.db.reports().dashboard().await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use libris_core::{MemberType, Role, TransactionStatus};

    fn settings(seed: bool) -> DemoSettings {
        DemoSettings {
            enabled: true,
            database_path: None,
            seed_sample_data: seed,
        }
    }

    async fn logged_in(seed: bool) -> DemoApi {
        let ctx = Arc::new(AppContext::ephemeral());
        let api = DemoApi::open(&settings(seed), ctx.clone()).await.unwrap();
        let resp = api
            .login(&LoginRequest {
                username: "admin".to_string(),
                password: "admin".to_string(),
            })
            .await
            .unwrap();
        ctx.login(resp).await.unwrap();
        api
    }

    fn single_copy_book() -> BookForm {
        BookForm {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: "9780441013593".to_string(),
            publisher: "Ace".to_string(),
            year: 1965,
            genre: "Science Fiction".to_string(),
            total_copies: 1,
            available_copies: 1,
        }
    }

    fn member_form(email: &str) -> MemberForm {
        MemberForm {
            name: "Alice Smith".to_string(),
            email: email.to_string(),
            phone: "555-0100".to_string(),
            member_type: MemberType::Student,
        }
    }

    #[tokio::test]
    async fn test_requires_session() {
        let ctx = Arc::new(AppContext::ephemeral());
        let api = DemoApi::open(&settings(false), ctx).await.unwrap();

        let err = api.list_books().await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password() {
        let ctx = Arc::new(AppContext::ephemeral());
        let api = DemoApi::open(&settings(false), ctx).await.unwrap();

        let err = api
            .login(&LoginRequest {
                username: "librarian".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Invalid username or password");
    }

    #[tokio::test]
    async fn test_issue_then_return_single_copy() {
        let api = logged_in(false).await;
        let book = api.create_book(&single_copy_book()).await.unwrap();
        let member = api.create_member(&member_form("alice@uni.edu")).await.unwrap();

        let request = IssueBookRequest {
            book_id: book.id,
            member_id: member.id,
        };
        let tx = api.issue_book(&request).await.unwrap();
        assert_eq!(tx.status, TransactionStatus::Issued);
        assert_eq!(tx.due_date - tx.issue_date, Duration::days(14));
        assert_eq!(api.get_book(book.id).await.unwrap().available_copies, 0);

        let err = api.issue_book(&request).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "No copies available");

        let returned = api.return_book(tx.id).await.unwrap();
        assert_eq!(returned.status, TransactionStatus::Returned);
        assert!(returned.return_date.is_some());
        assert!(returned.fine.is_zero());
        assert_eq!(api.get_book(book.id).await.unwrap().available_copies, 1);

        let err = api.return_book(tx.id).await.unwrap_err();
        assert_eq!(err.to_string(), "This book has already been returned");
    }

    #[tokio::test]
    async fn test_delete_with_open_loan_is_rejected() {
        let api = logged_in(false).await;
        let book = api.create_book(&single_copy_book()).await.unwrap();
        let member = api.create_member(&member_form("alice@uni.edu")).await.unwrap();
        api.issue_book(&IssueBookRequest {
            book_id: book.id,
            member_id: member.id,
        })
        .await
        .unwrap();

        let err = api.delete_member(member.id).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "Cannot delete member with 1 active loan(s)");

        let err = api.delete_book(book.id).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "Cannot delete book with active loans");

        let stats = api.dashboard().await.unwrap();
        assert_eq!((stats.active_issues, stats.available_copies), (1, 0));
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let api = logged_in(false).await;

        let err = api.get_book(999).await.unwrap_err();
        assert_eq!((err.status(), err.to_string()), (Some(404), "Book not found".into()));

        let err = api.delete_member(999).await.unwrap_err();
        assert_eq!(err.to_string(), "Member not found");

        let err = api
            .issue_book(&IssueBookRequest {
                book_id: 999,
                member_id: 999,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Book or member not found");

        let err = api.return_book(999).await.unwrap_err();
        assert_eq!((err.status(), err.to_string()), (Some(404), "Transaction not found".into()));
    }

    #[tokio::test]
    async fn test_server_side_validation() {
        let api = logged_in(false).await;

        let mut form = single_copy_book();
        form.year = 900;
        let err = api.create_book(&form).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("Invalid year"));

        api.create_member(&member_form("dup@uni.edu")).await.unwrap();
        let err = api.create_member(&member_form("dup@uni.edu")).await.unwrap_err();
        assert_eq!(err.status(), Some(409));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let api = logged_in(false).await;
        let request = RegisterRequest {
            username: "carol".to_string(),
            password: "s3cret".to_string(),
            role: Role::Librarian,
        };

        let resp = api.register(&request).await.unwrap();
        assert_eq!(resp.message, "User registered successfully");
        assert_eq!(api.register(&request).await.unwrap_err().status(), Some(409));

        let login = api
            .login(&LoginRequest {
                username: "carol".to_string(),
                password: "s3cret".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(login.role, Role::Librarian);
        assert!(login.token.starts_with("demo-"));
    }

    #[tokio::test]
    async fn test_open_seeds_empty_database() {
        let api = logged_in(true).await;

        assert_eq!(api.list_books().await.unwrap().len(), BOOKS.len());
        assert_eq!(api.overdue_transactions().await.unwrap().len(), 3);

        let stats = api.dashboard().await.unwrap();
        assert_eq!(stats.total_books, BOOKS.len() as i64);
        assert_eq!(stats.overdue_books, 3);
    }
}
