//! # Library Facade
//!
//! The one object a front-end holds. It owns the backend, the session, the
//! query cache and the coordinator, and exposes every query and mutation.
//!
//! ## Query vs Mutation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Query (books, members, dashboard, ...)                                │
//! │    QueryCache::fetch(key) ── fresh? ──► cached                         │
//! │                          └─ stale ──► LibraryApi (retry once)          │
//! │                                                                         │
//! │  Mutation (create_book, issue_book, ...)                               │
//! │    validate locally ── Err ──► ClientError::Validation (no request)    │
//! │          │                                                              │
//! │          ▼                                                              │
//! │    LibraryApi (never retried)                                          │
//! │          │ Ok                                                           │
//! │          ▼                                                              │
//! │    CacheCoordinator::publish(MutationEvent)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{HttpApi, LibraryApi};
use crate::cache::{QueryCache, QueryKey};
use crate::config::ClientConfig;
use crate::coordinator::{CacheCoordinator, MutationEvent};
use crate::error::{ClientError, ClientResult};
use crate::session::{AppContext, Session};
use libris_core::error::FormErrors;
use libris_core::validation::{validate_book_form, validate_member_form, validate_required};
use libris_core::{
    Book, BookForm, BookId, DashboardStats, IssueBookRequest, LoginRequest, Member, MemberForm,
    MemberId, MessageResponse, RegisterRequest, Transaction, TransactionId,
};

/// Client handle. Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct Library {
    api: Arc<dyn LibraryApi>,
    ctx: Arc<AppContext>,
    cache: Arc<QueryCache>,
    coordinator: Arc<CacheCoordinator>,
}

impl Library {
    /// Builds a client from configuration.
    ///
    /// Restores the persisted session and picks the demo backend when
    /// `demo.enabled` is set, the REST backend otherwise.
    pub async fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let ctx = Arc::new(AppContext::init(config.session_path()).await);

        let api: Arc<dyn LibraryApi> = if config.demo.enabled {
            demo_backend(config, ctx.clone()).await?
        } else {
            info!(base_url = %config.base_url(), "Using REST backend");
            Arc::new(HttpApi::new(config, ctx.clone())?)
        };

        let cache = Arc::new(QueryCache::from_settings(&config.cache));
        Ok(Self::with_api(api, ctx, cache))
    }

    /// Assembles a client around an existing backend.
    pub fn with_api(api: Arc<dyn LibraryApi>, ctx: Arc<AppContext>, cache: Arc<QueryCache>) -> Self {
        let coordinator = Arc::new(CacheCoordinator::new(cache.clone()));
        Library {
            api,
            ctx,
            cache,
            coordinator,
        }
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn coordinator(&self) -> &Arc<CacheCoordinator> {
        &self.coordinator
    }

    /// Releases in-memory state at shutdown. The persisted session stays.
    pub async fn shutdown(&self) {
        self.cache.clear();
        self.ctx.teardown().await;
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Logs in and persists the session.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<Session> {
        let mut errors = FormErrors::new();
        if let Err(e) = validate_required("Username", username) {
            errors.add("username", e);
        }
        if let Err(e) = validate_required("Password", password) {
            errors.add("password", e);
        }
        errors.into_result()?;

        let request = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let response = self.api.login(&request).await?;

        // Data cached for a previous user must not leak into this session
        self.cache.clear();
        self.ctx.login(response).await
    }

    /// Clears the session, its persisted copy and the cache.
    pub async fn logout(&self) -> ClientResult<()> {
        self.ctx.clear().await?;
        self.coordinator.publish(MutationEvent::LoggedOut);
        Ok(())
    }

    /// Creates a staff account.
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<MessageResponse> {
        let mut errors = FormErrors::new();
        if let Err(e) = validate_required("Username", &request.username) {
            errors.add("username", e);
        }
        if let Err(e) = validate_required("Password", &request.password) {
            errors.add("password", e);
        }
        errors.into_result()?;

        self.api.register(request).await
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn books(&self) -> ClientResult<Vec<Book>> {
        let api = &self.api;
        self.guarded(self.cache.fetch(QueryKey::books(), move || api.list_books()))
            .await
    }

    /// A single book. Disabled (`Ok(None)`) for ids that cannot exist.
    pub async fn book(&self, id: BookId) -> ClientResult<Option<Book>> {
        if id <= 0 {
            return Ok(None);
        }
        let api = &self.api;
        self.guarded(self.cache.fetch(QueryKey::book(id), move || api.get_book(id)))
            .await
            .map(Some)
    }

    /// Server-side search. Disabled (`Ok(None)`) for an empty query.
    pub async fn search_books(&self, query: &str) -> ClientResult<Option<Vec<Book>>> {
        if query.is_empty() {
            return Ok(None);
        }
        let api = &self.api;
        self.guarded(
            self.cache
                .fetch(QueryKey::book_search(query), move || api.search_books(query)),
        )
        .await
        .map(Some)
    }

    pub async fn members(&self) -> ClientResult<Vec<Member>> {
        let api = &self.api;
        self.guarded(self.cache.fetch(QueryKey::members(), move || api.list_members()))
            .await
    }

    /// A single member. Disabled (`Ok(None)`) for ids that cannot exist.
    pub async fn member(&self, id: MemberId) -> ClientResult<Option<Member>> {
        if id <= 0 {
            return Ok(None);
        }
        let api = &self.api;
        self.guarded(self.cache.fetch(QueryKey::member(id), move || api.get_member(id)))
            .await
            .map(Some)
    }

    /// Open (issued or overdue) transactions.
    pub async fn active_transactions(&self) -> ClientResult<Vec<Transaction>> {
        let api = &self.api;
        self.guarded(
            self.cache
                .fetch(QueryKey::active_transactions(), move || api.active_transactions()),
        )
        .await
    }

    pub async fn overdue_transactions(&self) -> ClientResult<Vec<Transaction>> {
        let api = &self.api;
        self.guarded(
            self.cache
                .fetch(QueryKey::overdue_transactions(), move || api.overdue_transactions()),
        )
        .await
    }

    pub async fn dashboard(&self) -> ClientResult<DashboardStats> {
        let api = &self.api;
        self.guarded(self.cache.fetch(QueryKey::dashboard(), move || api.dashboard()))
            .await
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn create_book(&self, form: &BookForm) -> ClientResult<Book> {
        validate_book_form(form)?;
        let book = self.guarded(self.api.create_book(form)).await?;
        self.coordinator.publish(MutationEvent::BookCreated(book.id));
        Ok(book)
    }

    pub async fn update_book(&self, id: BookId, form: &BookForm) -> ClientResult<Book> {
        validate_book_form(form)?;
        let book = self.guarded(self.api.update_book(id, form)).await?;
        self.coordinator.publish(MutationEvent::BookUpdated(id));
        Ok(book)
    }

    pub async fn delete_book(&self, id: BookId) -> ClientResult<()> {
        self.guarded(self.api.delete_book(id)).await?;
        self.coordinator.publish(MutationEvent::BookDeleted(id));
        Ok(())
    }

    pub async fn create_member(&self, form: &MemberForm) -> ClientResult<Member> {
        validate_member_form(form)?;
        let member = self.guarded(self.api.create_member(form)).await?;
        self.coordinator
            .publish(MutationEvent::MemberCreated(member.id));
        Ok(member)
    }

    pub async fn update_member(&self, id: MemberId, form: &MemberForm) -> ClientResult<Member> {
        validate_member_form(form)?;
        let member = self.guarded(self.api.update_member(id, form)).await?;
        self.coordinator.publish(MutationEvent::MemberUpdated(id));
        Ok(member)
    }

    pub async fn delete_member(&self, id: MemberId) -> ClientResult<()> {
        self.guarded(self.api.delete_member(id)).await?;
        self.coordinator.publish(MutationEvent::MemberDeleted(id));
        Ok(())
    }

    /// Issues a copy. The server decrements stock and sets the due date.
    pub async fn issue_book(&self, request: IssueBookRequest) -> ClientResult<Transaction> {
        let tx = self.guarded(self.api.issue_book(&request)).await?;
        self.coordinator.publish(MutationEvent::BookIssued {
            transaction_id: tx.id,
            book_id: tx.book_id,
        });
        Ok(tx)
    }

    /// Returns a copy. The server sets return date, status and fine.
    pub async fn return_book(&self, id: TransactionId) -> ClientResult<Transaction> {
        let tx = self.guarded(self.api.return_book(id)).await?;
        self.coordinator.publish(MutationEvent::BookReturned {
            transaction_id: tx.id,
            book_id: tx.book_id,
        });
        Ok(tx)
    }

    /// Runs a backend call and applies the forced-logout side effects of a
    /// 401: the session is already gone, the cache follows it.
    async fn guarded<T>(
        &self,
        call: impl std::future::Future<Output = ClientResult<T>>,
    ) -> ClientResult<T> {
        match call.await {
            Err(ClientError::Unauthorized) => {
                if self.ctx.is_authenticated().await {
                    if let Err(e) = self.ctx.clear().await {
                        warn!(error = %e, "Failed to remove persisted session");
                    }
                }
                self.coordinator.publish(MutationEvent::LoggedOut);
                Err(ClientError::Unauthorized)
            }
            other => other,
        }
    }
}

#[cfg(feature = "demo")]
async fn demo_backend(
    config: &ClientConfig,
    ctx: Arc<AppContext>,
) -> ClientResult<Arc<dyn LibraryApi>> {
    info!(db = ?config.demo.database_path, "Using demo backend");
    let api = crate::api::DemoApi::open(&config.demo, ctx).await?;
    Ok(Arc::new(api))
}

#[cfg(not(feature = "demo"))]
async fn demo_backend(
    _config: &ClientConfig,
    _ctx: Arc<AppContext>,
) -> ClientResult<Arc<dyn LibraryApi>> {
    Err(ClientError::Config(
        "Demo mode requested but libris-client was built without the `demo` feature".into(),
    ))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(all(test, feature = "demo"))]
mod tests {
    use super::*;
    use crate::api::DemoApi;
    use crate::cache::QueryStatus;
    use crate::config::DemoSettings;
    use libris_core::search::filter_members;
    use libris_core::{MemberType, TransactionStatus};
    use std::time::Duration;

    async fn library() -> Library {
        let ctx = Arc::new(AppContext::ephemeral());
        let settings = DemoSettings {
            enabled: true,
            database_path: None,
            seed_sample_data: false,
        };
        let api = DemoApi::open(&settings, ctx.clone()).await.unwrap();
        let cache = Arc::new(QueryCache::new(Duration::from_secs(300), 1));
        let lib = Library::with_api(Arc::new(api), ctx, cache);
        lib.login("admin", "admin").await.unwrap();
        lib
    }

    fn book_form(copies: i32) -> BookForm {
        BookForm {
            title: "The Left Hand of Darkness".to_string(),
            author: "Ursula K. Le Guin".to_string(),
            isbn: "9780441478125".to_string(),
            publisher: "Ace".to_string(),
            year: 1969,
            genre: "Science Fiction".to_string(),
            total_copies: copies,
            available_copies: copies,
        }
    }

    fn member_form() -> MemberForm {
        MemberForm {
            name: "Bob Jones".to_string(),
            email: "bob.jones@uni.edu".to_string(),
            phone: "555-0101".to_string(),
            member_type: MemberType::Faculty,
        }
    }

    #[tokio::test]
    async fn test_login_validation_sends_nothing() {
        let lib = library().await;
        lib.logout().await.unwrap();

        let err = lib.login("", "").await.unwrap_err();
        let errors = err.form_errors().unwrap();
        assert_eq!(errors.message("username"), Some("Username is required"));
        assert!(!lib.context().is_authenticated().await);
    }

    #[tokio::test]
    async fn test_invalid_year_is_rejected_locally() {
        let lib = library().await;
        let before = lib.books().await.unwrap();

        let mut form = book_form(1);
        form.year = 900;
        let err = lib.create_book(&form).await.unwrap_err();
        assert_eq!(err.form_errors().unwrap().message("year"), Some("Invalid year"));

        // Cache untouched: the books query is still fresh
        assert!(!lib.cache().is_stale(&QueryKey::books()));
        assert_eq!(lib.books().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_issue_and_return_refresh_cached_views() {
        let lib = library().await;
        let book = lib.create_book(&book_form(1)).await.unwrap();
        let member = lib.create_member(&member_form()).await.unwrap();

        assert_eq!(lib.books().await.unwrap()[0].available_copies, 1);
        assert!(lib.active_transactions().await.unwrap().is_empty());
        assert_eq!(lib.dashboard().await.unwrap().active_issues, 0);

        let tx = lib
            .issue_book(IssueBookRequest {
                book_id: book.id,
                member_id: member.id,
            })
            .await
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Issued);

        assert_eq!(lib.books().await.unwrap()[0].available_copies, 0);
        assert_eq!(lib.active_transactions().await.unwrap().len(), 1);
        assert_eq!(lib.dashboard().await.unwrap().active_issues, 1);

        let returned = lib.return_book(tx.id).await.unwrap();
        assert_eq!(returned.status, TransactionStatus::Returned);
        assert_eq!(lib.books().await.unwrap()[0].available_copies, 1);
        assert!(lib.active_transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_queries() {
        let lib = library().await;
        assert_eq!(lib.book(0).await.unwrap(), None);
        assert_eq!(lib.member(-1).await.unwrap(), None);
        assert_eq!(lib.search_books("").await.unwrap(), None);
        assert_eq!(lib.cache().status(&QueryKey::book(0)), QueryStatus::Idle);
    }

    #[tokio::test]
    async fn test_member_filter_does_not_touch_cache() {
        let lib = library().await;
        lib.create_member(&member_form()).await.unwrap();

        let members = lib.members().await.unwrap();
        assert!(filter_members(&members, "teal").is_empty());
        assert_eq!(lib.members().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_session_logs_out_and_clears_cache() {
        let lib = library().await;
        lib.books().await.unwrap();

        // Session dropped behind the client's back (e.g. token revoked)
        lib.context().teardown().await;
        let err = lib.dashboard().await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(lib.cache().status(&QueryKey::books()), QueryStatus::Idle);
    }
}
