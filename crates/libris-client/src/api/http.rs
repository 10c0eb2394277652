//! # REST Backend
//!
//! [`LibraryApi`] over HTTP with `reqwest`.
//!
//! ## Request Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HttpApi::get("/books")                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  {base_url}/api/v1/books                                               │
//! │  Authorization: Bearer <ctx.token()>   (omitted when logged out)       │
//! │  Content-Type: application/json                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  status 2xx ───────► decode JSON body                                  │
//! │  status 401 ───────► ctx.clear() ──► ClientError::Unauthorized         │
//! │  other status ─────► { "message" } ─► ClientError::Http                │
//! │  no response ──────► ClientError::Network                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A 401 on `/auth/*` is a failed login, not an expired session, so it
//! keeps the server's message instead of becoming `Unauthorized`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::LibraryApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::AppContext;
use libris_core::{
    Book, BookForm, BookId, DashboardStats, IssueBookRequest, LoginRequest, LoginResponse, Member,
    MemberForm, MemberId, MessageResponse, RegisterRequest, Transaction, TransactionId,
};

/// Path prefix of every endpoint.
pub const API_PREFIX: &str = "/api/v1";

/// REST client bound to one server and one session.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    api_root: String,
    ctx: Arc<AppContext>,
}

impl HttpApi {
    /// Builds the HTTP client from configuration.
    pub fn new(config: &ClientConfig, ctx: Arc<AppContext>) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.api.request_timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpApi {
            client,
            api_root: format!("{}{}", config.base_url(), API_PREFIX),
            ctx,
        })
    }

    /// Full URL of an endpoint.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.ctx.token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and turns every non-success status into an error.
    async fn execute(&self, method: Method, path: &str, builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder.send().await.map_err(|e| {
            warn!(%method, path, error = %e, "Request failed");
            ClientError::from(e)
        })?;

        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "Request completed");

        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response, status).await;

        if status == StatusCode::UNAUTHORIZED && !path.starts_with("/auth/") {
            warn!(path, "Session rejected by server, logging out");
            if let Err(e) = self.ctx.clear().await {
                warn!(error = %e, "Failed to remove persisted session");
            }
            return Err(ClientError::Unauthorized);
        }

        Err(ClientError::http(status.as_u16(), message))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let builder = self.request(Method::GET, path).await;
        let response = self.execute(Method::GET, path, builder).await?;
        Ok(response.json().await?)
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let builder = self.request(method.clone(), path).await.json(body);
        let response = self.execute(method, path, builder).await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        let builder = self.request(Method::DELETE, path).await;
        self.execute(Method::DELETE, path, builder).await?;
        Ok(())
    }
}

/// `{ "message" }` from an error body, falling back to the raw text and
/// then to the status reason.
async fn error_message(response: Response, status: StatusCode) -> String {
    let body = response.text().await.unwrap_or_default();

    if let Ok(parsed) = serde_json::from_str::<MessageResponse>(&body) {
        return parsed.message;
    }

    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

#[async_trait]
impl LibraryApi for HttpApi {
    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse> {
        self.send_json(Method::POST, "/auth/login", request).await
    }

    async fn register(&self, request: &RegisterRequest) -> ClientResult<MessageResponse> {
        self.send_json(Method::POST, "/auth/register", request).await
    }

    async fn list_books(&self) -> ClientResult<Vec<Book>> {
        self.get("/books").await
    }

    async fn get_book(&self, id: BookId) -> ClientResult<Book> {
        self.get(&format!("/books/{}", id)).await
    }

    async fn search_books(&self, query: &str) -> ClientResult<Vec<Book>> {
        let path = "/books/search";
        let builder = self
            .request(Method::GET, path)
            .await
            .query(&[("query", query)]);
        let response = self.execute(Method::GET, path, builder).await?;
        Ok(response.json().await?)
    }

    async fn create_book(&self, form: &BookForm) -> ClientResult<Book> {
        self.send_json(Method::POST, "/books", form).await
    }

    async fn update_book(&self, id: BookId, form: &BookForm) -> ClientResult<Book> {
        self.send_json(Method::PUT, &format!("/books/{}", id), form)
            .await
    }

    async fn delete_book(&self, id: BookId) -> ClientResult<()> {
        self.delete(&format!("/books/{}", id)).await
    }

    async fn list_members(&self) -> ClientResult<Vec<Member>> {
        self.get("/members").await
    }

    async fn get_member(&self, id: MemberId) -> ClientResult<Member> {
        self.get(&format!("/members/{}", id)).await
    }

    async fn create_member(&self, form: &MemberForm) -> ClientResult<Member> {
        self.send_json(Method::POST, "/members", form).await
    }

    async fn update_member(&self, id: MemberId, form: &MemberForm) -> ClientResult<Member> {
        self.send_json(Method::PUT, &format!("/members/{}", id), form)
            .await
    }

    async fn delete_member(&self, id: MemberId) -> ClientResult<()> {
        self.delete(&format!("/members/{}", id)).await
    }

    async fn issue_book(&self, request: &IssueBookRequest) -> ClientResult<Transaction> {
        self.send_json(Method::POST, "/transactions/issue", request)
            .await
    }

    async fn return_book(&self, id: TransactionId) -> ClientResult<Transaction> {
        let path = format!("/transactions/return/{}", id);
        let builder = self.request(Method::POST, &path).await;
        let response = self.execute(Method::POST, &path, builder).await?;
        Ok(response.json().await?)
    }

    async fn active_transactions(&self) -> ClientResult<Vec<Transaction>> {
        self.get("/transactions/active").await
    }

    async fn overdue_transactions(&self) -> ClientResult<Vec<Transaction>> {
        self.get("/transactions/overdue").await
    }

    async fn dashboard(&self) -> ClientResult<DashboardStats> {
        self.get("/reports/dashboard").await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::HeaderMap as AxumHeaders;
    use axum::response::{IntoResponse, Response as AxumResponse};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use libris_core::Role;
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    const TOKEN: &str = "tok-1";

    fn message(status: axum::http::StatusCode, text: &str) -> AxumResponse {
        (
            status,
            Json(MessageResponse {
                message: text.to_string(),
            }),
        )
            .into_response()
    }

    fn authorized(headers: &AxumHeaders) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == format!("Bearer {}", TOKEN))
            .unwrap_or(false)
    }

    fn sample_book(id: i64, title: &str) -> Book {
        Book {
            id,
            title: title.to_string(),
            author: "Frank Herbert".to_string(),
            isbn: "9780441013593".to_string(),
            publisher: "Ace".to_string(),
            year: 1965,
            genre: "Science Fiction".to_string(),
            total_copies: 2,
            available_copies: 1,
            created_at: None,
            updated_at: None,
        }
    }

    async fn login(Json(req): Json<LoginRequest>) -> AxumResponse {
        if req.username == "admin" && req.password == "admin" {
            Json(LoginResponse {
                token: TOKEN.to_string(),
                username: req.username,
                role: Role::Admin,
            })
            .into_response()
        } else {
            message(
                axum::http::StatusCode::UNAUTHORIZED,
                "Invalid username or password",
            )
        }
    }

    async fn books(headers: AxumHeaders) -> AxumResponse {
        if !authorized(&headers) {
            return message(axum::http::StatusCode::UNAUTHORIZED, "Unauthorized");
        }
        Json(vec![sample_book(1, "Dune")]).into_response()
    }

    async fn book(headers: AxumHeaders, Path(id): Path<i64>) -> AxumResponse {
        if !authorized(&headers) {
            return message(axum::http::StatusCode::UNAUTHORIZED, "Unauthorized");
        }
        if id == 1 {
            Json(sample_book(1, "Dune")).into_response()
        } else {
            message(axum::http::StatusCode::NOT_FOUND, "Book not found")
        }
    }

    async fn delete_book(Path(_id): Path<i64>) -> AxumResponse {
        axum::http::StatusCode::NO_CONTENT.into_response()
    }

    async fn search(Query(params): Query<HashMap<String, String>>) -> AxumResponse {
        let q = params.get("query").cloned().unwrap_or_default();
        Json(vec![sample_book(7, &q)]).into_response()
    }

    async fn dashboard() -> AxumResponse {
        (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
    }

    async fn start_server() -> String {
        let app = Router::new()
            .route("/api/v1/auth/login", post(login))
            .route("/api/v1/books", get(books))
            .route("/api/v1/books/search", get(search))
            .route("/api/v1/books/{id}", get(book).delete(delete_book))
            .route("/api/v1/reports/dashboard", get(dashboard));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn client(base_url: String, ctx: Arc<AppContext>) -> HttpApi {
        let mut config = ClientConfig::default();
        config.api.base_url = base_url;
        HttpApi::new(&config, ctx).unwrap()
    }

    fn credentials(password: &str) -> LoginRequest {
        LoginRequest {
            username: "admin".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_then_bearer_request() {
        let ctx = Arc::new(AppContext::ephemeral());
        let api = client(start_server().await, ctx.clone()).await;

        let resp = api.login(&credentials("admin")).await.unwrap();
        ctx.login(resp).await.unwrap();

        let books = api.list_books().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Dune");
    }

    #[tokio::test]
    async fn test_failed_login_keeps_server_message() {
        let ctx = Arc::new(AppContext::ephemeral());
        let api = client(start_server().await, ctx).await;

        let err = api.login(&credentials("wrong")).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Invalid username or password");
    }

    #[tokio::test]
    async fn test_unauthorized_clears_persisted_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let ctx = Arc::new(AppContext::init(Some(path.clone())).await);
        ctx.login(LoginResponse {
            token: "expired".to_string(),
            username: "admin".to_string(),
            role: Role::Admin,
        })
        .await
        .unwrap();
        assert!(path.exists());

        let api = client(start_server().await, ctx.clone()).await;
        let err = api.list_books().await.unwrap_err();

        assert!(err.is_unauthorized());
        assert!(!ctx.is_authenticated().await);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_error_bodies() {
        let ctx = Arc::new(AppContext::ephemeral());
        let api = client(start_server().await, ctx.clone()).await;
        let resp = api.login(&credentials("admin")).await.unwrap();
        ctx.login(resp).await.unwrap();

        let err = api.get_book(99).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "Book not found");

        // Plain-text body is used as-is
        let err = api.dashboard().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "boom");

        api.delete_book(1).await.unwrap();
    }

    #[tokio::test]
    async fn test_search_sends_query_parameter() {
        let ctx = Arc::new(AppContext::ephemeral());
        let api = client(start_server().await, ctx).await;

        let found = api.search_books("left hand").await.unwrap();
        assert_eq!(found[0].title, "left hand");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(format!("http://{}", addr), Arc::new(AppContext::ephemeral())).await;
        let err = api.list_books().await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }
}
