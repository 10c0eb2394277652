//! # libris-client: API Client and Workflows for Libris
//!
//! Everything between a front-end and the library backend: the REST client,
//! an in-process demo backend, the session, the query cache and the screen
//! view models.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         libris-client                                   │
//! │                                                                         │
//! │  Front-end (apps/console)                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  views: IssueForm, ReturnTable, TableState, DashboardView       │   │
//! │  └──────────────────────────────┬──────────────────────────────────┘   │
//! │                                 ▼                                       │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Library ── QueryCache ◄── CacheCoordinator ◄── MutationEvent   │   │
//! │  │     │                                                           │   │
//! │  │     ├── AppContext (session, persisted as JSON)                 │   │
//! │  │     ▼                                                           │   │
//! │  │  dyn LibraryApi                                                 │   │
//! │  │     ├── HttpApi ──► {base_url}/api/v1 (reqwest)                 │   │
//! │  │     └── DemoApi ──► libris-db (SQLite)       [feature "demo"]   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - `ClientConfig` (defaults → libris.toml → env)
//! - [`error`] - `ClientError` and its serializable report
//! - [`session`] - `AppContext`, login state and persistence
//! - [`api`] - `LibraryApi` trait, HTTP and demo backends
//! - [`cache`] - keyed query cache with stale time and retry
//! - [`coordinator`] - mutation events → cache invalidation
//! - [`library`] - the `Library` facade
//! - [`views`] - screen state and notices
//!
//! ## Usage
//!
//! ```rust,ignore
//! use libris_client::{ClientConfig, Library};
//!
//! let config = ClientConfig::load(None)?;
//! let library = Library::connect(&config).await?;
//! library.login("librarian", "librarian").await?;
//!
//! for book in library.books().await? {
//!     println!("{}", book.option_label());
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod library;
pub mod session;
pub mod views;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{HttpApi, LibraryApi};
#[cfg(feature = "demo")]
pub use api::DemoApi;
pub use cache::{QueryCache, QueryKey, QueryStatus};
pub use config::ClientConfig;
pub use coordinator::{CacheCoordinator, MutationEvent};
pub use error::{ClientError, ClientResult, ErrorCode, ErrorReport};
pub use library::Library;
pub use session::{AppContext, Session};
