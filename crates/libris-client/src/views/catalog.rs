//! # Book and Member Tables
//!
//! Client-side search and paging over the cached collections, plus the
//! create/edit/delete actions with their notices.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Search: [ tolkien        ]                        [ + Add Book ]      │
//! │                                                                         │
//! │  Title            Author          ISBN        Copies                    │
//! │  The Hobbit       J.R.R. Tolkien  978054...   2/2     [Edit] [Delete]  │
//! │  The Silmarillion J.R.R. Tolkien  978054...   3/3     [Edit] [Delete]  │
//! │                                                                         │
//! │  Showing 1-2 of 2                                   (pager hidden)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Filtering borrows from the cached collection and never changes it.

use serde::Serialize;

use super::notice::Notice;
use crate::error::ClientError;
use crate::library::Library;
use libris_core::search::{filter_books, filter_members, paginate};
use libris_core::{Book, BookForm, BookId, FormErrors, Member, MemberForm, MemberId, Page};

pub const NO_BOOKS_TEXT: &str = "No books found";
pub const NO_MEMBERS_TEXT: &str = "No members found";

/// Search box and current page of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableState {
    query: String,
    page: usize,
}

impl Default for TableState {
    fn default() -> Self {
        TableState {
            query: String::new(),
            page: 1,
        }
    }
}

impl TableState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Changing the query always goes back to page 1.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
    }

    pub fn go_to(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn next_page<T>(&mut self, current: &Page<T>) {
        if current.has_next() {
            self.page = current.page + 1;
        }
    }

    pub fn previous_page<T>(&mut self, current: &Page<T>) {
        if current.has_previous() {
            self.page = current.page - 1;
        }
    }

    /// Matching books on the current page.
    pub fn book_page(&self, books: &[Book]) -> Page<Book> {
        let hits = filter_books(books, &self.query);
        paginate(&hits, self.page).map(Book::clone)
    }

    /// Matching members on the current page.
    pub fn member_page(&self, members: &[Member]) -> Page<Member> {
        let hits = filter_members(members, &self.query);
        paginate(&hits, self.page).map(Member::clone)
    }
}

/// Text shown in place of rows, if the page is empty.
pub fn empty_text<T>(page: &Page<T>, text: &'static str) -> Option<&'static str> {
    page.is_empty().then_some(text)
}

// =============================================================================
// Editors
// =============================================================================

/// Whether an editor creates a new record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode<Id> {
    Create,
    Edit(Id),
}

/// Saves the book form.
///
/// Validation failures come back as `Err` with per-field messages and no
/// request is sent. Everything else becomes a notice.
pub async fn save_book(
    library: &Library,
    mode: EditMode<BookId>,
    form: &BookForm,
) -> Result<Notice, FormErrors> {
    let result = match mode {
        EditMode::Create => library.create_book(form).await.map(|_| "Book added successfully"),
        EditMode::Edit(id) => library
            .update_book(id, form)
            .await
            .map(|_| "Book updated successfully"),
    };
    let failure = match mode {
        EditMode::Create => "Failed to add book",
        EditMode::Edit(_) => "Failed to update book",
    };
    into_notice(result, failure)
}

pub async fn delete_book(library: &Library, id: BookId) -> Notice {
    match library.delete_book(id).await {
        Ok(()) => Notice::success("Book deleted successfully"),
        Err(e) => Notice::failure("Failed to delete book", &e),
    }
}

/// Saves the member form. Same contract as [`save_book`].
pub async fn save_member(
    library: &Library,
    mode: EditMode<MemberId>,
    form: &MemberForm,
) -> Result<Notice, FormErrors> {
    let result = match mode {
        EditMode::Create => library
            .create_member(form)
            .await
            .map(|_| "Member added successfully"),
        EditMode::Edit(id) => library
            .update_member(id, form)
            .await
            .map(|_| "Member updated successfully"),
    };
    let failure = match mode {
        EditMode::Create => "Failed to add member",
        EditMode::Edit(_) => "Failed to update member",
    };
    into_notice(result, failure)
}

pub async fn delete_member(library: &Library, id: MemberId) -> Notice {
    match library.delete_member(id).await {
        Ok(()) => Notice::success("Member deleted successfully"),
        Err(e) => Notice::failure("Failed to delete member", &e),
    }
}

fn into_notice(result: Result<&'static str, ClientError>, failure: &str) -> Result<Notice, FormErrors> {
    match result {
        Ok(title) => Ok(Notice::success(title)),
        Err(ClientError::Validation(errors)) => Err(errors),
        Err(e) => Ok(Notice::failure(failure, &e)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use libris_core::MemberType;

    fn books(n: i64) -> Vec<Book> {
        (1..=n)
            .map(|i| Book {
                id: i,
                title: if i % 2 == 0 {
                    format!("Tolkien vol {}", i)
                } else {
                    format!("Other {}", i)
                },
                author: "Someone".to_string(),
                isbn: format!("isbn{}", i),
                publisher: String::new(),
                year: 2000,
                genre: "Fantasy".to_string(),
                total_copies: 1,
                available_copies: 1,
                created_at: None,
                updated_at: None,
            })
            .collect()
    }

    #[test]
    fn test_query_resets_page() {
        let all = books(20);
        let mut state = TableState::new();

        let page = state.book_page(&all);
        assert_eq!(page.summary(), "Showing 1-8 of 20");
        state.next_page(&page);
        let page = state.book_page(&all);
        state.next_page(&page);
        assert_eq!(state.page(), 3);
        assert_eq!(state.book_page(&all).summary(), "Showing 17-20 of 20");

        state.set_query("TOLKIEN");
        assert_eq!(state.page(), 1);
        let page = state.book_page(&all);
        assert_eq!(page.total_items, 10);
        assert_eq!(page.position(), "Page 1 of 2");
    }

    #[test]
    fn test_filter_never_mutates_collection() {
        let members = vec![Member {
            id: 1,
            name: "Alice Smith".to_string(),
            email: "alice@uni.edu".to_string(),
            phone: "555-0100".to_string(),
            member_type: MemberType::Student,
            membership_date: Utc::now(),
            active: true,
        }];
        let mut state = TableState::new();
        state.set_query("teal");

        let page = state.member_page(&members);
        assert!(page.is_empty());
        assert_eq!(empty_text(&page, NO_MEMBERS_TEXT), Some("No members found"));
        assert_eq!(members.len(), 1);
    }

    #[test]
    fn test_previous_page_stops_at_first() {
        let all = books(3);
        let mut state = TableState::new();
        let page = state.book_page(&all);
        state.previous_page(&page);
        assert_eq!(state.page(), 1);
        assert!(!page.has_pager());
    }

    #[cfg(feature = "demo")]
    #[tokio::test]
    async fn test_save_and_delete_notices() {
        use crate::api::DemoApi;
        use crate::cache::QueryCache;
        use crate::config::DemoSettings;
        use crate::session::AppContext;
        use std::sync::Arc;
        use std::time::Duration;

        let ctx = Arc::new(AppContext::ephemeral());
        let settings = DemoSettings {
            enabled: true,
            database_path: None,
            seed_sample_data: false,
        };
        let api = DemoApi::open(&settings, ctx.clone()).await.unwrap();
        let lib = Library::with_api(
            Arc::new(api),
            ctx,
            Arc::new(QueryCache::new(Duration::from_secs(300), 1)),
        );
        lib.login("admin", "admin").await.unwrap();

        let mut form = BookForm::blank(2001);
        let errors = save_book(&lib, EditMode::Create, &form).await.unwrap_err();
        assert_eq!(errors.message("title"), Some("Title is required"));

        form.title = "Neuromancer".into();
        form.author = "William Gibson".into();
        form.isbn = "9780441569595".into();
        let notice = save_book(&lib, EditMode::Create, &form).await.unwrap();
        assert_eq!(notice.title, "Book added successfully");

        let notice = save_book(&lib, EditMode::Edit(999), &form).await.unwrap();
        assert!(!notice.is_success());
        assert_eq!(notice.title, "Failed to update book");
        assert_eq!(notice.detail.as_deref(), Some("Book not found"));

        let id = lib.books().await.unwrap()[0].id;
        assert!(delete_book(&lib, id).await.is_success());

        let remaining = lib.books().await.unwrap();
        let page = TableState::new().book_page(&remaining);
        assert_eq!(empty_text(&page, NO_BOOKS_TEXT), Some("No books found"));
    }
}
