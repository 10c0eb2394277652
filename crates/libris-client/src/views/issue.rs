//! # Issue Form
//!
//! Two selectors (book, member) and a submit action.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Book:   [ Dune by Frank Herbert (2 available)        ▼ ]              │
//! │  Member: [ Alice Smith (STUDENT)                      ▼ ]              │
//! │                                        [ Issue Book ]                   │
//! │                                                                         │
//! │  Only books with copies on the shelf and active members are listed,   │
//! │  so an unavailable copy can never be chosen.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use super::notice::Notice;
use crate::error::{ClientError, ClientResult};
use crate::library::Library;
use libris_core::validation::validate_issue_selection;
use libris_core::{Book, BookId, FormErrors, Member, MemberId};

/// One entry of a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub id: i64,
    pub label: String,
}

/// Books that can be issued right now.
pub fn book_options(books: &[Book]) -> Vec<SelectOption> {
    books
        .iter()
        .filter(|b| b.is_available())
        .map(|b| SelectOption {
            id: b.id,
            label: b.option_label(),
        })
        .collect()
}

/// Members allowed to borrow.
pub fn member_options(members: &[Member]) -> Vec<SelectOption> {
    members
        .iter()
        .filter(|m| m.active)
        .map(|m| SelectOption {
            id: m.id,
            label: m.option_label(),
        })
        .collect()
}

/// State of the issue form.
#[derive(Debug, Clone, Default)]
pub struct IssueForm {
    books: Vec<SelectOption>,
    members: Vec<SelectOption>,
    book_id: Option<BookId>,
    member_id: Option<MemberId>,
}

impl IssueForm {
    pub fn new(books: &[Book], members: &[Member]) -> Self {
        IssueForm {
            books: book_options(books),
            members: member_options(members),
            book_id: None,
            member_id: None,
        }
    }

    /// Builds the form from the cached book and member collections.
    pub async fn load(library: &Library) -> ClientResult<Self> {
        let books = library.books().await?;
        let members = library.members().await?;
        Ok(Self::new(&books, &members))
    }

    /// Reloads the selectors, dropping selections that are no longer valid.
    pub async fn refresh(&mut self, library: &Library) -> ClientResult<()> {
        let fresh = Self::load(library).await?;
        self.books = fresh.books;
        self.members = fresh.members;
        if !self.offers_book(self.book_id) {
            self.book_id = None;
        }
        if !self.offers_member(self.member_id) {
            self.member_id = None;
        }
        Ok(())
    }

    pub fn book_options(&self) -> &[SelectOption] {
        &self.books
    }

    pub fn member_options(&self) -> &[SelectOption] {
        &self.members
    }

    fn offers_book(&self, id: Option<BookId>) -> bool {
        id.map(|id| self.books.iter().any(|o| o.id == id))
            .unwrap_or(false)
    }

    fn offers_member(&self, id: Option<MemberId>) -> bool {
        id.map(|id| self.members.iter().any(|o| o.id == id))
            .unwrap_or(false)
    }

    /// Chooses a book. Only listed (available) books can be chosen.
    pub fn select_book(&mut self, id: BookId) -> ClientResult<()> {
        if !self.offers_book(Some(id)) {
            return Err(ClientError::Rejected(format!(
                "Book {} is not available for issue",
                id
            )));
        }
        self.book_id = Some(id);
        Ok(())
    }

    /// Chooses a member. Only listed (active) members can be chosen.
    pub fn select_member(&mut self, id: MemberId) -> ClientResult<()> {
        if !self.offers_member(Some(id)) {
            return Err(ClientError::Rejected(format!(
                "Member {} cannot borrow books",
                id
            )));
        }
        self.member_id = Some(id);
        Ok(())
    }

    pub fn selection(&self) -> (Option<BookId>, Option<MemberId>) {
        (self.book_id, self.member_id)
    }

    pub fn reset(&mut self) {
        self.book_id = None;
        self.member_id = None;
    }

    /// Submits the form.
    ///
    /// Empty selectors fail locally with per-field messages and nothing is
    /// sent. Otherwise the selection resets and the server's answer comes
    /// back as a notice.
    pub async fn submit(&mut self, library: &Library) -> Result<Notice, FormErrors> {
        let request = validate_issue_selection(self.book_id, self.member_id)?;
        self.reset();

        Ok(match library.issue_book(request).await {
            Ok(_) => Notice::success("Book issued successfully"),
            Err(e) => Notice::failure("Failed to issue book", &e),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
