//! # Search & Pagination
//!
//! Client-side filtering of already-fetched collections and fixed-size
//! paging for tables.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  cached Vec<Book> (never modified)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  filter_books(&books, "tolkien")  → Vec<&Book>                         │
//! │       │   case-insensitive substring on title/author/isbn/genre         │
//! │       ▼                                                                 │
//! │  paginate(&filtered, page)        → Page { 8 rows, totals }            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  "Showing 9-16 of 20"   "Page 2 of 3"                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use crate::types::{Book, Member};
use crate::PAGE_SIZE;

// =============================================================================
// Filtering
// =============================================================================

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Whether a book matches a query on title, author, ISBN or genre.
///
/// An empty (or whitespace) query matches everything.
pub fn book_matches(book: &Book, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    contains_ci(&book.title, &needle)
        || contains_ci(&book.author, &needle)
        || contains_ci(&book.isbn, &needle)
        || contains_ci(&book.genre, &needle)
}

/// Whether a member matches a query on name, email or phone.
pub fn member_matches(member: &Member, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    contains_ci(&member.name, &needle)
        || contains_ci(&member.email, &needle)
        || contains_ci(&member.phone, &needle)
}

/// Borrows the books matching `query`, preserving order.
///
/// ## Example
/// ```rust,ignore
/// let hits = filter_books(&cached, "TOLKIEN");
/// ```
pub fn filter_books<'a>(books: &'a [Book], query: &str) -> Vec<&'a Book> {
    books.iter().filter(|b| book_matches(b, query)).collect()
}

/// Borrows the members matching `query`, preserving order.
pub fn filter_members<'a>(members: &'a [Member], query: &str) -> Vec<&'a Member> {
    members.iter().filter(|m| member_matches(m, query)).collect()
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a table.
///
/// `page` is 1-based. Out-of-range requests are clamped to the last page,
/// which is what a table wants after rows disappear under it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Index (1-based) of the first row on this page, 0 when empty.
    pub fn first_row(&self) -> usize {
        if self.total_items == 0 {
            0
        } else {
            (self.page - 1) * self.page_size + 1
        }
    }

    /// Index (1-based) of the last row on this page.
    pub fn last_row(&self) -> usize {
        (self.page * self.page_size).min(self.total_items)
    }

    /// `"Showing 9-16 of 20"`
    pub fn summary(&self) -> String {
        format!(
            "Showing {}-{} of {}",
            self.first_row(),
            self.last_row(),
            self.total_items
        )
    }

    /// `"Page 2 of 3"`
    pub fn position(&self) -> String {
        format!("Page {} of {}", self.page, self.total_pages.max(1))
    }

    /// Tables only render pager controls when there is more than one page.
    pub fn has_pager(&self) -> bool {
        self.total_pages > 1
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Converts the rows while keeping page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Number of pages needed for `total` rows (0 for an empty table).
pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Slices `items` into page `page` (1-based) of [`PAGE_SIZE`] rows.
pub fn paginate<T: Clone>(items: &[T], page: usize) -> Page<T> {
    paginate_with(items, page, PAGE_SIZE)
}

/// Same as [`paginate`] with an explicit page size.
pub fn paginate_with<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_pages(total_items, page_size);
    let page = page.clamp(1, total_pages.max(1));

    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total_items);
    let items = if start < end {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };

    Page {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemberType;
    use chrono::Utc;

    fn book(title: &str, author: &str, isbn: &str, genre: &str) -> Book {
        Book {
            id: 0,
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.to_string(),
            publisher: String::new(),
            year: 2000,
            genre: genre.to_string(),
            total_copies: 1,
            available_copies: 1,
            created_at: None,
            updated_at: None,
        }
    }

    fn member(name: &str, email: &str, phone: &str) -> Member {
        Member {
            id: 0,
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            member_type: MemberType::Student,
            membership_date: Utc::now(),
            active: true,
        }
    }

    #[test]
    fn test_book_matches_each_field() {
        let b = book("The Hobbit", "J.R.R. Tolkien", "9780547928227", "Fantasy");
        assert!(book_matches(&b, "hobbit"));
        assert!(book_matches(&b, "TOLKIEN"));
        assert!(book_matches(&b, "928227"));
        assert!(book_matches(&b, "fant"));
        assert!(book_matches(&b, ""));
        assert!(!book_matches(&b, "dune"));
    }

    #[test]
    fn test_member_search_without_match_leaves_source_intact() {
        let members = vec![
            member("Alice Smith", "alice@uni.edu", "555-0100"),
            member("Bob Jones", "bob@uni.edu", "555-0101"),
        ];
        let snapshot = members.clone();

        let hits = filter_members(&members, "teal");
        assert!(hits.is_empty());
        assert_eq!(members, snapshot);

        assert_eq!(filter_members(&members, "0101").len(), 1);
        assert_eq!(filter_members(&members, "UNI.EDU").len(), 2);
    }

    #[test]
    fn test_paginate_pages_of_eight() {
        let rows: Vec<u32> = (1..=20).collect();

        let first = paginate(&rows, 1);
        assert_eq!(first.items, (1..=8).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.summary(), "Showing 1-8 of 20");
        assert_eq!(first.position(), "Page 1 of 3");
        assert!(!first.has_previous());
        assert!(first.has_next());

        let last = paginate(&rows, 3);
        assert_eq!(last.items, vec![17, 18, 19, 20]);
        assert_eq!(last.summary(), "Showing 17-20 of 20");
        assert!(!last.has_next());
    }

    #[test]
    fn test_paginate_clamps_out_of_range() {
        let rows: Vec<u32> = (1..=10).collect();
        assert_eq!(paginate(&rows, 9).page, 2);
        assert_eq!(paginate(&rows, 0).page, 1);

        let empty: Vec<u32> = Vec::new();
        let page = paginate(&empty, 1);
        assert!(page.is_empty());
        assert_eq!(page.summary(), "Showing 0-0 of 0");
        assert_eq!(page.position(), "Page 1 of 1");
        assert!(!page.has_pager());
    }
}
