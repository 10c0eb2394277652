//! # Sample Data
//!
//! A small catalogue, member list and loan history used by the `seed`
//! binary and by the demo backend when it starts on an empty database.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::error::DbResult;
use crate::pool::Database;
use libris_core::{BookForm, IssueBookRequest, LoanPolicy, MemberForm, MemberType};

/// (title, author, isbn, publisher, year, genre)
pub const BOOKS: &[(&str, &str, &str, &str, i32, &str)] = &[
    ("Dune", "Frank Herbert", "9780441013593", "Ace", 1965, "Science Fiction"),
    ("The Hobbit", "J.R.R. Tolkien", "9780547928227", "Houghton Mifflin", 1937, "Fantasy"),
    ("Pride and Prejudice", "Jane Austen", "9780141439518", "Penguin", 1813, "Romance"),
    ("1984", "George Orwell", "9780451524935", "Signet", 1949, "Dystopian"),
    ("To Kill a Mockingbird", "Harper Lee", "9780061120084", "Harper", 1960, "Fiction"),
    ("The Great Gatsby", "F. Scott Fitzgerald", "9780743273565", "Scribner", 1925, "Fiction"),
    ("Moby-Dick", "Herman Melville", "9781503280786", "CreateSpace", 1851, "Adventure"),
    ("Brave New World", "Aldous Huxley", "9780060850524", "Harper", 1932, "Dystopian"),
    ("The Left Hand of Darkness", "Ursula K. Le Guin", "9780441478125", "Ace", 1969, "Science Fiction"),
    ("Foundation", "Isaac Asimov", "9780553293357", "Bantam", 1951, "Science Fiction"),
    ("Jane Eyre", "Charlotte Brontë", "9780141441146", "Penguin", 1847, "Romance"),
    ("The Name of the Rose", "Umberto Eco", "9780156001311", "Harcourt", 1980, "Mystery"),
    ("Beloved", "Toni Morrison", "9781400033416", "Vintage", 1987, "Fiction"),
    ("Neuromancer", "William Gibson", "9780441569595", "Ace", 1984, "Science Fiction"),
    ("The Silmarillion", "J.R.R. Tolkien", "9780544338012", "Houghton Mifflin", 1977, "Fantasy"),
    ("Crime and Punishment", "Fyodor Dostoevsky", "9780143058144", "Penguin", 1866, "Classic"),
    ("Frankenstein", "Mary Shelley", "9780486282114", "Dover", 1818, "Horror"),
    ("The Road", "Cormac McCarthy", "9780307387899", "Vintage", 2006, "Fiction"),
    ("Gödel, Escher, Bach", "Douglas Hofstadter", "9780465026562", "Basic Books", 1979, "Non-fiction"),
    ("A Wizard of Earthsea", "Ursula K. Le Guin", "9780547773742", "Houghton Mifflin", 1968, "Fantasy"),
];

/// (name, email, phone, type, active)
pub const MEMBERS: &[(&str, &str, &str, MemberType, bool)] = &[
    ("Alice Smith", "alice.smith@uni.edu", "555-0100", MemberType::Student, true),
    ("Bob Jones", "bob.jones@uni.edu", "555-0101", MemberType::Student, true),
    ("Carol White", "carol.white@uni.edu", "555-0102", MemberType::Faculty, true),
    ("David Brown", "david.brown@uni.edu", "555-0103", MemberType::Staff, true),
    ("Eve Green", "eve.green@uni.edu", "555-0104", MemberType::Student, false),
    ("Frank Black", "frank.black@uni.edu", "555-0105", MemberType::Faculty, true),
];

/// (book index, member index, days ago issued)
pub const LOANS: &[(usize, usize, i64)] = &[
    (0, 0, 2),
    (1, 0, 20),
    (3, 1, 5),
    (4, 2, 30),
    (9, 3, 1),
    (13, 5, 16),
];

/// What [`seed`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub books: usize,
    pub members: usize,
    pub loans: usize,
    pub overdue: u64,
}

/// Inserts the first `book_count` sample titles (1-4 copies each), every
/// sample member and the loans whose book was inserted.
///
/// Loans are issued in the past relative to `now`, so some come out overdue.
/// Failures on individual rows are logged and skipped.
pub async fn seed(db: &Database, book_count: usize, now: DateTime<Utc>) -> DbResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    let mut book_ids = Vec::with_capacity(book_count);
    for (idx, (title, author, isbn, publisher, year, genre)) in
        BOOKS.iter().take(book_count).enumerate()
    {
        let copies = 1 + (idx % 4) as i32;
        let form = BookForm {
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.to_string(),
            publisher: publisher.to_string(),
            year: *year,
            genre: genre.to_string(),
            total_copies: copies,
            available_copies: copies,
        };

        match db.books().insert(&form, now).await {
            Ok(book) => book_ids.push(book.id),
            Err(e) => warn!(title = %title, error = %e, "Failed to insert sample book"),
        }
    }
    summary.books = book_ids.len();

    let mut member_ids = Vec::with_capacity(MEMBERS.len());
    for (name, email, phone, member_type, active) in MEMBERS {
        let form = MemberForm {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            member_type: *member_type,
        };

        let member = db.members().insert(&form, now - Duration::days(90)).await?;
        if !active {
            db.members().set_active(member.id, false).await?;
        }
        member_ids.push(member.id);
    }
    summary.members = member_ids.len();

    let policy = LoanPolicy::default();
    for (book_idx, member_idx, days_ago) in LOANS {
        let (Some(book_id), Some(member_id)) = (book_ids.get(*book_idx), member_ids.get(*member_idx))
        else {
            continue;
        };

        let request = IssueBookRequest {
            book_id: *book_id,
            member_id: *member_id,
        };
        match db
            .transactions()
            .issue(request, &policy, now - Duration::days(*days_ago))
            .await
        {
            Ok(_) => summary.loans += 1,
            Err(e) => warn!(book_id = %book_id, error = %e, "Failed to issue sample loan"),
        }
    }
    summary.overdue = db.transactions().refresh_overdue(now).await?;

    info!(
        books = summary.books,
        members = summary.members,
        loans = summary.loans,
        overdue = summary.overdue,
        "Sample data inserted"
    );
    Ok(summary)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;

    #[tokio::test]
    async fn test_seed_full_catalogue() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let summary = seed(&db, BOOKS.len(), Utc::now()).await.unwrap();

        assert_eq!(summary.books, BOOKS.len());
        assert_eq!(summary.members, MEMBERS.len());
        assert_eq!(summary.loans, LOANS.len());
        // Issued 20, 30 and 16 days ago
        assert_eq!(summary.overdue, 3);

        let stats = db.reports().dashboard().await.unwrap();
        assert_eq!(stats.total_members, 5);
        assert_eq!(stats.active_issues, LOANS.len() as i64);
        assert_eq!(stats.overdue_books, 3);
    }

    #[tokio::test]
    async fn test_seed_partial_catalogue_skips_orphan_loans() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let summary = seed(&db, 2, Utc::now()).await.unwrap();

        assert_eq!(summary.books, 2);
        // Only loans on books 0 and 1 remain
        assert_eq!(summary.loans, 2);
    }
}
