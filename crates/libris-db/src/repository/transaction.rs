//! # Transaction Repository
//!
//! Issue and return of book copies.
//!
//! ## Issue / Return Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Loan Lifecycle (one SQL transaction each)            │
//! │                                                                         │
//! │  issue(book_id, member_id)                                             │
//! │    BEGIN                                                               │
//! │    ├── load book + member            (404 if either is missing)        │
//! │    ├── count member's open loans                                       │
//! │    ├── LoanPolicy::check_can_issue   (copies, active, limit)           │
//! │    ├── available_copies - 1          (guarded: > 0)                    │
//! │    └── INSERT status=ISSUED, due = issue + 14 days                     │
//! │    COMMIT                                                              │
//! │                                                                         │
//! │  return_book(id)                                                       │
//! │    BEGIN                                                               │
//! │    ├── load transaction              (400 if already returned)         │
//! │    ├── fine = days overdue × $0.50                                     │
//! │    ├── status=RETURNED, return_date=now                                │
//! │    └── available_copies + 1          (capped at total_copies)          │
//! │    COMMIT                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Overdue
//! SQLite stores dates as RFC 3339 text, so overdue detection is done in
//! Rust with [`derive_status`] rather than by string comparison in SQL.
//! [`TransactionRepository::refresh_overdue`] flips ISSUED rows to OVERDUE
//! and is called before anything that reads statuses.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::book::BOOK_COLUMNS;
use crate::repository::member::MEMBER_COLUMNS;
use libris_core::loans::derive_status;
use libris_core::{
    Book, CoreError, IssueBookRequest, LoanPolicy, Member, MemberId, Transaction,
    TransactionId, TransactionStatus,
};

/// Transaction row joined with the book title and member name.
const TRANSACTION_SELECT: &str = r#"
    SELECT
        t.id,
        t.book_id,
        t.member_id,
        b.title AS book_title,
        m.name AS member_name,
        t.issue_date,
        t.due_date,
        t.return_date,
        t.status,
        t.fine_cents AS fine
    FROM transactions t
    INNER JOIN books b ON b.id = t.book_id
    INNER JOIN members m ON m.id = t.member_id
"#;

/// Repository for loan transactions.
///
/// ## Usage
/// ```rust,ignore
/// let repo = TransactionRepository::new(pool);
/// let policy = LoanPolicy::default();
///
/// let loan = repo.issue(IssueBookRequest { book_id: 1, member_id: 2 }, &policy, Utc::now()).await?;
/// let closed = repo.return_book(loan.id, &policy, Utc::now()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Gets a transaction by ID.
    pub async fn get_by_id(&self, id: TransactionId) -> DbResult<Option<Transaction>> {
        let sql = format!("{TRANSACTION_SELECT} WHERE t.id = ?1");
        let tx = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tx)
    }

    /// Every transaction, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Transaction>> {
        let sql = format!("{TRANSACTION_SELECT} ORDER BY t.issue_date DESC, t.id DESC");
        let rows = sqlx::query_as::<_, Transaction>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Unreturned transactions (ISSUED or OVERDUE), soonest due first.
    pub async fn list_active(&self) -> DbResult<Vec<Transaction>> {
        let sql = format!(
            "{TRANSACTION_SELECT} WHERE t.return_date IS NULL ORDER BY t.due_date, t.id"
        );
        let rows = sqlx::query_as::<_, Transaction>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed active transactions");
        Ok(rows)
    }

    /// Unreturned transactions flagged OVERDUE, most overdue first.
    pub async fn list_overdue(&self) -> DbResult<Vec<Transaction>> {
        let sql = format!(
            "{TRANSACTION_SELECT} WHERE t.status = 'OVERDUE' AND t.return_date IS NULL \
             ORDER BY t.due_date, t.id"
        );
        let rows = sqlx::query_as::<_, Transaction>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed overdue transactions");
        Ok(rows)
    }

    /// Open loans currently held by a member.
    pub async fn count_open_by_member(&self, member_id: MemberId) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE member_id = ?1 AND return_date IS NULL",
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Marks open loans past their due date as OVERDUE.
    ///
    /// ## Returns
    /// Number of rows whose status changed.
    pub async fn refresh_overdue(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let open: Vec<(TransactionId, DateTime<Utc>, TransactionStatus)> = sqlx::query_as(
            "SELECT id, due_date, status FROM transactions WHERE return_date IS NULL",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut changed = 0;
        for (id, due_date, status) in open {
            let derived = derive_status(due_date, None, now);
            if derived == status {
                continue;
            }

            changed += sqlx::query("UPDATE transactions SET status = ?2 WHERE id = ?1")
                .bind(id)
                .bind(derived)
                .execute(&self.pool)
                .await?
                .rows_affected();
        }

        if changed > 0 {
            info!(changed = changed, "Refreshed overdue statuses");
        }
        Ok(changed)
    }

    /// Issues one copy of a book to a member.
    ///
    /// ## Errors
    /// * `DbError::Rule(CoreError::BookNotFound)` / `MemberNotFound`
    /// * `DbError::Rule(CoreError::NoCopiesAvailable)`
    /// * `DbError::Rule(CoreError::MemberInactive)`
    /// * `DbError::Rule(CoreError::LoanLimitReached)`
    pub async fn issue(
        &self,
        request: IssueBookRequest,
        policy: &LoanPolicy,
        now: DateTime<Utc>,
    ) -> DbResult<Transaction> {
        debug!(
            book_id = %request.book_id,
            member_id = %request.member_id,
            "Issuing book"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let book_sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1");
        let book = sqlx::query_as::<_, Book>(&book_sql)
            .bind(request.book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::BookNotFound(request.book_id))?;

        let member_sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1");
        let member = sqlx::query_as::<_, Member>(&member_sql)
            .bind(request.member_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::MemberNotFound(request.member_id))?;

        let open_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE member_id = ?1 AND return_date IS NULL",
        )
        .bind(member.id)
        .fetch_one(&mut *tx)
        .await?;

        policy.check_can_issue(&book, &member, open_loans)?;

        // Guarded decrement: never below zero even if the row changed under us
        let taken = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1, updated_at = ?2
            WHERE id = ?1 AND available_copies > 0
            "#,
        )
        .bind(book.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if taken.rows_affected() == 0 {
            return Err(CoreError::NoCopiesAvailable(book.id).into());
        }

        let due_date = policy.due_date(now);
        let inserted = sqlx::query(
            r#"
            INSERT INTO transactions (book_id, member_id, issue_date, due_date, return_date, status, fine_cents)
            VALUES (?1, ?2, ?3, ?4, NULL, ?5, 0)
            "#,
        )
        .bind(book.id)
        .bind(member.id)
        .bind(now)
        .bind(due_date)
        .bind(TransactionStatus::Issued)
        .execute(&mut *tx)
        .await?;

        let id = inserted.last_insert_rowid();

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            transaction_id = %id,
            book_id = %book.id,
            member_id = %member.id,
            due_date = %due_date,
            "Book issued"
        );

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))
    }

    /// Closes a loan, charging the overdue fine.
    ///
    /// ## Errors
    /// * `DbError::Rule(CoreError::TransactionNotFound)`
    /// * `DbError::Rule(CoreError::AlreadyReturned)`
    pub async fn return_book(
        &self,
        id: TransactionId,
        policy: &LoanPolicy,
        now: DateTime<Utc>,
    ) -> DbResult<Transaction> {
        debug!(transaction_id = %id, "Returning book");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let sql = format!("{TRANSACTION_SELECT} WHERE t.id = ?1");
        let loan = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::TransactionNotFound(id))?;

        if loan.return_date.is_some() {
            return Err(CoreError::AlreadyReturned(id).into());
        }

        let fine = policy.fine_for(loan.due_date, now);

        sqlx::query(
            r#"
            UPDATE transactions
            SET return_date = ?2, status = ?3, fine_cents = ?4
            WHERE id = ?1 AND return_date IS NULL
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(TransactionStatus::Returned)
        .bind(fine)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE books
            SET available_copies = MIN(available_copies + 1, total_copies), updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(loan.book_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(transaction_id = %id, fine = %fine, "Book returned");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Duration;
    use libris_core::{BookForm, MemberForm, MemberType, Money};

    struct Fixture {
        db: Database,
        book_id: i64,
        member_id: i64,
    }

    async fn setup(copies: i32, member_type: MemberType) -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        let book = db
            .books()
            .insert(
                &BookForm {
                    title: "Dune".to_string(),
                    author: "Frank Herbert".to_string(),
                    isbn: "9780441013593".to_string(),
                    publisher: "Ace".to_string(),
                    year: 1965,
                    genre: "Science Fiction".to_string(),
                    total_copies: copies,
                    available_copies: copies,
                },
                now,
            )
            .await
            .unwrap();

        let member = db
            .members()
            .insert(
                &MemberForm {
                    name: "Alice Smith".to_string(),
                    email: "alice@uni.edu".to_string(),
                    phone: "555-0100".to_string(),
                    member_type,
                },
                now,
            )
            .await
            .unwrap();

        Fixture {
            db,
            book_id: book.id,
            member_id: member.id,
        }
    }

    fn request(f: &Fixture) -> IssueBookRequest {
        IssueBookRequest {
            book_id: f.book_id,
            member_id: f.member_id,
        }
    }

    #[tokio::test]
    async fn test_issue_then_return_single_copy() {
        let f = setup(1, MemberType::Student).await;
        let repo = f.db.transactions();
        let policy = LoanPolicy::default();
        let now = Utc::now();

        let loan = repo.issue(request(&f), &policy, now).await.unwrap();
        assert_eq!(loan.status, TransactionStatus::Issued);
        assert_eq!(loan.due_date - loan.issue_date, Duration::days(14));
        assert_eq!(loan.book_title, "Dune");
        assert_eq!(loan.member_name, "Alice Smith");
        assert!(loan.return_date.is_none());

        let book = f.db.books().get_by_id(f.book_id).await.unwrap().unwrap();
        assert_eq!(book.available_copies, 0);

        let closed = repo.return_book(loan.id, &policy, now).await.unwrap();
        assert_eq!(closed.status, TransactionStatus::Returned);
        assert!(closed.return_date.is_some());
        assert!(closed.fine.is_zero());

        let book = f.db.books().get_by_id(f.book_id).await.unwrap().unwrap();
        assert_eq!(book.available_copies, 1);
    }

    #[tokio::test]
    async fn test_issue_without_copies_is_rejected() {
        let f = setup(1, MemberType::Student).await;
        let repo = f.db.transactions();
        let policy = LoanPolicy::default();

        repo.issue(request(&f), &policy, Utc::now()).await.unwrap();
        let err = repo.issue(request(&f), &policy, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::NoCopiesAvailable(_))));
        assert_eq!(err.to_string(), "No copies available");

        // Nothing was written by the failed attempt
        assert_eq!(repo.count_open_by_member(f.member_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_issue_unknown_records() {
        let f = setup(1, MemberType::Student).await;
        let repo = f.db.transactions();
        let policy = LoanPolicy::default();

        let err = repo
            .issue(IssueBookRequest { book_id: 99, member_id: f.member_id }, &policy, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::BookNotFound(99))));

        let err = repo
            .issue(IssueBookRequest { book_id: f.book_id, member_id: 77 }, &policy, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::MemberNotFound(77))));
    }

    #[tokio::test]
    async fn test_inactive_member_cannot_borrow() {
        let f = setup(2, MemberType::Faculty).await;
        f.db.members().set_active(f.member_id, false).await.unwrap();

        let err = f
            .db
            .transactions()
            .issue(request(&f), &LoanPolicy::default(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::MemberInactive { .. })));
    }

    #[tokio::test]
    async fn test_student_loan_limit() {
        let f = setup(10, MemberType::Student).await;
        let repo = f.db.transactions();
        let policy = LoanPolicy::default();

        for _ in 0..5 {
            repo.issue(request(&f), &policy, Utc::now()).await.unwrap();
        }
        let err = repo.issue(request(&f), &policy, Utc::now()).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::LoanLimitReached { max: 5, .. })
        ));
    }

    #[tokio::test]
    async fn test_return_twice_is_rejected() {
        let f = setup(1, MemberType::Student).await;
        let repo = f.db.transactions();
        let policy = LoanPolicy::default();

        let loan = repo.issue(request(&f), &policy, Utc::now()).await.unwrap();
        repo.return_book(loan.id, &policy, Utc::now()).await.unwrap();

        let err = repo.return_book(loan.id, &policy, Utc::now()).await.unwrap_err();
        assert_eq!(err.to_string(), "This book has already been returned");

        // Copies never exceed the total
        let book = f.db.books().get_by_id(f.book_id).await.unwrap().unwrap();
        assert_eq!(book.available_copies, 1);

        assert!(matches!(
            repo.return_book(404, &policy, Utc::now()).await,
            Err(DbError::Rule(CoreError::TransactionNotFound(404)))
        ));
    }

    #[tokio::test]
    async fn test_overdue_refresh_and_fine() {
        let f = setup(1, MemberType::Student).await;
        let repo = f.db.transactions();
        let policy = LoanPolicy::default();
        let now = Utc::now();

        // Issued 20 days ago: due 6 days ago
        let loan = repo
            .issue(request(&f), &policy, now - Duration::days(20))
            .await
            .unwrap();
        assert_eq!(loan.status, TransactionStatus::Issued);
        assert!(repo.list_overdue().await.unwrap().is_empty());

        assert_eq!(repo.refresh_overdue(now).await.unwrap(), 1);
        assert_eq!(repo.refresh_overdue(now).await.unwrap(), 0);

        let overdue = repo.list_overdue().await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].status, TransactionStatus::Overdue);
        assert_eq!(repo.list_active().await.unwrap().len(), 1);

        let closed = repo.return_book(loan.id, &policy, now).await.unwrap();
        assert_eq!(closed.fine, Money::from_cents(300));
        assert!(repo.list_active().await.unwrap().is_empty());
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_refused_while_on_loan() {
        let f = setup(1, MemberType::Student).await;
        let repo = f.db.transactions();
        let policy = LoanPolicy::default();
        let loan = repo.issue(request(&f), &policy, Utc::now()).await.unwrap();

        let err = f.db.members().delete(f.member_id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::MemberHasActiveLoans { count: 1, .. })
        ));
        assert_eq!(err.to_string(), "Cannot delete member with 1 active loan(s)");

        let err = f.db.books().delete(f.book_id).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::BookHasActiveLoans(_))));
        assert_eq!(err.to_string(), "Cannot delete book with active loans");

        // Nothing was lost
        assert_eq!(repo.list_active().await.unwrap().len(), 1);
        let book = f.db.books().get_by_id(f.book_id).await.unwrap().unwrap();
        assert_eq!(book.available_copies, 0);

        // Once returned, both go along with the closed history
        repo.return_book(loan.id, &policy, Utc::now()).await.unwrap();
        f.db.members().delete(f.member_id).await.unwrap();
        f.db.books().delete(f.book_id).await.unwrap();
        assert!(repo.list_all().await.unwrap().is_empty());
    }
}
