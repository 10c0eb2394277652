//! # Report Repository
//!
//! Aggregate counters for the dashboard.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use libris_core::DashboardStats;

/// Read-only reporting queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Dashboard counters in one round trip.
    ///
    /// `total_members` counts active members only. Overdue figures depend on
    /// stored statuses, so callers refresh them first.
    pub async fn dashboard(&self) -> DbResult<DashboardStats> {
        let (total_books, total_members, active_issues, overdue_books, total_copies, available_copies): (
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM books),
                (SELECT COUNT(*) FROM members WHERE active = 1),
                (SELECT COUNT(*) FROM transactions WHERE return_date IS NULL),
                (SELECT COUNT(*) FROM transactions WHERE status = 'OVERDUE' AND return_date IS NULL),
                (SELECT COALESCE(SUM(total_copies), 0) FROM books),
                (SELECT COALESCE(SUM(available_copies), 0) FROM books)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let stats = DashboardStats {
            total_books,
            total_members,
            active_issues,
            overdue_books,
            total_copies,
            available_copies,
        };

        debug!(?stats, "Computed dashboard stats");
        Ok(stats)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use chrono::{Duration, Utc};
    use libris_core::{BookForm, IssueBookRequest, LoanPolicy, MemberForm};

    #[tokio::test]
    async fn test_dashboard_counts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        let empty = db.reports().dashboard().await.unwrap();
        assert_eq!(empty.total_books, 0);
        assert_eq!(empty.total_copies, 0);

        let mut book = BookForm::blank(2020);
        book.title = "Dune".into();
        book.author = "Frank Herbert".into();
        book.isbn = "9780441013593".into();
        book.total_copies = 4;
        book.available_copies = 4;
        let book = db.books().insert(&book, now).await.unwrap();

        let alice = db
            .members()
            .insert(
                &MemberForm {
                    name: "Alice".into(),
                    email: "alice@uni.edu".into(),
                    phone: "555-0100".into(),
                    ..Default::default()
                },
                now,
            )
            .await
            .unwrap();
        let bob = db
            .members()
            .insert(
                &MemberForm {
                    name: "Bob".into(),
                    email: "bob@uni.edu".into(),
                    phone: "555-0101".into(),
                    ..Default::default()
                },
                now,
            )
            .await
            .unwrap();
        db.members().set_active(bob.id, false).await.unwrap();

        let policy = LoanPolicy::default();
        let request = IssueBookRequest {
            book_id: book.id,
            member_id: alice.id,
        };
        db.transactions().issue(request, &policy, now).await.unwrap();
        db.transactions()
            .issue(request, &policy, now - Duration::days(30))
            .await
            .unwrap();
        db.transactions().refresh_overdue(now).await.unwrap();

        let stats = db.reports().dashboard().await.unwrap();
        assert_eq!(stats.total_books, 1);
        assert_eq!(stats.total_members, 1);
        assert_eq!(stats.active_issues, 2);
        assert_eq!(stats.overdue_books, 1);
        assert_eq!(stats.total_copies, 4);
        assert_eq!(stats.available_copies, 2);
        assert_eq!(stats.utilization_percent(), 50);
    }
}
