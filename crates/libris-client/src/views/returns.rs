//! # Return Table
//!
//! Open loans with a return action per row.
//!
//! | Book | Member | Issued | Due | Status | Fine | |
//! |------|--------|--------|-----|--------|------|-|
//! | Dune | Alice  | 2024-03-01 | 2024-03-15 | `Overdue` | $1.50 | Return |

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::notice::Notice;
use crate::error::{ClientError, ClientResult};
use crate::library::Library;
use libris_core::dates::display_date;
use libris_core::loans::days_overdue;
use libris_core::{Transaction, TransactionId, TransactionStatus};

/// Shown when nothing is on loan.
pub const EMPTY_TEXT: &str = "No active transactions";

/// Status badge of a loan row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Badge {
    Issued,
    Overdue,
}

impl Badge {
    /// Overdue once the server says so or a whole day has passed since the
    /// due date, the same day count the fine uses.
    pub fn for_transaction(tx: &Transaction, now: DateTime<Utc>) -> Self {
        if tx.status == TransactionStatus::Overdue || days_overdue(tx.due_date, now) > 0 {
            Badge::Overdue
        } else {
            Badge::Issued
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Badge::Issued => "Issued",
            Badge::Overdue => "Overdue",
        }
    }
}

/// Display-ready row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRow {
    pub id: TransactionId,
    pub book_title: String,
    pub member_name: String,
    pub issue_date: String,
    pub due_date: String,
    pub badge: Badge,
    pub fine: String,
    pub can_return: bool,
}

impl ReturnRow {
    pub fn new(tx: &Transaction, now: DateTime<Utc>) -> Self {
        ReturnRow {
            id: tx.id,
            book_title: tx.book_title.clone(),
            member_name: tx.member_name.clone(),
            issue_date: display_date(&tx.issue_date),
            due_date: display_date(&tx.due_date),
            badge: Badge::for_transaction(tx, now),
            fine: tx.fine.fine_display(),
            can_return: tx.is_open(),
        }
    }
}

/// The return view.
#[derive(Debug, Clone, Default)]
pub struct ReturnTable {
    rows: Vec<ReturnRow>,
}

impl ReturnTable {
    /// Keeps only open transactions.
    pub fn new(transactions: &[Transaction], now: DateTime<Utc>) -> Self {
        ReturnTable {
            rows: transactions
                .iter()
                .filter(|tx| tx.is_open())
                .map(|tx| ReturnRow::new(tx, now))
                .collect(),
        }
    }

    pub async fn load(library: &Library, now: DateTime<Utc>) -> ClientResult<Self> {
        let active = library.active_transactions().await?;
        Ok(Self::new(&active, now))
    }

    pub fn rows(&self) -> &[ReturnRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Table text when there are no rows.
    pub fn empty_text(&self) -> Option<&'static str> {
        self.is_empty().then_some(EMPTY_TEXT)
    }

    /// Returns the loan behind row `id`.
    ///
    /// Rows without a return action are rejected here and never reach the
    /// server. Otherwise the server's answer comes back as a notice, and a
    /// successful return takes the row off the table.
    pub async fn submit_return(
        &mut self,
        library: &Library,
        id: TransactionId,
    ) -> ClientResult<Notice> {
        let returnable = self.rows.iter().any(|r| r.id == id && r.can_return);
        if !returnable {
            return Err(ClientError::Rejected(format!(
                "Transaction {} is not an open loan",
                id
            )));
        }

        Ok(match library.return_book(id).await {
            Ok(_) => {
                self.rows.retain(|r| r.id != id);
                Notice::success("Book returned successfully")
            }
            Err(e) => Notice::failure("Failed to return book", &e),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use libris_core::Money;

    fn tx(id: i64, status: TransactionStatus, due_in_days: i64, now: DateTime<Utc>) -> Transaction {
        let due = now + Duration::days(due_in_days);
        Transaction {
            id,
            book_id: 1,
            member_id: 1,
            book_title: "Dune".to_string(),
            member_name: "Alice".to_string(),
            issue_date: due - Duration::days(14),
            due_date: due,
            return_date: (status == TransactionStatus::Returned).then_some(now),
            status,
            fine: if status == TransactionStatus::Overdue {
                Money::from_cents(150)
            } else {
                Money::zero()
            },
        }
    }

    #[test]
    fn test_only_open_rows_listed() {
        let now = Utc::now();
        let table = ReturnTable::new(
            &[
                tx(1, TransactionStatus::Issued, 5, now),
                tx(2, TransactionStatus::Returned, -3, now),
                tx(3, TransactionStatus::Overdue, -3, now),
            ],
            now,
        );

        let ids: Vec<_> = table.rows().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(table.rows().iter().all(|r| r.can_return));
        assert_eq!(table.empty_text(), None);
    }

    #[test]
    fn test_badges_and_fines() {
        let now = Utc::now();

        let row = ReturnRow::new(&tx(1, TransactionStatus::Issued, 5, now), now);
        assert_eq!((row.badge.label(), row.fine.as_str()), ("Issued", "-"));

        let row = ReturnRow::new(&tx(2, TransactionStatus::Overdue, -3, now), now);
        assert_eq!((row.badge.label(), row.fine.as_str()), ("Overdue", "$1.50"));

        // Server has not caught up yet, but the due date has passed
        let row = ReturnRow::new(&tx(3, TransactionStatus::Issued, -1, now), now);
        assert_eq!(row.badge, Badge::Overdue);
    }

    #[test]
    fn test_due_earlier_today_is_not_overdue() {
        let now = Utc::now();
        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        let mut loan = tx(1, TransactionStatus::Issued, 0, now);
        loan.due_date = midnight;

        let row = ReturnRow::new(&loan, now);
        assert_eq!(row.badge, Badge::Issued);
    }

    #[test]
    fn test_empty_table_text() {
        let table = ReturnTable::new(&[], Utc::now());
        assert_eq!(table.empty_text(), Some("No active transactions"));
    }

    #[cfg(feature = "demo")]
    #[tokio::test]
    async fn test_submit_return_flow() {
        use crate::api::DemoApi;
        use crate::cache::QueryCache;
        use crate::config::DemoSettings;
        use crate::session::AppContext;
        use libris_core::{BookForm, IssueBookRequest, MemberForm, MemberType};
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
        lib.login("librarian", "librarian").await.unwrap();

        let mut form = BookForm::blank(2020);
        form.title = "Dune".into();
        form.author = "Frank Herbert".into();
        form.isbn = "9780441013593".into();
        let book = lib.create_book(&form).await.unwrap();
        let member = lib
            .create_member(&MemberForm {
                name: "Alice".into(),
                email: "alice@uni.edu".into(),
                phone: "555-0100".into(),
                member_type: MemberType::Student,
            })
            .await
            .unwrap();
        let loan = lib
            .issue_book(IssueBookRequest {
                book_id: book.id,
                member_id: member.id,
            })
            .await
            .unwrap();

        let mut table = ReturnTable::load(&lib, Utc::now()).await.unwrap();
        assert_eq!(table.rows().len(), 1);

        // Unknown id: rejected locally
        let err = table.submit_return(&lib, 999).await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected(_)));

        let notice = table.submit_return(&lib, loan.id).await.unwrap();
        assert!(notice.is_success());
        assert_eq!(notice.title, "Book returned successfully");
        assert!(table.is_empty());
        assert_eq!(table.empty_text(), Some("No active transactions"));

        // Closed loan: no action left, nothing sent
        let err = table.submit_return(&lib, loan.id).await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected(_)));
        assert_eq!(lib.book(book.id).await.unwrap().unwrap().available_copies, 1);

        // A stale table from before the return hits the server's answer
        let mut stale = ReturnTable::new(std::slice::from_ref(&loan), Utc::now());
        let notice = stale.submit_return(&lib, loan.id).await.unwrap();
        assert!(!notice.is_success());
        assert_eq!(notice.title, "Failed to return book");
        assert_eq!(
            notice.detail.as_deref(),
            Some("This book has already been returned")
        );
        assert_eq!(stale.rows().len(), 1);
    }
}
