//! # Loan Rules
//!
//! Due dates, overdue derivation, fines and per-member loan limits.
//!
//! ## Loan Timeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  issue_date            due_date (+14 days)          return_date         │
//! │      │──────── ISSUED ───────│──────── OVERDUE ────────│ RETURNED       │
//! │                              │◄── days_overdue × $0.50 ─►│              │
//! │                                                                         │
//! │  Status is derived from dates, never stored blindly:                   │
//! │    return_date set           → RETURNED                                │
//! │    now past due_date         → OVERDUE                                 │
//! │    otherwise                 → ISSUED                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The client never computes fines for display: it shows whatever the
//! server sent. These rules are used by the demo backend, which plays the
//! server role, and by the return view to flag overdue rows.

use chrono::{DateTime, Duration, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Book, Member, MemberType, TransactionStatus};
use crate::{FINE_PER_DAY_CENTS, LOAN_PERIOD_DAYS};

/// Tunable loan parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPolicy {
    /// Days from issue to due date.
    pub loan_period_days: i64,
    /// Charged per full day past the due date.
    pub fine_per_day: Money,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        LoanPolicy {
            loan_period_days: LOAN_PERIOD_DAYS,
            fine_per_day: Money::from_cents(FINE_PER_DAY_CENTS),
        }
    }
}

impl LoanPolicy {
    /// Due date for a loan issued at `issued_at`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{Duration, Utc};
    /// use libris_core::LoanPolicy;
    ///
    /// let now = Utc::now();
    /// assert_eq!(LoanPolicy::default().due_date(now) - now, Duration::days(14));
    /// ```
    pub fn due_date(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        issued_at + Duration::days(self.loan_period_days)
    }

    /// Fine owed for a book handed back at `returned_at`.
    pub fn fine_for(&self, due_date: DateTime<Utc>, returned_at: DateTime<Utc>) -> Money {
        self.fine_per_day * days_overdue(due_date, returned_at)
    }

    /// Maximum simultaneous open loans for a member type.
    pub fn max_books(&self, member_type: MemberType) -> u32 {
        match member_type {
            MemberType::Student => 5,
            MemberType::Faculty | MemberType::Staff => 10,
        }
    }

    /// Checks every rule that must hold before a copy leaves the shelf.
    ///
    /// ## Rules
    /// 1. At least one copy available
    /// 2. Member is active
    /// 3. Member is below the limit for their type
    pub fn check_can_issue(&self, book: &Book, member: &Member, open_loans: i64) -> CoreResult<()> {
        if !book.is_available() {
            return Err(CoreError::NoCopiesAvailable(book.id));
        }

        if !member.active {
            return Err(CoreError::MemberInactive {
                name: member.name.clone(),
            });
        }

        let max = self.max_books(member.member_type);
        if open_loans >= max as i64 {
            return Err(CoreError::LoanLimitReached {
                name: member.name.clone(),
                member_type: member.member_type.as_str().to_lowercase(),
                max,
            });
        }

        Ok(())
    }
}

/// Whole calendar days between the due date and `as_of`, never negative.
pub fn days_overdue(due_date: DateTime<Utc>, as_of: DateTime<Utc>) -> i64 {
    (as_of.date_naive() - due_date.date_naive()).num_days().max(0)
}

/// Status implied by the dates of a loan at time `now`.
pub fn derive_status(
    due_date: DateTime<Utc>,
    return_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> TransactionStatus {
    match return_date {
        Some(_) => TransactionStatus::Returned,
        None if days_overdue(due_date, now) > 0 => TransactionStatus::Overdue,
        None => TransactionStatus::Issued,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    fn book(available: i32) -> Book {
        Book {
            id: 1,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: "9780441013593".to_string(),
            publisher: String::new(),
            year: 1965,
            genre: String::new(),
            total_copies: 1,
            available_copies: available,
            created_at: None,
            updated_at: None,
        }
    }

    fn member(member_type: MemberType, active: bool) -> Member {
        Member {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            phone: "555-0100".to_string(),
            member_type,
            membership_date: at(2023, 9, 1),
            active,
        }
    }

    #[test]
    fn test_due_date_is_fourteen_days_out() {
        let policy = LoanPolicy::default();
        assert_eq!(policy.due_date(at(2024, 1, 1)), at(2024, 1, 15));
    }

    #[test]
    fn test_days_overdue_and_fine() {
        let policy = LoanPolicy::default();
        let due = at(2024, 1, 15);

        assert_eq!(days_overdue(due, at(2024, 1, 10)), 0);
        assert_eq!(days_overdue(due, at(2024, 1, 15)), 0);
        assert_eq!(days_overdue(due, at(2024, 1, 18)), 3);

        assert!(policy.fine_for(due, at(2024, 1, 14)).is_zero());
        assert_eq!(policy.fine_for(due, at(2024, 2, 7)).cents(), 23 * 50);
    }

    #[test]
    fn test_derive_status() {
        let due = at(2024, 1, 15);
        assert_eq!(derive_status(due, None, at(2024, 1, 2)), TransactionStatus::Issued);
        assert_eq!(derive_status(due, None, at(2024, 1, 16)), TransactionStatus::Overdue);
        assert_eq!(
            derive_status(due, Some(at(2024, 1, 20)), at(2024, 1, 20)),
            TransactionStatus::Returned
        );
    }

    #[test]
    fn test_check_can_issue() {
        let policy = LoanPolicy::default();
        let alice = member(MemberType::Student, true);

        assert!(policy.check_can_issue(&book(1), &alice, 0).is_ok());
        assert!(matches!(
            policy.check_can_issue(&book(0), &alice, 0),
            Err(CoreError::NoCopiesAvailable(_))
        ));
        assert!(matches!(
            policy.check_can_issue(&book(1), &member(MemberType::Student, false), 0),
            Err(CoreError::MemberInactive { .. })
        ));
        assert!(matches!(
            policy.check_can_issue(&book(1), &alice, 5),
            Err(CoreError::LoanLimitReached { max: 5, .. })
        ));
        assert!(policy
            .check_can_issue(&book(1), &member(MemberType::Faculty, true), 5)
            .is_ok());
    }
}
