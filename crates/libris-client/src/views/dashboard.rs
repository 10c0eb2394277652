//! Dashboard cards and the overdue report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ClientResult;
use crate::library::Library;
use libris_core::dates::display_date;
use libris_core::loans::days_overdue;
use libris_core::{DashboardStats, Transaction};

/// One headline counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatCard {
    pub title: &'static str,
    pub value: String,
}

/// Cards in display order: the four counters, then copy figures.
pub fn stat_cards(stats: &DashboardStats) -> Vec<StatCard> {
    vec![
        StatCard {
            title: "Total Books",
            value: stats.total_books.to_string(),
        },
        StatCard {
            title: "Total Members",
            value: stats.total_members.to_string(),
        },
        StatCard {
            title: "Active Issues",
            value: stats.active_issues.to_string(),
        },
        StatCard {
            title: "Overdue Books",
            value: stats.overdue_books.to_string(),
        },
        StatCard {
            title: "Copies Issued",
            value: format!("{} of {}", stats.issued_copies(), stats.total_copies),
        },
        StatCard {
            title: "Utilization",
            value: format!("{}%", stats.utilization_percent()),
        },
    ]
}

/// Row of the overdue report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueRow {
    pub book_title: String,
    pub member_name: String,
    pub due_date: String,
    pub days_overdue: i64,
    pub fine: String,
}

impl OverdueRow {
    pub fn new(tx: &Transaction, now: DateTime<Utc>) -> Self {
        OverdueRow {
            book_title: tx.book_title.clone(),
            member_name: tx.member_name.clone(),
            due_date: display_date(&tx.due_date),
            days_overdue: days_overdue(tx.due_date, now),
            fine: tx.fine.fine_display(),
        }
    }
}

/// Everything the dashboard and reports screens render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub stats: DashboardStats,
    pub cards: Vec<StatCard>,
    /// Most overdue first.
    pub overdue: Vec<OverdueRow>,
}

impl DashboardView {
    pub fn new(stats: DashboardStats, overdue: &[Transaction], now: DateTime<Utc>) -> Self {
        let mut rows: Vec<OverdueRow> = overdue.iter().map(|tx| OverdueRow::new(tx, now)).collect();
        rows.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));

        DashboardView {
            cards: stat_cards(&stats),
            stats,
            overdue: rows,
        }
    }

    pub async fn load(library: &Library, now: DateTime<Utc>) -> ClientResult<Self> {
        let stats = library.dashboard().await?;
        let overdue = library.overdue_transactions().await?;
        Ok(Self::new(stats, &overdue, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use libris_core::{Money, TransactionStatus};

    fn overdue_tx(title: &str, days: i64, now: DateTime<Utc>) -> Transaction {
        Transaction {
            id: days,
            book_id: 1,
            member_id: 1,
            book_title: title.to_string(),
            member_name: "Carol".to_string(),
            issue_date: now - Duration::days(14 + days),
            due_date: now - Duration::days(days),
            return_date: None,
            status: TransactionStatus::Overdue,
            fine: Money::zero(),
        }
    }

    #[test]
    fn test_cards_include_derived_figures() {
        let stats = DashboardStats {
            total_books: 20,
            total_members: 5,
            active_issues: 6,
            overdue_books: 3,
            total_copies: 50,
            available_copies: 44,
        };
        let cards = stat_cards(&stats);
        assert_eq!(cards.len(), 6);
        assert_eq!(cards[4].value, "6 of 50");
        assert_eq!(cards[5].value, "12%");
    }

    #[test]
    fn test_overdue_rows_sorted_most_late_first() {
        let now = Utc::now();
        let view = DashboardView::new(
            DashboardStats::default(),
            &[overdue_tx("Dune", 2, now), overdue_tx("Emma", 16, now)],
            now,
        );

        assert_eq!(view.overdue[0].book_title, "Emma");
        assert_eq!(view.overdue[0].days_overdue, 16);
        // Fine is charged on return; unpaid loans show a dash
        assert_eq!(view.overdue[1].fine, "-");
    }
}
