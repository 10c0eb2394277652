//! `dashboard`, `overdue`, `reports`.

use chrono::Utc;
use prettytable::row;

use super::Outcome;
use crate::output::{new_table, print_json, table_with_header};
use libris_client::views::dashboard::{OverdueRow, StatCard};
use libris_client::views::DashboardView;
use libris_client::{ClientResult, Library};

const NO_OVERDUE_TEXT: &str = "No overdue books";

pub async fn dashboard(library: &Library, json: bool) -> ClientResult<Outcome> {
    let view = DashboardView::load(library, Utc::now()).await?;
    if json {
        print_json(&view.cards)?;
    } else {
        print_cards(&view.cards);
    }
    Ok(Outcome::Done)
}

pub async fn overdue(library: &Library, json: bool) -> ClientResult<Outcome> {
    let view = DashboardView::load(library, Utc::now()).await?;
    if json {
        print_json(&view.overdue)?;
    } else {
        print_overdue(&view.overdue);
    }
    Ok(Outcome::Done)
}

/// Counters followed by the overdue list.
pub async fn full(library: &Library, json: bool) -> ClientResult<Outcome> {
    let view = DashboardView::load(library, Utc::now()).await?;
    if json {
        print_json(&view)?;
        return Ok(Outcome::Done);
    }
    print_cards(&view.cards);
    println!();
    println!("Overdue books:");
    print_overdue(&view.overdue);
    Ok(Outcome::Done)
}

fn print_cards(cards: &[StatCard]) {
    let mut table = new_table();
    for card in cards {
        table.add_row(row![card.title, card.value]);
    }
    table.printstd();
}

fn print_overdue(rows: &[OverdueRow]) {
    if rows.is_empty() {
        println!("{}", NO_OVERDUE_TEXT);
        return;
    }
    let mut table = table_with_header(&["Book", "Member", "Due", "Days late", "Fine"]);
    for r in rows {
        table.add_row(row![r.book_title, r.member_name, r.due_date, r.days_overdue, r.fine]);
    }
    table.printstd();
}
