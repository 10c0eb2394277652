//! `issue`, `return`, `active`.

use std::collections::BTreeMap;

use chrono::Utc;
use clap::Args;
use prettytable::row;

use super::Outcome;
use crate::output::{new_table, print_form_errors, print_json, print_notice, table_with_header};
use libris_client::views::issue::SelectOption;
use libris_client::views::returns::ReturnRow;
use libris_client::views::{IssueForm, ReturnTable};
use libris_client::{ClientResult, Library};
use libris_core::{BookId, MemberId, TransactionId};

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Book to lend (omit to list available books)
    #[arg(long)]
    pub book: Option<BookId>,

    /// Borrowing member (omit to list active members)
    #[arg(long)]
    pub member: Option<MemberId>,
}

#[derive(Args, Debug)]
pub struct ReturnArgs {
    /// Transaction ID, as shown by `libris active`
    pub transaction: TransactionId,
}

pub async fn issue(library: &Library, args: IssueArgs, json: bool) -> ClientResult<Outcome> {
    let mut form = IssueForm::load(library).await?;

    if let Some(id) = args.book {
        form.select_book(id)?;
    }
    if let Some(id) = args.member {
        form.select_member(id)?;
    }

    let (book, member) = form.selection();
    if !json {
        if book.is_none() {
            print_options("Available books", form.book_options());
        }
        if member.is_none() {
            print_options("Active members", form.member_options());
        }
    }

    match form.submit(library).await {
        Ok(notice) => {
            print_notice(&notice, json)?;
            Ok(Outcome::from_notice(&notice))
        }
        Err(errors) => {
            if json {
                print_json(&errors.iter().collect::<BTreeMap<_, _>>())?;
            } else {
                print_form_errors(&errors);
            }
            Ok(Outcome::Failed)
        }
    }
}

pub async fn return_book(library: &Library, args: ReturnArgs, json: bool) -> ClientResult<Outcome> {
    let mut table = ReturnTable::load(library, Utc::now()).await?;
    let notice = table.submit_return(library, args.transaction).await?;
    print_notice(&notice, json)?;
    Ok(Outcome::from_notice(&notice))
}

pub async fn active(library: &Library, json: bool) -> ClientResult<Outcome> {
    let table = ReturnTable::load(library, Utc::now()).await?;
    if json {
        print_json(table.rows())?;
        return Ok(Outcome::Done);
    }
    match table.empty_text() {
        Some(text) => println!("{}", text),
        None => print_loans(table.rows()),
    }
    Ok(Outcome::Done)
}

fn print_options(heading: &str, options: &[SelectOption]) {
    println!("{}:", heading);
    if options.is_empty() {
        println!("  (none)");
        return;
    }
    let mut table = new_table();
    for opt in options {
        table.add_row(row![opt.id, opt.label]);
    }
    table.printstd();
}

fn print_loans(rows: &[ReturnRow]) {
    let mut table = table_with_header(&["ID", "Book", "Member", "Issued", "Due", "Status", "Fine"]);
    for loan in rows {
        table.add_row(row![
            loan.id,
            loan.book_title,
            loan.member_name,
            loan.issue_date,
            loan.due_date,
            loan.badge.label(),
            loan.fine
        ]);
    }
    table.printstd();
}
