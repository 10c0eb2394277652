//! Terminal rendering helpers shared by all commands.

use prettytable::{format, row, Cell, Row, Table};
use serde::Serialize;

use libris_client::views::Notice;
use libris_client::ClientError;
use libris_core::{FormErrors, Page};

/// Borderless table with one space of padding.
pub fn new_table() -> Table {
    let mut table = Table::new();
    let format = format::FormatBuilder::new().padding(1, 1).build();
    table.set_format(format);
    table
}

/// Table whose first row holds the column names.
pub fn table_with_header(titles: &[&str]) -> Table {
    let mut table = new_table();
    table.add_row(Row::new(titles.iter().map(|t| Cell::new(t)).collect()));
    table
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), ClientError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints a success or error notice.
pub fn print_notice(notice: &Notice, json: bool) -> Result<(), ClientError> {
    if json {
        return print_json(notice);
    }
    let marker = if notice.is_success() { "✓" } else { "✗" };
    match &notice.detail {
        Some(detail) => println!("{} {}: {}", marker, notice.title, detail),
        None => println!("{} {}", marker, notice.title),
    }
    Ok(())
}

/// One line per invalid field.
pub fn print_form_errors(errors: &FormErrors) {
    let mut table = new_table();
    for (field, message) in errors.iter() {
        table.add_row(row![field, message]);
    }
    eprintln!("Form has errors:");
    table.printstd();
}

/// Footer under a paged table.
pub fn print_page_footer<T>(page: &Page<T>) {
    if page.is_empty() {
        return;
    }
    if page.has_pager() {
        println!("{}  ({})", page.summary(), page.position());
    } else {
        println!("{}", page.summary());
    }
}

/// Top-level error output. Form errors list every field.
pub fn print_error(error: &ClientError) {
    if let Some(errors) = error.form_errors() {
        print_form_errors(errors);
        return;
    }
    eprintln!("Error: {}", error);
    if error.is_unauthorized() {
        eprintln!("Run `libris login <username>` first.");
    }
}

/// Field/value table for one record.
pub fn print_details(fields: &[(&str, String)]) {
    let mut table = new_table();
    for (field, value) in fields {
        table.add_row(row![field, value]);
    }
    table.printstd();
}
