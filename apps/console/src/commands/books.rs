//! `books list|show|search|add|edit|delete`.

use clap::{Args, Subcommand};
use prettytable::row;

use super::Outcome;
use crate::output::{
    print_details, print_form_errors, print_json, print_notice, print_page_footer,
    table_with_header,
};
use libris_client::views::catalog::{self, empty_text, EditMode, NO_BOOKS_TEXT};
use libris_client::views::TableState;
use libris_client::{ClientError, ClientResult, Library};
use libris_core::dates::display_date;
use libris_core::{Book, BookForm, BookId};

#[derive(Subcommand, Debug)]
pub enum BooksCommand {
    /// List the catalogue, filtered locally
    List {
        /// Matches title, author or ISBN
        #[arg(long, short)]
        search: Option<String>,

        #[arg(long, short, default_value_t = 1)]
        page: usize,
    },

    /// Show one book
    Show { id: BookId },

    /// Search on the server
    Search { query: String },

    /// Add a book
    Add(BookFields),

    /// Edit a book; omitted fields keep their value
    Edit {
        id: BookId,

        #[command(flatten)]
        fields: BookFields,
    },

    /// Delete a book
    Delete { id: BookId },
}

#[derive(Args, Debug, Default)]
pub struct BookFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub isbn: Option<String>,
    #[arg(long)]
    pub publisher: Option<String>,
    #[arg(long)]
    pub year: Option<i32>,
    #[arg(long)]
    pub genre: Option<String>,
    #[arg(long)]
    pub total_copies: Option<i32>,
    #[arg(long)]
    pub available_copies: Option<i32>,
}

impl BookFields {
    /// Overlays the given flags on `form`.
    ///
    /// A new book starts with every copy on the shelf unless told otherwise.
    pub fn apply(self, mut form: BookForm, creating: bool) -> BookForm {
        if let Some(v) = self.title {
            form.title = v;
        }
        if let Some(v) = self.author {
            form.author = v;
        }
        if let Some(v) = self.isbn {
            form.isbn = v;
        }
        if let Some(v) = self.publisher {
            form.publisher = v;
        }
        if let Some(v) = self.year {
            form.year = v;
        }
        if let Some(v) = self.genre {
            form.genre = v;
        }
        if let Some(v) = self.total_copies {
            form.total_copies = v;
            if creating && self.available_copies.is_none() {
                form.available_copies = v;
            }
        }
        if let Some(v) = self.available_copies {
            form.available_copies = v;
        }
        form
    }
}

pub async fn run(library: &Library, cmd: BooksCommand, json: bool) -> ClientResult<Outcome> {
    match cmd {
        BooksCommand::List { search, page } => {
            let books = library.books().await?;
            let mut state = TableState::new();
            state.set_query(search.unwrap_or_default());
            state.go_to(page);
            let page = state.book_page(&books);

            if json {
                print_json(&page.items)?;
                return Ok(Outcome::Done);
            }
            print_books(&page.items);
            if let Some(text) = empty_text(&page, NO_BOOKS_TEXT) {
                println!("{}", text);
            }
            print_page_footer(&page);
        }

        BooksCommand::Show { id } => {
            let book = library
                .book(id)
                .await?
                .ok_or_else(|| ClientError::not_found("Book not found"))?;
            if json {
                print_json(&book)?;
            } else {
                print_book(&book);
            }
        }

        BooksCommand::Search { query } => {
            let books = library.search_books(&query).await?.unwrap_or_default();
            if json {
                print_json(&books)?;
            } else if books.is_empty() {
                println!("{}", NO_BOOKS_TEXT);
            } else {
                print_books(&books);
            }
        }

        BooksCommand::Add(fields) => {
            let form = fields.apply(BookForm::default(), true);
            return save(library, EditMode::Create, &form, json).await;
        }

        BooksCommand::Edit { id, fields } => {
            let book = library
                .book(id)
                .await?
                .ok_or_else(|| ClientError::not_found("Book not found"))?;
            let form = fields.apply(BookForm::from(&book), false);
            return save(library, EditMode::Edit(id), &form, json).await;
        }

        BooksCommand::Delete { id } => {
            let notice = catalog::delete_book(library, id).await;
            print_notice(&notice, json)?;
            return Ok(Outcome::from_notice(&notice));
        }
    }
    Ok(Outcome::Done)
}

async fn save(
    library: &Library,
    mode: EditMode<BookId>,
    form: &BookForm,
    json: bool,
) -> ClientResult<Outcome> {
    match catalog::save_book(library, mode, form).await {
        Ok(notice) => {
            print_notice(&notice, json)?;
            Ok(Outcome::from_notice(&notice))
        }
        Err(errors) => {
            print_form_errors(&errors);
            Ok(Outcome::Failed)
        }
    }
}

fn print_books(books: &[Book]) {
    if books.is_empty() {
        return;
    }
    let mut table = table_with_header(&["ID", "Title", "Author", "ISBN", "Genre", "Copies"]);
    for b in books {
        table.add_row(row![
            b.id,
            b.title,
            b.author,
            b.isbn,
            b.genre,
            format!("{}/{}", b.available_copies, b.total_copies)
        ]);
    }
    table.printstd();
}

fn print_book(book: &Book) {
    print_details(&[
        ("ID", book.id.to_string()),
        ("Title", book.title.clone()),
        ("Author", book.author.clone()),
        ("ISBN", book.isbn.clone()),
        ("Publisher", book.publisher.clone()),
        ("Year", book.year.to_string()),
        ("Genre", book.genre.clone()),
        (
            "Copies",
            format!("{} available of {}", book.available_copies, book.total_copies),
        ),
        (
            "Added",
            book.created_at.as_ref().map(display_date).unwrap_or_default(),
        ),
    ]);
}
