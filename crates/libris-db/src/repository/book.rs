//! # Book Repository
//!
//! Database operations for the catalogue.
//!
//! ## Key Operations
//! - List / get / search
//! - Create and update from a validated [`BookForm`]
//! - Delete (refused while copies are on loan)
//!
//! Copy counts are only written here through the form. Issue and return
//! adjust `available_copies` from the transaction repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;
use libris_core::{Book, BookForm, BookId, CoreError};

pub(crate) const BOOK_COLUMNS: &str = r#"
    id, title, author, isbn, publisher, year, genre,
    total_copies, available_copies, created_at, updated_at
"#;

/// Repository for book database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = BookRepository::new(pool);
///
/// let hits = repo.search("tolkien").await?;
/// let book = repo.get_by_id(1).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Lists the whole catalogue ordered by title.
    pub async fn list(&self) -> DbResult<Vec<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY title COLLATE NOCASE, id");
        let books = sqlx::query_as::<_, Book>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = books.len(), "Listed books");
        Ok(books)
    }

    /// Gets a book by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Book))` - Book found
    /// * `Ok(None)` - Book not found
    pub async fn get_by_id(&self, id: BookId) -> DbResult<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1");
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// Searches title, author, ISBN and genre (case-insensitive substring).
    ///
    /// An empty query returns the full list.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Book>> {
        let query = query.trim();

        debug!(query = %query, "Searching books");

        if query.is_empty() {
            return self.list().await;
        }

        let pattern = like_pattern(query);
        let sql = format!(
            r#"
            SELECT {BOOK_COLUMNS} FROM books
            WHERE title LIKE ?1 ESCAPE '\'
               OR author LIKE ?1 ESCAPE '\'
               OR isbn LIKE ?1 ESCAPE '\'
               OR genre LIKE ?1 ESCAPE '\'
            ORDER BY title COLLATE NOCASE, id
            "#
        );
        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = books.len(), "Search returned books");
        Ok(books)
    }

    /// Inserts a new book and returns the stored row.
    pub async fn insert(&self, form: &BookForm, now: DateTime<Utc>) -> DbResult<Book> {
        debug!(title = %form.title, "Inserting book");

        let result = sqlx::query(
            r#"
            INSERT INTO books (
                title, author, isbn, publisher, year, genre,
                total_copies, available_copies, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(form.title.trim())
        .bind(form.author.trim())
        .bind(form.isbn.trim())
        .bind(form.publisher.trim())
        .bind(form.year)
        .bind(form.genre.trim())
        .bind(form.total_copies)
        .bind(form.available_copies)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Book", id))
    }

    /// Replaces every editable field of a book.
    ///
    /// ## Returns
    /// * `Ok(Book)` - The updated row
    /// * `Err(DbError::NotFound)` - Book doesn't exist
    /// * `Err(DbError::CheckViolation)` - Copy counts inconsistent
    pub async fn update(&self, id: BookId, form: &BookForm, now: DateTime<Utc>) -> DbResult<Book> {
        debug!(id = %id, "Updating book");

        let result = sqlx::query(
            r#"
            UPDATE books SET
                title = ?2,
                author = ?3,
                isbn = ?4,
                publisher = ?5,
                year = ?6,
                genre = ?7,
                total_copies = ?8,
                available_copies = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(form.title.trim())
        .bind(form.author.trim())
        .bind(form.isbn.trim())
        .bind(form.publisher.trim())
        .bind(form.year)
        .bind(form.genre.trim())
        .bind(form.total_copies)
        .bind(form.available_copies)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Book", id))
    }

    /// Deletes a book and its closed loan history.
    ///
    /// A book with copies still out on loan cannot be deleted; the copies
    /// would never come back.
    pub async fn delete(&self, id: BookId) -> DbResult<()> {
        debug!(id = %id, "Deleting book");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let open_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE book_id = ?1 AND return_date IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if open_loans > 0 {
            return Err(CoreError::BookHasActiveLoans(id).into());
        }

        sqlx::query("DELETE FROM transactions WHERE book_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Number of titles in the catalogue.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
