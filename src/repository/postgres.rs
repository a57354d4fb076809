//! Postgres adapters for the record-store ports

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{Book, BorrowRecord, BorrowStatus, Role, User},
    repository::{BooksRepository, BorrowsRepository, UsersRepository},
};

const BOOK_COLUMNS: &str = "isbn, title, author, publisher, year, genre, cover_url, quantity";
const BORROW_COLUMNS: &str = "id, user_email, book_isbn, borrow_date, due_date, status, \
                              return_date, penalty_flag, penalty_amount, paid";

fn book_from_row(row: &PgRow) -> Book {
    Book {
        isbn: row.get("isbn"),
        title: row.get("title"),
        author: row.get("author"),
        publisher: row.get("publisher"),
        year: row.get("year"),
        genre: row.get("genre"),
        cover_url: row.get("cover_url"),
        quantity: row.get("quantity"),
    }
}

fn borrow_from_row(row: &PgRow) -> AppResult<BorrowRecord> {
    let status: String = row.get("status");
    let status = BorrowStatus::from_str(&status)
        .map_err(|e| AppError::Internal(format!("corrupt borrow record: {}", e)))?;
    Ok(BorrowRecord {
        id: row.get("id"),
        user_email: row.get("user_email"),
        book_isbn: row.get("book_isbn"),
        borrow_date: row.get::<DateTime<Utc>, _>("borrow_date"),
        due_date: row.get::<DateTime<Utc>, _>("due_date"),
        status,
        return_date: row.get("return_date"),
        penalty_flag: row.get("penalty_flag"),
        penalty_amount: row.get("penalty_amount"),
        paid: row.get("paid"),
    })
}

#[derive(Clone)]
pub struct PgUsersRepository {
    pool: Pool<Postgres>,
}

impl PgUsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersRepository for PgUsersRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT email, name, password_hash, role FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let role: String = row.get("role");
            let role = Role::from_str(&role)
                .map_err(|e| AppError::Internal(format!("corrupt user record: {}", e)))?;
            Ok(User {
                email: row.get("email"),
                name: row.get("name"),
                password_hash: row.get("password_hash"),
                role,
            })
        })
        .transpose()
    }
}

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn find_by_isbn(&self, isbn: i64) -> AppResult<Option<Book>> {
        let row = sqlx::query(&format!("SELECT {} FROM books WHERE isbn = $1", BOOK_COLUMNS))
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(book_from_row))
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query(&format!("SELECT {} FROM books ORDER BY isbn", BOOK_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(book_from_row).collect())
    }

    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO books (isbn, title, author, publisher, year, genre, cover_url, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(book.year)
        .bind(&book.genre)
        .bind(&book.cover_url)
        .bind(book.quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return AppError::DuplicateIsbn(book.isbn);
                }
            }
            AppError::Database(e)
        })?;
        Ok(book_from_row(&row))
    }

    async fn delete(&self, isbn: i64) -> AppResult<Option<Book>> {
        let row = sqlx::query(&format!(
            "DELETE FROM books WHERE isbn = $1 RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(book_from_row))
    }

    async fn set_quantity(&self, isbn: i64, quantity: i32) -> AppResult<Option<Book>> {
        let row = sqlx::query(&format!(
            "UPDATE books SET quantity = $2 WHERE isbn = $1 RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(isbn)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(book_from_row))
    }

    async fn decrement_quantity(&self, isbn: i64) -> AppResult<Book> {
        // Conditional update: the quantity check and the decrement are one
        // statement, so two borrowers cannot both take the last copy.
        let row = sqlx::query(&format!(
            "UPDATE books SET quantity = quantity - 1 WHERE isbn = $1 AND quantity > 0 RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(book_from_row(&row)),
            None => match self.find_by_isbn(isbn).await? {
                Some(_) => Err(AppError::OutOfStock(isbn)),
                None => Err(AppError::BookNotFound(isbn)),
            },
        }
    }

    async fn increment_quantity(&self, isbn: i64) -> AppResult<Book> {
        let row = sqlx::query(&format!(
            "UPDATE books SET quantity = quantity + 1 WHERE isbn = $1 RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref()
            .map(book_from_row)
            .ok_or(AppError::BookNotFound(isbn))
    }
}

#[derive(Clone)]
pub struct PgBorrowsRepository {
    pool: Pool<Postgres>,
}

impl PgBorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowsRepository for PgBorrowsRepository {
    async fn find_active(&self, email: &str, isbn: i64) -> AppResult<Option<BorrowRecord>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM borrow_records
            WHERE LOWER(user_email) = LOWER($1) AND book_isbn = $2 AND status = 'borrowed'
            "#,
            BORROW_COLUMNS
        ))
        .bind(email)
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(borrow_from_row).transpose()
    }

    async fn insert(&self, record: &BorrowRecord) -> AppResult<BorrowRecord> {
        // The partial unique index on (user_email, book_isbn) WHERE
        // status = 'borrowed' is the backstop against racing borrows.
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO borrow_records
                (user_email, book_isbn, borrow_date, due_date, status,
                 return_date, penalty_flag, penalty_amount, paid)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            BORROW_COLUMNS
        ))
        .bind(&record.user_email)
        .bind(record.book_isbn)
        .bind(record.borrow_date)
        .bind(record.due_date)
        .bind(record.status.as_str())
        .bind(record.return_date)
        .bind(record.penalty_flag)
        .bind(record.penalty_amount)
        .bind(record.paid)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return AppError::AlreadyBorrowed {
                        email: record.user_email.clone(),
                        isbn: record.book_isbn,
                    };
                }
            }
            AppError::Database(e)
        })?;
        borrow_from_row(&row)
    }

    async fn update(&self, record: &BorrowRecord) -> AppResult<BorrowRecord> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE borrow_records
            SET status = $2, return_date = $3, penalty_flag = $4,
                penalty_amount = $5, paid = $6
            WHERE id = $1
            RETURNING {}
            "#,
            BORROW_COLUMNS
        ))
        .bind(record.id)
        .bind(record.status.as_str())
        .bind(record.return_date)
        .bind(record.penalty_flag)
        .bind(record.penalty_amount)
        .bind(record.paid)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => borrow_from_row(&row),
            None => Err(AppError::RecordNotFound {
                email: record.user_email.clone(),
                isbn: record.book_isbn,
            }),
        }
    }

    async fn list_for_user(&self, email: &str) -> AppResult<Vec<BorrowRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM borrow_records
            WHERE LOWER(user_email) = LOWER($1)
            ORDER BY borrow_date
            "#,
            BORROW_COLUMNS
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(borrow_from_row).collect()
    }

    async fn list_active(&self) -> AppResult<Vec<BorrowRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM borrow_records WHERE status = 'borrowed' ORDER BY borrow_date",
            BORROW_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(borrow_from_row).collect()
    }
}
