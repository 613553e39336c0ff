use async_trait::async_trait;
use bookshelf_db::{Database, StoreResult};
use chrono::{DateTime, SecondsFormat, SubsecRound, TimeDelta, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::models::{Book, CreateBook, UpdateBook};

/// Table holding book records
pub const TABLE: &str = "books";
/// Field carrying the unique index
pub const TITLE_FIELD: &str = "title";

/// Record key exposed as the plain `id` string
const BOOK_FIELDS: &str = "record::id(id) AS id, title, author, isbn, createdAt, updatedAt";

/// Persistence operations the book service relies on
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_by_title(&self, title: &str) -> StoreResult<Option<Book>>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Book>>;

    async fn find_all(&self) -> StoreResult<Vec<Book>>;

    /// Store a new book with a fresh id and timestamps
    async fn insert(&self, book: &CreateBook) -> StoreResult<Book>;

    /// Merge the supplied fields; `None` when no book has `id`
    async fn update(&self, id: &str, patch: &UpdateBook) -> StoreResult<Option<Book>>;

    async fn delete(&self, id: &str) -> StoreResult<Option<Book>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewRecord {
    title: String,
    author: String,
    isbn: String,
    created_at: String,
    updated_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Changes {
    #[serde(flatten)]
    fields: UpdateBook,
    updated_at: String,
}

/// [`BookRepository`] over the SurrealDB `books` table
pub struct SurrealBookRepository {
    db: Database,
}

impl SurrealBookRepository {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }
}

/// Current time at the microsecond precision the records keep, moved past
/// `previous` when the clock has not advanced.
fn timestamp_after(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(6);
    match previous {
        Some(previous) if now <= previous => previous + TimeDelta::microseconds(1),
        _ => now,
    }
}

fn encode(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl BookRepository for SurrealBookRepository {
    async fn find_by_title(&self, title: &str) -> StoreResult<Option<Book>> {
        let mut response = self
            .db
            .client()
            .query(format!(
                "SELECT {BOOK_FIELDS} FROM type::table($table) WHERE title = $title LIMIT 1"
            ))
            .bind(("table", TABLE))
            .bind(("title", title.to_string()))
            .await?
            .check()?;
        Ok(response.take(0)?)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Book>> {
        let mut response = self
            .db
            .client()
            .query(format!("SELECT {BOOK_FIELDS} FROM type::thing($table, $id)"))
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .await?
            .check()?;
        Ok(response.take(0)?)
    }

    async fn find_all(&self) -> StoreResult<Vec<Book>> {
        let mut response = self
            .db
            .client()
            .query(format!(
                "SELECT {BOOK_FIELDS} FROM type::table($table) ORDER BY createdAt, id"
            ))
            .bind(("table", TABLE))
            .await?
            .check()?;
        Ok(response.take(0)?)
    }

    async fn insert(&self, book: &CreateBook) -> StoreResult<Book> {
        let id = Uuid::now_v7().to_string();
        let now = timestamp_after(None);
        let record = NewRecord {
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            created_at: encode(now),
            updated_at: encode(now),
        };

        // The unique index on title makes this fail for a taken title, even
        // when another service instance wrote it.
        self.db
            .client()
            .query("CREATE type::thing($table, $id) CONTENT $record RETURN NONE")
            .bind(("table", TABLE))
            .bind(("id", id.clone()))
            .bind(("record", record))
            .await?
            .check()?;

        Ok(Book {
            id,
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(&self, id: &str, patch: &UpdateBook) -> StoreResult<Option<Book>> {
        let Some(current) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let changes = Changes {
            fields: patch.clone(),
            updated_at: encode(timestamp_after(Some(current.updated_at))),
        };
        let mut response = self
            .db
            .client()
            .query("UPDATE type::thing($table, $id) MERGE $changes RETURN NONE")
            .query(format!("SELECT {BOOK_FIELDS} FROM type::thing($table, $id)"))
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .bind(("changes", changes))
            .await?
            .check()?;
        Ok(response.take(1)?)
    }

    async fn delete(&self, id: &str) -> StoreResult<Option<Book>> {
        let mut response = self
            .db
            .client()
            .query(format!("SELECT {BOOK_FIELDS} FROM type::thing($table, $id)"))
            .query("DELETE type::thing($table, $id) RETURN NONE")
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .await?
            .check()?;
        Ok(response.take(0)?)
    }
}
