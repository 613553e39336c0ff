use std::sync::Arc;

use bookshelf_db::StoreError;
use bookshelf_http::AppError;
use bookshelf_kernel::settings::BooksSettings;
use thiserror::Error;

use super::models::{Book, CreateBook, Deleted, UpdateBook};
use super::repository::{BookRepository, TABLE, TITLE_FIELD};
use super::validation::ValidationErrors;

/// Failures of the book service
#[derive(Error, Debug)]
pub enum BookError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("A book with the title \"{0}\" already exists.")]
    DuplicateTitle(String),

    #[error("Book with ID {0} not found")]
    NotFound(String),

    #[error("No books found")]
    NoBooks,

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::Validation(errors) => {
                let details = errors
                    .errors()
                    .iter()
                    .filter_map(|e| serde_json::to_value(e).ok())
                    .collect();
                AppError::validation(details, errors.summary())
            }
            BookError::DuplicateTitle(_) => AppError::bad_request(err.to_string()),
            BookError::NotFound(_) | BookError::NoBooks => AppError::not_found(err.to_string()),
            BookError::Store(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

/// Book business rules over an injected repository
pub struct BookService {
    repo: Arc<dyn BookRepository>,
    settings: BooksSettings,
}

impl BookService {
    pub fn new(repo: Arc<dyn BookRepository>, settings: BooksSettings) -> Self {
        Self { repo, settings }
    }

    /// Create a book unless its title is already taken.
    ///
    /// The lookup gives a friendly error; the store's unique index on
    /// `title` catches a concurrent create that slips past it.
    pub async fn create(&self, input: CreateBook) -> Result<Book, BookError> {
        if self.repo.find_by_title(&input.title).await?.is_some() {
            return Err(BookError::DuplicateTitle(input.title));
        }

        match self.repo.insert(&input).await {
            Ok(book) => {
                tracing::info!(book_id = %book.id, title = %book.title, "book created");
                Ok(book)
            }
            Err(e) if e.is_duplicate_key_on(TABLE, TITLE_FIELD) => Err(BookError::DuplicateTitle(input.title)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_all(&self) -> Result<Vec<Book>, BookError> {
        let books = self.repo.find_all().await?;
        if books.is_empty() && self.settings.empty_list_is_error {
            return Err(BookError::NoBooks);
        }
        Ok(books)
    }

    pub async fn find_one(&self, id: &str) -> Result<Book, BookError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| BookError::NotFound(id.to_string()))
    }

    /// Apply the supplied fields only. The new title is not looked up first;
    /// a collision is still refused by the unique index.
    pub async fn update(&self, id: &str, patch: UpdateBook) -> Result<Book, BookError> {
        match self.repo.update(id, &patch).await {
            Ok(Some(book)) => {
                tracing::info!(book_id = %book.id, "book updated");
                Ok(book)
            }
            Ok(None) => Err(BookError::NotFound(id.to_string())),
            Err(e) if e.is_duplicate_key_on(TABLE, TITLE_FIELD) => {
                Err(BookError::DuplicateTitle(patch.title.unwrap_or_default()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove(&self, id: &str) -> Result<Deleted, BookError> {
        match self.repo.delete(id).await? {
            Some(book) => {
                tracing::info!(book_id = %book.id, "book deleted");
                Ok(Deleted::book(id))
            }
            None => Err(BookError::NotFound(id.to_string())),
        }
    }
}
