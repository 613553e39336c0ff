//! HTTP endpoints for the books module, mounted under `/books`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::{AppError, Envelope};
use serde_json::Value;

use super::models::{Book, Deleted};
use super::service::{BookError, BookService};
use super::validation;

type Service = State<Arc<BookService>>;

/// Book routes bound to `service`
pub fn router(service: Arc<BookService>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).patch(update_book).delete(delete_book),
        )
        .with_state(service)
}

async fn create_book(
    State(service): Service,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Envelope<Book>), AppError> {
    let Json(body) = payload?;
    let input = validation::validate_create(&body).map_err(BookError::from)?;
    let book = service.create(input).await?;
    Ok((StatusCode::CREATED, Envelope::success(book)))
}

async fn list_books(State(service): Service) -> Result<Envelope<Vec<Book>>, AppError> {
    Ok(Envelope::success(service.find_all().await?))
}

async fn get_book(
    State(service): Service,
    Path(id): Path<String>,
) -> Result<Envelope<Book>, AppError> {
    Ok(Envelope::success(service.find_one(&id).await?))
}

async fn update_book(
    State(service): Service,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Envelope<Book>, AppError> {
    let Json(body) = payload?;
    let patch = validation::validate_update(&body).map_err(BookError::from)?;
    Ok(Envelope::success(service.update(&id, patch).await?))
}

async fn delete_book(
    State(service): Service,
    Path(id): Path<String>,
) -> Result<Envelope<Deleted>, AppError> {
    Ok(Envelope::success(service.remove(&id).await?))
}
