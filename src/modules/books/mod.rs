pub mod models;
pub mod repository;
pub mod routes;
pub mod service;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_db::Database;
use bookshelf_kernel::{settings::BooksSettings, InitCtx, Migration, Module};
use serde_json::json;

use repository::{SurrealBookRepository, TABLE, TITLE_FIELD};
use service::BookService;

/// Books module: CRUD over the `books` table
pub struct BooksModule {
    service: Arc<BookService>,
}

impl BooksModule {
    pub fn new(db: &Database, settings: BooksSettings) -> Self {
        let repo = Arc::new(SurrealBookRepository::new(db));
        Self {
            service: Arc::new(BookService::new(repo, settings)),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            database = %ctx.db.location(),
            empty_list_is_error = ctx.settings.books.empty_list_is_error,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_books_title_unique",
            table: TABLE,
            unique_fields: &[TITLE_FIELD],
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn envelope_schema(data: serde_json::Value) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "message": { "type": "string", "example": "success" },
            "data": data
        },
        "required": ["message", "data"]
    })
}

fn json_response(description: &str, schema: serde_json::Value) -> serde_json::Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn error_response(description: &str) -> serde_json::Value {
    json_response(
        description,
        json!({ "$ref": "#/components/schemas/ErrorResponse" }),
    )
}

fn openapi_fragment() -> serde_json::Value {
    let book = json!({ "$ref": "#/components/schemas/Book" });
    let id_param = json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "description": "The ID of the book",
        "schema": { "type": "string" }
    }]);

    json!({
        "paths": {
            "/": {
                "post": {
                    "summary": "Create a new book",
                    "tags": ["Books"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/CreateBook" }
                            }
                        }
                    },
                    "responses": {
                        "201": json_response("Book created successfully", envelope_schema(book.clone())),
                        "400": error_response("Invalid input data or duplicate title")
                    }
                },
                "get": {
                    "summary": "Get all books",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response(
                            "Returns a list of books",
                            envelope_schema(json!({ "type": "array", "items": book.clone() }))
                        ),
                        "404": error_response("No books found")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book by ID",
                    "tags": ["Books"],
                    "parameters": id_param.clone(),
                    "responses": {
                        "200": json_response("Returns a single book", envelope_schema(book.clone())),
                        "404": error_response("Book not found")
                    }
                },
                "patch": {
                    "summary": "Update a book by ID",
                    "tags": ["Books"],
                    "parameters": id_param.clone(),
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/UpdateBook" }
                            }
                        }
                    },
                    "responses": {
                        "200": json_response("Book updated successfully", envelope_schema(book)),
                        "400": error_response("Invalid input data"),
                        "404": error_response("Book not found")
                    }
                },
                "delete": {
                    "summary": "Delete a book by ID",
                    "tags": ["Books"],
                    "parameters": id_param,
                    "responses": {
                        "200": json_response(
                            "Book deleted successfully",
                            envelope_schema(json!({
                                "type": "object",
                                "properties": { "message": { "type": "string" } }
                            }))
                        ),
                        "404": error_response("Book not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "description": "Identifier assigned by the store" },
                        "title": { "type": "string", "example": "Rich Dad Poor Dad" },
                        "author": { "type": "string", "example": "Aziz" },
                        "isbn": { "type": "string", "example": "0-061-96436-0" },
                        "createdAt": { "type": "string", "format": "date-time" },
                        "updatedAt": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "title", "author", "isbn", "createdAt", "updatedAt"]
                },
                "CreateBook": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "title": { "type": "string", "minLength": 2, "maxLength": 100 },
                        "author": { "type": "string", "minLength": 2, "maxLength": 30 },
                        "isbn": { "type": "string", "description": "ISBN-10" }
                    },
                    "required": ["title", "author", "isbn"]
                },
                "UpdateBook": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "title": { "type": "string", "minLength": 2, "maxLength": 100 },
                        "author": { "type": "string", "minLength": 2, "maxLength": 30 },
                        "isbn": { "type": "string", "description": "ISBN-10" }
                    }
                }
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module(db: &Database, settings: BooksSettings) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(db, settings))
}
