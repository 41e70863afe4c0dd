//! Books resource: list, fetch, create, update, and delete catalogue entries.

pub mod gateway;
pub mod handlers;
pub mod models;
pub mod storage;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::{routing::get, Router};
use bookshelf_kernel::{InitCtx, Module};
use bookshelf_query::{FieldKind, QueryShaper, SortKey};
use serde_json::json;

pub use gateway::{BookGateway, GatewayError};
pub use storage::{InMemoryBookGateway, SeaOrmBookGateway};

use handlers::BooksState;

/// Text columns matched by the `search` list parameter
pub const SEARCHABLE_FIELDS: [&str; 4] = ["title", "author", "publisher", "description"];

const SORTABLE_FIELDS: [&str; 7] = [
    "id",
    "title",
    "author",
    "publisher",
    "description",
    "year",
    "created_at",
];

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

/// Query shaping rules for `GET /api/books`; newest first unless told otherwise.
pub fn query_shaper() -> QueryShaper {
    let shaper = SEARCHABLE_FIELDS
        .iter()
        .fold(QueryShaper::new(&SEARCHABLE_FIELDS), |shaper, field| {
            shaper.filterable(*field, FieldKind::Text)
        });

    shaper
        .filterable("year", FieldKind::Integer)
        .sortable(&SORTABLE_FIELDS)
        .default_sort(SortKey::desc("created_at"))
        .tiebreaker(SortKey::desc("id"))
        .limits(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
}

/// Router for the books resource, relative to its mount point
pub fn routes(gateway: Arc<dyn BookGateway>) -> Router {
    let state = BooksState {
        gateway,
        shaper: Arc::new(query_shaper()),
    };

    Router::new()
        .route("/", get(handlers::list_books).post(handlers::create_book))
        .route("/health", get(handlers::health_check))
        .route(
            "/{id}",
            get(handlers::get_book)
                .put(handlers::update_book)
                .patch(handlers::update_book)
                .delete(handlers::delete_book),
        )
        .with_state(state)
}

/// Books module wiring the resource into the application
pub struct BooksModule {
    gateway: Arc<dyn BookGateway>,
}

impl BooksModule {
    pub fn new(gateway: Arc<dyn BookGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if ctx.settings.database.create_schema {
            self.gateway
                .prepare()
                .await
                .context("failed to prepare book storage")?;
        }

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes(self.gateway.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: serde_json::Value) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": schema }
        }
    })
}

fn id_parameter() -> serde_json::Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int32" }
    })
}

fn query_parameter(name: &str, schema: serde_json::Value, description: &str) -> serde_json::Value {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "schema": schema,
        "description": description
    })
}

fn message_with(field: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "message": { "type": "string" },
            field: { "$ref": "#/components/schemas/Book" }
        },
        "required": ["message", field]
    })
}

fn nullable(kind: &str) -> serde_json::Value {
    json!({ "type": [kind, "null"] })
}

/// OpenAPI fragment merged into the global document
fn openapi() -> serde_json::Value {
    let book_ref = json!({ "$ref": "#/components/schemas/Book" });
    let editable = json!({
        "title": nullable("string"),
        "author": nullable("string"),
        "publisher": nullable("string"),
        "description": nullable("string"),
        "year": { "type": ["integer", "null"], "format": "int32" }
    });

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": [
                        query_parameter("page", json!({"type": "integer", "minimum": 1}), "1-based page number"),
                        query_parameter("limit", json!({"type": "integer", "minimum": 1}), "Page size, capped at 100"),
                        query_parameter("search", json!({"type": "string"}), "Substring matched against title, author, publisher, and description"),
                        query_parameter("sort", json!({"type": "string"}), "Comma separated fields; prefix with '-' or suffix ':desc' for descending"),
                        query_parameter("year", json!({"type": "integer"}), "Exact publication year")
                    ],
                    "responses": {
                        "200": json_response("A page of books", json!({
                            "type": "object",
                            "properties": {
                                "data": { "type": "array", "items": book_ref },
                                "meta": { "$ref": "#/components/schemas/BookListMeta" }
                            },
                            "required": ["data", "meta"]
                        })),
                        "400": error_response("Malformed list parameters"),
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/CreateBookInput" }
                            }
                        }
                    },
                    "responses": {
                        "201": json_response("Book created", message_with("newBook")),
                        "422": error_response("Invalid payload"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": {
                                "text/plain": { "schema": { "type": "string" } }
                            }
                        }
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": json_response("The book", json!({
                            "type": "object",
                            "properties": { "book": book_ref },
                            "required": ["book"]
                        })),
                        "404": error_response("Book not found"),
                        "500": error_response("Internal server error")
                    }
                },
                "put": {
                    "summary": "Update a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/UpdateBookInput" }
                            }
                        }
                    },
                    "responses": {
                        "200": json_response("Book updated", message_with("updatedBook")),
                        "404": error_response("Book not found"),
                        "422": error_response("Invalid payload"),
                        "500": error_response("Internal server error")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": json_response("Book deleted", json!({
                            "type": "object",
                            "properties": { "message": { "type": "string" } },
                            "required": ["message"]
                        })),
                        "404": error_response("Book not found"),
                        "500": error_response("Internal server error")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int32" },
                        "title": nullable("string"),
                        "author": nullable("string"),
                        "publisher": nullable("string"),
                        "description": nullable("string"),
                        "year": { "type": ["integer", "null"], "format": "int32" },
                        "created_at": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "created_at"]
                },
                "CreateBookInput": {
                    "type": "object",
                    "properties": editable.clone()
                },
                "UpdateBookInput": {
                    "type": "object",
                    "description": "Omitted fields keep their value; null clears a field",
                    "properties": editable
                },
                "BookListMeta": {
                    "type": "object",
                    "properties": {
                        "page": { "type": "integer" },
                        "limit": { "type": "integer" },
                        "total": { "type": "integer" },
                        "totalPages": { "type": "integer" }
                    },
                    "required": ["page", "limit", "total", "totalPages"]
                }
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module(gateway: Arc<dyn BookGateway>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(gateway))
}
