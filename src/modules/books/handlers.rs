use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use bookshelf_http::AppError;
use bookshelf_query::QueryShaper;

use super::gateway::{BookGateway, GatewayError};
use super::models::{
    BookCreated, BookEnvelope, BookId, BookList, BookUpdated, CreateBookInput, ListMeta, Message,
    UpdateBookInput,
};

pub const BOOK_NOT_FOUND: &str = "Book not found.";
pub const BOOK_CREATED: &str = "Book created successfully.";
pub const BOOK_UPDATED: &str = "Book updated successfully.";
pub const BOOK_DELETED: &str = "Book deleted successfully.";
pub const BOOK_REJECTED: &str = "Book payload rejected.";

/// Shared handler state; cloned per request.
#[derive(Clone)]
pub struct BooksState {
    pub gateway: Arc<dyn BookGateway>,
    pub shaper: Arc<QueryShaper>,
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(_) => AppError::not_found(BOOK_NOT_FOUND),
            GatewayError::Constraint(detail) => {
                tracing::warn!(%detail, "book rejected by storage constraint");
                AppError::validation(Vec::new(), BOOK_REJECTED)
            }
            GatewayError::Infrastructure(e) => AppError::Internal(e),
        }
    }
}

/// A non-numeric id can never name a stored book.
fn parse_id(raw: &str) -> Result<BookId, AppError> {
    raw.trim().parse::<BookId>().map_err(|_| {
        tracing::debug!(id = raw, "book id is not numeric");
        AppError::not_found(BOOK_NOT_FOUND)
    })
}

/// Books health check
pub async fn health_check() -> &'static str {
    "books module is healthy"
}

/// List books endpoint
pub async fn list_books(
    State(state): State<BooksState>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<BookList>, AppError> {
    let Query(params) = params.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let (spec, page) = state
        .shaper
        .shape(&params)
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let (data, total) = tokio::try_join!(
        state.gateway.find_many(&spec),
        state.gateway.count(&spec.filter)
    )?;

    Ok(Json(BookList {
        data,
        meta: ListMeta {
            page,
            total,
            total_pages: page.total_pages(total),
        },
    }))
}

/// Get book by id endpoint
pub async fn get_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<Json<BookEnvelope>, AppError> {
    let id = parse_id(&id)?;

    match state.gateway.find_unique(id).await? {
        Some(book) => Ok(Json(BookEnvelope { book })),
        None => Err(AppError::not_found(BOOK_NOT_FOUND)),
    }
}

/// Create book endpoint
pub async fn create_book(
    State(state): State<BooksState>,
    payload: Result<Json<CreateBookInput>, JsonRejection>,
) -> Result<(StatusCode, Json<BookCreated>), AppError> {
    let Json(input) = payload?;

    let book = state.gateway.create(input).await?;
    tracing::info!(book_id = book.id, "book created");

    Ok((
        StatusCode::CREATED,
        Json(BookCreated {
            message: BOOK_CREATED,
            new_book: book,
        }),
    ))
}

/// Update book endpoint; serves both PUT and PATCH
pub async fn update_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBookInput>, JsonRejection>,
) -> Result<Json<BookUpdated>, AppError> {
    let id = parse_id(&id)?;
    let Json(changes) = payload?;

    let book = state.gateway.update(id, changes).await?;
    tracing::info!(book_id = book.id, "book updated");

    Ok(Json(BookUpdated {
        message: BOOK_UPDATED,
        updated_book: book,
    }))
}

/// Delete book endpoint
pub async fn delete_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<Json<Message>, AppError> {
    let id = parse_id(&id)?;

    state.gateway.delete(id).await?;
    tracing::info!(book_id = id, "book deleted");

    Ok(Json(Message {
        message: BOOK_DELETED,
    }))
}
