//! Persistence seam for the books module.

use async_trait::async_trait;
use bookshelf_query::{Filter, QuerySpec};
use thiserror::Error;

use super::models::{Book, BookId, CreateBookInput, UpdateBookInput};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("book {0} not found")]
    NotFound(BookId),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Storage operations over the `books` table.
///
/// Implementations are shared across requests and must be safe to call concurrently.
#[async_trait]
pub trait BookGateway: Send + Sync {
    /// Make sure the backing storage exists.
    async fn prepare(&self) -> GatewayResult<()> {
        Ok(())
    }

    /// Rows matching `query.filter`, ordered and paged as the query says.
    async fn find_many(&self, query: &QuerySpec) -> GatewayResult<Vec<Book>>;

    /// Number of rows matching `filter`, ignoring paging.
    async fn count(&self, filter: &Filter) -> GatewayResult<u64>;

    async fn find_unique(&self, id: BookId) -> GatewayResult<Option<Book>>;

    /// Insert a row; the gateway assigns `id` and `created_at`.
    async fn create(&self, input: CreateBookInput) -> GatewayResult<Book>;

    /// Fails with [`GatewayError::NotFound`] when no row has `id`.
    async fn update(&self, id: BookId, changes: UpdateBookInput) -> GatewayResult<Book>;

    /// Fails with [`GatewayError::NotFound`] when no row has `id`.
    async fn delete(&self, id: BookId) -> GatewayResult<()>;
}

pub(crate) fn unknown_field(field: &str) -> GatewayError {
    GatewayError::Infrastructure(anyhow::anyhow!("books have no field '{}'", field))
}
