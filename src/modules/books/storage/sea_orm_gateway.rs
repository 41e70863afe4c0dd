use async_trait::async_trait;
use bookshelf_query::{FieldValue, Filter, QuerySpec, SortDirection};
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr, NullOrdering, Order, SimpleExpr},
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Schema, SqlErr,
};

use super::entity::{self, Column, Entity as BookEntity};
use crate::modules::books::gateway::{unknown_field, BookGateway, GatewayError, GatewayResult};
use crate::modules::books::models::{Book, BookId, CreateBookInput, UpdateBookInput};

/// [`BookGateway`] backed by a sea-orm connection (SQLite or Postgres).
pub struct SeaOrmBookGateway {
    db: DatabaseConnection,
}

impl SeaOrmBookGateway {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn column(field: &str) -> GatewayResult<Column> {
    match field {
        "id" => Ok(Column::Id),
        "title" => Ok(Column::Title),
        "author" => Ok(Column::Author),
        "publisher" => Ok(Column::Publisher),
        "description" => Ok(Column::Description),
        "year" => Ok(Column::Year),
        "created_at" => Ok(Column::CreatedAt),
        other => Err(unknown_field(other)),
    }
}

fn like_escape(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Case-insensitive substring match; `%` and `_` in the term are literal.
fn contains_ignore_case(col: Column, term: &str) -> SimpleExpr {
    let pattern = format!("%{}%", like_escape(&term.to_lowercase()));
    Expr::expr(Func::lower(Expr::col((BookEntity, col)))).like(LikeExpr::new(pattern).escape('\\'))
}

fn condition(filter: &Filter) -> GatewayResult<Condition> {
    let mut cond = Condition::all();

    if let Some(search) = &filter.search {
        let mut any = Condition::any();
        for field in &search.fields {
            any = any.add(contains_ignore_case(column(field)?, &search.term));
        }
        cond = cond.add(any);
    }

    for field_match in &filter.matches {
        let col = column(field_match.field)?;
        cond = cond.add(match &field_match.value {
            FieldValue::Text(value) => col.eq(value.as_str()),
            FieldValue::Integer(value) => col.eq(*value),
        });
    }

    Ok(cond)
}

fn db_err(err: DbErr) -> GatewayError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail))
        | Some(SqlErr::ForeignKeyConstraintViolation(detail)) => GatewayError::Constraint(detail),
        _ => GatewayError::Infrastructure(anyhow::Error::new(err)),
    }
}

#[async_trait]
impl BookGateway for SeaOrmBookGateway {
    async fn prepare(&self) -> GatewayResult<()> {
        let backend = self.db.get_database_backend();
        let mut stmt = Schema::new(backend).create_table_from_entity(BookEntity);
        stmt.if_not_exists();

        self.db.execute(backend.build(&stmt)).await.map_err(db_err)?;
        tracing::info!(backend = ?backend, "books table ready");
        Ok(())
    }

    async fn find_many(&self, query: &QuerySpec) -> GatewayResult<Vec<Book>> {
        let mut select = BookEntity::find().filter(condition(&query.filter)?);
        for key in &query.sort {
            let order = match key.direction {
                SortDirection::Asc => Order::Asc,
                SortDirection::Desc => Order::Desc,
            };
            // NULLs last in both directions, matching the in-memory store.
            select = select.order_by_with_nulls(column(key.field)?, order, NullOrdering::Last);
        }

        let models = select
            .offset(query.skip)
            .limit(query.take)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &Filter) -> GatewayResult<u64> {
        BookEntity::find()
            .filter(condition(filter)?)
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn find_unique(&self, id: BookId) -> GatewayResult<Option<Book>> {
        let model = BookEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(Into::into))
    }

    async fn create(&self, input: CreateBookInput) -> GatewayResult<Book> {
        let active_model = entity::ActiveModel {
            id: ActiveValue::NotSet,
            title: ActiveValue::Set(input.title),
            author: ActiveValue::Set(input.author),
            publisher: ActiveValue::Set(input.publisher),
            description: ActiveValue::Set(input.description),
            year: ActiveValue::Set(input.year),
            created_at: ActiveValue::Set(Utc::now()),
        };

        let model = active_model.insert(&self.db).await.map_err(db_err)?;
        Ok(model.into())
    }

    async fn update(&self, id: BookId, changes: UpdateBookInput) -> GatewayResult<Book> {
        let existing = BookEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(GatewayError::NotFound(id))?;

        if changes.is_empty() {
            return Ok(existing.into());
        }

        let mut active_model: entity::ActiveModel = existing.into();
        if let Some(title) = changes.title {
            active_model.title = ActiveValue::Set(title);
        }
        if let Some(description) = changes.description {
            active_model.description = ActiveValue::Set(description);
        }
        if let Some(year) = changes.year {
            active_model.year = ActiveValue::Set(year);
        }
        if let Some(author) = changes.author {
            active_model.author = ActiveValue::Set(author);
        }
        if let Some(publisher) = changes.publisher {
            active_model.publisher = ActiveValue::Set(publisher);
        }

        // The row can vanish between the read and the write.
        let model = active_model.update(&self.db).await.map_err(|err| match err {
            DbErr::RecordNotUpdated => GatewayError::NotFound(id),
            other => db_err(other),
        })?;
        Ok(model.into())
    }

    async fn delete(&self, id: BookId) -> GatewayResult<()> {
        let result = BookEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(GatewayError::NotFound(id));
        }
        Ok(())
    }
}
