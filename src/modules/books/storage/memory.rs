use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use bookshelf_query::{FieldValue, Filter, QuerySpec, SortDirection, SortKey};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::modules::books::gateway::{unknown_field, BookGateway, GatewayError, GatewayResult};
use crate::modules::books::models::{Book, BookId, CreateBookInput, UpdateBookInput};

/// In-process [`BookGateway`]; data lives as long as the value does.
#[derive(Default)]
pub struct InMemoryBookGateway {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    last_id: BookId,
    books: BTreeMap<BookId, Book>,
}

impl InMemoryBookGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

enum FieldRef<'a> {
    Text(Option<&'a str>),
    Integer(Option<i64>),
    Timestamp(&'a chrono::DateTime<Utc>),
}

fn field<'a>(book: &'a Book, name: &str) -> GatewayResult<FieldRef<'a>> {
    Ok(match name {
        "id" => FieldRef::Integer(Some(i64::from(book.id))),
        "title" => FieldRef::Text(book.title.as_deref()),
        "author" => FieldRef::Text(book.author.as_deref()),
        "publisher" => FieldRef::Text(book.publisher.as_deref()),
        "description" => FieldRef::Text(book.description.as_deref()),
        "year" => FieldRef::Integer(book.year.map(i64::from)),
        "created_at" => FieldRef::Timestamp(&book.created_at),
        other => return Err(unknown_field(other)),
    })
}

fn matches(book: &Book, filter: &Filter) -> GatewayResult<bool> {
    if let Some(search) = &filter.search {
        let needle = search.term.to_lowercase();
        let mut hit = false;
        for name in &search.fields {
            if let FieldRef::Text(Some(text)) = field(book, name)? {
                if text.to_lowercase().contains(&needle) {
                    hit = true;
                    break;
                }
            }
        }
        if !hit {
            return Ok(false);
        }
    }

    for field_match in &filter.matches {
        let equal = match (field(book, field_match.field)?, &field_match.value) {
            (FieldRef::Text(actual), FieldValue::Text(expected)) => actual == Some(expected.as_str()),
            (FieldRef::Integer(actual), FieldValue::Integer(expected)) => actual == Some(*expected),
            _ => false,
        };
        if !equal {
            return Ok(false);
        }
    }

    Ok(true)
}

/// NULLs sort last regardless of direction.
fn compare(a: &Book, b: &Book, key: &SortKey) -> Ordering {
    fn directed<T: Ord>(x: Option<T>, y: Option<T>, direction: SortDirection) -> Ordering {
        match (x, y) {
            (Some(x), Some(y)) => match direction {
                SortDirection::Asc => x.cmp(&y),
                SortDirection::Desc => y.cmp(&x),
            },
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
        }
    }

    // Field names were validated before sorting started.
    match (field(a, key.field), field(b, key.field)) {
        (Ok(FieldRef::Text(x)), Ok(FieldRef::Text(y))) => directed(x, y, key.direction),
        (Ok(FieldRef::Integer(x)), Ok(FieldRef::Integer(y))) => directed(x, y, key.direction),
        (Ok(FieldRef::Timestamp(x)), Ok(FieldRef::Timestamp(y))) => {
            directed(Some(x), Some(y), key.direction)
        }
        _ => Ordering::Equal,
    }
}

fn filtered<'a>(state: &'a State, filter: &Filter) -> GatewayResult<Vec<&'a Book>> {
    let mut rows = Vec::new();
    for book in state.books.values() {
        if matches(book, filter)? {
            rows.push(book);
        }
    }
    Ok(rows)
}

#[async_trait]
impl BookGateway for InMemoryBookGateway {
    async fn find_many(&self, query: &QuerySpec) -> GatewayResult<Vec<Book>> {
        let state = self.state.read().await;

        if let Some(probe) = state.books.values().next() {
            for key in &query.sort {
                field(probe, key.field)?;
            }
        }

        let mut rows = filtered(&state, &query.filter)?;
        rows.sort_by(|a, b| {
            query
                .sort
                .iter()
                .map(|key| compare(a, b, key))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let take = usize::try_from(query.take).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(skip).take(take).cloned().collect())
    }

    async fn count(&self, filter: &Filter) -> GatewayResult<u64> {
        let state = self.state.read().await;
        Ok(filtered(&state, filter)?.len() as u64)
    }

    async fn find_unique(&self, id: BookId) -> GatewayResult<Option<Book>> {
        Ok(self.state.read().await.books.get(&id).cloned())
    }

    async fn create(&self, input: CreateBookInput) -> GatewayResult<Book> {
        let mut state = self.state.write().await;
        let id = state
            .last_id
            .checked_add(1)
            .ok_or_else(|| GatewayError::Infrastructure(anyhow::anyhow!("book ids exhausted")))?;

        let book = Book {
            id,
            title: input.title,
            author: input.author,
            publisher: input.publisher,
            description: input.description,
            year: input.year,
            created_at: Utc::now(),
        };
        state.last_id = id;
        state.books.insert(id, book.clone());
        Ok(book)
    }

    async fn update(&self, id: BookId, changes: UpdateBookInput) -> GatewayResult<Book> {
        let mut state = self.state.write().await;
        let book = state.books.get_mut(&id).ok_or(GatewayError::NotFound(id))?;
        changes.apply_to(book);
        Ok(book.clone())
    }

    async fn delete(&self, id: BookId) -> GatewayResult<()> {
        self.state
            .write()
            .await
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or(GatewayError::NotFound(id))
    }
}
