use bookshelf_query::PageMeta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type BookId = i32;

/// A stored book as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier assigned on insert
    pub id: BookId,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    /// Publication year
    pub year: Option<i32>,
    /// Insert time; the default list order
    pub created_at: DateTime<Utc>,
}

/// Request model for creating a new book. Every field may be left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBookInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub author: Option<String>,
    pub publisher: Option<String>,
}

/// Request model for updating a book.
///
/// Each field is tri-state: missing keeps the stored value, `null` clears it,
/// and a value replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBookInput {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub year: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub author: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Option<String>>,
}

impl UpdateBookInput {
    /// True when the payload touches no field at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.year.is_none()
            && self.author.is_none()
            && self.publisher.is_none()
    }

    /// Apply the present fields onto `book`.
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(title) = &self.title {
            book.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            book.description.clone_from(description);
        }
        if let Some(year) = self.year {
            book.year = year;
        }
        if let Some(author) = &self.author {
            book.author.clone_from(author);
        }
        if let Some(publisher) = &self.publisher {
            book.publisher.clone_from(publisher);
        }
    }
}

/// A key that is present in the JSON (even as `null`) deserializes to `Some`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct ListMeta {
    #[serde(flatten)]
    pub page: PageMeta,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct BookList {
    pub data: Vec<Book>,
    pub meta: ListMeta,
}

#[derive(Debug, Serialize)]
pub struct BookEnvelope {
    pub book: Book,
}

#[derive(Debug, Serialize)]
pub struct BookCreated {
    pub message: &'static str,
    #[serde(rename = "newBook")]
    pub new_book: Book,
}

#[derive(Debug, Serialize)]
pub struct BookUpdated {
    pub message: &'static str,
    #[serde(rename = "updatedBook")]
    pub updated_book: Book,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}
