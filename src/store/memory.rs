use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::{new_id, BookUpdate, RecordStore, Result};
use crate::modules::books::models::{Book, BookPatch, NewBook};
use crate::modules::contact::models::{ContactSubmission, NewContact};

/// Ephemeral store; everything is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    books: RwLock<IndexMap<String, Book>>,
    contacts: RwLock<IndexMap<String, ContactSubmission>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pre-populated catalog. Ids are taken as given.
    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        let books = books
            .into_iter()
            .map(|book| (book.id.clone(), book))
            .collect();
        Self {
            books: RwLock::new(books),
            contacts: RwLock::default(),
        }
    }

    #[cfg(test)]
    pub(crate) async fn contact_count(&self) -> usize {
        self.contacts.read().await.len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_books(&self) -> Result<Vec<Book>> {
        Ok(self.books.read().await.values().cloned().collect())
    }

    async fn get_book(&self, id: &str) -> Result<Option<Book>> {
        Ok(self.books.read().await.get(id).cloned())
    }

    async fn create_book(&self, book: NewBook) -> Result<Book> {
        let mut books = self.books.write().await;
        let mut id = new_id();
        while books.contains_key(&id) {
            id = new_id();
        }
        let book = book.into_book(id);
        books.insert(book.id.clone(), book.clone());
        Ok(book)
    }

    async fn update_book(&self, id: &str, patch: BookPatch) -> Result<Option<BookUpdate>> {
        let mut books = self.books.write().await;
        Ok(books.get_mut(id).map(|book| {
            let previous = book.clone();
            book.apply(patch);
            BookUpdate {
                previous,
                current: book.clone(),
            }
        }))
    }

    async fn delete_book(&self, id: &str) -> Result<Option<Book>> {
        Ok(self.books.write().await.shift_remove(id))
    }

    async fn create_contact(&self, contact: NewContact) -> Result<ContactSubmission> {
        let submission = contact.into_submission(new_id());
        self.contacts
            .write()
            .await
            .insert(submission.id.clone(), submission.clone());
        Ok(submission)
    }
}
