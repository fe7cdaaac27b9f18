//! Record store: owns every book and contact submission.
//!
//! Two backends implement [`RecordStore`]: [`MemoryStore`] keeps records in
//! insertion-ordered maps for the life of the process, [`JsonFileStore`]
//! rewrites flat JSON array files on every mutation. Which one serves the API
//! is a configuration choice (`storage.backend`).

mod json_file;
mod memory;
mod samples;

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use inkwell_kernel::settings::{StorageBackend, StorageSettings};
use thiserror::Error;

use crate::modules::books::models::{Book, BookPatch, NewBook};
use crate::modules::contact::models::{ContactSubmission, NewContact};

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use samples::sample_books;

/// Faults from a store backend. "Not found" is never an error; lookups
/// return `None` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode records for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A book as it was immediately before and after one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookUpdate {
    pub previous: Book,
    pub current: Book,
}

impl BookUpdate {
    /// The cover this update displaced, if it changed.
    pub fn replaced_cover(&self) -> Option<&str> {
        (self.previous.cover_image != self.current.cover_image)
            .then_some(self.previous.cover_image.as_str())
    }
}

impl From<StoreError> for inkwell_http::error::AppError {
    fn from(err: StoreError) -> Self {
        inkwell_http::error::AppError::Internal(anyhow::Error::new(err))
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// All books in insertion order.
    async fn list_books(&self) -> Result<Vec<Book>>;

    /// Returns `None` if no book has this id.
    async fn get_book(&self, id: &str) -> Result<Option<Book>>;

    /// Assigns a fresh id and stores the book.
    async fn create_book(&self, book: NewBook) -> Result<Book>;

    /// Merges `patch` onto an existing book. Returns `None` for an unknown id;
    /// never creates a record.
    async fn update_book(&self, id: &str, patch: BookPatch) -> Result<Option<BookUpdate>>;

    /// Removes a book and hands it back so the caller can release its cover.
    /// `None` means nothing was removed.
    async fn delete_book(&self, id: &str) -> Result<Option<Book>>;

    async fn create_contact(&self, contact: NewContact) -> Result<ContactSubmission>;
}

/// Generate a record identifier.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Open the backend selected by configuration.
pub fn open(settings: &StorageSettings) -> Arc<dyn RecordStore> {
    match settings.backend {
        StorageBackend::Memory => {
            let store = if settings.seed_samples {
                MemoryStore::with_books(sample_books())
            } else {
                MemoryStore::new()
            };
            tracing::info!(
                backend = "memory",
                seeded = settings.seed_samples,
                "record store ready"
            );
            Arc::new(store)
        }
        StorageBackend::JsonFile => {
            tracing::info!(
                backend = "json_file",
                books = %settings.books_path.display(),
                contacts = %settings.contacts_path.display(),
                "record store ready"
            );
            Arc::new(JsonFileStore::new(
                settings.books_path.clone(),
                settings.contacts_path.clone(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_memory_seeds_samples_when_configured() {
        let store = open(&StorageSettings::default());
        let books = store.list_books().await.unwrap();
        assert_eq!(books.len(), sample_books().len());
        assert_eq!(books[0].id, "1");
    }

    #[tokio::test]
    async fn open_memory_without_samples_is_empty() {
        let settings = StorageSettings {
            seed_samples: false,
            ..StorageSettings::default()
        };
        let store = open(&settings);
        assert!(store.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_json_file_never_seeds() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StorageSettings {
            backend: StorageBackend::JsonFile,
            books_path: dir.path().join("books.json"),
            contacts_path: dir.path().join("contacts.json"),
            seed_samples: true,
        };
        let store = open(&settings);
        assert!(store.list_books().await.unwrap().is_empty());
    }

    #[test]
    fn replaced_cover_only_reported_when_it_changed() {
        let previous = sample_books().remove(0);
        let mut current = previous.clone();
        current.title = "Renamed".to_string();

        let update = BookUpdate {
            previous: previous.clone(),
            current: current.clone(),
        };
        assert_eq!(update.replaced_cover(), None);

        current.cover_image = "/uploads/new.png".to_string();
        let update = BookUpdate { previous, current };
        assert_eq!(update.replaced_cover(), Some(sample_books()[0].cover_image.as_str()));
    }

    #[test]
    fn ids_are_unique() {
        let a = new_id();
        let b = new_id();
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }
}
