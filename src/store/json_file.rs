use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;

use super::{new_id, BookUpdate, RecordStore, Result, StoreError};
use crate::modules::books::models::{Book, BookPatch, NewBook};
use crate::modules::contact::models::{ContactSubmission, NewContact};

/// Flat-file store: each collection is one JSON array, rewritten in full on
/// every mutation.
///
/// Mutations take `write_lock` so read-modify-write cycles inside this process
/// never interleave. Another process writing the same files is not detected;
/// the last writer wins.
#[derive(Debug)]
pub struct JsonFileStore {
    books_path: PathBuf,
    contacts_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(books_path: impl Into<PathBuf>, contacts_path: impl Into<PathBuf>) -> Self {
        Self {
            books_path: books_path.into(),
            contacts_path: contacts_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[cfg(test)]
    pub(crate) fn books_path(&self) -> &Path {
        &self.books_path
    }

    async fn read_books(&self) -> Result<Vec<Book>> {
        read_array(&self.books_path).await
    }

    async fn write_books(&self, books: &[Book]) -> Result<()> {
        write_array(&self.books_path, books).await
    }
}

/// A missing file is an empty collection. So is a file that no longer parses;
/// it is logged and will be replaced by the next write.
async fn read_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(records) => Ok(records),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "records file is not a valid JSON array; treating as empty"
            );
            Ok(Vec::new())
        }
    }
}

/// Write through a sibling temp file and rename so readers never observe a
/// half-written array.
async fn write_array<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let encoded = serde_json::to_vec_pretty(records).map_err(|source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, encoded).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn list_books(&self) -> Result<Vec<Book>> {
        self.read_books().await
    }

    async fn get_book(&self, id: &str) -> Result<Option<Book>> {
        Ok(self.read_books().await?.into_iter().find(|b| b.id == id))
    }

    async fn create_book(&self, book: NewBook) -> Result<Book> {
        let _guard = self.write_lock.lock().await;
        let mut books = self.read_books().await?;

        let mut id = new_id();
        while books.iter().any(|b| b.id == id) {
            id = new_id();
        }
        let book = book.into_book(id);
        books.push(book.clone());

        self.write_books(&books).await?;
        Ok(book)
    }

    async fn update_book(&self, id: &str, patch: BookPatch) -> Result<Option<BookUpdate>> {
        let _guard = self.write_lock.lock().await;
        let mut books = self.read_books().await?;

        let Some(book) = books.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        let previous = book.clone();
        book.apply(patch);
        let update = BookUpdate {
            previous,
            current: book.clone(),
        };

        self.write_books(&books).await?;
        Ok(Some(update))
    }

    async fn delete_book(&self, id: &str) -> Result<Option<Book>> {
        let _guard = self.write_lock.lock().await;
        let mut books = self.read_books().await?;

        let Some(index) = books.iter().position(|b| b.id == id) else {
            return Ok(None);
        };
        let removed = books.remove(index);

        self.write_books(&books).await?;
        Ok(Some(removed))
    }

    async fn create_contact(&self, contact: NewContact) -> Result<ContactSubmission> {
        let _guard = self.write_lock.lock().await;
        let mut contacts: Vec<ContactSubmission> = read_array(&self.contacts_path).await?;

        let submission = contact.into_submission(new_id());
        contacts.push(submission.clone());

        write_array(&self.contacts_path, &contacts).await?;
        Ok(submission)
    }
}
