use serde::{Deserialize, Serialize};

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Store-assigned identifier, immutable once created
    pub id: String,
    pub title: String,
    pub author: String,
    pub synopsis: String,
    /// Public path of the cover image, usually `/uploads/<name>`
    pub cover_image: String,
    /// Free-form date text such as "March 2024"
    pub publication_date: String,
}

/// A fully validated book waiting for an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub synopsis: String,
    pub cover_image: String,
    pub publication_date: String,
}

impl NewBook {
    pub fn into_book(self, id: String) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            synopsis: self.synopsis,
            cover_image: self.cover_image,
            publication_date: self.publication_date,
        }
    }
}

/// Merge-update: only the `Some` fields overwrite the stored book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.synopsis.is_none()
            && self.cover_image.is_none()
            && self.publication_date.is_none()
    }
}

impl Book {
    /// Apply a patch in place. The id is never touched.
    pub fn apply(&mut self, patch: BookPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(author) = patch.author {
            self.author = author;
        }
        if let Some(synopsis) = patch.synopsis {
            self.synopsis = synopsis;
        }
        if let Some(cover_image) = patch.cover_image {
            self.cover_image = cover_image;
        }
        if let Some(publication_date) = patch.publication_date {
            self.publication_date = publication_date;
        }
    }
}
