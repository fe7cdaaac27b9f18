//! Cover image uploads.
//!
//! Book submissions arrive as `multipart/form-data`: text attributes plus at
//! most one file under [`COVER_FIELD`]. The file is checked (extension,
//! declared content type, size) while it is read and only reaches disk
//! through [`UploadStore::persist`].

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{multipart::MultipartError, Multipart};
use inkwell_http::{error::AppError, UPLOADS_PATH};
use rand::Rng;
use thiserror::Error;

use crate::validation::FormFields;

/// Multipart field carrying the cover image.
pub const COVER_FIELD: &str = "coverImage";

const IMAGE_TYPES: &[&str] = &["jpeg", "jpg", "png", "gif", "webp"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Only image files are allowed")]
    NotAnImage,

    #[error("Cover image exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("unexpected file field '{0}'")]
    UnexpectedFile(String),

    #[error("only one cover image may be uploaded")]
    DuplicateFile,

    #[error("malformed multipart body: {0}")]
    Malformed(#[from] MultipartError),

    #[error("failed to store upload at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io { .. } => AppError::Internal(anyhow::Error::new(err)),
            other => AppError::bad_request(other.to_string()),
        }
    }
}

/// An image that passed the type and size checks but is not yet on disk.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub original_name: String,
    pub content_type: String,
    /// Lower-cased extension without the dot.
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Everything a book create/update request carried.
#[derive(Debug, Default)]
pub struct BookSubmission {
    pub fields: FormFields,
    pub image: Option<ImageUpload>,
}

/// Accept only when both the extension and the declared content type name an
/// image format we serve. Returns the normalized extension.
pub fn check_image(file_name: &str, content_type: Option<&str>) -> Result<String, UploadError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| IMAGE_TYPES.contains(&ext.as_str()))
        .ok_or(UploadError::NotAnImage)?;

    let subtype = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .and_then(|ct| ct.strip_prefix("image/").map(str::to_string))
        .ok_or(UploadError::NotAnImage)?;

    if !IMAGE_TYPES.contains(&subtype.as_str()) {
        return Err(UploadError::NotAnImage);
    }

    Ok(extension)
}

/// Owns the uploads directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| UploadError::Io {
                path: self.dir.clone(),
                source,
            })
    }

    /// Drain a book multipart body. Text parts are collected as fields; the
    /// cover part is checked and buffered, never written here.
    pub async fn read_submission(
        &self,
        mut multipart: Multipart,
    ) -> Result<BookSubmission, UploadError> {
        let mut submission = BookSubmission::default();

        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            let Some(file_name) = field.file_name().map(str::to_string) else {
                let value = field.text().await?;
                submission.fields.insert(name, value);
                continue;
            };

            // Browsers send an empty, unnamed part when no file was picked.
            if file_name.is_empty() {
                while field.chunk().await?.is_some() {}
                continue;
            }

            if name != COVER_FIELD {
                return Err(UploadError::UnexpectedFile(name));
            }
            if submission.image.is_some() {
                return Err(UploadError::DuplicateFile);
            }

            let content_type = field.content_type().map(str::to_string);
            let extension = check_image(&file_name, content_type.as_deref()).inspect_err(|_| {
                tracing::warn!(
                    file_name = %file_name,
                    content_type = ?content_type,
                    "rejected non-image upload"
                );
            })?;

            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await? {
                if bytes.len() + chunk.len() > self.max_bytes {
                    tracing::warn!(file_name = %file_name, limit = self.max_bytes, "rejected oversized upload");
                    return Err(UploadError::TooLarge {
                        limit: self.max_bytes,
                    });
                }
                bytes.extend_from_slice(&chunk);
            }

            submission.image = Some(ImageUpload {
                original_name: file_name,
                content_type: content_type.unwrap_or_default(),
                extension,
                bytes,
            });
        }

        Ok(submission)
    }

    /// `<unix-millis>-<random>.<ext>`; unique in practice without coordination.
    fn generate_name(extension: &str) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        format!("{millis}-{suffix}.{extension}")
    }

    /// Write the image and return its public path (`/uploads/<name>`).
    pub async fn persist(&self, image: &ImageUpload) -> Result<String, UploadError> {
        let file_name = Self::generate_name(&image.extension);
        let path = self.dir.join(&file_name);

        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|source| UploadError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!(
            file = %file_name,
            original = %image.original_name,
            bytes = image.bytes.len(),
            "stored cover image"
        );
        Ok(format!("{}/{}", UPLOADS_PATH, file_name))
    }

    /// Resolve a public path to a file inside the uploads directory. Paths
    /// elsewhere (bundled sample art) and anything trying to escape the
    /// directory resolve to `None`.
    pub fn local_path(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path
            .strip_prefix(UPLOADS_PATH)?
            .strip_prefix('/')?;
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." || name == "." {
            return None;
        }
        Some(self.dir.join(name))
    }

    /// Release a stored image. Missing files and foreign paths are ignored;
    /// returns whether a file was deleted.
    pub async fn remove(&self, public_path: &str) -> bool {
        let Some(path) = self.local_path(public_path) else {
            return false;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "removed cover image");
                true
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => false,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to remove cover image");
                false
            }
        }
    }
}
