use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use inkwell_http::error::AppError;

use super::models::Book;
use crate::store::RecordStore;
use crate::upload::UploadStore;
use crate::validation::{BookForm, BookPatchForm};

/// Room for the text parts and multipart framing around the image itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct BooksState {
    pub store: Arc<dyn RecordStore>,
    pub uploads: UploadStore,
}

pub fn router(state: BooksState) -> Router {
    let body_limit = state.uploads.max_bytes() + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_book)
                .patch(update_book)
                .put(update_book)
                .delete(delete_book),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Delete a freshly stored cover when the rest of the request fails, so no
/// upload outlives a rejected submission.
async fn release_on_err<T>(
    uploads: &UploadStore,
    cover: Option<&str>,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    if result.is_err() {
        if let Some(cover) = cover {
            uploads.remove(cover).await;
        }
    }
    result
}

fn book_not_found(id: &str) -> AppError {
    AppError::not_found(format!("Book '{}' not found", id))
}

fn multipart_body(multipart: Result<Multipart, MultipartRejection>) -> Result<Multipart, AppError> {
    multipart.map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(State(state): State<BooksState>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(state.store.list_books().await?))
}

async fn get_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    state
        .store
        .get_book(&id)
        .await?
        .map(Json)
        .ok_or_else(|| book_not_found(&id))
}

async fn create_book(
    State(state): State<BooksState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let submission = state.uploads.read_submission(multipart_body(multipart)?).await?;

    let Some(image) = submission.image else {
        return Err(AppError::bad_request("Cover image is required"));
    };
    let cover = state.uploads.persist(&image).await?;

    let new_book = release_on_err(
        &state.uploads,
        Some(cover.as_str()),
        BookForm::from_fields(&submission.fields, Some(cover.clone())).into_new_book(),
    )
    .await?;

    let stored = state.store.create_book(new_book).await.map_err(AppError::from);
    let book = release_on_err(&state.uploads, Some(cover.as_str()), stored).await?;

    tracing::info!(book_id = %book.id, title = %book.title, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Book>, AppError> {
    let existing = state
        .store
        .get_book(&id)
        .await?
        .ok_or_else(|| book_not_found(&id))?;

    let submission = state.uploads.read_submission(multipart_body(multipart)?).await?;

    let new_cover = match &submission.image {
        Some(image) => Some(state.uploads.persist(image).await?),
        None => None,
    };

    let patch = release_on_err(
        &state.uploads,
        new_cover.as_deref(),
        BookPatchForm::from_fields(&submission.fields, new_cover.clone()).into_patch(),
    )
    .await?;

    if patch.is_empty() {
        return Ok(Json(existing));
    }

    let updated = match state.store.update_book(&id, patch).await {
        Ok(Some(update)) => Ok(update),
        // Deleted between the lookup and the write.
        Ok(None) => Err(book_not_found(&id)),
        Err(err) => Err(err.into()),
    };
    let update = release_on_err(&state.uploads, new_cover.as_deref(), updated).await?;

    if let Some(replaced) = update.replaced_cover() {
        state.uploads.remove(replaced).await;
    }

    let book = update.current;
    tracing::info!(book_id = %book.id, cover_replaced = new_cover.is_some(), "book updated");
    Ok(Json(book))
}

async fn delete_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let removed = state
        .store
        .delete_book(&id)
        .await?
        .ok_or_else(|| book_not_found(&id))?;

    state.uploads.remove(&removed.cover_image).await;

    tracing::info!(book_id = %removed.id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}
