pub mod models;
pub mod routes;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use inkwell_kernel::{InitCtx, Module};
use serde_json::json;

use crate::store::RecordStore;
use crate::upload::UploadStore;

/// Catalog CRUD and cover uploads, mounted at `/api/books`.
pub struct BooksModule {
    state: routes::BooksState,
}

impl BooksModule {
    pub fn new(store: Arc<dyn RecordStore>, uploads: UploadStore) -> Self {
        Self {
            state: routes::BooksState { store, uploads },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.state
            .uploads
            .ensure_dir()
            .await
            .context("failed to prepare uploads directory")?;

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            uploads = %self.state.uploads.dir().display(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn id_parameter() -> serde_json::Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    })
}

fn openapi_fragment() -> serde_json::Value {
    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "All books in the catalog",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book with its cover image",
                    "tags": ["Books"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "multipart/form-data": {
                                "schema": { "$ref": "#/components/schemas/BookForm" }
                            }
                        }
                    },
                    "responses": {
                        "201": book_response("Created book"),
                        "400": error_response("Missing or invalid image, or missing fields")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Fetch one book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": book_response("The book"),
                        "404": error_response("Unknown id")
                    }
                },
                "patch": {
                    "summary": "Merge-update a book; supplied fields overwrite, others are kept",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "requestBody": {
                        "content": {
                            "multipart/form-data": {
                                "schema": { "$ref": "#/components/schemas/BookForm" }
                            }
                        }
                    },
                    "responses": {
                        "200": book_response("Updated book"),
                        "400": error_response("Invalid image or empty field"),
                        "404": error_response("Unknown id")
                    }
                },
                "put": {
                    "summary": "Alias of PATCH",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "requestBody": {
                        "content": {
                            "multipart/form-data": {
                                "schema": { "$ref": "#/components/schemas/BookForm" }
                            }
                        }
                    },
                    "responses": {
                        "200": book_response("Updated book"),
                        "400": error_response("Invalid image or empty field"),
                        "404": error_response("Unknown id")
                    }
                },
                "delete": {
                    "summary": "Delete a book and its uploaded cover",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "204": { "description": "Deleted" },
                        "404": error_response("Unknown id")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "description": "Store-assigned identifier" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "synopsis": { "type": "string" },
                        "coverImage": { "type": "string", "description": "Public path of the cover image" },
                        "publicationDate": { "type": "string", "description": "Free-form date such as \"March 2024\"" }
                    },
                    "required": ["id", "title", "author", "synopsis", "coverImage", "publicationDate"]
                },
                "BookForm": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "synopsis": { "type": "string" },
                        "publicationDate": { "type": "string" },
                        "coverImage": { "type": "string", "format": "binary" }
                    }
                }
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module(store: Arc<dyn RecordStore>, uploads: UploadStore) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store, uploads))
}
