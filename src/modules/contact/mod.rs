pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use inkwell_http::error::AppError;
use inkwell_kernel::{InitCtx, Module};
use serde_json::json;

use crate::store::RecordStore;
use crate::validation::ContactForm;
use models::ContactSubmission;

/// Contact form sink, mounted at `/api/contact`. Submissions are stored but
/// never listed.
pub struct ContactModule {
    store: Arc<dyn RecordStore>,
}

impl ContactModule {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for ContactModule {
    fn name(&self) -> &'static str {
        "contact"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "contact module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", post(create_contact))
            .with_state(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Submit the contact form",
                        "tags": ["Contact"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ContactForm" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Stored submission",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ContactSubmission" }
                                    }
                                }
                            },
                            "400": {
                                "description": "Missing or empty field",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "ContactForm": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "email": { "type": "string" },
                            "message": { "type": "string" }
                        },
                        "required": ["name", "email", "message"]
                    },
                    "ContactSubmission": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "name": { "type": "string" },
                            "email": { "type": "string" },
                            "message": { "type": "string" }
                        },
                        "required": ["id", "name", "email", "message"]
                    }
                }
            }
        }))
    }
}

async fn create_contact(
    State(store): State<Arc<dyn RecordStore>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ContactSubmission>), AppError> {
    let Json(payload) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let contact = ContactForm::from_json(payload)?.into_new_contact()?;

    let submission = store.create_contact(contact).await?;
    tracing::info!(contact_id = %submission.id, "contact submission stored");
    Ok((StatusCode::CREATED, Json(submission)))
}

pub fn create_module(store: Arc<dyn RecordStore>) -> Arc<dyn Module> {
    Arc::new(ContactModule::new(store))
}
