//! Payload validation for book and contact submissions.
//!
//! Forms hold every attribute as optional text so that a missing field is a
//! validation failure with a field-level message rather than a decode error.
//! Values are trimmed when a form is built; whitespace-only counts as empty.

use std::collections::BTreeMap;

use inkwell_http::error::AppError;
use serde::Deserialize;
use serde_json::json;
use validator::{Validate, ValidationErrors};

use crate::modules::books::models::{BookPatch, NewBook};
use crate::modules::contact::models::NewContact;

/// Text attributes of a multipart submission, keyed by field name.
pub type FormFields = BTreeMap<String, String>;

fn field(fields: &FormFields, name: &str) -> Option<String> {
    fields.get(name).map(|value| value.trim().to_string())
}

/// Book-insert payload: every attribute is required.
#[derive(Debug, Clone, Default, Validate)]
pub struct BookForm {
    #[validate(
        required(message = "title is required"),
        length(min = 1, code = "empty", message = "title must not be empty")
    )]
    pub title: Option<String>,
    #[validate(
        required(message = "author is required"),
        length(min = 1, code = "empty", message = "author must not be empty")
    )]
    pub author: Option<String>,
    #[validate(
        required(message = "synopsis is required"),
        length(min = 1, code = "empty", message = "synopsis must not be empty")
    )]
    pub synopsis: Option<String>,
    #[validate(
        required(message = "publicationDate is required"),
        length(min = 1, code = "empty", message = "publicationDate must not be empty")
    )]
    pub publication_date: Option<String>,
    #[validate(
        required(message = "coverImage is required"),
        length(min = 1, code = "empty", message = "coverImage must not be empty")
    )]
    pub cover_image: Option<String>,
}

impl BookForm {
    pub fn from_fields(fields: &FormFields, cover_image: Option<String>) -> Self {
        Self {
            title: field(fields, "title"),
            author: field(fields, "author"),
            synopsis: field(fields, "synopsis"),
            publication_date: field(fields, "publicationDate"),
            cover_image,
        }
    }

    pub fn into_new_book(self) -> Result<NewBook, AppError> {
        self.validate().map_err(validation_error)?;

        match (
            self.title,
            self.author,
            self.synopsis,
            self.publication_date,
            self.cover_image,
        ) {
            (
                Some(title),
                Some(author),
                Some(synopsis),
                Some(publication_date),
                Some(cover_image),
            ) => Ok(NewBook {
                title,
                author,
                synopsis,
                cover_image,
                publication_date,
            }),
            _ => Err(AppError::validation(vec![], "book payload is incomplete")),
        }
    }
}

/// Book-patch payload: fields may be omitted, but a supplied field must carry
/// text.
#[derive(Debug, Clone, Default, Validate)]
pub struct BookPatchForm {
    #[validate(length(min = 1, code = "empty", message = "title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, code = "empty", message = "author must not be empty"))]
    pub author: Option<String>,
    #[validate(length(min = 1, code = "empty", message = "synopsis must not be empty"))]
    pub synopsis: Option<String>,
    #[validate(length(
        min = 1,
        code = "empty",
        message = "publicationDate must not be empty"
    ))]
    pub publication_date: Option<String>,
    pub cover_image: Option<String>,
}

impl BookPatchForm {
    pub fn from_fields(fields: &FormFields, cover_image: Option<String>) -> Self {
        Self {
            title: field(fields, "title"),
            author: field(fields, "author"),
            synopsis: field(fields, "synopsis"),
            publication_date: field(fields, "publicationDate"),
            cover_image,
        }
    }

    pub fn into_patch(self) -> Result<BookPatch, AppError> {
        self.validate().map_err(validation_error)?;

        Ok(BookPatch {
            title: self.title,
            author: self.author,
            synopsis: self.synopsis,
            cover_image: self.cover_image,
            publication_date: self.publication_date,
        })
    }
}

/// Contact-insert payload, decoded from a JSON object. Non-string values are
/// rejected during decoding.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ContactForm {
    #[validate(
        required(message = "name is required"),
        length(min = 1, code = "empty", message = "name must not be empty")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "email is required"),
        length(min = 1, code = "empty", message = "email must not be empty")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "message is required"),
        length(min = 1, code = "empty", message = "message must not be empty")
    )]
    pub message: Option<String>,
}

impl ContactForm {
    pub fn from_json(value: serde_json::Value) -> Result<Self, AppError> {
        if !value.is_object() {
            return Err(AppError::validation(
                vec![],
                "contact payload must be a JSON object",
            ));
        }
        let form: ContactForm = serde_json::from_value(value).map_err(|err| {
            AppError::validation(vec![], format!("invalid contact payload: {}", err))
        })?;

        let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
        Ok(Self {
            name: trim(form.name),
            email: trim(form.email),
            message: trim(form.message),
        })
    }

    pub fn into_new_contact(self) -> Result<NewContact, AppError> {
        self.validate().map_err(validation_error)?;

        match (self.name, self.email, self.message) {
            (Some(name), Some(email), Some(message)) => Ok(NewContact {
                name,
                email,
                message,
            }),
            _ => Err(AppError::validation(vec![], "contact payload is incomplete")),
        }
    }
}

/// `publication_date` -> `publicationDate`, matching the wire names.
fn wire_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Flatten validator output into the error envelope: one detail per violated
/// field, sorted by field name, and a message joining the individual messages.
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let mut violations: Vec<(String, String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = wire_name(field.as_ref());
            errs.iter()
                .map(|err| {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    (field.clone(), err.code.to_string(), message)
                })
                .collect::<Vec<_>>()
        })
        .collect();
    violations.sort();

    let message = violations
        .iter()
        .map(|(_, _, message)| message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    let details = violations
        .into_iter()
        .map(|(field, code, _)| json!({ "field": field, "error": code }))
        .collect();

    AppError::validation(details, message)
}
