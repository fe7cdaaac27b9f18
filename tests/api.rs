//! End-to-end tests against the assembled router.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use inkwell_kernel::settings::{Settings, StorageBackend};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "inkwell-test-boundary";
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot really a png but close enough";

enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

fn cover_png() -> Part<'static> {
    Part::File {
        name: "coverImage",
        file_name: "cover.png",
        content_type: "image/png",
        bytes: PNG_BYTES,
    }
}

fn book_fields() -> Vec<Part<'static>> {
    vec![
        Part::Text("title", "T"),
        Part::Text("author", "A"),
        Part::Text("synopsis", "S"),
        Part::Text("publicationDate", "Jan 2025"),
    ]
}

fn multipart_request(method: Method, uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

struct TestApp {
    router: Router,
    dir: TempDir,
}

impl TestApp {
    async fn with(configure: impl FnOnce(&mut Settings, &TempDir)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.storage.seed_samples = false;
        settings.uploads.dir = dir.path().join("uploads");
        settings.assets.dir = dir.path().join("assets");
        configure(&mut settings, &dir);

        let router = inkwell_app::build_app(&settings).await.unwrap();
        Self { router, dir }
    }

    async fn new() -> Self {
        Self::with(|_, _| {}).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    fn uploaded_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path().join("uploads"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    async fn create_book(&self) -> Value {
        let mut parts = book_fields();
        parts.push(cover_png());
        let (status, body) = self
            .send(multipart_request(Method::POST, "/api/books", &parts))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

#[tokio::test]
async fn create_then_fetch_returns_identical_book() {
    let app = TestApp::new().await;
    let created = app.create_book().await;

    let id = created["id"].as_str().unwrap();
    assert!(!id.is_empty());
    assert_eq!(created["title"], "T");
    assert_eq!(created["author"], "A");
    assert_eq!(created["synopsis"], "S");
    assert_eq!(created["publicationDate"], "Jan 2025");
    assert!(created["coverImage"]
        .as_str()
        .unwrap()
        .starts_with("/uploads/"));

    let (status, fetched) = app
        .send(empty_request(Method::GET, &format!("/api/books/{id}")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
    assert_eq!(app.uploaded_files().len(), 1);
}

#[tokio::test]
async fn uploaded_cover_is_served_back() {
    let app = TestApp::new().await;
    let created = app.create_book().await;
    let cover = created["coverImage"].as_str().unwrap();

    let response = app
        .router
        .clone()
        .oneshot(empty_request(Method::GET, cover))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], PNG_BYTES);
}

#[tokio::test]
async fn list_returns_books_in_creation_order() {
    let app = TestApp::new().await;
    let first = app.create_book().await;
    let second = app.create_book().await;
    assert_ne!(first["id"], second["id"]);

    let (status, body) = app.send(empty_request(Method::GET, "/api/books")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([first, second]));
}

#[tokio::test]
async fn seeded_catalog_is_listed() {
    let app = TestApp::with(|settings, _| settings.storage.seed_samples = true).await;

    let (status, body) = app.send(empty_request(Method::GET, "/api/books")).await;
    assert_eq!(status, StatusCode::OK);
    let books = body.as_array().unwrap();
    assert_eq!(books.len(), 6);
    assert_eq!(books[0]["id"], "1");
    assert!(books[0]["coverImage"]
        .as_str()
        .unwrap()
        .starts_with("/attached_assets/"));
}

#[tokio::test]
async fn unknown_book_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(empty_request(Method::GET, "/api/books/does-not-exist"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn non_image_upload_is_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let mut parts = book_fields();
    parts.push(Part::File {
        name: "coverImage",
        file_name: "notes.png",
        content_type: "text/plain",
        bytes: b"just some text",
    });

    let (status, body) = app
        .send(multipart_request(Method::POST, "/api/books", &parts))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Only image files are allowed");

    let (_, list) = app.send(empty_request(Method::GET, "/api/books")).await;
    assert_eq!(list, json!([]));
    assert!(app.uploaded_files().is_empty());
}

#[tokio::test]
async fn missing_cover_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(multipart_request(Method::POST, "/api/books", &book_fields()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Cover image is required");
}

#[tokio::test]
async fn missing_field_leaves_no_record_and_no_orphaned_upload() {
    let app = TestApp::new().await;
    let parts = vec![
        Part::Text("title", "T"),
        Part::Text("synopsis", "S"),
        Part::Text("publicationDate", "Jan 2025"),
        cover_png(),
    ];

    let (status, body) = app
        .send(multipart_request(Method::POST, "/api/books", &parts))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(
        body["error"]["details"],
        json!([{ "field": "author", "error": "required" }])
    );

    let (_, list) = app.send(empty_request(Method::GET, "/api/books")).await;
    assert_eq!(list, json!([]));
    assert!(app.uploaded_files().is_empty());
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_writing() {
    let app = TestApp::with(|settings, _| settings.uploads.max_bytes = 8).await;
    let mut parts = book_fields();
    parts.push(cover_png());

    let (status, body) = app
        .send(multipart_request(Method::POST, "/api/books", &parts))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(app.uploaded_files().is_empty());
}

#[tokio::test]
async fn non_multipart_create_is_a_bad_request() {
    let app = TestApp::new().await;
    let (status, _) = app
        .send(json_request(Method::POST, "/api/books", json!({ "title": "T" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patch_changes_only_supplied_fields() {
    let app = TestApp::new().await;
    let created = app.create_book().await;
    let uri = format!("/api/books/{}", created["id"].as_str().unwrap());

    let (status, updated) = app
        .send(multipart_request(
            Method::PATCH,
            &uri,
            &[Part::Text("title", "X")],
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut expected = created.clone();
    expected["title"] = json!("X");
    assert_eq!(updated, expected);

    let (_, fetched) = app.send(empty_request(Method::GET, &uri)).await;
    assert_eq!(fetched, expected);
}

#[tokio::test]
async fn put_is_accepted_as_update() {
    let app = TestApp::new().await;
    let created = app.create_book().await;
    let uri = format!("/api/books/{}", created["id"].as_str().unwrap());

    let (status, updated) = app
        .send(multipart_request(
            Method::PUT,
            &uri,
            &[Part::Text("author", "B"), Part::Text("synopsis", "New")],
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["author"], "B");
    assert_eq!(updated["synopsis"], "New");
    assert_eq!(updated["title"], "T");
}

#[tokio::test]
async fn replacing_cover_releases_the_old_file() {
    let app = TestApp::new().await;
    let created = app.create_book().await;
    let uri = format!("/api/books/{}", created["id"].as_str().unwrap());
    let old_file = created["coverImage"]
        .as_str()
        .unwrap()
        .trim_start_matches("/uploads/")
        .to_string();

    let (status, updated) = app
        .send(multipart_request(
            Method::PATCH,
            &uri,
            &[Part::File {
                name: "coverImage",
                file_name: "new.jpg",
                content_type: "image/jpeg",
                bytes: b"jpeg bytes",
            }],
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let new_cover = updated["coverImage"].as_str().unwrap();
    assert_ne!(new_cover, created["coverImage"].as_str().unwrap());
    assert!(new_cover.ends_with(".jpg"));

    let files = app.uploaded_files();
    assert_eq!(files.len(), 1);
    assert_ne!(files[0], old_file);
    assert_eq!(updated["title"], "T");
}

#[tokio::test]
async fn patch_with_blank_field_is_rejected_and_keeps_record() {
    let app = TestApp::new().await;
    let created = app.create_book().await;
    let uri = format!("/api/books/{}", created["id"].as_str().unwrap());

    let (status, body) = app
        .send(multipart_request(
            Method::PATCH,
            &uri,
            &[Part::Text("title", "   "), cover_png()],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["details"],
        json!([{ "field": "title", "error": "empty" }])
    );

    let (_, fetched) = app.send(empty_request(Method::GET, &uri)).await;
    assert_eq!(fetched, created);
    assert_eq!(app.uploaded_files().len(), 1);
}

#[tokio::test]
async fn patch_unknown_book_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app
        .send(multipart_request(
            Method::PATCH,
            "/api/books/missing",
            &[Part::Text("title", "X"), cover_png()],
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.uploaded_files().is_empty());
}

#[tokio::test]
async fn update_unknown_book_without_form_body_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(json_request(
            Method::PATCH,
            "/api/books/missing",
            json!({ "title": "X" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, _) = app
        .send(empty_request(Method::PUT, "/api/books/missing"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(empty_request(Method::PATCH, "/api/books/missing"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_known_book_without_form_body_is_a_bad_request() {
    let app = TestApp::new().await;
    let created = app.create_book().await;
    let uri = format!("/api/books/{}", created["id"].as_str().unwrap());

    let (status, _) = app
        .send(json_request(Method::PATCH, &uri, json!({ "title": "X" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, fetched) = app.send(empty_request(Method::GET, &uri)).await;
    assert_eq!(fetched, created);
}

fn unpicked_cover() -> Part<'static> {
    Part::File {
        name: "coverImage",
        file_name: "",
        content_type: "application/octet-stream",
        bytes: b"",
    }
}

#[tokio::test]
async fn patch_with_unpicked_cover_keeps_existing_cover() {
    let app = TestApp::new().await;
    let created = app.create_book().await;
    let uri = format!("/api/books/{}", created["id"].as_str().unwrap());
    let files_before = app.uploaded_files();

    let (status, updated) = app
        .send(multipart_request(
            Method::PATCH,
            &uri,
            &[Part::Text("title", "New"), unpicked_cover()],
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["title"], "New");
    assert_eq!(updated["coverImage"], created["coverImage"]);
    assert_eq!(app.uploaded_files(), files_before);
}

#[tokio::test]
async fn create_with_only_unpicked_cover_requires_an_image() {
    let app = TestApp::new().await;
    let mut parts = book_fields();
    parts.push(unpicked_cover());

    let (status, body) = app
        .send(multipart_request(Method::POST, "/api/books", &parts))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Cover image is required");
    assert!(app.uploaded_files().is_empty());

    let (_, listed) = app.send(empty_request(Method::GET, "/api/books")).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn concurrent_cover_replacements_leave_one_file() {
    let app = TestApp::new().await;
    let created = app.create_book().await;
    let uri = format!("/api/books/{}", created["id"].as_str().unwrap());

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let router = app.router.clone();
        let request = multipart_request(Method::PATCH, &uri, &[cover_png()]);
        tasks.push(tokio::spawn(async move {
            router.oneshot(request).await.unwrap().status()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    let (_, fetched) = app.send(empty_request(Method::GET, &uri)).await;
    let current = fetched["coverImage"]
        .as_str()
        .unwrap()
        .trim_start_matches("/uploads/")
        .to_string();
    assert_eq!(app.uploaded_files(), vec![current]);
}

#[tokio::test]
async fn delete_removes_book_and_cover() {
    let app = TestApp::new().await;
    let created = app.create_book().await;
    let uri = format!("/api/books/{}", created["id"].as_str().unwrap());

    let (status, body) = app.send(empty_request(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    assert!(app.uploaded_files().is_empty());

    let (status, _) = app.send(empty_request(Method::GET, &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(empty_request(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contact_submission_is_created() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/contact",
            json!({ "name": "Ada", "email": "ada@example.com", "message": "Hello" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["id"].as_str().unwrap().is_empty());
    assert_eq!(body["name"], "Ada");
    assert_eq!(body["message"], "Hello");
}

#[tokio::test]
async fn contact_submission_requires_all_fields() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/contact",
            json!({ "name": "Ada", "message": "Hello" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["details"],
        json!([{ "field": "email", "error": "required" }])
    );
}

#[tokio::test]
async fn contact_submission_rejects_malformed_json() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn json_file_backend_persists_created_books() {
    let app = TestApp::with(|settings, dir| {
        settings.storage.backend = StorageBackend::JsonFile;
        settings.storage.books_path = dir.path().join("data").join("books.json");
        settings.storage.contacts_path = dir.path().join("data").join("contacts.json");
    })
    .await;
    let created = app.create_book().await;

    let raw = std::fs::read(app.dir.path().join("data").join("books.json")).unwrap();
    let stored: Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(stored, json!([created]));
}

#[tokio::test]
async fn health_and_fallback_routes() {
    let app = TestApp::new().await;

    let (status, body) = app.send(empty_request(Method::GET, "/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));

    let (status, body) = app.send(empty_request(Method::GET, "/api/nothing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, body) = app
        .send(empty_request(Method::GET, "/docs/openapi.json"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/books/{id}"]["patch"].is_object());
    assert!(body["paths"]["/api/contact"]["post"].is_object());
}
