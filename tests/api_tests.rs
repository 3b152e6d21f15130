//! In-process API tests, driving the router without a socket

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use bookshelf_server::{api, config::AppConfig, AppState};

fn app() -> Router {
    api::create_router(AppState::new(AppConfig::default()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("Failed to build request"))
        .await
        .expect("Failed to send request");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Failed to parse response")
    };

    (status, value)
}

fn book_payload(name: &str, page_count: i64, read_page: i64, reading: bool) -> Value {
    json!({
        "name": name,
        "year": 2010,
        "author": "John Doe",
        "summary": "Lorem ipsum dolor sit amet",
        "publisher": "Dicoding Indonesia",
        "pageCount": page_count,
        "readPage": read_page,
        "reading": reading
    })
}

async fn create(app: &Router, payload: Value) -> String {
    let (status, body) = send(app, Method::POST, "/books", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["bookId"]
        .as_str()
        .expect("No book ID")
        .to_string()
}

fn listed_names(body: &Value) -> Vec<String> {
    body["data"]["books"]
        .as_array()
        .expect("books is not an array")
        .iter()
        .map(|b| b["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_and_get_book() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(book_payload("Buku A", 100, 25, true)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Book added successfully");
    let id = body["data"]["bookId"].as_str().expect("No book ID");

    let (status, body) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let book = &body["data"]["book"];
    assert_eq!(book["id"], id);
    assert_eq!(book["name"], "Buku A");
    assert_eq!(book["year"], 2010);
    assert_eq!(book["author"], "John Doe");
    assert_eq!(book["publisher"], "Dicoding Indonesia");
    assert_eq!(book["pageCount"], 100);
    assert_eq!(book["readPage"], 25);
    assert_eq!(book["reading"], true);
    assert_eq!(book["finished"], false);
    assert_eq!(book["insertedAt"], book["updatedAt"]);
}

#[tokio::test]
async fn test_create_finished_book() {
    let app = app();
    let id = create(&app, book_payload("Selesai", 100, 100, false)).await;

    let (_, body) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(body["data"]["book"]["finished"], true);
}

#[tokio::test]
async fn test_create_without_name() {
    let app = app();
    let mut payload = book_payload("x", 10, 1, false);
    payload.as_object_mut().unwrap().remove("name");

    let (status, body) = send(&app, Method::POST, "/books", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
    assert_eq!(
        body["message"],
        "Failed to add book. Please provide the book name"
    );

    let (_, body) = send(&app, Method::GET, "/books", None).await;
    assert!(listed_names(&body).is_empty());
}

#[tokio::test]
async fn test_create_with_read_page_over_page_count() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(book_payload("Buku", 80, 90, false)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
    assert_eq!(
        body["message"],
        "Failed to add book. readPage must not be greater than pageCount"
    );
}

#[tokio::test]
async fn test_create_with_malformed_body() {
    let app = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "fail");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_list_all_books_projected() {
    let app = app();
    let first = create(&app, book_payload("Dunia Tanpa Koma", 100, 100, true)).await;
    let second = create(&app, book_payload("Bumi", 300, 10, false)).await;

    let (status, body) = send(&app, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let books = body["data"]["books"].as_array().unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0]["id"], first.as_str());
    assert_eq!(books[1]["id"], second.as_str());
    for book in books {
        let keys: Vec<&String> = book.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(book["publisher"], "Dicoding Indonesia");
    }
}

#[tokio::test]
async fn test_list_empty() {
    let (status, body) = send(&app(), Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["books"], json!([]));
}

#[tokio::test]
async fn test_list_filters() {
    let app = app();
    create(&app, book_payload("Dunia Tanpa Koma", 100, 100, true)).await;
    create(&app, book_payload("Bumi", 300, 10, false)).await;
    create(&app, book_payload("Dunia Sophie", 200, 20, true)).await;

    let (_, body) = send(&app, Method::GET, "/books?name=dunia", None).await;
    assert_eq!(listed_names(&body), vec!["Dunia Tanpa Koma", "Dunia Sophie"]);

    let (_, body) = send(&app, Method::GET, "/books?reading=1", None).await;
    assert_eq!(listed_names(&body), vec!["Dunia Tanpa Koma", "Dunia Sophie"]);

    let (_, body) = send(&app, Method::GET, "/books?reading=0", None).await;
    assert_eq!(listed_names(&body), vec!["Bumi"]);

    let (_, body) = send(&app, Method::GET, "/books?finished=1", None).await;
    assert_eq!(listed_names(&body), vec!["Dunia Tanpa Koma"]);

    let (_, body) = send(&app, Method::GET, "/books?finished=0", None).await;
    assert_eq!(listed_names(&body), vec!["Bumi", "Dunia Sophie"]);

    // Filters do not intersect: reading replaces the name filter
    let (_, body) = send(&app, Method::GET, "/books?name=dunia&reading=0", None).await;
    assert_eq!(listed_names(&body), vec!["Bumi"]);
}

#[tokio::test]
async fn test_list_with_repeated_parameters() {
    let app = app();
    create(&app, book_payload("Dunia Tanpa Koma", 100, 100, true)).await;
    create(&app, book_payload("Bumi", 300, 10, false)).await;

    let (status, body) = send(&app, Method::GET, "/books?reading=1&reading=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(listed_names(&body), vec!["Bumi"]);

    let (status, body) = send(&app, Method::GET, "/books?name=a&name=b", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed_names(&body), vec!["Bumi"]);

    let (status, body) = send(&app, Method::GET, "/books?finished=1&finished=maybe&sort=asc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed_names(&body), vec!["Dunia Tanpa Koma"]);
}

#[tokio::test]
async fn test_get_unknown_book() {
    let (status, body) = send(&app(), Method::GET, "/books/xxxxx", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Book not found");
}

#[tokio::test]
async fn test_update_book() {
    let app = app();
    let id = create(&app, book_payload("Lama", 100, 100, false)).await;
    let (_, before) = send(&app, Method::GET, &format!("/books/{}", id), None).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{}", id),
        Some(json!({
            "name": "Baru",
            "year": 2021,
            "author": "Jane Doe",
            "summary": "Ringkasan",
            "publisher": "Penerbit",
            "pageCount": 200,
            "readPage": 50,
            "reading": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Book updated successfully");

    let (_, after) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    let before = &before["data"]["book"];
    let after = &after["data"]["book"];

    assert_eq!(after["id"], id.as_str());
    assert_eq!(after["name"], "Baru");
    assert_eq!(after["year"], 2021);
    assert_eq!(after["author"], "Jane Doe");
    assert_eq!(after["summary"], "Ringkasan");
    assert_eq!(after["publisher"], "Penerbit");
    assert_eq!(after["pageCount"], 200);
    assert_eq!(after["readPage"], 50);
    assert_eq!(after["reading"], true);
    // finished is only derived on creation
    assert_eq!(after["finished"], true);
    assert_eq!(after["insertedAt"], before["insertedAt"]);

    let parse = |v: &Value| -> DateTime<Utc> {
        v.as_str().expect("timestamp").parse().expect("RFC 3339 timestamp")
    };
    assert!(parse(&after["updatedAt"]) > parse(&before["updatedAt"]));
}

#[tokio::test]
async fn test_update_validation() {
    let app = app();
    let id = create(&app, book_payload("Buku", 100, 10, false)).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{}", id),
        Some(json!({ "pageCount": 10, "readPage": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Failed to update book. Please provide the book name"
    );

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{}", id),
        Some(book_payload("Buku", 10, 11, false)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Failed to update book. readPage must not be greater than pageCount"
    );

    let (_, body) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(body["data"]["book"]["readPage"], 10);
}

#[tokio::test]
async fn test_update_unknown_book() {
    let (status, body) = send(
        &app(),
        Method::PUT,
        "/books/xxxxx",
        Some(book_payload("Buku", 10, 1, false)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Failed to update book. Id not found");
}

#[tokio::test]
async fn test_delete_book() {
    let app = app();
    let id = create(&app, book_payload("Hapus", 10, 1, false)).await;
    create(&app, book_payload("Simpan", 10, 1, false)).await;

    let (status, body) = send(&app, Method::DELETE, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Book deleted successfully");

    let (status, _) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/books", None).await;
    assert_eq!(listed_names(&body), vec!["Simpan"]);

    let (status, body) = send(&app, Method::DELETE, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Failed to delete book. Id not found");
}

#[tokio::test]
async fn test_create_get_delete_roundtrip() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "name": "A", "pageCount": 10, "readPage": 10, "reading": false })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["bookId"].as_str().expect("No book ID").to_string();

    let (status, body) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["book"]["finished"], true);

    let (status, _) = send(&app, Method::DELETE, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = app();
    create(&app, book_payload("Buku", 10, 1, false)).await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["books"], 1);
    assert_eq!(body["recompute_finished_on_update"], false);
}

#[tokio::test]
async fn test_readiness_reports_update_mode() {
    let mut config = AppConfig::default();
    config.catalog.recompute_finished_on_update = true;
    let app = api::create_router(AppState::new(config));

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recompute_finished_on_update"], true);
}

#[tokio::test]
async fn test_unsupported_method() {
    let app = app();

    let (status, body) = send(&app, Method::PATCH, "/books", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Method not allowed");

    let (status, body) = send(&app, Method::POST, "/books/xxxxx", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["status"], "fail");
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, body) = send(&app(), Method::GET, "/shelves", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Resource not found");
}
