//! End-to-end checks of the books HTTP surface through the full router.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use bookshelf_app::{
    app,
    books::{BookGateway, InMemoryBookGateway},
};
use bookshelf_kernel::settings::{DatabaseSettings, Settings};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app_with(gateway: Arc<dyn BookGateway>) -> Router {
    let settings = Settings::default();
    let registry = app::build_registry(&settings, gateway).await.unwrap();
    bookshelf_http::build_router(&registry, &settings)
}

async fn memory_app() -> Router {
    app_with(Arc::new(InMemoryBookGateway::new())).await
}

async fn sqlite_app() -> Router {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        ..DatabaseSettings::default()
    };
    app_with(app::book_gateway(&settings).await.unwrap()).await
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn editable(book: &Value) -> Value {
    json!({
        "title": book["title"],
        "author": book["author"],
        "publisher": book["publisher"],
        "description": book["description"],
        "year": book["year"],
    })
}

async fn create_get_delete_scenario(app: Router) {
    let input = json!({"title": "A", "author": "B", "publisher": "C", "description": "D", "year": 2001});

    let (status, body) = call(&app, "POST", "/api/books", Some(input.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Book created successfully.");
    let created = body["newBook"].clone();
    let id = created["id"].as_i64().expect("id assigned");
    assert_eq!(editable(&created), input);

    let (status, body) = call(&app, "GET", &format!("/api/books/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"], created);

    let (status, body) = call(&app, "DELETE", &format!("/api/books/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Book deleted successfully."}));

    let (status, body) = call(&app, "GET", &format!("/api/books/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Book not found."}));
}

async fn create_update_get_scenario(app: Router) {
    let (_, body) = call(
        &app,
        "POST",
        "/api/books",
        Some(json!({"title": "Old", "author": "Old", "publisher": "Old", "description": "Old", "year": 1900})),
    )
    .await;
    let id = body["newBook"]["id"].as_i64().unwrap();

    let changes = json!({"title": "New", "author": "Someone", "publisher": "Else", "description": "Fresh", "year": 2024});
    let (status, body) = call(&app, "PUT", &format!("/api/books/{id}"), Some(changes.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book updated successfully.");
    assert_eq!(editable(&body["updatedBook"]), changes);

    let (status, body) = call(&app, "GET", &format!("/api/books/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(editable(&body["book"]), changes);
    assert_eq!(body["book"]["id"], id);

    let (status, body) = call(&app, "PATCH", &format!("/api/books/{id}"), Some(json!({"year": null}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updatedBook"]["year"], Value::Null);
    assert_eq!(body["updatedBook"]["title"], "New");
}

async fn list_scenario(app: Router) {
    let mut ids = Vec::new();
    for n in 0..7 {
        let (_, body) = call(
            &app,
            "POST",
            "/api/books",
            Some(json!({"title": format!("Book {n}"), "author": if n % 2 == 0 { "Even Author" } else { "Odd Author" }, "year": 2000 + n})),
        )
        .await;
        ids.push(body["newBook"]["id"].as_i64().unwrap());
    }

    let (status, body) = call(&app, "GET", "/api/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["meta"],
        json!({"page": 1, "limit": 10, "total": 7, "totalPages": 1})
    );
    let listed: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect();
    let newest_first: Vec<i64> = ids.iter().rev().copied().collect();
    assert_eq!(listed, newest_first);

    for limit in 1..=8u64 {
        let (_, body) = call(&app, "GET", &format!("/api/books?limit={limit}"), None).await;
        assert_eq!(body["meta"]["totalPages"], (7 + limit - 1) / limit);
        assert_eq!(body["meta"]["total"], 7);
    }

    let (_, body) = call(&app, "GET", "/api/books?limit=3&page=3", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["meta"]["page"], 3);

    let (_, body) = call(&app, "GET", "/api/books?search=odd%20author&sort=year", None).await;
    let years: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["year"].as_i64().unwrap())
        .collect();
    assert_eq!(years, vec![2001, 2003, 2005]);
    assert_eq!(body["meta"]["total"], 3);

    let (_, body) = call(&app, "GET", "/api/books?year=2004", None).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Book 4");

    let (status, _) = call(&app, "GET", "/api/books?sort=isbn", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

async fn missing_ids_scenario(app: Router) {
    for id in ["999", "not-a-number"] {
        let (status, body) = call(&app, "GET", &format!("/api/books/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "GET {id}");
        assert_eq!(body, json!({"message": "Book not found."}));

        let (status, _) = call(&app, "PUT", &format!("/api/books/{id}"), Some(json!({"title": "x"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "PUT {id}");

        let (status, _) = call(&app, "DELETE", &format!("/api/books/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "DELETE {id}");
    }
}

async fn huge_page_scenario(app: Router) {
    call(&app, "POST", "/api/books", Some(json!({"title": "Only"}))).await;

    let (status, body) = call(&app, "GET", "/api/books?page=100000000000000000&limit=100", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("out of range"));

    // Far past the end but still addressable: an empty page, not an error.
    let (status, body) = call(&app, "GET", "/api/books?page=1000000&limit=100", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["meta"]["total"], 1);
}

async fn wildcard_search_scenario(app: Router) {
    for title in ["Dune", "100% Rust"] {
        call(&app, "POST", "/api/books", Some(json!({"title": title}))).await;
    }

    for (term, expected) in [("%25", 1), ("D_ne", 0), ("_", 0), ("dUnE", 1), ("%25%20rust", 1)] {
        let (status, body) = call(&app, "GET", &format!("/api/books?search={term}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["total"], expected, "search={term}");
    }
}

#[tokio::test]
async fn memory_huge_page() {
    huge_page_scenario(memory_app().await).await;
}

#[tokio::test]
async fn sqlite_huge_page() {
    huge_page_scenario(sqlite_app().await).await;
}

#[tokio::test]
async fn memory_wildcard_search() {
    wildcard_search_scenario(memory_app().await).await;
}

#[tokio::test]
async fn sqlite_wildcard_search() {
    wildcard_search_scenario(sqlite_app().await).await;
}

#[tokio::test]
async fn memory_create_get_delete() {
    create_get_delete_scenario(memory_app().await).await;
}

#[tokio::test]
async fn sqlite_create_get_delete() {
    create_get_delete_scenario(sqlite_app().await).await;
}

#[tokio::test]
async fn memory_create_update_get() {
    create_update_get_scenario(memory_app().await).await;
}

#[tokio::test]
async fn sqlite_create_update_get() {
    create_update_get_scenario(sqlite_app().await).await;
}

#[tokio::test]
async fn memory_list_paging_search_and_sort() {
    list_scenario(memory_app().await).await;
}

#[tokio::test]
async fn sqlite_list_paging_search_and_sort() {
    list_scenario(sqlite_app().await).await;
}

#[tokio::test]
async fn memory_missing_ids() {
    missing_ids_scenario(memory_app().await).await;
}

#[tokio::test]
async fn sqlite_missing_ids() {
    missing_ids_scenario(sqlite_app().await).await;
}

#[tokio::test]
async fn partial_create_stores_nulls() {
    let app = memory_app().await;

    let (status, body) = call(&app, "POST", "/api/books", Some(json!({"title": "Only a title"}))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["newBook"]["title"], "Only a title");
    assert_eq!(body["newBook"]["author"], Value::Null);
    assert_eq!(body["newBook"]["year"], Value::Null);
}

#[tokio::test]
async fn module_health_and_docs_are_mounted() {
    let app = memory_app().await;

    let response = app
        .clone()
        .oneshot(Request::get("/api/books/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, doc) = call(&app, "GET", "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/books"]["get"].is_object());
    assert!(doc["paths"]["/api/books/{id}"]["delete"].is_object());
}
