use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bookshelf_app::App;
use bookshelf_kernel::settings::Settings;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app_with(settings: Settings) -> Router {
    let app = App::bootstrap(&settings).await.unwrap();
    app.router(&settings)
}

async fn app() -> Router {
    app_with(Settings::default()).await
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn dune() -> Value {
    json!({"title": "Dune", "author": "Herbert", "isbn": "0-441-17271-7"})
}

#[tokio::test]
async fn create_returns_201_with_generated_fields() {
    let router = app().await;

    let (status, body) = send(&router, "POST", "/books", Some(dune())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "success");
    let data = &body["data"];
    assert!(data["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(data["title"], "Dune");
    assert_eq!(data["author"], "Herbert");
    assert_eq!(data["isbn"], "0-441-17271-7");
    assert!(data["createdAt"].is_string());
    assert_eq!(data["createdAt"], data["updatedAt"]);
}

#[tokio::test]
async fn duplicate_title_is_400_with_message() {
    let router = app().await;
    send(&router, "POST", "/books", Some(dune())).await;

    let (status, body) = send(
        &router,
        "POST",
        "/books",
        Some(json!({"title": "Dune", "author": "Someone", "isbn": "0-061-96436-0"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"message": "fail", "error": "A book with the title \"Dune\" already exists."})
    );
}

#[tokio::test]
async fn invalid_payload_is_400_before_touching_the_store() {
    let router = app().await;

    let (status, body) = send(
        &router,
        "POST",
        "/books",
        Some(json!({"title": "Dune", "author": "H", "isbn": "123", "year": 1965})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "fail");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["year", "author", "isbn"]);

    let (status, _) = send(&router, "GET", "/books", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_is_400_envelope() {
    let router = app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "fail");
}

#[tokio::test]
async fn list_is_404_when_empty_then_200() {
    let router = app().await;

    let (status, body) = send(&router, "GET", "/books", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "fail", "error": "No books found"}));

    send(&router, "POST", "/books", Some(dune())).await;
    let (status, body) = send(&router, "GET", "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn empty_list_can_be_configured_as_200() {
    let mut settings = Settings::default();
    settings.books.empty_list_is_error = false;
    let router = app_with(settings).await;

    let (status, body) = send(&router, "GET", "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "success", "data": []}));
}

#[tokio::test]
async fn patch_updates_only_supplied_fields() {
    let router = app().await;
    let (_, created) = send(&router, "POST", "/books", Some(dune())).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &router,
        "PATCH",
        &format!("/books/{id}"),
        Some(json!({"author": "F. Herbert"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["author"], "F. Herbert");
    assert_eq!(data["title"], "Dune");
    assert_eq!(data["isbn"], "0-441-17271-7");
    assert_eq!(data["createdAt"], created["data"]["createdAt"]);
    assert_ne!(data["updatedAt"], created["data"]["updatedAt"]);

    let (_, fetched) = send(&router, "GET", &format!("/books/{id}"), None).await;
    assert_eq!(fetched["data"], *data);
}

#[tokio::test]
async fn patch_validates_and_reports_missing_ids() {
    let router = app().await;

    let (status, body) = send(
        &router,
        "PATCH",
        "/books/missing",
        Some(json!({"isbn": "not-an-isbn"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid ISBN format");

    let (status, body) = send(
        &router,
        "PATCH",
        "/books/missing",
        Some(json!({"author": "Somebody"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Book with ID missing not found");
}

#[tokio::test]
async fn delete_then_get_is_404() {
    let router = app().await;
    let (_, created) = send(&router, "POST", "/books", Some(dune())).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&router, "DELETE", &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "message": "success",
            "data": {"message": format!("Book with ID {id} has been deleted successfully.")}
        })
    );

    let (status, body) = send(&router, "GET", &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], format!("Book with ID {id} not found"));

    let (status, _) = send(&router, "DELETE", &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_docs_and_unknown_routes() {
    let router = app().await;

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, spec) = send(&router, "GET", "/api-docs-json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(spec["info"]["title"], "Book Management API");

    let (status, body) = send(&router, "GET", "/authors", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "fail", "error": "Cannot GET /authors"}));
}

#[tokio::test]
async fn wrong_method_on_known_path_is_enveloped_404() {
    let router = app().await;

    for (method, uri) in [("PUT", "/books/abc"), ("POST", "/books/abc"), ("DELETE", "/books")] {
        let (status, body) = send(&router, method, uri, Some(dune())).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(
            body,
            json!({"message": "fail", "error": format!("Cannot {method} {uri}")})
        );
    }
}

#[tokio::test]
async fn patch_into_taken_title_is_400_duplicate() {
    let router = app().await;
    send(&router, "POST", "/books", Some(dune())).await;
    let (_, emma) = send(
        &router,
        "POST",
        "/books",
        Some(json!({"title": "Emma", "author": "Austen", "isbn": "0-061-96436-0"})),
    )
    .await;
    let id = emma["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &router,
        "PATCH",
        &format!("/books/{id}"),
        Some(json!({"title": "Dune"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"message": "fail", "error": "A book with the title \"Dune\" already exists."})
    );

    let (_, fetched) = send(&router, "GET", &format!("/books/{id}"), None).await;
    assert_eq!(fetched["data"]["title"], "Emma");
}

#[tokio::test]
async fn title_and_author_lengths_are_inclusive() {
    let router = app().await;
    let accepted = [
        ("ab".to_string(), "Herbert".to_string()),
        ("a".repeat(100), "Herbert".to_string()),
        ("Dune".to_string(), "Al".to_string()),
        ("Emma".to_string(), "b".repeat(30)),
    ];
    for (title, author) in accepted {
        let (status, body) = send(
            &router,
            "POST",
            "/books",
            Some(json!({"title": title, "author": author, "isbn": "0-441-17271-7"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (status, body) = send(
        &router,
        "POST",
        "/books",
        Some(json!({"title": "c".repeat(101), "author": "Herbert", "isbn": "0-441-17271-7"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title must be between 2 and 100 characters");

    let (status, body) = send(
        &router,
        "POST",
        "/books",
        Some(json!({"title": "Persuasion", "author": "d".repeat(31), "isbn": "0-441-17271-7"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Author must be between 2 and 30 characters");
}
