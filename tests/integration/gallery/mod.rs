//! GET /images integration tests

use axum::http::StatusCode;

use crate::common::{key_of, TestApp, PUBLIC_BASE_URL};

#[tokio::test]
async fn test_empty_gallery() {
    let app = TestApp::new().await.unwrap();

    let (status, body) = app.list_images("").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_gallery_lists_generated_images_newest_first() {
    let app = TestApp::new().await.unwrap();
    let mut keys = Vec::new();
    for topic in ["tariffs", "elections", "weather"] {
        let (_, body) = app.generate(topic).await;
        keys.push(key_of(body["data"].as_str().unwrap()));
    }

    let (status, body) = app.list_images("").await;
    assert_eq!(status, StatusCode::OK);

    let items = body["data"].as_array().unwrap();
    let listed: Vec<&str> = items.iter().map(|i| i["key"].as_str().unwrap()).collect();
    keys.reverse();
    assert_eq!(listed, keys.iter().map(String::as_str).collect::<Vec<_>>());

    for item in items {
        assert!(item["id"].as_i64().unwrap() > 0);
        assert_eq!(
            item["url"].as_str().unwrap(),
            format!("{}/{}", PUBLIC_BASE_URL, item["key"].as_str().unwrap())
        );
    }
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn test_gallery_size_matches_committed_rows() {
    let app = TestApp::new().await.unwrap();
    app.generate("one").await;
    app.blobs.set_failure(Some("bucket unavailable".to_string()));
    app.generate("two").await;

    let (_, body) = app.list_images("").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_gallery_pagination() {
    let app = TestApp::new().await.unwrap();
    for i in 0..5 {
        app.generate(&format!("topic {}", i)).await;
    }

    let (_, all) = app.list_images("").await;
    let (status, page) = app.list_images("limit=2&offset=1").await;

    assert_eq!(status, StatusCode::OK);
    let page_items = page["data"].as_array().unwrap();
    assert_eq!(page_items.len(), 2);
    assert_eq!(page_items[0]["id"], all["data"][1]["id"]);
    assert_eq!(page_items[1]["id"], all["data"][2]["id"]);
    assert_eq!(page["total"], 5);
}

#[tokio::test]
async fn test_gallery_limit_is_capped() {
    let app = TestApp::new().await.unwrap();
    app.generate("one").await;

    let (status, body) = app.list_images("limit=10000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_gallery_read_failure() {
    let app = TestApp::new().await.unwrap();
    sqlx::query("DROP TABLE image")
        .execute(&app.pool)
        .await
        .unwrap();

    let (status, body) = app.list_images("").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "METADATA_READ_ERROR");
}

#[tokio::test]
async fn test_malformed_pagination_is_validation_error() {
    let app = TestApp::new().await.unwrap();

    for query in ["limit=abc", "offset=-3", "limit=0"] {
        let (status, body) = app.list_images(query).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query: {}", query);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "query: {}", query);
    }
}
