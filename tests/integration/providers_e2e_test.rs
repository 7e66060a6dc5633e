//! End-to-end pipeline test against HTTP stand-ins for OpenAI, Replicate and
//! the transient output host.
//!
//! Exercises the real provider clients (request shapes, polling, buffering)
//! while keeping object storage in memory.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{bearer_token, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cartoonist_app::{create_app, Services};
use cartoonist_common::Config;
use cartoonist_llm::{LlmConfig, LlmServiceFactory};
use cartoonist_render::{RenderConfig, RenderServiceFactory};
use cartoonist_storage::mock::MockBlobStore;

const PUBLIC_BASE_URL: &str = "https://pub-cartoons.r2.dev/";
const IMAGE_BYTES: &[u8] = b"RIFF\x1a\x00\x00\x00WEBPVP8L";

struct Upstreams {
    openai: MockServer,
    replicate: MockServer,
    delivery: MockServer,
}

impl Upstreams {
    async fn start() -> Self {
        Self {
            openai: MockServer::start().await,
            replicate: MockServer::start().await,
            delivery: MockServer::start().await,
        }
    }

    async fn mount_openai(&self) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(bearer_token("sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "temperature": 1.0,
                "response_format": {
                    "type": "json_schema",
                    "json_schema": {"name": "cartoon", "strict": true}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "model": "gpt-4o-2024-08-06",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": "{\"imagePrompt\":\"Uncle Sam building a wall of price tags\"}",
                        "refusal": null
                    },
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 60, "completion_tokens": 14, "total_tokens": 74}
            })))
            .expect(1)
            .mount(&self.openai)
            .await;
    }

    async fn mount_delivery(&self) {
        Mock::given(method("GET"))
            .and(path("/xezq/out-0.webp"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/webp")
                    .set_body_bytes(IMAGE_BYTES.to_vec()),
            )
            .expect(1)
            .mount(&self.delivery)
            .await;
    }

    fn output_url(&self) -> String {
        format!("{}/xezq/out-0.webp", self.delivery.uri())
    }
}

fn services(upstreams: &Upstreams, blobs: &MockBlobStore, render_timeout: Duration) -> Services {
    let llm = LlmServiceFactory::create(LlmConfig {
        provider: "openai".to_string(),
        api_key: "sk-test".to_string(),
        default_model: "gpt-4o".to_string(),
        max_tokens: 1024,
        base_url: Some(upstreams.openai.uri()),
        timeout: Duration::from_secs(5),
    })
    .unwrap();

    let render_config = RenderConfig {
        provider: "replicate".to_string(),
        api_token: "r8_test".to_string(),
        model: "black-forest-labs/flux-1.1-pro".to_string(),
        base_url: Some(upstreams.replicate.uri()),
        timeout: render_timeout,
        poll_interval: Duration::from_millis(20),
        fetch_timeout: Duration::from_secs(5),
    };
    let fetcher = RenderServiceFactory::create_fetcher(&render_config).unwrap();
    let render = RenderServiceFactory::create(render_config).unwrap();

    Services {
        llm: Arc::from(llm),
        render: Arc::from(render),
        fetcher: Arc::from(fetcher),
        blobs: Arc::new(blobs.clone()),
    }
}

fn config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        database_acquire_timeout_secs: 5,
        public_bucket_base_url: PUBLIC_BASE_URL.to_string(),
        cors_allowed_origins: None,
        port: 0,
    }
}

async fn post_generate(router: axum::Router, prompt: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::post("/generate")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "prompt": prompt }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_tariffs_through_blocking_prediction() {
    let upstreams = Upstreams::start().await;
    upstreams.mount_openai().await;
    upstreams.mount_delivery().await;

    Mock::given(method("POST"))
        .and(path("/v1/models/black-forest-labs/flux-1.1-pro/predictions"))
        .and(header("Prefer", "wait=30"))
        .and(body_partial_json(json!({
            "input": {
                "prompt": "simple black and white cartoon drawing of Uncle Sam building a wall of price tags, black and white political cartoon",
                "width": 1024,
                "height": 1024,
                "output_format": "webp",
                "output_quality": 100,
                "prompt_upsampling": true
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "pred-1",
            "status": "succeeded",
            "output": upstreams.output_url()
        })))
        .expect(1)
        .mount(&upstreams.replicate)
        .await;

    let blobs = MockBlobStore::new();
    let pool = cartoonist_cartoons::connect_in_memory().await.unwrap();
    let router = create_app(
        &config(),
        pool.clone(),
        services(&upstreams, &blobs, Duration::from_secs(30)),
    )
    .unwrap();

    let (status, body) = post_generate(router, "tariffs").await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(
        body["debug"]["imagePrompt"],
        "Uncle Sam building a wall of price tags"
    );

    let url = body["data"].as_str().unwrap();
    let key = url.strip_prefix(PUBLIC_BASE_URL).unwrap();
    assert!(key.ends_with(".webp"));
    assert_eq!(blobs.get(key).unwrap().data.as_ref(), IMAGE_BYTES);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM image WHERE key = ?1")
        .bind(key)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_prediction_that_needs_polling() {
    let upstreams = Upstreams::start().await;
    upstreams.mount_openai().await;
    upstreams.mount_delivery().await;

    Mock::given(method("POST"))
        .and(path("/v1/models/black-forest-labs/flux-1.1-pro/predictions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "pred-2",
            "status": "processing"
        })))
        .mount(&upstreams.replicate)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/predictions/pred-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pred-2",
            "status": "succeeded",
            "output": [upstreams.output_url()]
        })))
        .mount(&upstreams.replicate)
        .await;

    let blobs = MockBlobStore::new();
    let pool = cartoonist_cartoons::connect_in_memory().await.unwrap();
    let router = create_app(
        &config(),
        pool,
        services(&upstreams, &blobs, Duration::from_secs(10)),
    )
    .unwrap();

    let (status, _) = post_generate(router, "tariffs").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(blobs.object_count(), 1);
}

#[tokio::test]
async fn test_stuck_prediction_times_out_without_side_effects() {
    let upstreams = Upstreams::start().await;
    upstreams.mount_openai().await;

    Mock::given(method("POST"))
        .and(path("/v1/models/black-forest-labs/flux-1.1-pro/predictions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "pred-3",
            "status": "starting"
        })))
        .mount(&upstreams.replicate)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/predictions/pred-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pred-3",
            "status": "processing"
        })))
        .mount(&upstreams.replicate)
        .await;

    let blobs = MockBlobStore::new();
    let pool = cartoonist_cartoons::connect_in_memory().await.unwrap();
    let router = create_app(
        &config(),
        pool.clone(),
        services(&upstreams, &blobs, Duration::from_millis(300)),
    )
    .unwrap();

    let (status, body) = post_generate(router, "tariffs").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["code"], "UPSTREAM_IMAGE_MODEL_ERROR");
    assert!(blobs.put_keys().is_empty());

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM image")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}
