//! POST /generate integration tests

use axum::http::{Method, StatusCode};
use serde_json::json;

use cartoonist_cartoons::pipeline::expander::SYSTEM_PROMPT;
use cartoonist_cartoons::pipeline::synthesizer::styled_prompt;
use cartoonist_llm::mock::MockLlmOutcome;
use cartoonist_render::mock::{MockOutcome, MOCK_WEBP};

use crate::common::{json_request, key_of, raw_request, TestApp, IMAGE_PROMPT, PUBLIC_BASE_URL};

mod test_successful_generation {
    use super::*;

    #[tokio::test]
    async fn test_tariffs_scenario_returns_public_url_and_prompt() {
        let app = TestApp::new().await.unwrap();

        let (status, body) = app.generate("tariffs").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["debug"]["imagePrompt"], IMAGE_PROMPT);

        let url = body["data"].as_str().unwrap();
        let key = key_of(url);
        let (stem, ext) = key.split_once('.').unwrap();
        assert_eq!(ext, "webp");
        assert_eq!(stem.len(), 36);
        assert_eq!(stem.matches('-').count(), 4);
        assert!(url.starts_with(PUBLIC_BASE_URL));
    }

    #[tokio::test]
    async fn test_stored_bytes_back_the_catalog_row() {
        let app = TestApp::new().await.unwrap();

        let (_, body) = app.generate("tariffs").await;
        let key = key_of(body["data"].as_str().unwrap());

        let object = app.blobs.get(&key).expect("object stored under returned key");
        assert_eq!(object.data.as_ref(), MOCK_WEBP);
        assert_eq!(object.metadata.content_type, "image/webp");
        assert_eq!(object.metadata.content_disposition, "inline");

        let catalog = app.catalog();
        assert_eq!(catalog.count().await.unwrap(), 1);
        assert!(catalog.find_by_key(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upstream_calls_carry_fixed_instructions() {
        let app = TestApp::new().await.unwrap();

        app.generate("  tariffs  ").await;

        let llm_request = &app.llm.recorded_requests()[0];
        assert_eq!(llm_request.system_prompt.as_deref(), Some(SYSTEM_PROMPT));
        assert_eq!(
            llm_request.messages[0].content,
            "Generate image prompt for the following text: tariffs"
        );

        let render_request = &app.render.recorded_requests()[0];
        assert_eq!(render_request.prompt, styled_prompt(IMAGE_PROMPT));
        assert_eq!((render_request.width, render_request.height), (1024, 1024));
        assert_eq!(render_request.output_quality, 100);
    }

    #[tokio::test]
    async fn test_repeated_topic_mints_new_key() {
        let app = TestApp::new().await.unwrap();

        let (_, first) = app.generate("tariffs").await;
        let (_, second) = app.generate("tariffs").await;

        assert_ne!(first["data"], second["data"]);
        assert_eq!(app.catalog().count().await.unwrap(), 2);
        assert_eq!(app.blobs.object_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_never_collide() {
        let app = std::sync::Arc::new(TestApp::new().await.unwrap());
        // Keep renders in flight long enough for the runs to overlap
        app.render.behavior().set_delay_ms(20);

        let handles: Vec<_> = (0..12)
            .map(|i| {
                let app = app.clone();
                tokio::spawn(async move { app.generate(&format!("topic {}", i)).await })
            })
            .collect();

        let mut urls = std::collections::HashSet::new();
        for handle in handles {
            let (status, body) = handle.await.unwrap();
            assert_eq!(status, StatusCode::OK);
            urls.insert(body["data"].as_str().unwrap().to_string());
        }

        assert_eq!(urls.len(), 12);
        assert_eq!(app.catalog().count().await.unwrap(), 12);
    }
}

mod test_validation {
    use super::*;

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_upstream_calls() {
        let app = TestApp::new().await.unwrap();

        for prompt in ["", "   ", "\n\t"] {
            let (status, body) = app.generate(prompt).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }

        assert_eq!(app.llm.call_count(), 0);
        assert_eq!(app.render.call_count(), 0);
        assert_eq!(app.catalog().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_prompt_field() {
        let app = TestApp::new().await.unwrap();
        let (status, body) = app
            .send(json_request(Method::POST, "/generate", json!({"topic": "x"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let app = TestApp::new().await.unwrap();
        let (status, body) = app
            .send(raw_request(Method::POST, "/generate", "{\"prompt\":"))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(app.llm.call_count(), 0);
    }
}

mod test_stage_failures {
    use super::*;

    #[tokio::test]
    async fn test_language_model_failure_is_bad_gateway() {
        let app = TestApp::new().await.unwrap();
        app.llm.set_outcome(MockLlmOutcome::Fail);

        let (status, body) = app.generate("tariffs").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "UPSTREAM_LANGUAGE_MODEL_ERROR");
        assert_eq!(app.render.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_structured_output() {
        let app = TestApp::new().await.unwrap();
        app.llm
            .set_outcome(MockLlmOutcome::Reply("{\"caption\":\"nope\"}".to_string()));

        let (status, body) = app.generate("tariffs").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "UPSTREAM_LANGUAGE_MODEL_ERROR");
    }

    #[tokio::test]
    async fn test_synthesis_failure_writes_nothing() {
        let app = TestApp::new().await.unwrap();
        app.render.behavior().set_outcome(MockOutcome::Fail);

        let (status, body) = app.generate("tariffs").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "UPSTREAM_IMAGE_MODEL_ERROR");
        assert!(app.fetcher.fetched_urls().is_empty());
        assert!(app.blobs.put_keys().is_empty());
        assert_eq!(app.catalog().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_synthesis_timeout_is_gateway_timeout() {
        let app = TestApp::new().await.unwrap();
        app.generate("before").await;
        app.render.behavior().set_outcome(MockOutcome::Timeout);

        let (status, body) = app.generate("tariffs").await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"]["code"], "UPSTREAM_IMAGE_MODEL_ERROR");
        assert_eq!(app.catalog().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expired_artifact_url() {
        let app = TestApp::new().await.unwrap();
        app.fetcher.set_failure_status(Some(404));

        let (status, body) = app.generate("tariffs").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "ARTIFACT_RETRIEVAL_ERROR");
        assert!(app.blobs.put_keys().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_skips_catalog() {
        let app = TestApp::new().await.unwrap();
        app.blobs.set_failure(Some("AccessDenied".to_string()));

        let (status, body) = app.generate("tariffs").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "STORAGE_WRITE_ERROR");
        assert_eq!(app.catalog().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_catalog_failure_reports_metadata_write() {
        let app = TestApp::new().await.unwrap();
        sqlx::query("DROP TABLE image")
            .execute(&app.pool)
            .await
            .unwrap();

        let (status, body) = app.generate("tariffs").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "METADATA_WRITE_ERROR");
        assert!(!body.to_string().contains(PUBLIC_BASE_URL));
        assert_eq!(app.blobs.object_count(), 1);
    }
}
