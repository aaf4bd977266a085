//! HTTP-level tests for the Bria client against a local mock server.

use briakit::{
    AspectRatio, BackgroundRemoveRequest, BackgroundReplaceRequest, BriaClient, BriaError, Failure,
    LifestyleShotRequest, Medium, OperationResult, PackshotRequest, PollPolicy,
    ProductBackgroundRemovalRequest, ResultPayload, TextToImageRequest,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string_contains, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-api-key";

fn client_for(server: &MockServer) -> BriaClient {
    BriaClient::builder()
        .api_key(API_KEY)
        .base_url(format!("{}/v1", server.uri()))
        .poll_policy(PollPolicy::new(3, Duration::from_millis(1)))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_packshot_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/product/packshot"))
        .and(header("api_token", API_KEY))
        .and(body_json(json!({
            "image_url": "https://example.com/shoe.png",
            "background_color": "#FFFFFF",
            "force_rmbg": false,
            "content_moderation": false
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"result_url": "https://cdn/out.png"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request =
        PackshotRequest::from_url("https://example.com/shoe.png").with_background_color("#FFFFFF");
    let result = client.create_product_packshot(&request).await.unwrap();

    assert_eq!(
        result,
        OperationResult::Ready(ResultPayload::Urls(vec!["https://cdn/out.png".into()]))
    );
}

#[tokio::test]
async fn test_validation_failure_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let err = client
        .create_product_packshot(&PackshotRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BriaError::InvalidRequest(_)));

    let both = PackshotRequest {
        image_bytes: Some(vec![1, 2, 3]),
        ..PackshotRequest::from_url("https://example.com/shoe.png")
    };
    let err = client.create_product_packshot(&both).await.unwrap_err();
    assert!(matches!(err, BriaError::InvalidRequest(_)));

    let err = client
        .create_lifestyle_shot_by_text(
            &LifestyleShotRequest::new("").with_image_url("https://example.com/mug.png"),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("scene_description"));
}

#[tokio::test]
async fn test_unreachable_input_names_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/product/packshot"))
        .respond_with(ResponseTemplate::new(460).set_body_string("could not download"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .create_product_packshot(&PackshotRequest::from_url("https://private.example/a.png"))
        .await
        .unwrap();

    let failure = result.failure().unwrap();
    assert_eq!(
        failure,
        &Failure::UnreachableInput {
            input: "https://private.example/a.png".into()
        }
    );
    assert!(failure.to_string().contains("https://private.example/a.png"));
}

#[tokio::test]
async fn test_validation_rejected_carries_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/background/replace"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": "Input image contains fully transparent pixels along an edge"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request =
        BackgroundReplaceRequest::new("beach").with_image_url("https://example.com/car.png");
    let result = client.generate_background(&request).await.unwrap();

    match result {
        OperationResult::Failed(Failure::ValidationRejected(detail)) => {
            assert!(detail.contains("fully transparent"));
        }
        other => panic!("expected ValidationRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_remote_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/product/packshot"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .create_product_packshot(&PackshotRequest::from_url("https://example.com/a.png"))
        .await
        .unwrap();

    assert_eq!(
        result,
        OperationResult::Failed(Failure::RemoteError {
            status: 503,
            body: "overloaded".into()
        })
    );
}

#[tokio::test]
async fn test_remove_background_sends_multipart() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/background/remove"))
        .and(header("api_token", API_KEY))
        .and(header_regex("content-type", "^multipart/form-data"))
        .and(body_string_contains("name=\"preserve_partial_alpha\""))
        .and(body_string_contains("filename=\"image.png\""))
        .and(body_string_contains("fake-image-bytes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"result_url": "https://cdn/no-bg.png"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = BackgroundRemoveRequest::from_bytes(b"fake-image-bytes".to_vec());
    let result = client.remove_image_background(&request).await.unwrap();

    assert_eq!(result.urls(), ["https://cdn/no-bg.png".to_string()]);
}

#[tokio::test]
async fn test_async_request_returns_pending() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/product/lifestyle_shot_by_text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                ["https://cdn/a.png", 1234, "sku"],
                ["https://cdn/b.png", 5678, "sku"]
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = LifestyleShotRequest::new("on a beach")
        .with_image_url("https://example.com/mug.png")
        .with_num_results(2);
    let result = client.create_lifestyle_shot_by_text(&request).await.unwrap();

    assert_eq!(
        result,
        OperationResult::Pending(vec!["https://cdn/a.png".into(), "https://cdn/b.png".into()])
    );
}

#[tokio::test]
async fn test_blocked_variants_are_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/background/replace"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [["https://cdn/ok.png"], [""], ["https://cdn/ok2.png"]]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = BackgroundReplaceRequest::new("forest")
        .with_image_url("https://example.com/car.png")
        .with_num_results(3)
        .to_operation()
        .unwrap();
    let normalized = client.execute_detailed(&request).await.unwrap();

    assert_eq!(
        normalized.result.urls(),
        ["https://cdn/ok.png".to_string(), "https://cdn/ok2.png".to_string()]
    );
    assert_eq!(normalized.diagnostics.len(), 1);
    assert_eq!(normalized.diagnostics[0].index, 1);
}

#[tokio::test]
async fn test_inline_file_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/product/remove_background"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"file": "AQID"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .remove_product_background(&ProductBackgroundRemovalRequest::from_url(
            "https://example.com/p.png",
        ))
        .await
        .unwrap();

    assert_eq!(result, OperationResult::Ready(ResultPayload::Bytes(vec![1, 2, 3])));
}

#[tokio::test]
async fn test_wait_for_results_polls_with_head() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/results/a.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/results/b.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let a = format!("{}/results/a.png", server.uri());
    let b = format!("{}/results/b.png", server.uri());

    let state = client.wait_for_results([a.clone(), b.clone()]).await;

    assert_eq!(state.ready(), [a]);
    assert_eq!(state.pending(), [b]);
    assert!(state.is_exhausted());
}

#[tokio::test]
async fn test_download_and_expiry() {
    let server = MockServer::start().await;
    let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    Mock::given(method("GET"))
        .and(path("/results/out.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png.to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/old.png"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let image = client
        .download(&format!("{}/results/out.png", server.uri()))
        .await
        .unwrap();
    assert_eq!(image.data, png.to_vec());
    assert_eq!(image.format, Some(briakit::ImageFormat::Png));
    assert_eq!(image.file_name("fallback"), "out.png");

    let err = client
        .download(&format!("{}/results/old.png", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, BriaError::UrlExpired));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let client = BriaClient::builder()
        .api_key(API_KEY)
        .base_url("http://127.0.0.1:1/v1")
        .build()
        .unwrap();

    let err = client
        .create_product_packshot(&PackshotRequest::from_url("https://example.com/a.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, BriaError::Network(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_text_to_image_grouped_results() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/text-to-image/hd/2.2"))
        .and(header("api_token", API_KEY))
        .and(body_json(json!({
            "prompt": "a ceramic vase on linen",
            "num_results": 2,
            "aspect_ratio": "4:3",
            "medium": "photography",
            "prompt_enhancement": false,
            "enhance_image": true,
            "sync": true,
            "content_moderation": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {"urls": ["https://cdn/a.png"], "seed": 1},
                {"urls": ["https://cdn/b.png"], "seed": 2}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = TextToImageRequest::new("a ceramic vase on linen")
        .with_num_results(2)
        .with_aspect_ratio(AspectRatio::Standard)
        .with_medium(Medium::Photography)
        .with_enhance_image(true);
    let result = client.generate_image(&request).await.unwrap();

    assert_eq!(
        result,
        OperationResult::Ready(ResultPayload::Urls(vec![
            "https://cdn/a.png".into(),
            "https://cdn/b.png".into()
        ]))
    );
}

#[tokio::test]
async fn test_text_to_image_blank_prompt_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .generate_image(&TextToImageRequest::new("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, BriaError::InvalidRequest(_)));

    let err = client.enhance_prompt("").await.unwrap_err();
    assert!(matches!(err, BriaError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_enhance_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/prompt_enhancer"))
        .and(header("api_token", API_KEY))
        .and(body_json(json!({"prompt": "a cat"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "prompt variations": "a fluffy ginger cat asleep on a sunlit windowsill"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let enhanced = client.enhance_prompt("a cat").await.unwrap();

    assert_eq!(enhanced, "a fluffy ginger cat asleep on a sunlit windowsill");
}

#[tokio::test]
async fn test_enhance_prompt_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/prompt_enhancer"))
        .and(body_json(json!({"prompt": "server down"})))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/prompt_enhancer"))
        .and(body_json(json!({"prompt": "html back"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/prompt_enhancer"))
        .and(body_json(json!({"prompt": "no field"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let client = client_for(&server);

    match client.enhance_prompt("server down").await.unwrap_err() {
        BriaError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "internal error");
        }
        other => panic!("expected Api error, got {other:?}"),
    }

    let err = client.enhance_prompt("html back").await.unwrap_err();
    assert!(matches!(err, BriaError::Json(_)));

    let err = client.enhance_prompt("no field").await.unwrap_err();
    assert!(matches!(err, BriaError::Decode(_)));
}
