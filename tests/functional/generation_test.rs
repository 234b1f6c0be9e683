//! Functional tests for text-to-image generation

use axum::{body::Body, http::{Request, StatusCode}};
use serde_json::json;
use text2img_gateway::backend::InferenceOutput;

use crate::common::*;

#[tokio::test]
async fn test_flux_returns_png() {
    let backend = MockBackend::images();
    let app = app(backend.clone());

    let response = send(
        &app,
        post_json("/", json!({ "prompt": "cat", "model": "flux-1-schnell" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(response.headers()["x-used-model"], "flux-1-schnell");
    assert_eq!(
        response.headers()["x-image-bytes"],
        TINY_PNG.len().to_string().as_str()
    );
    assert!(response.headers().get("x-server-seconds").is_some());
    // Flux inputs carry no seed
    assert!(response.headers().get("x-seed").is_none());
    assert_eq!(body_bytes(response).await, TINY_PNG);

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, FLUX_KEY);
    assert_eq!(calls[0].1, json!({ "prompt": "cat", "steps": 6 }));
}

#[tokio::test]
async fn test_flux_steps_are_clamped() {
    for (requested, expected) in [(1, 4), (4, 4), (5, 5), (8, 8), (30, 8)] {
        let backend = MockBackend::images();
        let app = app(backend.clone());

        let response = send(
            &app,
            post_json(
                "/",
                json!({ "prompt": "cat", "model": "flux-1-schnell", "num_steps": requested }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(backend.image_calls()[0]["steps"], expected, "{}", requested);
    }
}

#[tokio::test]
async fn test_unknown_model_is_rejected_before_calls() {
    let backend = MockBackend::images();
    let app = app(backend.clone());

    let response = send(&app, post_json("/", json!({ "prompt": "cat", "model": "dall-e-3" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "Model is invalid" }));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_missing_fields() {
    let backend = MockBackend::images();
    let app = app(backend.clone());

    for body in [json!({ "prompt": "cat" }), json!({ "model": "flux-1-schnell" })] {
        let response = send(&app, post_json("/", body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Missing required parameter: prompt or model"
        );
    }
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_body() {
    let app = app(MockBackend::images());

    let response = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("{\"prompt\": "))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid JSON body");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_text_to_image_defaults() {
    let backend = MockBackend::images();
    let app = app(backend.clone());

    let response = send(
        &app,
        post_json(
            "/any/path",
            json!({ "prompt": "", "model": "stable-diffusion-xl-base-1.0", "seed": 42 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-seed"], "42");
    assert_eq!(body_bytes(response).await, TINY_PNG);

    let calls = backend.calls();
    assert_eq!(calls[0].0, "@cf/stabilityai/stable-diffusion-xl-base-1.0");
    assert_eq!(
        calls[0].1,
        json!({
            "prompt": "cyberpunk cat",
            "negative_prompt": "",
            "height": 1024,
            "width": 1024,
            "num_steps": 20,
            "strength": 0.1,
            "guidance": 7.5,
            "seed": 42
        })
    );
}

#[tokio::test]
async fn test_random_seed_when_absent() {
    let backend = MockBackend::images();
    let app = app(backend.clone());

    let response = send(
        &app,
        post_json("/", json!({ "prompt": "cat", "model": "dreamshaper-8-lcm" })),
    )
    .await;
    let header_seed: u64 = response.headers()["x-seed"].to_str().unwrap().parse().unwrap();
    let sent_seed = backend.image_calls()[0]["seed"].as_u64().unwrap();
    assert_eq!(header_seed, sent_seed);
    assert!(sent_seed < 1024 * 1024);
}

#[tokio::test]
async fn test_batch_offsets_seeds() {
    let backend = MockBackend::images();
    let app = app(backend.clone());

    let response = send(
        &app,
        post_json(
            "/",
            json!({
                "prompt": "cat",
                "model": "dreamshaper-8-lcm",
                "seed": 100,
                "num_outputs": 3
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-used-model"], "dreamshaper-8-lcm");
    assert!(response.headers().get("x-image-bytes").is_none());

    let body = body_json(response).await;
    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 3);
    for image in images {
        assert!(image.as_str().unwrap().starts_with("data:image/png;base64,"));
    }

    let mut seeds: Vec<u64> = backend
        .image_calls()
        .iter()
        .map(|c| c["seed"].as_u64().unwrap())
        .collect();
    seeds.sort_unstable();
    assert_eq!(seeds, vec![100, 101, 102]);
}

#[tokio::test]
async fn test_batch_size_is_clamped() {
    for (requested, expected) in [(json!(0), 1), (json!(8), 8), (json!(20), 8), (json!("2"), 2)] {
        let backend = MockBackend::images();
        let app = app(backend.clone());

        let response = send(
            &app,
            post_json(
                "/",
                json!({ "prompt": "cat", "model": "flux-1-schnell", "num_outputs": requested }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(backend.image_calls().len(), expected);
    }
}

#[tokio::test]
async fn test_opaque_seed_is_not_offset() {
    let backend = MockBackend::images();
    let app = app(backend.clone());

    let response = send(
        &app,
        post_json(
            "/",
            json!({
                "prompt": "cat",
                "model": "dreamshaper-8-lcm",
                "seed": "lucky",
                "num_outputs": 2
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    for call in backend.image_calls() {
        assert_eq!(call["seed"], "lucky");
    }
}

#[tokio::test]
async fn test_upstream_failure_fails_whole_batch() {
    let backend = MockBackend::failing("capacity exceeded");
    let app = app(backend.clone());

    let response = send(
        &app,
        post_json(
            "/",
            json!({ "prompt": "cat", "model": "flux-1-schnell", "num_outputs": 4 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({
            "error": "Image generation failed",
            "details": "capacity exceeded",
            "model": "flux-1-schnell"
        })
    );
}

#[tokio::test]
async fn test_malformed_upstream_response() {
    let backend = MockBackend::new(|_, _| Ok(InferenceOutput::Json(json!({ "nothing": true }))));
    let app = app(backend);

    let response = send(
        &app,
        post_json("/", json!({ "prompt": "cat", "model": "flux-1-schnell" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({
            "error": "Invalid response format",
            "details": "Image data not found in response"
        })
    );
}

#[tokio::test]
async fn test_prompts_are_translated() {
    let backend = MockBackend::new(|key, inputs| {
        if key == TRANSLATE_KEY {
            let user = inputs["messages"][1]["content"].as_str().unwrap_or_default();
            let translated = if user.contains("可爱的猫") { "a cute cat" } else { "blurry" };
            return Ok(InferenceOutput::Json(json!({ "response": translated })));
        }
        Ok(InferenceOutput::Binary(TINY_PNG.to_vec()))
    });
    let mut settings = test_settings();
    settings.translation.enabled = true;
    let app = app_with(settings, backend.clone());

    let response = send(
        &app,
        post_json(
            "/",
            json!({
                "prompt": "可爱的猫",
                "negative_prompt": "模糊",
                "model": "stable-diffusion-xl-lightning"
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let calls = backend.image_calls();
    assert_eq!(calls[0]["prompt"], "a cute cat");
    assert_eq!(calls[0]["negative_prompt"], "blurry");
}

#[tokio::test]
async fn test_translation_failure_keeps_original() {
    let backend = MockBackend::new(|key, _| {
        if key == TRANSLATE_KEY {
            return Err(text2img_gateway::AppError::BackendResponse("down".into()));
        }
        Ok(InferenceOutput::Binary(TINY_PNG.to_vec()))
    });
    let mut settings = test_settings();
    settings.translation.enabled = true;
    let app = app_with(settings, backend.clone());

    let response = send(
        &app,
        post_json("/", json!({ "prompt": "可爱的猫", "model": "dreamshaper-8-lcm" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.image_calls()[0]["prompt"], "可爱的猫");
}

#[tokio::test]
async fn test_ascii_prompt_skips_translation() {
    let backend = MockBackend::images();
    let mut settings = test_settings();
    settings.translation.enabled = true;
    let app = app_with(settings, backend.clone());

    send(
        &app,
        post_json("/", json!({ "prompt": "a red fox", "model": "flux-1-schnell" })),
    )
    .await;
    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, FLUX_KEY);
}

#[tokio::test]
async fn test_invalid_numeric_seed_is_rejected() {
    let backend = MockBackend::images();
    let app = app(backend.clone());

    for seed in [json!(-5), json!(2.5), json!("-1"), json!(u64::MAX)] {
        let response = send(
            &app,
            post_json(
                "/",
                json!({ "prompt": "cat", "model": "dreamshaper-8-lcm", "seed": seed }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", seed);
        assert!(body_json(response).await["error"]
            .as_str()
            .unwrap()
            .starts_with("seed must be a whole number"));
    }
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_largest_seed_offsets_exactly() {
    let backend = MockBackend::images();
    let app = app(backend.clone());
    let max = (1u64 << 53) - 1;

    let response = send(
        &app,
        post_json(
            "/",
            json!({
                "prompt": "cat",
                "model": "dreamshaper-8-lcm",
                "seed": max,
                "num_outputs": 2
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut seeds: Vec<u64> = backend
        .image_calls()
        .iter()
        .map(|c| c["seed"].as_u64().unwrap())
        .collect();
    seeds.sort_unstable();
    assert_eq!(seeds, vec![max, max + 1]);
}
