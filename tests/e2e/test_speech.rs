use crate::helpers::TestContext;
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use speechpipe_backend::domain::speech::silence;

#[tokio::test]
async fn it_should_synthesize_text_to_speech() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .client
        .post(
            "/v1/audio/speech",
            &json!({
                "input": "Hello world. This costs $3.99 today! Thanks.",
                "voice": "alloy"
            }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    response.assert_header("content-type", "audio/mpeg");
    response.assert_header("x-total-chunks", "1");
    response.assert_header("x-failed-chunks", "0");
    response.assert_header_exists("x-synthesis-millis");

    // the scripted client echoes chunk text back as audio
    assert_eq!(
        response.body_bytes,
        b"Hello world. This costs $3.99 today! Thanks.".to_vec()
    );
}

#[tokio::test]
async fn it_should_join_chunks_in_original_order() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .client
        .post(
            "/v1/audio/speech",
            &json!({
                "input": "First part. Second part. Third part.",
                "voice": "alloy",
                "chunk_size": 8
            }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    response.assert_header("x-total-chunks", "3");
    assert_eq!(
        response.body_bytes,
        b"First part.Second part.Third part.".to_vec()
    );
}

#[tokio::test]
async fn it_should_resolve_voice_aliases_before_synthesis() {
    let ctx = TestContext::new().await.unwrap();

    ctx.client
        .post(
            "/v1/audio/speech",
            &json!({ "input": "Hello there.", "voice": "alloy" }),
        )
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    assert_eq!(ctx.synthesis.voices(), vec!["en-US-AriaNeural".to_string()]);

    ctx.client
        .post(
            "/v1/audio/speech",
            &json!({ "input": "Guten Tag.", "voice": "de-DE-KatjaNeural" }),
        )
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    assert!(ctx
        .synthesis
        .voices()
        .contains(&"de-DE-KatjaNeural".to_string()));
}

#[tokio::test]
async fn it_should_reject_empty_input() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .client
        .post(
            "/v1/audio/speech",
            &json!({ "input": "   ", "voice": "alloy" }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_error_message("input");
}

#[tokio::test]
async fn it_should_reject_empty_voice() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .client
        .post(
            "/v1/audio/speech",
            &json!({ "input": "Hello.", "voice": "" }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_error_message("voice");
}

#[tokio::test]
async fn it_should_reject_missing_fields() {
    let ctx = TestContext::new().await.unwrap();

    // missing `voice` fails JSON deserialization before the handler runs
    let response = ctx
        .client
        .post("/v1/audio/speech", &json!({ "input": "Hello." }))
        .await
        .unwrap();

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn it_should_reject_oversized_input() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .client
        .post(
            "/v1/audio/speech",
            &json!({ "input": "a".repeat(10_001), "voice": "alloy" }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn it_should_substitute_silence_for_failed_chunks() {
    let ctx = TestContext::new().await.unwrap();
    ctx.synthesis.fail_always("Bad two.");
    ctx.synthesis.fail_always("Bad four.");

    let response = ctx
        .client
        .post(
            "/v1/audio/speech",
            &json!({
                "input": "Good one. Bad two. Good three. Bad four. Good five.",
                "voice": "alloy",
                "chunk_size": 6,
                "max_concurrent_requests": 2
            }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    response.assert_header("x-total-chunks", "5");
    response.assert_header("x-failed-chunks", "2");

    let silence = silence::fallback_clip();
    let mut expected = Vec::new();
    expected.extend_from_slice(b"Good one.");
    expected.extend_from_slice(&silence);
    expected.extend_from_slice(b"Good three.");
    expected.extend_from_slice(&silence);
    expected.extend_from_slice(b"Good five.");
    assert_eq!(response.body_bytes, expected);
}

#[tokio::test]
async fn it_should_fail_when_every_chunk_fails() {
    let ctx = TestContext::new().await.unwrap();
    ctx.synthesis.fail_always("Doomed text.");

    let response = ctx
        .client
        .post(
            "/v1/audio/speech",
            &json!({ "input": "Doomed text.", "voice": "alloy" }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_error_message("no audio");
}

#[tokio::test]
async fn it_should_respect_the_concurrency_ceiling() {
    let ctx = TestContext::new().await.unwrap();
    let sentences = [
        "Load one.",
        "Load two.",
        "Load three.",
        "Load four.",
        "Load five.",
        "Load six.",
    ];
    for sentence in &sentences {
        ctx.synthesis
            .delay(sentence, std::time::Duration::from_millis(25));
    }

    let response = ctx
        .client
        .post(
            "/v1/audio/speech",
            &json!({
                "input": sentences.join(" "),
                "voice": "alloy",
                "chunk_size": 8,
                "max_concurrent_requests": 2
            }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    response.assert_header("x-total-chunks", "6");
    assert!(
        ctx.synthesis.max_in_flight() <= 2,
        "saw {} concurrent synthesis calls with a ceiling of 2",
        ctx.synthesis.max_in_flight()
    );
}
