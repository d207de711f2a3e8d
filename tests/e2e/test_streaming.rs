use crate::helpers::TestContext;
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use speechpipe_backend::domain::speech::silence;
use std::time::Duration;

#[tokio::test]
async fn it_should_stream_chunks_in_original_order() {
    let ctx = TestContext::new().await.unwrap();
    // later chunks complete first; the emitter must still hold order
    ctx.synthesis.delay("S one.", Duration::from_millis(60));
    ctx.synthesis.delay("S two.", Duration::from_millis(30));
    ctx.synthesis.delay("S three.", Duration::from_millis(5));

    let response = ctx
        .client
        .post(
            "/v1/audio/speech",
            &json!({
                "input": "S zero. S one. S two. S three.",
                "voice": "alloy",
                "stream": true,
                "chunk_size": 5
            }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    response.assert_header("content-type", "audio/mpeg");
    assert_eq!(response.body_bytes, b"S zero.S one.S two.S three.".to_vec());
}

#[tokio::test]
async fn it_should_stream_silence_for_failed_chunks() {
    let ctx = TestContext::new().await.unwrap();
    ctx.synthesis.fail_always("Bad two.");

    let response = ctx
        .client
        .post(
            "/v1/audio/speech",
            &json!({
                "input": "Good one. Bad two. Good three.",
                "voice": "alloy",
                "stream": true,
                "chunk_size": 6
            }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);

    let mut expected = Vec::new();
    expected.extend_from_slice(b"Good one.");
    expected.extend_from_slice(&silence::fallback_clip());
    expected.extend_from_slice(b"Good three.");
    assert_eq!(response.body_bytes, expected);
}

#[tokio::test]
async fn it_should_accept_a_custom_sync_chunk_count() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .client
        .post(
            "/v1/audio/speech",
            &json!({
                "input": "Part one. Part two. Part three. Part four.",
                "voice": "alloy",
                "stream": true,
                "chunk_size": 6,
                "sync_chunks": 2
            }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.body_bytes,
        b"Part one.Part two.Part three.Part four.".to_vec()
    );
}

#[tokio::test]
async fn it_should_stream_a_single_chunk_input() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .client
        .post(
            "/v1/audio/speech",
            &json!({
                "input": "Just one short sentence.",
                "voice": "alloy",
                "stream": true
            }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.body_bytes, b"Just one short sentence.".to_vec());
}
