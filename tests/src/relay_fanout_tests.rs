use crate::utils::{
    body_string, github_push, relay_app, spawn_upstream, RelaySetup, TEST_SECRET,
};
use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

fn push_body() -> String {
    json!({ "head_commit": { "committer": { "username": "alice" } } }).to_string()
}

#[tokio::test]
async fn test_every_upstream_receives_exactly_one_send() -> Result<()> {
    let one = spawn_upstream(StatusCode::OK, "first", "one").await?;
    let two = spawn_upstream(StatusCode::OK, "second", "two").await?;

    let app = relay_app(RelaySetup {
        provider: "github",
        secret: TEST_SECRET,
        upstreams: vec![one.url.clone(), two.url.clone()],
        ..Default::default()
    })?;

    let response = app
        .oneshot(github_push("/github-webhook/", TEST_SECRET, &push_body()))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-server-id"], "one");
    assert_eq!(body_string(response).await?, "first");
    assert_eq!(one.hits(), 1);
    assert_eq!(two.hits(), 1);
    Ok(())
}

#[tokio::test]
async fn test_first_success_after_failure_is_returned() -> Result<()> {
    let failing = spawn_upstream(StatusCode::INTERNAL_SERVER_ERROR, "boom", "one").await?;
    let healthy = spawn_upstream(StatusCode::OK, "ok", "two").await?;

    let app = relay_app(RelaySetup {
        provider: "github",
        secret: TEST_SECRET,
        upstreams: vec![failing.url.clone(), healthy.url.clone()],
        ..Default::default()
    })?;

    let response = app
        .oneshot(github_push("/hook", TEST_SECRET, &push_body()))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-server-id"], "two");
    assert_eq!(body_string(response).await?, "ok");
    assert_eq!(failing.hits(), 1);
    Ok(())
}

#[tokio::test]
async fn test_all_upstreams_failing_is_500() -> Result<()> {
    let one = spawn_upstream(StatusCode::INTERNAL_SERVER_ERROR, "boom", "one").await?;
    let two = spawn_upstream(StatusCode::NOT_FOUND, "missing", "two").await?;

    let app = relay_app(RelaySetup {
        provider: "github",
        secret: TEST_SECRET,
        upstreams: vec![one.url.clone(), two.url.clone()],
        ..Default::default()
    })?;

    let response = app
        .oneshot(github_push("/hook", TEST_SECRET, &push_body()))
        .await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.headers().contains_key("x-server-id"));
    assert_eq!(body_string(response).await?, "All upstream requests failed");
    assert_eq!(one.hits(), 1);
    assert_eq!(two.hits(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_upstream_does_not_block_others() -> Result<()> {
    let healthy = spawn_upstream(StatusCode::ACCEPTED, "queued", "two").await?;

    let app = relay_app(RelaySetup {
        provider: "github",
        secret: TEST_SECRET,
        upstreams: vec!["http://127.0.0.1:9".into(), healthy.url.clone()],
        ..Default::default()
    })?;

    let response = app
        .oneshot(github_push("/hook", TEST_SECRET, &push_body()))
        .await?;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_string(response).await?, "queued");
    assert_eq!(healthy.hits(), 1);
    Ok(())
}

#[tokio::test]
async fn test_redirect_status_is_elected() -> Result<()> {
    let one = spawn_upstream(StatusCode::BAD_REQUEST, "nope", "one").await?;
    let two = spawn_upstream(StatusCode::NOT_MODIFIED, "", "two").await?;
    let three = spawn_upstream(StatusCode::OK, "ok", "three").await?;

    let app = relay_app(RelaySetup {
        provider: "github",
        secret: TEST_SECRET,
        upstreams: vec![one.url.clone(), two.url.clone(), three.url.clone()],
        ..Default::default()
    })?;

    let response = app
        .oneshot(github_push("/hook", TEST_SECRET, &push_body()))
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(response.headers()["x-server-id"], "two");
    assert_eq!(three.hits(), 1);
    Ok(())
}

#[tokio::test]
async fn test_delivery_replayed_unchanged() -> Result<()> {
    let upstream = spawn_upstream(StatusCode::OK, "ok", "one").await?;

    let app = relay_app(RelaySetup {
        provider: "github",
        secret: TEST_SECRET,
        upstreams: vec![upstream.url.clone()],
        ..Default::default()
    })?;

    // Odd spacing must survive byte-for-byte for downstream signature checks.
    let body = "{ \"head_commit\" :{\"committer\": {\"username\":\"alice\"}} }\n";
    let request = github_push("/github-webhook/?token=abc&x=1", TEST_SECRET, body);
    let signature = request.headers()["x-hub-signature-256"].clone();

    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let received = upstream.received();
    assert_eq!(received.len(), 1);
    let got = &received[0];
    assert_eq!(got.method, "POST");
    assert_eq!(got.path_and_query, "/github-webhook/?token=abc&x=1");
    assert_eq!(got.body, body.as_bytes());
    assert_eq!(got.headers["x-hub-signature-256"], signature);
    assert_eq!(got.headers["x-github-event"], "push");
    assert_eq!(got.headers["content-type"], "application/json");
    Ok(())
}

#[tokio::test]
async fn test_request_id_overrides_upstream_header() -> Result<()> {
    let upstream = spawn_upstream(StatusCode::OK, "ok", "one").await?;

    let app = relay_app(RelaySetup {
        provider: "github",
        secret: TEST_SECRET,
        upstreams: vec![upstream.url.clone()],
        ..Default::default()
    })?;

    let mut request = github_push("/hook", TEST_SECRET, &push_body());
    request
        .headers_mut()
        .insert("x-request-id", "delivery-42".parse()?);

    let response = app.oneshot(request).await?;
    assert_eq!(response.headers()["x-request-id"], "delivery-42");
    Ok(())
}
