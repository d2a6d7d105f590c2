use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use webhook_relay::{create_router, AppState, Relay, RelayConfig, UpstreamClient};

pub const TEST_SECRET: &str = "testSecret";

/// What an upstream saw of one relayed request.
#[derive(Debug, Clone)]
pub struct Received {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// A local upstream receiver bound to an ephemeral port.
pub struct Upstream {
    pub url: String,
    received: Arc<Mutex<Vec<Received>>>,
}

impl Upstream {
    pub fn hits(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

/// Spawn an upstream answering every request with `status` and `body`, plus
/// an `x-server-id` header naming it.
pub async fn spawn_upstream(
    status: StatusCode,
    body: &'static str,
    server_id: &'static str,
) -> Result<Upstream> {
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&received);

    let app = Router::new().fallback(move |request: Request| {
        let log = Arc::clone(&log);
        async move {
            let (parts, payload) = request.into_parts();
            let bytes = to_bytes(payload, usize::MAX).await.unwrap_or_default();
            log.lock().unwrap().push(Received {
                method: parts.method,
                path_and_query: parts
                    .uri
                    .path_and_query()
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
                headers: parts.headers,
                body: bytes.to_vec(),
            });
            (status, [("x-server-id", server_id)], body).into_response()
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(Upstream {
        url: format!("http://{addr}"),
        received,
    })
}

/// Relay settings for one test. Unset lists are empty.
#[derive(Default)]
pub struct RelaySetup<'a> {
    pub provider: &'a str,
    pub secret: &'a str,
    pub upstreams: Vec<String>,
    pub allowed_paths: &'a [&'a str],
    pub ignored_users: &'a [&'a str],
    pub allowed_users: &'a [&'a str],
}

fn set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Build the full router around a relay. The provider name is passed through
/// unchecked so per-request construction failures can be exercised.
pub fn relay_app(setup: RelaySetup<'_>) -> Result<Router> {
    let config = RelayConfig {
        provider: setup.provider.to_string(),
        upstreams: setup.upstreams,
        allowed_paths: setup.allowed_paths.iter().map(|s| s.to_string()).collect(),
        secret: setup.secret.to_string(),
        ignored_users: set(setup.ignored_users),
        allowed_users: set(setup.allowed_users),
    };
    let client = UpstreamClient::new(Duration::from_secs(5))?;
    let relay = Relay::new(config, client, 1024 * 1024)?;
    Ok(create_router(Arc::new(AppState::new(relay))))
}

pub fn github_signature(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

pub fn github_push(path: &str, secret: &str, body: &str) -> Request {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("x-github-event", "push")
        .header("x-hub-signature-256", github_signature(secret, body.as_bytes()))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn gitlab_push(path: &str, token: &str, body: &str) -> Request {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("x-gitlab-event", "Push Hook")
        .header("x-gitlab-token", token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_string(response: Response) -> Result<String> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}
