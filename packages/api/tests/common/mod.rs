use std::sync::Arc;

use api::auth::OAuthProviders;
use api::{build_router, AppState};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::SessionManagerLayer;

/// The full router over in-memory stores, with a session layer.
pub fn app() -> Router {
    let state = AppState::new(
        Arc::new(store::MemoryStore::new()),
        Arc::new(store::MemoryObjects::new()),
        OAuthProviders::new(),
    );
    build_router(state).layer(SessionManagerLayer::new(tower_sessions::MemoryStore::default()))
}

/// A browser-like client: remembers the session cookie between requests.
pub struct Client {
    app: Router,
    cookie: Option<String>,
}

pub struct Reply {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        if self.bytes.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&self.bytes).expect("json")
    }
}

impl Client {
    pub fn new(app: &Router) -> Self {
        Self {
            app: app.clone(),
            cookie: None,
        }
    }

    pub async fn send(&mut self, method: &str, uri: &str, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.dispatch(builder, body).await
    }

    pub async fn send_bytes(&mut self, method: &str, uri: &str, content_type: &str, data: &[u8]) -> Reply {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        self.dispatch(builder, Body::from(data.to_vec())).await
    }

    async fn dispatch(&mut self, mut builder: axum::http::request::Builder, body: Body) -> Reply {
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response");
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .expect("cookie header")
                .split(';')
                .next()
                .expect("cookie pair");
            self.cookie = Some(pair.to_string());
        }
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().expect("content type").to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body")
            .to_vec();
        Reply {
            status,
            content_type,
            bytes,
        }
    }

    pub fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    /// Register a local account and keep its session. Returns the user id.
    pub async fn register(&mut self, email: &str, first_name: &str) -> String {
        let reply = self
            .send(
                "POST",
                "/api/auth/register",
                Some(serde_json::json!({
                    "email": email,
                    "password": "correct-horse",
                    "firstName": first_name,
                    "lastName": "Tester",
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "register {email}");
        reply.json()["id"].as_str().expect("user id").to_string()
    }

    pub async fn create_family(&mut self, name: &str) -> String {
        let reply = self
            .send("POST", "/api/families", Some(serde_json::json!({ "name": name })))
            .await;
        assert_eq!(reply.status, StatusCode::CREATED);
        reply.json()["id"].as_str().expect("family id").to_string()
    }

    pub async fn create_pet(&mut self, family_id: &str, name: &str) -> String {
        let reply = self
            .send(
                "POST",
                "/api/pets",
                Some(serde_json::json!({
                    "familyId": family_id,
                    "name": name,
                    "species": "dog",
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED);
        reply.json()["id"].as_str().expect("pet id").to_string()
    }
}
