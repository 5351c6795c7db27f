//! # HTTP backend
//!
//! [`RestBackend`] talks to a hosted Postgres backend over its REST and auth
//! endpoints:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `select` | `GET {url}/rest/v1/{table}?select=..&col=eq.value&order=col.asc` |
//! | `sign_in` | `POST {url}/auth/v1/token?grant_type=password` |
//! | `sign_up` | `POST {url}/auth/v1/signup` |
//! | `sign_out` | `POST {url}/auth/v1/logout` |
//!
//! Every request carries the `apikey` header; the bearer token is the session's
//! access token when signed in and the anon key otherwise. The session lives in
//! process memory and session listeners are fired locally after each auth call.
//!
//! Change channels are served by the realtime websocket (see `realtime.rs`).

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::config::BackendConfig;
use crate::error::{AuthError, FetchError};
use crate::facade::Backend;
use crate::listeners::{
    AuthSubscription, ChangeHandler, ChangeHub, ChannelHandle, SessionHandler, SessionListeners,
};
use crate::models::{Credentials, Row, Session, SignUpDetails, Table};
use crate::query::{Direction, Query};
use crate::realtime::Realtime;

#[derive(Clone)]
pub struct RestBackend {
    inner: Arc<RestInner>,
}

struct RestInner {
    http: reqwest::Client,
    config: BackendConfig,
    session: Mutex<Option<Session>>,
    listeners: Arc<SessionListeners>,
    hub: Arc<ChangeHub>,
    realtime: Realtime,
}

impl RestBackend {
    pub fn new(config: BackendConfig) -> Self {
        let hub = Arc::new(ChangeHub::default());
        Self {
            inner: Arc::new(RestInner {
                http: reqwest::Client::new(),
                realtime: Realtime::new(config.clone(), hub.clone()),
                config,
                session: Mutex::new(None),
                listeners: Arc::new(SessionListeners::default()),
                hub,
            }),
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.inner.config
    }

    fn bearer(&self) -> String {
        self.inner
            .session
            .lock()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.inner.config.anon_key.clone())
    }

    fn set_session(&self, session: Option<Session>) {
        *self.inner.session.lock() = session.clone();
        self.inner.listeners.emit(session);
    }

    async fn post_auth(&self, path: &str, body: Value) -> Result<Value, AuthError> {
        let url = format!("{}/{}", self.inner.config.auth_url(), path);
        let response = self
            .inner
            .http
            .post(&url)
            .header("apikey", &self.inner.config.anon_key)
            .bearer_auth(self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| AuthError::Network(e.to_string()))
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| v.get(key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

fn filter_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Query-string pairs for a read.
pub fn query_pairs(query: &Query) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), query.columns.replace(' ', ""))];
    for filter in &query.filters {
        pairs.push((filter.column.clone(), format!("eq.{}", filter_text(&filter.value))));
    }
    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| match o.direction {
                Direction::Ascending => format!("{}.asc", o.column),
                Direction::Descending => format!("{}.desc", o.column),
            })
            .collect::<Vec<_>>()
            .join(",");
        pairs.push(("order".to_string(), order));
    }
    pairs
}

impl Backend for RestBackend {
    async fn current_session(&self) -> Option<Session> {
        self.inner.session.lock().clone()
    }

    fn on_session_change(&self, handler: SessionHandler) -> AuthSubscription {
        let id = self.inner.listeners.add(handler);
        let listeners = self.inner.listeners.clone();
        AuthSubscription::new(move || {
            listeners.remove(id);
        })
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let body = self
            .post_auth(
                "token?grant_type=password",
                json!({ "email": credentials.email.trim(), "password": credentials.password }),
            )
            .await?;
        let session: Session =
            serde_json::from_value(body).map_err(|e| AuthError::Network(e.to_string()))?;
        tracing::info!(user = %session.identity.id, "signed in");
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, details: &SignUpDetails) -> Result<Option<Session>, AuthError> {
        let body = self
            .post_auth(
                "signup",
                json!({
                    "email": details.email.trim(),
                    "password": details.password,
                    "data": { "full_name": details.full_name },
                }),
            )
            .await?;
        // Without email confirmation the response is a session; otherwise a bare user.
        if body.get("access_token").is_none() {
            return Ok(None);
        }
        let session: Session =
            serde_json::from_value(body).map_err(|e| AuthError::Network(e.to_string()))?;
        self.set_session(Some(session.clone()));
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let remote = self.post_auth("logout", json!({})).await;
        // The local session ends whatever the server answers.
        self.set_session(None);
        match remote {
            Ok(_) => {
                tracing::info!("signed out");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("remote sign-out failed: {}", e);
                Err(e)
            }
        }
    }

    async fn select(&self, query: &Query) -> Result<Vec<Row>, FetchError> {
        let url = format!("{}/{}", self.inner.config.rest_url(), query.table);
        let response = self
            .inner
            .http
            .get(&url)
            .query(&query_pairs(query))
            .header("apikey", &self.inner.config.anon_key)
            .header("Accept-Profile", &self.inner.config.schema)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        response.json::<Vec<Row>>().await.map_err(|e| FetchError::Decode {
            table: query.table.to_string(),
            message: e.to_string(),
        })
    }

    fn subscribe_to_changes(&self, table: Table, on_change: ChangeHandler) -> ChannelHandle {
        let handle = self.inner.hub.open(table, on_change);
        self.inner.realtime.retain(table);
        handle
    }

    fn close_channel(&self, handle: ChannelHandle) {
        if self.inner.hub.close(handle) {
            self.inner.realtime.release(handle.table);
        }
    }
}
