//! Request ids, bearer auth, and the per-kind limit on check triggers.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sladash_core::{AppConfig, CheckKind, Environment};
use subtle::{Choice, ConstantTimeEq};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::{ApiError, ErrorCode};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id stored as a request extension and echoed on the response.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    fn of(req: &Request) -> String {
        req.extensions()
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_default()
    }
}

/// Reuses the caller's `x-request-id` or mints a `UUIDv4`.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

/// Bearer tokens accepted on protected routes; `None` turns auth off.
#[derive(Debug, Clone)]
pub struct AuthState {
    keys: Option<Arc<[String]>>,
}

impl AuthState {
    /// # Errors
    ///
    /// Fails outside development when `SLADASH_API_KEYS` is empty.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Self::from_keys(
            config.api_keys.clone(),
            config.env == Environment::Development,
        )
    }

    /// # Errors
    ///
    /// Fails when `keys` is empty and `is_development` is false.
    pub fn from_keys(keys: Vec<String>, is_development: bool) -> anyhow::Result<Self> {
        if !keys.is_empty() {
            return Ok(Self {
                keys: Some(keys.into()),
            });
        }
        if is_development {
            tracing::warn!("SLADASH_API_KEYS is empty; bearer auth disabled in development");
            return Ok(Self { keys: None });
        }
        anyhow::bail!("SLADASH_API_KEYS is required outside development")
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.keys.is_some()
    }

    /// Every key is compared so the timing does not reveal which one matched.
    fn allows(&self, token: Option<&str>) -> bool {
        let Some(keys) = &self.keys else {
            return true;
        };
        let Some(token) = token else {
            return false;
        };
        keys.iter()
            .fold(Choice::from(0), |acc, key| {
                acc | key.as_bytes().ct_eq(token.as_bytes())
            })
            .into()
    }
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if auth.allows(bearer_token(req.headers().get(AUTHORIZATION))) {
        return next.run(req).await;
    }
    ApiError::new(
        RequestId::of(&req),
        ErrorCode::Unauthorized,
        "missing or invalid bearer token",
    )
    .into_response()
}

fn bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Caps how often each check kind can be started over HTTP.
///
/// Every trigger fans out to one upstream call per unit, so the limit sits
/// on the trigger routes only. Each kind keeps its own sliding log of
/// admission times; clones share the logs.
#[derive(Debug, Clone)]
pub struct TriggerLimit {
    max_triggers: usize,
    window: Duration,
    serviceability: Arc<Mutex<VecDeque<Instant>>>,
    availability: Arc<Mutex<VecDeque<Instant>>>,
}

impl TriggerLimit {
    #[must_use]
    pub fn new(max_triggers: usize, window: Duration) -> Self {
        Self {
            max_triggers,
            window,
            serviceability: Arc::default(),
            availability: Arc::default(),
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let max = usize::try_from(config.trigger_limit_per_minute).unwrap_or(usize::MAX);
        Self::new(max, Duration::from_secs(60))
    }

    /// Logs a trigger of `kind` at `now` unless the window is already full.
    async fn try_admit(&self, kind: CheckKind, now: Instant) -> bool {
        let log = match kind {
            CheckKind::Serviceability => &self.serviceability,
            CheckKind::Availability => &self.availability,
        };
        let mut log = log.lock().await;

        while log
            .front()
            .is_some_and(|at| now.duration_since(*at) >= self.window)
        {
            log.pop_front();
        }
        if log.len() >= self.max_triggers {
            return false;
        }
        log.push_back(now);
        true
    }
}

/// Route layer for one trigger endpoint; the state names the kind it guards.
pub async fn limit_triggers(
    State((limit, kind)): State<(TriggerLimit, CheckKind)>,
    req: Request,
    next: Next,
) -> Response {
    if limit.try_admit(kind, Instant::now()).await {
        return next.run(req).await;
    }
    tracing::warn!(kind = %kind, "check trigger rejected: limit reached");
    ApiError::new(
        RequestId::of(&req),
        ErrorCode::RateLimited,
        format!("too many {kind} check triggers; try again later"),
    )
    .into_response()
}
