//! Best-effort visit reporting.
//!
//! One `VisitTracker` is created at startup and cloned into whatever needs
//! it. Reports never fail the caller: network and server errors are logged
//! and swallowed.

mod types;

pub use types::{LaunchContext, SessionInfo, UserAuth, VisitResponse, VisitType};

use chrono::Utc;
use rand::Rng;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Path of the visit endpoint under the tracker base URL.
pub const VISIT_PATH: &str = "api/user/visit";

/// Default request timeout for visit reports.
pub const DEFAULT_VISIT_TIMEOUT: Duration = Duration::from_secs(10);

const SESSION_SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Error)]
enum VisitError {
    #[error("Visit report timed out after {0:?}")]
    Timeout(Duration),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid visit response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Visit rejected: {0}")]
    Rejected(String),
}

/// `SESSION_<unix millis>_<9 base36 chars>`.
pub fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SESSION_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("SESSION_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[derive(Debug, Default)]
struct TrackerState {
    promotion_code: Option<String>,
    referrer_user_id: Option<String>,
    scene: Option<String>,
    user_info: Option<Value>,
    open_id: Option<String>,
    user_id: Option<i64>,
    initialized: bool,
}

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
    session_id: String,
    state: Mutex<TrackerState>,
}

/// Shared handle to the process's visit context.
#[derive(Debug, Clone)]
pub struct VisitTracker {
    inner: Arc<Inner>,
}

impl VisitTracker {
    /// `base` must end with `/`; reports go to `{base}api/user/visit`.
    pub fn new(http: reqwest::Client, base: &Url, timeout: Duration) -> Result<Self, url::ParseError> {
        let endpoint = base.join(VISIT_PATH)?;
        let session_id = generate_session_id();
        tracing::debug!(session_id = %session_id, endpoint = %endpoint, "Visit tracker created");

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                endpoint,
                timeout,
                session_id,
                state: Mutex::new(TrackerState::default()),
            }),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    fn state(&self) -> MutexGuard<'_, TrackerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Capture launch attribution and report the launch. Later calls do nothing.
    pub async fn init(&self, launch: LaunchContext) {
        let extra = {
            let mut state = self.state();
            if state.initialized {
                tracing::debug!("Visit tracker already initialised");
                return;
            }
            // Claimed up front so a concurrent init cannot report twice.
            state.initialized = true;

            if let Some(scene) = launch.scene.filter(|s| !s.is_empty()) {
                state.promotion_code = non_empty(launch.query.get("promotionCode"));
                state.referrer_user_id = non_empty(launch.query.get("referrerUserId"));
                state.scene = Some(scene);
            }

            let mut extra = Map::new();
            extra.insert("scene".into(), opt_string(&state.scene));
            extra.insert("promotionCode".into(), opt_string(&state.promotion_code));
            extra.insert("referrerUserId".into(), opt_string(&state.referrer_user_id));
            extra.insert(
                "pagePath".into(),
                Value::String(launch.path.unwrap_or_default()),
            );
            extra
        };

        self.record_visit(VisitType::Launch, extra).await;

        let state = self.state();
        tracing::info!(
            session_id = %self.inner.session_id,
            promotion_code = state.promotion_code.as_deref().unwrap_or(""),
            scene = state.scene.as_deref().unwrap_or(""),
            "Visit tracking initialised"
        );
    }

    /// Store the authorised identity and report an `auth` visit.
    pub async fn on_user_authorize(&self, auth: UserAuth) -> Option<VisitResponse> {
        {
            let mut state = self.state();
            state.user_info = Some(auth.user_info.clone());
            if auth.open_id.is_some() {
                state.open_id = auth.open_id;
            }
            if auth.user_id.is_some() {
                state.user_id = auth.user_id;
            }
        }

        let mut extra = Map::new();
        extra.insert("userInfo".into(), auth.user_info);
        self.record_visit(VisitType::Auth, extra).await
    }

    /// Report a `browse` visit for a page.
    pub async fn on_page_visit(&self, page_path: &str, page_data: Value) -> Option<VisitResponse> {
        let mut extra = Map::new();
        extra.insert("pagePath".into(), Value::String(page_path.to_string()));
        extra.insert("pageData".into(), page_data);
        self.record_visit(VisitType::Browse, extra).await
    }

    /// Report an `order` visit.
    pub async fn on_order(&self, order_data: Value) -> Option<VisitResponse> {
        let mut extra = Map::new();
        extra.insert("orderData".into(), order_data);
        self.record_visit(VisitType::Order, extra).await
    }

    /// Send one report. Returns `None` on any failure.
    ///
    /// A successful reply carrying `promotionCode` replaces the tracker's
    /// promotion code for later reports.
    pub async fn record_visit(
        &self,
        visit_type: VisitType,
        extra: Map<String, Value>,
    ) -> Option<VisitResponse> {
        let body = self.report_body(visit_type, extra);

        match self.send(&body).await {
            Ok(response) => {
                if let Some(code) = response.promotion_code.as_deref().filter(|c| !c.is_empty()) {
                    self.state().promotion_code = Some(code.to_string());
                }
                tracing::debug!(
                    visit_type = visit_type.as_str(),
                    visit_id = ?response.visit_id,
                    "Visit recorded"
                );
                Some(response)
            }
            Err(e) => {
                tracing::warn!(
                    visit_type = visit_type.as_str(),
                    error = %e,
                    "Visit report failed, continuing"
                );
                None
            }
        }
    }

    fn report_body(&self, visit_type: VisitType, extra: Map<String, Value>) -> Value {
        let state = self.state();
        let mut body = Map::new();
        body.insert(
            "sessionId".into(),
            Value::String(self.inner.session_id.clone()),
        );
        body.insert("openId".into(), opt_string(&state.open_id));
        body.insert(
            "userId".into(),
            state.user_id.map(Value::from).unwrap_or(Value::Null),
        );
        body.insert("visitType".into(), Value::String(visit_type.as_str().into()));
        body.insert("promotionCode".into(), opt_string(&state.promotion_code));
        body.insert("referrerUserId".into(), opt_string(&state.referrer_user_id));
        body.insert("scene".into(), opt_string(&state.scene));
        body.insert(
            "userInfo".into(),
            state.user_info.clone().unwrap_or(Value::Null),
        );
        body.insert("pagePath".into(), Value::String(String::new()));
        body.extend(extra);
        Value::Object(body)
    }

    async fn send(&self, body: &Value) -> Result<VisitResponse, VisitError> {
        let request = self.inner.http.post(self.inner.endpoint.clone()).json(body);

        // The deadline covers the body as well as the headers
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, VisitError>((status, bytes))
        };
        let (status, bytes) = tokio::time::timeout(self.inner.timeout, exchange)
            .await
            .map_err(|_| VisitError::Timeout(self.inner.timeout))??;
        let reply: VisitResponse = match serde_json::from_slice(&bytes) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => {
                return Err(VisitError::Rejected(format!("HTTP status {}", status.as_u16())))
            }
            Err(e) => return Err(VisitError::Decode(e)),
        };

        if !reply.success {
            return Err(VisitError::Rejected(
                reply
                    .message
                    .unwrap_or_else(|| "visit record failed".to_string()),
            ));
        }
        Ok(reply)
    }

    pub fn session_info(&self) -> SessionInfo {
        let state = self.state();
        SessionInfo {
            session_id: self.inner.session_id.clone(),
            promotion_code: state.promotion_code.clone(),
            referrer_user_id: state.referrer_user_id.clone(),
            scene: state.scene.clone(),
            user_info: state.user_info.clone(),
            open_id: state.open_id.clone(),
            user_id: state.user_id,
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

fn opt_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}
