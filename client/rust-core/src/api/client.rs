use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::errors::{CoreError, CoreResult};
use crate::models::{
    ActiveSessionResponse, AnswerSubmissionRequest, AnswerSubmissionResponse, AuthResponse,
    NewSessionRequest, QuestionFeedbackResponse, QuestionResult, RefreshResponse,
    SessionCreateResponse, SessionResponse, UserLogin,
};

use super::backend::QuizBackend;

mod routes {
    pub const LOGIN: &str = "auth/login";
    pub const LOGOUT: &str = "auth/logout";
    pub const REFRESH_TOKEN: &str = "auth/refresh-token";

    pub const NEW_SESSION: &str = "quiz/sessions/new";
    pub const REVIEW_SESSION: &str = "quiz/sessions/review";
    pub const MIXED_SESSION: &str = "quiz/sessions/mixed";
    pub const ACTIVE_SESSION: &str = "quiz/sessions/active";

    pub fn session(session_id: &str) -> String {
        format!("quiz/sessions/{}", session_id)
    }

    pub fn resume_session(session_id: &str) -> String {
        format!("quiz/sessions/{}/resume", session_id)
    }

    pub fn submit_answer(session_id: &str) -> String {
        format!("quiz/sessions/{}/answer", session_id)
    }

    pub fn question_feedback(question_id: &str) -> String {
        format!("quiz/questions/{}/feedback", question_id)
    }

    pub fn session_results(session_id: &str) -> String {
        format!("quiz/results/{}", session_id)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Authenticated HTTP client for the quiz backend.
///
/// Owns the access token instead of keeping it in module-level state: bearer
/// attachment happens on every protected request, and a 401/403 triggers a
/// single-flight refresh followed by exactly one retry of the original call.
/// The refresh endpoint itself is cookie-authenticated, which is why the
/// underlying client carries a cookie store.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: RwLock<Option<String>>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl ApiClient {
    pub fn new(config: &Config) -> CoreResult<Self> {
        let mut base = config.api_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .cookie_store(true)
            .build()?;

        Ok(Self {
            http,
            base_url,
            access_token: RwLock::new(None),
            refresh_gate: tokio::sync::Mutex::new(()),
        })
    }

    pub fn set_access_token(&self, token: Option<String>) {
        *self
            .access_token
            .write()
            .expect("access token lock poisoned") = token;
    }

    fn current_token(&self) -> Option<String> {
        self.access_token
            .read()
            .expect("access token lock poisoned")
            .clone()
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        authed: bool,
    ) -> CoreResult<Response> {
        let url = self.base_url.join(path)?;
        let mut request = self.http.request(method, url);

        if authed {
            if let Some(token) = self.current_token() {
                request = request.bearer_auth(token);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Sends the request, refreshing the access token and retrying once if
    /// the backend rejects the current one. Public (auth) endpoints never
    /// trigger a refresh.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        authed: bool,
    ) -> CoreResult<Response> {
        let response = self.send(method.clone(), path, body.as_ref(), authed).await?;
        let status = response.status();

        if authed && (status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN) {
            let stale = self.current_token();
            self.refresh_access_token(stale).await?;
            return self.send(method, path, body.as_ref(), authed).await;
        }

        Ok(response)
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        authed: bool,
    ) -> CoreResult<T> {
        let response = self.execute(method, path, body, authed).await?;
        Self::decode(response).await
    }

    async fn request_no_content(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        authed: bool,
    ) -> CoreResult<()> {
        let response = self.execute(method, path, body, authed).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let detail = extract_detail(response).await;
        Err(error_for(status, detail))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> CoreResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let detail = extract_detail(response).await;
        Err(error_for(status, detail))
    }

    /// Single-flight token refresh: the first caller performs the refresh,
    /// callers queued behind it reuse the token it installed.
    async fn refresh_access_token(&self, stale: Option<String>) -> CoreResult<()> {
        let _gate = self.refresh_gate.lock().await;

        // Another request may have refreshed while we waited on the gate
        if self.current_token() != stale {
            return Ok(());
        }

        tracing::debug!("Refreshing access token");
        let response = self
            .send(Method::POST, routes::REFRESH_TOKEN, None, false)
            .await?;

        if !response.status().is_success() {
            let detail = extract_detail(response).await;
            self.set_access_token(None);
            tracing::warn!("Token refresh failed: {}", detail);
            return Err(CoreError::Unauthorized(detail));
        }

        let body: RefreshResponse = response.json().await?;
        self.set_access_token(Some(body.access_token));
        tracing::info!("Access token refreshed");
        Ok(())
    }

    // --- Authentication ---

    pub async fn login(&self, credentials: &UserLogin) -> CoreResult<AuthResponse> {
        let body = serde_json::to_value(credentials)?;
        let auth: AuthResponse = self
            .request_json(Method::POST, routes::LOGIN, Some(body), false)
            .await?;
        self.set_access_token(Some(auth.access_token.clone()));
        tracing::info!("Logged in, access token installed");
        Ok(auth)
    }

    pub async fn logout(&self) -> CoreResult<()> {
        self.request_no_content(Method::POST, routes::LOGOUT, None, true)
            .await?;
        self.set_access_token(None);
        Ok(())
    }

    // --- Session lifecycle ---

    pub async fn start_new_session(
        &self,
        request: &NewSessionRequest,
    ) -> CoreResult<SessionCreateResponse> {
        let body = serde_json::to_value(request)?;
        self.request_json(Method::POST, routes::NEW_SESSION, Some(body), true)
            .await
    }

    pub async fn start_review_session(
        &self,
        request: &NewSessionRequest,
    ) -> CoreResult<SessionCreateResponse> {
        let body = serde_json::to_value(request)?;
        self.request_json(Method::POST, routes::REVIEW_SESSION, Some(body), true)
            .await
    }

    pub async fn start_mixed_session(
        &self,
        request: &NewSessionRequest,
    ) -> CoreResult<SessionCreateResponse> {
        let body = serde_json::to_value(request)?;
        self.request_json(Method::POST, routes::MIXED_SESSION, Some(body), true)
            .await
    }

    pub async fn active_session(&self) -> CoreResult<Option<ActiveSessionResponse>> {
        self.request_json(Method::GET, routes::ACTIVE_SESSION, None, true)
            .await
    }
}

#[async_trait]
impl QuizBackend for ApiClient {
    async fn resume_session(&self, session_id: &str) -> CoreResult<SessionResponse> {
        self.request_json(Method::GET, &routes::resume_session(session_id), None, true)
            .await
    }

    async fn submit_answer(
        &self,
        session_id: &str,
        submission: &AnswerSubmissionRequest,
    ) -> CoreResult<AnswerSubmissionResponse> {
        let body = serde_json::to_value(submission)?;
        self.request_json(
            Method::POST,
            &routes::submit_answer(session_id),
            Some(body),
            true,
        )
        .await
    }

    async fn question_feedback(&self, question_id: &str) -> CoreResult<QuestionFeedbackResponse> {
        self.request_json(
            Method::GET,
            &routes::question_feedback(question_id),
            None,
            true,
        )
        .await
    }

    async fn delete_session(&self, session_id: &str) -> CoreResult<()> {
        self.request_no_content(Method::DELETE, &routes::session(session_id), None, true)
            .await
    }

    async fn session_results(&self, session_id: &str) -> CoreResult<Vec<QuestionResult>> {
        self.request_json(
            Method::GET,
            &routes::session_results(session_id),
            None,
            true,
        )
        .await
    }
}

fn error_for(status: StatusCode, detail: String) -> CoreError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        CoreError::Unauthorized(detail)
    } else {
        CoreError::Backend {
            status: status.as_u16(),
            detail,
        }
    }
}

async fn extract_detail(response: Response) -> String {
    let fallback = response.status().to_string();
    match response.text().await {
        Ok(text) => serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.detail)
            .or_else(|| if text.is_empty() { None } else { Some(text) })
            .unwrap_or(fallback),
        Err(_) => fallback,
    }
}
