//! HTTP client for the marks API with coordinated access-token refresh.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::schemas::auth::{LoginRequest, RefreshRequest, TokenResponse};
use crate::schemas::catalog::{Exam, Student, Subject};
use crate::schemas::marks::{BatchResult, GpaBatch, MarksBatch, StudentWithGpa, StudentWithMarks};
use crate::schemas::user::UserResponse;
use crate::schemas::{DataResponse, ErrorResponse};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{detail}")]
    Api { status: u16, detail: String },
    #[error("session expired, sign in again")]
    Unauthorized,
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ClientError {
    /// Message suitable for a notice: the server's `detail` when there is one.
    pub fn detail(&self) -> String {
        match self {
            Self::Api { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Access and refresh token of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<&TokenResponse> for Session {
    fn from(tokens: &TokenResponse) -> Self {
        Self {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
        }
    }
}

/// Cheap to clone; clones share the session and the refresh lock.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base: Url,
    session: RwLock<Option<Session>>,
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    /// `base_url` includes the API prefix, e.g. `http://localhost:8000/api`.
    pub fn new(base_url: &str, session: Option<Session>) -> Result<Self, ClientError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|err| ClientError::InvalidBaseUrl(format!("{base_url}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base,
                session: RwLock::new(session),
                refresh_lock: Mutex::new(()),
            }),
        })
    }

    pub async fn session(&self) -> Option<Session> {
        self.inner.session.read().await.clone()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<UserResponse, ClientError> {
        let body = LoginRequest { username: username.to_string(), password: password.to_string() };
        let response = self
            .inner
            .http
            .post(self.endpoint(&["auth", "login"]))
            .json(&body)
            .send()
            .await?;
        let tokens: TokenResponse = decode(response).await?;

        *self.inner.session.write().await = Some(Session::from(&tokens));
        tracing::info!(username = %tokens.user.username, "Signed in");
        Ok(tokens.user)
    }

    /// Revokes the refresh token on the server and forgets the session either way.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let Some(session) = self.inner.session.write().await.take() else {
            return Ok(());
        };
        let body = RefreshRequest { refresh_token: session.refresh_token };
        let response =
            self.inner.http.post(self.endpoint(&["auth", "logout"])).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    pub async fn get_subjects(&self) -> Result<Vec<Subject>, ClientError> {
        self.get_data(&["sub", "getSubjects"]).await
    }

    pub async fn get_exams(&self) -> Result<Vec<Exam>, ClientError> {
        self.get_data(&["exams", "getExams"]).await
    }

    pub async fn get_students_by_class(
        &self,
        year: i32,
        level: i32,
    ) -> Result<Vec<Student>, ClientError> {
        self.get_data(&["students", "getStudentsByClass", &year.to_string(), &level.to_string()])
            .await
    }

    pub async fn get_class_marks(
        &self,
        level: i32,
        year: i32,
        exam_name: &str,
    ) -> Result<Vec<StudentWithMarks>, ClientError> {
        self.get_data(&["marks", "getClassMarks", &level.to_string(), &year.to_string(), exam_name])
            .await
    }

    pub async fn get_gpa(&self, year: i32) -> Result<Vec<StudentWithGpa>, ClientError> {
        self.get_data(&["marks", "getGPA", &year.to_string()]).await
    }

    pub async fn add_marks(&self, batch: &MarksBatch) -> Result<BatchResult, ClientError> {
        self.send_authorized(Method::POST, &["marks", "addMarks"], Some(batch)).await
    }

    pub async fn add_gpa(&self, batch: &GpaBatch) -> Result<BatchResult, ClientError> {
        self.send_authorized(Method::POST, &["marks", "addGPA"], Some(batch)).await
    }

    async fn get_data<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let envelope: DataResponse<T> =
            self.send_authorized::<_, ()>(Method::GET, segments, None).await?;
        Ok(envelope.data)
    }

    /// Sends with the current access token; on 401 refreshes once and retries once.
    async fn send_authorized<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments);
        let used = self.access_token().await?;

        let response = self.request(method.clone(), url.clone(), &used, body).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return decode(response).await;
        }

        self.refresh_after(&used).await?;
        let current = self.access_token().await?;
        let retried = self.request(method, url, &current, body).send().await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        decode(retried).await
    }

    fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        access_token: &str,
        body: Option<&B>,
    ) -> reqwest::RequestBuilder {
        let builder = self.inner.http.request(method, url).bearer_auth(access_token);
        match body {
            Some(body) => builder.json(body),
            None => builder,
        }
    }

    async fn access_token(&self) -> Result<String, ClientError> {
        self.inner
            .session
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone())
            .ok_or(ClientError::Unauthorized)
    }

    /// Single-flight refresh: callers queue on the lock, and whoever finds the access token
    /// already replaced since `stale` was used skips the refresh and just retries.
    async fn refresh_after(&self, stale: &str) -> Result<(), ClientError> {
        let _guard = self.inner.refresh_lock.lock().await;

        let refresh_token = {
            let session = self.inner.session.read().await;
            let Some(session) = session.as_ref() else {
                return Err(ClientError::Unauthorized);
            };
            if session.access_token != stale {
                return Ok(());
            }
            session.refresh_token.clone()
        };

        let response = self
            .inner
            .http
            .post(self.endpoint(&["auth", "refresh"]))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Token refresh rejected; clearing session");
            *self.inner.session.write().await = None;
            return Err(ClientError::Unauthorized);
        }

        let tokens: TokenResponse = decode(response).await?;
        *self.inner.session.write().await = Some(Session::from(&tokens));
        tracing::debug!("Access token refreshed");
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|err| ClientError::Decode(err.to_string()))
}

async fn api_error(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let detail = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ErrorResponse>(&body)
            .map(|error| error.detail)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned()),
        Err(err) => err.to_string(),
    };
    let detail = if detail.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        detail
    };
    ClientError::Api { status: status.as_u16(), detail }
}
