//! Dashboard HTTP Client
//! Mission: Typed calls against the scholarship API

use crate::applications::{Application, ApplicationData, ReviewDecision};
use crate::auth::models::{LoginResponse, UserResponse};
use crate::auth::UserRole;
use crate::models::{AdminStats, MessageResponse, Page};
use crate::scholarships::{models::ScholarshipQuery, Scholarship};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; `message` is the server's `message` field when present.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Please login first")]
    NotLoggedIn,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterForm<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotLoggedIn)?;
        Ok(builder.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        debug!(status = status.as_u16(), %message, "API call rejected");

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let req = self
            .http
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }));
        self.send(req).await
    }

    pub async fn register(&self, form: &RegisterForm<'_>) -> Result<UserResponse, ClientError> {
        let req = self.http.post(self.url("/register")).json(form);
        self.send(req).await
    }

    pub async fn logout(&self) -> Result<MessageResponse, ClientError> {
        let req = self.authed(self.http.post(self.url("/logout")))?;
        self.send(req).await
    }

    pub async fn profile(&self) -> Result<UserResponse, ClientError> {
        let req = self.authed(self.http.get(self.url("/user/profile")))?;
        self.send(req).await
    }

    pub async fn stats(&self) -> Result<AdminStats, ClientError> {
        let req = self.authed(self.http.get(self.url("/admin/stats")))?;
        self.send(req).await
    }

    pub async fn scholarships(&self, query: &ScholarshipQuery) -> Result<Page<Scholarship>, ClientError> {
        let req = self.authed(self.http.get(self.url("/scholarships")).query(query))?;
        self.send(req).await
    }

    pub async fn scholarship(&self, id: i64) -> Result<Scholarship, ClientError> {
        let req = self.authed(self.http.get(self.url(&format!("/scholarships/{}", id))))?;
        self.send(req).await
    }

    pub async fn create_application(
        &self,
        scholarship_id: i64,
        data: &ApplicationData,
    ) -> Result<Application, ClientError> {
        let req = self.authed(self.http.post(self.url("/applications")).json(&json!({
            "scholarship_id": scholarship_id,
            "application_data": data,
        })))?;
        self.send(req).await
    }

    pub async fn applications(&self, page: u32) -> Result<Page<Application>, ClientError> {
        let req = self.authed(
            self.http
                .get(self.url("/applications"))
                .query(&[("page", page)]),
        )?;
        self.send(req).await
    }

    pub async fn submit_application(&self, id: i64) -> Result<Application, ClientError> {
        let req = self.authed(
            self.http
                .post(self.url(&format!("/applications/{}/submit", id))),
        )?;
        self.send(req).await
    }

    pub async fn review_queue(&self, page: u32) -> Result<Page<Application>, ClientError> {
        let req = self.authed(
            self.http
                .get(self.url("/reviewer/applications"))
                .query(&[("page", page)]),
        )?;
        self.send(req).await
    }

    pub async fn review_application(
        &self,
        id: i64,
        decision: ReviewDecision,
        notes: Option<&str>,
    ) -> Result<Application, ClientError> {
        let req = self.authed(
            self.http
                .post(self.url(&format!("/applications/{}/review", id)))
                .json(&json!({ "decision": decision, "notes": notes })),
        )?;
        self.send(req).await
    }
}

/// True when the server rejected the credentials themselves (expired or revoked token).
pub fn is_auth_failure(err: &ClientError) -> bool {
    err.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
}
