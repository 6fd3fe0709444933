//! API client for communicating with the GoBarber REST API.
//!
//! This module provides the `ApiClient` struct for exchanging credentials,
//! managing the user's profile and reading the provider's schedule.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use reqwest::{header, multipart, Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{
    Appointment, ForgotPasswordRequest, Identity, MonthAvailabilityItem, ProfileUpdate,
    SessionResponse, SignInRequest, SignUpRequest,
};
use crate::utils::mask_token;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when no configuration overrides it (local backend)
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3333";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) GET requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
#[cfg(not(test))]
const INITIAL_BACKOFF_MS: u64 = 1000;
#[cfg(test)]
const INITIAL_BACKOFF_MS: u64 = 10;

/// Multipart field the backend reads the avatar upload from
const AVATAR_FIELD: &str = "avatar";

/// API client for the GoBarber backend.
///
/// Clone is cheap: `reqwest::Client` shares its connection pool, and the
/// default bearer token is shared too, so a token set through one clone is
/// sent by every other clone.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token().as_deref().map(mask_token))
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the default bearer token sent with every subsequent request
    pub fn set_token(&self, token: &str) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.to_string());
        debug!(token = %mask_token(token), "Default authorization header set");
    }

    /// Remove the default bearer token
    pub fn clear_token(&self) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        debug!("Default authorization header cleared");
    }

    /// Current default bearer token, if any
    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.token() {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidToken)?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.auth_headers()?)
                .query(query)
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Self::parse_json(response, &url).await,
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    /// Send a JSON body. Writes are never retried.
    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        let url = self.url(path);
        debug!(%method, url = %url, "Sending request");
        let response = self
            .client
            .request(method, &url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await?;
        Self::check_response(response).await
    }

    // ===== Session =====

    /// Exchange credentials for a token and the user's identity
    pub async fn create_session(&self, email: &str, password: &str) -> Result<SessionResponse, ApiError> {
        let url = self.url("sessions");
        let response = self
            .send_json(Method::POST, "sessions", &SignInRequest { email, password })
            .await?;
        Self::parse_json(response, &url).await
    }

    // ===== Account =====

    /// Register a new account
    pub async fn create_user(&self, request: &SignUpRequest) -> Result<(), ApiError> {
        self.send_json(Method::POST, "users", request).await?;
        Ok(())
    }

    /// Ask the backend to email a password recovery link
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        self.send_json(Method::POST, "password/forgot", &ForgotPasswordRequest { email })
            .await?;
        Ok(())
    }

    /// Update name, email and optionally password; returns the updated identity
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Identity, ApiError> {
        let url = self.url("profile");
        let response = self.send_json(Method::PUT, "profile", update).await?;
        Self::parse_json(response, &url).await
    }

    /// Upload a new avatar image; returns the updated identity
    pub async fn update_avatar(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<Identity, ApiError> {
        let url = self.url("users/avatar");
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = multipart::Form::new().part(AVATAR_FIELD, part);

        debug!(url = %url, file_name, mime, "Uploading avatar");
        let response = self
            .client
            .patch(&url)
            .headers(self.auth_headers()?)
            .multipart(form)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, &url).await
    }

    // ===== Schedule =====

    /// Fetch which days of a month the provider still has free slots
    pub async fn fetch_month_availability(
        &self,
        provider_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<MonthAvailabilityItem>, ApiError> {
        let path = format!("providers/{}/month-availability", provider_id);
        self.get(&path, &[("year", year.to_string()), ("month", month.to_string())])
            .await
    }

    /// Fetch the signed-in provider's appointments for one day
    pub async fn fetch_day_appointments(&self, date: NaiveDate) -> Result<Vec<Appointment>, ApiError> {
        self.get(
            "appointments/me",
            &[
                ("year", date.year().to_string()),
                ("month", date.month().to_string()),
                ("day", date.day().to_string()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const USER_JSON: &str =
        r#"{"id":"u1","name":"Ana","email":"a@b.com","avatar_url":"http://x/a.png"}"#;

    #[tokio::test]
    async fn test_create_session_success() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/sessions")
            .match_body(Matcher::Json(serde_json::json!({
                "email": "a@b.com",
                "password": "secret1"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"token":"tok123","user":{}}}"#, USER_JSON))
            .create_async()
            .await;

        let api = ApiClient::new(server.url()).expect("client");
        let session = api.create_session("a@b.com", "secret1").await.expect("session");
        m.assert_async().await;
        assert_eq!(session.token, "tok123");
        assert_eq!(session.user.id, "u1");
    }

    #[tokio::test]
    async fn test_create_session_unauthorized() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/sessions")
            .with_status(401)
            .with_body(r#"{"status":"error","message":"Incorrect email/password combination."}"#)
            .expect(1)
            .create_async()
            .await;

        let api = ApiClient::new(server.url()).expect("client");
        let result = api.create_session("a@b.com", "wrong1").await;
        m.assert_async().await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_post_is_not_retried_when_rate_limited() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/sessions")
            .with_status(429)
            .expect(1)
            .create_async()
            .await;

        let api = ApiClient::new(server.url()).expect("client");
        let result = api.create_session("a@b.com", "secret1").await;
        m.assert_async().await;
        assert!(matches!(result, Err(ApiError::RateLimited)));
    }

    #[tokio::test]
    async fn test_get_retries_after_rate_limit() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/providers/u1/month-availability")
            .match_query(Matcher::Any)
            .with_status(429)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/providers/u1/month-availability")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"day":3,"available":true}]"#)
            .expect(1)
            .create_async()
            .await;

        let api = ApiClient::new(server.url()).expect("client");
        let items = api.fetch_month_availability("u1", 2021, 5).await.expect("availability");
        limited.assert_async().await;
        ok.assert_async().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].available);
    }

    #[tokio::test]
    async fn test_get_gives_up_after_max_retries() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/providers/u1/month-availability")
            .match_query(Matcher::Any)
            .with_status(429)
            .expect(MAX_RATE_LIMIT_RETRIES as usize + 1)
            .create_async()
            .await;

        let api = ApiClient::new(server.url()).expect("client");
        let result = api.fetch_month_availability("u1", 2021, 5).await;
        m.assert_async().await;
        assert!(matches!(result, Err(ApiError::RateLimited)));
    }

    #[tokio::test]
    async fn test_token_is_shared_between_clones() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/appointments/me")
            .match_header("authorization", "Bearer tok123")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("year".into(), "2021".into()),
                Matcher::UrlEncoded("month".into(), "5".into()),
                Matcher::UrlEncoded("day".into(), "20".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let api = ApiClient::new(server.url()).expect("client");
        let other = api.clone();
        api.set_token("tok123");
        assert_eq!(other.token().as_deref(), Some("tok123"));

        let date = NaiveDate::from_ymd_opt(2021, 5, 20).expect("valid date");
        let appointments = other.fetch_day_appointments(date).await.expect("appointments");
        m.assert_async().await;
        assert!(appointments.is_empty());

        api.clear_token();
        assert!(other.token().is_none());
    }

    #[tokio::test]
    async fn test_no_authorization_header_without_token() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/users")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(USER_JSON)
            .create_async()
            .await;

        let api = ApiClient::new(server.url()).expect("client");
        let request = SignUpRequest {
            name: "Ana".to_string(),
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
        };
        api.create_user(&request).await.expect("sign up");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_month_availability() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/providers/u1/month-availability")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("year".into(), "2021".into()),
                Matcher::UrlEncoded("month".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"day":1,"available":false},{"day":3,"available":true}]"#)
            .create_async()
            .await;

        let api = ApiClient::new(server.url()).expect("client");
        let items = api.fetch_month_availability("u1", 2021, 5).await.expect("availability");
        m.assert_async().await;
        assert_eq!(items.len(), 2);
        assert!(!items[0].available);
    }

    #[tokio::test]
    async fn test_update_avatar_returns_identity() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("PATCH", "/users/avatar")
            .match_header("authorization", "Bearer tok123")
            .match_header("content-type", Matcher::Regex("multipart/form-data".into()))
            .with_status(200)
            .with_body(r#"{"id":"u1","name":"Ana","email":"a@b.com","avatar_url":"http://x/a2.png"}"#)
            .create_async()
            .await;

        let api = ApiClient::new(server.url()).expect("client");
        api.set_token("tok123");
        let identity = api
            .update_avatar("me.png", vec![0x89, 0x50, 0x4e, 0x47], "image/png")
            .await
            .expect("avatar");
        m.assert_async().await;
        assert_eq!(identity.avatar_url, "http://x/a2.png");
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_response() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("PUT", "/profile")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let api = ApiClient::new(server.url()).expect("client");
        let update = ProfileUpdate::from_form("Ana", "a@b.com", "", "", "");
        let result = api.update_profile(&update).await;
        assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let api = ApiClient::new("http://localhost:3333/").expect("client");
        assert_eq!(api.url("/sessions"), "http://localhost:3333/sessions");
        assert_eq!(api.url("sessions"), "http://localhost:3333/sessions");
    }
}
