// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase client for auth, table access and event image storage.
//!
//! Handles:
//! - Password sign-in, sign-out and session restore (GoTrue, `/auth/v1`)
//! - Access token refresh when the session is about to expire
//! - Filtered, ordered table reads and updates (PostgREST, `/rest/v1`)
//! - Event image uploads (Storage, `/storage/v1`)

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::auth::{AuthChange, AuthEvent, AuthNotifier, AuthUser, Session};
use crate::backend::{collections, ClubBackend};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Attendance, Club, Event, Membership, Profile, RsvpRow};

/// Margin before token expiration when we proactively refresh (60 seconds).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Columns selected for RSVPs, including the linked membership's name.
const RSVP_COLUMNS: &str =
    "id,event_id,membership_id,avatar_url,created_at,name,email,attendance,memberships(name)";

/// HTTP client for a Supabase project.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    images_bucket: String,
    session: Arc<RwLock<Option<Session>>>,
    /// Serializes token refreshes so concurrent requests refresh once.
    refresh_lock: Arc<Mutex<()>>,
    auth: AuthNotifier,
}

impl SupabaseClient {
    /// Create a client for the project described by `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            images_bucket: config.event_images_bucket.clone(),
            session: Arc::new(RwLock::new(None)),
            refresh_lock: Arc::new(Mutex::new(())),
            auth: AuthNotifier::new(),
        })
    }

    // ─── Auth ────────────────────────────────────────────────────────────────

    /// Sign in with email and password; emits `SIGNED_IN`.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let body = serde_json::json!({ "email": email, "password": password });

        let response = self
            .http
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Backend(format!("Sign-in request failed: {}", e)))?;

        let session: Session = check_response_json(response).await?;
        *self.session.write().await = Some(session.clone());

        tracing::info!(user_id = %session.user.id, "Signed in");
        self.auth.notify(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    /// Sign out; the local session is always cleared and `SIGNED_OUT` emitted,
    /// even if the server-side logout fails.
    pub async fn sign_out(&self) -> Result<()> {
        let previous = self.session.write().await.take();

        if let Some(session) = previous {
            let url = format!("{}/auth/v1/logout", self.base_url);
            let result = self
                .http
                .post(&url)
                .header("apikey", &self.anon_key)
                .bearer_auth(&session.access_token)
                .send()
                .await;

            match result {
                Ok(response) => {
                    if let Err(e) = check_response(response).await {
                        tracing::warn!(error = %e, "Server-side logout failed, continuing anyway");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Logout request failed, continuing anyway"),
            }
        }

        self.auth.notify(AuthEvent::SignedOut, None);
        Ok(())
    }

    /// Install a previously persisted session (or none) and emit
    /// `INITIAL_SESSION`, as on app relaunch.
    pub async fn restore_session(&self, session: Option<Session>) {
        *self.session.write().await = session.clone();
        self.auth.notify(AuthEvent::InitialSession, session);
    }

    /// Bearer token for the next request: the session's access token
    /// (refreshed if expiring), else the anon key.
    async fn bearer_token(&self) -> Result<String> {
        let now = Utc::now().timestamp();

        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Ok(self.anon_key.clone());
        };
        if !needs_refresh(&session, now) {
            return Ok(session.access_token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another request may have refreshed while we were waiting.
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Ok(self.anon_key.clone());
        };
        if !needs_refresh(&session, now) {
            return Ok(session.access_token);
        }
        let Some(refresh_token) = session.refresh_token.clone() else {
            return Ok(session.access_token);
        };

        tracing::info!(user_id = %session.user.id, "Access token expiring, refreshing");
        let refreshed = match self.refresh_session(&refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(e) if e.is_auth_error() => {
                // The session can never be renewed; drop it so listeners reset.
                tracing::warn!(user_id = %session.user.id, error = %e, "Refresh token rejected, signing out");
                *self.session.write().await = None;
                self.auth.notify(AuthEvent::SignedOut, None);
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        *self.session.write().await = Some(refreshed.clone());
        self.auth
            .notify(AuthEvent::TokenRefreshed, Some(refreshed.clone()));
        Ok(refreshed.access_token)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let response = self
            .http
            .post(&url)
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| AppError::Backend(format!("Token refresh request failed: {}", e)))?;

        // GoTrue answers a revoked or unknown refresh token with 400 invalid_grant
        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED
        ) {
            let err = response_error(response).await;
            tracing::warn!(error = %err, "Token refresh rejected");
            return Err(AppError::Backend(AppError::BACKEND_AUTH_ERROR.to_string()));
        }

        check_response_json(response).await
    }

    /// Start a request with the `apikey` header and bearer auth applied.
    async fn authed(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let token = self.bearer_token().await?;
        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token))
    }

    // ─── Tables ──────────────────────────────────────────────────────────────

    /// Start a PostgREST query against `table`.
    pub fn from(&self, table: &str) -> Query<'_> {
        Query {
            client: self,
            table: table.to_string(),
            params: vec![("select".to_string(), "*".to_string())],
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.images_bucket,
            encode_path(path)
        )
    }
}

/// Whether the session's access token expires within the refresh margin.
fn needs_refresh(session: &Session, now: i64) -> bool {
    session
        .expires_at
        .is_some_and(|exp| now + TOKEN_REFRESH_MARGIN_SECS >= exp)
}

/// Percent-encode each segment of a storage object path.
fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// A PostgREST request under construction.
pub struct Query<'a> {
    client: &'a SupabaseClient,
    table: String,
    params: Vec<(String, String)>,
}

impl Query<'_> {
    /// Replace the selected columns (default `*`).
    pub fn select(mut self, columns: &str) -> Self {
        self.params[0].1 = columns.to_string();
        self
    }

    /// Filter rows where `column` equals `value`.
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.params
            .push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params
            .push(("order".to_string(), format!("{}.{}", column, direction)));
        self
    }

    fn url(&self) -> String {
        format!("{}/rest/v1/{}", self.client.base_url, self.table)
    }

    /// Fetch all matching rows.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        let response = self
            .client
            .authed(Method::GET, &self.url())
            .await?
            .query(&self.params)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        check_response_json(response).await
    }

    /// Fetch exactly one row; zero or several rows is `NotFound`.
    pub async fn single<T: DeserializeOwned>(self) -> Result<T> {
        let response = self
            .client
            .authed(Method::GET, &self.url())
            .await?
            .query(&self.params)
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        if response.status() == StatusCode::NOT_ACCEPTABLE {
            return Err(AppError::NotFound(format!("{} row", self.table)));
        }
        check_response_json(response).await
    }

    /// Patch matching rows and return them as updated.
    pub async fn update<T: DeserializeOwned>(self, body: &serde_json::Value) -> Result<Vec<T>> {
        let response = self
            .client
            .authed(Method::PATCH, &self.url())
            .await?
            .query(&self.params)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        check_response_json(response).await
    }
}

#[async_trait]
impl ClubBackend for SupabaseClient {
    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn get_user(&self) -> Result<Option<AuthUser>> {
        if self.session.read().await.is_none() {
            return Ok(None);
        }

        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .authed(Method::GET, &url)
            .await?
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        match check_response_json(response).await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_auth_error() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn subscribe_auth(&self) -> broadcast::Receiver<AuthChange> {
        self.auth.subscribe()
    }

    async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        self.from(collections::PROFILES)
            .eq("id", user_id)
            .single()
            .await
    }

    async fn get_club(&self, club_id: &str) -> Result<Club> {
        self.from(collections::CLUBS).eq("id", club_id).single().await
    }

    async fn list_memberships(&self, club_id: &str) -> Result<Vec<Membership>> {
        self.from(collections::MEMBERSHIPS)
            .eq("club_id", club_id)
            .order("joined_at", false)
            .fetch()
            .await
    }

    async fn list_events(&self, club_id: &str) -> Result<Vec<Event>> {
        self.from(collections::EVENTS)
            .eq("club_id", club_id)
            .order("event_date", true)
            .fetch()
            .await
    }

    async fn list_rsvps(&self, club_id: &str) -> Result<Vec<RsvpRow>> {
        self.from(collections::RSVPS)
            .select(RSVP_COLUMNS)
            .eq("club_id", club_id)
            .order("created_at", true)
            .fetch()
            .await
    }

    async fn update_rsvp_attendance(
        &self,
        rsvp_id: &str,
        attendance: Option<Attendance>,
    ) -> Result<Vec<RsvpRow>> {
        self.from(collections::RSVPS)
            .select(RSVP_COLUMNS)
            .eq("id", rsvp_id)
            .update(&serde_json::json!({ "attendance": attendance }))
            .await
    }

    async fn upload_event_image(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let encoded = encode_path(path);
        if encoded.is_empty() {
            return Err(AppError::BadRequest("Empty storage path".to_string()));
        }

        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.images_bucket, encoded
        );
        let size = bytes.len();
        let response = self
            .authed(Method::POST, &url)
            .await?
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Backend(format!("Image upload failed: {}", e)))?;

        check_response(response).await?;

        let public_url = self.public_url(path);
        tracing::info!(path, size, "Event image uploaded");
        Ok(public_url)
    }
}

/// Error body shapes returned by PostgREST, GoTrue and Storage.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.error_description)
            .or(self.msg)
            .or(self.error)
    }
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> Result<()> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(response_error(response).await)
}

/// Check response and parse JSON body.
async fn check_response_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(response_error(response).await);
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))
}

/// Build an error from a non-success response.
async fn response_error(response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    // Unauthorized - token may be expired or revoked
    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!(body = %body, "Backend rejected access token (401)");
        return AppError::Backend(AppError::BACKEND_AUTH_ERROR.to_string());
    }

    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or(body);

    AppError::Backend(format!("HTTP {}: {}", status.as_u16(), message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: Option<i64>) -> Session {
        Session {
            access_token: "token".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at,
            user: AuthUser {
                id: "u".to_string(),
                email: None,
            },
        }
    }

    #[test]
    fn test_needs_refresh() {
        assert!(!needs_refresh(&session(None), 1_000));
        assert!(!needs_refresh(&session(Some(2_000)), 1_000));
        assert!(needs_refresh(&session(Some(1_030)), 1_000));
        assert!(needs_refresh(&session(Some(500)), 1_000));
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("club-1/my event.png"), "club-1/my%20event.png");
        assert_eq!(encode_path("/a//b/"), "a/b");
        assert_eq!(encode_path(""), "");
    }

    #[test]
    fn test_query_params() {
        let client = SupabaseClient::new(&Config::test_default()).unwrap();
        let query = client
            .from(collections::MEMBERSHIPS)
            .select("id,name")
            .eq("club_id", "c1")
            .order("joined_at", false);

        assert_eq!(
            query.params,
            vec![
                ("select".to_string(), "id,name".to_string()),
                ("club_id".to_string(), "eq.c1".to_string()),
                ("order".to_string(), "joined_at.desc".to_string()),
            ]
        );
        assert_eq!(query.url(), "http://127.0.0.1:54321/rest/v1/memberships");
    }
}
