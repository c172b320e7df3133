//! Operator console and ad delivery controller for the ads REST backend.

pub mod api;
pub mod client;
pub mod config;
pub mod delivery;
pub mod error;
pub mod listing;
pub mod loading;
pub mod models;
pub mod optimistic;
pub mod query;
pub mod screens;
pub mod session;
pub mod table;

use api::RestClient;
use client::HttpClient;
use config::AppConfig;
use error::{ApiError, ApiResult};
use loading::LoadingTracker;
use session::{credentials_match, SessionStore};

// ── Shared application state ───────────────────────────────────────────────

/// Everything the console shares across screens, created once at start-up
/// and torn down at logout.
#[derive(Debug)]
pub struct Console {
    pub config: AppConfig,
    pub api: RestClient,
    pub loading: LoadingTracker,
    pub sessions: SessionStore,
}

impl Console {
    pub fn new(config: AppConfig) -> ApiResult<Self> {
        let loading = LoadingTracker::new();
        let api = RestClient::new(HttpClient::new(&config, loading.clone())?);
        let sessions = SessionStore::new(config.session_duration_hours);

        Ok(Self {
            config,
            api,
            loading,
            sessions,
        })
    }

    /// Check the operator credentials and open a session.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<String> {
        let user_ok = credentials_match(&self.config.admin_username, username.trim());
        let pass_ok =
            !self.config.admin_password.is_empty() && credentials_match(&self.config.admin_password, password);
        if !(user_ok && pass_ok) {
            tracing::warn!("rejected login for {:?}", username);
            return Err(ApiError::Invalid("Invalid username or password.".into()));
        }

        let token = self.sessions.create().await;
        tracing::info!("operator {} logged in", username.trim());
        Ok(token)
    }

    pub async fn is_authenticated(&self, token: &str) -> bool {
        self.sessions.is_valid(token).await
    }

    /// Invalidate the session and drop all loading state.
    pub async fn logout(&self, token: &str) {
        if self.sessions.remove(token).await {
            tracing::info!("operator logged out");
        }
        self.loading.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn console() -> Console {
        let mut config = AppConfig::with_base_url("http://127.0.0.1:9");
        config.admin_password = "hunter2".into();
        Console::new(config).unwrap()
    }

    #[tokio::test]
    async fn login_requires_configured_credentials() {
        let console = console();
        assert!(console.login("root", "wrong").await.is_err());
        assert!(console.login("admin", "hunter2").await.is_err());

        let token = console.login("root", "hunter2").await.unwrap();
        assert!(console.is_authenticated(&token).await);
    }

    #[tokio::test]
    async fn empty_configured_password_never_matches() {
        let console = Console::new(AppConfig::with_base_url("http://127.0.0.1:9")).unwrap();
        assert!(console.login("root", "").await.is_err());
    }

    #[tokio::test]
    async fn logout_invalidates_the_session_and_resets_loading() {
        let console = console();
        let token = console.login("root", "hunter2").await.unwrap();
        console.loading.begin("ads");
        assert!(console.loading.is_loading("ads"));

        console.logout(&token).await;
        assert!(!console.is_authenticated(&token).await);
        assert!(!console.loading.is_loading("ads"));
        console.loading.end("ads", Duration::ZERO);
        assert_eq!(console.loading.active("ads"), 0);
    }
}
