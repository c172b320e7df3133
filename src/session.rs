use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;
use uuid::Uuid;

// ── Session Store ──────────────────────────────────────────────────────────

/// In-memory operator sessions. Each entry maps a session token (UUID) to
/// the instant it was issued. Tokens expire after `session_duration`.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Instant>>,
    pub session_duration: Duration,
}

impl SessionStore {
    pub fn new(session_duration_hours: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            session_duration: Duration::from_secs(session_duration_hours * 3600),
        }
    }

    /// Create a new session and return its token.
    pub async fn create(&self) -> String {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        // Prune expired sessions on every login
        sessions.retain(|_, issued_at| issued_at.elapsed() < self.session_duration);
        sessions.insert(token.clone(), Instant::now());
        token
    }

    /// `true` if the token exists and has not expired.
    pub async fn is_valid(&self, token: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .map(|issued_at| issued_at.elapsed() < self.session_duration)
            .unwrap_or(false)
    }

    /// Invalidate a session. Returns whether it existed.
    pub async fn remove(&self, token: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Compare two secrets without short-circuiting on the first mismatch.
pub fn credentials_match(expected: &str, given: &str) -> bool {
    let (a, b) = (expected.as_bytes(), given.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tokens_are_valid_until_removed() {
        let store = SessionStore::new(24);
        let token = store.create().await;
        assert!(store.is_valid(&token).await);
        assert!(!store.is_valid("not-a-token").await);

        assert!(store.remove(&token).await);
        assert!(!store.is_valid(&token).await);
        assert!(!store.remove(&token).await);
    }

    #[tokio::test]
    async fn zero_duration_sessions_expire_immediately() {
        let store = SessionStore::new(0);
        let token = store.create().await;
        assert!(!store.is_valid(&token).await);

        store.create().await;
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn credential_comparison() {
        assert!(credentials_match("s3cret", "s3cret"));
        assert!(!credentials_match("s3cret", "s3cres"));
        assert!(!credentials_match("s3cret", "s3cret!"));
    }
}
