//! Single-session enforcement for accounts.
//!
//! Each account is either logged out or logged in under exactly one session
//! key. Claiming a session is an atomic compare-and-set in the store, so two
//! concurrent logins for the same account cannot both succeed.

use crate::database::profile::SessionStore;
use crate::error::app_error::AppError;
use crate::models::user::Device;
use tracing::{info, warn};
use uuid::Uuid;

pub struct SessionGuard<'a, S: SessionStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: SessionStore + ?Sized> SessionGuard<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Claim the account's single session slot and record the device.
    ///
    /// Fails with [`AppError::SessionInUse`] while another session holds the
    /// account; there is no forced takeover.
    pub async fn login(&self, user_id: &Uuid, device: Device) -> Result<String, AppError> {
        let session_key = generate_session_key();
        if !self.store.begin_session(user_id, &session_key).await? {
            return Err(AppError::SessionInUse);
        }
        self.store.record_device(user_id, &device).await?;
        info!(%user_id, "session started");

        Ok(session_key)
    }

    /// Release the session slot. Logging out an already logged-out account
    /// is a no-op success.
    pub async fn logout(&self, user_id: &Uuid) -> Result<(), AppError> {
        self.store.end_session(user_id).await?;
        Ok(())
    }

    /// Server-side logout triggered by an expired refresh token. Best-effort:
    /// failures are logged, never surfaced to the request that noticed the
    /// expiry. Returns whether a live session was actually cleared.
    pub async fn force_logout(&self, user_id: &Uuid) -> bool {
        match self.store.end_session(user_id).await {
            Ok(cleared) => {
                if cleared {
                    info!(%user_id, "user automatically logged out due to token expiry");
                }
                cleared
            }
            Err(e) => {
                warn!(%user_id, error = ?e, "failed to force logout user");
                false
            }
        }
    }

    /// Check an authenticated request against the stored session.
    ///
    /// A key that differs from the stored one signals concurrent use from a
    /// second client: the request is denied, but the stored session is left
    /// untouched.
    pub async fn authorize(&self, user_id: &Uuid, presented_key: Option<&str>) -> Result<(), AppError> {
        let state = self.store.session_state(user_id).await?.ok_or(AppError::UserNotFound)?;
        if !state.is_logged_in {
            return Err(AppError::Unauthorized);
        }
        match (state.current_session_key.as_deref(), presented_key) {
            (Some(stored), Some(presented)) if stored == presented => Ok(()),
            _ => Err(AppError::SessionMismatch),
        }
    }
}

/// Opaque per-login session key.
pub fn generate_session_key() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockSessionStore;
    use chrono::Utc;

    fn device(ip: &str) -> Device {
        Device {
            ip: ip.to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            last_login: Utc::now(),
        }
    }

    #[tokio::test]
    async fn login_claims_the_session_slot() {
        let store = MockSessionStore::with_account();
        let guard = SessionGuard::new(&store);
        let key = guard.login(&store.user_id, device("203.0.113.9")).await.unwrap();

        let state = store.session_state(&store.user_id).await.unwrap().unwrap();
        assert!(state.is_logged_in);
        assert_eq!(state.current_session_key.as_deref(), Some(key.as_str()));
    }

    #[tokio::test]
    async fn second_login_is_denied_while_session_is_live() {
        let store = MockSessionStore::with_account();
        let guard = SessionGuard::new(&store);
        guard.login(&store.user_id, device("203.0.113.9")).await.unwrap();

        let second = guard.login(&store.user_id, device("198.51.100.4")).await;
        assert!(matches!(second, Err(AppError::SessionInUse)));
    }

    #[tokio::test]
    async fn login_succeeds_again_after_logout() {
        let store = MockSessionStore::with_account();
        let guard = SessionGuard::new(&store);
        let first = guard.login(&store.user_id, device("203.0.113.9")).await.unwrap();
        guard.logout(&store.user_id).await.unwrap();

        let second = guard.login(&store.user_id, device("198.51.100.4")).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let store = MockSessionStore::with_account();
        let guard = SessionGuard::new(&store);
        guard.logout(&store.user_id).await.unwrap();
        guard.logout(&store.user_id).await.unwrap();
    }

    #[tokio::test]
    async fn force_logout_reports_whether_a_session_was_cleared() {
        let store = MockSessionStore::with_account();
        let guard = SessionGuard::new(&store);
        assert!(!guard.force_logout(&store.user_id).await);

        guard.login(&store.user_id, device("203.0.113.9")).await.unwrap();
        assert!(guard.force_logout(&store.user_id).await);

        let state = store.session_state(&store.user_id).await.unwrap().unwrap();
        assert!(!state.is_logged_in);
        assert!(state.current_session_key.is_none());
    }

    #[tokio::test]
    async fn mismatched_key_is_denied_without_clearing_the_session() {
        let store = MockSessionStore::with_account();
        let guard = SessionGuard::new(&store);
        let key = guard.login(&store.user_id, device("203.0.113.9")).await.unwrap();

        let denied = guard.authorize(&store.user_id, Some("some-other-key")).await;
        assert!(matches!(denied, Err(AppError::SessionMismatch)));

        // The legitimate client is still authorized afterwards.
        guard.authorize(&store.user_id, Some(&key)).await.unwrap();
    }

    #[tokio::test]
    async fn missing_key_counts_as_mismatch() {
        let store = MockSessionStore::with_account();
        let guard = SessionGuard::new(&store);
        guard.login(&store.user_id, device("203.0.113.9")).await.unwrap();

        let denied = guard.authorize(&store.user_id, None).await;
        assert!(matches!(denied, Err(AppError::SessionMismatch)));
    }

    #[tokio::test]
    async fn logged_out_account_is_unauthorized() {
        let store = MockSessionStore::with_account();
        let guard = SessionGuard::new(&store);
        let denied = guard.authorize(&store.user_id, Some("anything")).await;
        assert!(matches!(denied, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let store = MockSessionStore::with_account();
        let guard = SessionGuard::new(&store);
        let denied = guard.authorize(&Uuid::new_v4(), Some("anything")).await;
        assert!(matches!(denied, Err(AppError::UserNotFound)));
    }

    #[tokio::test]
    async fn device_history_deduplicates_same_client() {
        let store = MockSessionStore::with_account();
        let guard = SessionGuard::new(&store);

        guard.login(&store.user_id, device("203.0.113.9")).await.unwrap();
        guard.logout(&store.user_id).await.unwrap();
        guard.login(&store.user_id, device("203.0.113.9")).await.unwrap();
        guard.logout(&store.user_id).await.unwrap();
        guard.login(&store.user_id, device("198.51.100.4")).await.unwrap();

        let devices = store.devices(&store.user_id);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].ip, "203.0.113.9");
        assert_eq!(devices[1].ip, "198.51.100.4");
    }
}
