use crate::database::profile::SessionStore;
use crate::error::app_error::AppError;
use crate::models::session::SessionState;
use crate::models::user::Device;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct AccountState {
    is_logged_in: bool,
    current_session_key: Option<String>,
    devices: Vec<Device>,
}

/// In-memory [`SessionStore`] with the same claim/release semantics as the
/// Postgres implementation.
pub struct MockSessionStore {
    /// The one pre-provisioned account.
    pub user_id: Uuid,
    accounts: Mutex<HashMap<Uuid, AccountState>>,
}

impl MockSessionStore {
    pub fn with_account() -> Self {
        let user_id = Uuid::new_v4();
        let mut accounts = HashMap::new();
        accounts.insert(user_id, AccountState::default());

        Self {
            user_id,
            accounts: Mutex::new(accounts),
        }
    }

    pub fn devices(&self, user_id: &Uuid) -> Vec<Device> {
        self.accounts
            .lock()
            .unwrap()
            .get(user_id)
            .map(|account| account.devices.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl SessionStore for MockSessionStore {
    async fn session_state(&self, user_id: &Uuid) -> Result<Option<SessionState>, AppError> {
        Ok(self.accounts.lock().unwrap().get(user_id).map(|account| SessionState {
            is_logged_in: account.is_logged_in,
            current_session_key: account.current_session_key.clone(),
        }))
    }

    async fn begin_session(&self, user_id: &Uuid, session_key: &str) -> Result<bool, AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        let Some(account) = accounts.get_mut(user_id) else {
            return Ok(false);
        };
        if account.is_logged_in {
            return Ok(false);
        }

        account.is_logged_in = true;
        account.current_session_key = Some(session_key.to_string());
        Ok(true)
    }

    async fn end_session(&self, user_id: &Uuid) -> Result<bool, AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        let Some(account) = accounts.get_mut(user_id) else {
            return Ok(false);
        };

        let was_logged_in = account.is_logged_in;
        account.is_logged_in = false;
        account.current_session_key = None;
        Ok(was_logged_in)
    }

    async fn record_device(&self, user_id: &Uuid, device: &Device) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.get_mut(user_id)
            && !account.devices.iter().any(|known| known.same_client(device))
        {
            account.devices.push(device.clone());
        }
        Ok(())
    }
}
