use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-account login state as stored on the profile row.
///
/// `is_logged_in = true` implies `current_session_key` is set and names the
/// single live session for the account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionState {
    pub is_logged_in: bool,
    pub current_session_key: Option<String>,
}

/// JWT payload for both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub kind: TokenKind,
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}
