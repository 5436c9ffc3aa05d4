pub mod comment;
pub mod course;
pub mod pagination;
pub mod session;
pub mod subscription;
pub mod user;
pub mod video;

use serde::Serialize;

/// Plain `{ "message": ... }` body used by mutation endpoints.
#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
