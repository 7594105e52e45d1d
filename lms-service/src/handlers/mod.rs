//! HTTP handlers for the LMS backend.

pub mod auth;
pub mod course;
pub mod employee_permission;
pub mod master;
pub mod permission;
pub mod role;
pub mod submaster;
pub mod user;

use serde::Serialize;

/// The `{message, data?}` envelope every successful response uses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: &str, data: T) -> Self {
        Self {
            message: message.to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message_only(message: &str) -> Self {
        Self {
            message: message.to_string(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::new("ok", 5)).unwrap();
        assert_eq!(json["message"], "ok");
        assert_eq!(json["data"], 5);
    }

    #[test]
    fn test_message_only_omits_data() {
        let json = serde_json::to_value(ApiResponse::message_only("gone")).unwrap();
        assert!(json.get("data").is_none());
    }
}
