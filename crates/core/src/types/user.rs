//! Account user type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// A registered account as returned by the auth endpoints.
///
/// The server never includes the password hash in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Account document ID.
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Account email.
    pub email: Email,
    /// Display name shown in the client.
    pub display_name: String,
    /// Registration timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last successful login, if any.
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_login_user() {
        let json = r#"{
            "_id": "64a1f0c2e4b0a1b2c3d4e5f7",
            "email": "user@example.com",
            "displayName": "Test User",
            "createdAt": "2024-01-15T10:30:00.000Z"
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.email.as_str(), "user@example.com");
        assert_eq!(user.display_name, "Test User");
        assert!(user.last_login.is_none());
    }
}
