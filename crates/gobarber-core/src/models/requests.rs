use serde::{Deserialize, Serialize};

use super::Identity;

/// Body of `POST /sessions`
#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `POST /sessions`
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: Identity,
}

/// Body of `POST /users`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /password/forgot`
#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

/// Body of `PUT /profile`.
///
/// The password fields are only sent when the user typed their current
/// password; otherwise the backend leaves the password untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
}

impl ProfileUpdate {
    /// Build the request body from raw form input.
    /// Empty `old_password` drops all password fields.
    pub fn from_form(
        name: &str,
        email: &str,
        old_password: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Self {
        let changes_password = !old_password.is_empty();
        let keep = |s: &str| changes_password.then(|| s.to_string());
        Self {
            name: name.to_string(),
            email: email.to_string(),
            old_password: keep(old_password),
            password: keep(password),
            password_confirmation: keep(password_confirmation),
        }
    }

    pub fn changes_password(&self) -> bool {
        self.old_password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_without_password_omits_fields() {
        let update = ProfileUpdate::from_form("Ana", "a@b.com", "", "ignored", "ignored");
        assert!(!update.changes_password());
        let json = serde_json::to_value(&update).expect("serialize");
        assert_eq!(json, serde_json::json!({"name": "Ana", "email": "a@b.com"}));
    }

    #[test]
    fn test_profile_update_with_password_sends_all_fields() {
        let update = ProfileUpdate::from_form("Ana", "a@b.com", "old123", "new123", "new123");
        assert!(update.changes_password());
        let json = serde_json::to_value(&update).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Ana",
                "email": "a@b.com",
                "old_password": "old123",
                "password": "new123",
                "password_confirmation": "new123"
            })
        );
    }

    #[test]
    fn test_parse_session_response() {
        let json = r#"{"token":"tok123","user":{"id":"u1","name":"Ana","email":"a@b.com","avatar_url":"http://x/a.png"}}"#;
        let resp: SessionResponse = serde_json::from_str(json).expect("Failed to parse session JSON");
        assert_eq!(resp.token, "tok123");
        assert_eq!(resp.user.name, "Ana");
    }
}
