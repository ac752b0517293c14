//! Session context handed to everything that touches a user's records.

use serde::{Deserialize, Serialize};

/// How the current session was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Password,
    Google,
    GitHub,
}

impl Provider {
    /// Whether sign-in goes through a third-party popup.
    pub fn is_federated(self) -> bool {
        !matches!(self, Provider::Password)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Provider::Password => "password",
            Provider::Google => "google.com",
            Provider::GitHub => "github.com",
        };
        f.write_str(name)
    }
}

/// An authenticated user. All note and folder records are scoped by `uid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub provider: Provider,
}

impl Session {
    /// Get display name, falling back to email if name is not set.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }

    /// Profile photo, falling back to a generated avatar for the email.
    pub fn avatar_url(&self) -> String {
        match &self.photo_url {
            Some(url) => url.clone(),
            None => format!("https://ui-avatars.com/api/?name={}", self.email),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_fallbacks() {
        let session = Session {
            uid: "u1".to_string(),
            email: "ada@example.com".to_string(),
            display_name: None,
            photo_url: None,
            provider: Provider::Password,
        };
        assert_eq!(session.display_name(), "ada@example.com");
        assert_eq!(
            session.avatar_url(),
            "https://ui-avatars.com/api/?name=ada@example.com"
        );
        assert!(!session.provider.is_federated());
        assert!(Provider::Google.is_federated());
    }
}
