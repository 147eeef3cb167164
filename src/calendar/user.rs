use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthProvider {
    Email,
    Google,
}

impl AuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthProvider::Email => "EMAIL",
            AuthProvider::Google => "GOOGLE",
        }
    }

    pub fn parse(value: &str) -> Option<AuthProvider> {
        match value {
            "EMAIL" => Some(AuthProvider::Email),
            "GOOGLE" => Some(AuthProvider::Google),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub provider: AuthProvider,
}

// The authenticated identity attached to a request. Resolution of the
// session token into this pair happens outside this crate; operations
// take it as an explicit argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
}

impl Principal {
    pub fn new(user_id: i64, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_round_trips_through_text() {
        for provider in [AuthProvider::Email, AuthProvider::Google] {
            assert_eq!(AuthProvider::parse(provider.as_str()), Some(provider));
        }
        assert_eq!(AuthProvider::parse("GITHUB"), None);
    }
}
