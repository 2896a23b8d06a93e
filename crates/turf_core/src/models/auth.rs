use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Coach,
    Player,
    Family,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: UserRole,
}

/// Outcome of the external authentication provider. Never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub error: Option<String>,
}

impl AuthState {
    pub fn signed_in(user: User) -> Self {
        Self { is_authenticated: true, user: Some(user), error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { is_authenticated: false, user: None, error: Some(error.into()) }
    }
}
