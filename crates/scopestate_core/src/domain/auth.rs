//! Authentication flag domain.

use crate::domain::StateDomain;
use crate::scope::Handle;
use serde::{Deserialize, Serialize};

/// Login state shared across the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthState {
    pub is_logged_in: bool,
}

impl AuthState {
    pub fn logged_in() -> Self {
        Self { is_logged_in: true }
    }

    pub fn logged_out() -> Self {
        Self {
            is_logged_in: false,
        }
    }
}

/// Mutation operations of the auth domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOp {
    Login,
    Logout,
}

/// Auth domain marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct Auth;

impl StateDomain for Auth {
    type Value = AuthState;
    type Op = AuthOp;

    const NAME: &'static str = "auth";

    fn initial() -> AuthState {
        AuthState::logged_out()
    }

    // Both operations ignore the prior value.
    fn apply(op: AuthOp, _current: &AuthState) -> AuthState {
        match op {
            AuthOp::Login => AuthState::logged_in(),
            AuthOp::Logout => AuthState::logged_out(),
        }
    }
}

impl Handle<Auth> {
    pub fn is_logged_in(&self) -> bool {
        self.value().is_logged_in
    }

    pub fn login(&self) {
        self.dispatch(AuthOp::Login);
    }

    pub fn logout(&self) {
        self.dispatch(AuthOp::Logout);
    }
}

#[cfg(test)]
mod tests {
    use super::{Auth, AuthOp, AuthState};
    use crate::domain::StateDomain;

    #[test]
    fn login_and_logout_ignore_prior_value() {
        for prior in [AuthState::logged_in(), AuthState::logged_out()] {
            assert_eq!(Auth::apply(AuthOp::Login, &prior), AuthState::logged_in());
            assert_eq!(Auth::apply(AuthOp::Logout, &prior), AuthState::logged_out());
        }
    }

    #[test]
    fn starts_logged_out() {
        assert!(!Auth::initial().is_logged_in);
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let state: AuthState = serde_json::from_str("{}").expect("empty object should parse");
        assert_eq!(state, AuthState::logged_out());
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = serde_json::from_str::<AuthState>(r#"{"isLoggedIn":true}"#)
            .expect_err("camelCase field must be rejected");
        assert!(err.to_string().contains("isLoggedIn"));
    }
}
