//! # Authentication state and role
//!
//! [`AuthState`] is the value every view reads. It is a small state machine:
//!
//! ```text
//! Uninitialized -> Loading -> Authenticated { identity, profile }
//!                          -> Anonymous
//! ```
//!
//! A profile can only exist next to an identity, which the enum shape enforces.
//! The authorization decision is never stored: [`AuthState::role`] and
//! [`AuthState::is_admin`] derive it from the profile on every call, and anything
//! other than a profile whose role is exactly `"admin"` yields [`Role::User`].

use backend::{Identity, Profile};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn parse(role: &str) -> Self {
        match role {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn from_profile(profile: Option<&Profile>) -> Self {
        profile
            .and_then(|p| p.role.as_deref())
            .map(Role::parse)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Uninitialized,
    Loading,
    Authenticated {
        identity: Identity,
        /// `None` when the profile could not be resolved.
        profile: Option<Profile>,
    },
    Anonymous,
}

impl AuthState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            AuthState::Authenticated { profile, .. } => profile.as_ref(),
            _ => None,
        }
    }

    pub fn role(&self) -> Role {
        Role::from_profile(self.profile())
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    /// True until the first session lookup has finished.
    pub fn auth_loading(&self) -> bool {
        matches!(self, AuthState::Uninitialized | AuthState::Loading)
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticated(role: Option<&str>) -> AuthState {
        AuthState::Authenticated {
            identity: Identity {
                id: "u-1".to_string(),
                email: None,
            },
            profile: Some(Profile {
                id: "u-1".to_string(),
                email: None,
                full_name: None,
                role: role.map(String::from),
            }),
        }
    }

    #[test]
    fn only_exact_admin_is_privileged() {
        assert!(authenticated(Some("admin")).is_admin());
        for role in [Some("user"), Some("Admin"), Some("administrator"), Some(""), None] {
            let state = authenticated(role);
            assert!(!state.is_admin(), "{role:?} must not be admin");
            assert_eq!(state.role(), Role::User);
        }
    }

    #[test]
    fn missing_profile_is_least_privilege() {
        let state = AuthState::Authenticated {
            identity: Identity {
                id: "u-1".to_string(),
                email: None,
            },
            profile: None,
        };
        assert!(state.is_signed_in());
        assert_eq!(state.role().as_str(), "user");
        assert!(!state.is_admin());
    }

    #[test]
    fn loading_flag_follows_phase() {
        assert!(AuthState::default().auth_loading());
        assert!(AuthState::Loading.auth_loading());
        assert!(!AuthState::Anonymous.auth_loading());
        assert!(!authenticated(None).auth_loading());
        assert!(AuthState::Anonymous.identity().is_none());
        assert!(AuthState::Anonymous.profile().is_none());
    }
}
