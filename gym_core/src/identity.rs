//! Signed-in user lookup.
//!
//! Sign-in itself belongs to the external identity service; the engine only
//! asks who is signed in so saved-workout storage can be scoped and gated.

use crate::config::UserConfig;
use crate::{Error, Result};

/// A signed-in user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
}

pub trait Identity {
    fn current_user(&self) -> Option<User>;
}

/// Identity fixed at startup, e.g. from config
#[derive(Clone, Debug, Default)]
pub struct StaticIdentity {
    user: Option<User>,
}

impl StaticIdentity {
    pub fn signed_in(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn from_config(config: &UserConfig) -> Self {
        let user = config
            .id
            .as_ref()
            .filter(|id| !id.trim().is_empty())
            .map(|id| User {
                id: id.clone(),
                email: config.email.clone(),
            });
        Self { user }
    }
}

impl Identity for StaticIdentity {
    fn current_user(&self) -> Option<User> {
        self.user.clone()
    }
}

/// The signed-in user, or a persistence error explaining that one is needed
pub fn require_user(identity: &dyn Identity) -> Result<User> {
    identity
        .current_user()
        .ok_or_else(|| Error::Persistence("sign in to use saved workouts".into()))
}
