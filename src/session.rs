use std::{fmt, str::FromStr, sync::Arc};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// Role
///
/// The coarse RBAC level of a session. Guards only ever compare against these three values;
/// finer-grained permissions belong to the services behind the pages, not to navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    Guest,
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(Role::Guest),
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Session
///
/// A read-only snapshot of the authentication state, as seen by one navigation.
/// The authentication subsystem owns the live value (see [`SessionStore`]); the
/// route controller never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    pub is_authenticated: bool,
    pub role: Role,
    /// Identity of the signed-in user, only used for diagnostics.
    pub user_id: Option<Uuid>,
}

impl Session {
    /// A signed-out visitor.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user_id: Uuid, role: Role) -> Self {
        Self {
            is_authenticated: true,
            role,
            user_id: Some(user_id),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.is_authenticated && self.role == Role::Admin
    }
}

/// SessionStore
///
/// Holds the live session of the client. Writes (login/logout) replace the whole value, and
/// readers take an `Arc` snapshot that stays stable no matter what happens to the store
/// afterwards. A navigation reads exactly one snapshot, so it can never observe a torn
/// login/logout.
#[derive(Clone)]
pub struct SessionStore {
    current: Arc<ArcSwap<Session>>,
}

impl SessionStore {
    pub fn new(initial: Session) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(initial)),
        }
    }

    pub fn snapshot(&self) -> Arc<Session> {
        self.current.load_full()
    }

    pub fn login(&self, user_id: Uuid, role: Role) {
        tracing::debug!(%user_id, %role, "session signed in");
        self.current
            .store(Arc::new(Session::authenticated(user_id, role)));
    }

    pub fn logout(&self) {
        tracing::debug!("session signed out");
        self.current.store(Arc::new(Session::anonymous()));
    }

    /// Replaces the session wholesale, e.g. after a token refresh changed the role.
    pub fn replace(&self, session: Session) {
        self.current.store(Arc::new(session));
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Session::anonymous())
    }
}
