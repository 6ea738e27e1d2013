use std::{fmt, sync::Arc};

use crate::session::{Role, Session};

/// Guard
///
/// The single capability every access predicate implements. Entry guards and subtree guards
/// share this trait; they only differ in *when* the route controller calls `evaluate`
/// (see [`GuardKind`]).
///
/// Implementations must be pure functions of the session: the controller is allowed to call
/// them any number of times during one resolution.
pub trait Guard: Send + Sync + fmt::Debug {
    /// Stable name used in logs and in the published route table.
    fn name(&self) -> &str;

    fn evaluate(&self, session: &Session) -> bool;

    /// Where a denied session is sent. `None` defers to the table's catch-all fallback.
    fn denial_target(&self) -> Option<&str> {
        None
    }
}

/// GuardKind
///
/// - `Entry`: evaluated only when the guarded entry is the final match that would render.
/// - `Subtree`: evaluated as soon as the entry's pattern matches, before any child is tried.
///   A denial makes the whole subtree unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    Entry,
    Subtree,
}

impl GuardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardKind::Entry => "entry",
            GuardKind::Subtree => "subtree",
        }
    }
}

/// A guard attached to a route, tagged with the moment it runs.
#[derive(Debug, Clone)]
pub struct AttachedGuard {
    pub kind: GuardKind,
    pub guard: Arc<dyn Guard>,
}

/// Outcome of running a list of guards: the first guard that said no, if any.
pub(crate) fn first_denial<'a>(
    guards: impl IntoIterator<Item = &'a AttachedGuard>,
    session: &Session,
) -> Option<&'a Arc<dyn Guard>> {
    guards
        .into_iter()
        .map(|attached| &attached.guard)
        .find(|guard| !guard.evaluate(session))
}

// --- Built-in guards ---

/// Lets through only visitors that are not signed in (login, register).
#[derive(Debug, Clone, Default)]
pub struct NotAuthenticated {
    deny_to: Option<String>,
}

impl NotAuthenticated {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_to(mut self, target: impl Into<String>) -> Self {
        self.deny_to = Some(target.into());
        self
    }
}

impl Guard for NotAuthenticated {
    fn name(&self) -> &str {
        "not-authenticated"
    }

    fn evaluate(&self, session: &Session) -> bool {
        !session.is_authenticated
    }

    fn denial_target(&self) -> Option<&str> {
        self.deny_to.as_deref()
    }
}

/// Lets through only signed-in visitors, whatever their role.
#[derive(Debug, Clone, Default)]
pub struct RequireAuthenticated {
    deny_to: Option<String>,
}

impl RequireAuthenticated {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_to(mut self, target: impl Into<String>) -> Self {
        self.deny_to = Some(target.into());
        self
    }
}

impl Guard for RequireAuthenticated {
    fn name(&self) -> &str {
        "require-authenticated"
    }

    fn evaluate(&self, session: &Session) -> bool {
        session.is_authenticated
    }

    fn denial_target(&self) -> Option<&str> {
        self.deny_to.as_deref()
    }
}

/// Lets through only authenticated administrators.
#[derive(Debug, Clone, Default)]
pub struct IsAdmin {
    deny_to: Option<String>,
}

impl IsAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_to(mut self, target: impl Into<String>) -> Self {
        self.deny_to = Some(target.into());
        self
    }
}

impl Guard for IsAdmin {
    fn name(&self) -> &str {
        "is-admin"
    }

    fn evaluate(&self, session: &Session) -> bool {
        session.is_admin()
    }

    fn denial_target(&self) -> Option<&str> {
        self.deny_to.as_deref()
    }
}

/// Lets through authenticated sessions holding one of the listed roles.
#[derive(Debug, Clone)]
pub struct HasRole {
    name: String,
    roles: Vec<Role>,
    deny_to: Option<String>,
}

impl HasRole {
    pub fn any_of(roles: impl IntoIterator<Item = Role>) -> Self {
        let roles: Vec<Role> = roles.into_iter().collect();
        let name = format!(
            "has-role({})",
            roles.iter().map(Role::as_str).collect::<Vec<_>>().join("|")
        );
        Self {
            name,
            roles,
            deny_to: None,
        }
    }

    pub fn deny_to(mut self, target: impl Into<String>) -> Self {
        self.deny_to = Some(target.into());
        self
    }
}

impl Guard for HasRole {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, session: &Session) -> bool {
        session.is_authenticated && self.roles.contains(&session.role)
    }

    fn denial_target(&self) -> Option<&str> {
        self.deny_to.as_deref()
    }
}

/// FnGuard
///
/// Adapts a plain predicate into a [`Guard`], for one-off rules that do not deserve a type.
pub struct FnGuard<F> {
    name: String,
    predicate: F,
    deny_to: Option<String>,
}

impl<F> FnGuard<F>
where
    F: Fn(&Session) -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
            deny_to: None,
        }
    }

    pub fn deny_to(mut self, target: impl Into<String>) -> Self {
        self.deny_to = Some(target.into());
        self
    }
}

impl<F> fmt::Debug for FnGuard<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnGuard")
            .field("name", &self.name)
            .field("deny_to", &self.deny_to)
            .finish_non_exhaustive()
    }
}

impl<F> Guard for FnGuard<F>
where
    F: Fn(&Session) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, session: &Session) -> bool {
        (self.predicate)(session)
    }

    fn denial_target(&self) -> Option<&str> {
        self.deny_to.as_deref()
    }
}
