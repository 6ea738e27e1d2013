use std::sync::Arc;

use thiserror::Error;

use super::{
    path::{RequestPath, join_target},
    table::{Handler, Node, PathMatch, RouteTable},
};
use crate::{
    error::MalformedPath,
    guard::{Guard, GuardKind, first_denial},
    session::Session,
};

/// What the catch-all entry does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackAction {
    Render(Handler),
    Redirect(String),
}

/// Why a navigation was refused outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error(transparent)]
    MalformedPath(#[from] MalformedPath),

    #[error("gave up after {limit} redirect(s): {}", chain.join(" -> "))]
    RedirectLimit { limit: usize, chain: Vec<String> },
}

/// Outcome
///
/// The single result of resolving one path for one session.
///
/// - `Render`: an entry matched and every applicable guard passed.
/// - `Redirect`: a redirect entry matched, or a guard denied and the denial is surfaced as a
///   redirect (to the guard's own target, else to the fallback's target). Navigation
///   re-resolves the target.
/// - `Fallback`: nothing matched; the catch-all entry takes over.
/// - `Denied`: the path is malformed, or navigation ran out of redirect hops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Render(Handler),
    Redirect(String),
    Fallback(FallbackAction),
    Denied(DenyReason),
}

impl Outcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Render(_) => "render",
            Outcome::Redirect(_) => "redirect",
            Outcome::Fallback(_) => "fallback",
            Outcome::Denied(_) => "denied",
        }
    }

    /// The path navigation has to continue with, if any.
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Outcome::Redirect(target) | Outcome::Fallback(FallbackAction::Redirect(target)) => {
                Some(target)
            }
            _ => None,
        }
    }

    /// The handler that ends up on screen, if this outcome renders one directly.
    pub fn rendered(&self) -> Option<&Handler> {
        match self {
            Outcome::Render(handler) | Outcome::Fallback(FallbackAction::Render(handler)) => {
                Some(handler)
            }
            _ => None,
        }
    }
}

enum Matched<'t> {
    Render(&'t Handler),
    Redirect(String),
}

enum Step<'t> {
    Matched(Matched<'t>),
    NoMatch {
        denied: Option<&'t Arc<dyn Guard>>,
    },
}

/// Which guards a [`Resolver`] lets through.
#[derive(Clone, Copy)]
enum Mode<'a> {
    /// Every guard is evaluated against the session.
    Session(&'a Session),
    /// Every guard passes.
    Unguarded,
    /// Only this guard denies; every other guard passes.
    Denying(&'a Arc<dyn Guard>),
}

/// Depth-first matcher over a [`RouteTable`].
///
/// Table validation uses the two session-less modes: `unguarded` to follow redirect chains
/// statically, and `denying` to replay what a session refused by one particular guard goes
/// through after being sent to that guard's target.
pub(crate) struct Resolver<'a> {
    table: &'a RouteTable,
    mode: Mode<'a>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn guarded(table: &'a RouteTable, session: &'a Session) -> Self {
        Self {
            table,
            mode: Mode::Session(session),
        }
    }

    pub(crate) fn unguarded(table: &'a RouteTable) -> Self {
        Self {
            table,
            mode: Mode::Unguarded,
        }
    }

    pub(crate) fn denying(table: &'a RouteTable, guard: &'a Arc<dyn Guard>) -> Self {
        Self {
            table,
            mode: Mode::Denying(guard),
        }
    }

    pub(crate) fn resolve(&self, path: &RequestPath) -> Outcome {
        match self.walk(&self.table.routes, path.segments(), &[]) {
            Step::Matched(Matched::Render(handler)) => Outcome::Render(handler.clone()),
            Step::Matched(Matched::Redirect(target)) => Outcome::Redirect(target),
            Step::NoMatch {
                denied: Some(guard),
            } => match guard.denial_target() {
                Some(target) => Outcome::Redirect(join_target(&[], target)),
                None => match self.table.fallback_action() {
                    FallbackAction::Redirect(target) => Outcome::Redirect(target.clone()),
                    action => Outcome::Fallback(action.clone()),
                },
            },
            Step::NoMatch { denied: None } => {
                Outcome::Fallback(self.table.fallback_action().clone())
            }
        }
    }

    fn denied_by(&self, node: &'a Node, kind: GuardKind) -> Option<&'a Arc<dyn Guard>> {
        let guard = match self.mode {
            Mode::Unguarded => return None,
            Mode::Session(session) => first_denial(node.guards_of(kind), session)?,
            Mode::Denying(denying) => node
                .guards_of(kind)
                .map(|attached| &attached.guard)
                .find(|guard| Arc::ptr_eq(guard, denying))?,
        };
        tracing::debug!(
            guard = guard.name(),
            kind = kind.as_str(),
            route = node.pattern.as_str(),
            "guard denied"
        );
        Some(guard)
    }

    fn walk<'p>(&self, nodes: &'a [Node], remaining: &'p [String], base: &[&'p str]) -> Step<'a> {
        // Literal patterns win over patterns ending in a wildcard.
        let ordered = nodes
            .iter()
            .filter(|node| !node.pattern.has_wildcard())
            .chain(nodes.iter().filter(|node| node.pattern.has_wildcard()));

        let mut denied = None;
        for node in ordered {
            let Some(consumed) = node.pattern.match_prefix(remaining) else {
                continue;
            };
            let rest = &remaining[consumed..];
            let leaf = node.children.is_empty();
            if !rest.is_empty() && (leaf || node.path_match == PathMatch::Full) {
                continue;
            }

            if let Some(guard) = self.denied_by(node, GuardKind::Subtree) {
                denied = denied.or(Some(guard));
                continue;
            }

            if let Some(target) = &node.redirect {
                return Step::Matched(Matched::Redirect(join_target(base, target)));
            }

            if !leaf {
                let mut prefix = base.to_vec();
                prefix.extend(remaining[..consumed].iter().map(String::as_str));
                match self.walk(&node.children, rest, &prefix) {
                    Step::Matched(matched) => return Step::Matched(matched),
                    Step::NoMatch { denied: inner } => denied = denied.or(inner),
                }
            }

            if rest.is_empty() {
                if let Some(handler) = &node.handler {
                    if let Some(guard) = self.denied_by(node, GuardKind::Entry) {
                        denied = denied.or(Some(guard));
                        continue;
                    }
                    return Step::Matched(Matched::Render(handler));
                }
            }
        }

        Step::NoMatch { denied }
    }
}
