use std::sync::Arc;

use crate::{
    loader::{LazyLoader, LoadTicket},
    routing::{DenyReason, FallbackAction, Handler, HandlerId, Outcome, RouteTable},
    session::{Session, SessionStore},
};

/// NavigationSink
///
/// The rendering collaborator. Navigation tells it what to do; it decides how that looks.
pub trait NavigationSink {
    fn render(&mut self, handler: &Handler);

    /// Called once per redirect hop, before the target is resolved.
    fn redirect_to(&mut self, path: &str);

    /// Called when a path is refused, e.g. to show an access-denied or not-found message.
    fn deny_with_feedback(&mut self, reason: &DenyReason);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Render(HandlerId),
    RedirectTo(String),
    Denied(String),
}

/// A sink that only remembers what it was told, in order.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub events: Vec<SinkEvent>,
}

impl NavigationSink for Recorder {
    fn render(&mut self, handler: &Handler) {
        self.events.push(SinkEvent::Render(handler.id.clone()));
    }

    fn redirect_to(&mut self, path: &str) {
        self.events.push(SinkEvent::RedirectTo(path.to_string()));
    }

    fn deny_with_feedback(&mut self, reason: &DenyReason) {
        self.events.push(SinkEvent::Denied(reason.to_string()));
    }
}

/// Navigation
///
/// Record of one completed navigation: what was asked for, every redirect hop that was
/// followed, and the outcome it settled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub requested: String,
    pub hops: Vec<String>,
    pub outcome: Outcome,
    /// Set when the requested path was refused before the fallback took over.
    pub feedback: Option<DenyReason>,
}

impl Navigation {
    pub fn rendered(&self) -> Option<&Handler> {
        self.outcome.rendered()
    }
}

/// Resolves `requested` for `session` and drives `sink` until a handler is rendered or the
/// navigation is refused.
///
/// Redirects (including a redirecting fallback) are re-resolved against the same session,
/// up to `table.max_redirect_hops()` times; one more is refused with
/// [`DenyReason::RedirectLimit`]. A malformed path is reported through
/// `deny_with_feedback` and then handed to the fallback, like any unknown page.
pub fn navigate<S: NavigationSink + ?Sized>(
    table: &RouteTable,
    requested: &str,
    session: &Session,
    sink: &mut S,
) -> Navigation {
    let mut hops: Vec<String> = Vec::new();
    let mut feedback = None;
    let mut outcome = table.resolve(requested, session);

    loop {
        match &outcome {
            Outcome::Render(handler) | Outcome::Fallback(FallbackAction::Render(handler)) => {
                sink.render(handler);
                break;
            }
            Outcome::Redirect(target) | Outcome::Fallback(FallbackAction::Redirect(target)) => {
                let target = target.clone();
                if hops.len() >= table.max_redirect_hops() {
                    let mut chain = Vec::with_capacity(hops.len() + 2);
                    chain.push(requested.to_string());
                    chain.extend(hops.iter().cloned());
                    chain.push(target);
                    let reason = DenyReason::RedirectLimit {
                        limit: table.max_redirect_hops(),
                        chain,
                    };
                    tracing::warn!(%reason, "redirect limit reached");
                    sink.deny_with_feedback(&reason);
                    outcome = Outcome::Denied(reason);
                    break;
                }
                tracing::debug!(from = %requested, to = %target, hop = hops.len() + 1, "redirect");
                sink.redirect_to(&target);
                outcome = table.resolve(&target, session);
                hops.push(target);
            }
            Outcome::Denied(reason @ DenyReason::MalformedPath(_)) => {
                sink.deny_with_feedback(reason);
                feedback = Some(reason.clone());
                outcome = Outcome::Fallback(table.fallback_action().clone());
            }
            Outcome::Denied(reason) => {
                sink.deny_with_feedback(reason);
                break;
            }
        }
    }

    tracing::debug!(
        requested,
        outcome = outcome.kind(),
        hops = hops.len(),
        "navigation settled"
    );

    Navigation {
        requested: requested.to_string(),
        hops,
        outcome,
        feedback,
    }
}

/// A navigation together with the lazy load it started, if the rendered handler is lazy.
pub struct Navigated {
    pub navigation: Navigation,
    pub load: Option<LoadTicket>,
}

/// Navigator
///
/// The client-side controller: a shared route table, the live session store owned by the
/// authentication subsystem, and an optional lazy loader.
///
/// Each call to [`navigate`](Self::navigate) takes one session snapshot and uses it for the
/// whole navigation, redirects included. Rendering a lazy handler starts its load; any other
/// navigation supersedes whatever load was still running.
pub struct Navigator {
    table: Arc<RouteTable>,
    sessions: SessionStore,
    loader: Option<LazyLoader>,
}

impl Navigator {
    pub fn new(table: Arc<RouteTable>, sessions: SessionStore) -> Self {
        Self {
            table,
            sessions,
            loader: None,
        }
    }

    pub fn with_loader(mut self, loader: LazyLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn navigate<S: NavigationSink + ?Sized>(&self, requested: &str, sink: &mut S) -> Navigated {
        let session = self.sessions.snapshot();
        let navigation = navigate(&self.table, requested, &session, sink);

        let load = match (&self.loader, navigation.rendered()) {
            (Some(loader), Some(handler)) if handler.is_lazy() => {
                Some(loader.begin(handler.id.clone()))
            }
            (Some(loader), _) => {
                loader.supersede();
                None
            }
            (None, _) => None,
        };

        Navigated { navigation, load }
    }
}
