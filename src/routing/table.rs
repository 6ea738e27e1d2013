use std::{collections::HashSet, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use super::{
    path::{Pattern, RequestPath, join_target},
    resolve::{DenyReason, FallbackAction, Outcome, Resolver},
};
use crate::{
    error::ConfigurationError,
    guard::{AttachedGuard, Guard, GuardKind},
    session::Session,
};

/// Default bound on redirect hops followed by a single navigation.
pub const DEFAULT_MAX_REDIRECT_HOPS: usize = 1;

/// HandlerId
///
/// Opaque identity of a renderable unit. The route controller never looks inside it; the
/// rendering collaborator and the lazy loader use it as a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerId(String);

impl HandlerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandlerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// How the code behind a handler becomes available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Loading {
    #[default]
    Eager,
    /// Fetched on first render through a [`crate::loader::LazyLoader`].
    Lazy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    pub id: HandlerId,
    pub loading: Loading,
}

impl Handler {
    pub fn is_lazy(&self) -> bool {
        self.loading == Loading::Lazy
    }
}

/// PathMatch
///
/// `Prefix` lets an entry with children consume the front of the path and hand the rest to
/// its children. `Full` only matches when nothing is left over. Leaves always behave as `Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathMatch {
    #[default]
    Prefix,
    Full,
}

/// Route
///
/// Builder for one entry of the route table. Nothing is validated here; a list of routes
/// becomes usable only through [`RouteTable::new`], which rejects every structural mistake.
///
/// ```
/// use storefront_nav::{Route, guard::IsAdmin};
///
/// let admin = Route::new("admin")
///     .subtree_guard(IsAdmin::new())
///     .children([
///         Route::new("dashboard").lazy_handler("admin-dashboard"),
///         Route::new("").redirect_to("dashboard").full_match(),
///     ]);
/// ```
#[derive(Debug, Clone)]
pub struct Route {
    path: String,
    handler: Option<Handler>,
    redirect: Option<String>,
    path_match: PathMatch,
    guards: Vec<AttachedGuard>,
    children: Vec<Route>,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            handler: None,
            redirect: None,
            path_match: PathMatch::Prefix,
            guards: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn handler(mut self, id: impl Into<HandlerId>) -> Self {
        self.handler = Some(Handler {
            id: id.into(),
            loading: Loading::Eager,
        });
        self
    }

    pub fn lazy_handler(mut self, id: impl Into<HandlerId>) -> Self {
        self.handler = Some(Handler {
            id: id.into(),
            loading: Loading::Lazy,
        });
        self
    }

    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    pub fn full_match(mut self) -> Self {
        self.path_match = PathMatch::Full;
        self
    }

    pub fn entry_guard(self, guard: impl Guard + 'static) -> Self {
        self.guard(GuardKind::Entry, Arc::new(guard))
    }

    pub fn subtree_guard(self, guard: impl Guard + 'static) -> Self {
        self.guard(GuardKind::Subtree, Arc::new(guard))
    }

    /// Attaches an already shared guard. Guards run in the order they were attached.
    pub fn guard(mut self, kind: GuardKind, guard: Arc<dyn Guard>) -> Self {
        self.guards.push(AttachedGuard { kind, guard });
        self
    }

    pub fn child(mut self, route: Route) -> Self {
        self.children.push(route);
        self
    }

    pub fn children(mut self, routes: impl IntoIterator<Item = Route>) -> Self {
        self.children.extend(routes);
        self
    }
}

/// Compiled form of a [`Route`].
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) pattern: Pattern,
    pub(crate) handler: Option<Handler>,
    pub(crate) redirect: Option<String>,
    pub(crate) path_match: PathMatch,
    pub(crate) guards: Vec<AttachedGuard>,
    pub(crate) children: Vec<Node>,
}

impl Node {
    pub(crate) fn guards_of(&self, kind: GuardKind) -> impl Iterator<Item = &AttachedGuard> {
        self.guards.iter().filter(move |attached| attached.kind == kind)
    }
}

/// One flattened entry of the table, with its absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub path: String,
    pub handler: Option<Handler>,
    pub redirect: Option<String>,
    pub guards: Vec<(GuardKind, String)>,
}

/// RouteTable
///
/// The immutable tree of navigable paths. It is built once at start-up, shared as
/// `Arc<RouteTable>`, and only ever read afterwards.
#[derive(Debug)]
pub struct RouteTable {
    pub(crate) routes: Vec<Node>,
    fallback: Node,
    fallback_action: FallbackAction,
    max_redirect_hops: usize,
}

impl RouteTable {
    pub fn new(routes: impl IntoIterator<Item = Route>) -> Result<Self, ConfigurationError> {
        Self::with_hop_bound(routes, DEFAULT_MAX_REDIRECT_HOPS)
    }

    /// Builds and validates a table whose navigations may follow up to `max_redirect_hops`
    /// redirects.
    pub fn with_hop_bound(
        routes: impl IntoIterator<Item = Route>,
        max_redirect_hops: usize,
    ) -> Result<Self, ConfigurationError> {
        if max_redirect_hops == 0 {
            return Err(ConfigurationError::InvalidHopBound);
        }

        let mut nodes = compile_level(routes.into_iter().collect(), "")?;

        let fallback_index = nodes
            .iter()
            .position(|node| node.pattern.is_catch_all())
            .ok_or(ConfigurationError::MissingFallback)?;
        let fallback = nodes.remove(fallback_index);
        if !fallback.guards.is_empty() {
            return Err(ConfigurationError::InvalidFallback {
                reason: "the fallback must not be guarded".to_string(),
            });
        }
        if !fallback.children.is_empty() {
            return Err(ConfigurationError::InvalidFallback {
                reason: "the fallback must not have children".to_string(),
            });
        }

        let fallback_action = match (&fallback.handler, &fallback.redirect) {
            (_, Some(target)) => FallbackAction::Redirect(join_target(&[], target)),
            (Some(handler), None) => FallbackAction::Render(handler.clone()),
            (None, None) => {
                return Err(ConfigurationError::InvalidFallback {
                    reason: "the fallback needs a handler or a redirect".to_string(),
                });
            }
        };

        let table = Self {
            routes: nodes,
            fallback,
            fallback_action,
            max_redirect_hops,
        };
        table.check_targets()?;

        tracing::debug!(
            routes = table.routes.len(),
            max_redirect_hops,
            "route table built"
        );
        Ok(table)
    }

    pub fn max_redirect_hops(&self) -> usize {
        self.max_redirect_hops
    }

    /// What the catch-all entry does when nothing else matches.
    pub fn fallback_action(&self) -> &FallbackAction {
        &self.fallback_action
    }

    /// Resolves `requested_path` for `session`. Pure: the same inputs always give the same
    /// outcome.
    pub fn resolve(&self, requested_path: &str, session: &Session) -> Outcome {
        match RequestPath::parse(requested_path) {
            Ok(path) => self.resolve_path(&path, session),
            Err(malformed) => {
                tracing::debug!(error = %malformed, "rejecting malformed path");
                Outcome::Denied(DenyReason::MalformedPath(malformed))
            }
        }
    }

    pub fn resolve_path(&self, path: &RequestPath, session: &Session) -> Outcome {
        Resolver::guarded(self, session).resolve(path)
    }

    /// The table flattened depth-first, with absolute paths, fallback last.
    pub fn entries(&self) -> Vec<RouteInfo> {
        let mut out = Vec::new();
        flatten(&self.routes, "", &mut out);
        flatten(std::slice::from_ref(&self.fallback), "", &mut out);
        out
    }

    /// Follows every statically known redirect and denial target with guards ignored, and
    /// rejects cycles, over-long chains and targets that never reach a handler. Then replays
    /// each guard's denials to catch guards that send sessions back behind themselves.
    fn check_targets(&self) -> Result<(), ConfigurationError> {
        let mut targets: Vec<(String, String)> = Vec::new();
        collect_redirects(&self.routes, &mut Vec::new(), &mut targets);
        if let Some(target) = &self.fallback.redirect {
            targets.push((
                self.fallback.pattern.as_str().to_string(),
                join_target(&[], target),
            ));
        }
        let fallback_target = match &self.fallback_action {
            FallbackAction::Redirect(target) => Some(target.as_str()),
            FallbackAction::Render(_) => None,
        };
        let mut denials = Vec::new();
        collect_denials(&self.routes, "", fallback_target, &mut denials);
        targets.extend(
            denials
                .iter()
                .filter(|denial| denial.guard.denial_target().is_some())
                .map(|denial| (denial.source_path.clone(), denial.target.clone())),
        );

        let resolver = Resolver::unguarded(self);
        for (source_path, target) in targets {
            let mut chain = vec![source_path.clone(), target.clone()];
            let mut current = target.clone();
            loop {
                let unresolvable = || ConfigurationError::UnresolvableTarget {
                    source_path: source_path.clone(),
                    target: target.clone(),
                };
                let path = RequestPath::parse(&current).map_err(|_| unresolvable())?;
                match resolver.resolve(&path) {
                    Outcome::Render(_) => break,
                    Outcome::Redirect(next) => {
                        if chain.contains(&next) {
                            chain.push(next);
                            return Err(ConfigurationError::RedirectCycle { chain });
                        }
                        chain.push(next.clone());
                        // The source itself accounts for the first hop.
                        if chain.len() - 1 > self.max_redirect_hops {
                            return Err(ConfigurationError::RedirectChainTooLong {
                                chain,
                                limit: self.max_redirect_hops,
                            });
                        }
                        current = next;
                    }
                    Outcome::Fallback(_) | Outcome::Denied(_) => return Err(unresolvable()),
                }
            }
        }

        for denial in &denials {
            self.check_denial_loop(denial)?;
        }
        Ok(())
    }

    /// Replays a denial for a session only `denial.guard` refuses. A guard is a pure function
    /// of the session, so if that replay comes back to a path already visited, every session
    /// the guard refuses bounces between the same pages forever.
    fn check_denial_loop(&self, denial: &Denial<'_>) -> Result<(), ConfigurationError> {
        let resolver = Resolver::denying(self, denial.guard);
        let mut chain = vec![denial.source_path.clone(), denial.target.clone()];
        let mut current = denial.target.clone();
        loop {
            let Ok(path) = RequestPath::parse(&current) else {
                return Ok(());
            };
            match resolver.resolve(&path) {
                Outcome::Redirect(next) | Outcome::Fallback(FallbackAction::Redirect(next)) => {
                    let seen = chain[1..].contains(&next);
                    chain.push(next.clone());
                    if seen {
                        return Err(ConfigurationError::RedirectCycle { chain });
                    }
                    current = next;
                }
                Outcome::Render(_) | Outcome::Fallback(_) | Outcome::Denied(_) => return Ok(()),
            }
        }
    }
}

fn display_path(parent: &str, own: &str) -> String {
    match (parent.is_empty(), own.is_empty()) {
        (true, _) => own.to_string(),
        (false, true) => parent.to_string(),
        (false, false) => format!("{parent}/{own}"),
    }
}

fn compile_level(routes: Vec<Route>, parent: &str) -> Result<Vec<Node>, ConfigurationError> {
    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(routes.len());

    for route in routes {
        let pattern = Pattern::parse(&route.path)?;
        let full_path = display_path(parent, pattern.as_str());

        if !seen.insert(pattern.as_str().to_string()) {
            return Err(ConfigurationError::DuplicatePath {
                parent: parent.to_string(),
                path: route.path,
            });
        }

        if let Some(target) = &route.redirect {
            let invalid = |reason: &str| ConfigurationError::InvalidRedirect {
                path: full_path.clone(),
                reason: reason.to_string(),
            };
            if route.handler.is_some() {
                return Err(invalid("a redirect entry cannot also have a handler"));
            }
            if !route.guards.is_empty() {
                return Err(invalid("guards belong on the target, not on the redirect"));
            }
            if !route.children.is_empty() {
                return Err(invalid("a redirect entry cannot have children"));
            }
            if pattern.is_empty() && route.path_match != PathMatch::Full {
                return Err(invalid("an empty-path redirect must use full matching"));
            }
            if target.is_empty() || RequestPath::parse(target).is_err() {
                return Err(invalid("the redirect target is not a valid path"));
            }
        } else if route.handler.is_none() && route.children.is_empty() {
            return Err(ConfigurationError::EmptyRoute { path: full_path });
        }

        for attached in &route.guards {
            if let Some(target) = attached.guard.denial_target() {
                if RequestPath::parse(target).is_err() {
                    return Err(ConfigurationError::UnresolvableTarget {
                        source_path: full_path.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }

        let children = compile_level(route.children, &full_path)?;
        nodes.push(Node {
            pattern,
            handler: route.handler,
            redirect: route.redirect,
            path_match: route.path_match,
            guards: route.guards,
            children,
        });
    }

    Ok(nodes)
}

/// Collects `(source, absolute target)` for every redirect entry below the top level's
/// fallback. The source of an empty-path redirect is its parent's path.
fn collect_redirects(nodes: &[Node], base: &mut Vec<String>, out: &mut Vec<(String, String)>) {
    for node in nodes {
        let literal_segments: Vec<String> = node
            .pattern
            .as_str()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        if let Some(target) = &node.redirect {
            let base_refs: Vec<&str> = base.iter().map(String::as_str).collect();
            let mut source = base.clone();
            source.extend(literal_segments.iter().cloned());
            out.push((source.join("/"), join_target(&base_refs, target)));
        }

        let depth = base.len();
        base.extend(literal_segments);
        collect_redirects(&node.children, base, out);
        base.truncate(depth);
    }
}

/// A guard together with where a session it refuses is sent.
struct Denial<'t> {
    source_path: String,
    target: String,
    guard: &'t Arc<dyn Guard>,
}

/// Collects every guard with the absolute path its denials lead to: its own target, else the
/// fallback's redirect target. Guards without either send denied sessions nowhere new.
fn collect_denials<'t>(
    nodes: &'t [Node],
    parent: &str,
    fallback_target: Option<&str>,
    out: &mut Vec<Denial<'t>>,
) {
    for node in nodes {
        let full_path = display_path(parent, node.pattern.as_str());
        for attached in &node.guards {
            let target = match attached.guard.denial_target() {
                Some(target) => join_target(&[], target),
                None => match fallback_target {
                    Some(target) => target.to_string(),
                    None => continue,
                },
            };
            out.push(Denial {
                source_path: full_path.clone(),
                target,
                guard: &attached.guard,
            });
        }
        collect_denials(&node.children, &full_path, fallback_target, out);
    }
}

fn flatten(nodes: &[Node], parent: &str, out: &mut Vec<RouteInfo>) {
    for node in nodes {
        let path = display_path(parent, node.pattern.as_str());
        let parent_segments: Vec<&str> = parent.split('/').filter(|s| !s.is_empty()).collect();
        out.push(RouteInfo {
            path: path.clone(),
            handler: node.handler.clone(),
            redirect: node
                .redirect
                .as_deref()
                .map(|target| join_target(&parent_segments, target)),
            guards: node
                .guards
                .iter()
                .map(|attached| (attached.kind, attached.guard.name().to_string()))
                .collect(),
        });
        flatten(&node.children, &path, out);
    }
}
