use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    navigation::{Navigation, SinkEvent},
    routing::{FallbackAction, Outcome, RouteInfo},
};

// --- Response Schemas (Output) ---

/// OutcomeView
///
/// Wire form of a resolution outcome, tagged by `kind`. Exported to TypeScript so the SPA
/// shares one definition with the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum OutcomeView {
    Render {
        handler: String,
        lazy: bool,
    },
    Redirect {
        target: String,
    },
    /// The catch-all took over; exactly one of `handler` and `target` is set.
    Fallback {
        handler: Option<String>,
        target: Option<String>,
    },
    Denied {
        reason: String,
    },
}

impl From<&Outcome> for OutcomeView {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Render(handler) => OutcomeView::Render {
                handler: handler.id.to_string(),
                lazy: handler.is_lazy(),
            },
            Outcome::Redirect(target) => OutcomeView::Redirect {
                target: target.clone(),
            },
            Outcome::Fallback(FallbackAction::Render(handler)) => OutcomeView::Fallback {
                handler: Some(handler.id.to_string()),
                target: None,
            },
            Outcome::Fallback(FallbackAction::Redirect(target)) => OutcomeView::Fallback {
                handler: None,
                target: Some(target.clone()),
            },
            Outcome::Denied(reason) => OutcomeView::Denied {
                reason: reason.to_string(),
            },
        }
    }
}

/// NavigationResponse
///
/// Body of `GET /navigate`: the requested path, each redirect hop in order, the outcome the
/// navigation settled on, and what the rendering collaborator was told along the way.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigationResponse {
    pub requested: String,
    pub hops: Vec<String>,
    pub outcome: OutcomeView,
    /// Present when the requested path itself was refused (e.g. malformed).
    pub feedback: Option<String>,
    pub events: Vec<String>,
}

impl NavigationResponse {
    pub fn new(navigation: Navigation, events: &[SinkEvent]) -> Self {
        Self {
            outcome: OutcomeView::from(&navigation.outcome),
            requested: navigation.requested,
            hops: navigation.hops,
            feedback: navigation.feedback.map(|reason| reason.to_string()),
            events: events
                .iter()
                .map(|event| match event {
                    SinkEvent::Render(handler) => format!("render {handler}"),
                    SinkEvent::RedirectTo(path) => format!("redirect {path}"),
                    SinkEvent::Denied(reason) => format!("deny {reason}"),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct GuardSummary {
    // "entry" or "subtree".
    pub kind: String,
    pub name: String,
}

/// RouteSummary
///
/// One entry of the published route table (`GET /routes`), with its absolute path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteSummary {
    pub path: String,
    pub handler: Option<String>,
    pub lazy: bool,
    pub redirect: Option<String>,
    pub guards: Vec<GuardSummary>,
}

impl From<RouteInfo> for RouteSummary {
    fn from(info: RouteInfo) -> Self {
        Self {
            path: info.path,
            lazy: info.handler.as_ref().is_some_and(|handler| handler.is_lazy()),
            handler: info.handler.map(|handler| handler.id.to_string()),
            redirect: info.redirect,
            guards: info
                .guards
                .into_iter()
                .map(|(kind, name)| GuardSummary {
                    kind: kind.as_str().to_string(),
                    name,
                })
                .collect(),
        }
    }
}
