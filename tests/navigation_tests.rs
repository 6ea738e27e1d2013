use std::sync::Arc;

use storefront_nav::{
    Outcome, Role, Route, RouteTable, Session, SessionStore,
    guard::{FnGuard, RequireAuthenticated},
    navigate,
    navigation::{NavigationSink, Navigator, Recorder, SinkEvent},
    routing::{DenyReason, FallbackAction, Handler, HandlerId},
    storefront,
};
use uuid::Uuid;

const ADMIN_ID: Uuid = Uuid::from_u128(1);

fn table() -> Arc<RouteTable> {
    Arc::new(storefront::routes(1).unwrap())
}

fn render(id: &str) -> SinkEvent {
    SinkEvent::Render(HandlerId::new(id))
}

fn redirect(path: &str) -> SinkEvent {
    SinkEvent::RedirectTo(path.to_string())
}

#[test]
fn test_guest_visiting_admin_dashboard_lands_on_home() {
    let mut sink = Recorder::default();
    let navigation = navigate(&table(), "admin/dashboard", &Session::anonymous(), &mut sink);

    assert_eq!(sink.events, [redirect("home"), render("main-content")]);
    assert_eq!(navigation.hops, ["home"]);
    assert_eq!(navigation.rendered().map(|h| h.id.as_str()), Some("main-content"));
    assert!(navigation.feedback.is_none());
}

#[test]
fn test_admin_visiting_admin_root_lands_on_dashboard() {
    let mut sink = Recorder::default();
    let session = Session::authenticated(ADMIN_ID, Role::Admin);
    let navigation = navigate(&table(), "admin", &session, &mut sink);

    assert_eq!(sink.events, [redirect("admin/dashboard"), render("admin-dashboard")]);
    assert!(navigation.rendered().is_some_and(Handler::is_lazy));
}

#[test]
fn test_unknown_path_ends_like_home() {
    let table = table();
    let session = Session::anonymous();

    let mut unknown = Recorder::default();
    let via_fallback = navigate(&table, "nonexistent/page", &session, &mut unknown);
    let mut direct = Recorder::default();
    let home = navigate(&table, "home", &session, &mut direct);

    assert_eq!(via_fallback.outcome, home.outcome);
    assert_eq!(unknown.events.last(), direct.events.last());
}

#[test]
fn test_malformed_path_gets_feedback_then_the_fallback() {
    let mut sink = Recorder::default();
    let navigation = navigate(&table(), "a//b", &Session::anonymous(), &mut sink);

    assert!(matches!(sink.events[0], SinkEvent::Denied(_)));
    assert_eq!(sink.events[1..], [redirect("home"), render("main-content")]);
    assert!(matches!(navigation.feedback, Some(DenyReason::MalformedPath(_))));
    assert_eq!(navigation.rendered().map(|h| h.id.as_str()), Some("main-content"));
}

#[test]
fn test_redirects_beyond_the_hop_bound_are_denied() {
    // Guard-driven redirects are dynamic, so table validation cannot see this chain:
    // `orders` sends guests to `login`, which itself redirects them to `welcome`.
    let table = RouteTable::new([
        Route::new("welcome").handler("welcome"),
        Route::new("login")
            .handler("login")
            .entry_guard(FnGuard::new("closed", |_: &Session| false).deny_to("welcome")),
        Route::new("orders")
            .handler("orders")
            .entry_guard(RequireAuthenticated::new().deny_to("login")),
        Route::new("**").handler("not-found"),
    ])
    .unwrap();

    let mut sink = Recorder::default();
    let navigation = navigate(&table, "orders", &Session::anonymous(), &mut sink);

    assert_eq!(navigation.hops, ["login"]);
    match &navigation.outcome {
        Outcome::Denied(DenyReason::RedirectLimit { limit, chain }) => {
            assert_eq!(*limit, 1);
            assert_eq!(chain, &["orders", "login", "welcome"]);
        }
        other => panic!("expected redirect limit, got {other:?}"),
    }
    assert!(matches!(sink.events.last(), Some(SinkEvent::Denied(_))));
    assert!(navigation.rendered().is_none());
}

#[test]
fn test_rendering_fallback_needs_no_hop() {
    let table = RouteTable::new([
        Route::new("home").handler("home"),
        Route::new("**").handler("not-found"),
    ])
    .unwrap();

    let mut sink = Recorder::default();
    let navigation = navigate(&table, "missing", &Session::anonymous(), &mut sink);
    assert!(navigation.hops.is_empty());
    assert!(matches!(navigation.outcome, Outcome::Fallback(FallbackAction::Render(_))));
    assert_eq!(sink.events, [render("not-found")]);
}

// --- Navigator and the session store ---

#[test]
fn test_navigator_reads_the_session_fresh_on_every_navigation() {
    let sessions = SessionStore::default();
    let navigator = Navigator::new(table(), sessions.clone());
    let mut sink = Recorder::default();

    let before = navigator.navigate("login", &mut sink).navigation;
    assert_eq!(before.rendered().map(|h| h.id.as_str()), Some("login"));

    sessions.login(Uuid::new_v4(), Role::User);
    let after = navigator.navigate("login", &mut sink).navigation;
    assert_eq!(after.hops, ["home"]);

    sessions.logout();
    let again = navigator.navigate("login", &mut sink).navigation;
    assert_eq!(again.rendered().map(|h| h.id.as_str()), Some("login"));
}

#[test]
fn test_session_snapshot_is_stable_across_logout() {
    let sessions = SessionStore::default();
    sessions.login(ADMIN_ID, Role::Admin);
    let snapshot = sessions.snapshot();

    sessions.logout();

    assert!(snapshot.is_admin());
    assert!(!sessions.snapshot().is_authenticated);
}

/// A sink that a real UI would implement: it keeps the page currently on screen.
#[derive(Default)]
struct Screen {
    current: Option<HandlerId>,
    address: Vec<String>,
    messages: Vec<String>,
}

impl NavigationSink for Screen {
    fn render(&mut self, handler: &Handler) {
        self.current = Some(handler.id.clone());
    }

    fn redirect_to(&mut self, path: &str) {
        self.address.push(path.to_string());
    }

    fn deny_with_feedback(&mut self, reason: &DenyReason) {
        self.messages.push(reason.to_string());
    }
}

#[test]
fn test_navigator_without_loader_starts_no_load() {
    let sessions = SessionStore::new(Session::authenticated(ADMIN_ID, Role::Admin));
    let navigator = Navigator::new(table(), sessions);
    let mut screen = Screen::default();

    let navigated = navigator.navigate("admin", &mut screen);

    assert!(navigated.load.is_none());
    assert_eq!(screen.current, Some(HandlerId::new("admin-dashboard")));
    assert_eq!(screen.address, ["admin/dashboard"]);
    assert!(screen.messages.is_empty());
}
