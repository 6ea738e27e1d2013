use crate::{guard::NotAuthenticated, routing::Route};

/// Guest-only Pages
///
/// Signing in and signing up only make sense for a visitor without a session. The entry
/// guard sends an authenticated visitor on to the fallback (home) instead.
pub fn guest_routes() -> Vec<Route> {
    vec![
        Route::new("login")
            .handler("login")
            .entry_guard(NotAuthenticated::new()),
        Route::new("register")
            .handler("register")
            .entry_guard(NotAuthenticated::new()),
    ]
}
