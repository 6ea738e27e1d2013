use crate::{guard::IsAdmin, routing::Route};

/// Admin Area
///
/// The whole subtree sits behind a subtree guard: a non-admin session never even gets to
/// try the children, so no admin handler can be matched (or lazily fetched) for it.
///
/// - `admin/dashboard`: the dashboard, loaded lazily on first visit.
/// - `admin`: redirects to the dashboard.
///
/// The dashboard is a leaf: nested paths such as `admin/dashboard/orders` are not routed and
/// end at the fallback.
pub fn admin_routes() -> Route {
    Route::new("admin").subtree_guard(IsAdmin::new()).children([
        Route::new("dashboard").lazy_handler("admin-dashboard"),
        Route::new("").redirect_to("dashboard").full_match(),
    ])
}
