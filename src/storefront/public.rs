use crate::routing::Route;

use super::HOME;

/// Public Pages
///
/// Read-only browsing pages. No guard is attached: a signed-in customer and an anonymous
/// visitor reach the same handler.
pub fn public_routes() -> Vec<Route> {
    vec![
        // home: landing page with featured restaurants and dishes.
        Route::new(HOME).handler("main-content"),
        // profile: the page itself prompts anonymous visitors to sign in.
        Route::new("profile").handler("profile"),
        // products: catalog listing.
        Route::new("products").handler("products-list"),
    ]
}
