//! Storefront Route Table
//!
//! The navigable pages of the food-delivery storefront, split into modules by who may
//! enter them. Each tier owns its guards, so access rules sit next to the paths they
//! protect and a page cannot be added to a tier without inheriting that tier's rule.

use crate::{
    error::ConfigurationError,
    routing::{Route, RouteTable},
};

/// Pages anyone may open, signed in or not.
pub mod public;

/// Pages only signed-out visitors may open (login, register).
pub mod guest;

/// The admin area, reachable only by administrators.
pub mod admin;

/// Where the catch-all entry sends unknown paths.
pub const HOME: &str = "home";

/// Builds the complete storefront table.
///
/// `profile` and `products` are deliberately left in the public tier without a guard: the
/// pages themselves decide what an anonymous visitor sees.
pub fn routes(max_redirect_hops: usize) -> Result<RouteTable, ConfigurationError> {
    let mut routes: Vec<Route> = Vec::new();
    routes.extend(public::public_routes());
    routes.extend(guest::guest_routes());
    routes.push(admin::admin_routes());
    routes.push(Route::new("**").redirect_to(HOME).full_match());

    RouteTable::with_hop_bound(routes, max_redirect_hops)
}
