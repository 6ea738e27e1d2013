//! Route Access Controller
//!
//! An immutable tree of navigable paths with attached guards, and the pure
//! `resolve(path, session) -> Outcome` operation over it.
//!
//! - `path`: pattern compilation and request-path validation.
//! - `table`: the `Route` builder and the validated `RouteTable`.
//! - `resolve`: the matching algorithm and its `Outcome`.

mod path;
mod resolve;
mod table;

pub use path::RequestPath;
pub use resolve::{DenyReason, FallbackAction, Outcome};
pub use table::{
    DEFAULT_MAX_REDIRECT_HOPS, Handler, HandlerId, Loading, PathMatch, Route, RouteInfo,
    RouteTable,
};
