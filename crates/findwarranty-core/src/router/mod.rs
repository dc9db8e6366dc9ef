//! Route table and navigation guard.
//!
//! Routes form a tree of records; a route requires authentication when any
//! record on its matched chain is flagged. The guard sends signed-out users
//! trying to reach such a route to the login page.

pub mod guard;
pub mod routes;

pub use guard::{NavigationDecision, NavigationGuard, LOGIN_ROUTE};
pub use routes::{RouteMatch, RouteRecord, RouteTable};
