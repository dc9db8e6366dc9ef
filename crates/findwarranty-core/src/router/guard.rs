use crate::models::User;

use super::RouteTable;

/// Where signed-out users are sent.
pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Proceed,
    Redirect(String),
}

/// Decides, before each route change, whether the transition may proceed.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    routes: RouteTable,
    login_route: String,
}

impl NavigationGuard {
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes,
            login_route: LOGIN_ROUTE.to_string(),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Redirect to login when the target requires authentication and no
    /// user is signed in. Unknown targets proceed.
    pub fn check(&self, target: &str, user: Option<&User>) -> NavigationDecision {
        let requires_auth = self
            .routes
            .resolve(target)
            .map(|found| found.requires_auth)
            .unwrap_or(false);

        if requires_auth && user.is_none() {
            NavigationDecision::Redirect(self.login_route.clone())
        } else {
            NavigationDecision::Proceed
        }
    }
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new(RouteTable::default_routes())
    }
}
