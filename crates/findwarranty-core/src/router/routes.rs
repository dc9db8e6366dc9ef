use std::collections::HashMap;

/// One entry in the route table. Child paths are relative to the parent.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub path: String,
    pub name: Option<String>,
    pub requires_auth: bool,
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            requires_auth: false,
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn requires_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn with_children(mut self, children: Vec<RouteRecord>) -> Self {
        self.children = children;
        self
    }
}

/// The route a path resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    /// Full pattern, e.g. `/receipts/:id`
    pub pattern: String,
    pub name: Option<String>,
    pub requires_auth: bool,
    pub params: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteRecord>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteRecord>) -> Self {
        Self { routes }
    }

    /// Landing, login and registration are public; everything under the
    /// dashboard layout needs a signed-in user.
    pub fn default_routes() -> Self {
        Self::new(vec![
            RouteRecord::new("/").named("landing"),
            RouteRecord::new("/login").named("login"),
            RouteRecord::new("/register").named("register"),
            RouteRecord::new("/").requires_auth().with_children(vec![
                RouteRecord::new("receipts").named("receipts"),
                RouteRecord::new("create").named("create"),
                RouteRecord::new("stats").named("stats"),
            ]),
        ])
    }

    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    /// Resolve a location (query string and fragment ignored) to the first
    /// matching record, searching depth-first in declaration order.
    pub fn resolve(&self, location: &str) -> Option<RouteMatch> {
        let path = normalize(location);
        Self::search(&self.routes, "", false, &path)
    }

    fn search(
        records: &[RouteRecord],
        parent: &str,
        parent_requires_auth: bool,
        path: &str,
    ) -> Option<RouteMatch> {
        for record in records {
            let pattern = join(parent, &record.path);
            let requires_auth = parent_requires_auth || record.requires_auth;

            if let Some(params) = match_pattern(&pattern, path) {
                return Some(RouteMatch {
                    pattern,
                    name: record.name.clone(),
                    requires_auth,
                    params,
                });
            }
            if let Some(found) = Self::search(&record.children, &pattern, requires_auth, path) {
                return Some(found);
            }
        }
        None
    }
}

fn normalize(location: &str) -> String {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    let path = location[..end].trim();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn join(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return normalize(child);
    }
    normalize(&format!("{}/{}", parent.trim_end_matches('/'), child))
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn match_pattern(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_segments = segments(pattern);
    let path_segments = segments(path);
    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (expected, actual) in pattern_segments.iter().zip(&path_segments) {
        if let Some(name) = expected.strip_prefix(':') {
            params.insert(name.to_string(), actual.to_string());
        } else if expected != actual {
            return None;
        }
    }
    Some(params)
}
