//! Where the pipeline sends the user when a session ends.

use std::sync::Mutex;

pub const LOGIN_ROUTE: &str = "/login";
pub const REGISTER_ROUTE: &str = "/register";

/// Where the application currently is, and how to send it to the login view.
///
/// The pipeline only navigates after the refresh token was rejected.
pub trait Navigator: Send + Sync {
    fn current_route(&self) -> String;
    fn navigate(&self, route: &str);
}

/// Whether `route` is the login or registration view (query and fragment ignored).
pub fn is_auth_route(route: &str) -> bool {
    let path = route.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');
    path == LOGIN_ROUTE || path == REGISTER_ROUTE
}

/// Navigator for headless use: never leaves the root route.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_route(&self) -> String {
        "/".to_string()
    }

    fn navigate(&self, route: &str) {
        tracing::debug!(route, "navigation requested without a view layer");
    }
}

/// Tracks the current route and remembers every forced navigation.
#[derive(Debug)]
pub struct RouteTracker {
    current: Mutex<String>,
    forced: Mutex<Vec<String>>,
}

impl RouteTracker {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(initial.into()),
            forced: Mutex::new(Vec::new()),
        }
    }

    /// Record a navigation the view layer made on its own.
    pub fn set_current(&self, route: impl Into<String>) {
        *self.current.lock().unwrap_or_else(|p| p.into_inner()) = route.into();
    }

    /// Navigations requested through [`Navigator::navigate`], oldest first.
    pub fn forced(&self) -> Vec<String> {
        self.forced.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl Default for RouteTracker {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for RouteTracker {
    fn current_route(&self) -> String {
        self.current.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn navigate(&self, route: &str) {
        self.set_current(route);
        self.forced
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(route.to_string());
    }
}
