//! Authenticated HTTP access with transparent token refresh.

pub mod client;
pub mod navigator;
pub mod refresh;
pub mod request;

pub use client::ApiClient;
pub use navigator::{is_auth_route, Navigator, NoopNavigator, RouteTracker, LOGIN_ROUTE, REGISTER_ROUTE};
pub use refresh::{RefreshCoordinator, RefreshFailure, RefreshFailureKind};
pub use request::{ApiRequest, ApiResponse, FormPart, RequestBody};
