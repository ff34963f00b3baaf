pub mod cache;
pub mod error;
pub mod geometry;
pub mod provider;
pub mod response;
pub mod route;
pub mod service;

#[cfg(test)]
pub(crate) mod fake;

pub use cache::{CachedRoute, RouteCache, RouteCacheKey};
pub use error::RoutingError;
pub use geometry::RouteGeometry;
pub use provider::RemoteRoutingProvider;
pub use response::{extract_steps, RouteResponse, RouteStep, RouteSummary};
pub use route::{ComputedRoute, RouteBuilder};
pub use service::RoutingProvider;
