use super::error::RoutingError;
use super::response::RouteResponse;
use crate::sdk::geo::Coordinate;

/// Black-box routing backend: given waypoints, returns a route.
pub trait RoutingProvider: Send + Sync {
    /// Short, non-secret fingerprint of the credentials in use. Folded into
    /// cache keys so that routes fetched under different keys never mix.
    fn key_signature(&self) -> &str;

    /// Requests a route visiting `waypoints` in order, or in any order the
    /// provider prefers for intermediate stops when `optimize` is set.
    fn fetch_route(
        &self,
        waypoints: &[Coordinate],
        optimize: bool,
    ) -> Result<RouteResponse, RoutingError>;
}
