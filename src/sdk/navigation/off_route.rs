use crate::sdk::geo::Coordinate;
use crate::sdk::routing::RouteGeometry;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RouteStatus {
    /// Within the threshold. Distance is infinite for a route without
    /// drawable geometry, which never counts as off-route.
    OnRoute { distance_m: f64 },
    /// Beyond the threshold, or no route loaded at all (`distance_m: None`).
    OffRoute { distance_m: Option<f64> },
}

impl RouteStatus {
    pub fn is_off_route(&self) -> bool {
        matches!(self, RouteStatus::OffRoute { .. })
    }

    pub fn distance_m(&self) -> Option<f64> {
        match *self {
            RouteStatus::OnRoute { distance_m } => Some(distance_m).filter(|d| d.is_finite()),
            RouteStatus::OffRoute { distance_m } => distance_m,
        }
    }
}

/// Flags positions that have strayed from the loaded route.
#[derive(Debug, Clone, Copy)]
pub struct OffRouteDetector {
    threshold_m: f64,
}

impl OffRouteDetector {
    pub fn new(threshold_m: f64) -> Self {
        Self { threshold_m }
    }

    /// Strictly greater than the threshold; a distance equal to it is on-route.
    pub fn exceeds(&self, distance_m: f64) -> bool {
        distance_m.is_finite() && distance_m > self.threshold_m
    }

    pub fn check(&self, geometry: Option<&RouteGeometry>, position: &Coordinate) -> RouteStatus {
        let Some(geometry) = geometry else {
            return RouteStatus::OffRoute { distance_m: None };
        };

        let distance_m = geometry.distance_to_route(position);
        if self.exceeds(distance_m) {
            RouteStatus::OffRoute {
                distance_m: Some(distance_m),
            }
        } else {
            RouteStatus::OnRoute { distance_m }
        }
    }
}
