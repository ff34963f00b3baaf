use super::cache::RouteCache;
use super::error::RoutingError;
use super::geometry::RouteGeometry;
use super::response::{extract_steps, summarize, RouteStep, RouteSummary};
use super::service::RoutingProvider;
use crate::sdk::deliveries::Delivery;
use crate::sdk::geo::Coordinate;

/// A resolved route, ready to be installed into a navigation session.
#[derive(Debug, Clone)]
pub struct ComputedRoute {
    pub steps: Vec<RouteStep>,
    pub geometry: RouteGeometry,
    pub summary: RouteSummary,
    pub waypoints: Vec<Coordinate>,
    pub optimize: bool,
}

/// `[origin?, pickup?, delivery?]`, keeping only valid coordinates.
pub fn single_delivery_waypoints(origin: Option<Coordinate>, delivery: &Delivery) -> Vec<Coordinate> {
    [origin, delivery.pickup(), delivery.destination()]
        .into_iter()
        .flatten()
        .filter(Coordinate::is_finite)
        .collect()
}

/// `[origin?, pickup₁?, delivery₁?, pickup₂?, ...]` in the given order.
/// Reordering is left to the provider.
pub fn multi_stop_waypoints(origin: Option<Coordinate>, deliveries: &[Delivery]) -> Vec<Coordinate> {
    origin
        .into_iter()
        .chain(
            deliveries
                .iter()
                .flat_map(|d| [d.pickup(), d.destination()])
                .flatten(),
        )
        .filter(Coordinate::is_finite)
        .collect()
}

/// `[position, ...stops not yet visited]` used when re-routing.
pub fn reroute_waypoints(position: Coordinate, deliveries: &[Delivery]) -> Vec<Coordinate> {
    std::iter::once(position)
        .chain(deliveries.iter().flat_map(Delivery::remaining_stops))
        .filter(Coordinate::is_finite)
        .collect()
}

pub struct RouteBuilder<'a> {
    cache: &'a RouteCache,
    provider: &'a dyn RoutingProvider,
}

impl<'a> RouteBuilder<'a> {
    pub fn new(cache: &'a RouteCache, provider: &'a dyn RoutingProvider) -> Self {
        Self { cache, provider }
    }

    pub fn route_for_delivery(
        &self,
        delivery: &Delivery,
        origin: Option<Coordinate>,
    ) -> Result<ComputedRoute, RoutingError> {
        log::debug!("Building route for delivery {}", delivery.label());
        self.compute(single_delivery_waypoints(origin, delivery), false)
    }

    /// Plans one route through every selected delivery and lets the
    /// provider optimize the stop order.
    pub fn plan_optimized_route(
        &self,
        deliveries: &[Delivery],
        origin: Option<Coordinate>,
    ) -> Result<ComputedRoute, RoutingError> {
        log::debug!("Planning optimized route over {} deliveries", deliveries.len());
        self.compute(multi_stop_waypoints(origin, deliveries), true)
    }

    pub fn compute(
        &self,
        waypoints: Vec<Coordinate>,
        optimize: bool,
    ) -> Result<ComputedRoute, RoutingError> {
        if waypoints.len() < 2 {
            return Err(RoutingError::InsufficientWaypoints {
                found: waypoints.len(),
            });
        }

        let response = self.cache.get_or_fetch(&waypoints, optimize, self.provider)?;
        let steps = extract_steps(&response);
        let geometry = RouteGeometry::from_response(&response);
        let summary = summarize(&response);

        log::info!(
            "Route ready: {} stops, {} steps, {} geometry points",
            waypoints.len(),
            steps.len(),
            geometry.len()
        );

        Ok(ComputedRoute {
            steps,
            geometry,
            summary,
            waypoints,
            optimize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::routing::fake::{sample_response, FakeProvider};

    fn delivery(pickup: Option<(f64, f64)>, drop: Option<(f64, f64)>) -> Delivery {
        Delivery {
            tracking_number: Some("TRK-1".to_string()),
            pickup_latitude: pickup.map(|p| p.0),
            pickup_longitude: pickup.map(|p| p.1),
            delivery_latitude: drop.map(|d| d.0),
            delivery_longitude: drop.map(|d| d.1),
            ..Delivery::default()
        }
    }

    #[test]
    fn single_delivery_keeps_origin_pickup_drop_order() {
        let origin = Coordinate::new(27.7172, 85.3240);
        let d = delivery(Some((27.72, 85.33)), Some((27.73, 85.34)));
        assert_eq!(
            single_delivery_waypoints(Some(origin), &d),
            vec![origin, Coordinate::new(27.72, 85.33), Coordinate::new(27.73, 85.34)]
        );
    }

    #[test]
    fn pickup_only_is_insufficient_and_skips_the_provider() {
        let cache = RouteCache::default();
        let provider = FakeProvider::new(sample_response(&[("Go", Some(10.0))]));
        let builder = RouteBuilder::new(&cache, &provider);

        let result = builder.route_for_delivery(&delivery(Some((27.72, 85.33)), None), None);
        assert!(matches!(result, Err(RoutingError::InsufficientWaypoints { found: 1 })));
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn half_parsed_coordinates_are_dropped() {
        let mut d = delivery(Some((27.72, 85.33)), Some((27.73, 85.34)));
        d.delivery_longitude = None;
        assert_eq!(single_delivery_waypoints(None, &d).len(), 1);
    }

    #[test]
    fn multi_stop_requests_optimization() {
        let cache = RouteCache::default();
        let provider = FakeProvider::new(sample_response(&[("Go", Some(10.0))]));
        let builder = RouteBuilder::new(&cache, &provider);
        let origin = Coordinate::new(27.70, 85.30);
        let deliveries = vec![
            delivery(Some((27.71, 85.31)), Some((27.72, 85.32))),
            delivery(None, Some((27.74, 85.34))),
        ];

        let route = builder.plan_optimized_route(&deliveries, Some(origin)).unwrap();
        assert!(route.optimize);

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].optimize);
        assert_eq!(
            calls[0].waypoints,
            vec![
                origin,
                Coordinate::new(27.71, 85.31),
                Coordinate::new(27.72, 85.32),
                Coordinate::new(27.74, 85.34),
            ]
        );
    }

    #[test]
    fn reroute_skips_collected_pickups() {
        let position = Coordinate::new(27.70, 85.30);
        let mut d = delivery(Some((27.71, 85.31)), Some((27.72, 85.32)));
        assert_eq!(reroute_waypoints(position, std::slice::from_ref(&d)).len(), 3);

        d.status = Some("picked_up".to_string());
        assert_eq!(
            reroute_waypoints(position, &[d]),
            vec![position, Coordinate::new(27.72, 85.32)]
        );
    }

    #[test]
    fn provider_failure_is_reported() {
        let cache = RouteCache::default();
        let provider = FakeProvider::failing();
        let builder = RouteBuilder::new(&cache, &provider);

        let d = delivery(Some((27.72, 85.33)), Some((27.73, 85.34)));
        let result = builder.route_for_delivery(&d, None);
        assert!(matches!(result, Err(RoutingError::RawApiError { .. })));
        assert_eq!(provider.call_count(), 1);
    }
}
