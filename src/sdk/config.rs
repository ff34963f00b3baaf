use crate::sdk::geo::Coordinate;
use crate::sdk::navigation::position::WatchOptions;
use crate::sdk::routing::cache::{DEFAULT_CAPACITY, DEFAULT_TTL_HOURS};
use crate::sdk::routing::RoutingError;
use chrono::TimeDelta;
use std::env;

pub const DEFAULT_BASE_URL: &str = "https://api.geoapify.com";
pub const DEFAULT_MODE: &str = "drive";
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 5;

/// Kathmandu city centre, used when no position fix is available.
pub const HOME_CITY_CENTER: Coordinate = Coordinate::new(27.7172, 85.3240);

/// Routing provider settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub mode: String,
    pub requests_per_second: u32,
}

impl ProviderConfig {
    /// Reads `ROUTING_API_KEY` (required), `ROUTING_BASE_URL`,
    /// `ROUTING_MODE` and `ROUTING_REQUESTS_PER_SECOND`.
    pub fn from_env() -> Result<Self, RoutingError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, RoutingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_blank("ROUTING_API_KEY").ok_or(RoutingError::MissingApiKey)?;
        let requests_per_second = non_blank("ROUTING_REQUESTS_PER_SECOND")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_REQUESTS_PER_SECOND);

        Ok(Self {
            api_key: api_key.trim().to_string(),
            base_url: non_blank("ROUTING_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            mode: non_blank("ROUTING_MODE").unwrap_or_else(|| DEFAULT_MODE.to_string()),
            requests_per_second,
        })
    }
}

/// Tunables of the navigation engine.
#[derive(Debug, Clone)]
pub struct NavigationSettings {
    /// Distance to the next maneuver at which the step counts as reached.
    pub arrival_threshold_m: f64,
    /// Distance from the route beyond which the courier is off-route.
    pub off_route_threshold_m: f64,
    pub cache_ttl: TimeDelta,
    pub cache_capacity: usize,
    pub home_center: Coordinate,
    pub watch: WatchOptions,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            arrival_threshold_m: 20.0,
            off_route_threshold_m: 75.0,
            cache_ttl: TimeDelta::hours(DEFAULT_TTL_HOURS),
            cache_capacity: DEFAULT_CAPACITY,
            home_center: HOME_CITY_CENTER,
            watch: WatchOptions::default(),
        }
    }
}
