pub mod sdk;

pub use sdk::config::{NavigationSettings, ProviderConfig};
pub use sdk::deliveries::{Delivery, DeliveryBook};
pub use sdk::geo::{haversine_distance, Coordinate};
pub use sdk::navigation::{NavigationError, NavigationSession, NavigationState};
pub use sdk::routing::{RouteCache, RoutingError, RoutingProvider};
