pub mod off_route;
pub mod position;
pub mod replay;
pub mod session;
pub mod state;
pub mod voice;

use crate::sdk::routing::RoutingError;
use thiserror::Error;

pub use off_route::{OffRouteDetector, RouteStatus};
pub use position::{PositionError, PositionSource, PositionWatch, WatchOptions};
pub use session::{NavigationSession, Phase, PositionOutcome, SessionSnapshot};
pub use state::NavigationState;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Position(#[from] PositionError),

    #[error("Navigation is not active")]
    NotNavigating,
}
