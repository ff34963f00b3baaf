use super::off_route::{OffRouteDetector, RouteStatus};
use super::position::{PositionError, PositionUpdate};
use super::state::NavigationState;
use super::voice::{Announcer, LogAnnouncer};
use super::NavigationError;
use crate::sdk::config::NavigationSettings;
use crate::sdk::deliveries::Delivery;
use crate::sdk::geo::Coordinate;
use crate::sdk::routing::route::{reroute_waypoints, ComputedRoute, RouteBuilder};
use crate::sdk::routing::{RouteCache, RouteStep, RouteSummary, RoutingProvider};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Navigating,
}

/// What a single position update did.
#[derive(Debug, Clone, Serialize)]
pub struct PositionOutcome {
    pub route_status: RouteStatus,
    pub rerouted: bool,
    pub step_changed: bool,
    pub active_step_index: usize,
    pub instruction: Option<String>,
    pub remaining_to_next_step: Option<f64>,
    pub arrived: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub deliveries: Vec<String>,
    pub optimize: bool,
    pub waypoints: Vec<Coordinate>,
    pub summary: Option<RouteSummary>,
    pub steps: Vec<RouteStep>,
    pub state: NavigationState,
}

/// One courier's live navigation: the route being followed and the
/// turn-by-turn progress along it.
pub struct NavigationSession {
    cache: Arc<RouteCache>,
    provider: Arc<dyn RoutingProvider>,
    settings: NavigationSettings,
    detector: OffRouteDetector,
    announcer: Box<dyn Announcer>,
    voice_enabled: bool,
    phase: Phase,
    targets: Vec<Delivery>,
    optimize: bool,
    route: Option<ComputedRoute>,
    state: NavigationState,
    announced_step: Option<usize>,
}

impl NavigationSession {
    pub fn new(
        cache: Arc<RouteCache>,
        provider: Arc<dyn RoutingProvider>,
        settings: NavigationSettings,
    ) -> Self {
        Self {
            cache,
            provider,
            detector: OffRouteDetector::new(settings.off_route_threshold_m),
            settings,
            announcer: Box::new(LogAnnouncer::default()),
            voice_enabled: false,
            phase: Phase::Idle,
            targets: Vec::new(),
            optimize: false,
            route: None,
            state: NavigationState::for_route(&[]),
            announced_step: None,
        }
    }

    pub fn with_announcer(mut self, announcer: Box<dyn Announcer>) -> Self {
        self.announcer = announcer;
        self
    }

    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.voice_enabled = enabled;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn route(&self) -> Option<&ComputedRoute> {
        self.route.as_ref()
    }

    pub fn active_step(&self) -> Option<&RouteStep> {
        self.route
            .as_ref()
            .and_then(|r| self.state.active_step(&r.steps))
    }

    /// Starts navigating to a single delivery: origin, pickup, drop-off.
    pub fn start(
        &mut self,
        delivery: Delivery,
        origin: Option<Coordinate>,
    ) -> Result<&ComputedRoute, NavigationError> {
        let computed = RouteBuilder::new(&self.cache, self.provider.as_ref())
            .route_for_delivery(&delivery, origin)?;
        log::info!("Navigating to delivery {}", delivery.label());

        self.targets = vec![delivery];
        self.optimize = false;
        self.phase = Phase::Navigating;
        Ok(self.install(computed))
    }

    /// Starts navigating one optimized route through several deliveries.
    pub fn plan_optimized(
        &mut self,
        deliveries: Vec<Delivery>,
        origin: Option<Coordinate>,
    ) -> Result<&ComputedRoute, NavigationError> {
        let computed = RouteBuilder::new(&self.cache, self.provider.as_ref())
            .plan_optimized_route(&deliveries, origin)?;
        log::info!("Navigating optimized route over {} deliveries", deliveries.len());

        self.targets = deliveries;
        self.optimize = true;
        self.phase = Phase::Navigating;
        Ok(self.install(computed))
    }

    /// Feeds one update from the position watch. Permission and support
    /// errors end the session; other errors are surfaced and tracking goes on.
    pub fn handle_update(&mut self, update: PositionUpdate) -> Result<PositionOutcome, NavigationError> {
        match update {
            Ok(position) => self.on_position(position),
            Err(e) => {
                log::warn!("Position update failed: {}", e);
                if e.is_fatal() {
                    self.stop();
                }
                Err(e.into())
            }
        }
    }

    /// Applies one position fix. A non-finite fix is rejected without
    /// touching the route or state.
    pub fn on_position(&mut self, position: Coordinate) -> Result<PositionOutcome, NavigationError> {
        if self.phase != Phase::Navigating {
            return Err(NavigationError::NotNavigating);
        }
        if !position.is_finite() {
            log::warn!("Ignoring non-finite position fix {}", position);
            return Err(PositionError::Unavailable(format!("non-finite fix {position}")).into());
        }

        let route_status = self
            .detector
            .check(self.route.as_ref().map(|r| &r.geometry), &position);

        let previous_step = self.state.active_step_index;
        let mut rerouted = false;
        if route_status.is_off_route() {
            match route_status.distance_m() {
                Some(d) => log::warn!("Off route by {:.1} m at {}, re-routing", d, position),
                None => log::warn!("No route loaded at {}, routing", position),
            }
            let waypoints = reroute_waypoints(position, &self.targets);
            let computed = RouteBuilder::new(&self.cache, self.provider.as_ref())
                .compute(waypoints, self.optimize)
                .map_err(|e| {
                    log::warn!("Re-route failed, keeping previous route: {}", e);
                    e
                })?;
            self.install(computed);
            rerouted = true;
        }

        let steps = self.route.as_ref().map(|r| r.steps.as_slice()).unwrap_or(&[]);
        self.state = self
            .state
            .advance(position, steps, self.settings.arrival_threshold_m);
        announce_step_change(
            &mut self.announced_step,
            self.voice_enabled.then_some(&*self.announcer),
            &self.state,
            steps,
        );

        if self.state.arrived {
            log::info!("Arrived at final stop");
            self.phase = Phase::Idle;
        }

        Ok(PositionOutcome {
            route_status,
            rerouted,
            step_changed: self.state.active_step_index != previous_step,
            active_step_index: self.state.active_step_index,
            instruction: self.active_step().map(|s| s.instruction.clone()),
            remaining_to_next_step: self.state.remaining_to_next_step,
            arrived: self.state.arrived,
        })
    }

    /// Ends navigation and discards route and progress.
    pub fn stop(&mut self) {
        if self.phase == Phase::Navigating {
            log::info!("Navigation stopped");
        }
        self.phase = Phase::Idle;
        self.targets.clear();
        self.route = None;
        self.state = NavigationState::for_route(&[]);
        self.announced_step = None;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            deliveries: self.targets.iter().map(|d| d.label().to_string()).collect(),
            optimize: self.optimize,
            waypoints: self.route.as_ref().map(|r| r.waypoints.clone()).unwrap_or_default(),
            summary: self.route.as_ref().map(|r| r.summary),
            steps: self.route.as_ref().map(|r| r.steps.clone()).unwrap_or_default(),
            state: self.state,
        }
    }

    fn install(&mut self, route: ComputedRoute) -> &ComputedRoute {
        self.state = NavigationState::for_route(&route.steps);
        announce_step_change(
            &mut self.announced_step,
            self.voice_enabled.then_some(&*self.announcer),
            &self.state,
            &route.steps,
        );
        self.route.insert(route)
    }
}

/// Speaks the active instruction when the step index differs from the last
/// one seen. Nothing is spoken while `announcer` is `None` (voice off).
fn announce_step_change(
    announced_step: &mut Option<usize>,
    announcer: Option<&dyn Announcer>,
    state: &NavigationState,
    steps: &[RouteStep],
) {
    let index = state.active_step_index;
    if *announced_step == Some(index) {
        return;
    }
    *announced_step = Some(index);

    if let (Some(announcer), Some(step)) = (announcer, state.active_step(steps)) {
        announcer.speak(&step.instruction);
    }
}
