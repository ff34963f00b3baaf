use crate::sdk::geo::{haversine_distance, Coordinate};
use crate::sdk::routing::RouteStep;
use serde::Serialize;

/// Step countdown. Steps only move forward; backtracking is left to the
/// off-route check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NavigationState {
    pub active_step_index: usize,
    /// Meters left before the next maneuver, when the step has a length.
    pub remaining_to_next_step: Option<f64>,
    pub last_known_position: Option<Coordinate>,
    /// Set once the final step has been reached.
    pub arrived: bool,
}

impl NavigationState {
    /// State for a freshly computed route: step 0, nothing travelled yet.
    pub fn for_route(steps: &[RouteStep]) -> Self {
        Self {
            active_step_index: 0,
            remaining_to_next_step: steps.first().and_then(|s| s.distance),
            last_known_position: None,
            arrived: false,
        }
    }

    pub fn active_step<'a>(&self, steps: &'a [RouteStep]) -> Option<&'a RouteStep> {
        steps.get(self.active_step_index)
    }

    /// Applies one position update and returns the new state.
    ///
    /// The first update after a reset only records the position. A step
    /// without a known length counts as reached on the next update. On the
    /// final step, reaching it marks arrival instead of advancing.
    pub fn advance(&self, position: Coordinate, steps: &[RouteStep], arrival_threshold_m: f64) -> Self {
        let mut next = Self {
            last_known_position: Some(position),
            ..*self
        };

        let Some(last) = self.last_known_position else {
            return next;
        };
        if steps.is_empty() || self.arrived {
            return next;
        }

        let moved = haversine_distance(&last, &position);
        if moved > 0.0 {
            next.remaining_to_next_step = next.remaining_to_next_step.map(|r| (r - moved).max(0.0));
        }

        let reached = next
            .remaining_to_next_step
            .map_or(true, |r| r <= arrival_threshold_m);
        if !reached {
            return next;
        }

        let last_index = steps.len() - 1;
        if next.active_step_index < last_index {
            next.active_step_index += 1;
            next.remaining_to_next_step = steps[next.active_step_index].distance;
            log::info!(
                "Advanced to step {}/{}: {}",
                next.active_step_index + 1,
                steps.len(),
                steps[next.active_step_index].instruction
            );
        } else {
            next.active_step_index = last_index;
            next.arrived = true;
            log::info!("Reached final step");
        }

        next
    }
}
