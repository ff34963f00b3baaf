use super::error::RoutingError;
use super::response::RouteResponse;
use super::service::RoutingProvider;
use crate::sdk::geo::Coordinate;
use serde_json::{json, Value};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub waypoints: Vec<Coordinate>,
    pub optimize: bool,
}

pub(crate) struct FakeProvider {
    response: Mutex<Option<RouteResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeProvider {
    pub(crate) fn new(response: RouteResponse) -> Self {
        Self {
            response: Mutex::new(Some(response)),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Provider that answers every request with HTTP 503.
    pub(crate) fn failing() -> Self {
        Self {
            response: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn respond_with(&self, response: Option<RouteResponse>) {
        *self.response.lock().unwrap() = response;
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl RoutingProvider for FakeProvider {
    fn key_signature(&self) -> &str {
        "fake01"
    }

    fn fetch_route(
        &self,
        waypoints: &[Coordinate],
        optimize: bool,
    ) -> Result<RouteResponse, RoutingError> {
        self.calls.lock().unwrap().push(RecordedCall {
            waypoints: waypoints.to_vec(),
            optimize,
        });
        self.response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| RoutingError::RawApiError {
                status: 503,
                body: "service unavailable".to_string(),
            })
    }
}

/// GeoJSON route with one leg holding `steps` and no geometry.
pub(crate) fn sample_response(steps: &[(&str, Option<f64>)]) -> RouteResponse {
    sample_response_with_line(steps, &[])
}

/// GeoJSON route with one leg holding `steps` and a `LineString` of
/// `[lng, lat]` positions.
pub(crate) fn sample_response_with_line(
    steps: &[(&str, Option<f64>)],
    line: &[[f64; 2]],
) -> RouteResponse {
    let steps: Vec<Value> = steps
        .iter()
        .map(|(text, distance)| match distance {
            Some(d) => json!({ "instruction": { "text": text }, "distance": d }),
            None => json!({ "instruction": { "text": text } }),
        })
        .collect();

    RouteResponse::new(json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "legs": [{ "steps": steps }] },
            "geometry": { "type": "LineString", "coordinates": line }
        }]
    }))
}
