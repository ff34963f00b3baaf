use crate::sdk::geo::parse_component;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Opaque routing-provider payload. Cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse(Arc<Value>);

impl RouteResponse {
    pub fn new(body: Value) -> Self {
        Self(Arc::new(body))
    }

    pub fn body(&self) -> &Value {
        &self.0
    }

    /// The object describing the first route: `features[0].properties` for
    /// GeoJSON payloads, `routes[0]` for plain JSON ones.
    fn primary_route(&self) -> Option<&Value> {
        self.0
            .get("features")
            .and_then(Value::as_array)
            .and_then(|features| features.first())
            .and_then(|feature| feature.get("properties"))
            .or_else(|| {
                self.0
                    .get("routes")
                    .and_then(Value::as_array)
                    .and_then(|routes| routes.first())
            })
    }
}

/// One turn-by-turn instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStep {
    pub instruction: String,
    /// Length of the step in meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Expected travel time in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maneuver: Option<String>,
}

/// Whole-route totals, when the provider reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RouteSummary {
    pub distance_m: Option<f64>,
    pub duration_s: Option<f64>,
}

/// Flattens every leg's steps into one ordered list.
pub fn extract_steps(response: &RouteResponse) -> Vec<RouteStep> {
    let Some(route) = response.primary_route() else {
        return Vec::new();
    };

    let legs = route
        .get("legs")
        .and_then(Value::as_array)
        .or_else(|| route.get("segments").and_then(Value::as_array));

    legs.into_iter()
        .flatten()
        .filter_map(|leg| leg.get("steps").and_then(Value::as_array))
        .flatten()
        .filter_map(parse_step)
        .collect()
}

pub fn summarize(response: &RouteResponse) -> RouteSummary {
    let Some(route) = response.primary_route() else {
        return RouteSummary::default();
    };
    let summary = route.get("summary");

    RouteSummary {
        distance_m: number(route.get("distance"))
            .or_else(|| number(summary.and_then(|s| s.get("distance")))),
        duration_s: number(route.get("time"))
            .or_else(|| number(route.get("duration")))
            .or_else(|| number(summary.and_then(|s| s.get("duration")))),
    }
}

fn parse_step(step: &Value) -> Option<RouteStep> {
    let fields = step.as_object()?;
    let instruction_obj = fields.get("instruction");

    let instruction = instruction_obj
        .and_then(Value::as_str)
        .or_else(|| instruction_obj.and_then(|i| i.get("text")).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    let maneuver = text(fields.get("maneuver"))
        .or_else(|| text(fields.get("type")))
        .or_else(|| text(instruction_obj.and_then(|i| i.get("type"))));

    Some(RouteStep {
        instruction,
        distance: number(fields.get("distance")),
        duration: number(fields.get("duration")).or_else(|| number(fields.get("time"))),
        name: text(fields.get("name")).or_else(|| text(fields.get("street_name"))),
        maneuver,
    })
}

fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_component(s),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
