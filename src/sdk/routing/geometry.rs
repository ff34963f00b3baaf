use super::response::RouteResponse;
use crate::sdk::geo::{haversine_distance, Coordinate};
use serde_json::Value;

/// Route line flattened into ordered `[lng, lat]` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteGeometry {
    points: Vec<[f64; 2]>,
}

impl RouteGeometry {
    pub fn from_points(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    /// Concatenates every `LineString` and every `MultiLineString` sub-path
    /// of the response's features, in feature order. Unknown geometry types
    /// and malformed positions are skipped.
    pub fn from_response(response: &RouteResponse) -> Self {
        let body = response.body();
        let features: Vec<&Value> = match body.get("features").and_then(Value::as_array) {
            Some(features) => features.iter().collect(),
            None if body.get("geometry").is_some() => vec![body],
            None => Vec::new(),
        };

        let mut points = Vec::new();
        for geometry in features.iter().filter_map(|f| f.get("geometry")) {
            let coordinates = geometry.get("coordinates").and_then(Value::as_array);
            match (geometry.get("type").and_then(Value::as_str), coordinates) {
                (Some("LineString"), Some(path)) => {
                    points.extend(path.iter().filter_map(position));
                }
                (Some("MultiLineString"), Some(paths)) => {
                    for path in paths.iter().filter_map(Value::as_array) {
                        points.extend(path.iter().filter_map(position));
                    }
                }
                _ => {}
            }
        }

        Self { points }
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Minimum distance in meters from `point` to any segment of the route.
    ///
    /// Infinite when the index holds fewer than two points.
    pub fn distance_to_route(&self, point: &Coordinate) -> f64 {
        self.points
            .windows(2)
            .map(|w| {
                let a = Coordinate::new(w[0][1], w[0][0]);
                let b = Coordinate::new(w[1][1], w[1][0]);
                point_to_segment_distance(point, &a, &b)
            })
            .fold(f64::INFINITY, f64::min)
    }
}

fn position(value: &Value) -> Option<[f64; 2]> {
    let pair = value.as_array()?;
    let lng = pair.first()?.as_f64()?;
    let lat = pair.get(1)?.as_f64()?;
    (lng.is_finite() && lat.is_finite()).then_some([lng, lat])
}

/// Distance from `p` to segment A-B.
///
/// The nearest point is found in an equirectangular projection (longitude
/// scaled by the cosine of the segment's mean latitude), then measured with
/// haversine. Only valid for street-scale segments.
fn point_to_segment_distance(p: &Coordinate, a: &Coordinate, b: &Coordinate) -> f64 {
    let cos_lat = ((a.lat + b.lat) / 2.0).to_radians().cos();

    let dx = (b.lng - a.lng) * cos_lat;
    let dy = b.lat - a.lat;
    let px = (p.lng - a.lng) * cos_lat;
    let py = p.lat - a.lat;

    let seg_len_sq = dx * dx + dy * dy;
    if seg_len_sq < 1e-20 {
        return haversine_distance(p, a);
    }

    let t = ((px * dx + py * dy) / seg_len_sq).clamp(0.0, 1.0);
    let nearest = Coordinate::new(a.lat + t * (b.lat - a.lat), a.lng + t * (b.lng - a.lng));
    haversine_distance(p, &nearest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::geo::EARTH_RADIUS_M;
    use serde_json::json;

    fn meters_to_lat_degrees(m: f64) -> f64 {
        (m / EARTH_RADIUS_M).to_degrees()
    }

    #[test]
    fn multilinestring_sub_paths_are_concatenated_in_order() {
        let response = RouteResponse::new(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "MultiLineString",
                    "coordinates": [
                        [[85.00, 27.00], [85.01, 27.01], [85.02, 27.02]],
                        [[85.10, 27.10], [85.11, 27.11], [85.12, 27.12], [85.13, 27.13]]
                    ]
                }
            }]
        }));

        let geometry = RouteGeometry::from_response(&response);
        assert_eq!(geometry.len(), 7);
        assert_eq!(geometry.points()[0], [85.00, 27.00]);
        assert_eq!(geometry.points()[2], [85.02, 27.02]);
        assert_eq!(geometry.points()[3], [85.10, 27.10]);
        assert_eq!(geometry.points()[6], [85.13, 27.13]);
    }

    #[test]
    fn linestrings_across_features_and_garbage_is_skipped() {
        let response = RouteResponse::new(json!({
            "features": [
                { "geometry": { "type": "LineString", "coordinates": [[1.0, 2.0], [3.0, 4.0]] } },
                { "geometry": { "type": "Point", "coordinates": [9.0, 9.0] } },
                { "geometry": { "type": "LineString", "coordinates": [[5.0, "x"], [5.0, 6.0], "bad"] } },
                { "properties": {} }
            ]
        }));

        let geometry = RouteGeometry::from_response(&response);
        assert_eq!(geometry.points(), &[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
    }

    #[test]
    fn missing_geometry_is_empty() {
        assert!(RouteGeometry::from_response(&RouteResponse::new(json!({}))).is_empty());
        assert!(RouteGeometry::from_response(&RouteResponse::new(json!({ "features": "?" }))).is_empty());
    }

    #[test]
    fn distance_is_infinite_without_a_segment() {
        let point = Coordinate::new(0.0, 0.0);
        assert!(RouteGeometry::default().distance_to_route(&point).is_infinite());
        assert!(RouteGeometry::from_points(vec![[0.0, 0.0]])
            .distance_to_route(&point)
            .is_infinite());
    }

    #[test]
    fn perpendicular_distance_to_segment() {
        let geometry = RouteGeometry::from_points(vec![[0.0, 0.0], [0.01, 0.0]]);
        let point = Coordinate::new(meters_to_lat_degrees(50.0), 0.005);
        let dist = geometry.distance_to_route(&point);
        assert!((dist - 50.0).abs() < 1e-6, "got {dist}");
    }

    #[test]
    fn distance_clamps_to_segment_endpoint() {
        let geometry = RouteGeometry::from_points(vec![[0.0, 0.0], [0.01, 0.0]]);
        let before_start = Coordinate::new(0.0, -0.001);
        let expected = haversine_distance(&before_start, &Coordinate::new(0.0, 0.0));
        assert!((geometry.distance_to_route(&before_start) - expected).abs() < 1e-6);
    }

    #[test]
    fn nearest_segment_wins() {
        // L-shaped route: east along the equator, then north
        let geometry =
            RouteGeometry::from_points(vec![[0.0, 0.0], [0.01, 0.0], [0.01, 0.01]]);
        let near_second_leg = Coordinate::new(0.005, 0.0101);
        let dist = geometry.distance_to_route(&near_second_leg);
        assert!(dist < 15.0, "got {dist}");
    }
}
