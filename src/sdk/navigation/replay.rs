use super::position::{PositionError, PositionSource, PositionWatch, WatchOptions};
use crate::sdk::geo::Coordinate;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Replays a recorded GPX drive as live positions.
#[derive(Debug, Clone)]
pub struct GpxReplaySource {
    points: Vec<Coordinate>,
    interval: Duration,
}

impl GpxReplaySource {
    pub fn new(points: Vec<Coordinate>, interval: Duration) -> Self {
        Self { points, interval }
    }

    /// Reads track points, or route points when the file has no tracks.
    pub fn from_reader<R: Read>(reader: R, interval: Duration) -> Result<Self, PositionError> {
        let gpx = gpx::read(reader)
            .map_err(|e| PositionError::Unavailable(format!("GPX parse error: {e}")))?;

        let mut points: Vec<Coordinate> = gpx
            .tracks
            .iter()
            .flat_map(|t| t.segments.iter())
            .flat_map(|seg| seg.points.iter())
            .map(|wp| Coordinate::new(wp.point().y(), wp.point().x()))
            .collect();

        if points.is_empty() {
            points = gpx
                .routes
                .iter()
                .flat_map(|r| r.points.iter())
                .map(|wp| Coordinate::new(wp.point().y(), wp.point().x()))
                .collect();
        }

        Ok(Self::new(points, interval))
    }

    pub fn from_path<P: AsRef<Path>>(path: P, interval: Duration) -> Result<Self, PositionError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| PositionError::Unavailable(format!("{}: {e}", path.display())))?;
        Self::from_reader(BufReader::new(file), interval)
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }
}

impl PositionSource for GpxReplaySource {
    fn current_position(&self, _options: &WatchOptions) -> Result<Coordinate, PositionError> {
        self.points
            .first()
            .copied()
            .ok_or_else(|| PositionError::Unavailable("recorded track is empty".to_string()))
    }

    fn watch(&self, options: &WatchOptions) -> Result<PositionWatch, PositionError> {
        if self.points.is_empty() {
            return Err(PositionError::Unavailable("recorded track is empty".to_string()));
        }
        log::debug!(
            "Replaying {} positions every {:?} (high accuracy: {})",
            self.points.len(),
            self.interval,
            options.high_accuracy
        );

        let points = self.points.clone();
        let interval = self.interval;
        Ok(PositionWatch::spawn(move |sink| {
            for (i, point) in points.into_iter().enumerate() {
                if i > 0 && !interval.is_zero() {
                    thread::sleep(interval);
                }
                if !sink.emit(Ok(point)) {
                    break;
                }
            }
        }))
    }
}
