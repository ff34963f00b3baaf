use crate::sdk::geo::Coordinate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// Oldest cached fix the platform may hand back.
    pub max_cached_age: Duration,
    pub timeout: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            max_cached_age: Duration::from_millis(5000),
            timeout: Duration::from_millis(15000),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PositionError {
    #[error("Location permission was denied")]
    PermissionDenied,

    #[error("Location tracking is not supported on this device")]
    Unsupported,

    #[error("Position unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out waiting for a position fix")]
    Timeout,
}

impl PositionError {
    /// Errors after which the platform will not deliver further fixes.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PositionError::PermissionDenied | PositionError::Unsupported)
    }
}

pub type PositionUpdate = Result<Coordinate, PositionError>;

pub trait PositionSource {
    fn current_position(&self, options: &WatchOptions) -> Result<Coordinate, PositionError>;

    /// Starts continuous tracking. An `Err` here means tracking never started.
    fn watch(&self, options: &WatchOptions) -> Result<PositionWatch, PositionError>;
}

/// One-shot fix used to centre the initial view, falling back to `fallback`.
pub fn initial_center(
    source: &dyn PositionSource,
    options: &WatchOptions,
    fallback: Coordinate,
) -> Coordinate {
    match source.current_position(options) {
        Ok(position) => position,
        Err(e) => {
            log::warn!("No initial position fix ({}), centring on {}", e, fallback);
            fallback
        }
    }
}

/// Starts continuous tracking, or logs why it could not start. A source
/// that cannot track leaves the caller without a watch but otherwise intact.
pub fn start_watch(source: &dyn PositionSource, options: &WatchOptions) -> Option<PositionWatch> {
    match source.watch(options) {
        Ok(watch) => Some(watch),
        Err(e) => {
            log::error!("Live tracking not started: {}", e);
            None
        }
    }
}

/// Producer half handed to the thread that feeds a watch.
pub struct WatchSink {
    tx: Sender<PositionUpdate>,
    cancelled: Arc<AtomicBool>,
}

impl WatchSink {
    /// Delivers an update. Returns `false` once the watch is gone, at which
    /// point the producer should stop.
    pub fn emit(&self, update: PositionUpdate) -> bool {
        !self.is_cancelled() && self.tx.send(update).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Live subscription to position updates.
pub struct PositionWatch {
    updates: Receiver<PositionUpdate>,
    cancelled: Arc<AtomicBool>,
}

impl PositionWatch {
    /// Runs `producer` on a background thread feeding this watch.
    pub fn spawn<F>(producer: F) -> Self
    where
        F: FnOnce(WatchSink) + Send + 'static,
    {
        let (tx, updates) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let sink = WatchSink {
            tx,
            cancelled: Arc::clone(&cancelled),
        };
        thread::spawn(move || producer(sink));
        Self { updates, cancelled }
    }

    /// Blocks for the next update; `None` when the source is exhausted.
    pub fn next_update(&self) -> Option<PositionUpdate> {
        if self.cancelled.load(Ordering::SeqCst) {
            return None;
        }
        self.updates.recv().ok()
    }

    /// Stops tracking. Consumes the watch, so nothing can be received
    /// afterwards; the producer notices on its next emit.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Iterator for PositionWatch {
    type Item = PositionUpdate;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_update()
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Source for platforms without location services.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSource;

impl PositionSource for UnsupportedSource {
    fn current_position(&self, _options: &WatchOptions) -> Result<Coordinate, PositionError> {
        Err(PositionError::Unsupported)
    }

    fn watch(&self, _options: &WatchOptions) -> Result<PositionWatch, PositionError> {
        Err(PositionError::Unsupported)
    }
}
