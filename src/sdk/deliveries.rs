use crate::sdk::geo::{deserialize_lenient, Coordinate};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fs, io::Read, path::Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Failed to read deliveries: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid deliveries JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid deliveries CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unsupported deliveries file '{0}' (expected .json or .csv)")]
    UnsupportedFormat(String),
}

/// A delivery record as served by the backend.
///
/// Coordinates and fees may arrive as numbers or as strings; anything
/// unparseable is kept as `None` and the affected stop is skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub pickup_latitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub pickup_longitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub delivery_latitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub delivery_longitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub delivery_fee: Option<f64>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Delivery {
    pub fn pickup(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.pickup_latitude, self.pickup_longitude)
    }

    pub fn destination(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.delivery_latitude, self.delivery_longitude)
    }

    /// Whether the parcel has already left the pickup point.
    pub fn is_picked_up(&self) -> bool {
        self.status.as_deref().is_some_and(|s| {
            matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "picked_up" | "in_transit"
            )
        })
    }

    /// Stops still to visit, in order.
    pub fn remaining_stops(&self) -> Vec<Coordinate> {
        let pickup = if self.is_picked_up() { None } else { self.pickup() };
        pickup.into_iter().chain(self.destination()).collect()
    }

    pub fn label(&self) -> &str {
        self.tracking_number.as_deref().unwrap_or("<untracked>")
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeliveryBook {
    deliveries: Vec<Delivery>,
}

impl DeliveryBook {
    /// Loads a backend export, picking the parser from the file extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DeliveryError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Self::from_json_str(&fs::read_to_string(path)?),
            Some("csv") => Self::from_csv_reader(fs::File::open(path)?),
            _ => Err(DeliveryError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Accepts a bare array or an API envelope (`{"deliveries": [...]}` or
    /// `{"data": [...]}`).
    pub fn from_json_str(json: &str) -> Result<Self, DeliveryError> {
        let body: Value = serde_json::from_str(json)?;
        let list = match body {
            Value::Object(mut envelope) => envelope
                .remove("deliveries")
                .or_else(|| envelope.remove("data"))
                .unwrap_or(Value::Array(Vec::new())),
            other => other,
        };
        let deliveries: Vec<Delivery> = serde_json::from_value(list)?;
        Ok(Self { deliveries })
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DeliveryError> {
        let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let deliveries = rdr
            .deserialize::<Delivery>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { deliveries })
    }

    pub fn all(&self) -> &[Delivery] {
        &self.deliveries
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    pub fn find(&self, tracking_number: &str) -> Option<&Delivery> {
        self.deliveries
            .iter()
            .find(|d| d.tracking_number.as_deref() == Some(tracking_number))
    }
}
