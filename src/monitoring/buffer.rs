//! # Telemetry Buffer
//!
//! Bounded ingestion queue feeding fixed-capacity per-key series. Producers
//! never block: a full queue drops its oldest unread entry. A drain moves
//! queued entries into the series, creating a series the first time a key
//! is seen. Every operation takes the single buffer lock for its own
//! duration only.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::config::MonitoringConfig;
use crate::domain::{Turbine, TurbineId};
use crate::utils::RingBuffer;

/// Series keys written by the collector
pub mod keys {
    use crate::domain::TurbineId;

    pub const WIND_SPEED: &str = "wind_speed";
    pub const TEMPERATURE: &str = "temperature";
    pub const PRESSURE: &str = "pressure";
    pub const HUMIDITY: &str = "humidity";

    pub fn power(id: TurbineId) -> String {
        format!("power_{id}")
    }

    pub fn rotor_speed(id: TurbineId) -> String {
        format!("rotor_speed_{id}")
    }

    pub fn blade_pitch(id: TurbineId) -> String {
        format!("blade_pitch_{id}")
    }
}

/// One timestamped set of readings waiting in the queue
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub values: BTreeMap<String, f64>,
}

/// Series ready for a plot: a label and its own time axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelledSeries {
    pub key: String,
    pub label: String,
    pub points: Vec<(DateTime<Utc>, f64)>,
}

struct Buffers {
    queue: RingBuffer<DataPoint>,
    series: HashMap<String, RingBuffer<(DateTime<Utc>, f64)>>,
}

pub struct TelemetryBuffer {
    max_points: usize,
    inner: Mutex<Buffers>,
}

impl TelemetryBuffer {
    pub fn new(max_points: usize, queue_capacity: usize) -> Self {
        Self {
            max_points: max_points.max(1),
            inner: Mutex::new(Buffers {
                queue: RingBuffer::new(queue_capacity),
                series: HashMap::new(),
            }),
        }
    }

    pub fn from_config(config: &MonitoringConfig) -> Self {
        Self::new(config.max_points, config.queue_capacity)
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// Enqueue readings. Returns `false` when the oldest queued entry had to be dropped.
    pub fn add_data_point(&self, timestamp: DateTime<Utc>, values: BTreeMap<String, f64>) -> bool {
        self.inner
            .lock()
            .queue
            .push(DataPoint { timestamp, values })
            .is_none()
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Queue entries lost to overflow since creation
    pub fn dropped(&self) -> u64 {
        self.inner.lock().queue.evicted()
    }

    /// Move every queued entry into its per-key series. Returns the number of entries moved.
    pub fn drain(&self) -> usize {
        let mut guard = self.inner.lock();
        let Buffers { queue, series } = &mut *guard;
        let mut moved = 0;
        for point in queue.drain() {
            for (key, value) in point.values {
                series
                    .entry(key)
                    .or_insert_with(|| RingBuffer::new(self.max_points))
                    .push((point.timestamp, value));
            }
            moved += 1;
        }
        moved
    }

    pub fn series(&self, key: &str) -> Vec<(DateTime<Utc>, f64)> {
        self.inner
            .lock()
            .series
            .get(key)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn series_len(&self, key: &str) -> usize {
        self.inner.lock().series.get(key).map_or(0, |s| s.len())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.lock().series.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn latest(&self, key: &str) -> Option<(DateTime<Utc>, f64)> {
        self.inner.lock().series.get(key).and_then(|s| s.back().copied())
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.queue.clear();
        inner.series.clear();
    }

    /// Drain, then one power series per turbine that has data, labelled by name.
    pub fn power_series(&self, turbines: &[Turbine]) -> Vec<LabelledSeries> {
        self.drain();
        turbines
            .iter()
            .filter_map(|t| {
                let key = keys::power(t.id);
                let points = self.series(&key);
                (!points.is_empty()).then(|| LabelledSeries {
                    key,
                    label: t.name.clone(),
                    points,
                })
            })
            .collect()
    }

    /// Drain, then the wind speed series.
    pub fn wind_series(&self) -> LabelledSeries {
        self.drain();
        LabelledSeries {
            key: keys::WIND_SPEED.to_string(),
            label: "Wind Speed (m/s)".to_string(),
            points: self.series(keys::WIND_SPEED),
        }
    }

    /// Drain, then rotor speed and blade pitch for one turbine.
    pub fn mechanical_series(&self, id: TurbineId) -> [LabelledSeries; 2] {
        self.drain();
        let rotor = keys::rotor_speed(id);
        let pitch = keys::blade_pitch(id);
        [
            LabelledSeries {
                points: self.series(&rotor),
                key: rotor,
                label: "Rotor Speed (rpm)".to_string(),
            },
            LabelledSeries {
                points: self.series(&pitch),
                key: pitch,
                label: "Blade Pitch (°)".to_string(),
            },
        ]
    }
}

impl Default for TelemetryBuffer {
    fn default() -> Self {
        Self::from_config(&MonitoringConfig::default())
    }
}
