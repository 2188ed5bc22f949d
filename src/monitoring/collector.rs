use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::buffer::{keys, TelemetryBuffer};
use crate::config::MonitoringConfig;
use crate::controller::scheduler::{PeriodicTask, TaskStatus};
use crate::domain::TurbineId;
use crate::error::SinkError;
use crate::repo::TelemetrySink;

/// Timestamps already enqueued, per source
#[derive(Debug, Default)]
struct Watermarks {
    weather: Option<DateTime<Utc>>,
    turbines: HashMap<TurbineId, DateTime<Utc>>,
}

struct PollCore {
    sink: Arc<dyn TelemetrySink>,
    buffer: Arc<TelemetryBuffer>,
    seen: Mutex<Watermarks>,
}

impl PollCore {
    /// Read the latest weather and per-turbine measurement and enqueue what is new.
    ///
    /// A failed per-turbine read is logged and skipped.
    async fn poll(&self) -> Result<usize, SinkError> {
        let mut enqueued = 0;

        if let Some(weather) = self.sink.latest_weather().await? {
            let fresh = {
                let mut seen = self.seen.lock();
                let fresh = seen.weather != Some(weather.timestamp);
                seen.weather = Some(weather.timestamp);
                fresh
            };
            if fresh {
                let values = BTreeMap::from([
                    (keys::WIND_SPEED.to_string(), weather.wind_speed_ms),
                    (keys::TEMPERATURE.to_string(), weather.temperature_c),
                    (keys::PRESSURE.to_string(), weather.pressure_hpa),
                    (keys::HUMIDITY.to_string(), weather.humidity_percent),
                ]);
                if !self.buffer.add_data_point(weather.timestamp, values) {
                    debug!("telemetry queue full, oldest entry dropped");
                }
                enqueued += 1;
            }
        }

        for turbine in self.sink.list_turbines().await? {
            let m = match self.sink.latest_measurement(turbine.id).await {
                Ok(Some(m)) => m,
                Ok(None) => continue,
                Err(e) => {
                    warn!(
                        turbine_id = %turbine.id,
                        error = %e,
                        "failed to read latest measurement"
                    );
                    continue;
                }
            };
            let previous = self.seen.lock().turbines.insert(turbine.id, m.timestamp);
            if previous == Some(m.timestamp) {
                continue;
            }
            let values = BTreeMap::from([
                (keys::power(turbine.id), m.power_output_w),
                (keys::rotor_speed(turbine.id), m.rotor_speed_rpm),
                (keys::blade_pitch(turbine.id), m.blade_pitch_deg),
            ]);
            if !self.buffer.add_data_point(m.timestamp, values) {
                debug!("telemetry queue full, oldest entry dropped");
            }
            enqueued += 1;
        }

        Ok(enqueued)
    }
}

/// Poll loop that feeds a [`TelemetryBuffer`] from the sink.
pub struct TelemetryCollector {
    core: Arc<PollCore>,
    poll_interval: Duration,
    stop_timeout: Duration,
    worker: tokio::sync::Mutex<Option<PeriodicTask>>,
    last_status: Mutex<Option<Arc<parking_lot::RwLock<TaskStatus>>>>,
}

impl TelemetryCollector {
    pub fn new(
        config: &MonitoringConfig,
        stop_timeout: Duration,
        sink: Arc<dyn TelemetrySink>,
        buffer: Arc<TelemetryBuffer>,
    ) -> Self {
        Self {
            core: Arc::new(PollCore {
                sink,
                buffer,
                seen: Mutex::new(Watermarks::default()),
            }),
            poll_interval: config.poll_interval(),
            stop_timeout,
            worker: tokio::sync::Mutex::new(None),
            last_status: Mutex::new(None),
        }
    }

    pub fn buffer(&self) -> Arc<TelemetryBuffer> {
        self.core.buffer.clone()
    }

    /// Single poll, outside the background loop
    pub async fn poll_once(&self) -> Result<usize, SinkError> {
        self.core.poll().await
    }

    pub async fn start_data_collection(&self) {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            return;
        }
        let core = self.core.clone();
        let task = PeriodicTask::spawn("telemetry_collector", self.poll_interval, move || {
            let core = core.clone();
            async move {
                core.poll().await.map(|_| ()).map_err(|e| {
                    warn!(error = %e, "telemetry poll failed");
                    e
                })
            }
        });
        *self.last_status.lock() = Some(task.status_handle());
        *worker = Some(task);
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "data collection started"
        );
    }

    /// Returns `true` when the poll loop exited within the stop timeout.
    pub async fn stop_data_collection(&self) -> bool {
        let task = self.worker.lock().await.take();
        match task {
            Some(task) => {
                let exited = task.stop(self.stop_timeout).await;
                info!(worker_exited = exited, "data collection stopped");
                exited
            }
            None => true,
        }
    }

    pub async fn is_collecting(&self) -> bool {
        self.worker.lock().await.is_some()
    }

    pub fn worker_status(&self) -> Option<TaskStatus> {
        self.last_status.lock().as_ref().map(|s| s.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Turbine, TurbineMeasurement, WeatherSample};
    use crate::repo::{InMemoryTelemetryStore, MockTelemetrySink};

    fn weather(timestamp: DateTime<Utc>) -> WeatherSample {
        WeatherSample {
            timestamp,
            wind_speed_ms: 9.5,
            wind_direction_deg: 270.0,
            temperature_c: 12.0,
            pressure_hpa: 1008.0,
            humidity_percent: 65.0,
        }
    }

    fn measurement(id: u32, timestamp: DateTime<Utc>) -> TurbineMeasurement {
        TurbineMeasurement {
            turbine_id: TurbineId(id),
            timestamp,
            power_output_w: 1.5e6,
            wind_speed_ms: 9.5,
            rotor_speed_rpm: 12.8,
            blade_pitch_deg: 0.0,
            nacelle_orientation_deg: 270.0,
            grid_voltage_v: 400.0,
            grid_frequency_hz: 50.0,
        }
    }

    fn collector(sink: Arc<dyn TelemetrySink>) -> TelemetryCollector {
        let cfg = MonitoringConfig {
            poll_interval_ms: 10,
            ..MonitoringConfig::default()
        };
        TelemetryCollector::new(
            &cfg,
            Duration::from_millis(500),
            sink,
            Arc::new(TelemetryBuffer::default()),
        )
    }

    #[tokio::test]
    async fn test_poll_enqueues_weather_and_measurements_once() {
        let store = Arc::new(InMemoryTelemetryStore::with_fleet(
            vec![Turbine::new(1, "T1", 3.05e6)],
            vec![],
        ));
        let now = Utc::now();
        store.save_weather(&weather(now)).await.unwrap();
        store.save_measurement(&measurement(1, now)).await.unwrap();

        let collector = collector(store.clone());
        assert_eq!(collector.poll_once().await.unwrap(), 2);
        assert_eq!(collector.poll_once().await.unwrap(), 0);

        let buffer = collector.buffer();
        buffer.drain();
        assert_eq!(buffer.series("wind_speed"), vec![(now, 9.5)]);
        assert_eq!(buffer.series("power_1"), vec![(now, 1.5e6)]);
        assert_eq!(buffer.series("rotor_speed_1"), vec![(now, 12.8)]);
    }

    #[tokio::test]
    async fn test_poll_failure_is_reported() {
        let mut sink = MockTelemetrySink::new();
        sink.expect_latest_weather()
            .returning(|| Err(SinkError::Unavailable("timeout".into())));
        let collector = collector(Arc::new(sink));
        assert!(collector.poll_once().await.is_err());
    }

    #[tokio::test]
    async fn test_one_turbine_read_failure_does_not_block_the_rest() {
        let now = Utc::now();
        let mut sink = MockTelemetrySink::new();
        sink.expect_latest_weather().returning(|| Ok(None));
        sink.expect_list_turbines().returning(|| {
            Ok(vec![
                Turbine::new(1, "T1", 3.05e6),
                Turbine::new(2, "T2", 3.05e6),
            ])
        });
        sink.expect_latest_measurement().returning(move |id| {
            if id == TurbineId(1) {
                Err(SinkError::Backend("row lock timeout".into()))
            } else {
                Ok(Some(measurement(id.0, now)))
            }
        });
        let collector = collector(Arc::new(sink));

        assert_eq!(collector.poll_once().await.unwrap(), 1);

        let buffer = collector.buffer();
        buffer.drain();
        assert!(buffer.series("power_1").is_empty());
        assert_eq!(buffer.series("power_2"), vec![(now, 1.5e6)]);
    }

    #[tokio::test]
    async fn test_start_stop_collection() {
        let store = Arc::new(InMemoryTelemetryStore::new());
        store.save_weather(&weather(Utc::now())).await.unwrap();
        let collector = collector(store);

        collector.start_data_collection().await;
        collector.start_data_collection().await;
        assert!(collector.is_collecting().await);
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(collector.stop_data_collection().await);
        assert!(!collector.is_collecting().await);
        assert_eq!(collector.buffer().pending(), 1);
        assert!(collector.worker_status().unwrap().run_count >= 2);
    }
}
