//! Telemetry aggregation
//!
//! A sampler records readings per [`MetricKey`]; consumers ask for the mean over a
//! trailing window. Each key owns an age-bounded series behind its own lock, so a
//! writer on one metric never blocks readers of another.
//!
//! Timestamps are seconds on the caller's clock. They only have to be consistent
//! within one aggregator, which by default uses a monotonic clock starting at zero.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::metrics as metrics_const;
use crate::error::{AsusfanError, Result};
use crate::settings::Preferences;

/// Time source for "now" in window queries
pub trait Clock: Send + Sync {
    /// Seconds
    fn now(&self) -> f64;
}

/// Seconds since construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(now: f64) -> Self {
        Self { bits: AtomicU64::new(now.to_bits()) }
    }

    pub fn set(&self, now: f64) {
        self.bits.store(now.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, secs: f64) {
        self.set(self.now() + secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

/// Telemetry channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    CpuLoad,
    GpuLoad,
    Fps,
    NetSent,
    NetRecv,
    CpuTemp,
    GpuTemp,
    MemoryLoad,
}

impl MetricKey {
    pub const ALL: [MetricKey; 8] = [
        MetricKey::CpuLoad,
        MetricKey::GpuLoad,
        MetricKey::Fps,
        MetricKey::NetSent,
        MetricKey::NetRecv,
        MetricKey::CpuTemp,
        MetricKey::GpuTemp,
        MetricKey::MemoryLoad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::CpuLoad => "cpu_load",
            MetricKey::GpuLoad => "gpu_load",
            MetricKey::Fps => "fps",
            MetricKey::NetSent => "net_sent",
            MetricKey::NetRecv => "net_recv",
            MetricKey::CpuTemp => "cpu_temp",
            MetricKey::GpuTemp => "gpu_temp",
            MetricKey::MemoryLoad => "memory_load",
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = AsusfanError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        MetricKey::ALL
            .into_iter()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| AsusfanError::UnknownMetric(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: f64,
    pub value: f64,
}

/// Samples of one metric, oldest first, bounded by age and count
#[derive(Debug, Clone)]
pub struct MetricSeries {
    key: MetricKey,
    samples: VecDeque<MetricSample>,
    retention_secs: f64,
    max_samples: usize,
}

impl MetricSeries {
    pub fn new(key: MetricKey, retention_secs: u32, max_samples: usize) -> Self {
        Self {
            key,
            samples: VecDeque::new(),
            retention_secs: f64::from(retention_secs),
            max_samples: max_samples.max(1),
        }
    }

    /// Append a sample and evict what fell out of retention
    pub fn push(&mut self, sample: MetricSample) -> Result<()> {
        let invalid = |reason: String| AsusfanError::InvalidSample {
            metric: self.key.to_string(),
            reason,
        };

        if !sample.value.is_finite() {
            return Err(invalid(format!("value {} is not finite", sample.value)));
        }
        if !sample.timestamp.is_finite() {
            return Err(invalid(format!("timestamp {} is not finite", sample.timestamp)));
        }
        if let Some(newest) = self.samples.back() {
            if sample.timestamp < newest.timestamp {
                return Err(invalid(format!(
                    "timestamp {} is older than the newest sample ({})",
                    sample.timestamp, newest.timestamp
                )));
            }
        }

        self.samples.push_back(sample);

        let cutoff = sample.timestamp - self.retention_secs;
        while self.samples.front().is_some_and(|s| s.timestamp < cutoff) {
            self.samples.pop_front();
        }
        while self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }

        Ok(())
    }

    /// Mean of samples with timestamp in `[now - window, now]`
    ///
    /// A zero window returns the most recent sample at or before `now`.
    pub fn average(&self, window_secs: u32, now: f64) -> Option<f64> {
        if window_secs == 0 {
            return self
                .samples
                .iter()
                .rev()
                .find(|s| s.timestamp <= now)
                .map(|s| s.value);
        }

        let start = now - f64::from(window_secs);
        let (sum, count) = self
            .samples
            .iter()
            .filter(|s| s.timestamp >= start && s.timestamp <= now)
            .fold((0.0, 0usize), |(sum, count), s| (sum + s.value, count + 1));

        (count > 0).then(|| sum / count as f64)
    }

    pub fn latest(&self) -> Option<MetricSample> {
        self.samples.back().copied()
    }

    pub fn samples(&self) -> impl Iterator<Item = &MetricSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

type SharedSeries = Arc<RwLock<MetricSeries>>;

/// Per-metric series with windowed averages
pub struct MetricsAggregator {
    series: RwLock<HashMap<MetricKey, SharedSeries>>,
    clock: Arc<dyn Clock>,
    retention_secs: u32,
    max_samples: usize,
}

impl MetricsAggregator {
    /// Aggregator with a monotonic clock
    ///
    /// `retention_secs` must cover the largest averaging window consumers may ask for.
    pub fn new(retention_secs: u32) -> Result<Self> {
        Self::with_clock(retention_secs, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(retention_secs: u32, clock: Arc<dyn Clock>) -> Result<Self> {
        if retention_secs < metrics_const::MAX_WINDOW_SECS {
            return Err(AsusfanError::InvalidConfig {
                field: "metrics_retention_seconds".to_string(),
                reason: format!(
                    "must be at least the largest averaging window ({}s)",
                    metrics_const::MAX_WINDOW_SECS
                ),
            });
        }

        Ok(Self {
            series: RwLock::new(HashMap::new()),
            clock,
            retention_secs,
            max_samples: metrics_const::DEFAULT_MAX_SAMPLES,
        })
    }

    pub fn from_preferences(prefs: &Preferences) -> Result<Self> {
        Self::new(prefs.metrics_retention_seconds)
    }

    /// Cap on samples per series; applies to series created afterwards
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples.max(1);
        self
    }

    pub fn retention_secs(&self) -> u32 {
        self.retention_secs
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    fn series(&self, key: MetricKey) -> Option<SharedSeries> {
        self.series.read().get(&key).cloned()
    }

    fn series_or_create(&self, key: MetricKey) -> SharedSeries {
        if let Some(series) = self.series(key) {
            return series;
        }
        let mut map = self.series.write();
        map.entry(key)
            .or_insert_with(|| {
                debug!("Creating metric series {}", key);
                Arc::new(RwLock::new(MetricSeries::new(
                    key,
                    self.retention_secs,
                    self.max_samples,
                )))
            })
            .clone()
    }

    /// Record a sample taken at `timestamp`
    pub fn record(&self, key: MetricKey, value: f64, timestamp: f64) -> Result<()> {
        let series = self.series_or_create(key);
        let mut series = series.write();
        series.push(MetricSample { timestamp, value })
    }

    /// Record a sample taken now
    pub fn record_now(&self, key: MetricKey, value: f64) -> Result<()> {
        self.record(key, value, self.clock.now())
    }

    /// Mean over the trailing `window_secs` ending now
    pub fn average(&self, key: MetricKey, window_secs: u32) -> Result<Option<f64>> {
        self.average_at(key, window_secs, self.clock.now())
    }

    /// Mean over `[now - window_secs, now]`
    pub fn average_at(&self, key: MetricKey, window_secs: u32, now: f64) -> Result<Option<f64>> {
        if window_secs > self.retention_secs {
            return Err(AsusfanError::WindowExceedsRetention {
                window_secs,
                retention_secs: self.retention_secs,
            });
        }

        Ok(self
            .series(key)
            .and_then(|series| series.read().average(window_secs, now)))
    }

    /// Averages for every metric that has data in the window
    pub fn averages(&self, window_secs: u32) -> Result<HashMap<MetricKey, f64>> {
        let now = self.clock.now();
        let mut result = HashMap::new();
        for key in self.keys() {
            if let Some(avg) = self.average_at(key, window_secs, now)? {
                result.insert(key, avg);
            }
        }
        Ok(result)
    }

    pub fn latest(&self, key: MetricKey) -> Option<MetricSample> {
        self.series(key).and_then(|series| series.read().latest())
    }

    /// Copy of a series, oldest first
    pub fn history(&self, key: MetricKey) -> Vec<MetricSample> {
        self.series(key)
            .map(|series| series.read().samples().copied().collect())
            .unwrap_or_default()
    }

    /// Keys that have received at least one sample, sorted
    pub fn keys(&self) -> Vec<MetricKey> {
        let mut keys: Vec<MetricKey> = self.series.read().keys().copied().collect();
        keys.sort();
        keys
    }
}

/// Converts a cumulative byte counter into megabits per second
#[derive(Debug, Clone, Default)]
pub struct ThroughputMeter {
    last: Option<(f64, u64)>,
}

impl ThroughputMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the counter's value at `timestamp`; returns Mbps since the previous reading
    ///
    /// The first reading, a non-advancing clock, and a counter that went backwards
    /// (interface reset) only establish a new baseline.
    pub fn update(&mut self, total_bytes: u64, timestamp: f64) -> Option<f64> {
        let previous = self.last.replace((timestamp, total_bytes));
        let (prev_ts, prev_bytes) = previous?;

        let elapsed = timestamp - prev_ts;
        if elapsed <= 0.0 || total_bytes < prev_bytes {
            return None;
        }

        let bits = (total_bytes - prev_bytes) as f64 * metrics_const::BITS_PER_BYTE;
        Some(bits / elapsed / metrics_const::BITS_PER_MEGABIT)
    }
}
