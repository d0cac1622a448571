//! Performance Monitor
//!
//! Named timestamp marks and duration measurements with summary statistics.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

// == Measure Stats ==
/// Summary of the durations recorded under one measurement name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeasureStats {
    pub count: usize,
    pub min: Duration,
    pub max: Duration,
    pub avg: Duration,
    /// Upper median: the element at `count / 2` of the sorted series
    pub median: Duration,
    /// Element at `floor(count * 0.95)` of the sorted series
    pub p95: Duration,
}

impl MeasureStats {
    /// Summarizes a series; None if it is empty.
    pub fn from_series(values: &[Duration]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_unstable();

        let count = sorted.len();
        let total: Duration = sorted.iter().sum();
        let p95_index = ((count as f64 * 0.95).floor() as usize).min(count - 1);

        Some(Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            avg: total / u32::try_from(count).unwrap_or(u32::MAX),
            median: sorted[count / 2],
            p95: sorted[p95_index],
        })
    }
}

// == Monitor ==
/// Records marks and measurements for the lifetime of the instance.
///
/// Marking a name again overwrites the previous mark. Measurements append to
/// a per-name series until [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct Monitor {
    marks: HashMap<String, Instant>,
    measures: BTreeMap<String, Vec<Duration>>,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    // == Mark ==
    /// Stores the current instant under `name`.
    pub fn mark(&mut self, name: impl Into<String>) {
        self.marks.insert(name.into(), Instant::now());
    }

    // == Measure ==
    /// Records the time from `start_mark` to `end_mark` (or now) under
    /// `name` and returns it.
    ///
    /// A missing start mark logs a warning and returns zero without recording
    /// anything. A missing end mark measures up to now.
    pub fn measure(&mut self, name: &str, start_mark: &str, end_mark: Option<&str>) -> Duration {
        let Some(&start) = self.marks.get(start_mark) else {
            warn!(measure = name, mark = start_mark, "Start mark not found");
            return Duration::ZERO;
        };

        let end = match end_mark {
            Some(mark) => self.marks.get(mark).copied().unwrap_or_else(|| {
                debug!(measure = name, mark, "End mark not found, measuring to now");
                Instant::now()
            }),
            None => Instant::now(),
        };

        let duration = end.saturating_duration_since(start);
        self.measures
            .entry(name.to_string())
            .or_default()
            .push(duration);
        duration
    }

    /// Returns the raw series recorded under `name`.
    pub fn measurements(&self, name: &str) -> Option<&[Duration]> {
        self.measures.get(name).map(Vec::as_slice)
    }

    // == Stats ==
    /// Summarizes the series recorded under `name`; None if nothing was
    /// recorded.
    pub fn get_stats(&self, name: &str) -> Option<MeasureStats> {
        self.measures
            .get(name)
            .and_then(|values| MeasureStats::from_series(values))
    }

    /// Summarizes every recorded series, keyed by measurement name.
    pub fn get_all_stats(&self) -> BTreeMap<String, MeasureStats> {
        self.measures
            .iter()
            .filter_map(|(name, values)| {
                MeasureStats::from_series(values).map(|stats| (name.clone(), stats))
            })
            .collect()
    }

    // == Clear ==
    /// Forgets all marks and measurements.
    pub fn clear(&mut self) {
        self.marks.clear();
        self.measures.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_measure_missing_mark_returns_zero() {
        let mut monitor = Monitor::new();

        assert_eq!(monitor.measure("x", "missing_mark", None), Duration::ZERO);
        assert_eq!(monitor.get_stats("x"), None);
        assert!(monitor.get_all_stats().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_measure_to_now() {
        let mut monitor = Monitor::new();

        monitor.mark("start");
        advance(ms(25)).await;

        assert_eq!(monitor.measure("load", "start", None), ms(25));
        assert_eq!(monitor.measurements("load"), Some(&[ms(25)][..]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_measure_between_marks() {
        let mut monitor = Monitor::new();

        monitor.mark("a");
        advance(ms(10)).await;
        monitor.mark("b");
        advance(ms(50)).await;

        assert_eq!(monitor.measure("a_to_b", "a", Some("b")), ms(10));
        // Unknown end mark measures to now
        assert_eq!(monitor.measure("a_to_now", "a", Some("nope")), ms(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_overwrites() {
        let mut monitor = Monitor::new();

        monitor.mark("start");
        advance(ms(100)).await;
        monitor.mark("start");
        advance(ms(5)).await;

        assert_eq!(monitor.measure("m", "start", None), ms(5));
    }

    #[test]
    fn test_stats_from_series() {
        let values: Vec<Duration> = [50, 10, 40, 20, 30].into_iter().map(ms).collect();
        let stats = MeasureStats::from_series(&values).unwrap();

        assert_eq!(stats.count, 5);
        assert_eq!(stats.min, ms(10));
        assert_eq!(stats.max, ms(50));
        assert_eq!(stats.avg, ms(30));
        assert_eq!(stats.median, ms(30));
        assert_eq!(stats.p95, ms(50));
    }

    #[test]
    fn test_stats_percentiles_on_larger_series() {
        let values: Vec<Duration> = (1..=100).map(ms).collect();
        let stats = MeasureStats::from_series(&values).unwrap();

        assert_eq!(stats.median, ms(51));
        assert_eq!(stats.p95, ms(96));
        assert_eq!(MeasureStats::from_series(&[]), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_all_stats_and_clear() {
        let mut monitor = Monitor::new();

        monitor.mark("t0");
        advance(ms(10)).await;
        monitor.measure("render", "t0", None);
        monitor.measure("render", "t0", None);
        monitor.measure("fetch", "t0", None);

        let all = monitor.get_all_stats();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["fetch", "render"]);
        assert_eq!(all["render"].count, 2);

        monitor.clear();
        assert!(monitor.get_all_stats().is_empty());
        assert_eq!(monitor.measure("render", "t0", None), Duration::ZERO);
    }
}
