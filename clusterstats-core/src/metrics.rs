//! Prometheus metrics for the coordination layer
//!
//! Counters, gauges and histograms rendered in the text exposition format.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// Counter metric (monotonically increasing)
pub struct Counter {
    value: AtomicU64,
    name: &'static str,
    help: &'static str,
}

impl Counter {
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            value: AtomicU64::new(0),
            name,
            help,
        }
    }

    pub fn inc(&self) {
        self.inc_by(1);
    }

    pub fn inc_by(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Format as Prometheus metric
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP {0} {1}\n# TYPE {0} counter\n{0} {2}\n",
            self.name,
            self.help,
            self.get()
        )
    }
}

/// Gauge metric (can go up or down)
pub struct Gauge {
    value: AtomicI64,
    name: &'static str,
    help: &'static str,
}

impl Gauge {
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            value: AtomicI64::new(0),
            name,
            help,
        }
    }

    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Format as Prometheus metric
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP {0} {1}\n# TYPE {0} gauge\n{0} {2}\n",
            self.name,
            self.help,
            self.get()
        )
    }
}

/// Latency histogram with cumulative buckets in seconds
pub struct Histogram {
    bounds: &'static [f64],
    buckets: Vec<AtomicU64>,
    sum_micros: AtomicU64,
    count: AtomicU64,
    name: &'static str,
    help: &'static str,
}

/// Default latency buckets, in seconds
pub const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0];

impl Histogram {
    pub fn new(name: &'static str, help: &'static str) -> Self {
        Self::with_buckets(name, help, LATENCY_BUCKETS)
    }

    pub fn with_buckets(name: &'static str, help: &'static str, bounds: &'static [f64]) -> Self {
        Self {
            bounds,
            buckets: bounds.iter().map(|_| AtomicU64::new(0)).collect(),
            sum_micros: AtomicU64::new(0),
            count: AtomicU64::new(0),
            name,
            help,
        }
    }

    /// Observe a duration
    pub fn observe(&self, elapsed: Duration) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);

        let secs = elapsed.as_secs_f64();
        for (bound, bucket) in self.bounds.iter().zip(&self.buckets) {
            if secs <= *bound {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Format as Prometheus metric
    pub fn to_prometheus(&self) -> String {
        let mut output = format!("# HELP {0} {1}\n# TYPE {0} histogram\n", self.name, self.help);

        for (bound, bucket) in self.bounds.iter().zip(&self.buckets) {
            let _ = writeln!(
                output,
                "{}_bucket{{le=\"{}\"}} {}",
                self.name,
                bound,
                bucket.load(Ordering::Relaxed)
            );
        }
        let _ = writeln!(output, "{}_bucket{{le=\"+Inf\"}} {}", self.name, self.count());

        let sum_secs = self.sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;
        let _ = writeln!(output, "{}_sum {}", self.name, sum_secs);
        let _ = writeln!(output, "{}_count {}", self.name, self.count());
        output
    }
}

/// Standard collection metrics
pub mod standard {
    use super::*;
    use std::sync::LazyLock;

    pub static STATS_REQUESTS: Counter = Counter::new(
        "clusterstats_requests_total",
        "Total cluster stats collections",
    );

    pub static MEMBER_CALLS: Counter = Counter::new(
        "clusterstats_member_calls_total",
        "Total per-member stats calls issued",
    );

    pub static MEMBER_FAILURES: Counter = Counter::new(
        "clusterstats_member_failures_total",
        "Total member calls that produced a failure record",
    );

    pub static MEMBER_TIMEOUTS: Counter = Counter::new(
        "clusterstats_member_timeouts_total",
        "Total member calls that timed out",
    );

    pub static LAST_MEMBER_COUNT: Gauge = Gauge::new(
        "clusterstats_last_member_count",
        "Members targeted by the most recent collection",
    );

    pub static GATHER_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
        Histogram::new(
            "clusterstats_gather_duration_seconds",
            "Time from dispatch to aggregated result",
        )
    });

    pub static MEMBER_CALL_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
        Histogram::new(
            "clusterstats_member_call_duration_seconds",
            "Per-member call latency",
        )
    });
}

/// Render all standard metrics
pub fn gather_system_metrics() -> String {
    let mut output = String::new();

    output.push_str(&standard::STATS_REQUESTS.to_prometheus());
    output.push_str(&standard::MEMBER_CALLS.to_prometheus());
    output.push_str(&standard::MEMBER_FAILURES.to_prometheus());
    output.push_str(&standard::MEMBER_TIMEOUTS.to_prometheus());

    output.push_str(&standard::LAST_MEMBER_COUNT.to_prometheus());

    output.push_str(&standard::GATHER_DURATION.to_prometheus());
    output.push_str(&standard::MEMBER_CALL_DURATION.to_prometheus());

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = Counter::new("test_counter", "Test counter");
        counter.inc();
        counter.inc_by(4);
        assert_eq!(counter.get(), 5);
        assert!(counter.to_prometheus().contains("test_counter 5"));
    }

    #[test]
    fn test_gauge() {
        let gauge = Gauge::new("test_gauge", "Test gauge");
        gauge.set(-3);
        assert_eq!(gauge.get(), -3);
    }

    #[test]
    fn test_histogram_buckets() {
        let histogram = Histogram::new("test_latency", "Test latency");
        histogram.observe(Duration::from_millis(2));
        histogram.observe(Duration::from_secs(60));

        let text = histogram.to_prometheus();
        assert!(text.contains("test_latency_bucket{le=\"0.005\"} 1"));
        assert!(text.contains("test_latency_bucket{le=\"30\"} 1"));
        assert!(text.contains("test_latency_bucket{le=\"+Inf\"} 2"));
        assert!(text.contains("test_latency_count 2"));
    }

    #[test]
    fn test_gather_system_metrics_lists_everything() {
        let text = gather_system_metrics();
        for name in [
            "clusterstats_requests_total",
            "clusterstats_member_failures_total",
            "clusterstats_gather_duration_seconds",
        ] {
            assert!(text.contains(name), "missing {}", name);
        }
    }
}
