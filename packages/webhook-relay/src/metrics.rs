//! Process-wide relay counters, rendered in Prometheus text format.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    // --- Inbound ---
    pub deliveries_total: AtomicU64,
    pub deliveries_forwarded: AtomicU64,
    pub deliveries_dropped: AtomicU64,
    pub rejected_path: AtomicU64,
    pub rejected_malformed: AtomicU64,
    pub rejected_auth: AtomicU64,

    // --- Upstream ---
    pub upstream_requests: AtomicU64,
    pub upstream_errors: AtomicU64,
    pub all_upstreams_failed: AtomicU64,

    // --- Latency ---
    pub relay_duration_us_sum: AtomicU64,
    pub relay_duration_us_max: AtomicU64,
}

impl Metrics {
    const fn new() -> Self {
        Self {
            deliveries_total: AtomicU64::new(0),
            deliveries_forwarded: AtomicU64::new(0),
            deliveries_dropped: AtomicU64::new(0),
            rejected_path: AtomicU64::new(0),
            rejected_malformed: AtomicU64::new(0),
            rejected_auth: AtomicU64::new(0),
            upstream_requests: AtomicU64::new(0),
            upstream_errors: AtomicU64::new(0),
            all_upstreams_failed: AtomicU64::new(0),
            relay_duration_us_sum: AtomicU64::new(0),
            relay_duration_us_max: AtomicU64::new(0),
        }
    }

    pub fn record_relay_duration(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.relay_duration_us_sum.fetch_add(us, Ordering::Relaxed);
        // CAS loop for max tracking
        let mut cur = self.relay_duration_us_max.load(Ordering::Relaxed);
        while us > cur {
            match self.relay_duration_us_max.compare_exchange_weak(
                cur,
                us,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => cur = actual,
            }
        }
    }

    /// Render in Prometheus text exposition format. Resets the max gauge.
    pub fn render(&self) -> String {
        let total = self.deliveries_total.load(Ordering::Relaxed);
        let forwarded = self.deliveries_forwarded.load(Ordering::Relaxed);
        let dropped = self.deliveries_dropped.load(Ordering::Relaxed);
        let rejected_path = self.rejected_path.load(Ordering::Relaxed);
        let rejected_malformed = self.rejected_malformed.load(Ordering::Relaxed);
        let rejected_auth = self.rejected_auth.load(Ordering::Relaxed);
        let upstream_requests = self.upstream_requests.load(Ordering::Relaxed);
        let upstream_errors = self.upstream_errors.load(Ordering::Relaxed);
        let all_failed = self.all_upstreams_failed.load(Ordering::Relaxed);
        let dur_sum = self.relay_duration_us_sum.load(Ordering::Relaxed);
        let dur_max = self.relay_duration_us_max.swap(0, Ordering::Relaxed);

        // Convert μs to seconds for Prometheus conventions
        let dur_sum_s = dur_sum as f64 / 1_000_000.0;
        let dur_max_s = dur_max as f64 / 1_000_000.0;

        format!(
            "\
# HELP relay_deliveries_total Webhook deliveries received.\n\
# TYPE relay_deliveries_total counter\n\
relay_deliveries_total {total}\n\
# HELP relay_deliveries_forwarded_total Deliveries broadcast to upstreams.\n\
# TYPE relay_deliveries_forwarded_total counter\n\
relay_deliveries_forwarded_total {forwarded}\n\
# HELP relay_deliveries_dropped_total Deliveries dropped by the committer filter.\n\
# TYPE relay_deliveries_dropped_total counter\n\
relay_deliveries_dropped_total {dropped}\n\
# HELP relay_rejected_path_total Deliveries rejected by the path filter (403).\n\
# TYPE relay_rejected_path_total counter\n\
relay_rejected_path_total {rejected_path}\n\
# HELP relay_rejected_malformed_total Deliveries missing required headers (400).\n\
# TYPE relay_rejected_malformed_total counter\n\
relay_rejected_malformed_total {rejected_malformed}\n\
# HELP relay_rejected_auth_total Deliveries failing signature validation (400).\n\
# TYPE relay_rejected_auth_total counter\n\
relay_rejected_auth_total {rejected_auth}\n\
# HELP relay_upstream_requests_total Upstream sends attempted.\n\
# TYPE relay_upstream_requests_total counter\n\
relay_upstream_requests_total {upstream_requests}\n\
# HELP relay_upstream_errors_total Upstream sends failing at transport level.\n\
# TYPE relay_upstream_errors_total counter\n\
relay_upstream_errors_total {upstream_errors}\n\
# HELP relay_all_upstreams_failed_total Deliveries with no successful upstream.\n\
# TYPE relay_all_upstreams_failed_total counter\n\
relay_all_upstreams_failed_total {all_failed}\n\
# HELP relay_duration_seconds_sum Total relay handling time (seconds).\n\
# TYPE relay_duration_seconds_sum counter\n\
relay_duration_seconds_sum {dur_sum_s:.6}\n\
# HELP relay_duration_seconds_max Max relay handling time since last scrape (seconds).\n\
# TYPE relay_duration_seconds_max gauge\n\
relay_duration_seconds_max {dur_max_s:.6}\n"
        )
    }
}
