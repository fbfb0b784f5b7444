//! Request and backend metrics with Prometheus text exposition.
//!
//! Each label map sits behind its own [`parking_lot::Mutex`]; a recording
//! holds it for one map lookup and two additions. The in-flight gauge is a
//! plain atomic, released by [`InFlightGuard`] on drop so cancelled requests
//! are not left counted.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RequestLabels {
    method: String,
    path: String,
    status: u16,
}

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    count: u64,
    errors: u64,
    duration_micros: u64,
}

impl Totals {
    fn observe(&mut self, elapsed: Duration, failed: bool) {
        self.count += 1;
        self.duration_micros += elapsed.as_micros() as u64;
        if failed {
            self.errors += 1;
        }
    }
}

/// Process-wide metrics registry, shared through `AppState`
#[derive(Debug, Default)]
pub struct Metrics {
    in_flight: AtomicI64,
    requests: Mutex<BTreeMap<RequestLabels, Totals>>,
    backend: Mutex<BTreeMap<&'static str, Totals>>,
}

/// Point-in-time copy of one backend operation's counters
#[cfg(test)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackendSnapshot {
    pub count: u64,
    pub errors: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request as in flight until the returned guard is dropped.
    pub fn request_started(self: &Arc<Self>) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            metrics: Arc::clone(self),
        }
    }

    /// Record a finished request. `path` must be the matched route template.
    pub fn request_finished(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        let labels = RequestLabels {
            method: method.to_string(),
            path: path.to_string(),
            status,
        };
        self.requests
            .lock()
            .entry(labels)
            .or_default()
            .observe(elapsed, status >= 500);
    }

    pub fn record_backend(&self, operation: &'static str, elapsed: Duration, failed: bool) {
        self.backend
            .lock()
            .entry(operation)
            .or_default()
            .observe(elapsed, failed);
    }

    pub fn in_flight(&self) -> i64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub fn request_count(&self, method: &str, path: &str, status: u16) -> u64 {
        let labels = RequestLabels {
            method: method.to_string(),
            path: path.to_string(),
            status,
        };
        self.requests.lock().get(&labels).map_or(0, |t| t.count)
    }

    #[cfg(test)]
    pub fn backend_snapshot(&self, operation: &str) -> BackendSnapshot {
        self.backend
            .lock()
            .get(operation)
            .map(|t| BackendSnapshot {
                count: t.count,
                errors: t.errors,
            })
            .unwrap_or_default()
    }

    /// Render every series in the Prometheus text format.
    pub fn render(&self) -> String {
        let requests = self.requests.lock().clone();
        let backend = self.backend.lock().clone();
        let mut out = String::new();

        header(&mut out, "kv_http_requests_total", "counter", "HTTP requests handled.");
        for (labels, totals) in &requests {
            let _ = writeln!(
                out,
                "kv_http_requests_total{{method=\"{}\",path=\"{}\",status=\"{}\"}} {}",
                escape(&labels.method),
                escape(&labels.path),
                labels.status,
                totals.count
            );
        }

        let mut durations: BTreeMap<(&str, &str), (u64, u64)> = BTreeMap::new();
        for (labels, totals) in &requests {
            let entry = durations
                .entry((labels.method.as_str(), labels.path.as_str()))
                .or_default();
            entry.0 += totals.duration_micros;
            entry.1 += totals.count;
        }
        header(
            &mut out,
            "kv_http_request_duration_seconds",
            "summary",
            "Time spent handling HTTP requests.",
        );
        for ((method, path), (micros, count)) in &durations {
            let labels = format!("method=\"{}\",path=\"{}\"", escape(method), escape(path));
            let _ = writeln!(
                out,
                "kv_http_request_duration_seconds_sum{{{}}} {}",
                labels,
                seconds(*micros)
            );
            let _ = writeln!(out, "kv_http_request_duration_seconds_count{{{}}} {}", labels, count);
        }

        header(
            &mut out,
            "kv_http_request_errors_total",
            "counter",
            "HTTP requests answered with a 5xx status.",
        );
        let mut errors: BTreeMap<(&str, &str), u64> = BTreeMap::new();
        for (labels, totals) in &requests {
            *errors
                .entry((labels.method.as_str(), labels.path.as_str()))
                .or_default() += totals.errors;
        }
        for ((method, path), count) in &errors {
            let _ = writeln!(
                out,
                "kv_http_request_errors_total{{method=\"{}\",path=\"{}\"}} {}",
                escape(method),
                escape(path),
                count
            );
        }

        header(&mut out, "kv_http_requests_in_flight", "gauge", "HTTP requests currently being handled.");
        let _ = writeln!(out, "kv_http_requests_in_flight {}", self.in_flight());

        header(&mut out, "kv_backend_operations_total", "counter", "Backend calls made.");
        for (operation, totals) in &backend {
            let _ = writeln!(
                out,
                "kv_backend_operations_total{{operation=\"{}\"}} {}",
                operation, totals.count
            );
        }

        header(&mut out, "kv_backend_errors_total", "counter", "Backend calls that failed.");
        for (operation, totals) in &backend {
            let _ = writeln!(
                out,
                "kv_backend_errors_total{{operation=\"{}\"}} {}",
                operation, totals.errors
            );
        }

        header(
            &mut out,
            "kv_backend_operation_duration_seconds",
            "summary",
            "Time spent waiting on the backend.",
        );
        for (operation, totals) in &backend {
            let _ = writeln!(
                out,
                "kv_backend_operation_duration_seconds_sum{{operation=\"{}\"}} {}",
                operation,
                seconds(totals.duration_micros)
            );
            let _ = writeln!(
                out,
                "kv_backend_operation_duration_seconds_count{{operation=\"{}\"}} {}",
                operation, totals.count
            );
        }

        out
    }
}

/// Releases one in-flight slot when dropped
#[derive(Debug)]
pub struct InFlightGuard {
    metrics: Arc<Metrics>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.metrics.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

fn header(out: &mut String, name: &str, kind: &str, help: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

fn seconds(micros: u64) -> f64 {
    micros as f64 / 1_000_000.0
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
