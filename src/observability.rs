// Observability Infrastructure for perfdash
// Structured logging, trace contexts, and lightweight counters shared by the
// HTTP server, the CLI, and the dashboard pipeline.

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

// Global atomic counters for metrics
static OPERATION_COUNTER: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNTER: AtomicU64 = AtomicU64::new(0);
static UPLOAD_COUNTER: AtomicU64 = AtomicU64::new(0);
static VALIDATION_FAILURE_COUNTER: AtomicU64 = AtomicU64::new(0);
static RENDER_COUNTER: AtomicU64 = AtomicU64::new(0);

const DEFAULT_FILTER: &str = "perfdash=warn,error";
const VERBOSE_FILTER: &str = "perfdash=debug,info";
const QUIET_FILTER: &str = "error";

/// Filter directive for the given flags and the configured crate level.
///
/// `--quiet` wins over `--verbose`, which wins over `level`. An unknown level
/// falls back to the default filter.
pub fn filter_directive(verbose: bool, quiet: bool, level: &str) -> String {
    if quiet {
        return QUIET_FILTER.to_string();
    }
    if verbose {
        return VERBOSE_FILTER.to_string();
    }
    let level = level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" | "off" => format!("perfdash={level},error"),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Initialize logging and tracing once at startup.
///
/// `level` is the `[logging] level` setting; `RUST_LOG` overrides it unless quiet.
pub fn init_logging_with_level(verbose: bool, quiet: bool, level: &str) -> Result<()> {
    let filter_level = EnvFilter::try_new(filter_directive(verbose, quiet, level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // --quiet always wins over RUST_LOG
    let env_filter = if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::try_from_default_env().unwrap_or(filter_level)
    } else {
        filter_level
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(!quiet)
        .with_thread_ids(!quiet)
        .with_line_number(!quiet)
        .with_file(!quiet)
        .with_ansi(true);

    match tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
    {
        Ok(()) => {
            if !quiet {
                info!("perfdash observability initialized");
            }
            Ok(())
        }
        Err(_) => {
            // Already initialized, which is fine in test environments
            Ok(())
        }
    }
}

/// Operations the dashboard performs, used for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    DatasetUpload {
        size_bytes: usize,
        row_count: usize,
    },
    SchemaValidation {
        row_count: usize,
        passed: bool,
    },
    KpiAggregation {
        kpi_name: String,
        sample_count: usize,
        load_count: usize,
    },
    DashboardRender {
        selected_kpis: usize,
    },
    SessionCleared,

    // System operations
    Startup {
        version: String,
    },
    Shutdown {
        reason: String,
    },
}

/// Metric types for performance monitoring
#[derive(Debug, Clone)]
pub enum MetricType {
    Counter { name: &'static str, value: u64 },
    Gauge { name: &'static str, value: f64 },
    Histogram {
        name: &'static str,
        value: f64,
        unit: &'static str,
    },
    Timer {
        name: &'static str,
        duration: Duration,
    },
}

/// Operation context for tracing through the system
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub trace_id: Uuid,
    pub span_id: Uuid,
    pub operation: String,
    pub start_time: Instant,
    pub attributes: Vec<(String, String)>,
}

impl OperationContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            span_id: Uuid::new_v4(),
            operation: operation.into(),
            start_time: Instant::now(),
            attributes: Vec::new(),
        }
    }

    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((key.into(), value.into()));
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Log an operation with full context
#[instrument(skip(ctx))]
pub fn log_operation(ctx: &OperationContext, op: &Operation, result: &Result<()>) {
    let elapsed = ctx.elapsed();
    let attrs = ctx
        .attributes
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ");

    match result {
        Ok(()) => {
            info!(
                trace_id = %ctx.trace_id,
                span_id = %ctx.span_id,
                operation = %ctx.operation,
                elapsed_ms = elapsed.as_millis(),
                attributes = %attrs,
                "Operation completed: {:?}", op
            );
            OPERATION_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            error!(
                trace_id = %ctx.trace_id,
                span_id = %ctx.span_id,
                operation = %ctx.operation,
                elapsed_ms = elapsed.as_millis(),
                attributes = %attrs,
                error = %e,
                "Operation failed: {:?}", op
            );
            ERROR_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
    }

    match op {
        Operation::DatasetUpload { .. } => {
            UPLOAD_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
        Operation::SchemaValidation { passed: false, .. } => {
            VALIDATION_FAILURE_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
        Operation::DashboardRender { .. } => {
            RENDER_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
        _ => {}
    }
}

/// Record a metric
pub fn record_metric(metric: MetricType) {
    match metric {
        MetricType::Counter { name, value } => {
            debug!("metric.counter {} = {}", name, value);
        }
        MetricType::Gauge { name, value } => {
            debug!("metric.gauge {} = {}", name, value);
        }
        MetricType::Histogram { name, value, unit } => {
            debug!("metric.histogram {} = {} {}", name, value, unit);
        }
        MetricType::Timer { name, duration } => {
            debug!("metric.timer {} = {:?}", name, duration);
        }
    }
}

/// Execute a future with a trace context
pub async fn with_trace_id<F, T>(operation: &str, f: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    let ctx = OperationContext::new(operation);
    let trace_id = ctx.trace_id;
    let span_id = ctx.span_id;

    info!(
        trace_id = %trace_id,
        span_id = %span_id,
        "Starting operation: {}", operation
    );

    let start = Instant::now();
    let result = f.await;
    let elapsed = start.elapsed();

    match &result {
        Ok(_) => {
            info!(
                trace_id = %trace_id,
                span_id = %span_id,
                elapsed_ms = elapsed.as_millis(),
                "Operation completed successfully: {}", operation
            );
            record_metric(MetricType::Timer {
                name: "operation.duration",
                duration: elapsed,
            });
        }
        Err(e) => {
            error!(
                trace_id = %trace_id,
                span_id = %span_id,
                elapsed_ms = elapsed.as_millis(),
                error = %e,
                "Operation failed: {}", operation
            );
            record_metric(MetricType::Counter {
                name: "operation.errors",
                value: 1,
            });
        }
    }

    result
}

/// Get current metrics snapshot
pub fn get_metrics() -> serde_json::Value {
    serde_json::json!({
        "operations": {
            "total": OPERATION_COUNTER.load(Ordering::Relaxed),
            "errors": ERROR_COUNTER.load(Ordering::Relaxed),
            "uploads": UPLOAD_COUNTER.load(Ordering::Relaxed),
            "validation_failures": VALIDATION_FAILURE_COUNTER.load(Ordering::Relaxed),
            "renders": RENDER_COUNTER.load(Ordering::Relaxed),
        },
        "timestamp": Utc::now().to_rfc3339(),
    })
}
