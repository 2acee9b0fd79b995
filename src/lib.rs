// perfdash - Performance-test KPI dashboard
// Root library module

pub mod aggregation;
pub mod builders;
pub mod charts;
pub mod config;
pub mod contracts;
pub mod dashboard;
pub mod dataset;
pub mod http_server;
pub mod http_types;
pub mod metadata;
pub mod observability;
pub mod pure;
pub mod session;
pub mod types;
pub mod validation;

// Re-export key types
pub use observability::{
    filter_directive, get_metrics, init_logging_with_level, log_operation, record_metric,
    with_trace_id, MetricType, Operation, OperationContext,
};

pub use contracts::{SessionInfo, SessionStore, StoredDataset};

pub use types::{compare_loads, KpiValue, PerfRecord};

pub use builders::{sample_dataset, DatasetBuilder};

pub use dataset::{Dataset, Row};

pub use validation::{
    parse_records, validate, validate_and_parse, SchemaError, CONSTANT_COLUMNS, REQUIRED_COLUMNS,
};

pub use metadata::{extract, Metadata, DEFAULT_SELECTED_KPIS};

pub use aggregation::{aggregate, KpiAnalysis, LoadMean, LoadSummary, TrendPoint};

pub use charts::{
    bar_chart, summary_table, trend_chart, ChartLayout, ChartRequest, TableRequest,
    DISPLAY_PRECISION,
};

pub use dashboard::{DashboardPayload, DashboardService, DatasetOverview, KpiSection, Selection};

pub use config::DashboardConfig;

pub use session::{create_session_store, InMemorySession};

pub use http_server::{create_server, start_server};
