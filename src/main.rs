// perfdash CLI - validate and explore performance-test KPI uploads
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

// Macro for conditional printing based on quiet flag
macro_rules! qprintln {
    ($quiet:expr, $($arg:tt)*) => {
        if !$quiet {
            println!($($arg)*);
        }
    };
}

use perfdash::{
    create_session_store, init_logging_with_level, sample_dataset, start_server, with_trace_id,
    DashboardConfig, DashboardPayload, DashboardService, Dataset, SchemaError, Selection,
    CONSTANT_COLUMNS, REQUIRED_COLUMNS,
};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "perfdash - explore performance-test KPIs across load levels",
    long_about = None,
    after_help = "EXAMPLES:
  perfdash validate results.csv
  perfdash analyze results.csv --kpi 'Cold Start' --kpi 'Auth Latency'
  perfdash analyze results.csv --format json
  perfdash serve --port 8501"
)]
struct Cli {
    /// Enable verbose logging (DEBUG level). Default is WARN level.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "PERFDASH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard HTTP server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check a CSV against the required schema
    Validate {
        /// CSV file to check
        file: PathBuf,
    },

    /// Print the overview and per-KPI statistics of a CSV
    Analyze {
        /// CSV file to analyse
        file: PathBuf,
        /// KPI to include (repeatable); defaults to the first KPIs in the file
        #[arg(short, long = "kpi")]
        kpis: Vec<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a small example CSV in the expected layout
    Sample {
        /// Destination file (stdout when omitted)
        output: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<DashboardConfig> {
    match path {
        Some(path) => DashboardConfig::from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?
            .with_env_overrides(),
        None => DashboardConfig::load(),
    }
}

fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<SchemaError>() {
        Some(schema) => {
            eprintln!("❌ {schema}");
            eprintln!("⚠️  {}", schema.guidance());
        }
        None => eprintln!("❌ {err:#}"),
    }
}

fn load_and<T>(
    file: &Path,
    view: impl FnOnce(&Dataset) -> Result<T, SchemaError>,
) -> Result<T> {
    let outcome = Dataset::from_path(file).and_then(|dataset| Ok(view(&dataset)?));
    if let Err(err) = &outcome {
        report_error(err);
    }
    outcome
}

fn print_payload(payload: &DashboardPayload, precision: usize) {
    let overview = &payload.overview;
    println!("📄 Uploaded CSV File Preview");
    println!("   OS:             {}", overview.os);
    println!("   Build Number:   {}", overview.build_number);
    println!("   Target Device:  {}", overview.target_device);
    println!("   OS Version:     {}", overview.os_version);
    println!("   Unique Features: {}", overview.feature_count);
    for feature in &overview.unique_features {
        println!("     - {feature}");
    }
    println!("   Unique KPIs:     {}", overview.kpi_count);
    println!();

    println!("🧩 KPI Mapping by Feature");
    for (feature, kpis) in &overview.feature_kpis {
        println!("🔹 {feature}");
        for kpi in kpis {
            println!("   • {kpi}");
        }
    }

    for section in &payload.sections {
        println!();
        println!("📊 KPI: {}", section.kpi);
        if section.analysis.is_empty() {
            println!("   (no samples)");
            continue;
        }

        let table = &section.summary_table;
        let width = table
            .rows
            .iter()
            .map(|r| r.label.len())
            .chain(std::iter::once(table.columns[0].len()))
            .max()
            .unwrap_or(4);
        let cell_width = precision + 10;

        print!("   {:<width$}", table.columns[0]);
        for column in &table.columns[1..] {
            print!("  {column:>cell_width$}");
        }
        println!();
        for row in &table.rows {
            print!("   {:<width$}", row.label);
            for cell in &row.cells {
                print!("  {:>cell_width$}", cell.display);
            }
            println!();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    let _ = init_logging_with_level(cli.verbose, cli.quiet, &config.logging.level);
    let quiet = cli.quiet;

    with_trace_id("perfdash-cli", async move {

        match cli.command {
            Commands::Serve { host, port } => {
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }

                qprintln!(quiet, "🚀 Starting perfdash on {}", config.bind_address());
                qprintln!(quiet, "📄 API endpoints:");
                qprintln!(quiet, "   POST   /dataset        - Upload CSV (replaces current)");
                qprintln!(quiet, "   GET    /dataset        - Current dataset overview");
                qprintln!(quiet, "   DELETE /dataset        - Discard current dataset");
                qprintln!(quiet, "   GET    /dashboard      - Render payload (?kpis=A,B)");
                qprintln!(quiet, "   GET    /kpis/:name     - Single KPI section");
                qprintln!(quiet, "   POST   /render         - Stateless render of a CSV body");
                qprintln!(quiet, "   GET    /health         - Health check");

                start_server(create_session_store(), config).await?;
            }

            Commands::Validate { file } => {
                let service = DashboardService::new(config.dashboard.clone());
                let overview = load_and(&file, |dataset| service.overview(dataset))?;
                qprintln!(
                    quiet,
                    "✅ {} is valid: {} rows, {} features, {} KPIs",
                    file.display(),
                    overview.row_count,
                    overview.feature_count,
                    overview.kpi_count
                );
            }

            Commands::Analyze { file, kpis, format } => {
                let service = DashboardService::new(config.dashboard.clone());
                let selection = Selection::from_names(&kpis);
                let payload = load_and(&file, |dataset| service.render(dataset, &selection))?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&payload)?)
                    }
                    OutputFormat::Text => {
                        print_payload(&payload, config.dashboard.display_precision)
                    }
                }
            }

            Commands::Sample { output } => {
                let csv = sample_dataset().build_csv()?;
                match output {
                    Some(path) => {
                        std::fs::write(&path, csv)
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        qprintln!(quiet, "Wrote sample dataset to {}", path.display());
                        qprintln!(quiet, "Required columns: {}", REQUIRED_COLUMNS.join(", "));
                        qprintln!(quiet, "Constant columns: {}", CONSTANT_COLUMNS.join(", "));
                    }
                    None => print!("{csv}"),
                }
            }
        }

        Ok(())
    })
    .await
}
