// Entry point and high-level CLI flow.
//
// - `audit` loads the log, shows the first rows and the raw column overview,
//   normalizes it and prints descriptive statistics and data-quality checks.
// - `report` prints the per-channel, per-month, per-customer and
//   per-delivery summaries, value distributions, correlation and product-mix
//   tables.
// - `customer <ID>` prints one customer's order profile.
//
// With `--out-dir`, every table is also exported as CSV/JSON.
use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use sales_report::aggregate::Crosstab;
use sales_report::loader::{load_sales_log, LoadOptions};
use sales_report::normalize::{normalize, NormalizeOptions};
use sales_report::output::{preview_grid, preview_table, write_csv, write_json};
use sales_report::stats::{correlation_matrix, describe, numeric_fields, CorrelationMatrix};
use sales_report::util::{format_int, format_opt};
use sales_report::{audit, fields, reports, RecordSet};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::Tabled;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Descriptive analysis of a semicolon-delimited sales log
#[derive(Parser, Debug)]
#[command(name = "sales_report", version)]
struct Cli {
    /// Sales log to analyze
    #[arg(long, env = "SALES_LOG_PATH", value_name = "FILE")]
    input: PathBuf,

    /// Field delimiter of the input file
    #[arg(long, default_value_t = ';')]
    delimiter: char,

    /// Decimal separator of monetary and rating values
    #[arg(long, default_value_t = ',')]
    decimal_separator: char,

    /// Order date format (chrono syntax)
    #[arg(long, default_value = "%d/%m/%Y")]
    date_format: String,

    /// Directory to export CSV/JSON tables to
    #[arg(long, env = "SALES_REPORT_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Rows shown per table preview
    #[arg(long, default_value_t = 10)]
    preview_rows: usize,

    /// Log level used when RUST_LOG is not set
    #[arg(
        long,
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Column overview, descriptive statistics and data-quality checks
    Audit,
    /// Business summaries by channel, month, customer and delivery status
    Report {
        /// Number of customers in the profit ranking
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Order profile of a single customer
    Customer {
        /// Customer identifier
        id: i64,
    },
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

struct Session<'a> {
    cli: &'a Cli,
}

impl Session<'_> {
    fn show<T>(&self, title: &str, note: Option<&str>, file: &str, rows: &[T]) -> Result<()>
    where
        T: Tabled + Serialize + Clone,
    {
        preview_table(title, note, rows, self.cli.preview_rows);
        if let Some(dir) = &self.cli.out_dir {
            let path = dir.join(file);
            write_csv(&path, rows).with_context(|| format!("writing {}", path.display()))?;
            println!("(Full table exported to {})\n", path.display());
        }
        Ok(())
    }

    fn export_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        if let Some(dir) = &self.cli.out_dir {
            let path = dir.join(file);
            write_json(&path, value).with_context(|| format!("writing {}", path.display()))?;
            println!("(Exported to {})\n", path.display());
        }
        Ok(())
    }
}

fn load_raw(cli: &Cli) -> Result<RecordSet> {
    ensure!(cli.delimiter.is_ascii(), "delimiter must be an ASCII character");
    let opts = LoadOptions {
        delimiter: cli.delimiter as u8,
    };
    load_sales_log(&cli.input, &opts)
        .with_context(|| format!("loading {}", cli.input.display()))
}

fn normalized(cli: &Cli, raw: RecordSet) -> Result<RecordSet> {
    let opts = NormalizeOptions {
        decimal_separator: cli.decimal_separator,
        date_format: cli.date_format.clone(),
    };
    let data = normalize(raw, &fields::MONETARY_FIELDS, &opts).context("normalizing sales log")?;
    println!(
        "Processing dataset... ({} rows, {} columns)\n",
        format_int(data.len()),
        format_int(data.columns().len())
    );
    Ok(data)
}

fn run_audit(session: &Session, raw: RecordSet) -> Result<()> {
    let (header, head) = reports::head_rows(&raw, 5);
    preview_grid("First rows", &header, &head);
    session.show(
        "Column overview",
        Some("before normalization"),
        "overview.csv",
        &audit::overview(&raw),
    )?;
    session.show(
        "Column type distribution",
        None,
        "type_distribution.csv",
        &reports::type_distribution(&raw),
    )?;

    let data = normalized(session.cli, raw)?;
    let report = audit::audit(&data);
    println!("Duplicate records: {}\n", format_int(report.duplicate_count));
    session.show(
        "Missing values per field (%)",
        None,
        "missing.csv",
        &reports::missing_rows(&report),
    )?;
    session.show(
        "Cardinality of categorical fields",
        None,
        "cardinality.csv",
        &reports::cardinality_rows(&report),
    )?;

    let numeric = numeric_fields(&data);
    let summaries = describe(&data, &numeric)?;
    session.show(
        "Descriptive statistics",
        None,
        "describe.csv",
        &reports::describe_rows(&summaries),
    )?;
    session.export_json("audit.json", &report)
}

fn show_correlation(title: &str, m: &CorrelationMatrix) {
    let mut header = vec![String::new()];
    header.extend(m.fields.iter().cloned());
    let rows: Vec<Vec<String>> = m
        .fields
        .iter()
        .zip(&m.values)
        .map(|(f, vals)| {
            let mut row = vec![f.clone()];
            row.extend(vals.iter().map(|v| format_opt(*v, 2)));
            row
        })
        .collect();
    preview_grid(title, &header, &rows);
}

fn show_crosstab(title: &str, ct: &Crosstab) {
    let (header, rows) = reports::crosstab_rows(ct);
    preview_grid(title, &header, &rows);
}

fn run_report(session: &Session, data: &RecordSet, top: usize) -> Result<()> {
    session.show(
        "Summary by sales channel",
        Some("total value, total profit and order count"),
        "channel_summary.csv",
        &reports::channel_summary(data)?,
    )?;
    for (title, field, file) in [
        ("Orders by product type", fields::PRODUCT_TYPE, "product_types.csv"),
        ("Payment method distribution", fields::PAYMENT_METHOD, "payment_methods.csv"),
        ("Delivery status", fields::DELIVERED, "delivery_status.csv"),
        ("Orders by region", fields::REGION, "regions.csv"),
    ] {
        session.show(title, None, file, &reports::frequency(data, field)?)?;
    }
    session.show(
        "Products sold per sales channel",
        None,
        "products_per_channel.csv",
        &reports::products_per_channel(data)?,
    )?;
    session.show(
        "Mean real profit margin per sales channel",
        None,
        "margin_per_channel.csv",
        &reports::mean_margin_per_channel(data)?,
    )?;
    session.show(
        "Monthly total profit",
        None,
        "monthly_profit.csv",
        &reports::monthly_profit(data)?,
    )?;
    session.show(
        "Mean profit by delivery status",
        None,
        "profit_by_delivery.csv",
        &reports::profit_by_delivery(data)?,
    )?;
    let note = format!("Top {} by total profit", top);
    session.show(
        "Top customers",
        Some(&note),
        "top_customers.csv",
        &reports::top_customers(data, top)?,
    )?;
    session.show(
        "Order value distribution",
        Some("equal-width bins"),
        "value_histogram.csv",
        &reports::value_histogram(data, reports::VALUE_HISTOGRAM_BINS)?,
    )?;
    session.show(
        "Order value by region",
        None,
        "value_by_region.csv",
        &reports::value_by_region(data)?,
    )?;
    session.show(
        "Total profit by product type",
        None,
        "profit_by_product_type.csv",
        &reports::profit_by_product_type(data)?,
    )?;

    let mix = reports::product_mix_by_sex(data)?;
    show_crosstab("Product type share by customer sex", &mix);
    session.export_json("product_mix.json", &mix)?;

    let monetary = correlation_matrix(data, &fields::MONETARY_FIELDS)?;
    show_correlation("Correlation between monetary fields", &monetary);
    session.export_json("monetary_correlation.json", &monetary)?;

    let key = correlation_matrix(data, &fields::KEY_INDICATORS)?;
    show_correlation("Correlation between business indicators", &key);
    session.export_json("indicator_correlation.json", &key)
}

fn run_customer(session: &Session, data: &RecordSet, id: i64) -> Result<()> {
    let Some(p) = reports::customer_profile(data, id)? else {
        println!("Customer {} has no orders.\n", id);
        return Ok(());
    };
    println!("Customer {} summary", p.customer_id);
    println!("{}", "-".repeat(30));
    println!("Orders: {}", format_int(p.orders));
    println!("Total profit: R$ {}", format_opt(Some(p.total_profit), 2));
    println!("Total value: R$ {}", format_opt(Some(p.total_value), 2));
    println!("Mean rating: {}", format_opt(p.mean_rating, 2));
    println!("Most bought product types:");
    for (kind, n) in &p.top_product_types {
        println!("  {}: {}", kind, n);
    }
    println!("Payment methods:");
    for (method, n) in &p.payment_methods {
        println!("  {}: {}", method, n);
    }
    println!();
    session.export_json(&format!("customer_{}.json", id), &p)
}

fn ensure_out_dir(dir: Option<&Path>) -> Result<()> {
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);
    info!("sales_report v{} starting", env!("CARGO_PKG_VERSION"));

    ensure_out_dir(cli.out_dir.as_deref())?;
    let session = Session { cli: &cli };
    let raw = load_raw(&cli)?;

    match &cli.command {
        Commands::Audit => run_audit(&session, raw),
        Commands::Report { top } => run_report(&session, &normalized(&cli, raw)?, *top),
        Commands::Customer { id } => run_customer(&session, &normalized(&cli, raw)?, *id),
    }
}
