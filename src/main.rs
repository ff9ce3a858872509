use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style};

use mess::config::{
    config_dir, load_config, load_view, resolve_output_dir, Completion, ReportView,
    CONFIG_TEMPLATE, TOKEN_ENV,
};
use mess::error::{MessError, Result};
use mess::report::{
    default_file_name, export_csv, render, BillingPeriod, RenderModel, ReportFilter,
};
use mess::{workflow, Config, HttpClient};

#[derive(Parser)]
#[command(name = "mess")]
#[command(version, about = "Mess billing and report client", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.mess or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// Show configuration and the currently loaded report
    Status,

    /// Fetch a report (inventory, consumption, expense, menu, billing)
    Report {
        /// Report type
        report_type: String,

        /// Start of the date range (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End of the date range (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Billing month (1-12)
        #[arg(long)]
        month: Option<u32>,

        /// Billing year
        #[arg(long)]
        year: Option<i32>,

        /// Restrict to one grocery category
        #[arg(long)]
        category: Option<String>,

        /// Restrict to one meal (breakfast, lunch, snacks, dinner)
        #[arg(long)]
        meal_type: Option<String>,

        /// Only items at or below their minimum stock (inventory)
        #[arg(long)]
        low_stock: bool,

        /// Export the fetched report to CSV
        #[arg(long)]
        export: bool,

        /// CSV path used with --export (default: export dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the currently loaded report again
    Show,

    /// Export the currently loaded report to CSV
    Export {
        /// Output file (default: <export dir>/<type>-report-<date>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate student mess bills for a billing period
    GenerateBills {
        #[arg(long)]
        month: u32,

        #[arg(long)]
        year: i32,
    },

    /// Allocate mess fees across students for a billing period
    AllocateFees {
        #[arg(long)]
        month: u32,

        #[arg(long)]
        year: i32,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Status => cmd_status(&cfg_dir),
        Commands::Report {
            report_type,
            from,
            to,
            month,
            year,
            category,
            meal_type,
            low_stock,
            export,
            output,
        } => {
            let filter = ReportFilter {
                date_range: parse_range(from.as_deref(), to.as_deref())?,
                month,
                year,
                category_id: category,
                meal_type,
                low_stock_only: low_stock,
                ..ReportFilter::new(report_type.parse()?)
            };
            cmd_report(&cfg_dir, &filter, export, output)
        }
        Commands::Show => cmd_show(&cfg_dir),
        Commands::Export { output } => cmd_export(&cfg_dir, output),
        Commands::GenerateBills { month, year } => {
            cmd_billing(&cfg_dir, BillingPeriod::new(month, year)?, BillingAction::Generate)
        }
        Commands::AllocateFees { month, year } => {
            cmd_billing(&cfg_dir, BillingPeriod::new(month, year)?, BillingAction::Allocate)
        }
    }
}

fn parse_date(flag: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        MessError::validation(flag, format!("'{value}' is not a YYYY-MM-DD date"))
    })
}

fn parse_range(from: Option<&str>, to: Option<&str>) -> Result<Option<(NaiveDate, NaiveDate)>> {
    match (from, to) {
        (Some(from), Some(to)) => Ok(Some((parse_date("--from", from)?, parse_date("--to", to)?))),
        (None, None) => Ok(None),
        _ => Err(MessError::validation(
            "date range",
            "both --from and --to are required",
        )),
    }
}

fn ensure_initialized(cfg_dir: &Path) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(MessError::ConfigNotFound(cfg_dir.to_path_buf()));
    }
    Ok(())
}

fn http_client(config: &Config) -> HttpClient {
    HttpClient::new(
        &config.api.base_url,
        config.api.token.clone(),
        config.api.timeout(),
    )
    .on_unauthorized(|| {
        eprintln!("Session rejected by the server. Log in again and update the access token.");
    })
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(MessError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir.join("exports"))?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized mess config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Point at your server:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Provide a token:       export {TOKEN_ENV}=<token>");
    println!();
    println!("Then fetch your first report:");
    println!("  mess report inventory --low-stock");

    Ok(())
}

/// Show configuration and the loaded report
fn cmd_status(cfg_dir: &Path) -> Result<()> {
    ensure_initialized(cfg_dir)?;

    let config = load_config(cfg_dir)?;
    let view = load_view(cfg_dir)?;

    println!("Mess Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("Server:           {}", config.api.base_url);
    println!(
        "Token:            {}",
        if config.api.token.is_some() { "set" } else { "not set" }
    );
    println!(
        "Export directory: {}",
        resolve_output_dir(&config.export.output_dir, cfg_dir).display()
    );
    println!();

    match view.current() {
        Some((filter, result)) => {
            println!("Loaded report:    {}", filter.report_type);
            println!("Rows:             {}", result.row_count());
            if let Some(at) = view.fetched_at {
                println!("Fetched:          {}", at.format("%Y-%m-%d %H:%M"));
            }
        }
        None => match view.report_type {
            Some(kind) => println!("Loaded report:    {} (not fetched yet)", kind),
            None => println!("Loaded report:    none"),
        },
    }

    Ok(())
}

/// Fetch a report, render it and optionally export it
fn cmd_report(
    cfg_dir: &Path,
    filter: &ReportFilter,
    export: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    ensure_initialized(cfg_dir)?;

    // Reject bad filters before touching config or network
    filter.to_query()?;

    let config = load_config(cfg_dir)?;
    let client = http_client(&config);
    let (completion, view) = workflow::fetch_report(&client, cfg_dir, filter)?;

    if completion == Completion::Stale {
        println!(
            "A newer {} fetch was started meanwhile; this response was discarded.",
            filter.report_type
        );
        return Ok(());
    }

    print_view(&view);

    if export {
        export_view(cfg_dir, &config, &view, output)?;
    }
    Ok(())
}

fn cmd_show(cfg_dir: &Path) -> Result<()> {
    ensure_initialized(cfg_dir)?;
    let view = load_view(cfg_dir)?;
    print_view(&view);
    Ok(())
}

fn cmd_export(cfg_dir: &Path, output: Option<PathBuf>) -> Result<()> {
    ensure_initialized(cfg_dir)?;
    let config = load_config(cfg_dir)?;
    let view = load_view(cfg_dir)?;
    export_view(cfg_dir, &config, &view, output)
}

enum BillingAction {
    Generate,
    Allocate,
}

fn cmd_billing(cfg_dir: &Path, period: BillingPeriod, action: BillingAction) -> Result<()> {
    ensure_initialized(cfg_dir)?;

    let config = load_config(cfg_dir)?;
    let client = http_client(&config);

    let (completion, view) = match action {
        BillingAction::Generate => {
            let outcome = workflow::generate_bills(&client, cfg_dir, period)?;
            println!("Generated bills for {}", period);
            outcome
        }
        BillingAction::Allocate => {
            let outcome = workflow::allocate_fees(&client, cfg_dir, period)?;
            println!("Allocated fees for {}", period);
            outcome
        }
    };

    if completion == Completion::Applied {
        println!();
        print_view(&view);
    }
    Ok(())
}

fn export_view(
    cfg_dir: &Path,
    config: &Config,
    view: &ReportView,
    output: Option<PathBuf>,
) -> Result<()> {
    let Some((filter, result)) = view.current() else {
        println!("Nothing to export: no report loaded.");
        return Ok(());
    };

    let path = output.unwrap_or_else(|| {
        let today = chrono::Local::now().date_naive();
        resolve_output_dir(&config.export.output_dir, cfg_dir)
            .join(default_file_name(filter.report_type, today))
    });

    match export_csv(Some((filter, result)), &path)? {
        Some(rows) => println!("Exported {} rows to {}", rows, path.display()),
        None => println!("Nothing to export: {} report is empty.", filter.report_type),
    }
    Ok(())
}

fn print_view(view: &ReportView) {
    match view.current() {
        Some((filter, result)) => print_model(&render(result, filter)),
        None => match view.report_type {
            Some(kind) => println!("No {} report loaded yet.", kind),
            None => println!("No report loaded. Run 'mess report <type>' first."),
        },
    }
}

const BAR_WIDTH: f64 = 30.0;

fn print_model(model: &RenderModel) {
    println!("{}", model.title);
    println!("{}", "-".repeat(50));

    if let Some(message) = &model.empty_message {
        println!("{message}");
        return;
    }

    for series in &model.series {
        let max = series
            .points
            .iter()
            .map(|(_, v)| *v)
            .fold(0.0_f64, f64::max);
        if max <= 0.0 {
            continue;
        }
        let label_width = series
            .points
            .iter()
            .map(|(l, _)| l.chars().count())
            .max()
            .unwrap_or(0);

        println!("{}", series.label);
        for (label, value) in &series.points {
            let len = (value.max(0.0) / max * BAR_WIDTH).round() as usize;
            println!("  {:<label_width$} {} {}", label, "█".repeat(len), value);
        }
        println!();
    }

    let mut builder = Builder::default();
    builder.push_record(model.columns.iter().copied());
    for row in &model.rows {
        builder.push_record(row.iter().cloned());
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");

    for (label, value) in &model.summary {
        println!("{label}: {value}");
    }
}
