mod render;
mod tui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use salesdash_core::{
    parse_selection, AggregateSpec, CategoricalField, Config, CsvRecordSource, DashboardUseCase,
    FilterSelection, Grouping, NumericField, SortOrder, TemporalField, View, ViewRequest,
};
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "salesdash")]
#[command(about = "Filter and aggregate retail sales records", long_about = None)]
struct Cli {
    /// Sales CSV to load (defaults to the config file entry, then ./data.csv)
    #[arg(long, global = true, env = "SALESDASH_DATA")]
    data: Option<PathBuf>,

    /// Alternate configuration file
    #[arg(long, global = true)]
    config_file: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the dashboard views
    Views,
    /// List the values each filter accepts
    Options,
    /// Render one view (usage: view sales-over-time city:Yangon gender:Female)
    View {
        /// View name or unique prefix
        name: View,
        #[command(flatten)]
        scope: Scope,
    },
    /// Run a single aggregate over the filtered records
    Aggregate {
        #[command(subcommand)]
        op: AggregateOp,
    },
    /// Show the first rows that pass the filters
    Preview {
        /// Number of rows (defaults to the configured preview size)
        #[arg(long)]
        rows: Option<usize>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Show the effective configuration
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
    /// Open the terminal dashboard
    Tui,
}

/// Filters and output format shared by the reporting commands.
#[derive(Args)]
struct Scope {
    /// key:value filters, comma separated values (city:Yangon,Mandalay)
    filters: Vec<String>,
    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum AggregateOp {
    /// Rows per category
    Count {
        field: CategoricalField,
        #[command(flatten)]
        scope: Scope,
    },
    /// Sum of a numeric column per group
    Sum {
        target: NumericField,
        #[command(flatten)]
        group: GroupArgs,
        #[command(flatten)]
        scope: Scope,
    },
    /// Mean of a numeric column per group
    Mean {
        target: NumericField,
        #[command(flatten)]
        group: GroupArgs,
        #[command(flatten)]
        scope: Scope,
    },
    /// Pairwise Pearson correlation
    Corr {
        /// Comma separated columns (defaults to the standard numeric set)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<NumericField>,
        #[command(flatten)]
        scope: Scope,
    },
    /// Sum of a numeric column per day
    Series {
        value: NumericField,
        /// Bucket by calendar month instead of by day
        #[arg(long)]
        monthly: bool,
        #[command(flatten)]
        scope: Scope,
    },
    /// Equal-width histogram
    Hist {
        field: NumericField,
        #[arg(long, default_value_t = 10)]
        bins: usize,
        #[command(flatten)]
        scope: Scope,
    },
    /// Quartiles of a numeric column per category
    Box {
        target: NumericField,
        #[arg(long)]
        by: CategoricalField,
        #[command(flatten)]
        scope: Scope,
    },
    /// Count, mean, std and quartiles per numeric column
    Describe {
        #[arg(long, value_delimiter = ',')]
        fields: Vec<NumericField>,
        #[command(flatten)]
        scope: Scope,
    },
}

#[derive(Args)]
struct GroupArgs {
    /// Grouping column
    #[arg(long)]
    by: CategoricalField,
    /// Second grouping column
    #[arg(long)]
    then: Option<CategoricalField>,
    #[arg(long, value_enum, default_value_t = SortArg::Key)]
    sort: SortArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Key,
    Asc,
    Desc,
}

impl GroupArgs {
    fn grouping(&self) -> Grouping {
        match self.then {
            Some(secondary) => Grouping::by_pair(self.by, secondary),
            None => Grouping::by(self.by),
        }
    }

    fn order(&self) -> SortOrder {
        match self.sort {
            SortArg::Key => SortOrder::Key,
            SortArg::Asc => SortOrder::ValueAscending,
            SortArg::Desc => SortOrder::ValueDescending,
        }
    }
}

impl AggregateOp {
    fn into_parts(self) -> (AggregateSpec, Scope) {
        match self {
            AggregateOp::Count { field, scope } => (AggregateSpec::count_by(field), scope),
            AggregateOp::Sum { target, group, scope } => (
                AggregateSpec::SumBy {
                    target,
                    group: group.grouping(),
                    order: group.order(),
                },
                scope,
            ),
            AggregateOp::Mean { target, group, scope } => (
                AggregateSpec::MeanBy {
                    target,
                    group: group.grouping(),
                    order: group.order(),
                },
                scope,
            ),
            AggregateOp::Corr { fields, scope } => {
                let fields = if fields.is_empty() {
                    NumericField::CORRELATED.to_vec()
                } else {
                    fields
                };
                (AggregateSpec::correlation(fields), scope)
            }
            AggregateOp::Series { value, monthly, scope } => {
                let date = if monthly { TemporalField::Month } else { TemporalField::Date };
                (AggregateSpec::timeseries_sum(date, value), scope)
            }
            AggregateOp::Hist { field, bins, scope } => (AggregateSpec::Histogram { field, bins }, scope),
            AggregateOp::Box { target, by, scope } => (AggregateSpec::BoxSummary { target, group: by }, scope),
            AggregateOp::Describe { fields, scope } => {
                let fields = if fields.is_empty() {
                    NumericField::ALL.to_vec()
                } else {
                    fields
                };
                (AggregateSpec::Describe { fields }, scope)
            }
        }
    }
}

/// Installs the stderr subscriber. `RUST_LOG` directives still apply on top.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["salesdash", "salesdash_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn selection(filters: &[String]) -> Result<FilterSelection> {
    parse_selection(filters).context("invalid filter")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    // Log lines would draw over the dashboard.
    let tui_mode = matches!(command, Commands::Tui);
    init_logging(cli.verbose, cli.quiet || tui_mode);

    let config = Config::load(cli.config_file.as_deref()).context("cannot read configuration")?;
    let data_path = config.resolve_data_path(cli.data);
    debug!(path = %data_path.display(), "resolved data path");

    match command {
        Commands::Views => render::print_views(),
        Commands::Config { init } => {
            if init {
                let path = cli
                    .config_file
                    .or_else(Config::default_path)
                    .context("no home directory for the configuration file")?;
                Config::default().save(&path)?;
                println!("Wrote {}", path.display());
            } else {
                println!("Data file: {}", data_path.display());
                render::print_json(&config)?;
            }
        }
        Commands::Options => {
            let mut dashboard = open(data_path, config)?;
            render::print_options(&dashboard.options()?);
        }
        Commands::View { name, scope } => {
            let mut dashboard = open(data_path, config)?;
            let request = ViewRequest::new(name, selection(&scope.filters)?);
            let response = dashboard.handle(&request)?;
            if scope.json {
                render::print_json(&response)?;
            } else {
                render::print_response(&response);
            }
        }
        Commands::Aggregate { op } => {
            let (spec, scope) = op.into_parts();
            let selection = selection(&scope.filters)?;
            let mut dashboard = open(data_path, config)?;
            let data = dashboard
                .aggregate(&spec, &selection)
                .with_context(|| format!("{} failed", spec.name()))?;
            if scope.json {
                render::print_json(&data)?;
            } else {
                render::print_panel(&data);
            }
        }
        Commands::Preview { rows, scope } => {
            let rows = rows.unwrap_or(config.preview_rows);
            let selection = selection(&scope.filters)?;
            let mut dashboard = open(data_path, config)?;
            let records = dashboard.preview(rows, &selection)?;
            if scope.json {
                render::print_json(&records)?;
            } else {
                render::print_records(&records);
            }
        }
        Commands::Tui => {
            let default_view = config.default_view;
            let dashboard = open(data_path, config)?;
            tui::run(dashboard, default_view)?;
        }
    }
    Ok(())
}

/// Builds the handler and loads the file once so a bad path fails before any output.
fn open(path: PathBuf, config: Config) -> Result<DashboardUseCase<CsvRecordSource>> {
    let mut dashboard = DashboardUseCase::new(CsvRecordSource::new(Some(path)), config);
    dashboard.records().context("cannot load data")?;
    Ok(dashboard)
}
