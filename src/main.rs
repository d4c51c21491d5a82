use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use crm_local_sheets::import::{ClientIndex, Importer};
use crm_local_sheets::model::SheetKind;
use crm_local_sheets::pipeline::{self, CollectingSink};
use crm_local_sheets::settings::ImportSettings;
use crm_local_sheets::{Result, SheetError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| SheetError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Import(args) => execute_import(args),
        Command::ExportWorkload(args) => {
            require_input(&args.input)?;
            pipeline::export_workload(&args.input, &args.output)
        }
        Command::ExportServices(args) => {
            require_input(&args.input)?;
            let settings = load_settings(args.config.as_deref())?;
            pipeline::export_services(&args.input, &args.output, &settings)
        }
    }
}

fn execute_import(args: ImportArgs) -> Result<()> {
    require_input(&args.input)?;
    let settings = load_settings(args.config.as_deref())?;
    let clients = match &args.clients {
        Some(path) => {
            require_input(path)?;
            pipeline::load_clients(path)?
        }
        None => ClientIndex::default(),
    };

    let importer = Importer::new(settings);
    let mut sink = CollectingSink::new();
    let outcome = pipeline::import_file(
        &args.input,
        args.kind.into(),
        &importer,
        &clients,
        &mut sink,
    )?;

    if let Some(path) = &args.records {
        pipeline::write_created(path, sink.created())?;
    }

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn require_input(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(SheetError::MissingInput(path.to_path_buf()))
    }
}

fn load_settings(path: Option<&Path>) -> Result<ImportSettings> {
    match path {
        Some(path) => {
            require_input(path)?;
            ImportSettings::from_toml_file(path)
        }
        None => Ok(ImportSettings::default()),
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Import CRM spreadsheets and export planning workbooks."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a sheet and create one record per accepted row.
    Import(ImportArgs),
    /// Write the workload planning grid from a JSON list of site plans.
    ExportWorkload(ExportArgs),
    /// Write the services list from a JSON list of services records.
    ExportServices(ExportServicesArgs),
}

#[derive(clap::Args)]
struct ImportArgs {
    /// Kind of sheet being imported.
    #[arg(long, value_enum)]
    kind: KindArg,

    /// Input xlsx file path.
    #[arg(long)]
    input: PathBuf,

    /// JSON list of known clients, used to link services rows.
    #[arg(long)]
    clients: Option<PathBuf>,

    /// TOML file overriding the import limits.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the accepted rows as JSON.
    #[arg(long)]
    records: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Input JSON file path.
    #[arg(long)]
    input: PathBuf,

    /// Output xlsx file path.
    #[arg(long)]
    output: PathBuf,
}

#[derive(clap::Args)]
struct ExportServicesArgs {
    /// Input JSON file path.
    #[arg(long)]
    input: PathBuf,

    /// Output xlsx file path.
    #[arg(long)]
    output: PathBuf,

    /// TOML file overriding the import limits.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum KindArg {
    Clients,
    Services,
    Parts,
    Workload,
}

impl From<KindArg> for SheetKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Clients => SheetKind::Clients,
            KindArg::Services => SheetKind::Services,
            KindArg::Parts => SheetKind::Parts,
            KindArg::Workload => SheetKind::Workload,
        }
    }
}
