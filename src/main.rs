use clap::{Parser, Subcommand};
use photodeck::config::{self, AppConfig};
use photodeck::deck::DeckFormat;
use photodeck::grouping::GroupingStrategy;
use photodeck::imaging::RustBackend;
use photodeck::jobs::{self, FsJobStore, JobStore, RetentionPolicy};
use photodeck::{output, pipeline};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "photodeck")]
#[command(about = "Build slide decks from image directories")]
#[command(long_about = "\
Build slide decks from image directories

Two steps with an editable outline in between:

  photodeck scan  -d photos -f trip     # writes trip_structure.md
  (edit trip_structure.md: reorder, retitle, delete)
  photodeck merge -d photos -f trip     # writes trip.html

Headings come from subdirectories and shared filename prefixes:

  photos/
  ├── harbor/
  │   ├── boats_1.jpg        # harbor / boats
  │   └── boats_2.jpg        # harbor / boats
  └── market.jpg             # top level

Images are split by orientation: landscapes stack vertically, portraits
side by side, squares in a 2x2 grid. Use '-f trip.json' for a JSON plan.

Settings are read from photodeck.toml in the image directory, or from
--config. Run 'photodeck gen-config' for a documented template.")]
#[command(version)]
struct Cli {
    /// Config file (default: <directory>/photodeck.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan an image directory and write the structure document
    Scan {
        /// Image directory
        #[arg(short, long)]
        directory: PathBuf,
        /// Target deck name; the structure file is <name>_structure.md
        #[arg(short, long)]
        filename: PathBuf,
        /// Only look at the top level of the directory
        #[arg(long)]
        no_recursive: bool,
        /// Comma-separated extensions, overriding scan.formats
        #[arg(long, value_delimiter = ',')]
        formats: Option<Vec<String>>,
    },
    /// Show how images would be grouped
    Group {
        /// Image directory
        #[arg(short, long)]
        directory: PathBuf,
        /// directory, filename or mixed
        #[arg(long)]
        strategy: Option<GroupingStrategy>,
    },
    /// Build the deck from an edited structure document
    Merge {
        /// Image directory the structure paths are relative to
        #[arg(short, long)]
        directory: PathBuf,
        /// Target deck name (.html or .json; default .html)
        #[arg(short, long)]
        filename: PathBuf,
    },
    /// Print a stock photodeck.toml with all options documented
    GenConfig,
    /// Tracked scan/merge jobs
    Job {
        /// Job store directory (default: jobs.root from config)
        #[arg(long, global = true)]
        store: Option<PathBuf>,
        #[command(subcommand)]
        command: JobCommand,
    },
}

#[derive(Subcommand)]
enum JobCommand {
    /// Register a new job
    New {
        #[arg(short, long)]
        directory: PathBuf,
        #[arg(short, long)]
        filename: String,
    },
    /// Run the scan step for a job
    Scan { id: String },
    /// Run the merge step for an analyzed job
    Merge { id: String },
    /// Show one job
    Show { id: String },
    /// List jobs, newest first
    List,
    /// Delete jobs past their retention window
    Cleanup,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Resolve the config for `dir` and describe where it came from.
fn load_config(
    explicit: Option<&Path>,
    dir: &Path,
) -> Result<(AppConfig, String), config::ConfigError> {
    if let Some(path) = explicit {
        return Ok((config::load_config_file(path)?, path.display().to_string()));
    }
    let local = dir.join(config::CONFIG_FILE);
    let source = if local.is_file() {
        local.display().to_string()
    } else {
        "defaults".to_string()
    };
    Ok((config::load_config(dir)?, source))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let backend = RustBackend::new();

    match cli.command {
        Command::Scan {
            directory,
            filename,
            no_recursive,
            formats,
        } => {
            let (config, source) = load_config(cli.config.as_deref(), &directory)?;
            let mut request = pipeline::ScanRequest::new(directory, filename);
            request.recursive = no_recursive.then_some(false);
            request.formats = formats;
            request.config_source = source;
            let outcome = pipeline::scan(&request, &config, &backend)?;
            output::print_scan_output(&outcome);
        }
        Command::Group {
            directory,
            strategy,
        } => {
            let (config, _) = load_config(cli.config.as_deref(), &directory)?;
            let groups = pipeline::group(&directory, &config, &backend, strategy)?;
            output::print_groups(&groups);
        }
        Command::Merge {
            directory,
            filename,
        } => {
            let (config, _) = load_config(cli.config.as_deref(), &directory)?;
            let writer = DeckFormat::from_path(&pipeline::deck_path_for(&filename)).writer();
            let request = pipeline::MergeRequest::new(directory, filename);
            let outcome = pipeline::merge(&request, &config, &backend, writer.as_ref())?;
            output::print_merge_output(&outcome);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Job { store, command } => {
            let (base_config, _) = load_config(cli.config.as_deref(), Path::new("."))?;
            let root = store.unwrap_or_else(|| PathBuf::from(&base_config.jobs.root));
            let store = FsJobStore::new(root);
            run_job_command(command, &store, cli.config.as_deref(), &base_config, &backend)?;
        }
    }

    Ok(())
}

fn run_job_command(
    command: JobCommand,
    store: &FsJobStore,
    explicit_config: Option<&Path>,
    base_config: &AppConfig,
    backend: &RustBackend,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        JobCommand::New {
            directory,
            filename,
        } => {
            let directory = std::fs::canonicalize(&directory)?;
            let job = store.create(&filename, directory)?;
            output::print_job(&job);
        }
        JobCommand::Scan { id } => {
            let job = store.load(&id)?;
            let (config, _) = load_config(explicit_config, &job.directory)?;
            let job = jobs::run_scan_job(store, &id, &config, backend)?;
            output::print_job(&job);
        }
        JobCommand::Merge { id } => {
            let job = store.load(&id)?;
            let (config, _) = load_config(explicit_config, &job.directory)?;
            let today = chrono::Local::now().date_naive();
            let job = jobs::run_merge_job(store, &id, &config, backend, today)?;
            output::print_job(&job);
        }
        JobCommand::Show { id } => {
            output::print_job(&store.load(&id)?);
        }
        JobCommand::List => {
            output::print_job_list(&store.list()?);
        }
        JobCommand::Cleanup => {
            let policy = RetentionPolicy::from(&base_config.jobs);
            let report = jobs::cleanup_expired(store, chrono::Utc::now(), &policy)?;
            output::print_cleanup(&report);
        }
    }
    Ok(())
}
