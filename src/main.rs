use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use quick_grader::config::{ExportProfile, GraderConfig, ProfileKind};
use quick_grader::store::RosterStore;
use quick_grader::year::GradingYear;
use quick_grader::{GradeError, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose).and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| GradeError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let state = AppState::from_cli(&cli)?;
    match cli.command {
        Command::NewYear { root, name } => {
            let year = GradingYear::create(&root, &name)?;
            println!("{}", year.path().display());
            Ok(())
        }
        Command::NewPeriod { year, name, seed } => {
            let year = GradingYear::open(&year)?;
            let period = year.create_period(&name)?;
            if let Some(seed) = seed {
                state.seed_period(&period, &seed)?;
            }
            println!("{}", period.path().display());
            Ok(())
        }
        Command::Adopt { year, period } => {
            let year = GradingYear::open(&year)?;
            let period = year.adopt_period(&RosterStore::open(&period)?)?;
            println!("{}", period.path().display());
            Ok(())
        }
        Command::CopyPeriod { period, dest } => {
            let copy = RosterStore::open(&period)?.copy_tree(&dest)?;
            println!("{}", copy.path().display());
            Ok(())
        }
        Command::Ingest {
            period,
            exports,
            merge,
        } => {
            let period = RosterStore::open(&period)?;
            let profile = state.profile(None);
            for export in &exports {
                period.ingest_export(export, &profile, None)?;
            }
            if merge {
                period.merge_pending()?;
            }
            Ok(())
        }
        Command::Import {
            period,
            export,
            name,
        } => {
            let period = RosterStore::open(&period)?;
            let profile = state.profile(Some(ProfileKind::ScoredSheet));
            period.ingest_export(&export, &profile, Some(&name))?;
            Ok(())
        }
        Command::Seed { period, table } => {
            let period = RosterStore::open(&period)?;
            period.seed_usernames(&table, &state.profile(None).username_column)?;
            Ok(())
        }
        Command::MergeAll { period } => {
            let merged = RosterStore::open(&period)?.merge_pending()?;
            for assignment in merged {
                println!("{assignment}");
            }
            Ok(())
        }
        Command::Curve { period, assignment } => {
            let delta = RosterStore::open(&period)?.bump_to_hundred(&assignment)?;
            println!("{assignment}: {delta:+}");
            Ok(())
        }
        Command::DropLowest { period } => {
            RosterStore::open(&period)?.drop_lowest()?;
            Ok(())
        }
        Command::Broadcast { year, export } => {
            let year = GradingYear::open(&year)?;
            let reports = year.broadcast_ingest(&export, &state.profile(None))?;
            for report in reports {
                println!("{}: {}", report.period, report.merged.join(", "));
            }
            Ok(())
        }
        Command::Periods { year } => {
            let year = GradingYear::open(&year)?;
            let periods = year.periods()?;
            if periods.is_empty() {
                println!("No periods found.");
            }
            for (index, period) in periods.iter().enumerate() {
                println!("{}. {}", index + 1, period.name());
            }
            Ok(())
        }
        Command::Assignments { period } => {
            let assignments = RosterStore::open(&period)?.assignments()?;
            if assignments.is_empty() {
                println!("No assignments found.");
            }
            for (index, assignment) in assignments.iter().enumerate() {
                println!("{}. {assignment}", index + 1);
            }
            Ok(())
        }
        Command::Export { period, output } => {
            RosterStore::open(&period)?.export_workbook(&output)
        }
    }
}

/// Settings shared by every command, resolved once from the config file and
/// the global flags.
struct AppState {
    config: GraderConfig,
    profile: Option<ProfileKind>,
}

impl AppState {
    fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => load_config(path)?,
            None => GraderConfig::default(),
        };
        if cli.username_column.is_some() {
            config.username_column = cli.username_column.clone();
        }
        if cli.score_column.is_some() {
            config.score_column = cli.score_column.clone();
        }
        Ok(Self {
            config,
            profile: cli.profile.map(ProfileKind::from),
        })
    }

    /// Profile for an ingestion. The global `--profile` flag wins over the
    /// command's own default, which wins over the config file.
    fn profile(&self, command_default: Option<ProfileKind>) -> ExportProfile {
        self.config.export_profile(self.profile.or(command_default))
    }

    /// Ingests the seed export and adds its usernames to a fresh period.
    fn seed_period(&self, period: &RosterStore, seed: &Path) -> Result<()> {
        let profile = self.profile(None);
        let assignment = period.ingest_export(seed, &profile, None)?;
        let added = period.seed_usernames(seed, &profile.username_column)?;
        period.merge_pending()?;
        info!(assignment = %assignment, added, "period seeded");
        Ok(())
    }
}

fn load_config(path: &Path) -> Result<GraderConfig> {
    if !path.exists() {
        return Err(GradeError::MissingInput(path.to_path_buf()));
    }
    GraderConfig::load(path)
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Build per-period gradebooks from assignment exports."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON config file with default profile and header names.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Export profile naming the username and score headers.
    #[arg(long, value_enum, global = true)]
    profile: Option<ProfileArg>,

    /// Header of the username column in exports.
    #[arg(long, global = true)]
    username_column: Option<String>,

    /// Header of the score column in exports.
    #[arg(long, global = true)]
    score_column: Option<String>,

    /// Log debug output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Create a grading year folder.
    NewYear {
        /// Folder to create the year in.
        #[arg(long)]
        root: PathBuf,
        /// Name of the year, such as 2024-2025.
        name: String,
    },
    /// Create a period inside a grading year.
    NewPeriod {
        /// Grading year folder.
        #[arg(long)]
        year: PathBuf,
        /// Name of the period.
        name: String,
        /// Export to take the class roster and first assignment from.
        #[arg(long)]
        seed: Option<PathBuf>,
    },
    /// Move an existing period folder into a grading year.
    Adopt {
        #[arg(long)]
        year: PathBuf,
        /// Period folder to move.
        period: PathBuf,
    },
    /// Copy a period folder to a new location.
    CopyPeriod {
        #[arg(long)]
        period: PathBuf,
        dest: PathBuf,
    },
    /// Normalize exports into the period, named after each file.
    Ingest {
        #[arg(long)]
        period: PathBuf,
        #[arg(required = true)]
        exports: Vec<PathBuf>,
        /// Merge pending assignments into the gradebook afterwards.
        #[arg(long)]
        merge: bool,
    },
    /// Normalize a Username/Score sheet under an explicit assignment name.
    Import {
        #[arg(long)]
        period: PathBuf,
        export: PathBuf,
        /// Assignment name to store the scores under.
        #[arg(long)]
        name: String,
    },
    /// Add the usernames found in a table to the gradebook.
    Seed {
        #[arg(long)]
        period: PathBuf,
        table: PathBuf,
    },
    /// Merge every normalized assignment not yet in the gradebook.
    MergeAll {
        #[arg(long)]
        period: PathBuf,
    },
    /// Curve an assignment so its top score is 100.
    Curve {
        #[arg(long)]
        period: PathBuf,
        assignment: String,
    },
    /// Replace each student's lowest score with their rounded-up average.
    DropLowest {
        #[arg(long)]
        period: PathBuf,
    },
    /// Ingest and merge one export into every period of a year.
    Broadcast {
        #[arg(long)]
        year: PathBuf,
        export: PathBuf,
    },
    /// List the periods of a grading year.
    Periods {
        #[arg(long)]
        year: PathBuf,
    },
    /// List the assignments in a period's gradebook.
    Assignments {
        #[arg(long)]
        period: PathBuf,
    },
    /// Write a period's gradebook to an Excel workbook.
    Export {
        #[arg(long)]
        period: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ProfileArg {
    Edpuzzle,
    ScoredSheet,
}

impl From<ProfileArg> for ProfileKind {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Edpuzzle => ProfileKind::Edpuzzle,
            ProfileArg::ScoredSheet => ProfileKind::ScoredSheet,
        }
    }
}
