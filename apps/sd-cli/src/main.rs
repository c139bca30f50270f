use clap::{Parser, Subcommand, ValueEnum};
use sd_app::{
    AnalysisProfile, AppError, AppResult, OutputMode, analyze_batch, analyze_file, load_profile,
    render_report, write_results_table,
};
use sd_diag::AnalysisKind;
use sd_format::{ParamSchema, SimulationFamily};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sd-cli")]
#[command(about = "SimDiag CLI - PDE simulator output diagnostics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Stability,
    Damping,
}

impl From<KindArg> for AnalysisKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Stability => AnalysisKind::Stability,
            KindArg::Damping => AnalysisKind::Damping,
        }
    }
}

#[derive(clap::Args)]
struct ProfileArgs {
    /// Built-in output layout (see `presets`)
    #[arg(short, long, conflicts_with_all = ["profile", "schema"])]
    family: Option<String>,
    /// Analysis profile YAML file
    #[arg(short, long, conflicts_with = "schema")]
    profile: Option<PathBuf>,
    /// Parameter schema YAML file, analyzed with default diagnostics
    #[arg(short, long)]
    schema: Option<PathBuf>,
    /// Override the profile's analysis
    #[arg(long, value_enum)]
    kind: Option<KindArg>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one simulator output file
    Analyze {
        /// Path to the output file
        path: PathBuf,
        #[command(flatten)]
        profile: ProfileArgs,
        /// Print only the rate(s)
        #[arg(long, conflicts_with = "json")]
        bare: bool,
        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Analyze many output files and write a results table
    Batch {
        /// Paths to the output files
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[command(flatten)]
        profile: ProfileArgs,
        /// Parameter columns for the table, comma separated
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,
        /// Output table path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List built-in output layouts
    Presets,
}

fn main() -> AppResult<()> {
    // Logs go to stderr so bare output stays machine readable
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            path,
            profile,
            bare,
            json,
        } => {
            let mode = if bare {
                OutputMode::Bare
            } else if json {
                OutputMode::Json
            } else {
                OutputMode::Fancy
            };
            cmd_analyze(&path, &profile, mode)
        }
        Commands::Batch {
            paths,
            profile,
            columns,
            output,
        } => cmd_batch(&paths, &profile, &columns, output.as_deref()),
        Commands::Presets => cmd_presets(),
    }
}

fn resolve_profile(args: &ProfileArgs) -> AppResult<AnalysisProfile> {
    let profile = if let Some(path) = &args.profile {
        load_profile(path)?
    } else if let Some(path) = &args.schema {
        AnalysisProfile::inline(ParamSchema::load_yaml(path)?)
    } else if let Some(name) = &args.family {
        AnalysisProfile::preset(name.parse::<SimulationFamily>()?)
    } else {
        return Err(AppError::InvalidInput(
            "One of --family, --profile or --schema is required".to_string(),
        ));
    };
    Ok(match args.kind {
        Some(kind) => profile.with_kind(kind.into()),
        None => profile,
    })
}

fn cmd_analyze(path: &Path, args: &ProfileArgs, mode: OutputMode) -> AppResult<()> {
    let profile = resolve_profile(args)?;
    let analysis = analyze_file(path, &profile)?;
    print!("{}", render_report(&analysis, mode)?);
    Ok(())
}

fn cmd_batch(
    paths: &[PathBuf],
    args: &ProfileArgs,
    columns: &[String],
    output: Option<&Path>,
) -> AppResult<()> {
    let profile = resolve_profile(args)?;
    let columns = if columns.is_empty() {
        profile
            .schema
            .schema()
            .field_names()
            .map(str::to_string)
            .collect()
    } else {
        columns.to_vec()
    };

    let entries = analyze_batch(paths, &profile);
    let failed = entries.iter().filter(|e| e.outcome.is_err()).count();

    let written = if let Some(path) = output {
        let mut file = io::BufWriter::new(std::fs::File::create(path)?);
        let written = write_results_table(&entries, &columns, &mut file)?;
        file.flush()?;
        println!("✓ Wrote {} rows to {}", written, path.display());
        written
    } else {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        let written = write_results_table(&entries, &columns, &mut lock)?;
        lock.flush()?;
        written
    };

    if failed > 0 {
        eprintln!("{} of {} files failed to analyze", failed, written + failed);
        for entry in &entries {
            if let Err(e) = &entry.outcome {
                eprintln!("  {}: {}", entry.path.display(), e);
            }
        }
    }
    Ok(())
}

fn cmd_presets() -> AppResult<()> {
    println!("Built-in output layouts:");
    for family in SimulationFamily::ALL {
        let schema = family.schema();
        let fields: Vec<&str> = schema.field_names().collect();
        let mut extras = Vec::new();
        if schema.explicit_grid {
            extras.push("explicit grid".to_string());
        }
        for aux in &schema.aux {
            extras.push(format!("aux {}", aux));
        }
        println!("  {} - {}", family.name(), family.description());
        println!("      {}", fields.join(" "));
        if !extras.is_empty() {
            println!("      + {}", extras.join(", "));
        }
    }
    Ok(())
}
