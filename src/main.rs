//! Convert an ice monitoring workbook into absolute survey coordinates

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info};

use ice_survey::api::{write_output, PointRecord, TextFormatter};
use ice_survey::{ConfigurationManager, Converter, OutputFormat, SurveyError, Workbook};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    NamedCsv,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::NamedCsv => OutputFormat::NamedCsv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Convert ice monitoring survey data into 3D coordinates",
    long_about = "Resolves the workbook's Tie-In sheet against its fixed stations, then\n\
        projects every perimeter and transect sheet from its tripod station.\n\
        The workbook is a JSON document of named worksheets whose rows are keyed\n\
        by column header."
)]
struct Args {
    /// Workbook JSON file
    workbook: PathBuf,

    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum propagation passes over the tie-in network
    #[arg(long)]
    max_passes: Option<usize>,

    /// Magnetic declination in degrees (recorded, not applied)
    #[arg(short = 'm', long, allow_hyphen_values = true)]
    declination: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Only emit ice-surface points
    #[arg(long)]
    surface_only: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the resolved station table to stderr
    #[arg(long)]
    stations: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> Result<()> {
    let mut manager = match &args.config {
        Some(path) => ConfigurationManager::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ConfigurationManager::new(),
    };
    if let Some(max_passes) = args.max_passes {
        manager.set_max_passes(max_passes)?;
    }
    if let Some(declination) = args.declination {
        manager.set_declination(declination)?;
    }
    if let Some(format) = args.format {
        manager.set_output_format(format.into());
    }
    if args.surface_only {
        manager.set_surface_only(true);
    }
    let config = manager.into_config();

    let workbook = Workbook::from_path(&args.workbook)?;
    info!(
        "Loaded {} worksheet(s) from {}",
        workbook.worksheets.len(),
        args.workbook.display()
    );

    let converter = Converter::try_new(config)?;
    let conversion = match converter.convert(&workbook) {
        Ok(conversion) => conversion,
        Err(err) => {
            if let Some(table) = err.partial_table() {
                eprint!("{}", TextFormatter::new().format_stations(table));
            }
            return Err(err.into());
        }
    };

    if args.stations {
        eprint!("{}", TextFormatter::new().format_stations(&conversion.stations));
    }

    let output = &converter.config().output;
    let records = PointRecord::collect(&conversion, output.surface_only);
    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_output(output, &records, BufWriter::new(file))?;
            info!("Wrote {} point(s) to {}", records.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_output(output, &records, &mut handle)?;
            handle.flush()?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(SurveyError::UnderdeterminedNetwork { .. }) = err.downcast_ref::<SurveyError>() {
                error!("Tie-in network is not fully connected to a fixed station");
            }
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
