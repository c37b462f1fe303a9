use clap::{ArgAction, Parser};
use excelibur::ole::{CompoundFile, ParseOptions, PassthroughDecoder, RawStreamWriter, convert};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "excelibur",
    version,
    about = "Extract workbook streams from legacy compound documents"
)]
struct Cli {
    /// Input file, or a directory of .xls files
    input: PathBuf,
    /// Output file, or directory for batch input (defaults next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Extract this stream instead of the workbook
    #[arg(short, long)]
    stream: Option<String>,
    /// Print stream paths instead of extracting
    #[arg(short, long)]
    list: bool,
    /// Reject inputs larger than this many bytes
    #[arg(long)]
    max_size: Option<usize>,
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            error!(failed, "some inputs could not be converted");
            ExitCode::FAILURE
        },
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        },
    }
}

/// Returns the number of inputs that failed
fn run(cli: &Cli) -> excelibur::Result<usize> {
    let options = ParseOptions::new().with_max_input_len(cli.max_size);

    if !cli.input.is_dir() {
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| cli.input.with_extension("bin"));
        process(&cli.input, &output, cli, &options)?;
        return Ok(0);
    }

    let output_dir = cli.output.clone().unwrap_or_else(|| cli.input.clone());
    if !cli.list {
        fs::create_dir_all(&output_dir)?;
    }

    let mut inputs = Vec::new();
    for entry in fs::read_dir(&cli.input)? {
        let path = entry?.path();
        let is_xls = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xls"));
        if path.is_file() && is_xls {
            inputs.push(path);
        }
    }
    inputs.sort();
    info!(count = inputs.len(), dir = %cli.input.display(), "batch conversion");

    // Each parse is independent; no coordination between workers
    let failed = inputs
        .par_iter()
        .filter(|input| {
            let output = batch_output_path(&output_dir, input);
            match process(input, &output, cli, &options) {
                Ok(()) => false,
                Err(e) => {
                    error!(input = %input.display(), "{}", e);
                    true
                },
            }
        })
        .count();

    Ok(failed)
}

/// `<output_dir>/<input stem>.bin`, keeping any dots inside the stem
fn batch_output_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    output_dir.join(format!("{}.bin", stem.to_string_lossy()))
}

fn process(
    input: &Path,
    output: &Path,
    cli: &Cli,
    options: &ParseOptions,
) -> excelibur::Result<()> {
    let file = CompoundFile::open_with_options(input, options)?;

    if cli.list {
        for path in file.list_streams()? {
            println!("{}\t{}", input.display(), path.join("/"));
        }
        return Ok(());
    }

    match &cli.stream {
        Some(name) => {
            let data = file.resolve(name)?;
            fs::write(output, data)?;
        },
        None => convert(&file, &mut PassthroughDecoder, &mut RawStreamWriter, output)?,
    }
    info!(input = %input.display(), output = %output.display(), "done");
    Ok(())
}
