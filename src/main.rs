use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use castep_input::{convert_type, load_from_path, CastepInput, Value};

#[derive(Parser)]
#[command(author, version, about = "Reader/writer for CASTEP .cell and .param inputs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parses a file and prints its normalized form.
    Show {
        input: PathBuf,

        /// Keep every keyword value as written instead of coercing types.
        #[arg(long)]
        plain: bool,
    },
    /// Prints one keyword value or block body.
    Get {
        input: PathBuf,
        key: String,
    },
    /// Prints the cell vectors and Cartesian atomic positions of a .cell file.
    Geometry {
        input: PathBuf,
    },
    /// Parses every file matching the glob patterns and reports failures.
    Check {
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Sets a keyword and writes the file back.
    Set {
        input: PathBuf,
        key: String,
        value: String,

        /// Unit written after the value (e.g. eV, ang).
        #[arg(long)]
        unit: Option<String>,

        /// Write to this file instead of overwriting the input.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load(path: &Path, plain: bool) -> Result<CastepInput> {
    info!("Reading {:?}", path);
    let input = CastepInput::from_file(path, plain)
        .with_context(|| format!("Could not parse input file: {:?}", path))?;
    debug!("-> {} entries", input.len());
    Ok(input)
}

fn print_geometry(input: &CastepInput) -> Result<()> {
    match input.get_cell()? {
        Some(cell) => {
            println!("Cell vectors:");
            for row in cell.row_iter() {
                println!("  {:>14.8} {:>14.8} {:>14.8}", row[0], row[1], row[2]);
            }
        }
        None => println!("No lattice defined."),
    }

    let positions = input.get_positions()?;
    println!("Positions ({} atoms, Cartesian):", positions.len());
    for (element, coords, tags) in positions.iter() {
        println!(
            "  {:<3} {:>14.8} {:>14.8} {:>14.8} {}",
            element, coords.x, coords.y, coords.z, tags
        );
    }
    Ok(())
}

/// Parses one file; cell files also get their geometry checked.
fn check_file(path: &Path) -> Result<usize> {
    let input = load_from_path(path)?;
    input.get_cell()?;
    if input.contains_key("positions_abs") || input.contains_key("positions_frac") {
        input.get_positions()?;
    }
    Ok(input.len())
}

/// Checks every file matching `patterns` and returns how many were checked.
/// Fails when nothing matched or any file failed.
fn check_patterns(patterns: &[String]) -> Result<usize> {
    let mut checked = 0;
    let mut failed = 0;

    for pattern in patterns {
        let paths = glob(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?;
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Skipping unreadable path: {}", e);
                    continue;
                }
            };
            checked += 1;
            match check_file(&path) {
                Ok(n) => println!("ok    {} ({} entries)", path.display(), n),
                Err(e) => {
                    failed += 1;
                    println!("FAIL  {}: {:#}", path.display(), e);
                }
            }
        }
    }

    if checked == 0 {
        anyhow::bail!("No files matched {:?}", patterns);
    }
    if failed > 0 {
        anyhow::bail!("{} of {} files failed to parse", failed, checked);
    }
    Ok(checked)
}

/// Sets one keyword and writes the document to `output`, or back to `input`.
/// Returns the path written.
fn set_value(
    input: &Path,
    key: &str,
    value: &str,
    unit: Option<&str>,
    output: Option<&Path>,
) -> Result<PathBuf> {
    info!("Reading {:?}", input);
    // other keyword values stay uncoerced strings; comments move to the header
    let mut doc = CastepInput::new();
    let comments = doc
        .load_file(input, true)
        .with_context(|| format!("Could not parse input file: {:?}", input))?;
    doc.header_mut().extend(comments);

    doc.set(key, convert_type(value));
    if let Some(unit) = unit {
        doc.set_unit(key, unit);
    }

    let target = output.unwrap_or(input).to_path_buf();
    doc.save(&target)
        .with_context(|| format!("Could not write {:?}", target))?;
    Ok(target)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start_time = Instant::now();

    match cli.command {
        Commands::Show { input, plain } => {
            let doc = load(&input, plain)?;
            println!("{}", doc.to_text());
        }
        Commands::Get { input, key } => {
            let doc = load(&input, false)?;
            let value = doc
                .get(&key)
                .with_context(|| format!("Key '{}' not found in {:?}", key, input))?;
            match value {
                Value::Block(block) => println!("{}", block),
                other => println!("{}", other),
            }
        }
        Commands::Geometry { input } => {
            let doc = load(&input, false)?;
            print_geometry(&doc).with_context(|| format!("Invalid geometry in {:?}", input))?;
        }
        Commands::Check { patterns } => {
            let checked = check_patterns(&patterns)?;
            info!("Checked {} files in {:.2?}", checked, start_time.elapsed());
        }
        Commands::Set { input, key, value, unit, output } => {
            let target = set_value(&input, &key, &value, unit.as_deref(), output.as_deref())?;
            info!("Wrote {:?} in {:.2?}", target, start_time.elapsed());
        }
    }

    Ok(())
}
