//! kml2cot CLI - KML to Cursor-on-Target conversion tool

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use kml2cot::{load_file, sanitize_filename, ConvertOptions, Converter, LoadOptions};

#[derive(Parser)]
#[command(name = "kml2cot")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert KML placemarks to Cursor-on-Target event files", long_about = None)]
struct Cli {
    /// Input KML file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Directory to save output files (default: {prefix}_output)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Prefix for output filenames (default: based on input filename)
    #[arg(short, long)]
    prefix: Option<String>,

    /// Attempt to repair malformed KML before parsing
    #[arg(long)]
    force: bool,

    /// Show document diagnostics before converting
    #[arg(long)]
    debug: bool,

    /// Process placemarks sequentially
    #[arg(long)]
    sequential: bool,

    /// Print the conversion report as JSON
    #[arg(long)]
    report_json: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let prefix = cli.prefix.clone().unwrap_or_else(|| {
        let stem = cli.input.file_stem().unwrap_or_default().to_string_lossy();
        sanitize_filename(&stem)
    });
    let output_dir = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{prefix}_output")));

    if !cli.report_json {
        println!("{} {}", "Processing:".bold(), cli.input.display());
        println!("{} {}", "Output directory:".bold(), output_dir.display());
        println!("{} {}", "Prefix:".bold(), prefix);
    }

    let mut load = LoadOptions::new();
    if cli.force {
        load = load.force_repair();
    }
    let source = load_file(&cli.input, &load)?;

    if cli.debug {
        println!("\n{}", "Document diagnostics".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        println!("{}", source.diagnostics());
        println!();
    }

    let mut options = ConvertOptions::new().with_load_options(load);
    if cli.sequential {
        options = options.sequential();
    }
    let converter = Converter::with_options(options);

    let pb = if cli.report_json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(1);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message("Converting placemarks...");
        pb
    };

    let report = converter.convert_source(&source, &output_dir, &prefix)?;
    pb.inc(1);
    pb.finish_with_message("Done!");

    if cli.report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(ref name) = report.document_name {
        println!("{} {}", "Document:".bold(), name);
    }
    println!(
        "{} {} placemarks, {} events written",
        "Found".green().bold(),
        report.placemark_count,
        report.written.len()
    );
    for path in &report.written {
        println!("  {} {}", "├─".dimmed(), path.display());
    }
    if report.skipped > 0 {
        println!(
            "{} {} placemarks skipped (no usable geometry)",
            "Warning:".yellow().bold(),
            report.skipped
        );
    }

    Ok(())
}
