use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use dragfit_engine::{
    apply_impacts, build_selections, parse_impact_log, solve_selections, summarize_results,
    BinEntry, RawRecording, ResultEntry, RunSummary, SelectionConfig, SolverConfig,
    TrajectoryDocument,
};

#[derive(Parser)]
#[command(name = "dragfit")]
#[command(version = "0.1.0")]
#[command(about = "Drag-coefficient analysis for recorded particle trajectories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pan impacts from an observation log to a raw recording
    Prepare {
        /// Raw recording JSON from the tracking software
        #[arg(long)]
        raw: PathBuf,

        /// Observation log with impact annotations
        #[arg(long)]
        log: PathBuf,

        /// Output trajectory document
        #[arg(short = 'o', long, default_value = "particles_final.json")]
        output: PathBuf,
    },

    /// Group particles into diameter bins and average their curves
    Select {
        /// Input trajectory document
        #[arg(short = 'i', long)]
        input: PathBuf,

        /// Output selections document
        #[arg(short = 'o', long, default_value = "selections.json")]
        output: PathBuf,

        /// Number of equal-width diameter bins
        #[arg(short = 'b', long, default_value = "20")]
        bins: usize,

        /// Drop particles that hit the pan
        #[arg(long)]
        exclude_hit: bool,

        /// Drop particles that never hit the pan
        #[arg(long)]
        exclude_unhit: bool,

        /// Distance sampling interval (seconds)
        #[arg(long, default_value = "0.04")]
        dt: f64,
    },

    /// Solve the drag/Reynolds relation for saved selections
    Solve {
        /// Input selections document
        #[arg(short = 'i', long, default_value = "selections.json")]
        input: PathBuf,

        /// Output results document
        #[arg(short = 'o', long, default_value = "results.json")]
        output: PathBuf,

        /// Polynomial resampling step (seconds)
        #[arg(long, default_value = "0.001")]
        poly_dt: f64,

        /// Output format
        #[arg(short = 'f', long, default_value = "table")]
        format: OutputFormat,
    },

    /// Select and solve in one pass
    Run {
        /// Input trajectory document
        #[arg(short = 'i', long)]
        input: PathBuf,

        /// Output selections document
        #[arg(long, default_value = "selections.json")]
        selections: PathBuf,

        /// Output results document
        #[arg(long, default_value = "results.json")]
        results: PathBuf,

        /// Number of equal-width diameter bins
        #[arg(short = 'b', long, default_value = "20")]
        bins: usize,

        /// Drop particles that hit the pan
        #[arg(long)]
        exclude_hit: bool,

        /// Drop particles that never hit the pan
        #[arg(long)]
        exclude_unhit: bool,

        /// Distance sampling interval (seconds)
        #[arg(long, default_value = "0.04")]
        dt: f64,

        /// Polynomial resampling step (seconds)
        #[arg(long, default_value = "0.001")]
        poly_dt: f64,

        /// Output format
        #[arg(short = 'f', long, default_value = "table")]
        format: OutputFormat,
    },

    /// Display engine information
    Info,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Prepare { raw, log, output } => {
            cmd_prepare(&raw, &log, &output)?;
        }

        Commands::Select {
            input,
            output,
            bins,
            exclude_hit,
            exclude_unhit,
            dt,
        } => {
            let config = SelectionConfig {
                bin_count: bins,
                include_hit: !exclude_hit,
                include_unhit: !exclude_unhit,
                sample_dt: dt,
            };
            cmd_select(&input, &output, &config)?;
        }

        Commands::Solve {
            input,
            output,
            poly_dt,
            format,
        } => {
            let entries: Vec<BinEntry> = read_json(&input)?;
            solve_and_report(&entries, poly_dt, &output, format)?;
        }

        Commands::Run {
            input,
            selections,
            results,
            bins,
            exclude_hit,
            exclude_unhit,
            dt,
            poly_dt,
            format,
        } => {
            let config = SelectionConfig {
                bin_count: bins,
                include_hit: !exclude_hit,
                include_unhit: !exclude_unhit,
                sample_dt: dt,
            };
            let entries = cmd_select(&input, &selections, &config)?;
            solve_and_report(&entries, poly_dt, &results, format)?;
        }

        Commands::Info => {
            println!("╔════════════════════════════════════════╗");
            println!("║        DRAGFIT ENGINE v0.1.0           ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Drag-coefficient analysis for recorded ║");
            println!("║ particle trajectories.                 ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Pipeline stages:                       ║");
            println!("║ • prepare: apply pan impacts           ║");
            println!("║ • select: diameter bins and averaging  ║");
            println!("║ • solve: Cd and Re by two methods      ║");
            println!("╚════════════════════════════════════════╝");
        }
    }

    Ok(())
}

fn cmd_prepare(raw: &Path, log: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let recording: RawRecording = read_json(raw)?;
    let text = fs::read_to_string(log)
        .map_err(|e| format!("cannot read {}: {}", log.display(), e))?;

    let events = parse_impact_log(&text)?;
    println!("Found {} pan impacts in {}", events.len(), log.display());
    for event in &events {
        println!("  {}", event.particle);
    }

    let (document, summary) = apply_impacts(recording, &events);
    println!(
        "Trimmed {} trajectories, {} particles extinguished on impact ({} of {} events matched)",
        summary.trimmed,
        summary.extinguished,
        summary.matched,
        events.len()
    );

    write_json(output, &document)?;
    println!("Trajectory document saved to {}", output.display());
    Ok(())
}

fn cmd_select(
    input: &Path,
    output: &Path,
    config: &SelectionConfig,
) -> Result<Vec<BinEntry>, Box<dyn Error>> {
    println!("Processing {}...", input.display());
    let document: TrajectoryDocument = read_json(input)?;

    let entries = build_selections(document, config)?;

    let total: usize = entries.iter().map(|e| e.header.particle_count).sum();
    println!("Particles selected for analysis: {}", total);
    for (i, entry) in entries.iter().enumerate() {
        let h = &entry.header;
        println!(
            "Bin {}: ({} - {}), {} | Count: {}",
            i + 1,
            fmt_opt2(h.min_diameter),
            fmt_opt2(h.max_diameter),
            fmt_opt2(h.average_diameter),
            h.particle_count
        );
    }

    write_json(output, &entries)?;
    println!("Selections saved to {}", output.display());
    Ok(entries)
}

fn solve_and_report(
    entries: &[BinEntry],
    poly_dt: f64,
    output: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let config = SolverConfig {
        poly_dt,
        ..Default::default()
    };
    let results = solve_selections(entries, &config);

    write_json(output, &results)?;
    println!("Results saved to {}", output.display());

    let summary = summarize_results(&results);
    display_results(&results, &summary, format)
}

fn display_results(
    results: &[ResultEntry],
    summary: &RunSummary,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results)?);
        }

        OutputFormat::Table => {
            println!("┌──────────────────────┬───────────────────────┬────────────┬────────────┬────────────┬────────────┐");
            println!("│ D (µm)               │ Re (min - max)        │  Cd (poly) │  Cd (disc) │   A (poly) │   A (disc) │");
            println!("├──────────────────────┼───────────────────────┼────────────┼────────────┼────────────┼────────────┤");
            for entry in results {
                println!(
                    "│ {:<20} │ {:<21} │ {:>10} │ {:>10} │ {:>10} │ {:>10} │",
                    diameter_cell(&entry.diameter),
                    reynolds_cell(&entry.reynolds),
                    fmt_opt(entry.avg_cd.poly),
                    fmt_opt(entry.avg_cd.disc),
                    fmt_opt(entry.avg_a.poly),
                    fmt_opt(entry.avg_a.disc),
                );
            }
            println!("├──────────────────────┼───────────────────────┼────────────┼────────────┼────────────┼────────────┤");
            println!(
                "│ {:<20} │ {:<21} │ {:>10} │ {:>10} │ {:>10} │ {:>10} │",
                "bin averages",
                "-",
                fmt_opt(summary.avg_cd_poly),
                fmt_opt(summary.avg_cd_disc),
                fmt_opt(summary.avg_a_poly),
                fmt_opt(summary.avg_a_disc),
            );
            println!(
                "│ {:<20} │ {:<21} │ {:>10} │ {:>10} │ {:>10} │ {:>10} │",
                "combined",
                "-",
                fmt_opt(summary.overall_cd),
                "-",
                fmt_opt(summary.overall_a),
                "-",
            );
            println!("└──────────────────────┴───────────────────────┴────────────┴────────────┴────────────┴────────────┘");
        }
    }

    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "-".to_string(),
    }
}

fn fmt_opt2(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}

fn diameter_cell(d: &[Option<f64>; 3]) -> String {
    match (d[0], d[1], d[2]) {
        (Some(min), Some(max), Some(avg)) => format!("{:.2}-{:.2}, {:.2}", min, max, avg),
        _ => "-".to_string(),
    }
}

fn reynolds_cell(re: &[Option<f64>; 2]) -> String {
    match (re[0], re[1]) {
        (Some(min), Some(max)) => format!("{:.4} - {:.4}", min, max),
        _ => "-".to_string(),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let file = File::open(path).map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("cannot parse {}: {}", path.display(), e))?;
    Ok(value)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let file =
        File::create(path).map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
    // Surface device errors here instead of losing them in the buffered drop
    writer
        .flush()
        .map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
    Ok(())
}
