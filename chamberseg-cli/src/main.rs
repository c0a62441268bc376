//! chamberseg CLI
//!
//! Reconstructs straight-line segments from JSON event files.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand, ValueEnum};

use chamberseg_algorithms::{build_segments_batch, ChamberSegments};
use chamberseg_core::config::{SeedProjection, SegmentConfig};
use chamberseg_core::diagnostics::Diagnostics;
use chamberseg_io::{EventFile, OutputFormat, SegmentFileWriter, SegmentRecord};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    ChambersegIo(#[from] chamberseg_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] chamberseg_core::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] chamberseg_core::ConfigError),
}

/// Seed slope convention.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Projection {
    /// First hit's position carried onto the second hit's layer
    FirstHit,
    /// Second hit's own position
    SecondHit,
}

impl From<Projection> for SeedProjection {
    fn from(p: Projection) -> Self {
        match p {
            Projection::FirstHit => SeedProjection::FirstHit,
            Projection::SecondHit => SeedProjection::SecondHit,
        }
    }
}

/// Straight-line segment reconstruction in layered detector chambers.
#[derive(Parser)]
#[command(name = "chamberseg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the configuration stored in the event file.
#[derive(clap::Args, Debug, Default)]
struct ConfigOverrides {
    /// Minimum layer separation of a seed pair
    #[arg(long)]
    min_layers_apart: Option<u8>,

    /// Base minimum number of hits per segment
    #[arg(long)]
    min_hits: Option<usize>,

    /// Maximum R*dphi between hit and line
    #[arg(long)]
    d_rphi_max: Option<f64>,

    /// Maximum dphi between hit and line (radians)
    #[arg(long)]
    d_phi_max: Option<f64>,

    /// Maximum |v-slope| of a seed
    #[arg(long)]
    tan_theta_max: Option<f64>,

    /// Maximum |u-slope| of a seed
    #[arg(long)]
    tan_phi_max: Option<f64>,

    /// Seed slope convention
    #[arg(long, value_enum)]
    seed_projection: Option<Projection>,

    /// Log a summary of every candidate
    #[arg(long)]
    debug_candidates: bool,
}

impl ConfigOverrides {
    fn apply(&self, base: SegmentConfig) -> SegmentConfig {
        let mut config = base;
        if let Some(v) = self.min_layers_apart {
            config.min_layers_apart = v;
        }
        if let Some(v) = self.min_hits {
            config.min_hits_per_segment = v;
        }
        if let Some(v) = self.d_rphi_max {
            config.d_rphi_fine_max = v;
        }
        if let Some(v) = self.d_phi_max {
            config.d_phi_fine_max = v;
        }
        if let Some(v) = self.tan_theta_max {
            config.tan_theta_max = v;
        }
        if let Some(v) = self.tan_phi_max {
            config.tan_phi_max = v;
        }
        if let Some(p) = self.seed_projection {
            config.seed_projection = p.into();
        }
        if self.debug_candidates {
            config.debug = true;
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build segments for every chamber of an event file
    Reconstruct {
        /// Input event file (JSON)
        input: PathBuf,

        /// Output file path (.json or .csv)
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Process chambers in parallel
        #[arg(short, long)]
        parallel: bool,
    },

    /// Show information about an event file
    Info {
        /// Input event file (JSON)
        input: PathBuf,
    },

    /// Time the segment builder on an event file
    Benchmark {
        /// Input event file (JSON)
        input: PathBuf,

        /// Number of iterations
        #[arg(short = 'n', long, default_value = "10")]
        iterations: usize,

        /// Process chambers in parallel
        #[arg(short, long)]
        parallel: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Reconstruct {
            input,
            output,
            overrides,
            parallel,
        } => {
            let format = OutputFormat::from_path(&output)?;
            let event = EventFile::open(&input)?;
            let config = overrides.apply(event.config.clone().unwrap_or_default());
            config.validate()?;
            debug!("configuration: {:?}", config);

            let start = Instant::now();
            let batch = event.chamber_batch()?;
            let results = build_segments_batch(&batch, &config, parallel);

            let mut records = Vec::new();
            let mut total = Diagnostics::new();
            for (record, result) in event.chambers.iter().zip(results) {
                let outcome: ChamberSegments = result?;
                if outcome.diagnostics.has_degenerate() {
                    warn!(
                        "chamber {}: {} degenerate matrices",
                        record.id,
                        outcome.diagnostics.degenerate.len()
                    );
                }
                for (i, segment) in outcome.segments.iter().enumerate() {
                    records.push(SegmentRecord::from_segment(&record.id, i, segment));
                }
                total.merge(&outcome.diagnostics);
            }
            let elapsed = start.elapsed();

            let mut writer = SegmentFileWriter::create(&output)?;
            writer.write(&records, format)?;
            info!("wrote {} segments to {}", records.len(), output.display());

            println!(
                "Processed {} chambers ({} hits) in {:.2} ms",
                event.chambers.len(),
                event.hit_count(),
                elapsed.as_secs_f64() * 1000.0
            );
            println!("Segments: {}", records.len());
            println!(
                "Seed pairs: {} (separation rejects {}, slope rejects {})",
                total.seed_pairs, total.rejected_separation, total.rejected_slope
            );
            println!(
                "Candidates too small: {}, replacements accepted/rejected: {}/{}",
                total.candidates_too_small,
                total.replacements_accepted,
                total.replacements_rejected
            );
        }

        Commands::Info { input } => {
            let event = EventFile::open(&input)?;

            println!("File: {}", input.display());
            println!("Chambers: {}", event.chambers.len());
            println!("Hits: {}", event.hit_count());
            match &event.config {
                Some(config) => println!("Configuration: {:?}", config),
                None => println!("Configuration: default"),
            }

            println!("{:<16} | {:>6} | {:>6}", "Chamber", "Layers", "Hits");
            println!("{:-<34}", "");
            for chamber in &event.chambers {
                println!(
                    "{:<16} | {:>6} | {:>6}",
                    chamber.id,
                    chamber.layer_z.len(),
                    chamber.hits.len()
                );
            }
        }

        Commands::Benchmark {
            input,
            iterations,
            parallel,
        } => {
            let event = EventFile::open(&input)?;
            let config = event.config.clone().unwrap_or_default();
            config.validate()?;
            let batch = event.chamber_batch()?;

            println!(
                "Benchmarking with {} chambers, {} hits, {} iterations",
                batch.len(),
                event.hit_count(),
                iterations
            );

            // Warmup
            let _ = build_segments_batch(&batch, &config, parallel);

            let mut times = Vec::with_capacity(iterations);
            let mut segments = 0usize;
            for _ in 0..iterations {
                let start = Instant::now();
                let results = build_segments_batch(&batch, &config, parallel);
                times.push(start.elapsed().as_secs_f64() * 1000.0);

                segments = 0;
                for result in results {
                    segments += result?.segments.len();
                }
            }

            if times.is_empty() {
                println!("No iterations run");
                return Ok(());
            }
            let min_time = times.iter().fold(f64::INFINITY, |a, &b| a.min(b));
            let max_time = times.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
            let mean_time = times.iter().sum::<f64>() / times.len() as f64;

            println!(
                "{:<10} | {:<15} | {:<15} | {:<15} | {:<8}",
                "Algorithm", "Mean Time (ms)", "Min Time (ms)", "Max Time (ms)", "Segments"
            );
            println!("{:-<76}", "");
            println!(
                "{:<10} | {:<15.3} | {:<15.3} | {:<15.3} | {:<8}",
                "DF", mean_time, min_time, max_time, segments
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "chamberseg",
            "reconstruct",
            "event.json",
            "-o",
            "out.csv",
            "--min-layers-apart",
            "3",
            "--tan-phi-max",
            "0.8",
            "--seed-projection",
            "second-hit",
        ]);
        let Commands::Reconstruct {
            overrides,
            parallel,
            ..
        } = cli.command
        else {
            panic!("expected reconstruct");
        };
        assert!(!parallel);

        let config = overrides.apply(SegmentConfig::default());
        assert_eq!(config.min_layers_apart, 3);
        assert!((config.tan_phi_max - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.seed_projection, SeedProjection::SecondHit);
        assert_eq!(config.min_hits_per_segment, 3);
    }
}
