//! Plotfile extraction CLI.
//!
//! - `info` prints the metadata of a plotfile as JSON
//! - `extract` copies a box of cells into a raw `f64` file and prints a
//!   JSON summary
//!
//! Reader settings come from `PLOTFILE_*` environment variables, optionally
//! through a `.env` file.

mod summary;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use plotfile_reader::{IntVect, ReaderConfig, ReaderContext};

use summary::ExtractSummary;

#[derive(Parser, Debug)]
#[command(name = "plotfile-extract")]
#[command(about = "Inspect AMReX plotfiles and extract subdomains", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print plotfile metadata
    Info {
        /// Plotfile directory
        plotfile: PathBuf,
    },

    /// Extract a box of cells
    Extract {
        /// Plotfile directory
        plotfile: PathBuf,

        /// Lower corner in local cell indices, e.g. 0,0,0
        #[arg(long, value_parser = parse_triple, allow_hyphen_values = true)]
        lo: [i32; 3],

        /// Upper corner in local cell indices (inclusive)
        #[arg(long, value_parser = parse_triple, allow_hyphen_values = true)]
        hi: [i32; 3],

        /// Value for cells no grid covers
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        fill: f64,

        /// Write the raw native-endian doubles here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    // stdout carries the JSON result
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = ReaderConfig::from_env();
    let mut ctx = ReaderContext::with_config(config);

    match cli.command {
        Commands::Info { plotfile } => {
            let meta = ctx
                .load(&plotfile)
                .with_context(|| format!("loading {}", plotfile.display()))?;
            println!("{}", serde_json::to_string_pretty(meta)?);
        }
        Commands::Extract {
            plotfile,
            lo,
            hi,
            fill,
            output,
        } => {
            let variables = ctx
                .load(&plotfile)
                .with_context(|| format!("loading {}", plotfile.display()))?
                .variables
                .clone();

            let cells = summary::cell_count(lo, hi)?;
            let mut data = vec![fill; cells * 3];
            info!(?lo, ?hi, cells, "Extracting subdomain");

            let report = ctx
                .extract(IntVect(lo), IntVect(hi), &mut data)
                .context("extraction failed")?;

            if let Some(path) = &output {
                std::fs::write(path, bytemuck::cast_slice::<f64, u8>(&data))
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), bytes = data.len() * 8, "Wrote output");
            }

            let summary = ExtractSummary::new(plotfile, output, &variables, report, &data);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

/// Parse `i,j,k`.
fn parse_triple(s: &str) -> std::result::Result<[i32; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected three comma-separated integers, got {s:?}"));
    }
    let mut out = [0; 3];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|e| format!("bad index {part:?}: {e}"))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_triple() {
        assert_eq!(parse_triple("1,2,3").unwrap(), [1, 2, 3]);
        assert_eq!(parse_triple(" -4, 0 ,7").unwrap(), [-4, 0, 7]);
        assert!(parse_triple("1,2").is_err());
        assert!(parse_triple("1,2,x").is_err());
    }

    #[test]
    fn test_cli_parses_extract() {
        let cli = Cli::try_parse_from([
            "plotfile-extract",
            "extract",
            "plt00000",
            "--lo",
            "0,0,0",
            "--hi",
            "3,3,0",
            "--fill",
            "-1",
        ])
        .unwrap();
        match cli.command {
            Commands::Extract { lo, hi, fill, output, .. } => {
                assert_eq!(lo, [0, 0, 0]);
                assert_eq!(hi, [3, 3, 0]);
                assert_eq!(fill, -1.0);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
