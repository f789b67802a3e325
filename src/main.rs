use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use polarnet::clustering::{AgglomerativeLinkage, DendrogramRenderer, TextDendrogram};
use polarnet::config::{Config, Overrides};
use polarnet::events::source::STDIN;
use polarnet::events::{EventSource, FileSource, MemorySource};
use polarnet::output::{csv, terminal};
use polarnet::pipeline::{Pipeline, ScoreStage};

/// Polarnet: temporal retweet scoring and co-audience polarization.
///
/// Scores reposted accounts over time, keeps the most amplified ones, and
/// measures how polarized their audiences are.
#[derive(Parser)]
#[command(name = "polarnet", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score reposted accounts per time bucket and write the elite score table
    Score {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Score, then build the co-audience network and polarization matrix
    Polarize {
        #[command(flatten)]
        run: RunArgs,

        #[command(flatten)]
        cluster: ClusterArgs,

        /// Also write the polarization matrix as CSV to this path
        #[arg(long)]
        matrix: Option<String>,

        /// Where to write the rendered dendrogram when clustering is enabled
        #[arg(long, default_value = "dendrogram.txt")]
        dendrogram: String,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Line-delimited tweet JSON (`-` for stdin)
    #[arg(default_value = "-")]
    infile: String,

    /// Destination for the score table (`-` for stdout)
    #[arg(default_value = "-")]
    outfile: String,

    /// Decay factor for carried-over scores (default: 0.005)
    #[arg(short, long)]
    alpha: Option<f64>,

    /// Bucket size: Y, Q, M, W, D, H or T (default: M)
    #[arg(short, long)]
    granularity: Option<String>,

    /// Minimum summed score to keep an author (default: 2.0)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Only count reposts inside "start,end" (inclusive)
    #[arg(short, long)]
    interval: Option<String>,
}

/// Clustering flags, only meaningful for `polarize`.
#[derive(Args)]
struct ClusterArgs {
    /// Clustering method: ward, centroid, poldist, single, complete, average, weighted, median
    #[arg(short, long)]
    method: Option<String>,

    /// Clustering algorithm: nn_chain or generic (`-` disables clustering)
    #[arg(short = 'l', long)]
    algorithm: Option<String>,
}

impl RunArgs {
    /// Scoring overrides. Clustering keys are left to the env/defaults.
    fn overrides(&self) -> Overrides {
        Overrides {
            alpha: self.alpha,
            granularity: self.granularity.clone(),
            threshold: self.threshold,
            interval: self.interval.clone(),
            method: None,
            algorithm: None,
        }
    }
}

impl ClusterArgs {
    fn apply(&self, overrides: Overrides) -> Overrides {
        Overrides {
            method: self.method.clone(),
            algorithm: self.algorithm.clone(),
            ..overrides
        }
    }
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("polarnet=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score { run } => {
            let config = Config::load()?.with_overrides(run.overrides())?;
            let options = config.pipeline_options()?;
            let source = open_source(&run.infile)?;
            let clusterer = AgglomerativeLinkage;
            let pipeline = Pipeline::new(options, &clusterer);

            if let Some(stage) = score_and_save(&pipeline, source.as_ref(), &run.outfile)? {
                terminal::display_selection(&stage, pipeline.options().threshold);
            }
        }

        Commands::Polarize {
            run,
            cluster,
            matrix,
            dendrogram,
        } => {
            let config = Config::load()?.with_overrides(cluster.apply(run.overrides()))?;
            let options = config.pipeline_options()?;
            let source = open_source(&run.infile)?;
            let clusterer = AgglomerativeLinkage;
            let pipeline = Pipeline::new(options, &clusterer);

            let Some(stage) = score_and_save(&pipeline, source.as_ref(), &run.outfile)? else {
                return Ok(());
            };
            terminal::display_selection(&stage, pipeline.options().threshold);

            info!("Generating influence net...");
            let network = pipeline.network(source.as_ref(), &stage.selection)?;
            terminal::display_polarization(&network.report);

            if let Some(path) = &matrix {
                csv::save_matrix(path, &network.report.labels, &network.report.polarization)?;
                info!(path = %path, "Polarization matrix written");
            }

            if let Some(outcome) = pipeline.cluster(&network)? {
                let rendered = TextDendrogram.render(&outcome, &network.report.labels);
                std::fs::write(&dendrogram, rendered)
                    .with_context(|| format!("Failed to write dendrogram to {dendrogram}"))?;
                terminal::display_clusters(&outcome, &dendrogram);
            }

            eprintln!("\n{}", "Finished.".bold());
        }
    }

    Ok(())
}

/// Open the input for two passes. Stdin is buffered in memory up front.
fn open_source(infile: &str) -> Result<Box<dyn EventSource>> {
    if infile == STDIN {
        let source = MemorySource::from_reader(std::io::stdin().lock())?;
        info!(lines = source.len(), "Buffered stdin");
        Ok(Box::new(source))
    } else {
        Ok(Box::new(FileSource::new(infile)))
    }
}

/// Run the scoring pass and persist the elite score table. Returns `None`
/// (and writes nothing) when no repost qualified.
fn score_and_save(
    pipeline: &Pipeline<'_>,
    source: &dyn EventSource,
    outfile: &str,
) -> Result<Option<ScoreStage>> {
    let pb = ProgressBar::new(0);
    pb.set_style(ProgressStyle::with_template("  Scoring [{bar:30}] {pos}/{len} ({eta})")?);

    info!("Computing user scores");
    let Some(stage) = pipeline.score(source, &pb)? else {
        eprintln!("No users to process.");
        return Ok(None);
    };

    csv::save_score_table(outfile, &stage.selection.table)?;
    info!(outfile = %outfile, rows = stage.selection.table.rows.len(), "Score table written");
    Ok(Some(stage))
}
