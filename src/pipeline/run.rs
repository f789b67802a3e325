// Sequential two-pass pipeline.
//
// 1. Scoring pass: replay the log, bucket and decay-score every reposted
//    author, then keep the authors that reach the threshold.
// 2. Network pass: replay the log again and collect the audience of each
//    elite author, build the overlap and polarization matrices.
// 3. Optionally hand the condensed polarization matrix to a clusterer.
//
// Each stage consumes the previous stage's output completely. The CLI calls
// the stages one at a time so it can persist results in between; `run` chains
// them for callers that only want the final report.

use anyhow::Result;
use indicatif::ProgressBar;
use tracing::{debug, info};

use crate::clustering::{ClusterOutcome, ClusterSpec, Clusterer};
use crate::events::{EventSource, Interval, PassStats};
use crate::network::{audience, polarization, AudienceSets, PolarizationReport};
use crate::period::Granularity;
use crate::scoring::aggregate::{Aggregation, TemporalAggregator};
use crate::scoring::table::ScoreTable;
use crate::scoring::threshold::{self, Selection};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub alpha: f64,
    pub granularity: Granularity,
    pub threshold: f64,
    pub interval: Option<Interval>,
    pub clustering: Option<ClusterSpec>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            alpha: crate::config::DEFAULT_ALPHA,
            granularity: Granularity::Month,
            threshold: crate::config::DEFAULT_THRESHOLD,
            interval: None,
            clustering: None,
        }
    }
}

/// Output of the scoring pass.
#[derive(Debug, Clone)]
pub struct ScoreStage {
    /// Every reposted author, in canonical order.
    pub scores: ScoreTable,
    pub selection: Selection,
    pub stats: PassStats,
    pub counted_events: usize,
}

/// Output of the network pass.
#[derive(Debug, Clone)]
pub struct NetworkStage {
    pub audiences: AudienceSets,
    pub report: PolarizationReport,
    /// Upper triangle of the polarization matrix, row-major.
    pub condensed: Vec<f64>,
}

/// Everything a full run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub score: ScoreStage,
    pub network: NetworkStage,
    pub clusters: Option<ClusterOutcome>,
}

#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// No complete repost fell inside the interval. Nothing is written.
    Empty,
    Completed(Box<PipelineReport>),
}

pub struct Pipeline<'a> {
    options: PipelineOptions,
    clusterer: &'a dyn Clusterer,
}

impl<'a> Pipeline<'a> {
    pub fn new(options: PipelineOptions, clusterer: &'a dyn Clusterer) -> Self {
        Self { options, clusterer }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// First pass. Returns `None` for an empty result.
    pub fn score(
        &self,
        source: &dyn EventSource,
        progress: &ProgressBar,
    ) -> Result<Option<ScoreStage>> {
        let aggregator = TemporalAggregator::new(
            self.options.granularity,
            self.options.interval,
            self.options.alpha,
        );
        let (aggregation, stats) = aggregator.from_source(source, progress)?;

        let Some(Aggregation {
            table,
            counted_events,
            ..
        }) = aggregation
        else {
            info!("No users to process");
            return Ok(None);
        };

        let selection = threshold::select(&table, self.options.threshold);
        info!(
            authors = table.rows.len(),
            buckets = table.buckets.len(),
            elite = selection.elite.len(),
            threshold = self.options.threshold,
            "User scores computed"
        );

        Ok(Some(ScoreStage {
            scores: table,
            selection,
            stats,
            counted_events,
        }))
    }

    /// Second pass over the same source, restricted to the elite set.
    pub fn network(&self, source: &dyn EventSource, selection: &Selection) -> Result<NetworkStage> {
        let audiences = audience::build(source, &selection.elite, self.options.interval.as_ref())?;
        let report = polarization::compute(&audiences);
        let condensed = report.polarization.condensed();
        debug!(condensed = ?condensed, "Condensed polarization vector");
        Ok(NetworkStage {
            audiences,
            report,
            condensed,
        })
    }

    /// Run the configured clusterer. `None` when clustering is disabled or
    /// there are fewer than two elite authors to compare.
    pub fn cluster(&self, network: &NetworkStage) -> Result<Option<ClusterOutcome>> {
        let Some(spec) = self.options.clustering else {
            return Ok(None);
        };
        if network.report.labels.len() < 2 {
            info!(
                elite = network.report.labels.len(),
                "Fewer than two elite users, skipping clustering"
            );
            return Ok(None);
        }

        info!(method = %spec.method, algorithm = %spec.algorithm, "Computing clusters");
        let outcome = self
            .clusterer
            .cluster(&network.condensed, &network.report.labels, &spec)?;
        Ok(Some(outcome))
    }

    /// All stages back to back, nothing persisted.
    pub fn run(&self, source: &dyn EventSource) -> Result<PipelineOutcome> {
        let Some(score) = self.score(source, &ProgressBar::hidden())? else {
            return Ok(PipelineOutcome::Empty);
        };
        let network = self.network(source, &score.selection)?;
        let clusters = self.cluster(&network)?;
        Ok(PipelineOutcome::Completed(Box::new(PipelineReport {
            score,
            network,
            clusters,
        })))
    }
}
