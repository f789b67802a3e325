// Clustering boundary: swap-ready abstraction over the hierarchical
// clustering routine and the dendrogram renderer.
//
// The pipeline only ever talks to these traits. It hands over a condensed
// distance vector plus labels and gets back a merge tree and one auxiliary
// scalar whose meaning belongs to the backend.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;

use crate::error::PipelineError;

/// Linkage criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterMethod {
    Single,
    Complete,
    Average,
    Weighted,
    Ward,
    Centroid,
    Median,
    /// Polarization distance. Only available from external backends.
    PolDist,
}

impl ClusterMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterMethod::Single => "single",
            ClusterMethod::Complete => "complete",
            ClusterMethod::Average => "average",
            ClusterMethod::Weighted => "weighted",
            ClusterMethod::Ward => "ward",
            ClusterMethod::Centroid => "centroid",
            ClusterMethod::Median => "median",
            ClusterMethod::PolDist => "poldist",
        }
    }

    /// Whether merge heights are guaranteed monotone (needed by nn_chain).
    pub fn is_reducible(&self) -> bool {
        !matches!(
            self,
            ClusterMethod::Centroid | ClusterMethod::Median | ClusterMethod::PolDist
        )
    }
}

impl FromStr for ClusterMethod {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "single" => Ok(ClusterMethod::Single),
            "complete" => Ok(ClusterMethod::Complete),
            "average" => Ok(ClusterMethod::Average),
            "weighted" => Ok(ClusterMethod::Weighted),
            "ward" => Ok(ClusterMethod::Ward),
            "centroid" => Ok(ClusterMethod::Centroid),
            "median" => Ok(ClusterMethod::Median),
            "poldist" => Ok(ClusterMethod::PolDist),
            other => Err(PipelineError::UnknownClusterMethod(other.to_string())),
        }
    }
}

impl fmt::Display for ClusterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterAlgorithm {
    Generic,
    NnChain,
}

impl ClusterAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterAlgorithm::Generic => "generic",
            ClusterAlgorithm::NnChain => "nn_chain",
        }
    }
}

impl FromStr for ClusterAlgorithm {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "generic" => Ok(ClusterAlgorithm::Generic),
            "nn_chain" => Ok(ClusterAlgorithm::NnChain),
            other => Err(PipelineError::UnknownClusterAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for ClusterAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Marker meaning "clustering disabled" for both method and algorithm.
pub const DISABLED: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterSpec {
    pub method: ClusterMethod,
    pub algorithm: ClusterAlgorithm,
}

impl ClusterSpec {
    /// Resolve the `method` / `algorithm` option pair.
    ///
    /// An algorithm of `-` disables clustering. `nn_chain` always runs Ward
    /// linkage; for `generic` a method of `-` also means Ward.
    pub fn parse(method: &str, algorithm: &str) -> Result<Option<Self>, PipelineError> {
        if algorithm.trim() == DISABLED {
            return Ok(None);
        }
        let algorithm: ClusterAlgorithm = algorithm.parse()?;
        let method = match (algorithm, method.trim()) {
            (ClusterAlgorithm::NnChain, _) | (_, DISABLED) => ClusterMethod::Ward,
            (ClusterAlgorithm::Generic, m) => m.parse()?,
        };
        Ok(Some(Self { method, algorithm }))
    }
}

/// One row of a linkage matrix. Leaves are `0..n`; the k-th merge creates
/// cluster `n + k`. `left < right` always.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterOutcome {
    pub merges: Vec<Merge>,
    /// Backend-defined auxiliary value.
    pub auxiliary: f64,
}

/// Hierarchical clustering over a condensed distance vector.
pub trait Clusterer {
    fn cluster(
        &self,
        condensed: &[f64],
        labels: &[String],
        spec: &ClusterSpec,
    ) -> Result<ClusterOutcome>;
}

/// Turns a merge tree into a displayable artifact.
pub trait DendrogramRenderer {
    fn render(&self, outcome: &ClusterOutcome, labels: &[String]) -> String;
}

/// Length of the condensed vector for `n` observations.
pub fn condensed_len(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}
