// Built-in agglomerative linkage.
//
// Two strategies over a dense copy of the distance matrix:
// - generic: repeatedly merge the globally closest pair, updating distances
//   with the Lance-Williams formula for the chosen method.
// - nn_chain: nearest-neighbour chain. Merges come out of order, so they are
//   stably sorted by height before labelling. Only valid for reducible methods.
//
// In both cases the merged cluster takes over the slot of the higher index,
// and final cluster ids are assigned with a union-find pass so the output
// follows the usual linkage-matrix conventions.

use anyhow::Result;
use tracing::debug;

use super::traits::{
    condensed_len, ClusterAlgorithm, ClusterMethod, ClusterOutcome, ClusterSpec, Clusterer, Merge,
};
use crate::error::PipelineError;

/// In-process hierarchical clustering. The auxiliary value it reports is the
/// height of the root merge (0.0 with fewer than two labels).
#[derive(Debug, Clone, Copy, Default)]
pub struct AgglomerativeLinkage;

impl Clusterer for AgglomerativeLinkage {
    fn cluster(
        &self,
        condensed: &[f64],
        labels: &[String],
        spec: &ClusterSpec,
    ) -> Result<ClusterOutcome> {
        let n = labels.len();
        if condensed.len() != condensed_len(n) {
            return Err(PipelineError::Clustering(format!(
                "condensed vector has {} entries, expected {} for {} labels",
                condensed.len(),
                condensed_len(n),
                n
            ))
            .into());
        }
        if spec.method == ClusterMethod::PolDist {
            return Err(PipelineError::Clustering(
                "poldist needs an external clustering backend".to_string(),
            )
            .into());
        }
        if spec.algorithm == ClusterAlgorithm::NnChain && !spec.method.is_reducible() {
            return Err(PipelineError::Clustering(format!(
                "nn_chain cannot run {} linkage",
                spec.method
            ))
            .into());
        }
        if let Some(bad) = condensed.iter().find(|d| !d.is_finite()) {
            return Err(PipelineError::Clustering(format!("non-finite distance {bad}")).into());
        }

        let dist = DistanceMatrix::from_condensed(condensed, n);
        let mut raw = match spec.algorithm {
            ClusterAlgorithm::Generic => generic(dist, spec.method),
            ClusterAlgorithm::NnChain => nn_chain(dist, spec.method),
        };
        if spec.algorithm == ClusterAlgorithm::NnChain {
            raw.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        }

        let merges = label(n, &raw);
        let auxiliary = merges.last().map(|m| m.distance).unwrap_or(0.0);
        debug!(
            method = %spec.method,
            algorithm = %spec.algorithm,
            merges = merges.len(),
            auxiliary,
            "Linkage complete"
        );
        Ok(ClusterOutcome { merges, auxiliary })
    }
}

struct DistanceMatrix {
    n: usize,
    d: Vec<f64>,
}

impl DistanceMatrix {
    fn from_condensed(condensed: &[f64], n: usize) -> Self {
        let mut d = vec![0.0; n * n];
        let mut k = 0;
        for i in 0..n {
            for j in i + 1..n {
                d[i * n + j] = condensed[k];
                d[j * n + i] = condensed[k];
                k += 1;
            }
        }
        Self { n, d }
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.d[i * self.n + j]
    }

    fn set(&mut self, i: usize, j: usize, v: f64) {
        self.d[i * self.n + j] = v;
        self.d[j * self.n + i] = v;
    }
}

/// A merge expressed in slot indices, before relabelling.
#[derive(Debug, Clone, Copy)]
struct RawMerge {
    x: usize,
    y: usize,
    distance: f64,
}

/// Distance from cluster k to the union of x and y (Lance-Williams).
fn updated_distance(
    method: ClusterMethod,
    d_xk: f64,
    d_yk: f64,
    d_xy: f64,
    nx: f64,
    ny: f64,
    nk: f64,
) -> f64 {
    match method {
        ClusterMethod::Single => d_xk.min(d_yk),
        ClusterMethod::Complete => d_xk.max(d_yk),
        ClusterMethod::Average => (nx * d_xk + ny * d_yk) / (nx + ny),
        ClusterMethod::Weighted => 0.5 * (d_xk + d_yk),
        ClusterMethod::Ward | ClusterMethod::PolDist => {
            let t = nx + ny + nk;
            (((nx + nk) * d_xk * d_xk + (ny + nk) * d_yk * d_yk - nk * d_xy * d_xy) / t)
                .max(0.0)
                .sqrt()
        }
        ClusterMethod::Centroid => {
            let s = nx + ny;
            ((nx * d_xk * d_xk + ny * d_yk * d_yk) / s - nx * ny * d_xy * d_xy / (s * s))
                .max(0.0)
                .sqrt()
        }
        ClusterMethod::Median => (0.5 * d_xk * d_xk + 0.5 * d_yk * d_yk - 0.25 * d_xy * d_xy)
            .max(0.0)
            .sqrt(),
    }
}

/// Merge x into y and refresh y's distances to every live cluster.
fn merge_into(
    dist: &mut DistanceMatrix,
    size: &mut [usize],
    method: ClusterMethod,
    x: usize,
    y: usize,
) {
    let d_xy = dist.get(x, y);
    let (nx, ny) = (size[x] as f64, size[y] as f64);
    for k in 0..dist.n {
        if size[k] == 0 || k == x || k == y {
            continue;
        }
        let v = updated_distance(
            method,
            dist.get(x, k),
            dist.get(y, k),
            d_xy,
            nx,
            ny,
            size[k] as f64,
        );
        dist.set(y, k, v);
    }
    size[y] += size[x];
    size[x] = 0;
}

fn generic(mut dist: DistanceMatrix, method: ClusterMethod) -> Vec<RawMerge> {
    let n = dist.n;
    let mut size = vec![1usize; n];
    let mut merges = Vec::with_capacity(n.saturating_sub(1));

    for _ in 1..n {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            if size[i] == 0 {
                continue;
            }
            for j in i + 1..n {
                if size[j] == 0 {
                    continue;
                }
                let d = dist.get(i, j);
                if best.is_none_or(|(_, _, b)| d < b) {
                    best = Some((i, j, d));
                }
            }
        }
        let Some((x, y, distance)) = best else { break };
        merges.push(RawMerge { x, y, distance });
        merge_into(&mut dist, &mut size, method, x, y);
    }
    merges
}

fn nn_chain(mut dist: DistanceMatrix, method: ClusterMethod) -> Vec<RawMerge> {
    let n = dist.n;
    let mut size = vec![1usize; n];
    let mut merges = Vec::with_capacity(n.saturating_sub(1));
    let mut chain: Vec<usize> = Vec::with_capacity(n);

    for _ in 1..n {
        if chain.is_empty() {
            match (0..n).find(|&i| size[i] > 0) {
                Some(start) => chain.push(start),
                None => break,
            }
        }

        let (x, y, distance) = loop {
            let x = chain[chain.len() - 1];
            let prev = (chain.len() > 1).then(|| chain[chain.len() - 2]);
            let mut y = prev.unwrap_or(x);
            let mut current = prev.map_or(f64::INFINITY, |p| dist.get(x, p));

            for i in 0..n {
                if size[i] == 0 || i == x {
                    continue;
                }
                let d = dist.get(x, i);
                if d < current {
                    current = d;
                    y = i;
                }
            }

            if prev == Some(y) {
                break (x, y, current);
            }
            chain.push(y);
        };

        chain.truncate(chain.len() - 2);
        let (x, y) = if x < y { (x, y) } else { (y, x) };
        merges.push(RawMerge { x, y, distance });
        merge_into(&mut dist, &mut size, method, x, y);
    }
    merges
}

/// Union-find over observation ids, used to name clusters `n, n+1, ...`.
struct ClusterLabels {
    parent: Vec<usize>,
    size: Vec<usize>,
    next: usize,
}

impl ClusterLabels {
    fn new(n: usize) -> Self {
        let total = (2 * n).saturating_sub(1);
        Self {
            parent: (0..total).collect(),
            size: vec![1; total],
            next: n,
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[x] != root {
            let up = self.parent[x];
            self.parent[x] = root;
            x = up;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) -> usize {
        let id = self.next;
        self.parent[a] = id;
        self.parent[b] = id;
        self.size[id] = self.size[a] + self.size[b];
        self.next += 1;
        self.size[id]
    }
}

fn label(n: usize, raw: &[RawMerge]) -> Vec<Merge> {
    let mut uf = ClusterLabels::new(n);
    raw.iter()
        .map(|m| {
            let a = uf.find(m.x);
            let b = uf.find(m.y);
            let (left, right) = if a < b { (a, b) } else { (b, a) };
            let size = uf.union(left, right);
            Merge {
                left,
                right,
                distance: m.distance,
                size,
            }
        })
        .collect()
}
