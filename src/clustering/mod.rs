// Hierarchical clustering of the polarization matrix.
//
// `traits` is the boundary the pipeline depends on; `linkage` and
// `dendrogram` are the in-process implementations used by the CLI.

pub mod dendrogram;
pub mod linkage;
pub mod traits;

pub use dendrogram::TextDendrogram;
pub use linkage::AgglomerativeLinkage;
pub use traits::{ClusterOutcome, ClusterSpec, Clusterer, DendrogramRenderer, Merge};
