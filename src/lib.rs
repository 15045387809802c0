//! Generalized k-means clustering.
//!
//! Observations are stored column-major in a flat buffer wrapped by
//! [`Matrix`]. Clustering is split into an initialization step, which picks
//! starting centroids, and a refinement step, which improves them to a local
//! optimum of the within-cluster sum of squares:
//!
//! - initializers: [`NoInit`], [`RandomSample`], [`KmeansPlusPlus`], [`PcaPartition`]
//! - refiners: [`HartiganWong`], [`Lloyd`], [`MiniBatch`]
//!
//! [`Kmeans`] chains the two, defaulting to k-means++ followed by
//! Hartigan-Wong.

pub mod centroids;
pub mod details;
pub mod error;
pub mod initialize;
pub mod kmeans;
pub mod matrix;
pub mod parallel;
pub mod power_iterations;
pub mod random;
pub mod refine;
pub mod vp_tree;

pub use details::{Details, Status};
pub use error::{Error, Result};
pub use initialize::{
    Initialize, KmeansPlusPlus, KmeansPlusPlusConfig, NoInit, PcaPartition, PcaPartitionConfig,
    RandomConfig, RandomSample,
};
pub use kmeans::{Kmeans, KmeansResults};
pub use matrix::{Matrix, Scalar};
pub use power_iterations::{PowerIterations, PowerResult};
pub use refine::{
    HartiganWong, HartiganWongConfig, Lloyd, LloydConfig, MiniBatch, MiniBatchConfig, Refine,
};
pub use vp_tree::VpTree;
