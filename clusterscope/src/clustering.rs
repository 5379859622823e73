use linfa::prelude::*;
use linfa_clustering::KMeans;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::vectorize::TermMatrix;

/// K-means over the rows of a term matrix, initialised with k-means++.
#[derive(Debug, Clone)]
pub struct KMeansClusterer {
    max_iterations: u64,
    tolerance: f64,
    n_runs: usize,
    seed: u64,
}

impl Default for KMeansClusterer {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            tolerance: 1e-4,
            n_runs: 10,
            seed: 42,
        }
    }
}

impl KMeansClusterer {
    pub fn from_config(config: &common::ClusteringConfig) -> Self {
        Self {
            max_iterations: config.max_iterations(),
            tolerance: config.tolerance(),
            n_runs: config.n_runs(),
            seed: config.seed(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// One label per matrix row, each in `0..num_clusters`.
    pub fn cluster(&self, matrix: &TermMatrix, num_clusters: usize) -> Result<Vec<usize>> {
        self.cluster_records(matrix.weights(), num_clusters)
    }

    pub fn cluster_records(&self, records: &Array2<f64>, num_clusters: usize) -> Result<Vec<usize>> {
        let n_samples = records.nrows();
        if num_clusters == 0 || num_clusters > n_samples {
            return Err(PipelineError::InvalidClusterCount {
                requested: num_clusters,
                articles: n_samples,
            });
        }

        let dataset = DatasetBase::new(records.clone(), Array1::<usize>::zeros(n_samples));
        let rng = StdRng::seed_from_u64(self.seed);

        let model = KMeans::params_with_rng(num_clusters, rng)
            .max_n_iterations(self.max_iterations)
            .tolerance(self.tolerance)
            .n_runs(self.n_runs)
            .fit(&dataset)
            .map_err(|e| {
                PipelineError::Clustering(format!(
                    "failed to cluster {} documents into {} clusters: {}",
                    n_samples, num_clusters, e
                ))
            })?;

        let mut assignments = Array1::<usize>::zeros(n_samples);
        model.predict_inplace(records, &mut assignments);

        debug!("clustering: {} documents assigned to {} clusters", n_samples, num_clusters);
        Ok(assignments.to_vec())
    }
}

/// Cluster with the default k-means settings.
pub fn cluster(matrix: &TermMatrix, num_clusters: usize) -> Result<Vec<usize>> {
    KMeansClusterer::default().cluster(matrix, num_clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorize::TfIdfVectorizer;
    use ndarray::array;

    #[test]
    fn separates_obvious_groups() {
        let records = array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [10.0, 10.0],
            [10.1, 10.0],
            [10.0, 10.1],
        ];
        let labels = KMeansClusterer::default()
            .cluster_records(&records, 2)
            .expect("cluster");

        assert_eq!(labels.len(), 6);
        assert!(labels[..3].iter().all(|&l| l == labels[0]));
        assert!(labels[3..].iter().all(|&l| l == labels[3]));
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn labels_cover_every_row_and_stay_in_range() {
        let matrix = TfIdfVectorizer::new()
            .fit_transform(&[
                "rust compiler release",
                "rust borrow checker",
                "football league final",
                "football transfer window",
                "election results parliament",
            ])
            .expect("vectorize");

        for k in 1..=5 {
            let labels = cluster(&matrix, k).expect("cluster");
            assert_eq!(labels.len(), 5);
            assert!(labels.iter().all(|&l| l < k));
        }
    }

    #[test]
    fn same_seed_same_labels() {
        let matrix = TfIdfVectorizer::new()
            .fit_transform(&["alpha beta", "beta gamma", "delta epsilon", "epsilon zeta"])
            .expect("vectorize");

        let a = KMeansClusterer::default().with_seed(7).cluster(&matrix, 2).expect("cluster");
        let b = KMeansClusterer::default().with_seed(7).cluster(&matrix, 2).expect("cluster");
        assert_eq!(a, b);
    }

    #[test]
    fn more_clusters_than_rows_is_rejected() {
        let records = array![[1.0], [2.0]];
        let err = KMeansClusterer::default()
            .cluster_records(&records, 3)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidClusterCount { requested: 3, articles: 2 }
        ));
    }

    #[test]
    fn zero_clusters_is_rejected() {
        let records = array![[1.0], [2.0]];
        assert!(matches!(
            KMeansClusterer::default().cluster_records(&records, 0),
            Err(PipelineError::InvalidClusterCount { requested: 0, .. })
        ));
    }
}
