use common::{Article, Config};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::clustering::KMeansClusterer;
use crate::error::{PipelineError, Result};
use crate::ingestion::{self, FeedSource};
use crate::vectorize::TfIdfVectorizer;

/// Articles keyed by cluster label, each group in fetch order.
/// Only labels that were actually assigned appear as keys.
pub type ClusteredGroups = BTreeMap<usize, Vec<Article>>;

/// What a pipeline run hands to the presenter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "clusters", rename_all = "snake_case")]
pub enum Outcome {
    /// The feed produced no articles; nothing was vectorized or clustered.
    NoArticles,
    Clustered(ClusteredGroups),
}

impl Outcome {
    pub fn groups(&self) -> Option<&ClusteredGroups> {
        match self {
            Outcome::NoArticles => None,
            Outcome::Clustered(groups) => Some(groups),
        }
    }
}

/// Zip labels with articles by position and group them by label.
pub fn group_by_label(articles: Vec<Article>, labels: &[usize]) -> ClusteredGroups {
    debug_assert_eq!(articles.len(), labels.len());
    let mut groups = ClusteredGroups::new();
    for (article, &label) in articles.into_iter().zip(labels) {
        groups.entry(label).or_default().push(article);
    }
    groups
}

/// Feed → TF-IDF → k-means → groups, one straight pass per call.
pub struct Pipeline {
    source: Arc<dyn FeedSource>,
    vectorizer: TfIdfVectorizer,
    clusterer: KMeansClusterer,
    collapse_fetch_errors: bool,
}

impl Pipeline {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        Self {
            source,
            vectorizer: TfIdfVectorizer::new(),
            clusterer: KMeansClusterer::default(),
            collapse_fetch_errors: false,
        }
    }

    pub fn from_config(source: Arc<dyn FeedSource>, config: &Config) -> Self {
        Self {
            source,
            vectorizer: TfIdfVectorizer::from_config(&config.vectorizer),
            clusterer: KMeansClusterer::from_config(&config.clustering),
            collapse_fetch_errors: config.pipeline.collapse_fetch_errors(),
        }
    }

    pub fn with_vectorizer(mut self, vectorizer: TfIdfVectorizer) -> Self {
        self.vectorizer = vectorizer;
        self
    }

    pub fn with_clusterer(mut self, clusterer: KMeansClusterer) -> Self {
        self.clusterer = clusterer;
        self
    }

    /// Report fetch failures as an empty feed instead of an error.
    pub fn collapse_fetch_errors(mut self, collapse: bool) -> Self {
        self.collapse_fetch_errors = collapse;
        self
    }

    async fn fetch(&self, url: &str) -> Result<Vec<Article>> {
        match ingestion::fetch_articles(self.source.as_ref(), url).await {
            Ok(articles) => Ok(articles),
            Err(e) if self.collapse_fetch_errors => {
                warn!("pipeline: fetch of {} failed, treating as empty feed: {:#}", url, e);
                Ok(Vec::new())
            }
            Err(source) => Err(PipelineError::Fetch {
                url: url.to_string(),
                source,
            }),
        }
    }

    pub async fn run(&self, url: &str, num_clusters: usize) -> Result<Outcome> {
        let articles = self.fetch(url).await?;
        if articles.is_empty() {
            info!("pipeline: no articles found at {}", url);
            return Ok(Outcome::NoArticles);
        }

        if num_clusters == 0 || num_clusters > articles.len() {
            return Err(PipelineError::InvalidClusterCount {
                requested: num_clusters,
                articles: articles.len(),
            });
        }

        let matrix = self.vectorizer.vectorize(&articles)?;
        let labels = self.clusterer.cluster(&matrix, num_clusters)?;
        let groups = group_by_label(articles, &labels);

        info!(
            articles = labels.len(),
            terms = matrix.n_terms(),
            groups = groups.len(),
            "pipeline: clustered {}",
            url
        );
        Ok(Outcome::Clustered(groups))
    }
}
