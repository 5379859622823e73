use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to fetch feed {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("empty vocabulary; the summaries only contain stop words or no text at all")]
    EmptyVocabulary,

    #[error("invalid number of clusters: {requested} requested for {articles} articles (must be between 1 and the number of articles)")]
    InvalidClusterCount { requested: usize, articles: usize },

    #[error("clustering failed: {0}")]
    Clustering(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
