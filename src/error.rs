use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Input data that can't be plotted as given (length mismatch, non-positive time, ...)
    #[error("malformed record for dataset `{dataset}`: {reason}")]
    MalformedRecord { dataset: String, reason: String },

    #[error("no serial baseline time for dataset `{0}`")]
    MissingBaseline(String),

    #[error("dataset `{0}` is not part of the measurements")]
    DatasetNotFound(String),

    #[error("an ideal speedup reference needs at least one series")]
    EmptySeriesSet,

    #[error("chart `{0}` has neither series nor a reference line")]
    EmptyChart(String),

    #[error("failed to render chart: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AnalysisError {
    pub(crate) fn malformed(dataset: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            dataset: dataset.to_owned(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
