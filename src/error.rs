use thiserror::Error;

/// Result alias for `tabclust`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by table extraction, distance and clustering primitives.
///
/// Every variant is an input-validation failure; none is retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// A requested column is absent or holds a value that is not numeric.
    #[error("invalid column '{column}': {reason}")]
    InvalidColumn {
        /// Column name.
        column: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Distance metric name is not registered.
    #[error("unknown distance metric '{0}'")]
    UnknownMetric(String),

    /// Vector dimension mismatch.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid number of k-means clusters.
    #[error("cannot create {k} clusters from {n_items} items")]
    InvalidK {
        /// Requested k.
        k: usize,
        /// Number of items.
        n_items: usize,
    },

    /// A candidate in an elbow sweep is out of range (or the range is empty).
    #[error("invalid k range: {0}")]
    InvalidKRange(String),

    /// Invalid number of clusters for a tree cut.
    #[error("cannot cut {n_items} items into {requested} clusters")]
    InvalidNClusters {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Linkage rule requires a different metric.
    #[error("{linkage} linkage requires euclidean distance, got {metric}")]
    IncompatibleLinkage {
        /// Linkage name.
        linkage: &'static str,
        /// Metric name.
        metric: &'static str,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: String,
    },

    /// Input could not be decoded (CSV, JSON request, unsupported upload).
    #[error("ingest failed: {0}")]
    Ingest(String),
}

/// Stable, transport-facing name of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No rows to work on.
    EmptyInput,
    /// Missing or non-numeric feature column.
    InvalidColumn,
    /// Unregistered metric name.
    UnknownMetric,
    /// Vectors of different lengths.
    DimensionMismatch,
    /// k outside `[1, N]`.
    InvalidK,
    /// Empty elbow sweep or candidate outside `[1, N]`.
    InvalidKRange,
    /// Cluster count outside `[1, N]`.
    InvalidNClusters,
    /// Linkage paired with a metric it cannot use.
    IncompatibleLinkage,
    /// Any other bad setting.
    InvalidParameter,
    /// Undecodable upload or request body.
    Ingest,
}

impl ErrorKind {
    /// Name used in the `error_kind` field of API responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::EmptyInput => "EmptyInputError",
            ErrorKind::InvalidColumn => "InvalidColumnError",
            ErrorKind::UnknownMetric => "UnknownMetricError",
            ErrorKind::DimensionMismatch => "DimensionMismatchError",
            ErrorKind::InvalidK => "InvalidKError",
            ErrorKind::InvalidKRange => "InvalidKRangeError",
            ErrorKind::InvalidNClusters => "InvalidNClustersError",
            ErrorKind::IncompatibleLinkage => "IncompatibleLinkageError",
            ErrorKind::InvalidParameter => "InvalidParameterError",
            ErrorKind::Ingest => "IngestError",
        }
    }
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyInput => ErrorKind::EmptyInput,
            Error::InvalidColumn { .. } => ErrorKind::InvalidColumn,
            Error::UnknownMetric(_) => ErrorKind::UnknownMetric,
            Error::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Error::InvalidK { .. } => ErrorKind::InvalidK,
            Error::InvalidKRange(_) => ErrorKind::InvalidKRange,
            Error::InvalidNClusters { .. } => ErrorKind::InvalidNClusters,
            Error::IncompatibleLinkage { .. } => ErrorKind::IncompatibleLinkage,
            Error::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Error::Ingest(_) => ErrorKind::Ingest,
        }
    }

    pub(crate) fn invalid_column(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidColumn {
            column: column.into(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Ingest(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Ingest(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_are_stable() {
        assert_eq!(Error::EmptyInput.kind().as_str(), "EmptyInputError");
        let e = Error::IncompatibleLinkage {
            linkage: "ward",
            metric: "manhattan",
        };
        assert_eq!(e.kind().as_str(), "IncompatibleLinkageError");
        assert_eq!(
            e.to_string(),
            "ward linkage requires euclidean distance, got manhattan"
        );
    }
}
