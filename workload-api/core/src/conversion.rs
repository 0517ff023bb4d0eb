type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Raised when a resource payload can't be decoded into its typed representation.
///
/// A workload that fails conversion must not be partially used.
#[derive(Debug, thiserror::Error)]
#[error("failed to convert {kind}")]
pub struct ConversionError {
    pub kind: &'static str,
    #[source]
    pub cause: BoxError,
}

impl ConversionError {
    pub fn new(kind: &'static str, cause: impl Into<BoxError>) -> Self {
        Self {
            kind,
            cause: cause.into(),
        }
    }
}
